// Core funding request flow
pub mod documents;
pub mod eligibility;
pub mod error;
pub mod message;
pub mod orchestrator;
pub mod recorder;
pub mod resolver;

pub use documents::{DocumentSelection, DocumentSelector, SelectionTier, TierAttempt, TierResult};
pub use eligibility::EligibilityGuard;
pub use error::{ErrorKind, FundingError, OutreachError};
pub use message::{default_outreach_message, outreach_message};
pub use orchestrator::{FundingRequestOrchestrator, OrchestratorSettings, OutreachStep};
pub use recorder::MatchRecorder;
pub use resolver::{InvestorResolution, InvestorResolver};
