//! FundLink - funding request and investor outreach service
//!
//! Founders open funding requests and can have them sent straight to a
//! hand-picked list of investors. This library holds the creation flow,
//! its storage and directory collaborators, and the HTTP surface.

pub mod auth;
pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use auth::{Caller, JwtVerifier};
pub use core::{FundingError, FundingRequestOrchestrator, OrchestratorSettings};
pub use models::{CreateFundingRequest, FundingRequestData, FundingRequestView, OutreachOutcome};
