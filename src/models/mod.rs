// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    ActivityRecord, AssignmentMethod, DeliveryStatus, DocumentQuery, FounderDocument,
    FounderInvestorMatch, FounderProfile, FundingRequest, FundingRequestStatus, FundingStage,
    InvestorRecord, MatchCounts, MatchStatus, NewFundingRequest, OutreachOutcome, Recipient,
};
pub use requests::CreateFundingRequest;
pub use responses::{
    CreateFundingResponse, ErrorResponse, FounderSummary, FundingRequestData, FundingRequestView,
    HealthResponse,
};
