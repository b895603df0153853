use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::{
    FounderProfile, FundingRequest, FundingRequestStatus, FundingStage, MatchCounts,
    OutreachOutcome,
};

/// Public summary of the founder behind a funding request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FounderSummary {
    pub id: String,
    pub name: String,
    pub company_name: Option<String>,
    pub email: Option<String>,
}

impl From<&FounderProfile> for FounderSummary {
    fn from(profile: &FounderProfile) -> Self {
        Self {
            id: profile.user_id.clone(),
            name: profile.name.clone(),
            company_name: profile.company_name.clone(),
            email: profile.email.clone(),
        }
    }
}

/// Funding request as exposed over the API, with derived outreach counts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRequestView {
    pub id: Uuid,
    pub funding_stage: FundingStage,
    pub use_of_funds: String,
    pub status: FundingRequestStatus,
    pub refresh_count: i32,
    pub created_at: DateTime<Utc>,
    pub founder: FounderSummary,
    pub contacted_investors_count: i64,
    pub total_emails_sent: i64,
}

impl FundingRequestView {
    pub fn new(request: &FundingRequest, founder: FounderSummary, counts: MatchCounts) -> Self {
        Self {
            id: request.id,
            funding_stage: request.funding_stage,
            use_of_funds: request.use_of_funds.clone(),
            status: request.status,
            refresh_count: request.refresh_count,
            created_at: request.created_at,
            founder,
            contacted_investors_count: counts.contacted_investors,
            total_emails_sent: counts.emails_sent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRequestData {
    pub funding_request: FundingRequestView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_results: Option<OutreachOutcome>,
}

/// Response for the create endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFundingResponse {
    pub message: String,
    pub data: FundingRequestData,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}
