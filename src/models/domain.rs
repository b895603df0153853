use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Funding round a request is raising for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "funding_stage", rename_all = "snake_case")]
pub enum FundingStage {
    #[serde(alias = "pre-seed", alias = "preseed")]
    PreSeed,
    Seed,
    #[serde(alias = "series-a")]
    SeriesA,
    #[serde(alias = "series-b")]
    SeriesB,
    #[serde(alias = "series-c")]
    SeriesC,
    Growth,
}

impl FundingStage {
    /// Human-readable stage name used in outreach copy
    pub fn label(&self) -> &'static str {
        match self {
            FundingStage::PreSeed => "Pre-Seed",
            FundingStage::Seed => "Seed",
            FundingStage::SeriesA => "Series A",
            FundingStage::SeriesB => "Series B",
            FundingStage::SeriesC => "Series C",
            FundingStage::Growth => "Growth",
        }
    }
}

/// Lifecycle status of a funding request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "funding_status", rename_all = "lowercase")]
pub enum FundingRequestStatus {
    Open,
    Allotted,
    Closed,
}

impl FundingRequestStatus {
    /// `open` and `allotted` requests block a founder from opening another one
    pub fn is_active(&self) -> bool {
        matches!(self, FundingRequestStatus::Open | FundingRequestStatus::Allotted)
    }
}

/// A founder's ask for capital
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingRequest {
    pub id: Uuid,
    pub founder_id: String,
    pub funding_stage: FundingStage,
    pub use_of_funds: String,
    pub business_plan: Option<String>,
    pub financial_projections: Option<String>,
    pub additional_notes: Option<String>,
    pub status: FundingRequestStatus,
    pub refresh_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when opening a new funding request
#[derive(Debug, Clone)]
pub struct NewFundingRequest {
    pub founder_id: String,
    pub funding_stage: FundingStage,
    pub use_of_funds: String,
    pub business_plan: Option<String>,
    pub financial_projections: Option<String>,
    pub additional_notes: Option<String>,
}

impl NewFundingRequest {
    /// Materialize the row as it will be stored: fresh id, `open`, zero refreshes
    pub fn into_request(self, created_at: DateTime<Utc>) -> FundingRequest {
        FundingRequest {
            id: Uuid::new_v4(),
            founder_id: self.founder_id,
            funding_stage: self.funding_stage,
            use_of_funds: self.use_of_funds,
            business_plan: self.business_plan,
            financial_projections: self.financial_projections,
            additional_notes: self.additional_notes,
            status: FundingRequestStatus::Open,
            refresh_count: 0,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "assignment_method", rename_all = "lowercase")]
pub enum AssignmentMethod {
    Manual,
    Algorithmic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "match_status", rename_all = "lowercase")]
pub enum MatchStatus {
    Active,
    Inactive,
}

/// Whether outreach actually reached the investor behind a match row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "delivery_status", rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
    Skipped,
}

/// An investor assigned to a funding request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FounderInvestorMatch {
    pub id: Uuid,
    pub funding_request_id: Uuid,
    pub founder_id: String,
    pub investor_id: String,
    pub assigned_by: String,
    pub method: AssignmentMethod,
    pub status: MatchStatus,
    pub delivery_status: DeliveryStatus,
    pub contacted_at: DateTime<Utc>,
}

/// Counts derived from the match rows of one request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCounts {
    /// Distinct investors with at least one delivered outreach
    pub contacted_investors: i64,
    /// Match rows whose outreach was delivered
    pub emails_sent: i64,
}

impl MatchCounts {
    pub fn from_matches(matches: &[FounderInvestorMatch]) -> Self {
        let sent: Vec<&FounderInvestorMatch> = matches
            .iter()
            .filter(|m| m.delivery_status == DeliveryStatus::Sent)
            .collect();

        let mut investors: Vec<&str> = sent.iter().map(|m| m.investor_id.as_str()).collect();
        investors.sort_unstable();
        investors.dedup();

        Self {
            contacted_investors: investors.len() as i64,
            emails_sent: sent.len() as i64,
        }
    }
}

/// Supporting document attached to a founder profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FounderDocument {
    #[serde(rename = "documentId")]
    pub document_id: String,
    #[serde(rename = "fileName", default)]
    pub file_name: Option<String>,
    #[serde(rename = "isVerified", default)]
    pub is_verified: bool,
    #[serde(rename = "uploadedAt", default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Founder profile as stored in the document store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FounderProfile {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "fullName", default)]
    pub name: String,
    #[serde(rename = "companyName", default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "signupStatus", default)]
    pub signup_status: String,
    #[serde(default)]
    pub documents: Vec<FounderDocument>,
}

impl FounderProfile {
    pub fn is_signup_complete(&self) -> bool {
        self.signup_status.eq_ignore_ascii_case("complete")
    }
}

/// Investor entry in the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "fullName", default)]
    pub name: String,
    #[serde(default)]
    pub firm: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A contactable investor and the address outreach goes to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(rename = "investorId")]
    pub investor_id: String,
    pub email: String,
}

/// Which of a founder's documents a lookup should return
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentQuery {
    ByIds(Vec<String>),
    Verified,
    All,
}

impl DocumentQuery {
    /// Filter a document collection, preserving collection order
    pub fn apply(&self, documents: &[FounderDocument]) -> Vec<FounderDocument> {
        documents
            .iter()
            .filter(|doc| match self {
                DocumentQuery::ByIds(ids) => ids.iter().any(|id| id == &doc.document_id),
                DocumentQuery::Verified => doc.is_verified,
                DocumentQuery::All => true,
            })
            .cloned()
            .collect()
    }
}

/// Result of one outreach attempt, as reported back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl OutreachOutcome {
    pub fn failed(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            success: false,
            message: message.into(),
            data,
        }
    }
}

/// Audit entry written once per outreach attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: Uuid,
    pub actor_id: String,
    pub action: String,
    pub funding_request_id: Uuid,
    pub success: bool,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
