use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ActivityRecord, DeliveryStatus, FounderInvestorMatch, FundingRequest, MatchCounts,
    NewFundingRequest,
};

/// Errors raised by funding request storage
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Founder {0} already has an open or allotted funding request")]
    ActiveRequestExists(String),

    #[error("Investor {investor_id} is already matched to funding request {funding_request_id}")]
    DuplicateMatch {
        funding_request_id: Uuid,
        investor_id: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for funding requests, their investor matches, and the activity log.
///
/// Implementations must make `insert_funding_request` a single constrained
/// write: if the founder already holds an `open` or `allotted` request the
/// insert fails with [`StoreError::ActiveRequestExists`] and nothing is written.
/// `insert_matches` is all-or-nothing.
#[async_trait]
pub trait FundingStore: Send + Sync {
    async fn find_active_request(
        &self,
        founder_id: &str,
    ) -> Result<Option<FundingRequest>, StoreError>;

    async fn insert_funding_request(
        &self,
        request: NewFundingRequest,
    ) -> Result<FundingRequest, StoreError>;

    async fn get_funding_request(&self, id: Uuid) -> Result<Option<FundingRequest>, StoreError>;

    /// Move a request to `closed`. Returns false if it was not active.
    async fn close_funding_request(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn insert_matches(&self, matches: &[FounderInvestorMatch]) -> Result<(), StoreError>;

    async fn update_delivery_status(
        &self,
        funding_request_id: Uuid,
        investor_ids: &[String],
        status: DeliveryStatus,
    ) -> Result<u64, StoreError>;

    async fn list_matches(
        &self,
        funding_request_id: Uuid,
    ) -> Result<Vec<FounderInvestorMatch>, StoreError>;

    async fn match_counts(&self, funding_request_id: Uuid) -> Result<MatchCounts, StoreError>;

    async fn record_activity(&self, record: &ActivityRecord) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}
