use async_trait::async_trait;
use thiserror::Error;

use crate::models::{DocumentQuery, FounderDocument, FounderProfile, InvestorRecord};

/// Errors that can occur when reading founder and investor profiles
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

impl DirectoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DirectoryError::NotFound(_))
    }
}

/// Read-only view over founder and investor profiles
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn get_founder(&self, founder_id: &str) -> Result<FounderProfile, DirectoryError>;

    /// Look up the investors among `investor_ids`; unknown ids are simply absent
    async fn find_investors(
        &self,
        investor_ids: &[String],
    ) -> Result<Vec<InvestorRecord>, DirectoryError>;

    async fn founder_documents(
        &self,
        founder_id: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<FounderDocument>, DirectoryError> {
        let profile = self.get_founder(founder_id).await?;
        Ok(query.apply(&profile.documents))
    }
}
