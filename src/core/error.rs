use serde::Serialize;
use thiserror::Error;

use crate::services::{DirectoryError, DispatchError, StoreError};

/// Broad class of a failure, used to pick a transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input or a violated business rule; nothing was written
    Validation,
    /// Investors or documents could not be resolved for outreach
    Resolution,
    /// Storage or directory failure
    Persistence,
    /// The outreach provider call failed
    Dispatch,
}

/// Failures surfaced to the caller of the create and read operations
#[derive(Debug, Error)]
pub enum FundingError {
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    #[error("Caller may not act for founder {0}")]
    Forbidden(String),

    #[error("Founder {founder_id} is not eligible: {reason}")]
    NotEligible { founder_id: String, reason: String },

    #[error("Founder {0} already has an open or allotted funding request")]
    ConflictingActiveRequest(String),

    #[error("Funding request {0} not found")]
    NotFound(String),

    #[error("Storage failure: {0}")]
    Persistence(StoreError),

    #[error("Profile directory failure: {0}")]
    Directory(#[from] DirectoryError),
}

impl From<StoreError> for FundingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ActiveRequestExists(founder_id) => {
                FundingError::ConflictingActiveRequest(founder_id)
            }
            other => FundingError::Persistence(other),
        }
    }
}

impl FundingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FundingError::InvalidInput(_)
            | FundingError::Forbidden(_)
            | FundingError::NotEligible { .. }
            | FundingError::ConflictingActiveRequest(_)
            | FundingError::NotFound(_) => ErrorKind::Validation,
            FundingError::Persistence(_) | FundingError::Directory(_) => ErrorKind::Persistence,
        }
    }

    /// Short machine-readable label for error bodies
    pub fn code(&self) -> &'static str {
        match self {
            FundingError::InvalidInput(_) => "validation_failed",
            FundingError::Forbidden(_) => "forbidden",
            FundingError::NotEligible { .. } => "not_eligible",
            FundingError::ConflictingActiveRequest(_) => "conflicting_active_request",
            FundingError::NotFound(_) => "not_found",
            FundingError::Persistence(_) => "persistence_failure",
            FundingError::Directory(_) => "directory_failure",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            FundingError::InvalidInput(_) => 400,
            FundingError::Forbidden(_) => 403,
            FundingError::NotFound(_) => 404,
            FundingError::ConflictingActiveRequest(_) => 409,
            FundingError::NotEligible { .. } => 422,
            FundingError::Persistence(_) => 500,
            FundingError::Directory(_) => 502,
        }
    }
}

/// Failures inside the optional outreach branch. These never reach the
/// caller as errors; they are folded into an unsuccessful outcome.
#[derive(Debug, Error)]
pub enum OutreachError {
    #[error("None of the requested investors exist")]
    NoValidInvestors,

    #[error("None of the requested investors have a usable email address")]
    NoContactableInvestors,

    #[error("Failed to record investor matches: {0}")]
    MatchPersistence(StoreError),

    #[error("Founder {0} not found while selecting documents")]
    FounderNotFound(String),

    #[error("Investor lookup failed: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Outreach dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}

impl OutreachError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OutreachError::NoValidInvestors
            | OutreachError::NoContactableInvestors
            | OutreachError::FounderNotFound(_) => ErrorKind::Resolution,
            OutreachError::MatchPersistence(_) | OutreachError::Directory(_) => {
                ErrorKind::Persistence
            }
            OutreachError::Dispatch(_) => ErrorKind::Dispatch,
        }
    }
}
