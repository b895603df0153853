use std::sync::Arc;

use crate::core::error::FundingError;
use crate::models::FounderProfile;
use crate::services::{FundingStore, ProfileDirectory};

/// Gate in front of funding request creation
///
/// Read-only. Passing the guard does not reserve anything: the store's
/// constrained insert is what finally decides between two concurrent callers.
#[derive(Clone)]
pub struct EligibilityGuard {
    store: Arc<dyn FundingStore>,
    directory: Arc<dyn ProfileDirectory>,
}

impl EligibilityGuard {
    pub fn new(store: Arc<dyn FundingStore>, directory: Arc<dyn ProfileDirectory>) -> Self {
        Self { store, directory }
    }

    /// Check that the founder may open a new funding request, returning their profile
    pub async fn check_eligibility(&self, founder_id: &str) -> Result<FounderProfile, FundingError> {
        let profile = match self.directory.get_founder(founder_id).await {
            Ok(profile) => profile,
            Err(e) if e.is_not_found() => {
                return Err(FundingError::NotEligible {
                    founder_id: founder_id.to_string(),
                    reason: "no founder profile exists".to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if !profile.is_signup_complete() {
            return Err(FundingError::NotEligible {
                founder_id: founder_id.to_string(),
                reason: format!(
                    "founder profile is incomplete (signup status: {})",
                    if profile.signup_status.is_empty() {
                        "unknown"
                    } else {
                        profile.signup_status.as_str()
                    }
                ),
            });
        }

        if let Some(active) = self.store.find_active_request(founder_id).await? {
            tracing::info!(
                "Founder {} already has active funding request {} ({:?})",
                founder_id,
                active.id,
                active.status
            );
            return Err(FundingError::ConflictingActiveRequest(founder_id.to_string()));
        }

        Ok(profile)
    }
}
