use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::OutreachError;
use crate::models::{AssignmentMethod, DeliveryStatus, FounderInvestorMatch, MatchStatus};
use crate::services::FundingStore;

/// Persists founder-investor pairings for a funding request
#[derive(Clone)]
pub struct MatchRecorder {
    store: Arc<dyn FundingStore>,
}

impl MatchRecorder {
    pub fn new(store: Arc<dyn FundingStore>) -> Self {
        Self { store }
    }

    /// Insert one manual, active, pending-delivery match per investor as a single batch
    pub async fn record_matches(
        &self,
        funding_request_id: Uuid,
        founder_id: &str,
        investor_ids: &[String],
        assigned_by: &str,
    ) -> Result<Vec<FounderInvestorMatch>, OutreachError> {
        let contacted_at = Utc::now();
        let matches: Vec<FounderInvestorMatch> = investor_ids
            .iter()
            .map(|investor_id| FounderInvestorMatch {
                id: Uuid::new_v4(),
                funding_request_id,
                founder_id: founder_id.to_string(),
                investor_id: investor_id.clone(),
                assigned_by: assigned_by.to_string(),
                method: AssignmentMethod::Manual,
                status: MatchStatus::Active,
                delivery_status: DeliveryStatus::Pending,
                contacted_at,
            })
            .collect();

        self.store
            .insert_matches(&matches)
            .await
            .map_err(OutreachError::MatchPersistence)?;

        tracing::info!(
            "Recorded {} investor matches for funding request {}",
            matches.len(),
            funding_request_id
        );

        Ok(matches)
    }

    /// Tag the matches of the given investors with how outreach went
    pub async fn mark_delivery(
        &self,
        funding_request_id: Uuid,
        investor_ids: &[String],
        status: DeliveryStatus,
    ) -> Result<u64, OutreachError> {
        if investor_ids.is_empty() {
            return Ok(0);
        }

        self.store
            .update_delivery_status(funding_request_id, investor_ids, status)
            .await
            .map_err(OutreachError::MatchPersistence)
    }
}
