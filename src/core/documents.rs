use serde::Serialize;
use std::sync::Arc;

use crate::core::error::OutreachError;
use crate::models::{DocumentQuery, FounderDocument};
use crate::services::ProfileDirectory;

/// Tiers of the document fallback, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionTier {
    Explicit,
    Verified,
    All,
}

impl SelectionTier {
    fn query(&self, explicit_ids: &[String]) -> DocumentQuery {
        match self {
            SelectionTier::Explicit => DocumentQuery::ByIds(explicit_ids.to_vec()),
            SelectionTier::Verified => DocumentQuery::Verified,
            SelectionTier::All => DocumentQuery::All,
        }
    }
}

/// What one tier produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TierResult {
    Found { count: usize },
    Empty,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierAttempt {
    pub tier: SelectionTier,
    #[serde(flatten)]
    pub result: TierResult,
}

/// Documents chosen for outreach, with the trail of tiers tried
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentSelection {
    #[serde(skip)]
    pub documents: Vec<FounderDocument>,
    pub tier: Option<SelectionTier>,
    pub attempts: Vec<TierAttempt>,
}

impl DocumentSelection {
    pub fn document_ids(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.document_id.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Picks which founder documents accompany outreach
///
/// # Fallback order
/// 1. Explicitly requested ids (skipped when none given)
/// 2. Verified documents (skipped unless verified documents are preferred)
/// 3. Every document the founder has
///
/// A tier is only tried when the previous ones produced nothing. A lookup
/// failure in one tier counts as producing nothing.
#[derive(Clone)]
pub struct DocumentSelector {
    directory: Arc<dyn ProfileDirectory>,
}

impl DocumentSelector {
    pub fn new(directory: Arc<dyn ProfileDirectory>) -> Self {
        Self { directory }
    }

    pub async fn select_documents(
        &self,
        founder_id: &str,
        explicit_ids: &[String],
        prefer_verified: bool,
    ) -> Result<DocumentSelection, OutreachError> {
        let mut tiers = Vec::with_capacity(3);
        if !explicit_ids.is_empty() {
            tiers.push(SelectionTier::Explicit);
        }
        if prefer_verified {
            tiers.push(SelectionTier::Verified);
        }
        tiers.push(SelectionTier::All);

        let mut selection = DocumentSelection::default();

        for tier in tiers {
            match self
                .directory
                .founder_documents(founder_id, &tier.query(explicit_ids))
                .await
            {
                Ok(documents) if !documents.is_empty() => {
                    selection.attempts.push(TierAttempt {
                        tier,
                        result: TierResult::Found {
                            count: documents.len(),
                        },
                    });
                    selection.tier = Some(tier);
                    selection.documents = documents;
                    break;
                }
                Ok(_) => {
                    selection.attempts.push(TierAttempt {
                        tier,
                        result: TierResult::Empty,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "Document tier {:?} failed for founder {}: {}",
                        tier,
                        founder_id,
                        e
                    );
                    selection.attempts.push(TierAttempt {
                        tier,
                        result: TierResult::Failed {
                            reason: e.to_string(),
                        },
                    });
                }
            }
        }

        let every_tier_failed = selection
            .attempts
            .iter()
            .all(|a| matches!(a.result, TierResult::Failed { .. }));

        if every_tier_failed {
            // Only a missing founder turns total failure into an error
            if let Err(e) = self.directory.get_founder(founder_id).await {
                if e.is_not_found() {
                    return Err(OutreachError::FounderNotFound(founder_id.to_string()));
                }
            }
        }

        if selection.is_empty() {
            tracing::info!("No documents available for founder {}", founder_id);
        }

        Ok(selection)
    }
}
