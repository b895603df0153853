use std::sync::Arc;
use validator::ValidateEmail;

use crate::core::error::OutreachError;
use crate::models::{InvestorRecord, Recipient};
use crate::services::ProfileDirectory;

/// Investor ids split by whether the directory knows them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvestorResolution {
    pub found: Vec<InvestorRecord>,
    pub missing: Vec<String>,
}

impl InvestorResolution {
    pub fn found_ids(&self) -> Vec<String> {
        self.found.iter().map(|i| i.user_id.clone()).collect()
    }
}

/// Validates investor ids against the directory
#[derive(Clone)]
pub struct InvestorResolver {
    directory: Arc<dyn ProfileDirectory>,
}

impl InvestorResolver {
    pub fn new(directory: Arc<dyn ProfileDirectory>) -> Self {
        Self { directory }
    }

    /// Resolve ids in request order, dropping duplicates and blanks.
    ///
    /// Missing ids are reported, not fatal; an empty `found` set is.
    pub async fn resolve(&self, investor_ids: &[String]) -> Result<InvestorResolution, OutreachError> {
        let mut requested: Vec<String> = Vec::with_capacity(investor_ids.len());
        for id in investor_ids.iter().map(|id| id.trim()) {
            if !id.is_empty() && !requested.iter().any(|seen| seen == id) {
                requested.push(id.to_string());
            }
        }

        let records = self.directory.find_investors(&requested).await?;

        let mut resolution = InvestorResolution::default();
        for id in requested {
            match records.iter().find(|r| r.user_id == id) {
                Some(record) => resolution.found.push(record.clone()),
                None => resolution.missing.push(id),
            }
        }

        if !resolution.missing.is_empty() {
            tracing::warn!(
                "Ignoring {} unknown investor ids: {:?}",
                resolution.missing.len(),
                resolution.missing
            );
        }

        if resolution.found.is_empty() {
            return Err(OutreachError::NoValidInvestors);
        }

        Ok(resolution)
    }

    /// Keep the investors that have a deliverable email address
    pub fn contactable(found: &[InvestorRecord]) -> Result<Vec<Recipient>, OutreachError> {
        let recipients: Vec<Recipient> = found
            .iter()
            .filter_map(|investor| {
                let email = investor.email.as_deref()?.trim();
                if email.validate_email() {
                    Some(Recipient {
                        investor_id: investor.user_id.clone(),
                        email: email.to_string(),
                    })
                } else {
                    None
                }
            })
            .collect();

        if recipients.is_empty() {
            return Err(OutreachError::NoContactableInvestors);
        }

        Ok(recipients)
    }
}
