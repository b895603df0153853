use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::models::{DocumentQuery, FounderDocument, FounderProfile, InvestorRecord};
use crate::services::directory::{DirectoryError, ProfileDirectory};

/// Directory decorator caching investor records in memory
///
/// Investor contact data changes rarely and the same investors are picked
/// by many founders, so lookups are served from an in-process cache with a
/// TTL. Founder profiles are always read through: eligibility depends on the
/// current signup status.
pub struct CachedDirectory {
    inner: Arc<dyn ProfileDirectory>,
    investors: Cache<String, InvestorRecord>,
}

impl CachedDirectory {
    pub fn new(inner: Arc<dyn ProfileDirectory>, max_entries: u64, ttl_secs: u64) -> Self {
        let investors = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { inner, investors }
    }

    pub async fn invalidate_investor(&self, investor_id: &str) {
        self.investors.invalidate(investor_id).await;
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            investor_entries: self.investors.entry_count(),
        }
    }
}

#[async_trait]
impl ProfileDirectory for CachedDirectory {
    async fn get_founder(&self, founder_id: &str) -> Result<FounderProfile, DirectoryError> {
        self.inner.get_founder(founder_id).await
    }

    async fn find_investors(
        &self,
        investor_ids: &[String],
    ) -> Result<Vec<InvestorRecord>, DirectoryError> {
        let mut hits = Vec::with_capacity(investor_ids.len());
        let mut misses = Vec::new();

        for id in investor_ids {
            match self.investors.get(id).await {
                Some(record) => hits.push(record),
                None => misses.push(id.clone()),
            }
        }

        tracing::trace!("Investor cache: {} hits, {} misses", hits.len(), misses.len());

        if !misses.is_empty() {
            for record in self.inner.find_investors(&misses).await? {
                self.investors
                    .insert(record.user_id.clone(), record.clone())
                    .await;
                hits.push(record);
            }
        }

        // Preserve the caller's ordering
        hits.sort_by_key(|record| {
            investor_ids
                .iter()
                .position(|id| id == &record.user_id)
                .unwrap_or(usize::MAX)
        });

        Ok(hits)
    }

    async fn founder_documents(
        &self,
        founder_id: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<FounderDocument>, DirectoryError> {
        self.inner.founder_documents(founder_id, query).await
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub investor_entries: u64,
}
