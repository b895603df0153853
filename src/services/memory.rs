//! In-process implementations of the store and directory traits.
//!
//! Used by the test suites and for running the service without external
//! infrastructure. Both types expose switches to inject failures so the
//! partial-failure paths of the outreach flow can be exercised.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    ActivityRecord, DeliveryStatus, DocumentQuery, FounderDocument, FounderInvestorMatch,
    FounderProfile, FundingRequest, InvestorRecord, MatchCounts, NewFundingRequest,
};
use crate::services::directory::{DirectoryError, ProfileDirectory};
use crate::services::store::{FundingStore, StoreError};

#[derive(Default)]
struct StoreState {
    requests: Vec<FundingRequest>,
    matches: Vec<FounderInvestorMatch>,
    activity: Vec<ActivityRecord>,
    failing_investors: HashSet<String>,
    fail_request_inserts: bool,
    fail_activity: bool,
}

/// Funding store held in memory behind a single lock
#[derive(Default)]
pub struct InMemoryFundingStore {
    state: Mutex<StoreState>,
}

impl InMemoryFundingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }

    /// Seed a request directly, bypassing the active-request constraint
    pub fn seed_request(&self, request: FundingRequest) {
        if let Ok(mut state) = self.state.lock() {
            state.requests.push(request);
        }
    }

    /// Any match batch containing this investor fails as a whole
    pub fn fail_matches_for(&self, investor_id: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.failing_investors.insert(investor_id.to_string());
        }
    }

    pub fn fail_request_inserts(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_request_inserts = fail;
        }
    }

    pub fn fail_activity(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_activity = fail;
        }
    }

    pub fn requests_for(&self, founder_id: &str) -> Vec<FundingRequest> {
        self.state
            .lock()
            .map(|state| {
                state
                    .requests
                    .iter()
                    .filter(|r| r.founder_id == founder_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn matches(&self) -> Vec<FounderInvestorMatch> {
        self.state
            .lock()
            .map(|state| state.matches.clone())
            .unwrap_or_default()
    }

    pub fn activity(&self) -> Vec<ActivityRecord> {
        self.state
            .lock()
            .map(|state| state.activity.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl FundingStore for InMemoryFundingStore {
    async fn find_active_request(
        &self,
        founder_id: &str,
    ) -> Result<Option<FundingRequest>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .requests
            .iter()
            .find(|r| r.founder_id == founder_id && r.status.is_active())
            .cloned())
    }

    async fn insert_funding_request(
        &self,
        request: NewFundingRequest,
    ) -> Result<FundingRequest, StoreError> {
        let mut state = self.lock()?;

        if state.fail_request_inserts {
            return Err(StoreError::Unavailable("request inserts disabled".into()));
        }

        // Check and insert under the same lock
        if state
            .requests
            .iter()
            .any(|r| r.founder_id == request.founder_id && r.status.is_active())
        {
            return Err(StoreError::ActiveRequestExists(request.founder_id));
        }

        let request = request.into_request(Utc::now());
        state.requests.push(request.clone());
        Ok(request)
    }

    async fn get_funding_request(&self, id: Uuid) -> Result<Option<FundingRequest>, StoreError> {
        let state = self.lock()?;
        Ok(state.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn close_funding_request(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        match state
            .requests
            .iter_mut()
            .find(|r| r.id == id && r.status.is_active())
        {
            Some(request) => {
                request.status = crate::models::FundingRequestStatus::Closed;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_matches(&self, matches: &[FounderInvestorMatch]) -> Result<(), StoreError> {
        let mut state = self.lock()?;

        let mut staged: Vec<FounderInvestorMatch> = Vec::with_capacity(matches.len());
        for m in matches {
            if state.failing_investors.contains(&m.investor_id) {
                return Err(StoreError::Unavailable(format!(
                    "write rejected for investor {}",
                    m.investor_id
                )));
            }

            let duplicate = state
                .matches
                .iter()
                .chain(staged.iter())
                .any(|existing| {
                    existing.funding_request_id == m.funding_request_id
                        && existing.investor_id == m.investor_id
                });
            if duplicate {
                return Err(StoreError::DuplicateMatch {
                    funding_request_id: m.funding_request_id,
                    investor_id: m.investor_id.clone(),
                });
            }

            staged.push(m.clone());
        }

        state.matches.extend(staged);
        Ok(())
    }

    async fn update_delivery_status(
        &self,
        funding_request_id: Uuid,
        investor_ids: &[String],
        status: DeliveryStatus,
    ) -> Result<u64, StoreError> {
        let mut state = self.lock()?;
        let mut updated = 0;
        for m in state.matches.iter_mut().filter(|m| {
            m.funding_request_id == funding_request_id && investor_ids.contains(&m.investor_id)
        }) {
            m.delivery_status = status;
            updated += 1;
        }
        Ok(updated)
    }

    async fn list_matches(
        &self,
        funding_request_id: Uuid,
    ) -> Result<Vec<FounderInvestorMatch>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .matches
            .iter()
            .filter(|m| m.funding_request_id == funding_request_id)
            .cloned()
            .collect())
    }

    async fn match_counts(&self, funding_request_id: Uuid) -> Result<MatchCounts, StoreError> {
        let matches = self.list_matches(funding_request_id).await?;
        Ok(MatchCounts::from_matches(&matches))
    }

    async fn record_activity(&self, record: &ActivityRecord) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.fail_activity {
            return Err(StoreError::Unavailable("activity log disabled".into()));
        }
        state.activity.push(record.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(self.state.lock().is_ok())
    }
}

#[derive(Default)]
struct DirectoryState {
    founders: HashMap<String, FounderProfile>,
    investors: HashMap<String, InvestorRecord>,
    unavailable: bool,
    fail_document_lookups: bool,
}

/// Founder and investor profiles held in memory
#[derive(Default)]
pub struct InMemoryDirectory {
    state: Mutex<DirectoryState>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, DirectoryState>, DirectoryError> {
        let state = self
            .state
            .lock()
            .map_err(|_| DirectoryError::Unavailable("directory lock poisoned".into()))?;
        if state.unavailable {
            return Err(DirectoryError::Unavailable("directory offline".into()));
        }
        Ok(state)
    }

    pub fn add_founder(&self, founder: FounderProfile) {
        if let Ok(mut state) = self.state.lock() {
            state.founders.insert(founder.user_id.clone(), founder);
        }
    }

    pub fn add_investor(&self, investor: InvestorRecord) {
        if let Ok(mut state) = self.state.lock() {
            state.investors.insert(investor.user_id.clone(), investor);
        }
    }

    /// Every lookup fails while set
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.unavailable = unavailable;
        }
    }

    /// Document lookups fail while profile reads keep working
    pub fn fail_document_lookups(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_document_lookups = fail;
        }
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryDirectory {
    async fn get_founder(&self, founder_id: &str) -> Result<FounderProfile, DirectoryError> {
        let state = self.lock()?;
        state.founders.get(founder_id).cloned().ok_or_else(|| {
            DirectoryError::NotFound(format!("Founder profile not found for user {}", founder_id))
        })
    }

    async fn find_investors(
        &self,
        investor_ids: &[String],
    ) -> Result<Vec<InvestorRecord>, DirectoryError> {
        let state = self.lock()?;
        Ok(investor_ids
            .iter()
            .filter_map(|id| state.investors.get(id).cloned())
            .collect())
    }

    async fn founder_documents(
        &self,
        founder_id: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<FounderDocument>, DirectoryError> {
        let state = self.lock()?;
        if state.fail_document_lookups {
            return Err(DirectoryError::Unavailable("document lookups disabled".into()));
        }
        let founder = state.founders.get(founder_id).ok_or_else(|| {
            DirectoryError::NotFound(format!("Founder profile not found for user {}", founder_id))
        })?;
        Ok(query.apply(&founder.documents))
    }
}
