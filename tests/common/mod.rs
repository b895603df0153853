// Shared fixtures for the integration suites
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use fundlink::core::{FundingRequestOrchestrator, OrchestratorSettings};
use fundlink::models::{
    ActivityRecord, CreateFundingRequest, DeliveryStatus, FounderDocument, FounderInvestorMatch,
    FounderProfile, FundingRequest, FundingRequestStatus, FundingStage, InvestorRecord,
    MatchCounts, NewFundingRequest, OutreachOutcome,
};
use fundlink::services::{
    DispatchError, FundingStore, InMemoryDirectory, InMemoryFundingStore, OutreachDispatch,
    OutreachDispatcher, StoreError,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// How the fake dispatcher answers
#[derive(Debug, Clone, Copy)]
pub enum DispatchMode {
    Deliver,
    Reject,
    Raise,
}

/// Dispatcher that remembers every call it receives
pub struct RecordingDispatcher {
    mode: DispatchMode,
    calls: Mutex<Vec<OutreachDispatch>>,
}

impl RecordingDispatcher {
    pub fn new(mode: DispatchMode) -> Self {
        Self {
            mode,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<OutreachDispatch> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OutreachDispatcher for RecordingDispatcher {
    async fn dispatch(&self, request: &OutreachDispatch) -> Result<OutreachOutcome, DispatchError> {
        self.calls.lock().unwrap().push(request.clone());

        match self.mode {
            DispatchMode::Deliver => Ok(OutreachOutcome {
                success: true,
                message: format!("Sent to {} investors", request.recipients.len()),
                data: json!({ "delivered": request.recipients.len() }),
            }),
            DispatchMode::Reject => Ok(OutreachOutcome::failed(
                "Provider rejected the batch",
                json!({ "status": 503 }),
            )),
            DispatchMode::Raise => Err(DispatchError::Internal("mailer crashed".into())),
        }
    }
}

pub struct Harness {
    pub store: Arc<InMemoryFundingStore>,
    pub directory: Arc<InMemoryDirectory>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub orchestrator: FundingRequestOrchestrator,
}

/// Store that hands control back to the scheduler after each active-request read,
/// so concurrent creates all pass the guard before any of them inserts
pub struct InterleavingStore {
    inner: Arc<InMemoryFundingStore>,
}

#[async_trait]
impl FundingStore for InterleavingStore {
    async fn find_active_request(
        &self,
        founder_id: &str,
    ) -> Result<Option<FundingRequest>, StoreError> {
        let found = self.inner.find_active_request(founder_id).await;
        tokio::task::yield_now().await;
        found
    }

    async fn insert_funding_request(
        &self,
        request: NewFundingRequest,
    ) -> Result<FundingRequest, StoreError> {
        self.inner.insert_funding_request(request).await
    }

    async fn get_funding_request(&self, id: Uuid) -> Result<Option<FundingRequest>, StoreError> {
        self.inner.get_funding_request(id).await
    }

    async fn close_funding_request(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.close_funding_request(id).await
    }

    async fn insert_matches(&self, matches: &[FounderInvestorMatch]) -> Result<(), StoreError> {
        self.inner.insert_matches(matches).await
    }

    async fn update_delivery_status(
        &self,
        funding_request_id: Uuid,
        investor_ids: &[String],
        status: DeliveryStatus,
    ) -> Result<u64, StoreError> {
        self.inner
            .update_delivery_status(funding_request_id, investor_ids, status)
            .await
    }

    async fn list_matches(
        &self,
        funding_request_id: Uuid,
    ) -> Result<Vec<FounderInvestorMatch>, StoreError> {
        self.inner.list_matches(funding_request_id).await
    }

    async fn match_counts(&self, funding_request_id: Uuid) -> Result<MatchCounts, StoreError> {
        self.inner.match_counts(funding_request_id).await
    }

    async fn record_activity(&self, record: &ActivityRecord) -> Result<(), StoreError> {
        self.inner.record_activity(record).await
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        self.inner.health_check().await
    }
}

impl Harness {
    pub fn new(mode: DispatchMode) -> Self {
        let store = Arc::new(InMemoryFundingStore::new());
        Self::assemble(store.clone(), store, mode)
    }

    /// Harness whose orchestrator interleaves at the eligibility read
    pub fn interleaved(mode: DispatchMode) -> Self {
        let store = Arc::new(InMemoryFundingStore::new());
        let interleaving = Arc::new(InterleavingStore {
            inner: store.clone(),
        });
        Self::assemble(store, interleaving, mode)
    }

    fn assemble(
        store: Arc<InMemoryFundingStore>,
        backing: Arc<dyn FundingStore>,
        mode: DispatchMode,
    ) -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        let dispatcher = Arc::new(RecordingDispatcher::new(mode));
        let orchestrator = FundingRequestOrchestrator::new(
            backing,
            directory.clone(),
            dispatcher.clone(),
            OrchestratorSettings::default(),
        );

        Self {
            store,
            directory,
            dispatcher,
            orchestrator,
        }
    }
}

pub fn document(id: &str, verified: bool) -> FounderDocument {
    FounderDocument {
        document_id: id.to_string(),
        file_name: Some(format!("{}.pdf", id)),
        is_verified: verified,
        uploaded_at: None,
    }
}

pub fn founder(id: &str, signup_status: &str, documents: Vec<FounderDocument>) -> FounderProfile {
    FounderProfile {
        user_id: id.to_string(),
        name: "Ada Lovelace".to_string(),
        company_name: Some("Analytical Engines".to_string()),
        email: Some("ada@engines.io".to_string()),
        signup_status: signup_status.to_string(),
        documents,
    }
}

pub fn investor(id: &str, email: Option<&str>) -> InvestorRecord {
    InvestorRecord {
        user_id: id.to_string(),
        name: format!("Investor {}", id),
        firm: Some("Difference Capital".to_string()),
        email: email.map(str::to_string),
    }
}

pub fn existing_request(founder_id: &str, status: FundingRequestStatus) -> FundingRequest {
    FundingRequest {
        id: Uuid::new_v4(),
        founder_id: founder_id.to_string(),
        funding_stage: FundingStage::Seed,
        use_of_funds: "Earlier round".to_string(),
        business_plan: None,
        financial_projections: None,
        additional_notes: None,
        status,
        refresh_count: 0,
        created_at: Utc::now(),
    }
}

pub fn create_request(investor_ids: &[&str], send_now: bool) -> CreateFundingRequest {
    CreateFundingRequest {
        founder_id: None,
        funding_stage: FundingStage::SeriesA,
        use_of_funds: "Scale the sales team".to_string(),
        business_plan: None,
        financial_projections: None,
        additional_notes: None,
        send_to_investors_immediately: send_now,
        investor_ids: investor_ids.iter().map(|s| s.to_string()).collect(),
        custom_email_message: None,
        specified_pitch_deck_document_ids: vec![],
    }
}
