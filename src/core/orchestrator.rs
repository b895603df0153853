use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Caller;
use crate::core::documents::{DocumentSelection, DocumentSelector, SelectionTier, TierAttempt};
use crate::core::eligibility::EligibilityGuard;
use crate::core::error::{ErrorKind, FundingError, OutreachError};
use crate::core::message::outreach_message;
use crate::core::recorder::MatchRecorder;
use crate::core::resolver::InvestorResolver;
use crate::models::{
    ActivityRecord, CreateFundingRequest, DeliveryStatus, FounderProfile, FounderSummary,
    FundingRequest, FundingRequestData, FundingRequestView, MatchCounts, NewFundingRequest,
    OutreachOutcome,
};
use crate::services::{FundingStore, OutreachDispatch, OutreachDispatcher, ProfileDirectory};

const OUTREACH_ACTION: &str = "funding_request.outreach";

/// Tunables for the creation flow
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Roles allowed to create requests on behalf of another founder
    pub elevated_roles: Vec<String>,
    /// Try verified documents before falling back to everything
    pub prefer_verified_documents: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            elevated_roles: vec!["admin".to_string()],
            prefer_verified_documents: true,
        }
    }
}

/// One step of the outreach branch, kept for the caller and the logs
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum OutreachStep {
    InvestorsResolved {
        found: usize,
        missing: Vec<String>,
    },
    MatchesRecorded {
        count: usize,
    },
    ContactableFiltered {
        contactable: usize,
        skipped: Vec<String>,
    },
    DocumentsSelected {
        tier: Option<SelectionTier>,
        count: usize,
        attempts: Vec<TierAttempt>,
    },
    Dispatched {
        success: bool,
        recipients: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Failed {
        kind: ErrorKind,
        reason: String,
    },
}

/// Accumulates what happened in the outreach branch
#[derive(Debug, Default)]
struct OutreachLog {
    steps: Vec<OutreachStep>,
    recorded: Vec<String>,
    skipped: Vec<String>,
    settled: bool,
}

impl OutreachLog {
    fn push(&mut self, step: OutreachStep) {
        self.steps.push(step);
    }

    fn steps_json(&self) -> Value {
        serde_json::to_value(&self.steps).unwrap_or(Value::Null)
    }
}

/// Coordinates funding request creation and the optional investor outreach
///
/// # Flow
/// 1. Eligibility gate (no writes on failure)
/// 2. Constrained insert of the `open` request: the commit point
/// 3. Optional outreach: resolve investors, record matches, filter
///    contactable, select documents, dispatch
/// 4. Assemble the response with derived counts
///
/// Nothing after step 2 can fail the call.
#[derive(Clone)]
pub struct FundingRequestOrchestrator {
    store: Arc<dyn FundingStore>,
    directory: Arc<dyn ProfileDirectory>,
    dispatcher: Arc<dyn OutreachDispatcher>,
    guard: EligibilityGuard,
    resolver: InvestorResolver,
    recorder: MatchRecorder,
    selector: DocumentSelector,
    settings: OrchestratorSettings,
}

impl FundingRequestOrchestrator {
    pub fn new(
        store: Arc<dyn FundingStore>,
        directory: Arc<dyn ProfileDirectory>,
        dispatcher: Arc<dyn OutreachDispatcher>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            guard: EligibilityGuard::new(store.clone(), directory.clone()),
            resolver: InvestorResolver::new(directory.clone()),
            recorder: MatchRecorder::new(store.clone()),
            selector: DocumentSelector::new(directory.clone()),
            store,
            directory,
            dispatcher,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn FundingStore> {
        &self.store
    }

    /// Create a funding request and, if asked, reach out to investors
    pub async fn create_funding_request(
        &self,
        caller: &Caller,
        request: CreateFundingRequest,
    ) -> Result<FundingRequestData, FundingError> {
        let founder_id = self.effective_founder_id(caller, request.founder_id.as_deref())?;

        request
            .validate()
            .map_err(|e| FundingError::InvalidInput(e.to_string()))?;

        let founder = self.guard.check_eligibility(&founder_id).await?;

        let funding_request = self
            .store
            .insert_funding_request(NewFundingRequest {
                founder_id: founder_id.clone(),
                funding_stage: request.funding_stage,
                use_of_funds: request.use_of_funds.trim().to_string(),
                business_plan: request.business_plan.clone(),
                financial_projections: request.financial_projections.clone(),
                additional_notes: request.additional_notes.clone(),
            })
            .await?;

        tracing::info!(
            "Created funding request {} for founder {} ({})",
            funding_request.id,
            founder_id,
            funding_request.funding_stage.label()
        );

        let email_results = if request.wants_outreach() {
            Some(
                self.run_outreach(caller, &founder, &funding_request, &request)
                    .await,
            )
        } else {
            None
        };

        let counts = self.counts_for(funding_request.id).await;

        Ok(FundingRequestData {
            funding_request: FundingRequestView::new(
                &funding_request,
                FounderSummary::from(&founder),
                counts,
            ),
            email_results,
        })
    }

    /// Read a funding request with its derived counts
    pub async fn get_funding_request(
        &self,
        caller: &Caller,
        id: Uuid,
    ) -> Result<FundingRequestView, FundingError> {
        let funding_request = self
            .store
            .get_funding_request(id)
            .await?
            .ok_or_else(|| FundingError::NotFound(id.to_string()))?;

        if funding_request.founder_id != caller.user_id
            && !caller.has_any_role(&self.settings.elevated_roles)
        {
            // Indistinguishable from a missing request for other founders
            return Err(FundingError::NotFound(id.to_string()));
        }

        let founder = match self.directory.get_founder(&funding_request.founder_id).await {
            Ok(profile) => FounderSummary::from(&profile),
            Err(e) if e.is_not_found() => FounderSummary {
                id: funding_request.founder_id.clone(),
                name: String::new(),
                company_name: None,
                email: None,
            },
            Err(e) => return Err(e.into()),
        };

        let counts = self.store.match_counts(id).await?;

        Ok(FundingRequestView::new(&funding_request, founder, counts))
    }

    fn effective_founder_id(
        &self,
        caller: &Caller,
        requested: Option<&str>,
    ) -> Result<String, FundingError> {
        match requested.map(str::trim).filter(|id| !id.is_empty()) {
            None => Ok(caller.user_id.clone()),
            Some(id) if id == caller.user_id => Ok(id.to_string()),
            Some(id) if caller.has_any_role(&self.settings.elevated_roles) => Ok(id.to_string()),
            Some(id) => Err(FundingError::Forbidden(id.to_string())),
        }
    }

    async fn counts_for(&self, funding_request_id: Uuid) -> MatchCounts {
        match self.store.match_counts(funding_request_id).await {
            Ok(counts) => counts,
            Err(e) => {
                tracing::warn!(
                    "Could not count matches for funding request {}: {}",
                    funding_request_id,
                    e
                );
                MatchCounts::default()
            }
        }
    }

    /// Run the outreach branch and fold whatever happened into one outcome
    async fn run_outreach(
        &self,
        caller: &Caller,
        founder: &FounderProfile,
        funding_request: &FundingRequest,
        request: &CreateFundingRequest,
    ) -> OutreachOutcome {
        let mut log = OutreachLog::default();

        let outcome = match self
            .outreach_branch(founder, funding_request, request, &caller.user_id, &mut log)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    "Outreach for funding request {} failed: {}",
                    funding_request.id,
                    e
                );
                log.push(OutreachStep::Failed {
                    kind: e.kind(),
                    reason: e.to_string(),
                });
                self.settle_unsent(funding_request.id, &mut log).await;

                OutreachOutcome::failed(
                    e.to_string(),
                    json!({ "kind": e.kind(), "steps": log.steps_json() }),
                )
            }
        };

        let activity = ActivityRecord {
            id: Uuid::new_v4(),
            actor_id: caller.user_id.clone(),
            action: OUTREACH_ACTION.to_string(),
            funding_request_id: funding_request.id,
            success: outcome.success,
            message: outcome.message.clone(),
            created_at: Utc::now(),
        };
        if let Err(e) = self.store.record_activity(&activity).await {
            tracing::warn!(
                "Failed to log outreach activity for funding request {}: {}",
                funding_request.id,
                e
            );
        }

        outcome
    }

    async fn outreach_branch(
        &self,
        founder: &FounderProfile,
        funding_request: &FundingRequest,
        request: &CreateFundingRequest,
        assigned_by: &str,
        log: &mut OutreachLog,
    ) -> Result<OutreachOutcome, OutreachError> {
        let resolution = self.resolver.resolve(&request.investor_ids).await?;
        log.push(OutreachStep::InvestorsResolved {
            found: resolution.found.len(),
            missing: resolution.missing.clone(),
        });

        let found_ids = resolution.found_ids();
        self.recorder
            .record_matches(
                funding_request.id,
                &founder.user_id,
                &found_ids,
                assigned_by,
            )
            .await?;
        log.recorded = found_ids.clone();
        log.push(OutreachStep::MatchesRecorded {
            count: found_ids.len(),
        });

        let contactable = InvestorResolver::contactable(&resolution.found);
        let recipients = contactable.as_deref().unwrap_or_default();
        log.skipped = found_ids
            .iter()
            .filter(|id| !recipients.iter().any(|r| r.investor_id == id.as_str()))
            .cloned()
            .collect();
        log.push(OutreachStep::ContactableFiltered {
            contactable: recipients.len(),
            skipped: log.skipped.clone(),
        });
        if !log.skipped.is_empty() {
            if let Err(e) = self
                .recorder
                .mark_delivery(funding_request.id, &log.skipped, DeliveryStatus::Skipped)
                .await
            {
                tracing::warn!("Failed to tag uncontactable matches as skipped: {}", e);
            }
        }
        let recipients = contactable?;

        let selection = self
            .selector
            .select_documents(
                &founder.user_id,
                &request.specified_pitch_deck_document_ids,
                self.settings.prefer_verified_documents,
            )
            .await?;
        log.push(documents_step(&selection));

        let message = outreach_message(
            request.custom_email_message.as_deref(),
            founder,
            funding_request.funding_stage,
            &funding_request.use_of_funds,
            !selection.is_empty(),
        );

        let dispatch = OutreachDispatch {
            founder: founder.clone(),
            recipients,
            document_ids: selection.document_ids(),
            message,
            funding_request_id: funding_request.id,
        };

        let (provider, raised) = match self.dispatcher.dispatch(&dispatch).await {
            Ok(outcome) => (outcome, None),
            Err(e) => {
                let e = OutreachError::from(e);
                tracing::error!(
                    "Outreach dispatcher raised for funding request {}: {}",
                    funding_request.id,
                    e
                );
                (
                    OutreachOutcome::failed(e.to_string(), Value::Null),
                    Some(e.to_string()),
                )
            }
        };
        log.push(OutreachStep::Dispatched {
            success: provider.success,
            recipients: dispatch.recipients.len(),
            error: raised,
        });

        let delivered: Vec<String> = dispatch
            .recipients
            .iter()
            .map(|r| r.investor_id.clone())
            .collect();
        let delivery = if provider.success {
            DeliveryStatus::Sent
        } else {
            DeliveryStatus::Failed
        };
        if let Err(e) = self
            .recorder
            .mark_delivery(funding_request.id, &delivered, delivery)
            .await
        {
            tracing::warn!("Failed to tag delivered matches as {:?}: {}", delivery, e);
        }
        log.settled = true;

        tracing::info!(
            "Outreach for funding request {} to {} investors: success={}",
            funding_request.id,
            delivered.len(),
            provider.success
        );

        Ok(OutreachOutcome {
            success: provider.success,
            message: provider.message,
            data: json!({
                "provider": provider.data,
                "steps": log.steps_json(),
            }),
        })
    }

    /// Matches recorded before a branch failure were never delivered
    async fn settle_unsent(&self, funding_request_id: Uuid, log: &mut OutreachLog) {
        if log.settled || log.recorded.is_empty() {
            return;
        }

        let unsent: Vec<String> = log
            .recorded
            .iter()
            .filter(|id| !log.skipped.contains(*id))
            .cloned()
            .collect();

        if let Err(e) = self
            .recorder
            .mark_delivery(funding_request_id, &unsent, DeliveryStatus::Failed)
            .await
        {
            tracing::warn!("Failed to tag unsent matches as failed: {}", e);
        }
        log.settled = true;
    }
}

fn documents_step(selection: &DocumentSelection) -> OutreachStep {
    OutreachStep::DocumentsSelected {
        tier: selection.tier,
        count: selection.documents.len(),
        attempts: selection.attempts.clone(),
    }
}
