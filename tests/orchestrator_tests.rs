// Integration tests for the funding request flow against in-memory collaborators

mod common;

use common::{
    create_request, document, existing_request, founder, investor, DispatchMode, Harness,
};
use fundlink::core::{EligibilityGuard, ErrorKind, FundingError};
use fundlink::models::{DeliveryStatus, FundingRequestStatus, NewFundingRequest, FundingStage};
use fundlink::services::{FundingStore, StoreError};
use fundlink::Caller;

fn caller(id: &str) -> Caller {
    Caller::new(id, "founder")
}

fn delivery_of(harness: &Harness, investor_id: &str) -> Option<DeliveryStatus> {
    harness
        .store
        .matches()
        .iter()
        .find(|m| m.investor_id == investor_id)
        .map(|m| m.delivery_status)
}

/// Founder f1 with two verified documents and one draft; investor i1 reachable
fn scenario_c(mode: DispatchMode) -> Harness {
    let harness = Harness::new(mode);
    harness.directory.add_founder(founder(
        "f1",
        "complete",
        vec![document("d1", true), document("draft", false), document("d2", true)],
    ));
    harness.directory.add_investor(investor("i1", Some("grace@difference.vc")));
    harness
}

#[tokio::test]
async fn test_incomplete_profile_is_rejected_without_writes() {
    let harness = Harness::new(DispatchMode::Deliver);
    harness.directory.add_founder(founder("f1", "pending", vec![]));

    let err = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&[], false))
        .await
        .unwrap_err();

    assert!(matches!(err, FundingError::NotEligible { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(harness.store.requests_for("f1").is_empty());
}

#[tokio::test]
async fn test_unknown_founder_is_not_eligible() {
    let harness = Harness::new(DispatchMode::Deliver);

    let err = harness
        .orchestrator
        .create_funding_request(&caller("ghost"), create_request(&[], false))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 422);
}

#[tokio::test]
async fn test_open_request_blocks_a_new_one() {
    let harness = Harness::new(DispatchMode::Deliver);
    harness.directory.add_founder(founder("f1", "complete", vec![]));
    harness
        .store
        .seed_request(existing_request("f1", FundingRequestStatus::Open));

    let err = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&[], false))
        .await
        .unwrap_err();

    assert!(matches!(err, FundingError::ConflictingActiveRequest(_)));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(harness.store.requests_for("f1").len(), 1);
}

#[tokio::test]
async fn test_closed_request_does_not_block() {
    let harness = Harness::new(DispatchMode::Deliver);
    harness.directory.add_founder(founder("f1", "complete", vec![]));
    harness
        .store
        .seed_request(existing_request("f1", FundingRequestStatus::Closed));

    let data = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&[], false))
        .await
        .unwrap();

    assert_eq!(data.funding_request.status, FundingRequestStatus::Open);
    assert_eq!(harness.store.requests_for("f1").len(), 2);
}

#[tokio::test]
async fn test_outreach_to_resolved_investor_with_verified_documents() {
    let harness = scenario_c(DispatchMode::Deliver);

    let data = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&["i1", "i2"], true))
        .await
        .unwrap();

    assert_eq!(data.funding_request.status, FundingRequestStatus::Open);
    assert_eq!(data.funding_request.refresh_count, 0);

    let outcome = data.email_results.expect("outreach was requested");
    assert!(outcome.success);

    let matches = harness.store.matches();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].investor_id, "i1");
    assert_eq!(matches[0].assigned_by, "f1");
    assert_eq!(delivery_of(&harness, "i1"), Some(DeliveryStatus::Sent));

    let calls = harness.dispatcher.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].recipients.len(), 1);
    assert_eq!(calls[0].recipients[0].email, "grace@difference.vc");
    assert_eq!(calls[0].document_ids, vec!["d1", "d2"]);
    assert!(calls[0].message.contains("Ada Lovelace"));
    assert!(calls[0].message.contains("Series A"));

    assert_eq!(data.funding_request.contacted_investors_count, 1);
    assert_eq!(data.funding_request.total_emails_sent, 1);
}

#[tokio::test]
async fn test_dispatcher_error_still_creates_request() {
    let harness = scenario_c(DispatchMode::Raise);

    let data = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&["i1", "i2"], true))
        .await
        .unwrap();

    let outcome = data.email_results.expect("outreach was requested");
    assert!(!outcome.success);
    assert!(outcome.message.contains("mailer crashed"));

    assert_eq!(harness.store.requests_for("f1").len(), 1);
    assert_eq!(delivery_of(&harness, "i1"), Some(DeliveryStatus::Failed));
    assert_eq!(data.funding_request.contacted_investors_count, 0);
    assert_eq!(data.funding_request.total_emails_sent, 0);
}

#[tokio::test]
async fn test_failed_and_skipped_investors_are_not_counted_as_contacted() {
    let harness = scenario_c(DispatchMode::Raise);
    harness.directory.add_investor(investor("i2", None));

    let data = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&["i1", "i2"], true))
        .await
        .unwrap();

    assert_eq!(delivery_of(&harness, "i1"), Some(DeliveryStatus::Failed));
    assert_eq!(delivery_of(&harness, "i2"), Some(DeliveryStatus::Skipped));
    assert_eq!(data.funding_request.contacted_investors_count, 0);
    assert_eq!(data.funding_request.total_emails_sent, 0);
}

#[tokio::test]
async fn test_raised_dispatch_is_logged_as_one_step() {
    let harness = scenario_c(DispatchMode::Raise);

    let data = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&["i1"], true))
        .await
        .unwrap();

    let outcome = data.email_results.unwrap();
    let steps = outcome.data["steps"].as_array().unwrap();
    let names: Vec<&str> = steps.iter().filter_map(|s| s["step"].as_str()).collect();
    assert_eq!(
        names,
        vec![
            "investors_resolved",
            "matches_recorded",
            "contactable_filtered",
            "documents_selected",
            "dispatched"
        ]
    );
    let dispatched = &steps[4];
    assert_eq!(dispatched["success"], false);
    assert!(dispatched["error"].as_str().unwrap().contains("mailer crashed"));
}

#[tokio::test]
async fn test_provider_rejection_marks_matches_failed() {
    let harness = scenario_c(DispatchMode::Reject);

    let data = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&["i1"], true))
        .await
        .unwrap();

    let outcome = data.email_results.unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.data["provider"]["status"], 503);
    assert_eq!(delivery_of(&harness, "i1"), Some(DeliveryStatus::Failed));
}

#[tokio::test]
async fn test_no_outreach_requested() {
    let harness = scenario_c(DispatchMode::Deliver);

    let data = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&["i1"], false))
        .await
        .unwrap();

    assert!(data.email_results.is_none());
    assert!(harness.store.matches().is_empty());
    assert!(harness.dispatcher.calls().is_empty());
    assert!(harness.store.activity().is_empty());
}

#[tokio::test]
async fn test_closing_a_request_allows_the_next_one() {
    let harness = scenario_c(DispatchMode::Deliver);
    let first = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&["i1"], true))
        .await
        .unwrap();

    let blocked = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&[], false))
        .await;
    assert!(matches!(blocked, Err(FundingError::ConflictingActiveRequest(_))));

    assert!(harness
        .store
        .close_funding_request(first.funding_request.id)
        .await
        .unwrap());

    let second = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&[], false))
        .await
        .unwrap();

    assert_ne!(second.funding_request.id, first.funding_request.id);
    let earlier = harness
        .store
        .list_matches(first.funding_request.id)
        .await
        .unwrap();
    assert_eq!(earlier.len(), 1);
    assert_eq!(second.funding_request.contacted_investors_count, 0);
}

#[tokio::test]
async fn test_guard_race_is_closed_by_constrained_insert() {
    let harness = Harness::new(DispatchMode::Deliver);
    harness.directory.add_founder(founder("f1", "complete", vec![]));
    let guard = EligibilityGuard::new(harness.store.clone(), harness.directory.clone());

    // Both callers pass the read-only guard before either writes
    guard.check_eligibility("f1").await.unwrap();
    guard.check_eligibility("f1").await.unwrap();

    let new_request = || NewFundingRequest {
        founder_id: "f1".to_string(),
        funding_stage: FundingStage::Seed,
        use_of_funds: "Runway".to_string(),
        business_plan: None,
        financial_projections: None,
        additional_notes: None,
    };

    harness
        .store
        .insert_funding_request(new_request())
        .await
        .unwrap();
    let second = harness.store.insert_funding_request(new_request()).await;

    assert!(matches!(second, Err(StoreError::ActiveRequestExists(_))));
    let err = FundingError::from(second.unwrap_err());
    assert!(matches!(err, FundingError::ConflictingActiveRequest(_)));

    let active = harness
        .store
        .requests_for("f1")
        .iter()
        .filter(|r| r.status.is_active())
        .count();
    assert_eq!(active, 1);
}

#[tokio::test]
async fn test_concurrent_creates_leave_one_active_request() {
    let harness = Harness::interleaved(DispatchMode::Deliver);
    harness.directory.add_founder(founder("f1", "complete", vec![]));
    let founder_caller = caller("f1");

    let (first, second) = tokio::join!(
        harness
            .orchestrator
            .create_funding_request(&founder_caller, create_request(&[], false)),
        harness
            .orchestrator
            .create_funding_request(&founder_caller, create_request(&[], false)),
    );

    let results = [first, second];
    let created = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(FundingError::ConflictingActiveRequest(_))))
        .count();
    assert_eq!(created, 1);
    assert_eq!(conflicts, 1);

    let active = harness
        .store
        .requests_for("f1")
        .iter()
        .filter(|r| r.status.is_active())
        .count();
    assert_eq!(active, 1);
}

#[tokio::test]
async fn test_match_batch_failure_is_reported_not_fatal() {
    let harness = scenario_c(DispatchMode::Deliver);
    harness.directory.add_investor(investor("i2", Some("charles@difference.vc")));
    harness.store.fail_matches_for("i2");

    let data = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&["i1", "i2"], true))
        .await
        .unwrap();

    let outcome = data.email_results.unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.data["kind"], "persistence");
    assert!(harness.store.matches().is_empty());
    assert!(harness.dispatcher.calls().is_empty());
    assert_eq!(harness.store.requests_for("f1").len(), 1);
}

#[tokio::test]
async fn test_uncontactable_investors_are_skipped() {
    let harness = scenario_c(DispatchMode::Deliver);
    harness.directory.add_investor(investor("i2", None));

    let data = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&["i2", "i1"], true))
        .await
        .unwrap();

    assert!(data.email_results.unwrap().success);
    assert_eq!(delivery_of(&harness, "i1"), Some(DeliveryStatus::Sent));
    assert_eq!(delivery_of(&harness, "i2"), Some(DeliveryStatus::Skipped));
    assert_eq!(data.funding_request.contacted_investors_count, 1);
    assert_eq!(data.funding_request.total_emails_sent, 1);
}

#[tokio::test]
async fn test_nobody_contactable_skips_dispatch() {
    let harness = Harness::new(DispatchMode::Deliver);
    harness.directory.add_founder(founder("f1", "complete", vec![]));
    harness.directory.add_investor(investor("i1", Some("not-an-email")));

    let data = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&["i1"], true))
        .await
        .unwrap();

    let outcome = data.email_results.unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.data["kind"], "resolution");
    assert!(harness.dispatcher.calls().is_empty());
    assert_eq!(delivery_of(&harness, "i1"), Some(DeliveryStatus::Skipped));
}

#[tokio::test]
async fn test_unknown_investors_only() {
    let harness = scenario_c(DispatchMode::Deliver);

    let data = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&["nobody"], true))
        .await
        .unwrap();

    let outcome = data.email_results.unwrap();
    assert!(!outcome.success);
    assert!(harness.store.matches().is_empty());
    assert_eq!(harness.store.activity().len(), 1);
}

#[tokio::test]
async fn test_founder_without_documents_gets_degraded_message() {
    let harness = Harness::new(DispatchMode::Deliver);
    harness.directory.add_founder(founder("f1", "complete", vec![]));
    harness.directory.add_investor(investor("i1", Some("grace@difference.vc")));

    let data = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&["i1"], true))
        .await
        .unwrap();

    assert!(data.email_results.unwrap().success);
    let calls = harness.dispatcher.calls();
    assert!(calls[0].document_ids.is_empty());
    assert!(calls[0].message.contains("available on request"));
}

#[tokio::test]
async fn test_explicit_documents_and_custom_message() {
    let harness = scenario_c(DispatchMode::Deliver);
    let mut request = create_request(&["i1"], true);
    request.specified_pitch_deck_document_ids = vec!["draft".to_string()];
    request.custom_email_message = Some("Would love your thoughts on our deck.".to_string());

    harness
        .orchestrator
        .create_funding_request(&caller("f1"), request)
        .await
        .unwrap();

    let calls = harness.dispatcher.calls();
    assert_eq!(calls[0].document_ids, vec!["draft"]);
    assert_eq!(calls[0].message, "Would love your thoughts on our deck.");
}

#[tokio::test]
async fn test_duplicate_investor_ids_produce_one_match() {
    let harness = scenario_c(DispatchMode::Deliver);

    harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&["i1", "i1", " i1 "], true))
        .await
        .unwrap();

    assert_eq!(harness.store.matches().len(), 1);
    assert_eq!(harness.dispatcher.calls()[0].recipients.len(), 1);
}

#[tokio::test]
async fn test_outreach_writes_one_activity_record() {
    let harness = scenario_c(DispatchMode::Deliver);

    let data = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&["i1"], true))
        .await
        .unwrap();

    let activity = harness.store.activity();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].action, "funding_request.outreach");
    assert_eq!(activity[0].funding_request_id, data.funding_request.id);
    assert!(activity[0].success);
}

#[tokio::test]
async fn test_activity_log_failure_is_ignored() {
    let harness = scenario_c(DispatchMode::Deliver);
    harness.store.fail_activity(true);

    let data = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&["i1"], true))
        .await
        .unwrap();

    assert!(data.email_results.unwrap().success);
}

#[tokio::test]
async fn test_outreach_steps_are_reported() {
    let harness = scenario_c(DispatchMode::Deliver);

    let data = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&["i1", "i2"], true))
        .await
        .unwrap();

    let outcome = data.email_results.unwrap();
    let steps = outcome.data["steps"].as_array().unwrap();
    let names: Vec<&str> = steps.iter().filter_map(|s| s["step"].as_str()).collect();
    assert_eq!(
        names,
        vec![
            "investors_resolved",
            "matches_recorded",
            "contactable_filtered",
            "documents_selected",
            "dispatched"
        ]
    );
    assert_eq!(steps[0]["missing"][0], "i2");
    assert_eq!(steps[3]["tier"], "verified");
}

#[tokio::test]
async fn test_founder_cannot_act_for_another() {
    let harness = Harness::new(DispatchMode::Deliver);
    harness.directory.add_founder(founder("f2", "complete", vec![]));
    let mut request = create_request(&[], false);
    request.founder_id = Some("f2".to_string());

    let err = harness
        .orchestrator
        .create_funding_request(&caller("f1"), request)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 403);
    assert!(harness.store.requests_for("f2").is_empty());
}

#[tokio::test]
async fn test_admin_can_act_for_founder() {
    let harness = Harness::new(DispatchMode::Deliver);
    harness.directory.add_founder(founder("f2", "complete", vec![]));
    let mut request = create_request(&[], false);
    request.founder_id = Some("f2".to_string());

    let data = harness
        .orchestrator
        .create_funding_request(&Caller::new("ops", "admin"), request)
        .await
        .unwrap();

    assert_eq!(data.funding_request.founder.id, "f2");
    assert_eq!(harness.store.requests_for("f2").len(), 1);
}

#[tokio::test]
async fn test_invalid_input_writes_nothing() {
    let harness = Harness::new(DispatchMode::Deliver);
    harness.directory.add_founder(founder("f1", "complete", vec![]));
    let mut request = create_request(&[], true);
    request.use_of_funds = "  ".to_string();

    let err = harness
        .orchestrator
        .create_funding_request(&caller("f1"), request)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert!(harness.store.requests_for("f1").is_empty());
}

#[tokio::test]
async fn test_directory_outage_is_not_an_eligibility_failure() {
    let harness = Harness::new(DispatchMode::Deliver);
    harness.directory.add_founder(founder("f1", "complete", vec![]));
    harness.directory.set_unavailable(true);

    let err = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&[], false))
        .await
        .unwrap_err();

    assert!(matches!(err, FundingError::Directory(_)));
    assert_eq!(err.status_code(), 502);
}

#[tokio::test]
async fn test_primary_insert_failure_is_fatal() {
    let harness = Harness::new(DispatchMode::Deliver);
    harness.directory.add_founder(founder("f1", "complete", vec![]));
    harness.store.fail_request_inserts(true);

    let err = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&[], false))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn test_read_back_with_counts() {
    let harness = scenario_c(DispatchMode::Deliver);
    let created = harness
        .orchestrator
        .create_funding_request(&caller("f1"), create_request(&["i1"], true))
        .await
        .unwrap();
    let id = created.funding_request.id;

    let view = harness
        .orchestrator
        .get_funding_request(&caller("f1"), id)
        .await
        .unwrap();
    assert_eq!(view.contacted_investors_count, 1);
    assert_eq!(view.total_emails_sent, 1);
    assert_eq!(view.founder.name, "Ada Lovelace");

    let hidden = harness
        .orchestrator
        .get_funding_request(&caller("f2"), id)
        .await
        .unwrap_err();
    assert!(matches!(hidden, FundingError::NotFound(_)));

    assert!(harness
        .orchestrator
        .get_funding_request(&Caller::new("ops", "admin"), id)
        .await
        .is_ok());
}
