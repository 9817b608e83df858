// libs/booking-cell/tests/orchestrator_test.rs
//
// Full wizard runs against a mocked PostgREST endpoint: the happy path,
// the credit-limit decision branch, the commit-time conflict rewind and
// unavailable-slot rejection.

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::models::{BookingError, BookingStep, CommitOutcome, LimitResolution};
use booking_cell::services::orchestrator::BookingOrchestrator;
use shared_config::AppConfig;
use shared_utils::test_utils::TestConfig;

const SHOP_ID: &str = "0b54d3a4-9e06-4c1c-a53a-85531f1e5033";
const PRO_ID: &str = "6b8f5f54-2f3e-4a0d-9c06-3d8f8b8f2b11";
const SERVICE_ID: &str = "9c3a1f92-4a5e-4a7e-b1c2-6f0d9a8e7c55";
const CLIENT_ID: &str = "e3b21c84-17b5-4f7e-9b1a-2f8c5d3e6a90";
const SUB_ID: &str = "3f1c2b5a-8d4e-4c6f-a2b1-9e7d5c3a1f80";
const PLAN_ID: &str = "7a9b3c1d-5e2f-4a8b-b6c4-1d9e7f5a3c20";
const APPT_ID: &str = "1d4f6a82-3b9c-4e5d-8f7a-2c6b9d1e4f30";

fn shop() -> Uuid {
    Uuid::parse_str(SHOP_ID).unwrap()
}

fn client() -> Uuid {
    Uuid::parse_str(CLIENT_ID).unwrap()
}

// A Monday far in the future.
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 3, 11).unwrap()
}

fn ts(value: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(value).unwrap()
}

fn config_for(server: &MockServer) -> AppConfig {
    TestConfig::with_base_url(&server.uri()).to_app_config()
}

fn appointment_row(status: &str) -> serde_json::Value {
    json!({
        "id": APPT_ID,
        "barbershop_id": SHOP_ID,
        "professional_id": PRO_ID,
        "client_id": CLIENT_ID,
        "service_id": SERVICE_ID,
        "start_time": "2030-03-11T10:00:00-03:00",
        "end_time": "2030-03-11T10:30:00-03:00",
        "status": status,
        "created_at": "2030-03-01T12:00:00Z",
        "updated_at": "2030-03-01T12:00:00Z"
    })
}

fn usage_rows(n: usize) -> Vec<serde_json::Value> {
    (0..n)
        .map(|_| {
            json!({
                "id": Uuid::new_v4(),
                "subscription_id": SUB_ID,
                "service_id": SERVICE_ID,
                "appointment_id": Uuid::new_v4(),
                "used_at": "2030-03-02T14:00:00Z"
            })
        })
        .collect()
}

/// Mounts the store fixtures every wizard run touches. Specific matchers
/// go first; path-only fallbacks last.
async fn mount_base(server: &MockServer, plan_limit: i32, used_this_month: usize) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/barbershops"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![json!({
            "id": SHOP_ID,
            "name": "Navalha Centro",
            "slug": "navalha-centro",
            "utc_offset_minutes": -180,
            "slot_step_minutes": null
        })]))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/subscriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![json!({
            "id": SUB_ID,
            "client_id": CLIENT_ID,
            "barbershop_id": SHOP_ID,
            "plan_id": PLAN_ID,
            "status": "active"
        })]))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/plan_items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![json!({
            "id": Uuid::new_v4(),
            "plan_id": PLAN_ID,
            "service_id": SERVICE_ID,
            "quantity_limit": plan_limit
        })]))
        .mount(server)
        .await;

    // Monthly usage for credit derivation.
    Mock::given(method("GET"))
        .and(path("/rest/v1/usage_records"))
        .and(query_param("subscription_id", format!("eq.{}", SUB_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(usage_rows(used_this_month)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/professional_services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![json!({
            "professional_id": PRO_ID
        })]))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![json!({
            "id": PRO_ID,
            "barbershop_id": SHOP_ID,
            "display_name": "Marcos",
            "role": "staff",
            "active": true
        })]))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedule_overrides"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedule_days"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![json!({
            "id": Uuid::new_v4(),
            "professional_id": PRO_ID,
            "weekday": 1,
            "is_working": true,
            "start_time": "09:00:00",
            "end_time": "18:00:00",
            "break_start": null,
            "break_end": null
        })]))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![json!({
            "id": SERVICE_ID,
            "barbershop_id": SHOP_ID,
            "name": "Corte masculino",
            "duration_minutes": 30,
            "price_cents": 4500,
            "active": true,
            "package_items": null
        })]))
        .mount(server)
        .await;

    // Committed-row lookup by id must win over the range fallback.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", APPT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![appointment_row("pending")]))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/commit_appointment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(appointment_row("pending")))
        .mount(server)
        .await;
}

async fn run_wizard_to_confirm(
    orchestrator: &BookingOrchestrator,
) -> booking_cell::models::BookingSession {
    let mut session = orchestrator.start_session_for_client(shop(), client());

    orchestrator
        .select_service(&mut session, Uuid::parse_str(SERVICE_ID).unwrap(), None)
        .await
        .unwrap();

    let professionals = orchestrator
        .list_professionals(&session, monday(), None)
        .await
        .unwrap();
    assert_eq!(professionals.len(), 1);
    assert!(professionals[0].working_today);

    orchestrator
        .select_professional(&mut session, Uuid::parse_str(PRO_ID).unwrap(), None)
        .await
        .unwrap();

    let slots = orchestrator.list_slots(&session, monday(), None).await.unwrap();
    assert_eq!(slots.len(), 18);

    orchestrator
        .select_time(&mut session, monday(), "10:00", None)
        .await
        .unwrap();
    assert_eq!(session.step, BookingStep::Confirm);

    session
}

#[tokio::test]
async fn covered_credit_books_and_records_usage() {
    let server = MockServer::start().await;
    mount_base(&server, 4, 2).await; // 2 of 4 used: covered

    // Idempotency guard lookup, then the append itself.
    Mock::given(method("GET"))
        .and(path("/rest/v1/usage_records"))
        .and(query_param("appointment_id", format!("eq.{}", APPT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/usage_records"))
        .respond_with(ResponseTemplate::new(201).set_body_json(vec![json!({
            "id": Uuid::new_v4(),
            "subscription_id": SUB_ID,
            "service_id": SERVICE_ID,
            "appointment_id": APPT_ID,
            "used_at": "2030-03-11T10:00:00Z"
        })]))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let orchestrator = BookingOrchestrator::new(&config);

    let mut session = run_wizard_to_confirm(&orchestrator).await;
    let outcome = orchestrator.confirm(&mut session, None).await.unwrap();

    assert_matches!(
        outcome,
        CommitOutcome::Booked { covered_by_plan: true, .. }
    );
    assert_eq!(session.step, BookingStep::Committed);
}

#[tokio::test]
async fn exhausted_limit_routes_to_decision_not_auto_record() {
    let server = MockServer::start().await;
    mount_base(&server, 2, 2).await; // 2 of 2 used: limit reached

    // No POST /usage_records is mounted: an attempted auto-record would
    // fail the test at resolve time.
    let config = config_for(&server);
    let orchestrator = BookingOrchestrator::new(&config);

    let mut session = run_wizard_to_confirm(&orchestrator).await;

    // The service list still shows the plan coverage, at zero remaining.
    let listing_session = orchestrator.start_session_for_client(shop(), client());
    let services = orchestrator.list_services(&listing_session, None).await.unwrap();
    let option = &services[0];
    assert!(option.included_in_plan);
    assert_eq!(option.credit.as_ref().unwrap().remaining, 0);

    let outcome = orchestrator.confirm(&mut session, None).await.unwrap();

    let credit = match outcome {
        CommitOutcome::AwaitingLimitDecision { ref credit, .. } => credit.clone(),
        other => panic!("expected limit decision, got {:?}", other),
    };
    assert_eq!(credit.remaining, 0);
    assert_eq!(session.step, BookingStep::LimitPrompt);

    // Operator chooses to charge separately: no usage record appended.
    let appointment = orchestrator
        .resolve_limit(&mut session, LimitResolution::ChargeSeparately, None)
        .await
        .unwrap();

    assert_eq!(appointment.id, Uuid::parse_str(APPT_ID).unwrap());
    assert_eq!(session.step, BookingStep::Committed);
}

#[tokio::test]
async fn commit_time_conflict_rewinds_to_time_selection() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/barbershops"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![json!({
            "id": SHOP_ID,
            "name": "Navalha Centro",
            "slug": "navalha-centro",
            "utc_offset_minutes": -180,
            "slot_step_minutes": null
        })]))
        .mount(&server)
        .await;

    // Another session took 10:00-10:30 after this session's listing.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![appointment_row("confirmed")]))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let orchestrator = BookingOrchestrator::new(&config);

    // Session already at Confirm with the now-stale slot.
    let mut session = orchestrator.start_session_for_client(shop(), client());
    session.service_id = Some(Uuid::parse_str(SERVICE_ID).unwrap());
    session.service_duration_minutes = Some(30);
    session.professional_id = Some(Uuid::parse_str(PRO_ID).unwrap());
    session.slot_start = Some(ts("2030-03-11T10:00:00-03:00"));
    session.step = BookingStep::Confirm;

    let result = orchestrator.confirm(&mut session, None).await;

    assert_matches!(result, Err(BookingError::Conflict(_)));
    assert_eq!(session.step, BookingStep::SelectTime);
    assert!(session.slot_start.is_none());
    // Service and professional survive the rewind.
    assert!(session.service_id.is_some());
    assert!(session.professional_id.is_some());
}

#[tokio::test]
async fn selecting_an_unavailable_slot_is_rejected_with_reason() {
    let server = MockServer::start().await;
    mount_base_with_taken_slot(&server).await;

    let config = config_for(&server);
    let orchestrator = BookingOrchestrator::new(&config);

    let mut session = orchestrator.start_session_for_client(shop(), client());
    session.service_id = Some(Uuid::parse_str(SERVICE_ID).unwrap());
    session.service_duration_minutes = Some(30);
    session.professional_id = Some(Uuid::parse_str(PRO_ID).unwrap());
    session.step = BookingStep::SelectTime;

    let result = orchestrator
        .select_time(&mut session, monday(), "10:00", None)
        .await;

    match result {
        Err(BookingError::Validation(msg)) => assert!(msg.contains("booked"), "got: {}", msg),
        other => panic!("expected validation rejection, got {:?}", other),
    }
    assert!(session.slot_start.is_none());
}

async fn mount_base_with_taken_slot(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/barbershops"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![json!({
            "id": SHOP_ID,
            "name": "Navalha Centro",
            "slug": "navalha-centro",
            "utc_offset_minutes": -180,
            "slot_step_minutes": null
        })]))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedule_overrides"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedule_days"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![json!({
            "id": Uuid::new_v4(),
            "professional_id": PRO_ID,
            "weekday": 1,
            "is_working": true,
            "start_time": "09:00:00",
            "end_time": "18:00:00",
            "break_start": null,
            "break_end": null
        })]))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![appointment_row("confirmed")]))
        .mount(server)
        .await;
}

#[tokio::test]
async fn go_back_to_service_clears_downstream_choices() {
    let server = MockServer::start().await;
    mount_base(&server, 4, 0).await;

    let config = config_for(&server);
    let orchestrator = BookingOrchestrator::new(&config);

    let mut session = run_wizard_to_confirm(&orchestrator).await;
    orchestrator
        .go_back(&mut session, BookingStep::SelectService)
        .unwrap();

    assert_eq!(session.step, BookingStep::SelectService);
    assert!(session.service_id.is_none());
    assert!(session.professional_id.is_none());
    assert!(session.slot_start.is_none());
    assert!(session.client_id.is_some());
}
