// libs/appointment-cell/tests/integration_test.rs
//
// Store-facing tests for the appointment ledger and the commit path,
// against a mocked PostgREST endpoint.

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, FixedOffset};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{
    AppointmentError, ClientRef, CommitAppointmentRequest,
};
use appointment_cell::services::commit::CommitService;
use appointment_cell::services::ledger::AppointmentLedger;
use shared_database::supabase::SupabaseClient;
use shared_utils::test_utils::TestConfig;

const SHOP_ID: &str = "0b54d3a4-9e06-4c1c-a53a-85531f1e5033";
const PRO_ID: &str = "6b8f5f54-2f3e-4a0d-9c06-3d8f8b8f2b11";
const SERVICE_ID: &str = "9c3a1f92-4a5e-4a7e-b1c2-6f0d9a8e7c55";

fn ts(value: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(value).expect("valid rfc3339 fixture")
}

fn appointment_row(id: Uuid, start: &str, end: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "barbershop_id": SHOP_ID,
        "professional_id": PRO_ID,
        "client_id": null,
        "service_id": SERVICE_ID,
        "start_time": start,
        "end_time": end,
        "status": status,
        "created_at": "2026-03-01T12:00:00Z",
        "updated_at": "2026-03-01T12:00:00Z"
    })
}

fn service_row() -> serde_json::Value {
    json!({
        "id": SERVICE_ID,
        "barbershop_id": SHOP_ID,
        "name": "Corte masculino",
        "duration_minutes": 30,
        "price_cents": 4500,
        "active": true,
        "package_items": null
    })
}

async fn supabase_for(server: &MockServer) -> Arc<SupabaseClient> {
    let config = TestConfig::with_base_url(&server.uri()).to_app_config();
    Arc::new(SupabaseClient::new(&config))
}

// ==============================================================================
// LEDGER
// ==============================================================================

#[tokio::test]
async fn overlapping_booking_is_reported_as_conflict() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![appointment_row(
            Uuid::new_v4(),
            "2026-03-09T10:00:00-03:00",
            "2026-03-09T10:30:00-03:00",
            "confirmed",
        )]))
        .mount(&server)
        .await;

    let ledger = AppointmentLedger::new(supabase_for(&server).await);
    let professional = Uuid::parse_str(PRO_ID).unwrap();

    let check = ledger
        .has_conflict(
            professional,
            ts("2026-03-09T10:00:00-03:00"),
            ts("2026-03-09T10:30:00-03:00"),
            None,
            None,
        )
        .await
        .unwrap();

    assert!(check.has_conflict);
    assert_eq!(check.conflicting_appointments.len(), 1);
}

#[tokio::test]
async fn back_to_back_bookings_do_not_conflict() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![appointment_row(
            Uuid::new_v4(),
            "2026-03-09T10:00:00-03:00",
            "2026-03-09T10:30:00-03:00",
            "confirmed",
        )]))
        .mount(&server)
        .await;

    let ledger = AppointmentLedger::new(supabase_for(&server).await);
    let professional = Uuid::parse_str(PRO_ID).unwrap();

    // Ends exactly when the existing booking starts.
    let check = ledger
        .has_conflict(
            professional,
            ts("2026-03-09T09:30:00-03:00"),
            ts("2026-03-09T10:00:00-03:00"),
            None,
            None,
        )
        .await
        .unwrap();

    assert!(!check.has_conflict);
}

#[tokio::test]
async fn cancelled_rows_never_conflict() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![appointment_row(
            Uuid::new_v4(),
            "2026-03-09T10:00:00-03:00",
            "2026-03-09T10:30:00-03:00",
            "cancelled",
        )]))
        .mount(&server)
        .await;

    let ledger = AppointmentLedger::new(supabase_for(&server).await);
    let professional = Uuid::parse_str(PRO_ID).unwrap();

    let check = ledger
        .has_conflict(
            professional,
            ts("2026-03-09T10:00:00-03:00"),
            ts("2026-03-09T10:30:00-03:00"),
            None,
            None,
        )
        .await
        .unwrap();

    assert!(!check.has_conflict);
}

// ==============================================================================
// COMMIT
// ==============================================================================

fn commit_request(start: &str) -> CommitAppointmentRequest {
    CommitAppointmentRequest {
        barbershop_id: Uuid::parse_str(SHOP_ID).unwrap(),
        professional_id: Uuid::parse_str(PRO_ID).unwrap(),
        service_id: Uuid::parse_str(SERVICE_ID).unwrap(),
        client: ClientRef::New {
            name: "Rafael Lima".to_string(),
            phone: "5511987654321".to_string(),
        },
        start_time: ts(start),
        reschedule_of: None,
    }
}

#[tokio::test]
async fn commit_creates_pending_appointment() {
    let server = MockServer::start().await;
    let created_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![service_row()]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/commit_appointment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(appointment_row(
            created_id,
            "2030-03-11T10:00:00-03:00",
            "2030-03-11T10:30:00-03:00",
            "pending",
        )))
        .mount(&server)
        .await;

    let commit = CommitService::new(supabase_for(&server).await);
    let appointment = commit
        .commit(commit_request("2030-03-11T10:00:00-03:00"), None)
        .await
        .unwrap();

    assert_eq!(appointment.id, created_id);
    assert_eq!(appointment.status.to_string(), "pending");
}

#[tokio::test]
async fn commit_in_the_past_is_rejected() {
    let server = MockServer::start().await;

    let commit = CommitService::new(supabase_for(&server).await);
    let result = commit
        .commit(commit_request("2020-01-06T10:00:00-03:00"), None)
        .await;

    assert_matches!(result, Err(AppointmentError::InvalidTime(_)));
}

#[tokio::test]
async fn store_level_conflict_maps_to_conflict_detected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![service_row()]))
        .mount(&server)
        .await;

    // Advisory check sees a clean calendar; the atomic RPC still rejects,
    // as it would when another session won the race.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/commit_appointment"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "appointment_conflict",
            "message": "overlapping interval"
        })))
        .mount(&server)
        .await;

    let commit = CommitService::new(supabase_for(&server).await);
    let result = commit
        .commit(commit_request("2030-03-11T10:00:00-03:00"), None)
        .await;

    assert_matches!(result, Err(AppointmentError::ConflictDetected));
}

#[tokio::test]
async fn reschedule_excludes_own_interval() {
    let server = MockServer::start().await;
    let own_id = Uuid::new_v4();

    // Lookup of the appointment being moved.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", own_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![appointment_row(
            own_id,
            "2030-03-11T14:00:00-03:00",
            "2030-03-11T14:30:00-03:00",
            "confirmed",
        )]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![service_row()]))
        .mount(&server)
        .await;

    // Day listing contains only the appointment being moved; with
    // self-exclusion the new time is free.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![appointment_row(
            own_id,
            "2030-03-11T14:00:00-03:00",
            "2030-03-11T14:30:00-03:00",
            "confirmed",
        )]))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/reschedule_appointment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(appointment_row(
            own_id,
            "2030-03-11T15:00:00-03:00",
            "2030-03-11T15:30:00-03:00",
            "confirmed",
        )))
        .mount(&server)
        .await;

    let commit = CommitService::new(supabase_for(&server).await);
    let updated = commit
        .reschedule(own_id, ts("2030-03-11T15:00:00-03:00"), None)
        .await
        .unwrap();

    assert_eq!(updated.id, own_id);
    assert_eq!(updated.start_time, ts("2030-03-11T15:00:00-03:00"));
}
