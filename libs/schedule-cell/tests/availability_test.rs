// libs/schedule-cell/tests/availability_test.rs
//
// Slot generation against a mocked PostgREST endpoint: template
// resolution, override handling and booked-slot annotation together.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use schedule_cell::models::{SlotPolicy, SlotUnavailableReason};
use schedule_cell::services::slots::AvailabilityService;
use shared_database::supabase::SupabaseClient;
use shared_utils::test_utils::TestConfig;

const PRO_ID: &str = "6b8f5f54-2f3e-4a0d-9c06-3d8f8b8f2b11";

fn offset() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).unwrap()
}

// A Monday far enough out that no slot is in the past.
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 3, 11).unwrap()
}

fn schedule_day_row() -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "professional_id": PRO_ID,
        "weekday": 1,
        "is_working": true,
        "start_time": "09:00:00",
        "end_time": "18:00:00",
        "break_start": null,
        "break_end": null
    })
}

async fn service_for(server: &MockServer) -> AvailabilityService {
    let config = TestConfig::with_base_url(&server.uri()).to_app_config();
    AvailabilityService::new(Arc::new(SupabaseClient::new(&config)))
}

async fn mock_empty_overrides(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedule_overrides"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn open_monday_produces_full_listing() {
    let server = MockServer::start().await;
    mock_empty_overrides(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedule_days"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![schedule_day_row()]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&server)
        .await;

    let availability = service_for(&server).await;
    let slots = availability
        .available_slots(
            Uuid::parse_str(PRO_ID).unwrap(),
            monday(),
            30,
            SlotPolicy { step_minutes: 30 },
            offset(),
            None,
            None,
        )
        .await
        .unwrap();

    assert_eq!(slots.len(), 18);
    assert!(slots.iter().all(|s| s.available));
}

#[tokio::test]
async fn missing_template_row_means_not_working() {
    let server = MockServer::start().await;
    mock_empty_overrides(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedule_days"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&server)
        .await;

    let availability = service_for(&server).await;
    let slots = availability
        .available_slots(
            Uuid::parse_str(PRO_ID).unwrap(),
            monday(),
            30,
            SlotPolicy { step_minutes: 30 },
            offset(),
            None,
            None,
        )
        .await
        .unwrap();

    assert!(slots.is_empty());
}

#[tokio::test]
async fn day_off_override_empties_a_working_date() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedule_overrides"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![json!({
            "id": Uuid::new_v4(),
            "professional_id": PRO_ID,
            "override_date": "2030-03-11",
            "is_working": false,
            "reason": "feriado"
        })]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedule_days"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![schedule_day_row()]))
        .mount(&server)
        .await;

    let availability = service_for(&server).await;
    let slots = availability
        .available_slots(
            Uuid::parse_str(PRO_ID).unwrap(),
            monday(),
            30,
            SlotPolicy { step_minutes: 30 },
            offset(),
            None,
            None,
        )
        .await
        .unwrap();

    assert!(slots.is_empty());
}

#[tokio::test]
async fn booked_interval_is_annotated_in_listing() {
    let server = MockServer::start().await;
    mock_empty_overrides(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedule_days"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![schedule_day_row()]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![json!({
            "id": Uuid::new_v4(),
            "barbershop_id": Uuid::new_v4(),
            "professional_id": PRO_ID,
            "client_id": null,
            "service_id": Uuid::new_v4(),
            "start_time": "2030-03-11T10:00:00-03:00",
            "end_time": "2030-03-11T10:30:00-03:00",
            "status": "confirmed",
            "created_at": "2030-03-01T12:00:00Z",
            "updated_at": "2030-03-01T12:00:00Z"
        })]))
        .mount(&server)
        .await;

    let availability = service_for(&server).await;
    let slots = availability
        .available_slots(
            Uuid::parse_str(PRO_ID).unwrap(),
            monday(),
            30,
            SlotPolicy { step_minutes: 30 },
            offset(),
            None,
            None,
        )
        .await
        .unwrap();

    let ten = slots.iter().find(|s| s.time == "10:00").unwrap();
    assert!(!ten.available);
    assert_eq!(ten.reason, Some(SlotUnavailableReason::Booked));
    assert!(slots.iter().find(|s| s.time == "10:30").unwrap().available);
}
