// libs/subscription-cell/tests/credits_test.rs
//
// Credit derivation and usage recording against a mocked PostgREST
// endpoint.

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{FixedOffset, NaiveDate};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_database::supabase::SupabaseClient;
use shared_utils::test_utils::TestConfig;
use subscription_cell::models::{CreditError, UNLIMITED};
use subscription_cell::services::credits::CreditLedger;

const CLIENT_ID: &str = "e3b21c84-17b5-4f7e-9b1a-2f8c5d3e6a90";
const SHOP_ID: &str = "0b54d3a4-9e06-4c1c-a53a-85531f1e5033";
const SUB_ID: &str = "3f1c2b5a-8d4e-4c6f-a2b1-9e7d5c3a1f80";
const PLAN_ID: &str = "7a9b3c1d-5e2f-4a8b-b6c4-1d9e7f5a3c20";
const SERVICE_ID: &str = "9c3a1f92-4a5e-4a7e-b1c2-6f0d9a8e7c55";

fn offset() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).unwrap()
}

fn ledger_for(server: &MockServer) -> CreditLedger {
    let config = TestConfig::with_base_url(&server.uri()).to_app_config();
    CreditLedger::new(Arc::new(SupabaseClient::new(&config)))
}

fn subscription_row() -> serde_json::Value {
    json!({
        "id": SUB_ID,
        "client_id": CLIENT_ID,
        "barbershop_id": SHOP_ID,
        "plan_id": PLAN_ID,
        "status": "active"
    })
}

fn usage_row() -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "subscription_id": SUB_ID,
        "service_id": SERVICE_ID,
        "appointment_id": Uuid::new_v4(),
        "used_at": "2026-02-10T14:00:00Z"
    })
}

#[tokio::test]
async fn credits_reflect_plan_and_monthly_usage() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/subscriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![subscription_row()]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/plan_items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            json!({
                "id": Uuid::new_v4(),
                "plan_id": PLAN_ID,
                "service_id": SERVICE_ID,
                "quantity_limit": 4
            }),
            json!({
                "id": Uuid::new_v4(),
                "plan_id": PLAN_ID,
                "service_id": Uuid::new_v4(),
                "quantity_limit": null
            }),
        ]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/usage_records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![usage_row(), usage_row()]))
        .mount(&server)
        .await;

    let ledger = ledger_for(&server);
    let credits = ledger
        .compute_credits(
            Uuid::parse_str(CLIENT_ID).unwrap(),
            Uuid::parse_str(SHOP_ID).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 15).unwrap(),
            offset(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(credits.len(), 2);
    let capped = credits
        .iter()
        .find(|c| c.service_id == Uuid::parse_str(SERVICE_ID).unwrap())
        .unwrap();
    assert_eq!(capped.limit, 4);
    assert_eq!(capped.used_this_month, 2);
    assert_eq!(capped.remaining, 2);

    let unlimited = credits.iter().find(|c| c.remaining == UNLIMITED).unwrap();
    assert_eq!(unlimited.used_this_month, 0);
}

#[tokio::test]
async fn no_active_subscription_means_no_credits() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/subscriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&server)
        .await;

    let ledger = ledger_for(&server);
    let credits = ledger
        .compute_credits(
            Uuid::parse_str(CLIENT_ID).unwrap(),
            Uuid::parse_str(SHOP_ID).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 15).unwrap(),
            offset(),
            None,
        )
        .await
        .unwrap();

    assert!(credits.is_empty());
}

#[tokio::test]
async fn second_usage_record_for_same_appointment_fails() {
    let server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/usage_records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![json!({
            "id": Uuid::new_v4(),
            "subscription_id": SUB_ID,
            "service_id": SERVICE_ID,
            "appointment_id": appointment_id,
            "used_at": "2026-02-10T14:00:00Z"
        })]))
        .mount(&server)
        .await;

    let ledger = ledger_for(&server);
    let result = ledger
        .record_usage(
            Uuid::parse_str(SUB_ID).unwrap(),
            Uuid::parse_str(SERVICE_ID).unwrap(),
            appointment_id,
            None,
        )
        .await;

    assert_matches!(result, Err(CreditError::UsageAlreadyRecorded(id)) if id == appointment_id);
}

#[tokio::test]
async fn first_usage_record_is_appended() {
    let server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/usage_records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/usage_records"))
        .respond_with(ResponseTemplate::new(201).set_body_json(vec![json!({
            "id": Uuid::new_v4(),
            "subscription_id": SUB_ID,
            "service_id": SERVICE_ID,
            "appointment_id": appointment_id,
            "used_at": "2026-02-10T14:00:00Z"
        })]))
        .mount(&server)
        .await;

    let ledger = ledger_for(&server);
    let record = ledger
        .record_usage(
            Uuid::parse_str(SUB_ID).unwrap(),
            Uuid::parse_str(SERVICE_ID).unwrap(),
            appointment_id,
            None,
        )
        .await
        .unwrap();

    assert_eq!(record.appointment_id, appointment_id);
}
