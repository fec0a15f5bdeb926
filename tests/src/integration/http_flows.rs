//! # HTTP Flows
//!
//! Multi-step journeys through the full router: a client tops up, pays a
//! job, and the admin reports reflect the payment. Runs against both stores.

use super::{Backend, Harness};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use ledger_gateway::{build_router, AppState, GatewayConfig, PROFILE_HEADER};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

// Later than every seeded payment date.
const AFTER_SEED: &str = "start=2020-08-18&end=2100-01-01";

fn router(harness: &Harness) -> Router {
    let state = AppState::new(Arc::clone(harness.api()), GatewayConfig::default());
    build_router(state)
}

async fn call(app: &Router, method: &str, path: &str, profile: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(path)
        .header(PROFILE_HEADER, profile)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .map(|items| items.iter().filter_map(|i| i["id"].as_i64()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_pay_then_report() {
    for backend in [Backend::Memory, Backend::Sqlite] {
        let harness = Harness::new(backend, 1);
        let app = router(&harness);

        // Nothing paid after the seeded history yet.
        let path = format!("/admin/best-profession?{AFTER_SEED}");
        let (status, _) = call(&app, "GET", &path, "9", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{backend:?}");
        let path = format!("/admin/best-clients?{AFTER_SEED}");
        let (status, body) = call(&app, "GET", &path, "9", "").await;
        assert_eq!((status, body), (StatusCode::OK, json!([])), "{backend:?}");

        // Harry sees job 2 outstanding and pays it.
        let (status, body) = call(&app, "GET", "/jobs/unpaid", "1", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![2], "{backend:?}");

        let (status, body) = call(&app, "POST", "/jobs/2/pay", "1", "").await;
        assert_eq!(status, StatusCode::OK, "{backend:?}: {body}");
        assert_eq!(body["paid"], true);

        let (status, _) = call(&app, "GET", "/jobs/unpaid", "1", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{backend:?}");

        // The contract is still visible to both parties.
        let (status, body) = call(&app, "GET", "/contracts/2", "6", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ContractorId"], 6);

        let path = format!("/admin/best-profession?{AFTER_SEED}");
        let (status, body) = call(&app, "GET", &path, "9", "").await;
        assert_eq!(status, StatusCode::OK, "{backend:?}");
        assert_eq!(body["bestProfession"], "Programmer");

        let path = format!("/admin/best-clients?{AFTER_SEED}");
        let (status, body) = call(&app, "GET", &path, "9", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![1], "{backend:?}");
        assert_eq!(body[0]["fullName"], "Harry Potter");
        assert_eq!(body[0]["paid"].as_f64(), Some(201.0));

        let linus = harness.api().authenticate(Some("6")).unwrap();
        assert_eq!(linus.balance.to_string(), "1415");
    }
}

#[tokio::test]
async fn test_topped_up_client_settles() {
    for backend in [Backend::Memory, Backend::Sqlite] {
        let harness = Harness::new(backend, 1);
        let app = router(&harness);

        // Ash (1.3) cannot afford job 5 at 200.
        let (status, body) = call(&app, "POST", "/jobs/5/pay", "4", "").await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{backend:?}");
        assert_eq!(body["message"], "Insufficient Balance");

        // The cap is a quarter of 200; over it is refused, at it is fine.
        let (status, _) = call(&app, "POST", "/balances/deposit/4", "4", r#"{"amount": 50.01}"#).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{backend:?}");
        for expected in [51.3, 101.3, 151.3, 201.3] {
            let (status, body) =
                call(&app, "POST", "/balances/deposit/4", "4", r#"{"amount": 50}"#).await;
            assert_eq!(status, StatusCode::OK, "{backend:?}");
            assert_eq!(body["balance"].as_f64(), Some(expected));
        }

        let (status, body) = call(&app, "POST", "/jobs/5/pay", "4", "").await;
        assert_eq!(status, StatusCode::OK, "{backend:?}: {body}");

        let ash = harness.api().authenticate(Some("4")).unwrap();
        assert_eq!(ash.balance.to_string(), "1.3");

        // Nothing left outstanding, so no further deposit fits under the cap.
        let (status, _) = call(&app, "POST", "/balances/deposit/4", "4", r#"{"amount": 1}"#).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{backend:?}");
    }
}
