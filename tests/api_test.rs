//! Integration tests driving [`ApiClient`] against an in-process stub of the
//! remote service.
//!
//! The stub records every raw request body, so these tests assert the exact
//! wire shapes — in particular the reactivation contract, which several
//! historical clients got wrong.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use pricewatch::alerts::{AlertDraft, AlertUpdate, ThresholdSpec};
use pricewatch::api::{ApiClient, Timeouts};
use pricewatch::error::ApiError;
use pricewatch::models::{AlertType, Condition, PlanType};

#[derive(Clone, Default)]
struct StubState {
    alerts: Arc<Mutex<HashMap<i64, Value>>>,
    next_id: Arc<Mutex<i64>>,
    update_bodies: Arc<Mutex<Vec<Value>>>,
}

fn alert_defaults(id: i64) -> Value {
    json!({
        "id": id,
        "symbol": "",
        "alert_type": "absolute",
        "is_active": true,
        "notified": false,
        "created_at": "2025-06-01T09:30:00",
        "updated_at": "2025-06-01T09:30:00"
    })
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Value::Object(target), Value::Object(patch)) = (target, patch) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

async fn login_handler() -> Json<Value> {
    Json(json!({ "access_token": "stub-token", "token_type": "bearer" }))
}

async fn create_alert_handler(
    State(state): State<StubState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let id = {
        let mut next = state.next_id.lock().unwrap();
        *next += 1;
        *next
    };
    let mut alert = alert_defaults(id);
    merge(&mut alert, &body);
    state.alerts.lock().unwrap().insert(id, alert.clone());
    Json(alert)
}

async fn get_alert_handler(State(state): State<StubState>, Path(id): Path<i64>) -> Response {
    match state.alerts.lock().unwrap().get(&id) {
        Some(alert) => Json(alert.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "alert not found" })))
            .into_response(),
    }
}

async fn update_alert_handler(
    State(state): State<StubState>,
    Path(id): Path<i64>,
    body: String,
) -> Response {
    let patch: Value = serde_json::from_str(&body).unwrap();
    state.update_bodies.lock().unwrap().push(patch.clone());

    let mut alerts = state.alerts.lock().unwrap();
    match alerts.get_mut(&id) {
        Some(alert) => {
            merge(alert, &patch);
            Json(alert.clone()).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "alert not found" })))
            .into_response(),
    }
}

async fn delete_alert_handler(State(state): State<StubState>, Path(id): Path<i64>) -> Response {
    match state.alerts.lock().unwrap().remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "alert not found" })))
            .into_response(),
    }
}

async fn list_alerts_handler(State(state): State<StubState>) -> Json<Value> {
    let alerts: Vec<Value> = state.alerts.lock().unwrap().values().cloned().collect();
    Json(Value::Array(alerts))
}

async fn slow_health_handler() -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(500)).await;
    Json(json!({ "status": "ok" }))
}

/// Spawn the stub service, returning its state and bound address.
async fn spawn_stub() -> (StubState, SocketAddr) {
    let state = StubState::default();
    let app = Router::new()
        .route("/auth/login", post(login_handler))
        .route("/alerts", get(list_alerts_handler).post(create_alert_handler))
        .route(
            "/alerts/:id",
            get(get_alert_handler)
                .put(update_alert_handler)
                .delete(delete_alert_handler),
        )
        .route("/health", get(slow_health_handler))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (state, addr)
}

async fn client_for(addr: SocketAddr) -> ApiClient {
    let mut client = ApiClient::new(format!("http://{addr}"), "test-key").unwrap();
    client.login("user@example.com", "secret").await.unwrap();
    client
}

#[tokio::test]
async fn absolute_alert_lifecycle_keeps_label_and_clears_latch() {
    let (state, addr) = spawn_stub().await;
    let client = client_for(addr).await;

    // Create above-150 on AAPL.
    let draft = AlertDraft::new(
        "AAPL",
        ThresholdSpec::Absolute {
            condition: Condition::Above,
            threshold_price: 150.0,
        },
    )
    .unwrap();
    let created = client.create_alert(&draft).await.unwrap();
    assert!(created.is_active);
    assert!(!created.notified);
    assert_eq!(created.label(), "above 150");

    // Deactivate: the payload must carry is_active only.
    let paused = client
        .update_alert(created.id, &AlertUpdate::deactivate())
        .await
        .unwrap();
    assert!(!paused.is_active);
    assert_eq!(paused.label(), "above 150");

    // Reactivate: the payload must clear the notified latch.
    let rearmed = client
        .update_alert(created.id, &AlertUpdate::reactivate())
        .await
        .unwrap();
    assert!(rearmed.is_active);
    assert!(!rearmed.notified);
    assert_eq!(rearmed.label(), "above 150");

    let bodies = state.update_bodies.lock().unwrap();
    assert_eq!(bodies[0], json!({ "is_active": false }));
    assert_eq!(bodies[1], json!({ "is_active": true, "notified": false }));
}

#[tokio::test]
async fn percent_dual_label_wins_over_legacy_condition() {
    let (state, addr) = spawn_stub().await;
    let client = client_for(addr).await;

    // A record where a legacy server kept condition/percent_threshold
    // populated next to the dual-direction fields.
    state.alerts.lock().unwrap().insert(42, {
        let mut alert = alert_defaults(42);
        merge(
            &mut alert,
            &json!({
                "symbol": "NVDA",
                "alert_type": "percent",
                "condition": "above",
                "percent_threshold": 1.0,
                "alert_up_pct": 5.0,
                "alert_down_pct": 3.0,
                "base_price": 100.0
            }),
        );
        alert
    });

    let alert = client.get_alert(42).await.unwrap();
    assert_eq!(alert.label(), "↑ 5% / ↓ 3%");
}

#[tokio::test]
async fn delete_is_terminal_and_second_access_is_not_found() {
    let (_state, addr) = spawn_stub().await;
    let client = client_for(addr).await;

    let draft = AlertDraft::new(
        "TSLA",
        ThresholdSpec::Absolute {
            condition: Condition::Below,
            threshold_price: 180.0,
        },
    )
    .unwrap();
    let created = client.create_alert(&draft).await.unwrap();

    client.delete_alert(created.id).await.unwrap();

    let err = client.get_alert(created.id).await.unwrap_err();
    assert!(err.is_not_found(), "expected 404, got {err:?}");

    let err = client.delete_alert(created.id).await.unwrap_err();
    assert!(err.is_not_found(), "expected 404, got {err:?}");
}

#[tokio::test]
async fn free_plan_threshold_edit_never_reaches_the_wire() {
    let (state, addr) = spawn_stub().await;
    let client = client_for(addr).await;

    let update = AlertUpdate::edit(
        AlertType::Absolute,
        ThresholdSpec::Absolute {
            condition: Condition::Above,
            threshold_price: 200.0,
        },
    )
    .unwrap();

    // The advisory gate fires locally.
    let err = update.ensure_permitted(PlanType::Free).unwrap_err();
    assert!(matches!(err, ApiError::PlanRestriction(_)));
    assert!(state.update_bodies.lock().unwrap().is_empty());

    // Activation toggles stay permitted and do reach the wire.
    AlertUpdate::deactivate()
        .ensure_permitted(PlanType::Free)
        .unwrap();
    let draft = AlertDraft::new(
        "AAPL",
        ThresholdSpec::Absolute {
            condition: Condition::Above,
            threshold_price: 150.0,
        },
    )
    .unwrap();
    let created = client.create_alert(&draft).await.unwrap();
    client
        .update_alert(created.id, &AlertUpdate::deactivate())
        .await
        .unwrap();
    assert_eq!(state.update_bodies.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn timeout_aborts_and_surfaces_as_timeout() {
    let (_state, addr) = spawn_stub().await;
    let client = ApiClient::new(format!("http://{addr}"), "test-key")
        .unwrap()
        .with_timeouts(Timeouts {
            health: Duration::from_millis(50),
            ..Timeouts::default()
        });

    let err = client.health().await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout), "got {err:?}");
}

#[tokio::test]
async fn http_error_body_detail_is_surfaced() {
    let (_state, addr) = spawn_stub().await;
    let client = client_for(addr).await;

    let err = client.get_alert(999).await.unwrap_err();
    match err {
        ApiError::Http { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body.message(), "alert not found");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}
