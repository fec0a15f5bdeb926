//! HTTP routes and handlers.
//!
//! | Method | Path | Response |
//! |---|---|---|
//! | GET | `/contracts/:id` | contract |
//! | GET | `/contracts` | active contracts of the caller |
//! | GET | `/jobs/unpaid` | unpaid jobs on the caller's active contracts |
//! | POST | `/jobs/:job_id/pay` | the settled job |
//! | POST | `/balances/deposit/:userId` | `{"balance": ..}` |
//! | GET | `/admin/best-profession` | `{"bestProfession": ..}` |
//! | GET | `/admin/best-clients` | `[{"id", "fullName", "paid"}]` |
//! | GET | `/health` | liveness, no credential |
//! | GET | `/metrics` | counters, no credential |
//!
//! Ledger calls are synchronous and may block on the store, so each one runs
//! on the blocking pool.

use crate::domain::{ApiError, ApiResult, GatewayConfig};
use crate::middleware::{Caller, LedgerMetrics, ProfileLayer, TimeoutLayer, TracingLayer};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use ledger_core::{
    ClientTotal, Contract, ContractId, Job, JobId, LedgerApi, LedgerError,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn LedgerApi>,
    pub metrics: Arc<LedgerMetrics>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    pub fn new(api: Arc<dyn LedgerApi>, config: GatewayConfig) -> Self {
        Self {
            api,
            metrics: Arc::new(LedgerMetrics::new()),
            config: Arc::new(config),
        }
    }
}

/// Build the full router: authenticated ledger routes, public health and
/// metrics routes, and the shared middleware stack.
pub fn build_router(state: AppState) -> Router {
    let ledger = Router::new()
        .route("/contracts", get(list_contracts))
        .route("/contracts/:id", get(get_contract))
        .route("/jobs/unpaid", get(list_unpaid_jobs))
        .route("/jobs/:job_id/pay", post(pay_job))
        .route("/balances/deposit/:user_id", post(deposit))
        .route("/admin/best-profession", get(best_profession))
        .route("/admin/best-clients", get(best_clients))
        .route_layer(ProfileLayer::new(Arc::clone(&state.api)));

    let public = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics));

    ledger
        .merge(public)
        .layer(RequestBodyLimitLayer::new(state.config.limits.max_body_bytes))
        .layer(TimeoutLayer::new(&state.config.timeouts))
        .layer(TracingLayer::with_metrics(Arc::clone(&state.metrics)))
        .with_state(state)
}

/// Run a ledger call on the blocking pool.
async fn call_ledger<T, F>(state: &AppState, f: F) -> Result<T, LedgerError>
where
    T: Send + 'static,
    F: FnOnce(&dyn LedgerApi) -> Result<T, LedgerError> + Send + 'static,
{
    let api = Arc::clone(&state.api);
    tokio::task::spawn_blocking(move || f(api.as_ref()))
        .await
        .map_err(|e| LedgerError::Internal(format!("ledger task failed: {e}")))?
}

/// Path ids that do not parse cannot name an existing record.
fn path_id<T: std::str::FromStr>(raw: &str) -> ApiResult<T> {
    raw.parse().map_err(|_| ApiError::not_found())
}

async fn get_contract(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Json<Contract>> {
    let id: ContractId = path_id(&id)?;
    let contract = call_ledger(&state, move |api| api.get_contract(&caller, id)).await?;
    Ok(Json(contract))
}

async fn list_contracts(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
) -> ApiResult<Json<Vec<Contract>>> {
    let contracts = call_ledger(&state, move |api| api.list_contracts(&caller)).await?;
    Ok(Json(contracts))
}

async fn list_unpaid_jobs(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
) -> ApiResult<Json<Vec<Job>>> {
    let jobs = call_ledger(&state, move |api| api.list_unpaid_jobs(&caller)).await?;
    Ok(Json(jobs))
}

async fn pay_job(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Job>> {
    let job_id: JobId = path_id(&job_id)?;
    match call_ledger(&state, move |api| api.pay_job(&caller, job_id)).await {
        Ok(settlement) => {
            state.metrics.record_settlement(settlement.amount());
            Ok(Json(settlement.job))
        }
        Err(e) => {
            state.metrics.record_settlement_rejected(e.is_transient());
            Err(e.into())
        }
    }
}

/// `amount` from a JSON body. An empty, malformed or non-numeric body yields
/// `None`, which the Deposit Guard rejects after its identity checks.
fn deposit_amount(body: &Bytes) -> Option<f64> {
    serde_json::from_slice::<Value>(body)
        .ok()?
        .get("amount")?
        .as_f64()
}

async fn deposit(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let amount = deposit_amount(&body);
    match call_ledger(&state, move |api| api.deposit(&caller, &user_id, amount)).await {
        Ok(balance) => {
            state.metrics.record_deposit();
            Ok(Json(json!({ "balance": balance })))
        }
        Err(e) => {
            state.metrics.record_deposit_rejected(e.is_transient());
            Err(e.into())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReportQuery {
    start: Option<String>,
    end: Option<String>,
    limit: Option<String>,
}

async fn best_profession(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<Value>> {
    let profession = call_ledger(&state, move |api| {
        api.best_profession(&caller, query.start.as_deref(), query.end.as_deref())
    })
    .await?;
    Ok(Json(json!({ "bestProfession": profession })))
}

async fn best_clients(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<Vec<ClientTotal>>> {
    let limit = query
        .limit
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| state.config.reporting.default_limit.to_string());
    let ranking = call_ledger(&state, move |api| {
        api.best_clients(
            &caller,
            query.start.as_deref(),
            query.end.as_deref(),
            Some(limit.as_str()),
        )
    })
    .await?;
    Ok(Json(ranking))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn metrics(State(state): State<AppState>) -> Json<Value> {
    Json(state.metrics.to_json())
}
