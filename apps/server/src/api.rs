use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use allocation_core::allocations::{Allocation, IngestBatchResult, NewAllocationRequest};
use allocation_core::batches::{SendResult, SendStatus};
use allocation_core::constants::{DEFAULT_PAGE_SIZE, MAX_INGEST_BATCH_SIZE, MAX_PAGE_SIZE};

use crate::{
    config::Config,
    error::{ApiError, ApiResult},
    main_lib::AppState,
    models::ExecutionListResponse,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn readyz(State(state): State<Arc<AppState>>) -> Response {
    match state.store_status.check_store() {
        Ok(()) => (StatusCode::OK, "ready").into_response(),
        Err(err) => {
            tracing::warn!("readiness check failed: {}", err);
            (StatusCode::SERVICE_UNAVAILABLE, "store unreachable").into_response()
        }
    }
}

#[derive(Deserialize)]
struct ListQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn list_executions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ExecutionListResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    if offset < 0 {
        return Err(ApiError::BadRequest(
            "offset must be non-negative".to_string(),
        ));
    }

    let (executions, pagination) = state.allocation_service.list_allocations(limit, offset)?;
    Ok(Json(ExecutionListResponse {
        executions,
        pagination,
    }))
}

async fn get_execution(
    Path(id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Allocation>> {
    let allocation = state.allocation_service.get_allocation(id)?;
    Ok(Json(allocation))
}

async fn create_executions(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<Vec<NewAllocationRequest>>,
) -> ApiResult<(StatusCode, Json<IngestBatchResult>)> {
    if batch.is_empty() {
        return Err(ApiError::BadRequest("no executions provided".to_string()));
    }
    if batch.len() > MAX_INGEST_BATCH_SIZE {
        return Err(ApiError::BadRequest(format!(
            "batch size exceeds maximum of {} executions",
            MAX_INGEST_BATCH_SIZE
        )));
    }

    let outcome = state.allocation_service.ingest(batch).await?;

    let status = if outcome.errored > 0 && outcome.processed == 0 {
        StatusCode::BAD_REQUEST
    } else if outcome.errored > 0 {
        StatusCode::MULTI_STATUS
    } else {
        StatusCode::CREATED
    };

    Ok((status, Json(outcome)))
}

async fn send_executions(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let result: SendResult = state.send_service.send_batch().await?;

    let status = if result.status == SendStatus::Error {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };

    Ok((status, Json(result)).into_response())
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let api = Router::new()
        .route("/executions", get(list_executions).post(create_executions))
        .route("/executions/send", post(send_executions))
        .route("/executions/:id", get(get_execution));

    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT));

    if config.tracing_enabled {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}
