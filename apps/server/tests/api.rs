//! Router-level tests against in-memory service implementations.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use tower::ServiceExt;

use allocation_core::allocations::{
    Allocation, AllocationError, AllocationIngestResult, AllocationServiceTrait,
    IngestBatchResult, NewAllocationRequest, PaginationInfo, TradeSide,
};
use allocation_core::batches::{BatchError, SendResult, SendServiceTrait};
use allocation_core::errors::DatabaseError;
use allocation_core::health::StoreStatusTrait;
use allocation_core::Result;
use allocation_server::api::app_router;
use allocation_server::config::{Config, DatabaseConfig};
use allocation_server::main_lib::AppState;

fn sample_allocation(id: i64) -> Allocation {
    Allocation {
        id,
        external_execution_id: 100 + id,
        is_open: false,
        status: "FILLED".to_string(),
        side: TradeSide::Buy,
        destination: "NYSE".to_string(),
        security_id: "SEC000000000000000000ABCD".to_string(),
        ticker: "AAPL".to_string(),
        portfolio_id: "PORTFOLIO123456789012".to_string(),
        trade_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        quantity: dec!(100.5),
        limit_price: None,
        quantity_filled: dec!(100.5),
        total_amount: dec!(15075.0),
        average_price: dec!(150.0),
        received_timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
        sent_timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 1, 0).unwrap(),
        last_fill_timestamp: None,
        ready_to_send_timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 2, 0).unwrap(),
        version: 1,
    }
}

// --- Mock allocation service ---
struct MockAllocationService {
    allocations: Mutex<Vec<Allocation>>,
    ingest_outcome: Mutex<Option<IngestBatchResult>>,
}

impl MockAllocationService {
    fn new() -> Self {
        Self {
            allocations: Mutex::new(Vec::new()),
            ingest_outcome: Mutex::new(None),
        }
    }

    fn with_allocations(allocations: Vec<Allocation>) -> Self {
        let service = Self::new();
        *service.allocations.lock().unwrap() = allocations;
        service
    }

    fn script_ingest(self, outcome: IngestBatchResult) -> Self {
        *self.ingest_outcome.lock().unwrap() = Some(outcome);
        self
    }
}

#[async_trait]
impl AllocationServiceTrait for MockAllocationService {
    async fn ingest(&self, batch: Vec<NewAllocationRequest>) -> Result<IngestBatchResult> {
        if let Some(outcome) = self.ingest_outcome.lock().unwrap().take() {
            return Ok(outcome);
        }
        let mut outcome = IngestBatchResult::default();
        for (index, request) in batch.iter().enumerate() {
            outcome.push(AllocationIngestResult::created(
                request.external_execution_id.unwrap_or_default(),
                index as i64 + 1,
            ));
        }
        Ok(outcome)
    }

    fn get_allocation(&self, allocation_id: i64) -> Result<Allocation> {
        self.allocations
            .lock()
            .unwrap()
            .iter()
            .find(|allocation| allocation.id == allocation_id)
            .cloned()
            .ok_or_else(|| {
                AllocationError::NotFound(format!("allocation {}", allocation_id)).into()
            })
    }

    fn list_allocations(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Allocation>, PaginationInfo)> {
        let allocations = self.allocations.lock().unwrap();
        let total = allocations.len() as i64;
        let page = allocations
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((page, PaginationInfo::new(total, limit, offset)))
    }
}

// --- Mock send service ---
enum SendBehavior {
    Result(SendResult),
    Conflict,
    StoreFailure,
}

struct MockSendService {
    behavior: Mutex<SendBehavior>,
}

impl MockSendService {
    fn new(behavior: SendBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
        }
    }
}

#[async_trait]
impl SendServiceTrait for MockSendService {
    async fn send_batch(&self) -> Result<SendResult> {
        match &*self.behavior.lock().unwrap() {
            SendBehavior::Result(result) => Ok(result.clone()),
            SendBehavior::Conflict => Err(BatchError::WindowContended(
                "duplicate key value violates unique constraint".to_string(),
            )
            .into()),
            SendBehavior::StoreFailure => {
                Err(DatabaseError::QueryFailed("connection reset".to_string()).into())
            }
        }
    }
}

// --- Mock store status ---
struct MockStoreStatus {
    healthy: bool,
}

impl StoreStatusTrait for MockStoreStatus {
    fn check_store(&self) -> Result<()> {
        if self.healthy {
            Ok(())
        } else {
            Err(DatabaseError::ConnectionFailed("refused".to_string()).into())
        }
    }
}

fn test_config() -> Config {
    Config {
        server_port: 0,
        log_level: "info".to_string(),
        database: DatabaseConfig {
            host: "localhost".to_string(),
            port: 5432,
            name: "postgres".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            ssl_mode: "disable".to_string(),
        },
        trade_service_base_url: "http://localhost:8082".to_string(),
        output_dir: "/tmp".to_string(),
        cli_command_template: String::new(),
        retry_max_attempts: 3,
        retry_base_delay_ms: 1000,
        file_cleanup_enabled: false,
        metrics_enabled: false,
        tracing_enabled: false,
    }
}

fn router_with(
    allocation_service: MockAllocationService,
    send_service: MockSendService,
    store_healthy: bool,
) -> axum::Router {
    let state = Arc::new(AppState {
        allocation_service: Arc::new(allocation_service),
        send_service: Arc::new(send_service),
        store_status: Arc::new(MockStoreStatus {
            healthy: store_healthy,
        }),
    });
    app_router(state, &test_config())
}

fn default_router() -> axum::Router {
    router_with(
        MockAllocationService::new(),
        MockSendService::new(SendBehavior::Result(SendResult::empty())),
        true,
    )
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn execution_json(external_execution_id: i64) -> serde_json::Value {
    serde_json::json!({
        "externalExecutionId": external_execution_id,
        "isOpen": false,
        "status": "FILLED",
        "side": "BUY",
        "destination": "NYSE",
        "securityId": "SEC000000000000000000ABCD",
        "ticker": "AAPL",
        "quantity": 100.5,
        "receivedTimestamp": "2024-01-15T10:00:00Z",
        "sentTimestamp": "2024-01-15T10:01:00Z",
        "quantityFilled": 100.5,
        "totalAmount": 15075.0,
        "averagePrice": 150.0
    })
}

#[tokio::test]
async fn healthz_is_always_ok() {
    let response = default_router().oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn readyz_reflects_store_reachability() {
    let ready = default_router().oneshot(get("/readyz")).await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);

    let router = router_with(
        MockAllocationService::new(),
        MockSendService::new(SendBehavior::Result(SendResult::empty())),
        false,
    );
    let not_ready = router.oneshot(get("/readyz")).await.unwrap();
    assert_eq!(not_ready.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn list_rejects_out_of_range_paging() {
    for uri in [
        "/api/v1/executions?limit=0",
        "/api/v1/executions?limit=1001",
        "/api/v1/executions?offset=-1",
    ] {
        let response = default_router().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[tokio::test]
async fn list_returns_executions_with_pagination() {
    let router = router_with(
        MockAllocationService::with_allocations(vec![
            sample_allocation(1),
            sample_allocation(2),
        ]),
        MockSendService::new(SendBehavior::Result(SendResult::empty())),
        true,
    );

    let response = router
        .oneshot(get("/api/v1/executions?limit=1&offset=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["executions"].as_array().unwrap().len(), 1);
    assert_eq!(json["pagination"]["totalElements"], 2);
    assert_eq!(json["pagination"]["pageSize"], 1);
    assert_eq!(json["pagination"]["hasPrevious"], true);
}

#[tokio::test]
async fn get_execution_returns_404_when_missing() {
    let router = router_with(
        MockAllocationService::with_allocations(vec![sample_allocation(1)]),
        MockSendService::new(SendBehavior::Result(SendResult::empty())),
        true,
    );

    let found = router.clone().oneshot(get("/api/v1/executions/1")).await.unwrap();
    assert_eq!(found.status(), StatusCode::OK);
    let json = body_json(found).await;
    assert_eq!(json["id"], 1);
    assert_eq!(json["externalExecutionId"], 101);

    let missing = router.oneshot(get("/api/v1/executions/99")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_rejects_empty_and_oversized_batches() {
    let empty = default_router()
        .oneshot(post_json("/api/v1/executions", serde_json::json!([])))
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let oversized: Vec<serde_json::Value> = (1..=101).map(execution_json).collect();
    let response = default_router()
        .oneshot(post_json(
            "/api/v1/executions",
            serde_json::Value::Array(oversized),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_returns_201_when_nothing_errors() {
    let response = default_router()
        .oneshot(post_json(
            "/api/v1/executions",
            serde_json::json!([execution_json(123)]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["processed"], 1);
    assert_eq!(json["results"][0]["externalExecutionId"], 123);
    assert_eq!(json["results"][0]["status"], "created");
}

#[tokio::test]
async fn create_returns_207_on_mixed_results() {
    let mut outcome = IngestBatchResult::default();
    outcome.push(AllocationIngestResult::created(1, 1));
    outcome.push(AllocationIngestResult::error(
        2,
        "validation failed".to_string(),
    ));
    let router = router_with(
        MockAllocationService::new().script_ingest(outcome),
        MockSendService::new(SendBehavior::Result(SendResult::empty())),
        true,
    );

    let response = router
        .oneshot(post_json(
            "/api/v1/executions",
            serde_json::json!([execution_json(1), execution_json(2)]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::MULTI_STATUS);
}

#[tokio::test]
async fn create_returns_400_when_every_record_errors() {
    let mut outcome = IngestBatchResult::default();
    outcome.push(AllocationIngestResult::error(
        1,
        "validation failed".to_string(),
    ));
    let router = router_with(
        MockAllocationService::new().script_ingest(outcome),
        MockSendService::new(SendBehavior::Result(SendResult::empty())),
        true,
    );

    let response = router
        .oneshot(post_json(
            "/api/v1/executions",
            serde_json::json!([execution_json(1)]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn send_returns_200_for_success_and_empty() {
    for result in [
        SendResult::success(2, "transactions_20240115_100100.csv".to_string()),
        SendResult::empty(),
    ] {
        let router = router_with(
            MockAllocationService::new(),
            MockSendService::new(SendBehavior::Result(result)),
            true,
        );
        let response = router
            .oneshot(post_json("/api/v1/executions/send", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn send_returns_409_on_window_contention() {
    let router = router_with(
        MockAllocationService::new(),
        MockSendService::new(SendBehavior::Conflict),
        true,
    );
    let response = router
        .oneshot(post_json("/api/v1/executions/send", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = body_json(response).await;
    assert_eq!(json["code"], 409);
}

#[tokio::test]
async fn send_returns_500_when_the_cli_failed() {
    let router = router_with(
        MockAllocationService::new(),
        MockSendService::new(SendBehavior::Result(SendResult::cli_error(
            3,
            "transactions_20240115_100100.csv".to_string(),
            "CLI invocation failed: exit status 1".to_string(),
        ))),
        true,
    );
    let response = router
        .oneshot(post_json("/api/v1/executions/send", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
    assert_eq!(json["processed"], 3);
    assert_eq!(json["fileName"], "transactions_20240115_100100.csv");
}

#[tokio::test]
async fn send_returns_500_on_store_failure() {
    let router = router_with(
        MockAllocationService::new(),
        MockSendService::new(SendBehavior::StoreFailure),
        true,
    );
    let response = router
        .oneshot(post_json("/api/v1/executions/send", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
