// Grocery Ledger - Web Server
// REST API with Axum over the SQLite store

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use clap::Parser;
use grocery_ledger::{
    aggregate_by_store, coerce_record, coerce_update, compare_across_stores, grand_total,
    logging::init_logging, sort_by_total_spent, total_potential_savings, validate_batch,
    GroceryItem, ItemRepository, NewGroceryItem, PriceComparison, RepoError, Settings,
    SqliteRepository, StoreMatcher, StoreSummary,
};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;

#[derive(Parser)]
#[command(name = "grocery-server", version, about = "Grocery Ledger REST API")]
struct Cli {
    #[command(flatten)]
    settings: Settings,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    repo: Arc<Mutex<SqliteRepository>>,
    stores: Arc<StoreMatcher>,
}

impl AppState {
    fn new(repo: SqliteRepository) -> Self {
        AppState {
            repo: Arc::new(Mutex::new(repo)),
            stores: Arc::new(StoreMatcher::with_defaults()),
        }
    }

    fn repo(&self) -> MutexGuard<'_, SqliteRepository> {
        // A panicked handler cannot leave the connection half-written
        self.repo.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        }),
    )
        .into_response()
}

fn repo_error(e: RepoError) -> Response {
    match e {
        RepoError::NotFound(_) => error_response(StatusCode::NOT_FOUND, e.to_string()),
        RepoError::Invalid(_) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        RepoError::Storage(_) => {
            error!("storage failure: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "storage failure".to_string())
        }
    }
}

/// Unwrap a JSON body, answering malformed input with a 400 envelope
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, Response> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(error_response(
            StatusCode::BAD_REQUEST,
            rejection.body_text(),
        )),
    }
}

/// Stores response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoresResponse {
    stores: Vec<StoreSummary>,
    total_spent: f64,
}

/// Confirm-receipt response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmReceiptResponse {
    store: String,
    added_items: Vec<GroceryItem>,
    count: usize,
}

/// Compare response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    comparisons: Vec<PriceComparison>,
    total_potential_savings: f64,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Response {
    ApiResponse::ok(json!({
        "status": "healthy",
        "version": grocery_ledger::VERSION,
    }))
}

/// GET /api/grocery-items - All items, newest first
async fn list_items(State(state): State<AppState>) -> Response {
    match state.repo().list() {
        Ok(items) => ApiResponse::ok(items),
        Err(e) => repo_error(e),
    }
}

/// POST /api/grocery-items - Add an item (price may be a number or numeric string)
async fn add_item(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match json_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let record: GroceryItem = match coerce_record(&body) {
        Ok(record) => record,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match state.repo().create(new_item_from(record)) {
        Ok(item) => ApiResponse::ok(item),
        Err(e) => repo_error(e),
    }
}

fn new_item_from(record: GroceryItem) -> NewGroceryItem {
    NewGroceryItem {
        item_name: record.item_name,
        store: record.store,
        quantity: record.quantity,
        price: record.price,
        date: Some(record.date).filter(|d| !d.is_empty()),
    }
}

/// PUT /api/grocery-items/:id - Partial update
async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match json_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let update = match coerce_update(&body) {
        Ok(update) => update,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match state.repo().update(&id, update) {
        Ok(item) => ApiResponse::ok(item),
        Err(e) => repo_error(e),
    }
}

/// POST /api/confirm-receipt-items - Add the lines of a checked receipt
///
/// Body: `{ "store_name": "...", "items": [{ "name", "quantity", "total_price" }] }`.
/// Every line is checked before any is stored.
async fn confirm_receipt_items(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match json_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let lines = match body.get("items").and_then(Value::as_array) {
        Some(lines) if !lines.is_empty() => lines,
        _ => return error_response(StatusCode::BAD_REQUEST, "No items provided".to_string()),
    };

    let scanned = body
        .get("store_name")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let store = state
        .stores
        .match_store_name(scanned)
        .unwrap_or(scanned.trim())
        .to_string();

    let mut new_items = Vec::with_capacity(lines.len());
    for line in lines {
        let record = json!({
            "itemName": line.get("name").cloned().unwrap_or(Value::Null),
            "store": store,
            "quantity": line
                .get("quantity")
                .and_then(Value::as_str)
                .unwrap_or("1 kg"),
            "price": line.get("total_price").cloned().unwrap_or(Value::Null),
        });

        match coerce_record(&record) {
            Ok(record) => new_items.push(new_item_from(record)),
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
        }
    }

    let mut repo = state.repo();
    let mut added_items = Vec::with_capacity(new_items.len());
    for new_item in new_items {
        match repo.create(new_item) {
            Ok(item) => added_items.push(item),
            Err(e) => return repo_error(e),
        }
    }
    drop(repo);

    info!("confirmed {} receipt items at {}", added_items.len(), store);

    ApiResponse::ok(ConfirmReceiptResponse {
        store,
        count: added_items.len(),
        added_items,
    })
}

/// DELETE /api/grocery-items/:id
async fn delete_item(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.repo().delete(&id) {
        Ok(item) => ApiResponse::ok(item),
        Err(e) => repo_error(e),
    }
}

/// Current items with invalid records excluded
fn snapshot(state: &AppState) -> Result<Vec<GroceryItem>, RepoError> {
    let batch = validate_batch(&state.repo().list()?);
    if !batch.is_clean() {
        warn!("excluding invalid records: {}", batch.summary());
    }
    Ok(batch.accepted)
}

/// GET /api/stores - Spending per store, highest first
async fn get_stores(State(state): State<AppState>) -> Response {
    let items = match snapshot(&state) {
        Ok(items) => items,
        Err(e) => return repo_error(e),
    };

    let mut stores = aggregate_by_store(&items);
    sort_by_total_spent(&mut stores);
    let total_spent = grand_total(&stores);

    ApiResponse::ok(StoresResponse { stores, total_spent })
}

/// GET /api/compare - Cross-store price comparison
async fn get_compare(State(state): State<AppState>) -> Response {
    let items = match snapshot(&state) {
        Ok(items) => items,
        Err(e) => return repo_error(e),
    };

    let comparisons = compare_across_stores(&items);
    let total = total_potential_savings(&comparisons);

    ApiResponse::ok(CompareResponse {
        comparisons,
        total_potential_savings: total,
    })
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/grocery-items", get(list_items).post(add_item))
        .route("/grocery-items/:id", put(update_item).delete(delete_item))
        .route("/stores", get(get_stores))
        .route("/compare", get(get_compare))
        .route("/confirm-receipt-items", post(confirm_receipt_items))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Cli::parse().settings;
    settings.validate()?;
    init_logging(&settings.log_level)?;

    println!("🌐 Grocery Ledger - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let repo = SqliteRepository::open(&settings.database_path)?;
    info!("database opened: {:?}", settings.database_path);

    let app = build_router(AppState::new(repo));

    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/grocery-items", addr);
    println!("\n   Press Ctrl+C to stop\n");
    info!("{}", settings);

    axum::serve(listener, app).await?;

    Ok(())
}
