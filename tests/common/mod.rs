//! In-process mock of the Stockdesk REST API for integration tests.
//!
//! Serves a small parts/categories dataset with real pagination, search,
//! ordering and validation semantics, so the engines are exercised over
//! actual HTTP.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

pub const TEST_TOKEN: &str = "test-token";

#[derive(Clone)]
struct MockState {
    parts: Arc<Mutex<Vec<Value>>>,
    next_pk: Arc<Mutex<i64>>,
}

impl MockState {
    fn seeded() -> Self {
        let parts: Vec<Value> = (1..=23)
            .map(|pk| {
                json!({
                    "pk": pk,
                    "name": format!("Part {:02}", pk),
                    "description": format!("Test part number {}", pk),
                    "category": if pk % 2 == 0 { 2 } else { 1 },
                })
            })
            .collect();
        MockState {
            parts: Arc::new(Mutex::new(parts)),
            next_pk: Arc::new(Mutex::new(24)),
        }
    }
}

pub struct MockServer {
    pub base_url: String,
}

/// Route engine logs into test output, honoring RUST_LOG. Safe to call
/// once per test; later calls are no-ops.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Bind the mock API on an ephemeral port and serve it in the background.
pub async fn spawn() -> MockServer {
    init_tracing();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("local addr");

    // `nest` matches `/api` but not `/api/`, which is what the client
    // requests for the API root; route the trailing-slash form explicitly.
    let app = Router::new()
        .route("/api/", get(server_info))
        .nest("/api", api_router(MockState::seeded()));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock api");
    });

    MockServer {
        base_url: format!("http://{}/api", addr),
    }
}

fn api_router(state: MockState) -> Router {
    Router::new()
        .route("/", get(server_info))
        .route(
            "/part/",
            get(list_parts).post(create_part).options(part_list_meta),
        )
        .route(
            "/part/{pk}/",
            get(part_detail)
                .patch(update_part)
                .delete(delete_part)
                .options(part_detail_meta),
        )
        .route("/part/category/", get(list_categories))
        .route("/bom/", get(flaky))
        .route("/settings/global/", get(global_settings))
        .route("/user/me/", get(user_me))
        .with_state(state)
}

// ── Listing helpers ───────────────────────────────────────────────────

fn paginate(mut rows: Vec<Value>, params: &HashMap<String, String>) -> Value {
    if let Some(ordering) = params.get("ordering") {
        let (field, reverse) = match ordering.strip_prefix('-') {
            Some(field) => (field.to_string(), true),
            None => (ordering.clone(), false),
        };
        rows.sort_by_key(|row| row[field.as_str()].to_string());
        if reverse {
            rows.reverse();
        }
    }

    let count = rows.len();
    let page: usize = params
        .get("page")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);
    let page_size: usize = params
        .get("page_size")
        .and_then(|v| v.parse().ok())
        .unwrap_or(25);

    let start = (page.max(1) - 1) * page_size;
    let results: Vec<Value> = rows.into_iter().skip(start).take(page_size).collect();

    json!({"count": count, "results": results})
}

// ── Parts ─────────────────────────────────────────────────────────────

async fn list_parts(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let mut rows = state.parts.lock().unwrap().clone();

    if let Some(category) = params.get("category") {
        rows.retain(|row| {
            row["category"].as_i64().map(|v| v.to_string()).as_deref() == Some(category.as_str())
        });
    }
    if let Some(search) = params.get("search") {
        let needle = search.to_lowercase();
        rows.retain(|row| {
            row["name"]
                .as_str()
                .map(|name| name.to_lowercase().contains(&needle))
                .unwrap_or(false)
        });
    }

    Json(paginate(rows, &params))
}

async fn create_part(
    State(state): State<MockState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let name = body["name"].as_str().unwrap_or("").trim().to_string();
    if name.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"name": ["This field is required."]})),
        );
    }

    let mut parts = state.parts.lock().unwrap();
    if parts.iter().any(|row| row["name"] == json!(name)) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"non_field_errors": ["Part with this name already exists"]})),
        );
    }

    let mut next_pk = state.next_pk.lock().unwrap();
    let record = json!({
        "pk": *next_pk,
        "name": name,
        "description": body["description"].as_str().unwrap_or(""),
        "category": body["category"].as_i64().unwrap_or(1),
    });
    *next_pk += 1;
    parts.push(record.clone());

    (StatusCode::CREATED, Json(record))
}

async fn part_detail(
    State(state): State<MockState>,
    Path(pk): Path<i64>,
) -> (StatusCode, Json<Value>) {
    let parts = state.parts.lock().unwrap();
    match parts.iter().find(|row| row["pk"] == json!(pk)) {
        Some(record) => (StatusCode::OK, Json(record.clone())),
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))),
    }
}

async fn update_part(
    State(state): State<MockState>,
    Path(pk): Path<i64>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if let Some(name) = body.get("name") {
        if name.as_str().unwrap_or("").trim().is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"name": ["This field may not be blank."]})),
            );
        }
    }

    let mut parts = state.parts.lock().unwrap();
    match parts.iter_mut().find(|row| row["pk"] == json!(pk)) {
        Some(record) => {
            if let (Some(target), Some(patch)) = (record.as_object_mut(), body.as_object()) {
                for (key, value) in patch {
                    target.insert(key.clone(), value.clone());
                }
            }
            (StatusCode::OK, Json(record.clone()))
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))),
    }
}

async fn delete_part(State(state): State<MockState>, Path(pk): Path<i64>) -> StatusCode {
    let mut parts = state.parts.lock().unwrap();
    let before = parts.len();
    parts.retain(|row| row["pk"] != json!(pk));
    if parts.len() < before {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

fn part_fields() -> Value {
    json!({
        "name": {
            "type": "string",
            "required": true,
            "label": "Name",
            "help_text": "Part name"
        },
        "description": {
            "type": "string",
            "required": false,
            "label": "Description"
        },
        "category": {
            "type": "related field",
            "required": false,
            "label": "Category",
            "model": "partcategory",
            "api_url": "part/category/"
        }
    })
}

async fn part_list_meta() -> Json<Value> {
    Json(json!({"name": "Part List", "actions": {"POST": part_fields()}}))
}

async fn part_detail_meta() -> Json<Value> {
    Json(json!({"name": "Part Detail", "actions": {"PUT": part_fields()}}))
}

// ── Categories ────────────────────────────────────────────────────────

async fn list_categories(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let mut rows = vec![
        json!({"pk": 10, "name": "Fasteners", "parent": 5}),
        json!({"pk": 11, "name": "Seals", "parent": 5}),
        json!({"pk": 12, "name": "Electronics", "parent": null}),
    ];

    if let Some(parent) = params.get("parent") {
        rows.retain(|row| {
            row["parent"].as_i64().map(|v| v.to_string()).as_deref() == Some(parent.as_str())
        });
    }

    Json(paginate(rows, &params))
}

// ── Everything else ───────────────────────────────────────────────────

async fn flaky() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"detail": "worker unavailable"})),
    )
}

async fn server_info() -> Json<Value> {
    Json(json!({
        "server": "Stockdesk",
        "version": "0.13.0",
        "instance": "test",
        "apiVersion": 142,
        "worker_running": true
    }))
}

async fn global_settings() -> Json<Value> {
    Json(json!([
        {"key": "PART_ALLOW_DUPLICATE_IPN", "value": "False"},
        {"key": "STOCK_STALE_DAYS", "value": "90"}
    ]))
}

async fn user_me(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Token {}", TEST_TOKEN))
        .unwrap_or(false);

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Authentication credentials were not provided."})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "pk": 1,
            "username": "allaccess",
            "first_name": "Ally",
            "last_name": "Access",
            "email": "ally@example.com"
        })),
    )
}
