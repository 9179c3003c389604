//! Webserver command - browser-based review UI
//!
//! Serves a small single-page UI plus a JSON API over the same fetch,
//! review, and compare primitives the terminal commands use. The live tool
//! list is fetched once and cached for the session so every verdict is made
//! against the same catalog the checksums will pin.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use toolgate_core::{
    build_policy, compare, summarize, tool_checksum, Choice, CompareSummary, ComparisonRecord,
    Policy, Snapshot, ToolDescriptor,
};
use toolgate_mcp::{fetch_tools, probe, ServerLocator};
use tracing::info;

use crate::cli::WebserverArgs;

const INDEX_HTML: &str = include_str!("../web/index.html");

/// Catalog fetched at session start; all verdicts refer to these bytes
#[derive(Debug, Clone)]
struct Catalog {
    tools: Vec<ToolDescriptor>,
    origin: String,
}

struct AppState {
    locator: ServerLocator,
    io_timeout: Duration,
    catalog: RwLock<Option<Catalog>>,
}

pub async fn run(args: WebserverArgs) -> Result<i32> {
    let locator = ServerLocator::parse(&args.server, args.sse)?;
    let io_timeout = Duration::from_secs(args.timeout);

    probe(&locator, io_timeout)
        .await
        .with_context(|| format!("server {} is not reachable", locator))?;

    let state = Arc::new(AppState {
        locator,
        io_timeout,
        catalog: RwLock::new(None),
    });

    let app = Router::new()
        .route("/", get(index))
        .route("/api/tools", get(api_tools))
        .route("/api/preview", post(api_preview))
        .route("/api/save", post(api_save))
        .route("/api/compare", post(api_compare))
        .with_state(state);

    let bind = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    println!("Review UI listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("review UI server failed")?;
    // The only shutdown path is Ctrl-C
    Ok(crate::EXIT_CANCELLED)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down review UI");
    }
}

/// Fetch the catalog on first use, then reuse it for the whole session
async fn catalog(state: &AppState) -> Result<Catalog, ApiError> {
    if let Some(cached) = state.catalog.read().await.clone() {
        return Ok(cached);
    }

    let fetched = fetch_tools(&state.locator, state.io_timeout)
        .await
        .map_err(|e| ApiError::upstream(format!("failed to fetch tools: {}", e)))?;
    let origin = fetched.origin(&state.locator);
    info!(server = %origin, tools = fetched.tools.len(), "cached catalog for review session");

    let catalog = Catalog {
        tools: fetched.tools,
        origin,
    };
    *state.catalog.write().await = Some(catalog.clone());
    Ok(catalog)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Debug, Serialize)]
struct ToolView {
    name: String,
    description: String,
    checksum: String,
}

async fn api_tools(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let catalog = catalog(&state).await?;
    let tools: Vec<ToolView> = catalog
        .tools
        .iter()
        .map(|tool| ToolView {
            name: tool.name.clone(),
            description: tool.description.clone(),
            checksum: tool_checksum(&tool.name, &tool.description, Some(&catalog.origin)),
        })
        .collect();
    Ok(Json(json!({ "server": catalog.origin, "tools": tools })))
}

#[derive(Debug, Deserialize)]
struct ReviewRequest {
    /// Verdict per tool name; tools without a verdict are ignored
    choices: HashMap<String, Choice>,
    /// Save target, for `/api/save`
    #[serde(default)]
    path: Option<String>,
}

fn policy_from_request(catalog: &Catalog, request: &ReviewRequest, locator: &ServerLocator) -> Policy {
    build_policy(
        &catalog.tools,
        &request.choices,
        &catalog.origin,
        locator.kind(),
    )
}

async fn api_preview(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let catalog = catalog(&state).await?;
    let policy = policy_from_request(&catalog, &request, &state.locator);
    let yaml = policy
        .to_yaml()
        .map_err(|e| ApiError::internal(format!("failed to render policy: {}", e)))?;
    Ok(Json(json!({
        "yaml": yaml,
        "allowed": policy.allowed.len(),
        "denied": policy.denied.len(),
        "malicious": policy.malicious.len(),
    })))
}

async fn api_save(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let catalog = catalog(&state).await?;
    let policy = policy_from_request(&catalog, &request, &state.locator);
    let path = request.path.as_deref().unwrap_or("toolgate_config.yaml");
    let written = policy
        .save(path)
        .map_err(|e| ApiError::internal(format!("failed to save policy: {}", e)))?;
    info!(path = %written.display(), "policy saved from review UI");
    Ok(Json(json!({ "saved": written.display().to_string() })))
}

#[derive(Debug, Deserialize)]
struct CompareRequest {
    /// Policy document text, uploaded inline
    #[serde(default)]
    config: Option<String>,
    /// Path to an existing policy file, as an alternative to `config`
    #[serde(default)]
    config_path: Option<String>,
}

#[derive(Debug, Serialize)]
struct CompareResponse {
    records: Vec<ComparisonRecord>,
    summary: CompareSummary,
}

async fn api_compare(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, ApiError> {
    let policy = match (&request.config, &request.config_path) {
        (Some(yaml), _) => Policy::from_yaml(yaml),
        (None, Some(path)) => Policy::load(path),
        (None, None) => {
            return Err(ApiError::bad_request(
                "request needs 'config' (inline YAML) or 'config_path'".to_string(),
            ))
        }
    }
    .map_err(|e| ApiError::bad_request(format!("failed to load policy: {}", e)))?;
    let catalog = catalog(&state).await?;

    let snapshot = Snapshot::from_tools(&catalog.tools, Some(&catalog.origin));
    let records = compare(&policy, &snapshot);
    let summary = summarize(&records, &policy, &snapshot);
    Ok(Json(CompareResponse { records, summary }))
}

/// JSON API error with an HTTP status
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }

    fn upstream(message: String) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message,
        }
    }

    fn internal(message: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
