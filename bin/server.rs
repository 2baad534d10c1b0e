// Service Catalog Sync - Web Server
// REST API with Axum: run the pipeline over rows posted as JSON

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use service_catalog::{run, PipelineConfig, RawRow, RemoteCategory, RunOutput, VERSION};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    config: Arc<PipelineConfig>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// POST /api/run body
#[derive(Deserialize)]
struct RunRequest {
    /// Spreadsheet rows as column label → cell text, in sheet order
    rows: Vec<HashMap<String, String>>,
    #[serde(default)]
    remote_categories: Vec<RemoteCategory>,
}

impl RunRequest {
    /// Row numbers as they would appear in the sheet (header is line 1)
    fn raw_rows(self) -> Vec<RawRow> {
        self.rows
            .into_iter()
            .enumerate()
            .map(|(index, cells)| RawRow::new(index + 2, cells))
            .collect()
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok(format!("OK ({})", VERSION)))
}

/// POST /api/run - Extract, collect and reconcile the posted rows
async fn run_pipeline(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> impl IntoResponse {
    let remote = request.remote_categories.clone();
    let rows = request.raw_rows();

    match run(&rows, &remote, &state.config) {
        Ok(output) => {
            log::info!("Run {}: {}", output.run.run_id, output.report.summary());
            (StatusCode::OK, Json(ApiResponse::ok(output))).into_response()
        }
        Err(e) => {
            log::error!("Run aborted: {}", e);
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::<RunOutput>::err(e.to_string())),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("🌐 Service Catalog Sync - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = match std::env::var("CATALOG_CONFIG") {
        Ok(path) => {
            println!("✓ Config loaded: {}", path);
            PipelineConfig::from_file(&path)?
        }
        Err(_) => PipelineConfig::default(),
    };

    let state = AppState {
        config: Arc::new(config),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/run", post(run_pipeline))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = std::env::var("CATALOG_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   Health: GET  /api/health");
    println!("   Run:    POST /api/run");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Failed to start server")?;
    Ok(())
}
