//! REST API for the load planning service.
//!
//! Provides the ingestion and egress boundary of the packing engine as HTTP
//! endpoints. Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, ShipmentDefaults};
use crate::model::{CaseKind, PackJob, Placement, ValidationError, validate_requested};
use crate::planner::{PackSummary, pack_job, pack_job_with_progress};

#[derive(Clone)]
struct ApiState {
    defaults: ShipmentDefaults,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>stack-it-up API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request structure for the packing endpoints.
///
/// Omitted extents fall back to the deployment defaults from the
/// configuration; requested counts are always supplied by the caller.
#[derive(Deserialize, Clone, ToSchema)]
#[schema(
    example = json!({
        "container": [6058.0, 2591.0, 2438.0],
        "large_case": [1105.0, 1265.0, 975.0],
        "small_case": [221.0, 96.3, 90.3],
        "requested_large": 10,
        "requested_small": 100
    })
)]
pub struct PackRequest {
    #[serde(default)]
    #[schema(value_type = Option<[f64; 3]>, nullable = true)]
    pub container: Option<(f64, f64, f64)>,
    #[serde(default)]
    #[schema(value_type = Option<[f64; 3]>, nullable = true)]
    pub large_case: Option<(f64, f64, f64)>,
    #[serde(default)]
    #[schema(value_type = Option<[f64; 3]>, nullable = true)]
    pub small_case: Option<(f64, f64, f64)>,
    pub requested_large: u32,
    pub requested_small: u32,
}

impl PackRequest {
    /// Merges the request with the deployment defaults into a validated job.
    fn into_job(self, defaults: &ShipmentDefaults) -> Result<PackJob, ValidationError> {
        validate_requested(
            self.requested_large,
            "requested_large",
            defaults.max_requested(),
        )?;
        validate_requested(
            self.requested_small,
            "requested_small",
            defaults.max_requested(),
        )?;
        PackJob::new(
            self.container.unwrap_or_else(|| defaults.container()),
            self.large_case.unwrap_or_else(|| defaults.large_case()),
            self.small_case.unwrap_or_else(|| defaults.small_case()),
            self.requested_large,
            self.requested_small,
        )
    }
}

/// Response structure with the placement list and derived metrics.
///
/// # Fields
/// * `placements` - Ordered placement list (discovery order)
/// * `summary` - Placed counts, rates and volumetric utilization
#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    pub placements: Vec<Placement>,
    pub summary: PackSummary,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn parse_pack_request(
    payload: Result<Json<PackRequest>, JsonRejection>,
    defaults: &ShipmentDefaults,
) -> Result<PackJob, Response> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return Err(json_deserialize_error(err)),
    };

    payload
        .into_job(defaults)
        .map_err(|err| validation_error(err.to_string()))
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_pack, handle_pack_stream),
    components(
        schemas(
            PackRequest,
            PackResponse,
            Placement,
            CaseKind,
            PackSummary,
            ErrorResponse
        )
    ),
    tags((name = "packing", description = "Endpoints for container load planning"))
)]
struct ApiDoc;

/// Starts the API server.
///
/// Configures CORS for cross-origin requests. Blocks until the server is
/// terminated.
pub async fn start_api_server(config: ApiConfig, defaults: ShipmentDefaults) {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState { defaults };

    let app = Router::new()
        // API endpoints
        .route("/pack", post(handle_pack))
        .route("/pack_stream", post(handle_pack_stream))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            panic!("❌ Could not bind API server to {}: {}", addr, err);
        }
    };

    let display_host = config.display_host().to_string();
    println!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        println!("💡 Local access: http://localhost:{}", config.port());
    }
    println!("📦 API Endpoints:");
    println!("   - POST /pack");
    println!("   - POST /pack_stream");
    println!("📑 Documentation:");
    println!("   - GET /docs");
    println!("   - GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for POST /pack endpoint.
///
/// Runs one packing job to completion and returns the placement list with
/// derived metrics. Under-filled quotas are a normal outcome, not an error.
///
/// # Parameters
/// * `payload` - JSON payload with requested counts and optional extents
///
/// # Returns
/// JSON response with placements and summary
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Completed packing run", body = PackResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request data",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> impl IntoResponse {
    let job = match parse_pack_request(payload, &state.defaults) {
        Ok(job) => job,
        Err(response) => return response,
    };

    println!(
        "📥 New pack request: {} large, {} small",
        job.requested_large, job.requested_small
    );
    let outcome = pack_job(&job);
    let summary = PackSummary::derive(&job, &outcome);
    println!(
        "📦 Result: {}/{} large, {}/{} small, {} placements, {:.1}% utilization",
        summary.large_placed,
        summary.requested_large,
        summary.small_placed,
        summary.requested_small,
        outcome.placement_count(),
        summary.utilization_percent
    );

    let response = PackResponse {
        placements: outcome.placements,
        summary,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /pack_stream endpoint (SSE).
///
/// Streams pack events in real-time as Server-Sent Events
/// (text/event-stream). A consumer can visualize placements live without
/// waiting for the complete result.
#[utoipa::path(
    post,
    path = "/pack_stream",
    request_body = PackRequest,
    responses(
        (
            status = 200,
            description = "Streams pack events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request data",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> impl IntoResponse {
    let job = match parse_pack_request(payload, &state.defaults) {
        Ok(job) => job,
        Err(response) => return response,
    };

    let (tx, rx) = mpsc::channel::<String>(32);

    tokio::task::spawn_blocking(move || {
        let _ = pack_job_with_progress(&job, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                if tx.blocking_send(json).is_err() {
                    // Receiver has closed the stream; remaining events are discarded.
                }
            }
        });
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
