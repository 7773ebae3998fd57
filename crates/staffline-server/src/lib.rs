//! Staffline Web Server
//!
//! Axum-based REST API for the Staffline capacity planning engine.
//!
//! Security features:
//! - Bearer API key authentication (secure by default, use --no-auth for local dev)
//! - Restrictive CORS policy
//! - Full audit logging for all API access (reads and writes)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use staffline_core::{CapacityEngine, Database, EngineConfig};

mod handlers;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Environment variable holding comma-separated API keys
pub const API_KEYS_ENV: &str = "STAFFLINE_API_KEYS";

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Accepted keys, sent as "Bearer <key>" in the Authorization header
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
        }
    }
}

/// Parse a comma-separated list of API keys, skipping blanks
pub fn parse_api_keys(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub engine: CapacityEngine<Database>,
    pub config: ServerConfig,
}

/// Authentication middleware - validates bearer API keys
///
/// Keys are compared in constant time.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    let api_key_valid = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|key| validate_api_key(key, &state.config.api_keys))
        .unwrap_or(false);

    if api_key_valid {
        info!(user = "api-key", path = %request.uri().path(), "Authenticated via API key");
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no valid auth");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Validate an API key against the configured keys using constant-time comparison
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    valid_keys.iter().any(|key| {
        let key_bytes = key.as_bytes();
        // Only compare if lengths match (constant-time for same-length keys)
        provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes))
    })
}

/// Identify the caller for audit logging
///
/// Returns "api-key" for API key auth, or "local-dev" for unauthenticated
pub fn get_user_email(headers: &axum::http::HeaderMap) -> String {
    if headers
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .is_some()
    {
        return "api-key".to_string();
    }

    "local-dev".to_string()
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(
    db: Database,
    static_dir: Option<&str>,
    config: ServerConfig,
    engine_config: EngineConfig,
) -> Router {
    let engine = CapacityEngine::new(db.clone(), engine_config);
    create_router_with_engine(db, engine, static_dir, config)
}

/// Create the application router around a prepared engine (for testing)
pub fn create_router_with_engine(
    db: Database,
    engine: CapacityEngine<Database>,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> Router {
    let state = Arc::new(AppState {
        db,
        engine,
        config: config.clone(),
    });

    let api_routes = Router::new()
        // Auth
        .route("/me", get(handlers::get_me))
        // Capacity analytics
        .route(
            "/capacity/intelligence",
            get(handlers::get_capacity_intelligence),
        )
        .route("/capacity/utilization", get(handlers::get_utilization))
        .route("/capacity/predictions", get(handlers::get_predictions))
        .route("/capacity/bottlenecks", get(handlers::identify_bottlenecks))
        .route("/capacity/scenarios", post(handlers::run_scenario))
        .route("/capacity/patterns", get(handlers::get_patterns))
        .route("/capacity/skills/forecast", get(handlers::forecast_skills))
        .route("/capacity/optimize", post(handlers::optimize_allocation))
        .route("/capacity/snapshots", post(handlers::record_snapshot))
        // Employees
        .route(
            "/employees",
            get(handlers::list_employees).post(handlers::create_employee),
        )
        .route("/employees/:id", get(handlers::get_employee))
        .route(
            "/employees/:id/status",
            post(handlers::set_employee_status),
        )
        .route(
            "/employees/:id/skills",
            get(handlers::list_employee_skills).post(handlers::assign_employee_skill),
        )
        // Skills
        .route(
            "/skills",
            get(handlers::list_skills).post(handlers::create_skill),
        )
        // Projects
        .route(
            "/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route("/projects/:id", get(handlers::get_project))
        .route(
            "/projects/:id/requirements",
            get(handlers::list_requirements).post(handlers::set_requirement),
        )
        .route("/projects/:id/status", post(handlers::update_project_status))
        // Allocations
        .route(
            "/allocations",
            get(handlers::list_allocations).post(handlers::create_allocation),
        )
        .route(
            "/allocations/:id",
            axum::routing::delete(handlers::delete_allocation),
        )
        // Bottlenecks
        .route(
            "/bottlenecks",
            get(handlers::list_bottlenecks).post(handlers::record_bottleneck),
        )
        .route(
            "/bottlenecks/:id/resolve",
            post(handlers::resolve_bottleneck),
        )
        // Audit log
        .route("/audit", get(handlers::list_audit_log));

    // Build CORS layer
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    let mut app = Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
    engine_config: EngineConfig,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    } else if config.api_keys.is_empty() {
        warn!(
            "⚠️  No API keys configured (set {}); every request will be rejected",
            API_KEYS_ENV
        );
    }

    let app = create_router(db, static_dir, config, engine_config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        use staffline_core::Error as CoreError;

        let err = err.into();
        let client_error = match err.downcast_ref::<CoreError>() {
            Some(e @ CoreError::InsufficientData { .. }) => {
                Some((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
            }
            Some(CoreError::InvalidData(msg)) => Some((StatusCode::BAD_REQUEST, msg.clone())),
            Some(CoreError::NotFound(what)) => {
                Some((StatusCode::NOT_FOUND, format!("{} not found", what)))
            }
            _ => None,
        };

        match client_error {
            Some((status, message)) => Self {
                status,
                message,
                internal: None,
            },
            None => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                // Keep full error for logging
                internal: Some(err),
            },
        }
    }
}
