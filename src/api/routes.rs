//! Application route configuration.

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{auth_routes, comment_routes, post_routes, user_routes};
use super::openapi::ApiDoc;
use super::AppState;

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/posts", post_routes())
        .merge(comment_routes());

    Router::new()
        .nest("/api", api)
        // OpenAPI Swagger UI documentation
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Global middleware
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    database: ServiceStatus,
}

/// Service status
#[derive(Serialize)]
struct ServiceStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint with database connectivity check
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.database {
        None => ServiceStatus {
            status: "not_configured",
            error: None,
        },
        Some(db) => match db.ping().await {
            Ok(_) => ServiceStatus {
                status: "healthy",
                error: None,
            },
            Err(e) => ServiceStatus {
                status: "unhealthy",
                error: Some(e.to_string()),
            },
        },
    };

    let ok = database.status != "unhealthy";
    let status_code = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(HealthResponse { ok, database }))
}
