//! Route modules, assembled into the full API router (spec.md §6).

pub mod bulk;
pub mod content;
pub mod health;
pub mod resource;
pub mod sync;
pub mod webhooks;

use axum::{middleware as axum_middleware, routing::get, Json, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::{rate_limit_middleware, request_context_middleware};
use crate::state::AppState;

#[cfg(feature = "openapi")]
use crate::openapi::ApiDoc;
#[cfg(feature = "openapi")]
use utoipa::OpenApi;

/// Builds the full router: every `/api/*` route nested under its prefix,
/// `/health` unnested at the root, request-context and rate-limit
/// middleware applied in that order, and CORS per [`crate::config::ApiConfig`].
pub fn create_api_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let mut router = Router::new()
        .nest("/health", health::router())
        .nest("/api/sync", sync::router())
        .nest("/api/webhooks", webhooks::router())
        .nest("/api/resource", resource::router())
        .nest("/api", content::router())
        .nest("/api/stock", bulk::stock_router())
        .nest("/api/price", bulk::price_router());

    #[cfg(feature = "openapi")]
    {
        router = router.route("/openapi.json", get(openapi_json));
    }
    #[cfg(feature = "swagger-ui")]
    {
        use utoipa_swagger_ui::SwaggerUi;
        router = router.merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", ApiDoc::openapi()));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(request_context_middleware))
                .layer(axum_middleware::from_fn_with_state(state.clone(), rate_limit_middleware)),
        )
        .with_state(state)
}

#[cfg(feature = "openapi")]
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| o.parse().ok()))
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
