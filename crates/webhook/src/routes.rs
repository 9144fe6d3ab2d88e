use axum::routing::{delete, get, post};
use axum::Router;
use http::Method;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{handlers, state::AppState};

pub fn create_route(state: AppState) -> Router {
    Router::new()
        .route("/webhooks/:provider/:webhook_token", post(handlers::webhook::intake))
        .route("/integrations/evolution/create", post(handlers::integrations::create))
        .route("/integrations/evolution/:instance_name", delete(handlers::integrations::delete))
        .route("/health/whatsapp", get(handlers::health::whatsapp_health))
        .with_state(state)
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(tower_http::cors::Any)
                    .allow_methods([Method::GET, Method::POST, Method::DELETE]),
            ),
        )
}
