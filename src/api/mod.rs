// API module - HTTP endpoints

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::repository::Store;

pub mod extract;
pub mod health;
pub mod response;
pub mod villa_numbers;
pub mod villas;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: impl Store + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        villas::get_villas,
        villas::get_villa,
        villas::create_villa,
        villas::update_villa,
        villas::patch_villa,
        villas::delete_villa,
        villa_numbers::get_villa_numbers,
        villa_numbers::get_villa_number,
        villa_numbers::create_villa_number,
        villa_numbers::update_villa_number,
        villa_numbers::delete_villa_number,
    ),
    components(schemas(
        response::ApiResponse,
        health::HealthResponse,
        health::DependencyStatus,
        health::ServiceHealth,
        crate::models::VillaDto,
        crate::models::VillaCreateDto,
        crate::models::VillaUpdateDto,
        crate::models::VillaNumberDto,
        crate::models::VillaNumberCreateDto,
        crate::models::VillaNumberUpdateDto,
    )),
    tags(
        (name = "Villas", description = "Villa management"),
        (name = "Villa numbers", description = "Numbered villa units"),
        (name = "Health", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Builds the full application router.
pub fn app(state: AppState, enable_swagger: bool) -> Router {
    let mut app = Router::new()
        .route("/health", get(health::health_check))
        .merge(villas::router())
        .merge(villa_numbers::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if enable_swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    app
}
