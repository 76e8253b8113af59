//! HTTP surface: auth and property routes, static attachment serving, error mapping.

pub mod auth;
pub mod error;
pub mod form;
pub mod properties;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::attachments::AttachmentStore;
use crate::auth::AuthService;
use crate::repository::PropertyRepository;

pub use error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct AppState {
    pub properties: Arc<dyn PropertyRepository>,
    pub auth: AuthService,
    pub attachments: AttachmentStore,
    pub default_owner_id: i64,
}

pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.attachments.root());

    Router::new()
        .route("/", get(banner))
        .nest("/api/auth", auth::router())
        .nest("/api/properties", properties::router())
        .nest_service("/uploads", uploads)
        .fallback(route_not_found)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn banner() -> &'static str {
    "AlkiFor backend is running."
}

async fn route_not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "API route not found." })),
    )
}
