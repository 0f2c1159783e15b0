mod handlers;
mod request_tracing;
mod static_files;

use crate::errors::AppError;
use crate::models::ErrorBody;
use crate::service::InventoryService;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InventoryService>,
    pub public_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(service: InventoryService, public_dir: PathBuf) -> Self {
        Self {
            service: Arc::new(service),
            public_dir: Arc::new(public_dir),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/items",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route(
            "/api/items/:id",
            put(handlers::update_item).delete(handlers::delete_item),
        )
        .route(
            "/api/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .fallback(static_files::static_fallback)
        .layer(from_fn(request_tracing::request_tracing_middleware))
        .with_state(state)
}

/// Error leaving the HTTP boundary as `{"error": message}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Maps an application error, prefixing store failures with `context`.
    pub fn from_app_error(context: &str, error: AppError) -> Self {
        match error {
            AppError::Validation(message) => Self::bad_request(message),
            other => Self::internal(format!("{context}: {other}")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        } else {
            tracing::warn!(status = %self.status, error = %self.message, "request rejected");
        }
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}
