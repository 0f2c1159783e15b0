use super::{ApiError, AppState};
use crate::errors::AppResult;
use crate::models::MessageResponse;
use crate::service::{InventoryService, Outcome};
use crate::validation::{validate_category, validate_item};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use std::sync::Arc;

/// Runs a store call off the async workers; SQLite access is synchronous.
async fn blocking<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&InventoryService) -> T + Send + 'static,
{
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || call(service.as_ref()))
        .await
        .map_err(|error| ApiError::internal(format!("store task failed: {error}")))
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn lift<T>(context: &str, result: AppResult<T>) -> Result<T, ApiError> {
    result.map_err(|error| ApiError::from_app_error(context, error))
}

pub(crate) async fn list_items(State(state): State<AppState>) -> Result<Response, ApiError> {
    let items = lift("Error fetching items", blocking(&state, |service| service.list_items()).await?)?;
    Ok(Json(items).into_response())
}

pub(crate) async fn create_item(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let item = lift("Error adding item", validate_item(&json_body(body)?))?;

    match blocking(&state, move |service| service.create_item(item)).await? {
        Outcome::Created(created) => Ok((StatusCode::CREATED, Json(created)).into_response()),
        Outcome::StoreFailure(message) => Err(ApiError::internal(format!("Error adding item: {message}"))),
        other => Err(ApiError::internal(format!("Error adding item: unexpected outcome {other:?}"))),
    }
}

pub(crate) async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let item = lift("Error updating item", validate_item(&json_body(body)?))?;

    match blocking(&state, move |service| service.update_item(&id, item)).await? {
        Outcome::Updated => Ok(Json(MessageResponse::new("Item updated successfully")).into_response()),
        Outcome::NotFound => Err(ApiError::not_found("Item not found")),
        Outcome::StoreFailure(message) => Err(ApiError::internal(format!("Error updating item: {message}"))),
        other => Err(ApiError::internal(format!("Error updating item: unexpected outcome {other:?}"))),
    }
}

pub(crate) async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match blocking(&state, move |service| service.delete_item(&id)).await? {
        Outcome::Deleted => Ok(Json(MessageResponse::new("Item deleted successfully")).into_response()),
        Outcome::NotFound => Err(ApiError::not_found("Item not found")),
        Outcome::StoreFailure(message) => Err(ApiError::internal(format!("Error deleting item: {message}"))),
        other => Err(ApiError::internal(format!("Error deleting item: unexpected outcome {other:?}"))),
    }
}

pub(crate) async fn list_categories(State(state): State<AppState>) -> Result<Response, ApiError> {
    let categories = lift(
        "Error fetching categories",
        blocking(&state, |service| service.list_categories()).await?,
    )?;
    Ok(Json(categories).into_response())
}

pub(crate) async fn create_category(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let name = lift("Error adding category", validate_category(&json_body(body)?))?;

    match blocking(&state, move |service| service.create_category(&name)).await? {
        Outcome::Created(created) => Ok((StatusCode::CREATED, Json(created)).into_response()),
        // Duplicate names land here too; they are not reported as a distinct conflict.
        Outcome::StoreFailure(message) => {
            Err(ApiError::internal(format!("Error adding category: {message}")))
        }
        other => Err(ApiError::internal(format!(
            "Error adding category: unexpected outcome {other:?}"
        ))),
    }
}
