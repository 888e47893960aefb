pub mod products;
pub mod users;

use axum::{body::Bytes, extract::FromRequest, http::StatusCode, Json};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, AppResult, Resource};
use crate::models::Envelope;

pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok", "service": "inventario-api" })))
}

/// `Json<T>` whose rejections render as the error envelope instead of plain text.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

pub type Reply<T> = AppResult<(StatusCode, Json<Envelope<T>>)>;

fn reply<T>(status: StatusCode, data: T) -> Reply<T> {
    Ok((status, Json(Envelope::success(data))))
}

/// Body of a partial update. An empty body carries no changes, same as `{}`.
fn optional_json<T: DeserializeOwned>(body: &Bytes) -> AppResult<Option<T>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(AppError::invalid_json)
}

/// An id that is not a UUID cannot name any record, so it is a 404 like any
/// other unknown id.
fn parse_id(raw: &str, resource: Resource) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(resource))
}
