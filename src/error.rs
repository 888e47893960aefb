use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;

use thiserror::Error;
use tracing::{error, warn};

use crate::models::Envelope;

/// Message sent for every 5xx; the real cause only goes to the log.
const INTERNAL_MESSAGE: &str = "Error interno del servidor";
const INVALID_JSON_MESSAGE: &str = "Cuerpo JSON inválido";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Product,
    User,
}

impl Resource {
    fn not_found_message(self) -> &'static str {
        match self {
            Self::Product => "No se encontró el producto",
            Self::User => "No se encontró el usuario",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:?} not found")]
    NotFound(Resource),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("insufficient stock: available {available}, requested {requested}, floor {floor}")]
    InsufficientStock {
        available: i64,
        requested: i64,
        floor: i64,
    },

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The text a client is allowed to see.
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound(resource) => resource.not_found_message().to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::InsufficientStock { .. } => {
                "No hay suficiente inventario para realizar la salida".to_string()
            }
            Self::Unauthorized(msg) => (*msg).to_string(),
            Self::Store(_) | Self::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (status, Json(Envelope::<()>::failure(self.public_message()))).into_response()
    }
}

impl AppError {
    /// A body that is not the JSON we expected. The parser's detail is logged
    /// and never echoed back.
    pub fn invalid_json(detail: impl fmt::Display) -> Self {
        warn!(detail = %detail, "Rejected request body");
        Self::Validation(INVALID_JSON_MESSAGE.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_json(rejection.body_text())
    }
}
