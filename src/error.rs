use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use mongodb::bson;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A blocked precondition. The record is left untouched and the caller is
    /// expected to fix the input and retry the action.
    #[error("{0}")]
    GuardViolation(String),
    #[error("{0}_NOT_FOUND")]
    NotFound(&'static str),
    /// Another request changed the record after it was read.
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] bson::ser::Error),
    #[error("deserialization error: {0}")]
    Deserialize(#[from] bson::de::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store error: {0}")]
    Store(String),
}

impl Error {
    pub fn guard(message: impl Into<String>) -> Self {
        Self::GuardViolation(message.into())
    }
    pub fn is_guard_violation(&self) -> bool {
        matches!(self, Self::GuardViolation(_))
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::GuardViolation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
    fn error_response(&self) -> HttpResponse {
        match self {
            Self::GuardViolation(message) => {
                tracing::warn!(%message, "guard violation");
                HttpResponse::BadRequest().body(message.clone())
            }
            Self::NotFound(_) => HttpResponse::NotFound().body(self.to_string()),
            Self::Conflict(message) => {
                tracing::warn!(%message, "write conflict");
                HttpResponse::Conflict().body(message.clone())
            }
            _ => {
                tracing::error!(error = %self, "request failed");
                HttpResponse::InternalServerError().body("INTERNAL_ERROR")
            }
        }
    }
}
