//! Protocol Messages
//!
//! Wire format for the battle endpoint. A successful battle is returned as
//! a JSON array of narration lines; failures as a `ServerError` object.

use serde::{Deserialize, Serialize};

use crate::game::combat::BattleResult;
use crate::network::auth::AuthError;
use crate::network::matchmaking::BattleError;

/// Server error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

impl ServerError {
    /// Create an error body.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl From<&BattleError> for ServerError {
    fn from(err: &BattleError) -> Self {
        Self::new(ErrorCode::from(err), err.to_string())
    }
}

impl From<&AuthError> for ServerError {
    fn from(err: &AuthError) -> Self {
        Self::new(ErrorCode::Unauthorized, err.to_string())
    }
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Missing or invalid credentials.
    Unauthorized,
    /// Wrong HTTP method for the route.
    MethodNotAllowed,
    /// Unknown route.
    NotFound,
    /// Malformed request.
    BadRequest,
    /// Player already has a pending battle request.
    AlreadyWaiting,
    /// Player has no cards.
    EmptyDeck,
    /// No opponent arrived in time.
    WaitTimedOut,
    /// Pending request was withdrawn.
    Cancelled,
    /// Battle aborted by an internal error.
    InternalError,
}

impl ErrorCode {
    /// HTTP status code for this error.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::Unauthorized => 401,
            ErrorCode::MethodNotAllowed => 405,
            ErrorCode::NotFound => 404,
            ErrorCode::BadRequest => 400,
            ErrorCode::AlreadyWaiting => 409,
            ErrorCode::EmptyDeck => 409,
            ErrorCode::WaitTimedOut => 408,
            ErrorCode::Cancelled => 410,
            ErrorCode::InternalError => 500,
        }
    }
}

impl From<&BattleError> for ErrorCode {
    fn from(err: &BattleError) -> Self {
        match err {
            BattleError::Internal(_) => ErrorCode::InternalError,
            BattleError::AlreadyWaiting(_) => ErrorCode::AlreadyWaiting,
            BattleError::EmptyDeck(_) => ErrorCode::EmptyDeck,
            BattleError::WaitTimedOut => ErrorCode::WaitTimedOut,
            BattleError::Cancelled => ErrorCode::Cancelled,
        }
    }
}

/// Battle log payload: a JSON array with one string per narration line.
pub fn battle_payload(result: &BattleResult) -> Result<String, serde_json::Error> {
    result.log_json()
}

/// Reason phrase for the status codes this server emits.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
