use reqwest;
use serde::{Deserialize, Serialize};
use serde_json;
use std::{error::Error, fmt};
use warp::http::StatusCode;

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub enum Status {
    #[default]
    Ok,

    Internal(String),
    InvalidArgument(String),
    NotFound(String),
    AlreadyExists(String),
    FailedPrecondition(String),
    Aborted(String),
    Unauthenticated(String),
    PermissionDenied(String),
}

impl Status {
    pub fn new(msg: &str, err: impl Error) -> Self {
        Status::Internal(format!("{msg}: '{err}'"))
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Status::Internal(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Status::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Status::NotFound(msg.into())
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        Status::AlreadyExists(msg.into())
    }

    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        Status::FailedPrecondition(msg.into())
    }

    pub fn aborted(msg: impl Into<String>) -> Self {
        Status::Aborted(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Status::Unauthenticated(msg.into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Status::PermissionDenied(msg.into())
    }

    /// HTTP status code that a handler replies with for this status.
    pub fn http_code(&self) -> StatusCode {
        match self {
            Status::Ok => StatusCode::OK,
            Status::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Status::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Status::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Status::NotFound(_) => StatusCode::NOT_FOUND,
            Status::AlreadyExists(_) | Status::FailedPrecondition(_) | Status::Aborted(_) => {
                StatusCode::CONFLICT
            }
            Status::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for Status {
    fn from(err: std::io::Error) -> Self {
        Self::new("IO error", err)
    }
}

impl From<serde_json::Error> for Status {
    fn from(err: serde_json::Error) -> Self {
        Self::new("serde error", err)
    }
}

impl From<reqwest::Error> for Status {
    fn from(err: reqwest::Error) -> Self {
        Self::new("reqwest error", err)
    }
}

impl From<jsonwebtoken::errors::Error> for Status {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::unauthenticated(format!("invalid id token: {err}"))
    }
}

use firestore::errors::FirestoreError;
impl From<FirestoreError> for Status {
    fn from(err: FirestoreError) -> Self {
        match err {
            FirestoreError::DataNotFoundError(err) => Self::not_found(err.to_string()),
            FirestoreError::InvalidParametersError(err) => Self::invalid_argument(err.to_string()),
            FirestoreError::DataConflictError(err) => Self::aborted(err.to_string()),
            err => Self::new("firestore error", err),
        }
    }
}

impl Error for Status {}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "Ok"),
            Status::Internal(msg) => write!(f, "Internal error: {msg}"),
            Status::InvalidArgument(msg) => write!(f, "Invalid argument error: {msg}"),
            Status::NotFound(msg) => write!(f, "Not found error: {msg}"),
            Status::AlreadyExists(msg) => write!(f, "Already exists error: {msg}"),
            Status::FailedPrecondition(msg) => write!(f, "Failed precondition error: {msg}"),
            Status::Aborted(msg) => write!(f, "Aborted error: {msg}"),
            Status::Unauthenticated(msg) => write!(f, "Unauthenticated error: {msg}"),
            Status::PermissionDenied(msg) => write!(f, "Permission denied error: {msg}"),
        }
    }
}
