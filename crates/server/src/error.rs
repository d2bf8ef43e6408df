use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{DbErr, is_foreign_key_violation, is_unique_violation};
use deployment::DeploymentError;
use services::services::{calendar::CalendarError, identity::IdentityError, linkage::LinkageError};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error, ts_rs::TS)]
#[ts(type = "string")]
pub enum ApiError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Linkage(#[from] LinkageError),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Invalid request body: {0}")]
    Json(#[from] JsonRejection),
    #[error("Invalid query: {0}")]
    Query(#[from] QueryRejection),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

fn database_status(err: &DbErr) -> (StatusCode, &'static str) {
    if matches!(err, DbErr::RecordNotFound(_)) {
        (StatusCode::NOT_FOUND, "NotFound")
    } else if is_unique_violation(err) || is_foreign_key_violation(err) {
        (StatusCode::CONFLICT, "ConflictError")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError")
    }
}

fn database_message(err: &DbErr) -> String {
    match err {
        DbErr::RecordNotFound(msg) => msg.clone(),
        _ if is_unique_violation(err) => {
            "A record with the same unique value already exists".to_string()
        }
        _ if is_foreign_key_violation(err) => {
            "The record is still referenced by other records".to_string()
        }
        _ => "Internal server error".to_string(),
    }
}

impl ApiError {
    fn status(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Identity(err) => match err {
                IdentityError::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
                IdentityError::InvalidCredentials | IdentityError::InvalidToken => {
                    (StatusCode::UNAUTHORIZED, "AuthError")
                }
                IdentityError::EmailTaken => (StatusCode::CONFLICT, "ConflictError"),
                IdentityError::UserNotFound => (StatusCode::NOT_FOUND, "NotFound"),
                IdentityError::Database(db_err) => database_status(db_err),
                IdentityError::PasswordHash(_) | IdentityError::Token(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "IdentityError")
                }
            },
            ApiError::Linkage(err) => match err {
                LinkageError::Database(db_err) => database_status(db_err),
                _ => (StatusCode::NOT_FOUND, "NotFound"),
            },
            ApiError::Calendar(err) => match err {
                CalendarError::Linkage(LinkageError::Database(db_err))
                | CalendarError::Database(db_err) => database_status(db_err),
                _ => (StatusCode::NOT_FOUND, "NotFound"),
            },
            ApiError::Deployment(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DeploymentError"),
            ApiError::Database(db_err) => database_status(db_err),
            ApiError::Json(_) | ApiError::Query(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "AuthError"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "ConflictError"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "PermissionError"),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Identity(IdentityError::Database(db_err))
            | ApiError::Linkage(LinkageError::Database(db_err))
            | ApiError::Calendar(CalendarError::Database(db_err))
            | ApiError::Calendar(CalendarError::Linkage(LinkageError::Database(db_err)))
            | ApiError::Database(db_err) => database_message(db_err),
            ApiError::Identity(IdentityError::PasswordHash(_) | IdentityError::Token(_))
            | ApiError::Deployment(_) => "Internal server error".to_string(),
            ApiError::Json(rejection) => rejection.body_text(),
            ApiError::Query(rejection) => rejection.body_text(),
            ApiError::Unauthorized => "Could not validate credentials".to_string(),
            ApiError::NotFound(msg)
            | ApiError::Internal(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Forbidden(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = self.status();
        let error_message = self.message();

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }
        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}
