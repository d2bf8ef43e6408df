use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json` whose rejection is rendered in the `ApiResponse` envelope
/// as a 400 instead of axum's plain-text 422.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
