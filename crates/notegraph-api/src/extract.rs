//! Request extractors whose rejections render through [`ApiError`].

use axum::extract::FromRequest;

use crate::ApiError;

/// JSON request body. A missing field, a wrong type or a malformed body is
/// answered with 400 and an `{"error": ...}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);
