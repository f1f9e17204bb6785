//! Shared-secret authentication for mutating and administrative routes.

use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sharedfiles_core::AppError;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Header carrying the shared secret.
pub const AUTH_HEADER: &str = "auth";

#[derive(Clone)]
pub struct AuthState {
    pub token: String,
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|provided| secure_compare(provided, &auth_state.token));

    if !authorized {
        tracing::debug!(
            method = %request.method(),
            path = %request.uri().path(),
            "Rejected request without valid auth header"
        );
        return HttpAppError(AppError::Unauthorized("Unauthorized".to_string())).into_response();
    }

    next.run(request).await
}
