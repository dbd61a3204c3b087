use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::{error::ApiError, state::AppState};

/// Decides whether a request may use the site. The server is given one of
/// these at startup rather than baking a rule in.
pub trait AccessPolicy: Send + Sync {
    fn is_allowed(&self, headers: &HeaderMap) -> bool;
}

/// Lets everybody in.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAny;

impl AccessPolicy for AllowAny {
    fn is_allowed(&self, _headers: &HeaderMap) -> bool {
        true
    }
}

/// Requires an `Authorization: Bearer <token>` header carrying a fixed token.
#[derive(Debug, Clone)]
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl AccessPolicy for BearerToken {
    fn is_allowed(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| token == self.token)
    }
}

/// Middleware that rejects requests the configured policy does not allow.
pub async fn require_access(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.access.is_allowed(request.headers()) {
        next.run(request).await
    } else {
        warn!("Access denied to {}", request.uri());
        ApiError::unauthorized().into_response()
    }
}
