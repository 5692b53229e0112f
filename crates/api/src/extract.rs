//! Request extractors for gateway-supplied headers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::wire::{IDEMPOTENCY_KEY_HEADER, USER_ID_HEADER};
use common::{RequestId, UserId};

use crate::error::ApiError;

/// The caller, as identified by the gateway in `X-User-ID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<UserId>().ok())
            .map(AuthenticatedUser)
            .ok_or_else(|| {
                ApiError::Unauthorized("Missing or invalid X-User-ID header".to_string())
            })
    }
}

/// Optional client-supplied `Idempotency-Key`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdempotencyKey(pub Option<RequestId>);

impl<S> FromRequestParts<S> for IdempotencyKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(IDEMPOTENCY_KEY_HEADER) else {
            return Ok(IdempotencyKey(None));
        };
        let key = value.to_str().map(str::trim).map_err(|_| {
            ApiError::BadRequest("Idempotency-Key must be visible ASCII".to_string())
        })?;
        if key.is_empty() {
            return Err(ApiError::BadRequest(
                "Idempotency-Key must not be empty".to_string(),
            ));
        }
        Ok(IdempotencyKey(Some(RequestId::new(key))))
    }
}
