//! Bearer-token identity extractor.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::response::{IntoResponse, Response};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use http::request::Parts;
use http::{HeaderMap, StatusCode};

use crate::token::{SessionInfo, TokenError, validate_session_token};

/// HMAC secret used to verify session tokens. Services expose it to the
/// extractor through `FromRef`.
#[derive(Clone)]
pub struct SessionSecret(pub Arc<str>);

impl SessionSecret {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self(secret.into())
    }
}

/// Identity of the caller, taken from a valid `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct SessionIdentity(pub SessionInfo);

/// Rejection for [`SessionIdentity`]: always 401 with the service error shape.
#[derive(Debug)]
pub enum IdentityRejection {
    Missing,
    Invalid(TokenError),
}

impl IntoResponse for IdentityRejection {
    fn into_response(self) -> Response {
        if let Self::Invalid(ref e) = self {
            tracing::debug!(error = %e, "rejected session token");
        }
        let body = serde_json::json!({
            "success": false,
            "kind": "INVALID_TOKEN",
            "message": "invalid token",
        });
        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

/// Read the bearer token from request headers, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_owned())
}

impl<S> FromRequestParts<S> for SessionIdentity
where
    S: Send + Sync,
    SessionSecret: FromRef<S>,
{
    type Rejection = IdentityRejection;

    // Extract synchronously and return a 'static future, same as the axum-core 0.5
    // signature expects.
    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let secret = SessionSecret::from_ref(state);
        let token = bearer_token(&parts.headers);

        async move {
            let token = token.ok_or(IdentityRejection::Missing)?;
            let info =
                validate_session_token(&token, &secret.0).map_err(IdentityRejection::Invalid)?;
            Ok(Self(info))
        }
    }
}
