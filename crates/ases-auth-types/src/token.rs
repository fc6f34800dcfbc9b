//! Session-token issuance and validation.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use ases_domain::account::Role;
use ases_domain::id::AccountId;

/// Session-token lifetime in seconds (1 day). There is no refresh token;
/// the holder must log in again once it lapses.
pub const SESSION_TOKEN_TTL_SECS: u64 = 86_400;

/// Identity carried by a validated session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub account_id: AccountId,
    pub role: Role,
    pub email: String,
    pub expires_at: u64,
}

/// Errors returned by [`validate_session_token`].
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("token encoding failed")]
    Encode(#[source] jsonwebtoken::errors::Error),
}

/// JWT claims payload.
///
/// | Field | JWT claim | Meaning |
/// |-------|-----------|---------|
/// | `sub` | `sub` | account id (UUID string) |
/// | `role` | custom | `"user"` or `"admin"` |
/// | `email` | custom | account email at issuance time |
/// | `iat` | `iat` | issued-at, seconds since epoch |
/// | `exp` | `exp` | expiry, `iat + SESSION_TOKEN_TTL_SECS` |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub role: Role,
    pub email: String,
    pub iat: u64,
    pub exp: u64,
}

fn decode_jwt(token: &str, secret: &str) -> Result<SessionClaims, TokenError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::Malformed,
    })?;

    Ok(data.claims)
}

/// Validate a bearer token and return the identity it asserts.
pub fn validate_session_token(token: &str, secret: &str) -> Result<SessionInfo, TokenError> {
    let claims = decode_jwt(token, secret)?;
    let account_id = claims
        .sub
        .parse::<AccountId>()
        .map_err(|_| TokenError::Malformed)?;
    Ok(SessionInfo {
        account_id,
        role: claims.role,
        email: claims.email,
        expires_at: claims.exp,
    })
}

/// Mint a session token for an account. `issued_at` is seconds since epoch.
///
/// Requires the `USE_ONLY_IN_AUTH_SERVICE` feature: the auth service is the
/// sole issuer.
#[cfg(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test))]
pub fn issue_session_token(
    account_id: AccountId,
    role: Role,
    email: &str,
    issued_at: u64,
    secret: &str,
) -> Result<(String, u64), TokenError> {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let exp = issued_at + SESSION_TOKEN_TTL_SECS;
    let claims = SessionClaims {
        sub: account_id.to_string(),
        role,
        email: email.to_owned(),
        iat: issued_at,
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(TokenError::Encode)?;
    Ok((token, exp))
}
