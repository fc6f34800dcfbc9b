//! Read-only peek at a session token's expiry.
//!
//! The signature is not checked here; the server does that on every call.

use serde::Deserialize;

#[derive(Deserialize)]
struct ExpClaim {
    exp: u64,
}

/// `exp` claim of a JWT, or `None` if the token cannot be decoded.
pub fn token_expiry(token: &str) -> Option<u64> {
    jsonwebtoken::dangerous::insecure_decode::<ExpClaim>(token)
        .ok()
        .map(|data| data.claims.exp)
}

/// Undecodable tokens count as expired.
pub fn is_expired(token: &str, now_secs: u64) -> bool {
    token_expiry(token).is_none_or(|exp| exp < now_secs)
}
