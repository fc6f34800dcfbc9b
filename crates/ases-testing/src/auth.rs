//! Session helpers for tests that call authenticated endpoints.

use std::time::{SystemTime, UNIX_EPOCH};

use http::{HeaderName, HeaderValue, header::AUTHORIZATION};

use ases_auth_types::token::issue_session_token;
use ases_domain::account::Role;
use ases_domain::id::AccountId;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-integration-tests";

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Identity to mint session tokens for.
pub struct TestSession {
    pub account_id: AccountId,
    pub role: Role,
    pub email: String,
}

impl TestSession {
    pub fn new(account_id: AccountId, role: Role, email: &str) -> Self {
        Self {
            account_id,
            role,
            email: email.to_owned(),
        }
    }

    /// Token issued now, valid for the usual 24 hours.
    pub fn token(&self, secret: &str) -> String {
        self.token_issued_at(now_secs(), secret)
    }

    /// Token issued at `issued_at`; pass a time over a day ago for an expired one.
    pub fn token_issued_at(&self, issued_at: u64, secret: &str) -> String {
        issue_session_token(self.account_id, self.role, &self.email, issued_at, secret)
            .unwrap()
            .0
    }

    pub fn bearer(&self, secret: &str) -> (HeaderName, HeaderValue) {
        bearer_header(&self.token(secret))
    }
}

pub fn bearer_header(token: &str) -> (HeaderName, HeaderValue) {
    (
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}
