use chrono::{DateTime, Duration, Utc};
use subtle::ConstantTimeEq;

use ases_domain::account::{AccountView, Locale, Role};
use ases_domain::id::AccountId;

/// Account record as the auth service sees it, including credential material.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub full_name: String,
    pub position: String,
    pub employee_id: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub pending_otp: Option<OtpChallenge>,
    pub language: Locale,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Client-facing projection without the password hash or pending code.
    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id,
            full_name: self.full_name.clone(),
            position: self.position.clone(),
            employee_id: self.employee_id.clone(),
            email: self.email.clone(),
            role: self.role,
            is_active: self.is_active,
            language: self.language,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// The single live one-time passcode of an account awaiting verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl OtpChallenge {
    pub fn new(code: String, now: DateTime<Utc>) -> Self {
        Self {
            code,
            expires_at: now + Duration::seconds(OTP_TTL_SECS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Exact string equality, in constant time for equal-length inputs.
    pub fn matches(&self, submitted: &str) -> bool {
        self.code.as_bytes().ct_eq(submitted.as_bytes()).into()
    }
}

/// Partial update of the self-service profile fields.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub language: Option<Locale>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.position.is_none() && self.language.is_none()
    }
}

/// Content of a one-time-passcode email, before rendering.
#[derive(Debug, Clone)]
pub struct OtpMessage {
    pub to_email: String,
    pub to_name: String,
    pub code: String,
    pub valid_minutes: i64,
}

impl OtpMessage {
    pub fn for_account(account: &Account, challenge: &OtpChallenge) -> Self {
        Self {
            to_email: account.email.clone(),
            to_name: account.full_name.clone(),
            code: challenge.code.clone(),
            valid_minutes: OTP_TTL_SECS / 60,
        }
    }
}

/// One-time passcode length in digits.
pub const OTP_LEN: usize = 6;

/// One-time passcode time-to-live in seconds (10 minutes).
pub const OTP_TTL_SECS: i64 = 600;

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LEN: usize = 6;
