#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use ases_domain::id::AccountId;

use crate::domain::types::{Account, OtpChallenge, OtpMessage, ProfilePatch};
use crate::error::{AuthServiceError, NotifyError};

/// Credential store: account rows keyed by (normalized) email.
pub trait AccountRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthServiceError>;

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AuthServiceError>;

    /// Insert a new account. Fails with `EmailTaken` if the email is registered.
    async fn create(&self, account: &Account) -> Result<(), AuthServiceError>;

    /// Replace the pending code of an account that is still inactive (sets `otp`,
    /// `otp_expires_at`, `updated_at`). Returns `false` when nothing was updated.
    async fn store_otp(
        &self,
        id: AccountId,
        otp: &OtpChallenge,
        now: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError>;

    /// Activate the account and clear its code, only if `code` is still the live,
    /// unexpired code. Returns `false` when nothing was updated.
    async fn activate(
        &self,
        id: AccountId,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError>;

    /// Apply a profile patch. Returns the updated account, or `None` if it does not exist.
    async fn update_profile(
        &self,
        id: AccountId,
        patch: &ProfilePatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, AuthServiceError>;
}

/// Notification sender: delivers a one-time passcode out of band.
pub trait OtpNotifier: Send + Sync {
    async fn send_otp(&self, message: &OtpMessage) -> Result<(), NotifyError>;
}
