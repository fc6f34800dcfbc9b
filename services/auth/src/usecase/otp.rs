use std::time::Duration;

use chrono::Utc;

use ases_domain::account::normalize_email;

use crate::domain::repository::{AccountRepository, OtpNotifier};
use crate::domain::types::{OtpChallenge, OtpMessage};
use crate::error::{AuthServiceError, NotifyError};
use crate::usecase::{generate_otp_code, present};

/// Hand a code to the notifier, giving up after `timeout`.
pub(crate) async fn deliver<N: OtpNotifier>(
    notifier: &N,
    message: &OtpMessage,
    timeout: Duration,
) -> Result<(), AuthServiceError> {
    match tokio::time::timeout(timeout, notifier.send_otp(message)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(NotifyError::Timeout.into()),
    }
}

// ── IssueOtp (resend) ─────────────────────────────────────────────────────────

pub struct IssueOtpInput {
    pub email: Option<String>,
}

pub struct IssueOtpUseCase<A, N>
where
    A: AccountRepository,
    N: OtpNotifier,
{
    pub accounts: A,
    pub notifier: N,
    pub mail_timeout: Duration,
}

impl<A, N> IssueOtpUseCase<A, N>
where
    A: AccountRepository,
    N: OtpNotifier,
{
    pub async fn execute(&self, input: IssueOtpInput) -> Result<(), AuthServiceError> {
        let email = present(input.email)
            .map(|e| normalize_email(&e))
            .ok_or(AuthServiceError::Validation("Email is required"))?;

        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(AuthServiceError::AccountNotFound)?;

        if account.is_active {
            return Err(AuthServiceError::AccountAlreadyActive);
        }

        let now = Utc::now();
        let challenge = OtpChallenge::new(generate_otp_code(), now);
        // The write finishes and releases its connection before the relay is contacted.
        // Zero rows means the account was activated after the lookup above.
        if !self.accounts.store_otp(account.id, &challenge, now).await? {
            return Err(AuthServiceError::AccountAlreadyActive);
        }

        deliver(
            &self.notifier,
            &OtpMessage::for_account(&account, &challenge),
            self.mail_timeout,
        )
        .await?;
        tracing::info!(account_id = %account.id, "otp issued");
        Ok(())
    }
}

// ── VerifyOtp ─────────────────────────────────────────────────────────────────

pub struct VerifyOtpInput {
    pub email: Option<String>,
    pub otp: Option<String>,
}

pub struct VerifyOtpUseCase<A: AccountRepository> {
    pub accounts: A,
}

impl<A: AccountRepository> VerifyOtpUseCase<A> {
    pub async fn execute(&self, input: VerifyOtpInput) -> Result<(), AuthServiceError> {
        let (Some(email), Some(otp)) = (present(input.email), present(input.otp)) else {
            return Err(AuthServiceError::Validation("Email and OTP are required"));
        };
        let email = normalize_email(&email);

        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(AuthServiceError::AccountNotFound)?;

        let challenge = account
            .pending_otp
            .as_ref()
            .ok_or(AuthServiceError::InvalidOtp)?;
        if !challenge.matches(&otp) {
            return Err(AuthServiceError::InvalidOtp);
        }

        let now = Utc::now();
        if challenge.is_expired(now) {
            return Err(AuthServiceError::OtpExpired);
        }

        // Zero rows means another request consumed or replaced the code first.
        if !self.accounts.activate(account.id, &otp, now).await? {
            return Err(AuthServiceError::InvalidOtp);
        }
        tracing::info!(account_id = %account.id, "account activated");
        Ok(())
    }
}
