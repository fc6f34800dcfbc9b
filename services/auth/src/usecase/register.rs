use std::time::Duration;

use chrono::Utc;

use ases_domain::account::{Locale, Role, looks_like_email, normalize_email};
use ases_domain::id::AccountId;

use crate::domain::repository::{AccountRepository, OtpNotifier};
use crate::domain::types::{Account, MIN_PASSWORD_LEN, OtpChallenge, OtpMessage};
use crate::error::AuthServiceError;
use crate::infra::password::hash_password;
use crate::usecase::otp::deliver;
use crate::usecase::{generate_otp_code, present};

pub struct RegisterInput {
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub employee_id: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub language: Option<String>,
}

struct ValidRegistration {
    full_name: String,
    position: String,
    employee_id: String,
    email: String,
    password: String,
    language: Locale,
}

fn validate(input: RegisterInput) -> Result<ValidRegistration, AuthServiceError> {
    let full_name =
        present(input.full_name).ok_or(AuthServiceError::Validation("Full name is required"))?;
    let position =
        present(input.position).ok_or(AuthServiceError::Validation("Position is required"))?;
    let employee_id = present(input.employee_id)
        .ok_or(AuthServiceError::Validation("Employee ID is required"))?;

    let email = present(input.email)
        .map(|e| normalize_email(&e))
        .filter(|e| looks_like_email(e))
        .ok_or(AuthServiceError::Validation("A valid email is required"))?;

    let password = input
        .password
        .filter(|p| p.chars().count() >= MIN_PASSWORD_LEN)
        .ok_or(AuthServiceError::Validation(
            "Password must be at least 6 characters",
        ))?;

    let language = match present(input.language) {
        None => Locale::default(),
        Some(raw) => raw
            .parse::<Locale>()
            .map_err(|_| AuthServiceError::Validation("Unsupported language"))?,
    };

    Ok(ValidRegistration {
        full_name,
        position,
        employee_id,
        email,
        password,
        language,
    })
}

/// Create an inactive account holding a fresh code, then mail the code.
///
/// A delivery failure leaves the account in place; `/resend-otp` recovers it.
pub struct RegisterUseCase<A, N>
where
    A: AccountRepository,
    N: OtpNotifier,
{
    pub accounts: A,
    pub notifier: N,
    pub mail_timeout: Duration,
}

impl<A, N> RegisterUseCase<A, N>
where
    A: AccountRepository,
    N: OtpNotifier,
{
    pub async fn execute(&self, input: RegisterInput) -> Result<AccountId, AuthServiceError> {
        let valid = validate(input)?;

        if self.accounts.find_by_email(&valid.email).await?.is_some() {
            return Err(AuthServiceError::EmailTaken);
        }

        let password_hash = hash_password(valid.password).await?;
        let now = Utc::now();
        let challenge = OtpChallenge::new(generate_otp_code(), now);
        let account = Account {
            id: AccountId::generate(),
            full_name: valid.full_name,
            position: valid.position,
            employee_id: valid.employee_id,
            email: valid.email,
            password_hash,
            role: Role::User,
            is_active: false,
            pending_otp: Some(challenge.clone()),
            language: valid.language,
            created_at: now,
            updated_at: now,
        };

        // A concurrent registration of the same email loses here with EmailTaken.
        self.accounts.create(&account).await?;
        tracing::info!(account_id = %account.id, "account registered");

        deliver(
            &self.notifier,
            &OtpMessage::for_account(&account, &challenge),
            self.mail_timeout,
        )
        .await?;
        Ok(account.id)
    }
}
