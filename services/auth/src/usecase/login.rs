use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context as _;

use ases_auth_types::token::issue_session_token;
use ases_domain::account::{AccountView, normalize_email};

use crate::domain::repository::AccountRepository;
use crate::error::AuthServiceError;
use crate::infra::password::{burn_verification, verify_password};
use crate::usecase::present;

fn now_secs() -> anyhow::Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before UNIX epoch")?
        .as_secs())
}

pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub user: AccountView,
    pub token: String,
    pub expires_at: u64,
}

pub struct LoginUseCase<A: AccountRepository> {
    pub accounts: A,
    pub jwt_secret: String,
}

impl<A: AccountRepository> LoginUseCase<A> {
    pub async fn execute(&self, input: LoginInput) -> Result<LoginOutput, AuthServiceError> {
        // Passwords are taken verbatim; only emptiness is rejected.
        let email = present(input.email).map(|e| normalize_email(&e));
        let password = input.password.filter(|p| !p.is_empty());
        let (Some(email), Some(password)) = (email, password) else {
            return Err(AuthServiceError::Validation(
                "Email and password are required",
            ));
        };

        let Some(account) = self.accounts.find_by_email(&email).await? else {
            burn_verification(password).await;
            return Err(AuthServiceError::InvalidCredential);
        };

        if !account.is_active {
            return Err(AuthServiceError::InactiveAccount);
        }

        if !verify_password(password, account.password_hash.clone()).await? {
            return Err(AuthServiceError::InvalidCredential);
        }

        let (token, expires_at) = issue_session_token(
            account.id,
            account.role,
            &account.email,
            now_secs()?,
            &self.jwt_secret,
        )
        .context("issue session token")?;

        tracing::info!(account_id = %account.id, role = %account.role, "login succeeded");
        Ok(LoginOutput {
            user: account.view(),
            token,
            expires_at,
        })
    }
}
