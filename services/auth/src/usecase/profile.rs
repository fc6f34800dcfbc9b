use chrono::Utc;

use ases_domain::account::{AccountView, Locale};
use ases_domain::id::AccountId;

use crate::domain::repository::AccountRepository;
use crate::domain::types::ProfilePatch;
use crate::error::AuthServiceError;
use crate::usecase::present;

// ── GetProfile ────────────────────────────────────────────────────────────────

pub struct GetProfileUseCase<A: AccountRepository> {
    pub accounts: A,
}

impl<A: AccountRepository> GetProfileUseCase<A> {
    pub async fn execute(&self, id: AccountId) -> Result<AccountView, AuthServiceError> {
        let account = self
            .accounts
            .find_by_id(id)
            .await?
            .ok_or(AuthServiceError::AccountNotFound)?;
        Ok(account.view())
    }
}

// ── UpdateProfile ─────────────────────────────────────────────────────────────

pub struct UpdateProfileInput {
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub language: Option<String>,
}

impl UpdateProfileInput {
    /// Absent fields stay untouched; present ones must not be blank.
    fn into_patch(self) -> Result<ProfilePatch, AuthServiceError> {
        let full_name = match self.full_name {
            None => None,
            Some(v) => Some(
                present(Some(v)).ok_or(AuthServiceError::Validation("Full name cannot be empty"))?,
            ),
        };
        let position = match self.position {
            None => None,
            Some(v) => Some(
                present(Some(v)).ok_or(AuthServiceError::Validation("Position cannot be empty"))?,
            ),
        };
        let language = self
            .language
            .map(|raw| raw.trim().parse::<Locale>())
            .transpose()
            .map_err(|_| AuthServiceError::Validation("Unsupported language"))?;

        let patch = ProfilePatch {
            full_name,
            position,
            language,
        };
        if patch.is_empty() {
            return Err(AuthServiceError::Validation("No profile fields to update"));
        }
        Ok(patch)
    }
}

pub struct UpdateProfileUseCase<A: AccountRepository> {
    pub accounts: A,
}

impl<A: AccountRepository> UpdateProfileUseCase<A> {
    pub async fn execute(
        &self,
        id: AccountId,
        input: UpdateProfileInput,
    ) -> Result<AccountView, AuthServiceError> {
        let patch = input.into_patch()?;
        let account = self
            .accounts
            .update_profile(id, &patch, Utc::now())
            .await?
            .ok_or(AuthServiceError::AccountNotFound)?;
        Ok(account.view())
    }
}
