use anyhow::{Context as _, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, SqlErr,
};

use ases_auth_schema::accounts;
use ases_domain::account::{Locale, Role};
use ases_domain::id::AccountId;

use crate::domain::repository::AccountRepository;
use crate::domain::types::{Account, OtpChallenge, ProfilePatch};
use crate::error::AuthServiceError;

// ── Account repository ────────────────────────────────────────────────────────

/// sea-orm backed credential store. Every call borrows one pooled connection
/// for a single statement; the pool takes it back on drop, on every path.
#[derive(Clone)]
pub struct DbAccountRepository {
    pub db: DatabaseConnection,
}

impl AccountRepository for DbAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthServiceError> {
        let model = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find account by email")?;
        Ok(model.map(account_from_model).transpose()?)
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AuthServiceError> {
        let model = accounts::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find account by id")?;
        Ok(model.map(account_from_model).transpose()?)
    }

    async fn create(&self, account: &Account) -> Result<(), AuthServiceError> {
        let result = accounts::ActiveModel {
            id: Set(account.id.0),
            full_name: Set(account.full_name.clone()),
            position: Set(account.position.clone()),
            employee_id: Set(account.employee_id.clone()),
            email: Set(account.email.clone()),
            password_hash: Set(account.password_hash.clone()),
            role: Set(account.role.as_str().to_owned()),
            is_active: Set(account.is_active),
            otp: Set(account.pending_otp.as_ref().map(|o| o.code.clone())),
            otp_expires_at: Set(account.pending_otp.as_ref().map(|o| o.expires_at)),
            language: Set(account.language.as_str().to_owned()),
            created_at: Set(account.created_at),
            updated_at: Set(account.updated_at),
        }
        .insert(&self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(AuthServiceError::EmailTaken)
            }
            Err(e) => Err(anyhow::Error::new(e).context("create account").into()),
        }
    }

    async fn store_otp(
        &self,
        id: AccountId,
        otp: &OtpChallenge,
        now: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError> {
        // An activation landing after the caller's lookup must not leave a live
        // code on an active account.
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Otp, Expr::value(Some(otp.code.clone())))
            .col_expr(accounts::Column::OtpExpiresAt, Expr::value(Some(otp.expires_at)))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id.0))
            .filter(accounts::Column::IsActive.eq(false))
            .exec(&self.db)
            .await
            .context("store account otp")?;
        Ok(result.rows_affected > 0)
    }

    async fn activate(
        &self,
        id: AccountId,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError> {
        // Conditional on the code still being live, so two concurrent submissions
        // of the same code cannot both succeed.
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::IsActive, Expr::value(true))
            .col_expr(accounts::Column::Otp, Expr::value(Option::<String>::None))
            .col_expr(
                accounts::Column::OtpExpiresAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id.0))
            .filter(accounts::Column::Otp.eq(code))
            .filter(accounts::Column::OtpExpiresAt.gt(now))
            .exec(&self.db)
            .await
            .context("activate account")?;
        Ok(result.rows_affected > 0)
    }

    async fn update_profile(
        &self,
        id: AccountId,
        patch: &ProfilePatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, AuthServiceError> {
        let Some(model) = accounts::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("load account for profile update")?
        else {
            return Ok(None);
        };

        let mut active = model.into_active_model();
        if let Some(ref full_name) = patch.full_name {
            active.full_name = Set(full_name.clone());
        }
        if let Some(ref position) = patch.position {
            active.position = Set(position.clone());
        }
        if let Some(language) = patch.language {
            active.language = Set(language.as_str().to_owned());
        }
        active.updated_at = Set(now);

        let updated = active
            .update(&self.db)
            .await
            .context("update account profile")?;
        Ok(Some(account_from_model(updated)?))
    }
}

fn account_from_model(model: accounts::Model) -> anyhow::Result<Account> {
    let role = model
        .role
        .parse::<Role>()
        .map_err(|e| anyhow!("account {}: {e}", model.id))?;
    let language = model
        .language
        .parse::<Locale>()
        .map_err(|e| anyhow!("account {}: {e}", model.id))?;
    // A code stored without an expiry predates enforced expiry; treat it as lapsed.
    let pending_otp = model.otp.map(|code| OtpChallenge {
        code,
        expires_at: model.otp_expires_at.unwrap_or(DateTime::<Utc>::MIN_UTC),
    });
    Ok(Account {
        id: AccountId(model.id),
        full_name: model.full_name,
        position: model.position,
        employee_id: model.employee_id,
        email: model.email,
        password_hash: model.password_hash,
        role,
        is_active: model.is_active,
        pending_otp,
        language,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
