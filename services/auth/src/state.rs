use std::time::Duration;

use axum::extract::FromRef;
use sea_orm::DatabaseConnection;

use ases_auth_types::identity::SessionSecret;

use crate::infra::db::DbAccountRepository;
use crate::infra::mail::Notifier;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub session_secret: SessionSecret,
    pub notifier: Notifier,
    pub mail_timeout: Duration,
}

impl AppState {
    pub fn account_repo(&self) -> DbAccountRepository {
        DbAccountRepository {
            db: self.db.clone(),
        }
    }

    pub fn jwt_secret(&self) -> String {
        self.session_secret.0.to_string()
    }
}

impl FromRef<AppState> for SessionSecret {
    fn from_ref(state: &AppState) -> Self {
        state.session_secret.clone()
    }
}
