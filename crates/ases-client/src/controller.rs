//! Client session state machine.
//!
//! ```text
//! Unauthenticated --register--> PendingVerification --verify_otp--> Unauthenticated{login_hint}
//!        ^                                                                 |
//!        +------------------------logout---- Authenticated <----login------+
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

use ases_domain::account::{AccountView, normalize_email};

use crate::api::{AuthApi, ProfileUpdate, RegisterForm};
use crate::error::ClientError;
use crate::store::{SessionStore, StoredSession};
use crate::token::is_expired;

/// Minimum spacing between resend attempts.
pub const RESEND_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated {
        /// Email to prefill on the login screen after a verification.
        login_hint: Option<String>,
    },
    PendingVerification {
        email: String,
        resend_available_at: Instant,
    },
    Authenticated {
        user: AccountView,
        token: String,
    },
}

/// Screen the client should show for its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    VerifyOtp,
    Dashboard,
    AdminDashboard,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub struct SessionController<A, S> {
    api: A,
    store: S,
    state: SessionState,
}

impl<A: AuthApi, S: SessionStore> SessionController<A, S> {
    pub fn new(api: A, store: S) -> Self {
        Self {
            api,
            store,
            state: SessionState::Unauthenticated { login_hint: None },
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn route(&self) -> Route {
        match &self.state {
            SessionState::Unauthenticated { .. } => Route::Login,
            SessionState::PendingVerification { .. } => Route::VerifyOtp,
            SessionState::Authenticated { user, .. } if user.role.is_admin() => {
                Route::AdminDashboard
            }
            SessionState::Authenticated { .. } => Route::Dashboard,
        }
    }

    /// Time left before `resend_otp` may hit the network again.
    pub fn resend_remaining(&self) -> Option<Duration> {
        match &self.state {
            SessionState::PendingVerification {
                resend_available_at,
                ..
            } => Some(resend_available_at.saturating_duration_since(Instant::now())),
            _ => None,
        }
    }

    /// Rehydrate from the store. Unreadable or expired sessions are dropped.
    pub fn restore(&mut self) -> Route {
        self.state = match self.store.load() {
            Ok(Some(session)) if !is_expired(&session.token, now_secs()) => {
                SessionState::Authenticated {
                    user: session.user,
                    token: session.token,
                }
            }
            Ok(None) => SessionState::Unauthenticated { login_hint: None },
            Ok(Some(_)) | Err(_) => {
                tracing::debug!("discarding stale or unreadable stored session");
                self.discard_stored();
                SessionState::Unauthenticated { login_hint: None }
            }
        };
        self.route()
    }

    pub async fn register(&mut self, form: RegisterForm) -> Result<Route, ClientError> {
        let email = normalize_email(&form.email);
        self.api.register(&form).await?;
        self.state = SessionState::PendingVerification {
            email,
            resend_available_at: Instant::now() + RESEND_COOLDOWN,
        };
        Ok(self.route())
    }

    /// Enter verification for an account registered earlier (e.g. in another run).
    /// The resend cooldown is not armed since no send time is known.
    pub fn await_verification(&mut self, email: &str) -> Route {
        self.state = SessionState::PendingVerification {
            email: normalize_email(email),
            resend_available_at: Instant::now(),
        };
        self.route()
    }

    /// Submit a code. Success leads to the login screen, never straight in.
    pub async fn verify_otp(&mut self, code: &str) -> Result<Route, ClientError> {
        let SessionState::PendingVerification { ref email, .. } = self.state else {
            return Err(ClientError::InvalidState {
                action: "OTP verification",
            });
        };
        let code = code.trim();
        if code.is_empty() {
            return Err(ClientError::Local("Please enter the OTP code"));
        }

        let email = email.clone();
        self.api.verify_otp(&email, code).await?;
        self.state = SessionState::Unauthenticated {
            login_hint: Some(email),
        };
        Ok(self.route())
    }

    /// Ask for a fresh code. Every attempt, failed or not, restarts the cooldown.
    pub async fn resend_otp(&mut self) -> Result<(), ClientError> {
        let SessionState::PendingVerification {
            ref email,
            ref mut resend_available_at,
        } = self.state
        else {
            return Err(ClientError::InvalidState {
                action: "OTP resend",
            });
        };

        let now = Instant::now();
        if now < *resend_available_at {
            let remaining = *resend_available_at - now;
            return Err(ClientError::Cooldown {
                remaining_secs: remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0),
            });
        }
        *resend_available_at = now + RESEND_COOLDOWN;

        let email = email.clone();
        self.api.resend_otp(&email).await?;
        Ok(())
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<Route, ClientError> {
        let reply = self.api.login(email.trim(), password).await?;
        let session = StoredSession {
            user: reply.user,
            token: reply.token,
        };
        if let Err(e) = self.store.save(&session) {
            tracing::warn!(error = %e, "session could not be persisted");
        }
        self.state = SessionState::Authenticated {
            user: session.user,
            token: session.token,
        };
        Ok(self.route())
    }

    pub fn logout(&mut self) -> Result<Route, ClientError> {
        self.state = SessionState::Unauthenticated { login_hint: None };
        self.store.clear()?;
        Ok(self.route())
    }

    pub async fn refresh_profile(&mut self) -> Result<AccountView, ClientError> {
        let token = self.token("profile refresh")?;
        let result = self.api.me(&token).await;
        self.sync_user(result)
    }

    pub async fn update_profile(
        &mut self,
        update: ProfileUpdate,
    ) -> Result<AccountView, ClientError> {
        let token = self.token("profile update")?;
        let result = self.api.update_me(&token, &update).await;
        self.sync_user(result)
    }

    fn token(&self, action: &'static str) -> Result<String, ClientError> {
        match &self.state {
            SessionState::Authenticated { token, .. } => Ok(token.clone()),
            _ => Err(ClientError::InvalidState { action }),
        }
    }

    /// Keep the in-memory and stored user in step with the server's view.
    fn sync_user(
        &mut self,
        result: Result<AccountView, ClientError>,
    ) -> Result<AccountView, ClientError> {
        let user = match result {
            Ok(user) => user,
            Err(e) if e.is_invalid_token() => {
                self.state = SessionState::Unauthenticated { login_hint: None };
                self.discard_stored();
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        if let SessionState::Authenticated {
            user: ref mut current,
            ref token,
        } = self.state
        {
            *current = user.clone();
            let session = StoredSession {
                user: user.clone(),
                token: token.clone(),
            };
            if let Err(e) = self.store.save(&session) {
                tracing::warn!(error = %e, "session could not be persisted");
            }
        }
        Ok(user)
    }

    fn discard_stored(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "stored session could not be cleared");
        }
    }
}
