use anyhow::bail;

use ases_core::config::{env_or, optional_env, require_env};

/// Auth service configuration loaded from environment variables.
#[derive(Debug)]
pub struct AuthConfig {
    /// Database connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// HMAC secret for signing session tokens. Env var: `JWT_SECRET`.
    pub jwt_secret: String,
    /// TCP port to listen on (default 3112). Env var: `AUTH_PORT`.
    pub auth_port: u16,
    pub db_pool: DbPoolConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone)]
pub struct DbPoolConfig {
    /// Env var: `DB_MAX_CONNECTIONS` (default 10).
    pub max_connections: u32,
    /// Env var: `DB_ACQUIRE_TIMEOUT_SECS` (default 5).
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    /// `None` when `SMTP_HOST` is unset: codes go to the log instead.
    pub smtp: Option<SmtpConfig>,
    pub from_address: String,
    pub from_name: String,
    pub timeout_secs: u64,
}

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("use_tls", &self.use_tls)
            .finish()
    }
}

pub const DEFAULT_FROM_NAME: &str = "ASESystem - No Reply";

impl AuthConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: require_env("DATABASE_URL")?,
            jwt_secret: require_env("JWT_SECRET")?,
            auth_port: env_or("AUTH_PORT", 3112)?,
            db_pool: DbPoolConfig {
                max_connections: env_or("DB_MAX_CONNECTIONS", 10)?,
                acquire_timeout_secs: env_or("DB_ACQUIRE_TIMEOUT_SECS", 5)?,
            },
            mail: MailConfig::from_env()?,
        })
    }
}

impl MailConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let smtp = match optional_env("SMTP_HOST") {
            None => None,
            Some(host) => Some(SmtpConfig {
                host,
                port: env_or("SMTP_PORT", 587)?,
                username: optional_env("SMTP_USERNAME"),
                password: optional_env("SMTP_PASSWORD"),
                use_tls: env_or("SMTP_TLS", true)?,
            }),
        };

        // The relay login doubles as sender when MAIL_FROM is unset.
        let from_address = optional_env("MAIL_FROM")
            .or_else(|| smtp.as_ref().and_then(|s| s.username.clone()));
        let from_address = match (from_address, &smtp) {
            (Some(addr), _) => addr,
            (None, None) => "no-reply@localhost".to_owned(),
            (None, Some(_)) => bail!("MAIL_FROM or SMTP_USERNAME is required when SMTP_HOST is set"),
        };

        Ok(Self {
            smtp,
            from_address,
            from_name: optional_env("MAIL_FROM_NAME").unwrap_or_else(|| DEFAULT_FROM_NAME.to_owned()),
            timeout_secs: env_or("MAIL_TIMEOUT_SECS", 10)?,
        })
    }
}
