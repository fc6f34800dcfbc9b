#![allow(async_fn_in_trait)]

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use ases_domain::account::{AccountView, Locale};

use crate::error::ClientError;

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RegisterForm {
    pub full_name: String,
    pub position: String,
    pub employee_id: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Locale>,
}

/// Partial profile update; `None` fields are left out of the request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Locale>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginReply {
    pub user: AccountView,
    pub token: String,
}

#[derive(Deserialize)]
struct MessageReply {
    message: String,
}

#[derive(Deserialize)]
struct ProfileReply {
    user: AccountView,
}

#[derive(Deserialize)]
struct ErrorReply {
    kind: Option<String>,
    message: Option<String>,
}

// ── AuthApi ───────────────────────────────────────────────────────────────────

/// The auth service endpoints the session controller talks to.
pub trait AuthApi: Send + Sync {
    /// Returns the server's confirmation message.
    async fn register(&self, form: &RegisterForm) -> Result<String, ClientError>;

    async fn verify_otp(&self, email: &str, otp: &str) -> Result<String, ClientError>;

    async fn resend_otp(&self, email: &str) -> Result<String, ClientError>;

    async fn login(&self, email: &str, password: &str) -> Result<LoginReply, ClientError>;

    async fn me(&self, token: &str) -> Result<AccountView, ClientError>;

    async fn update_me(&self, token: &str, update: &ProfileUpdate)
    -> Result<AccountView, ClientError>;
}

/// [`AuthApi`] over HTTP with reqwest.
#[derive(Clone)]
pub struct HttpAuthApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::network)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(ClientError::network)?;
        handle_response(resp).await
    }
}

/// Decode a success body as `T`, or turn an error body into [`ClientError::Api`].
async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    let body = resp.text().await.map_err(ClientError::network)?;

    if status.is_success() {
        return serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()));
    }

    let reply = serde_json::from_str::<ErrorReply>(&body).ok();
    let (kind, message) = match reply {
        Some(ErrorReply { kind, message }) => (kind, message),
        None => (None, None),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        kind: kind.unwrap_or_else(|| "UNKNOWN".to_owned()),
        message: message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_owned()
        }),
    })
}

impl AuthApi for HttpAuthApi {
    async fn register(&self, form: &RegisterForm) -> Result<String, ClientError> {
        let reply: MessageReply = self.post("/register", form).await?;
        Ok(reply.message)
    }

    async fn verify_otp(&self, email: &str, otp: &str) -> Result<String, ClientError> {
        let body = serde_json::json!({ "email": email, "otp": otp });
        let reply: MessageReply = self.post("/verify-otp", &body).await?;
        Ok(reply.message)
    }

    async fn resend_otp(&self, email: &str) -> Result<String, ClientError> {
        let body = serde_json::json!({ "email": email });
        let reply: MessageReply = self.post("/resend-otp", &body).await?;
        Ok(reply.message)
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginReply, ClientError> {
        let body = serde_json::json!({ "email": email, "password": password });
        self.post("/login", &body).await
    }

    async fn me(&self, token: &str) -> Result<AccountView, ClientError> {
        let resp = self
            .http
            .get(self.url("/me"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(ClientError::network)?;
        let reply: ProfileReply = handle_response(resp).await?;
        Ok(reply.user)
    }

    async fn update_me(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<AccountView, ClientError> {
        let resp = self
            .http
            .patch(self.url("/me"))
            .bearer_auth(token)
            .json(update)
            .send()
            .await
            .map_err(ClientError::network)?;
        let reply: ProfileReply = handle_response(resp).await?;
        Ok(reply.user)
    }
}
