use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failure to hand a one-time passcode to the mail relay.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("mail relay rejected the message: {0}")]
    Send(String),
    #[error("mail relay timed out")]
    Timeout,
}

/// Auth service domain error variants.
///
/// Every variant maps to one status, one stable `kind` and one wire message.
/// Unknown email and wrong password share `InvalidCredential` on purpose.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("User not found")]
    AccountNotFound,
    #[error("Email is already registered")]
    EmailTaken,
    #[error("Account is already verified")]
    AccountAlreadyActive,
    #[error("Invalid email or password")]
    InvalidCredential,
    #[error("Account not active. Please verify OTP first.")]
    InactiveAccount,
    #[error("Invalid OTP")]
    InvalidOtp,
    #[error("OTP has expired. Please request a new one.")]
    OtpExpired,
    #[error("Failed to send OTP")]
    Dispatch(#[from] NotifyError),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::AccountAlreadyActive => "ACCOUNT_ALREADY_ACTIVE",
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::InactiveAccount => "INACTIVE_ACCOUNT",
            Self::InvalidOtp => "INVALID_OTP",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::Dispatch(_) => "DISPATCH_FAILED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidOtp | Self::OtpExpired => StatusCode::BAD_REQUEST,
            Self::AccountNotFound => StatusCode::NOT_FOUND,
            Self::EmailTaken | Self::AccountAlreadyActive => StatusCode::CONFLICT,
            Self::InvalidCredential => StatusCode::UNAUTHORIZED,
            Self::InactiveAccount => StatusCode::FORBIDDEN,
            Self::Dispatch(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AuthServiceError {
    fn from(_: JsonRejection) -> Self {
        Self::Validation("Malformed JSON body")
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Log 500s only. tower-http TraceLayer already records method/uri/status for all
        // requests, and 4xx are expected client errors.
        match self {
            Self::Internal(ref e) => {
                tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
            }
            Self::Dispatch(ref e) => {
                tracing::error!(error = %e, kind = "DISPATCH_FAILED", "otp delivery failed");
            }
            _ => {}
        }
        let body = serde_json::json!({
            "success": false,
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
