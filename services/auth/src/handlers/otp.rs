use axum::{Json, extract::State};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::error::AuthServiceError;
use crate::handlers::MessageResponse;
use crate::state::AppState;
use crate::usecase::otp::{IssueOtpInput, IssueOtpUseCase, VerifyOtpInput, VerifyOtpUseCase};

// ── POST /verify-otp ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
}

pub async fn verify_otp(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<VerifyOtpRequest>, AuthServiceError>,
) -> Result<Json<MessageResponse>, AuthServiceError> {
    let usecase = VerifyOtpUseCase {
        accounts: state.account_repo(),
    };
    usecase
        .execute(VerifyOtpInput {
            email: body.email,
            otp: body.otp,
        })
        .await?;
    Ok(Json(MessageResponse::ok("OTP verified successfully")))
}

// ── POST /resend-otp ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResendOtpRequest {
    pub email: Option<String>,
}

pub async fn resend_otp(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<ResendOtpRequest>, AuthServiceError>,
) -> Result<Json<MessageResponse>, AuthServiceError> {
    let usecase = IssueOtpUseCase {
        accounts: state.account_repo(),
        notifier: state.notifier.clone(),
        mail_timeout: state.mail_timeout,
    };
    usecase.execute(IssueOtpInput { email: body.email }).await?;
    Ok(Json(MessageResponse::ok("New OTP sent successfully")))
}
