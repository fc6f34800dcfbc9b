use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::error::AuthServiceError;
use crate::handlers::MessageResponse;
use crate::state::AppState;
use crate::usecase::register::{RegisterInput, RegisterUseCase};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub employee_id: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub language: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<RegisterRequest>, AuthServiceError>,
) -> Result<(StatusCode, Json<MessageResponse>), AuthServiceError> {
    let usecase = RegisterUseCase {
        accounts: state.account_repo(),
        notifier: state.notifier.clone(),
        mail_timeout: state.mail_timeout,
    };
    usecase
        .execute(RegisterInput {
            full_name: body.full_name,
            position: body.position,
            employee_id: body.employee_id,
            email: body.email,
            password: body.password,
            language: body.language,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok(
            "Registration successful. Please check your email for the OTP.",
        )),
    ))
}
