use axum::{Json, extract::State};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use ases_domain::account::AccountView;

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::login::{LoginInput, LoginUseCase};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: AccountView,
    pub token: String,
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, AuthServiceError>,
) -> Result<Json<LoginResponse>, AuthServiceError> {
    let usecase = LoginUseCase {
        accounts: state.account_repo(),
        jwt_secret: state.jwt_secret(),
    };
    let out = usecase
        .execute(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok(Json(LoginResponse {
        success: true,
        user: out.user,
        token: out.token,
    }))
}
