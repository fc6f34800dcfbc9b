use axum::{Json, extract::State};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use ases_auth_types::identity::SessionIdentity;
use ases_domain::account::AccountView;

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::profile::{GetProfileUseCase, UpdateProfileInput, UpdateProfileUseCase};

#[derive(Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: AccountView,
}

// ── GET /me ───────────────────────────────────────────────────────────────────

pub async fn get_me(
    State(state): State<AppState>,
    SessionIdentity(session): SessionIdentity,
) -> Result<Json<ProfileResponse>, AuthServiceError> {
    let usecase = GetProfileUseCase {
        accounts: state.account_repo(),
    };
    let user = usecase.execute(session.account_id).await?;
    Ok(Json(ProfileResponse {
        success: true,
        user,
    }))
}

// ── PATCH /me ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub language: Option<String>,
}

pub async fn update_me(
    State(state): State<AppState>,
    SessionIdentity(session): SessionIdentity,
    WithRejection(Json(body), _): WithRejection<Json<UpdateProfileRequest>, AuthServiceError>,
) -> Result<Json<ProfileResponse>, AuthServiceError> {
    let usecase = UpdateProfileUseCase {
        accounts: state.account_repo(),
    };
    let user = usecase
        .execute(
            session.account_id,
            UpdateProfileInput {
                full_name: body.full_name,
                position: body.position,
                language: body.language,
            },
        )
        .await?;
    Ok(Json(ProfileResponse {
        success: true,
        user,
    }))
}
