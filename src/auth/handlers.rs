use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{ChangePasswordRequest, MessageResponse, UpdateProfileRequest},
        jwt::AuthUser,
        password::{hash_password, verify_password},
    },
    error::ApiError,
    state::AppState,
    users::{
        dto::PublicUser,
        repo::{ProfileChanges, User},
    },
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/profile", put(update_profile))
        .route("/auth/change-password", put(change_password))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(PublicUser::from_record(user, &state.config.api_url)))
}

/// JSON counterpart of the multipart profile update; only name and bio.
#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let mut changes = ProfileChanges::default();

    if let Some(fullname) = payload.fullname.filter(|v| !v.is_empty()) {
        if fullname.trim().len() < 3 {
            return Err(ApiError::Validation(
                "Full name must be at least 3 characters long".into(),
            ));
        }
        changes.fullname = Some(fullname.trim().to_string());
    }
    if let Some(bio) = payload.bio.filter(|v| !v.is_empty()) {
        if bio.len() > 500 {
            return Err(ApiError::Validation(
                "Bio must be at most 500 characters".into(),
            ));
        }
        changes.bio = Some(bio);
    }

    let user = User::update_profile(&state.db, user_id, &changes).await?;

    info!(user_id = %user_id, "profile updated");
    Ok(Json(PublicUser::from_record(user, &state.config.api_url)))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    if !verify_password(&payload.current_password, &user.password_hash)? {
        warn!(user_id = %user_id, "change-password with wrong current password");
        return Err(ApiError::Validation(
            "Current password is incorrect".into(),
        ));
    }

    if payload.new_password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters long".into(),
        ));
    }

    let hash = hash_password(&payload.new_password)?;
    User::update_password(&state.db, user_id, &hash).await?;

    info!(user_id = %user_id, "password changed");
    Ok(Json(MessageResponse {
        message: "Password updated successfully".into(),
    }))
}
