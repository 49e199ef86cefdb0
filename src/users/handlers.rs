use axum::{
    extract::{multipart::Field, DefaultBodyLimit, FromRef, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
    },
    blogs::repo::Blog,
    error::ApiError,
    state::AppState,
    users::{
        dto::{is_valid_email, AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        repo::{ProfileChanges, User},
        upload,
    },
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/profile", get(get_profile).patch(update_profile))
        .route("/users/blogs", get(my_blogs))
        // headroom above the 5MB per-file cap for multipart framing
        .layer(DefaultBodyLimit::max(6 * 1024 * 1024))
}

fn validate_fullname(fullname: &str) -> Result<(), ApiError> {
    if fullname.trim().len() < 3 {
        return Err(ApiError::Validation(
            "Full name must be at least 3 characters long".into(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters long".into(),
        ));
    }
    Ok(())
}

fn validate_bio(bio: &str) -> Result<(), ApiError> {
    if bio.len() > 500 {
        return Err(ApiError::Validation(
            "Bio must be at most 500 characters".into(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    if !is_valid_email(email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let fullname = payload.fullname.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    if fullname.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation("All fields are required".into()));
    }
    validate_fullname(&fullname)?;
    validate_email(&email)?;
    validate_password(&payload.password)?;
    let bio = payload.bio.unwrap_or_default();
    validate_bio(&bio)?;

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "registration with taken email");
        return Err(ApiError::DuplicateEmail);
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &fullname, &email, &hash, &bio).await?;

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: PublicUser::from_record(user, &state.config.api_url),
            token,
            message: Some("Registration successful".into()),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();

    // Unknown email and bad password are indistinguishable to the caller.
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        user: PublicUser::from_record(user, &state.config.api_url),
        token,
        message: None,
    }))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(PublicUser::from_record(user, &state.config.api_url)))
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::Validation(e.to_string())
}

async fn text_value(field: Field<'_>) -> Result<String, ApiError> {
    field.text().await.map_err(bad_multipart)
}

/// PATCH /users/profile, multipart form. Text fields are restricted to
/// fullname/email/bio/password; at most one `profilePicture` file. The file is
/// validated fully before any byte is written, and the record is updated only
/// after the write succeeded, so a crash can orphan a file but never leave a
/// record pointing at a missing one.
#[instrument(skip(state, multipart))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    let mut changes = ProfileChanges::default();
    let mut new_password: Option<String> = None;
    let mut new_file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };
        match name.as_str() {
            "profilePicture" => {
                let original = field.file_name().unwrap_or_default().to_string();
                let ext = upload::validate_extension(&original)?;
                let data = field.bytes().await.map_err(bad_multipart)?;
                upload::validate_size(data.len())?;
                new_file = Some((upload::unique_filename(&ext), data));
            }
            "fullname" => {
                let v = text_value(field).await?;
                if !v.is_empty() {
                    validate_fullname(&v)?;
                    changes.fullname = Some(v.trim().to_string());
                }
            }
            "email" => {
                let v = text_value(field).await?.trim().to_lowercase();
                if !v.is_empty() {
                    validate_email(&v)?;
                    changes.email = Some(v);
                }
            }
            "bio" => {
                let v = text_value(field).await?;
                if !v.is_empty() {
                    validate_bio(&v)?;
                    changes.bio = Some(v);
                }
            }
            "password" => {
                let v = text_value(field).await?;
                if !v.is_empty() {
                    validate_password(&v)?;
                    new_password = Some(v);
                }
            }
            _ => return Err(ApiError::Validation("Invalid updates".into())),
        }
    }

    // Hash once, and only when the password actually changed.
    if let Some(pw) = new_password {
        changes.password_hash = Some(hash_password(&pw)?);
    }

    let old_picture = user.profile_picture.clone();
    if let Some((filename, body)) = &new_file {
        changes.profile_picture =
            Some(upload::store_picture(state.files.as_ref(), filename, body.clone()).await?);
    }

    let updated = User::update_profile(&state.db, user_id, &changes).await?;

    // Best-effort cleanup of the superseded picture; a stale orphan is fine,
    // a failed update is not.
    if new_file.is_some() {
        upload::cleanup_old_picture(state.files.as_ref(), &old_picture).await;
    }

    info!(user_id = %user_id, "profile updated");
    Ok(Json(PublicUser::from_record(updated, &state.config.api_url)))
}

#[instrument(skip(state))]
pub async fn my_blogs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Blog>>, ApiError> {
    let blogs = Blog::list_by_author(&state.db, user_id).await?;
    Ok(Json(blogs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullname_minimum_length() {
        assert!(validate_fullname("Jo").is_err());
        assert!(validate_fullname("  J  ").is_err());
        assert!(validate_fullname("Jane Doe").is_ok());
    }

    #[test]
    fn password_minimum_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("secret1").is_ok());
    }

    #[test]
    fn bio_maximum_length() {
        assert!(validate_bio(&"x".repeat(500)).is_ok());
        assert!(validate_bio(&"x".repeat(501)).is_err());
    }
}
