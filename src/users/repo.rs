use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub profile_picture: String,
    pub bio: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Field-level patch for profile updates. `None` leaves the column untouched,
/// so `password_hash` is only rewritten when the caller actually changed the
/// password.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub password_hash: Option<String>,
    pub profile_picture: Option<String>,
}

const USER_COLUMNS: &str =
    "id, fullname, email, password_hash, profile_picture, bio, created_at, updated_at";

impl User {
    /// Case-insensitive lookup; emails are stored lowercased but older rows
    /// may predate that.
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new user. `password_hash` must already be hashed; a duplicate
    /// email surfaces as `ApiError::DuplicateEmail` via the unique index.
    pub async fn create(
        db: &PgPool,
        fullname: &str,
        email: &str,
        password_hash: &str,
        bio: &str,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (fullname, email, password_hash, bio)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(fullname)
        .bind(email)
        .bind(password_hash)
        .bind(bio)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                fullname = COALESCE($2, fullname),
                email = COALESCE($3, email),
                bio = COALESCE($4, bio),
                password_hash = COALESCE($5, password_hash),
                profile_picture = COALESCE($6, profile_picture),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.fullname.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.bio.as_deref())
        .bind(changes.password_hash.as_deref())
        .bind(changes.profile_picture.as_deref())
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
        Ok(user)
    }

    pub async fn update_password(
        db: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), ApiError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(db)
                .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("User"));
        }
        Ok(())
    }
}
