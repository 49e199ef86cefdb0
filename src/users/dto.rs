use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo::User;

/// Sentinel path for accounts that never uploaded a picture. Never deleted.
pub const DEFAULT_PICTURE: &str = "uploads/default-profile.jpg";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Clients get an absolute, fetchable URL; the database keeps relative paths.
pub fn public_picture_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Public part of the user returned to clients. The password hash never
/// leaves the repo layer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub profile_picture: String,
    pub bio: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl PublicUser {
    pub fn from_record(user: User, api_url: &str) -> Self {
        Self {
            id: user.id,
            fullname: user.fullname,
            email: user.email,
            profile_picture: public_picture_url(api_url, &user.profile_picture),
            bio: user.bio,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_normal_addresses() {
        assert!(is_valid_email("jane@x.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
    }

    #[test]
    fn email_regex_rejects_junk() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two@@at.com"));
        assert!(!is_valid_email("spaces in@mail.com"));
        assert!(!is_valid_email("no-tld@host"));
    }

    #[test]
    fn picture_url_join_handles_slashes() {
        assert_eq!(
            public_picture_url("http://localhost:8080", "uploads/a.jpg"),
            "http://localhost:8080/uploads/a.jpg"
        );
        assert_eq!(
            public_picture_url("http://localhost:8080/", "/uploads/a.jpg"),
            "http://localhost:8080/uploads/a.jpg"
        );
    }

    #[test]
    fn public_user_serializes_with_wire_names() {
        let user = User {
            id: Uuid::new_v4(),
            fullname: "Jane Doe".into(),
            email: "jane@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            profile_picture: DEFAULT_PICTURE.into(),
            bio: String::new(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let json =
            serde_json::to_value(PublicUser::from_record(user, "http://localhost:8080")).unwrap();
        assert!(json.get("_id").is_some());
        assert_eq!(
            json["profilePicture"],
            "http://localhost:8080/uploads/default-profile.jpg"
        );
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }
}
