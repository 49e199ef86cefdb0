use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ApiError;

/// Closed category set; anything else is a validation error.
pub const CATEGORIES: [&str; 6] = [
    "technology",
    "lifestyle",
    "travel",
    "food",
    "health",
    "other",
];

pub fn validate_category(category: &str) -> Result<(), ApiError> {
    if !CATEGORIES.contains(&category) {
        return Err(ApiError::Validation(format!(
            "Category must be one of: {}",
            CATEGORIES.join(", ")
        )));
    }
    Ok(())
}

fn validate_summary(summary: &str) -> Result<(), ApiError> {
    if summary.len() > 200 {
        return Err(ApiError::Validation(
            "Summary must be less than 200 characters".into(),
        ));
    }
    Ok(())
}

/// Note the absence of an `author` field: serde drops it even if a client
/// smuggles one in, and the handler takes the author from the token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
}

impl CreateBlogRequest {
    /// One aggregate error naming every missing required field.
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.content.trim().is_empty() {
            missing.push("content");
        }
        if self.summary.trim().is_empty() {
            missing.push("summary");
        }
        if self.category.trim().is_empty() {
            missing.push("category");
        }
        if !missing.is_empty() {
            return Err(ApiError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }
        validate_category(&self.category)?;
        validate_summary(&self.summary)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub cover_image: Option<String>,
}

impl UpdateBlogRequest {
    /// Required columns stay non-blank after an update: a field that is
    /// provided but empty is rejected, matching the create-side rule.
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut blank = Vec::new();
        if matches!(&self.title, Some(v) if v.trim().is_empty()) {
            blank.push("title");
        }
        if matches!(&self.content, Some(v) if v.trim().is_empty()) {
            blank.push("content");
        }
        if matches!(&self.summary, Some(v) if v.trim().is_empty()) {
            blank.push("summary");
        }
        if matches!(&self.category, Some(v) if v.trim().is_empty()) {
            blank.push("category");
        }
        if !blank.is_empty() {
            return Err(ApiError::Validation(format!(
                "Fields cannot be blank: {}",
                blank.join(", ")
            )));
        }
        if let Some(category) = &self.category {
            validate_category(category)?;
        }
        if let Some(summary) = &self.summary {
            validate_summary(summary)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}

/// Comment as stored inside the blog's JSONB array.
#[derive(Debug, Serialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
