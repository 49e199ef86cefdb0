use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::blogs::dto::UpdateBlogRequest;
use crate::error::ApiError;

/// Blog record. `author` is set once at creation from the authenticated
/// caller and never changes; comments live in a JSONB array.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub category: String,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub author: Uuid,
    pub likes: i32,
    pub dislikes: i32,
    pub comments: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const BLOG_COLUMNS: &str = "id, title, content, summary, category, tags, cover_image, author, \
                            likes, dislikes, comments, created_at";

impl Blog {
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        db: &PgPool,
        author: Uuid,
        title: &str,
        content: &str,
        summary: &str,
        category: &str,
        tags: &[String],
        cover_image: Option<&str>,
    ) -> Result<Blog, ApiError> {
        let blog = sqlx::query_as::<_, Blog>(&format!(
            r#"
            INSERT INTO blogs (author, title, content, summary, category, tags, cover_image)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {BLOG_COLUMNS}
            "#
        ))
        .bind(author)
        .bind(title)
        .bind(content)
        .bind(summary)
        .bind(category)
        .bind(tags)
        .bind(cover_image)
        .fetch_one(db)
        .await?;
        Ok(blog)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> Result<Option<Blog>, ApiError> {
        let blog = sqlx::query_as::<_, Blog>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blogs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(blog)
    }

    pub async fn list_by_author(db: &PgPool, author: Uuid) -> Result<Vec<Blog>, ApiError> {
        let blogs = sqlx::query_as::<_, Blog>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blogs WHERE author = $1 ORDER BY created_at DESC"
        ))
        .bind(author)
        .fetch_all(db)
        .await?;
        Ok(blogs)
    }

    pub async fn list_all(db: &PgPool) -> Result<Vec<Blog>, ApiError> {
        let blogs = sqlx::query_as::<_, Blog>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blogs ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(blogs)
    }

    /// Patch only the provided fields. Ownership is checked by the caller;
    /// author is never updatable.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        changes: &UpdateBlogRequest,
    ) -> Result<Blog, ApiError> {
        let blog = sqlx::query_as::<_, Blog>(&format!(
            r#"
            UPDATE blogs SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                summary = COALESCE($4, summary),
                category = COALESCE($5, category),
                tags = COALESCE($6, tags),
                cover_image = COALESCE($7, cover_image)
            WHERE id = $1
            RETURNING {BLOG_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(changes.content.as_deref())
        .bind(changes.summary.as_deref())
        .bind(changes.category.as_deref())
        .bind(changes.tags.as_deref())
        .bind(changes.cover_image.as_deref())
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::NotFound("Blog"))?;
        Ok(blog)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Blog"));
        }
        Ok(())
    }

    pub async fn add_like(db: &PgPool, id: Uuid) -> Result<Blog, ApiError> {
        Self::bump_counter(db, id, "likes").await
    }

    pub async fn add_dislike(db: &PgPool, id: Uuid) -> Result<Blog, ApiError> {
        Self::bump_counter(db, id, "dislikes").await
    }

    async fn bump_counter(db: &PgPool, id: Uuid, column: &str) -> Result<Blog, ApiError> {
        // column is one of two compile-time literals, never user input
        let blog = sqlx::query_as::<_, Blog>(&format!(
            "UPDATE blogs SET {column} = {column} + 1 WHERE id = $1 RETURNING {BLOG_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::NotFound("Blog"))?;
        Ok(blog)
    }

    /// Append one comment to the JSONB array.
    pub async fn add_comment(
        db: &PgPool,
        id: Uuid,
        comment: serde_json::Value,
    ) -> Result<Blog, ApiError> {
        let blog = sqlx::query_as::<_, Blog>(&format!(
            r#"
            UPDATE blogs SET comments = comments || $2::jsonb
            WHERE id = $1
            RETURNING {BLOG_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(serde_json::Value::Array(vec![comment]))
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::NotFound("Blog"))?;
        Ok(blog)
    }
}
