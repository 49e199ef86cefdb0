use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    blogs::{
        dto::{Comment, CommentRequest, CreateBlogRequest, UpdateBlogRequest},
        repo::Blog,
    },
    error::ApiError,
    state::AppState,
    users::repo::User,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/blogs", post(create_blog).get(list_blogs))
        .route(
            "/api/blogs/:id",
            get(get_blog).put(update_blog).delete(delete_blog),
        )
        .route("/api/blogs/:id/like", post(like_blog))
        .route("/api/blogs/:id/dislike", post(dislike_blog))
        .route("/api/blogs/:id/comments", post(add_comment))
}

/// The blog endpoints wrap everything in `{success, ...}` as the rest of the
/// API does not; this newtype keeps that shape for errors raised with `?`.
pub struct BlogError(ApiError);

impl From<ApiError> for BlogError {
    fn from(e: ApiError) -> Self {
        Self(e)
    }
}

impl IntoResponse for BlogError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        (
            status,
            Json(json!({ "success": false, "message": self.0.to_string() })),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    success: bool,
    data: T,
}

fn ok<T>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
    })
}

#[instrument(skip(state, payload))]
pub async fn create_blog(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateBlogRequest>,
) -> Result<(StatusCode, Json<Envelope<Blog>>), BlogError> {
    payload.validate()?;

    // Author comes from the verified token, never from the body.
    let blog = Blog::create(
        &state.db,
        user_id,
        payload.title.trim(),
        &payload.content,
        payload.summary.trim(),
        &payload.category,
        &payload.tags,
        payload.cover_image.as_deref(),
    )
    .await?;

    info!(blog_id = %blog.id, author = %user_id, "blog created");
    Ok((StatusCode::CREATED, ok(blog)))
}

#[instrument(skip(state))]
pub async fn list_blogs(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<Blog>>>, BlogError> {
    let blogs = Blog::list_all(&state.db).await?;
    Ok(ok(blogs))
}

#[instrument(skip(state))]
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Blog>>, BlogError> {
    let blog = Blog::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Blog"))?;
    Ok(ok(blog))
}

/// Authenticated but not the owner is a 403, distinct from the 401 for a
/// missing or bad token.
async fn load_owned(state: &AppState, id: Uuid, user_id: Uuid) -> Result<Blog, ApiError> {
    let blog = Blog::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Blog"))?;
    if blog.author != user_id {
        warn!(blog_id = %id, author = %blog.author, caller = %user_id, "ownership check failed");
        return Err(ApiError::Forbidden);
    }
    Ok(blog)
}

#[instrument(skip(state, payload))]
pub async fn update_blog(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBlogRequest>,
) -> Result<Json<Envelope<Blog>>, BlogError> {
    payload.validate()?;
    load_owned(&state, id, user_id).await?;

    let blog = Blog::update(&state.db, id, &payload).await?;
    info!(blog_id = %id, "blog updated");
    Ok(ok(blog))
}

#[instrument(skip(state))]
pub async fn delete_blog(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, BlogError> {
    load_owned(&state, id, user_id).await?;

    Blog::delete(&state.db, id).await?;
    info!(blog_id = %id, "blog deleted");
    Ok(Json(json!({ "success": true, "message": "Blog deleted" })))
}

#[instrument(skip(state))]
pub async fn like_blog(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Blog>>, BlogError> {
    let blog = Blog::add_like(&state.db, id).await?;
    Ok(ok(blog))
}

#[instrument(skip(state))]
pub async fn dislike_blog(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Blog>>, BlogError> {
    let blog = Blog::add_dislike(&state.db, id).await?;
    Ok(ok(blog))
}

#[instrument(skip(state, payload))]
pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Envelope<Blog>>), BlogError> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::Validation("Comment text is required".into()).into());
    }

    // Comment author is the caller's display name, stamped server-side.
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    let comment = Comment {
        author: user.fullname,
        text: payload.text.trim().to_string(),
        created_at: OffsetDateTime::now_utc(),
    };
    let value = serde_json::to_value(&comment)
        .map_err(|e| ApiError::Internal(anyhow::Error::from(e)))?;

    let blog = Blog::add_comment(&state.db, id, value).await?;
    info!(blog_id = %id, commenter = %user_id, "comment added");
    Ok((StatusCode::CREATED, ok(blog)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_serializes_author_text_and_timestamp() {
        let comment = Comment {
            author: "Jane Doe".into(),
            text: "Nice post".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let value = serde_json::to_value(&comment).unwrap();
        assert_eq!(value["author"], "Jane Doe");
        assert_eq!(value["text"], "Nice post");
        assert!(value["created_at"].as_str().is_some());
    }

    #[test]
    fn blog_error_body_has_success_false() {
        let response = BlogError(ApiError::Validation("Missing required fields: title".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn forbidden_maps_to_403() {
        let response = BlogError(ApiError::Forbidden).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
