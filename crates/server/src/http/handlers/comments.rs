use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use domain::{
    Comment, CommentId, CreateComment, EditComment, PageRequest, Pagination, RatingSummary,
    RecipeId,
};
use serde::{Deserialize, Serialize};

use crate::{auth::AuthUser, error::ApiError, state::AppState};

// --- DTOs ---

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub comment: String,
    pub rating: i64,
}

#[derive(Deserialize)]
pub struct UpdateCommentRequest {
    pub comment: Option<String>,
    pub rating: Option<i64>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub like_count: usize,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        let like_count = comment.like_count();
        Self {
            comment,
            like_count,
        }
    }
}

#[derive(Serialize)]
pub struct CommentResponse {
    pub message: &'static str,
    pub comment: CommentView,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub comments: Vec<CommentView>,
    pub pagination: Pagination,
    pub aggregate_rating: Option<RatingSummary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub message: &'static str,
    pub is_liked: bool,
    pub like_count: usize,
}

// --- Handlers ---

/// 非幂等：重试会产生新的评论
pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(recipe_id): Path<String>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    let Json(payload) = payload?;
    let cmd = CreateComment::new(payload.comment, payload.rating)?;

    let comment = state
        .comments
        .create(&RecipeId::new_unchecked(recipe_id), &user_id, cmd)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            message: "Comment created successfully",
            comment: comment.into(),
        }),
    ))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let Query(query) = query?;
    let page = PageRequest::new(query.page, query.limit, state.max_page_size);

    let result = state
        .comments
        .list(&RecipeId::new_unchecked(recipe_id), page)
        .await?;

    Ok(Json(ListResponse {
        comments: result.comments.into_iter().map(Into::into).collect(),
        pagination: result.pagination,
        aggregate_rating: result.aggregate_rating,
    }))
}

pub async fn update_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(comment_id): Path<String>,
    payload: Result<Json<UpdateCommentRequest>, JsonRejection>,
) -> Result<Json<CommentResponse>, ApiError> {
    let Json(payload) = payload?;
    let edit = EditComment::new(payload.comment, payload.rating)?;

    let comment = state
        .comments
        .update(&CommentId::new_unchecked(comment_id), &user_id, edit)
        .await?;

    Ok(Json(CommentResponse {
        message: "Comment updated successfully",
        comment: comment.into(),
    }))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(comment_id): Path<String>,
) -> Result<Json<LikeResponse>, ApiError> {
    let outcome = state
        .comments
        .toggle_like(&CommentId::new_unchecked(comment_id), &user_id)
        .await?;

    Ok(Json(LikeResponse {
        message: if outcome.is_liked {
            "Comment liked"
        } else {
            "Comment unliked"
        },
        is_liked: outcome.is_liked,
        like_count: outcome.like_count,
    }))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(comment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .comments
        .delete(&CommentId::new_unchecked(comment_id), &user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
