use domain::ValidationError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Edit,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Edit => write!(f, "edit"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("Recipe not found")]
    RecipeNotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("Comment not found")]
    CommentNotFound,
    #[error("Not authorized to {0} this comment")]
    Forbidden(Action),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Internal(anyhow::Error),
}

impl CommentError {
    /// 区分“存储不可达”与“查询本身失败”
    pub fn from_store(err: anyhow::Error) -> Self {
        if storage::is_unavailable(&err) {
            tracing::warn!("Store unreachable: {:#}", err);
            CommentError::Unavailable(err.to_string())
        } else {
            CommentError::Internal(err)
        }
    }
}
