use crate::error::ValidationError;
use crate::models::{CommentText, Rating};

#[derive(Debug, Clone)]
pub struct CreateComment {
    pub text: CommentText,
    pub rating: Rating,
}

impl CreateComment {
    pub fn new(text: String, rating: i64) -> Result<Self, ValidationError> {
        Ok(Self {
            text: CommentText::new(text)?,
            rating: Rating::new(rating)?,
        })
    }
}

/// 部分更新：至少需要一个字段
#[derive(Debug, Clone)]
pub struct EditComment {
    pub text: Option<CommentText>,
    pub rating: Option<Rating>,
}

impl EditComment {
    pub fn new(text: Option<String>, rating: Option<i64>) -> Result<Self, ValidationError> {
        if text.is_none() && rating.is_none() {
            return Err(ValidationError::EmptyEdit);
        }
        Ok(Self {
            text: text.map(CommentText::new).transpose()?,
            rating: rating.map(Rating::new).transpose()?,
        })
    }
}
