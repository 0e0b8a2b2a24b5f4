use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::ValidationError;

pub const MAX_COMMENT_CHARS: usize = 1000;
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new_unchecked(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(RecipeId);
string_id!(UserId);
string_id!(CommentId);

impl CommentId {
    /// 96 位随机数，编码为 24 位小写十六进制
    pub fn generate() -> Self {
        let bytes: [u8; 12] = rand::random();
        Self(hex::encode(bytes))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentText(String);

impl CommentText {
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let len = s.chars().count();
        if len == 0 || len > MAX_COMMENT_CHARS {
            return Err(ValidationError::TextLength(len));
        }
        Ok(Self(s))
    }

    pub fn new_unchecked(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value < MIN_RATING as i64 || value > MAX_RATING as i64 {
            return Err(ValidationError::RatingOutOfRange(value));
        }
        Ok(Self(value as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

/// A single user's comment on a single recipe.
///
/// `username` is a snapshot taken at creation and never re-derived from the
/// user directory. `likes` is a set, so a user can appear at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub recipe_id: RecipeId,
    pub user_id: UserId,
    pub username: String,
    #[serde(rename = "comment")]
    pub text: CommentText,
    pub rating: Rating,
    pub likes: BTreeSet<UserId>,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        recipe_id: RecipeId,
        user_id: UserId,
        username: String,
        text: CommentText,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CommentId::generate(),
            recipe_id,
            user_id,
            username,
            text,
            rating,
            likes: BTreeSet::new(),
            is_edited: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_liked_by(&self, user_id: &UserId) -> bool {
        self.likes.contains(user_id)
    }

    /// 覆盖内容并标记为已编辑。username / created_at / likes 不变。
    pub fn apply_edit(&mut self, edit: &crate::EditComment, now: DateTime<Utc>) {
        if let Some(text) = &edit.text {
            self.text = text.clone();
        }
        if let Some(rating) = edit.rating {
            self.rating = rating;
        }
        self.is_edited = true;
        self.touch(now);
    }

    /// Flips the caller's membership in `likes` and returns the new state.
    ///
    /// Likes are metadata: this never sets `is_edited` and never moves `updated_at`.
    pub fn toggle_like(&mut self, user_id: &UserId) -> bool {
        if self.likes.remove(user_id) {
            false
        } else {
            self.likes.insert(user_id.clone());
            true
        }
    }

    // 时钟精度不足时也必须严格递增
    fn touch(&mut self, now: DateTime<Utc>) {
        let floor = self.updated_at + Duration::microseconds(1);
        self.updated_at = if now > self.updated_at { now } else { floor };
    }
}
