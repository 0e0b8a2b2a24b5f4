use anyhow::Context;
use chrono::{DateTime, Utc};
use domain::{Comment, CommentId, CommentText, Rating, RecipeId, UserId};
use sqlx::FromRow;
use std::collections::BTreeSet;

#[derive(FromRow)]
pub struct SqlComment {
    pub id: String,
    pub recipe_id: String,
    pub user_id: String,
    pub username: String,
    pub text: String,
    pub rating: i64,
    pub likes: String, // JSON 数组
    pub is_edited: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub version: i64,
}

/// A comment document together with the store revision it was read at.
#[derive(Debug, Clone)]
pub struct StoredComment {
    pub comment: Comment,
    pub version: i64,
}

impl TryFrom<SqlComment> for StoredComment {
    type Error = anyhow::Error;

    fn try_from(sql: SqlComment) -> anyhow::Result<Self> {
        let likes: BTreeSet<UserId> = serde_json::from_str(&sql.likes)
            .with_context(|| format!("Corrupt likes column on comment {}", sql.id))?;
        let rating = Rating::new(sql.rating)
            .with_context(|| format!("Corrupt rating on comment {}", sql.id))?;

        Ok(StoredComment {
            comment: Comment {
                id: CommentId::new_unchecked(sql.id),
                recipe_id: RecipeId::new_unchecked(sql.recipe_id),
                user_id: UserId::new_unchecked(sql.user_id),
                username: sql.username,
                text: CommentText::new_unchecked(sql.text),
                rating,
                likes,
                is_edited: sql.is_edited,
                created_at: from_micros(sql.created_at),
                updated_at: from_micros(sql.updated_at),
            },
            version: sql.version,
        })
    }
}

pub(crate) fn to_micros(t: DateTime<Utc>) -> i64 {
    t.timestamp_micros()
}

pub(crate) fn from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}
