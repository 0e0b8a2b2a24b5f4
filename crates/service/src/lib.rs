mod error;
mod guard;
mod traits;

#[cfg(test)]
mod tests;

pub use error::{Action, CommentError};
pub use traits::{RecipeRegistry, UserDirectory};

use chrono::{DateTime, SubsecRound, Utc};
use domain::{
    Comment, CommentId, CreateComment, EditComment, PageRequest, Pagination, RatingSummary,
    RecipeId, UserId,
};
use std::{future::Future, sync::Arc, time::Duration};
use storage::{Db, StoredComment};
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct CommentPage {
    pub comments: Vec<Comment>,
    pub pagination: Pagination,
    pub aggregate_rating: Option<RatingSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    pub is_liked: bool,
    pub like_count: usize,
}

/// Comment store, rating aggregation and the ownership guard behind one API.
///
/// The recipe existence check and the comment write run against different
/// stores with no shared transaction: a recipe deleted between the two still
/// ends up with the new comment. Creating is not idempotent; a retried request
/// creates a second comment.
#[derive(Clone)]
pub struct CommentService {
    db: Db,
    recipes: Arc<dyn RecipeRegistry>,
    users: Arc<dyn UserDirectory>,
    timeout: Duration,
}

impl CommentService {
    pub fn new(
        db: Db,
        recipes: Arc<dyn RecipeRegistry>,
        users: Arc<dyn UserDirectory>,
        timeout: Duration,
    ) -> Self {
        Self {
            db,
            recipes,
            users,
            timeout,
        }
    }

    pub async fn create(
        &self,
        recipe_id: &RecipeId,
        user_id: &UserId,
        cmd: CreateComment,
    ) -> Result<Comment, CommentError> {
        self.ensure_recipe(recipe_id).await?;

        // 用户名只在创建时快照一次
        let username = self
            .call(self.users.resolve_username(user_id))
            .await?
            .ok_or(CommentError::UserNotFound)?;

        let comment = Comment::new(
            recipe_id.clone(),
            user_id.clone(),
            username,
            cmd.text,
            cmd.rating,
            now(),
        );
        self.call(self.db.insert_comment(&comment)).await?;

        info!(
            "Comment {} created on recipe {} by {}",
            comment.id, recipe_id, user_id
        );
        Ok(comment)
    }

    /// One page of comments, newest first, plus statistics over the whole recipe.
    ///
    /// The three reads are independent, so under concurrent writes the page,
    /// the total and the aggregate may reflect slightly different snapshots.
    pub async fn list(
        &self,
        recipe_id: &RecipeId,
        page: PageRequest,
    ) -> Result<CommentPage, CommentError> {
        self.ensure_recipe(recipe_id).await?;

        let (comments, total) = self
            .call(
                self.db
                    .list_comments(recipe_id.as_str(), page.limit(), page.offset()),
            )
            .await?;
        let buckets = self.call(self.db.rating_counts(recipe_id.as_str())).await?;

        Ok(CommentPage {
            comments,
            pagination: Pagination::new(page, total.max(0) as u64),
            aggregate_rating: RatingSummary::from_counts(buckets),
        })
    }

    /// Flips the caller's like. Any authenticated user may like any comment.
    ///
    /// `is_liked` is the state this call committed; a concurrent toggle by the
    /// same user may already have flipped it back.
    pub async fn toggle_like(
        &self,
        comment_id: &CommentId,
        user_id: &UserId,
    ) -> Result<LikeOutcome, CommentError> {
        let (comment, is_liked) = self
            .mutate(comment_id, |c| Ok(c.toggle_like(user_id)))
            .await?;

        debug!(
            "Comment {} {} by {}",
            comment_id,
            if is_liked { "liked" } else { "unliked" },
            user_id
        );
        Ok(LikeOutcome {
            is_liked,
            like_count: comment.like_count(),
        })
    }

    pub async fn update(
        &self,
        comment_id: &CommentId,
        user_id: &UserId,
        edit: EditComment,
    ) -> Result<Comment, CommentError> {
        let (comment, ()) = self
            .mutate(comment_id, |c| {
                guard::ensure_owner(c, user_id, Action::Edit)?;
                c.apply_edit(&edit, now());
                Ok(())
            })
            .await?;

        info!("Comment {} edited by {}", comment_id, user_id);
        Ok(comment)
    }

    pub async fn delete(
        &self,
        comment_id: &CommentId,
        user_id: &UserId,
    ) -> Result<(), CommentError> {
        let StoredComment { comment, .. } = self.load(comment_id).await?;
        guard::ensure_owner(&comment, user_id, Action::Delete)?;

        // 并发删除时另一方已经删掉了
        if !self.call(self.db.delete_comment(comment_id.as_str())).await? {
            return Err(CommentError::CommentNotFound);
        }

        info!("Comment {} deleted by {}", comment_id, user_id);
        Ok(())
    }

    /// Read-modify-write on a single comment document.
    ///
    /// `apply` runs against a fresh read on every attempt and its result is
    /// returned only for the attempt whose write committed. A lost race means
    /// another writer committed, so the loop always makes progress; it only
    /// gives up once the request deadline has passed.
    async fn mutate<T, F>(
        &self,
        comment_id: &CommentId,
        mut apply: F,
    ) -> Result<(Comment, T), CommentError>
    where
        F: FnMut(&mut Comment) -> Result<T, CommentError>,
    {
        let deadline = Instant::now() + self.timeout;
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let StoredComment {
                mut comment,
                version,
            } = self.load(comment_id).await?;
            let out = apply(&mut comment)?;

            if self.call(self.db.replace_comment(&comment, version)).await? {
                return Ok((comment, out));
            }
            if Instant::now() >= deadline {
                warn!(
                    "Giving up on comment {} after {} conflicting writes",
                    comment_id, attempt
                );
                return Err(CommentError::Unavailable(format!(
                    "comment {} is under heavy concurrent modification",
                    comment_id
                )));
            }
            debug!("Write conflict on comment {} (attempt {})", comment_id, attempt);
            // 让出执行权，给已提交的一方收尾
            tokio::task::yield_now().await;
        }
    }

    async fn load(&self, comment_id: &CommentId) -> Result<StoredComment, CommentError> {
        self.call(self.db.get_comment(comment_id.as_str()))
            .await?
            .ok_or(CommentError::CommentNotFound)
    }

    async fn ensure_recipe(&self, recipe_id: &RecipeId) -> Result<(), CommentError> {
        if self.call(self.recipes.recipe_exists(recipe_id)).await? {
            Ok(())
        } else {
            Err(CommentError::RecipeNotFound)
        }
    }

    async fn call<T>(
        &self,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, CommentError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res.map_err(CommentError::from_store),
            Err(_) => {
                warn!("Store call exceeded {:?}", self.timeout);
                Err(CommentError::Unavailable(format!(
                    "store did not answer within {:?}",
                    self.timeout
                )))
            }
        }
    }
}

// 与存储精度 (微秒) 对齐，否则回读的时间戳与返回值不一致
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
