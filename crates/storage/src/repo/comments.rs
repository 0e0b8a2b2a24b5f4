use crate::{
    models::{to_micros, SqlComment, StoredComment},
    Db,
};
use domain::Comment;
use sqlx::Row;

impl Db {
    pub async fn insert_comment(&self, c: &Comment) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (
                id, recipe_id, user_id, username,
                text, rating, likes, is_edited,
                created_at, updated_at, version
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(c.id.as_str())
        .bind(c.recipe_id.as_str())
        .bind(c.user_id.as_str())
        .bind(&c.username)
        .bind(c.text.as_str())
        .bind(c.rating.value() as i64)
        .bind(serde_json::to_string(&c.likes)?)
        .bind(c.is_edited)
        .bind(to_micros(c.created_at))
        .bind(to_micros(c.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_comment(&self, comment_id: &str) -> anyhow::Result<Option<StoredComment>> {
        let row = sqlx::query_as::<_, SqlComment>(
            r#"
            SELECT
                id, recipe_id, user_id, username,
                text, rating, likes, is_edited,
                created_at, updated_at, version
            FROM comments
            WHERE id = ?
            "#,
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(StoredComment::try_from).transpose()
    }

    /// 最新的在前；created_at 相同的评论之间没有确定顺序
    pub async fn list_comments(
        &self,
        recipe_id: &str,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<(Vec<Comment>, i64)> {
        let rows = sqlx::query_as::<_, SqlComment>(
            r#"
            SELECT
                id, recipe_id, user_id, username,
                text, rating, likes, is_edited,
                created_at, updated_at, version
            FROM comments
            WHERE recipe_id = ?
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(recipe_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE recipe_id = ?")
            .bind(recipe_id)
            .fetch_one(&self.pool)
            .await?;

        let comments = rows
            .into_iter()
            .map(|row| StoredComment::try_from(row).map(|s| s.comment))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok((comments, count))
    }

    /// `(rating, count)` over every comment of the recipe, not just one page.
    pub async fn rating_counts(&self, recipe_id: &str) -> anyhow::Result<Vec<(i64, i64)>> {
        let rows = sqlx::query(
            r#"
            SELECT rating, COUNT(*) AS count
            FROM comments
            WHERE recipe_id = ?
            GROUP BY rating
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.get::<i64, _>("rating"), r.get::<i64, _>("count")))
            .collect())
    }

    /// Writes every mutable field of `c` if the row is still at `expected_version`.
    ///
    /// Returns `false` when another writer committed first (or the row is gone);
    /// the caller re-reads and decides again.
    pub async fn replace_comment(
        &self,
        c: &Comment,
        expected_version: i64,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE comments
            SET text = ?, rating = ?, likes = ?, is_edited = ?, updated_at = ?,
                version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(c.text.as_str())
        .bind(c.rating.value() as i64)
        .bind(serde_json::to_string(&c.likes)?)
        .bind(c.is_edited)
        .bind(to_micros(c.updated_at))
        .bind(c.id.as_str())
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // 硬删除，不留墓碑
    pub async fn delete_comment(&self, comment_id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
