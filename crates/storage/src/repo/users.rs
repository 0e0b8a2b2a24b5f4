use crate::Registry;

impl Registry {
    // 仅用于评论创建时快照用户名
    pub async fn find_username(&self, user_id: &str) -> anyhow::Result<Option<String>> {
        let username: Option<String> = sqlx::query_scalar("SELECT username FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(username)
    }
}
