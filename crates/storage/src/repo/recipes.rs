use crate::Registry;

impl Registry {
    pub async fn recipe_exists(&self, recipe_id: &str) -> anyhow::Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM recipes WHERE id = ?")
            .bind(recipe_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }
}
