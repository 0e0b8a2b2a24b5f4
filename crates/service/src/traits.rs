use anyhow::Result;
use async_trait::async_trait;
use domain::{RecipeId, UserId};
use storage::Registry;

/// 外部菜谱库：只做存在性检查
#[async_trait]
pub trait RecipeRegistry: Send + Sync {
    async fn recipe_exists(&self, recipe_id: &RecipeId) -> Result<bool>;
}

/// 外部用户目录：解析用户名用于快照
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn resolve_username(&self, user_id: &UserId) -> Result<Option<String>>;
}

#[async_trait]
impl RecipeRegistry for Registry {
    async fn recipe_exists(&self, recipe_id: &RecipeId) -> Result<bool> {
        Registry::recipe_exists(self, recipe_id.as_str()).await
    }
}

#[async_trait]
impl UserDirectory for Registry {
    async fn resolve_username(&self, user_id: &UserId) -> Result<Option<String>> {
        self.find_username(user_id.as_str()).await
    }
}
