use config::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const ENV_PREFIX: &str = "RECIPES_";
pub const DEV_JWT_SECRET: &str = "supersecretkey_change_me";

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub security: SecuritySettings,
    pub pagination: PaginationSettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
    pub request_timeout_ms: u64,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    // 评论库与菜谱库是两个独立的存储
    pub comments_url: String,
    pub registry_url: String,
}

#[derive(Deserialize, Clone)]
pub struct SecuritySettings {
    pub jwt_secret: String,
}

#[derive(Deserialize, Clone)]
pub struct PaginationSettings {
    pub max_limit: u32,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        let env_map = collect_env_vars();

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.cors_origins", "*")?
            .set_default("server.request_timeout_ms", 5000)?
            .set_default("database.comments_url", "sqlite://data/comments.db")?
            .set_default("database.registry_url", "sqlite://data/registry.db")?
            .set_default("security.jwt_secret", DEV_JWT_SECRET)?
            .set_default("pagination.max_limit", 100)?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(
                &serde_json::to_string(&env_map)
                    .expect("Environment variables should serialize to JSON"),
                config::FileFormat::Json,
            ))
            .build()?;

        s.try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.security.jwt_secret == DEV_JWT_SECRET
    }
}

fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with(ENV_PREFIX))
        .map(|(k, v)| {
            let new_key = k
                .trim_start_matches(ENV_PREFIX)
                .replace("__", ".")
                .to_lowercase();
            (new_key, v)
        })
        .collect()
}
