use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::{fs, path::Path, time::Duration};
mod models;
mod repo;

pub use models::StoredComment;

/// 评论库 (文档存储)
#[derive(Clone)]
pub struct Db {
    pub(crate) pool: Pool<Sqlite>,
}

impl Db {
    pub async fn new(db_url: &str) -> anyhow::Result<Self> {
        let pool = connect(db_url).await?;
        sqlx::migrate!("../../migrations/comments").run(&pool).await?;
        tracing::info!("Comment store ready: {}", db_url);
        Ok(Self { pool })
    }
}

/// 外部菜谱/用户库的只读视图，独立连接池，不与评论库共享事务
#[derive(Clone)]
pub struct Registry {
    pub(crate) pool: Pool<Sqlite>,
}

impl Registry {
    pub async fn new(db_url: &str) -> anyhow::Result<Self> {
        let pool = connect(db_url).await?;
        sqlx::migrate!("../../migrations/registry").run(&pool).await?;
        tracing::info!("Recipe registry ready: {}", db_url);
        Ok(Self { pool })
    }
}

/// True when the failure means the store could not be reached in time, as
/// opposed to a query that ran and failed.
pub fn is_unavailable(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<sqlx::Error>(),
        Some(
            sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::Io(_)
                | sqlx::Error::WorkerCrashed
        )
    )
}

async fn connect(db_url: &str) -> anyhow::Result<Pool<Sqlite>> {
    let in_memory = db_url.contains(":memory:");
    if db_url.starts_with("sqlite://") && !in_memory {
        let path_str = db_url.trim_start_matches("sqlite://");
        let path = Path::new(path_str);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
    }
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        Sqlite::create_database(db_url).await?;
    }

    let options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(5));
    // 内存库每个连接都是独立数据库，只能用一个且不能回收
    let options = if in_memory {
        options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        options
    };
    let pool = options.connect(db_url).await?;

    sqlx::query("PRAGMA journal_mode = WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}
