use std::time::Duration;

use instabids_core::config::DatabaseConfig;
use sqlx::sqlite::SqlitePoolOptions;

pub type DbPool = sqlx::SqlitePool;

pub async fn connect_from_config(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&config.url, config.max_connections, config.timeout_secs).await
}

pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
}

pub async fn ping(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use instabids_core::config::DatabaseConfig;
    use sqlx::Row;

    use super::{connect_from_config, connect_with_settings, ping};

    #[tokio::test]
    async fn pool_from_config_answers_queries() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            timeout_secs: 5,
        };

        let pool = connect_from_config(&config).await.expect("connect");
        let value: i64 =
            sqlx::query("SELECT 1 AS one").fetch_one(&pool).await.expect("select").get("one");

        assert_eq!(value, 1);
        pool.close().await;
    }

    #[tokio::test]
    async fn ping_fails_once_pool_is_closed() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
        ping(&pool).await.expect("open pool answers");

        pool.close().await;
        assert!(ping(&pool).await.is_err());
    }
}
