use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use instabids_agent::{A2aEventPublisher, AgentRuntime, BidCardWorkflow};
use instabids_core::config::{AppConfig, ConfigError};
use instabids_core::events::{EventPublisher, NoopEventPublisher, PublishError};
use instabids_core::service::BidCardService;
use instabids_db::{connect_from_config, migrations, DbPool, SqlBidCardRepository};
use thiserror::Error;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tracing::info;

use crate::{health, routes};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub agent_runtime: Arc<AgentRuntime>,
    pub publisher_kind: &'static str,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("event publisher setup failed: {0}")]
    Publisher(#[source] PublishError),
}

impl Application {
    /// Health, bid card and tool routes, with CORS for the configured origins.
    pub fn router(&self) -> Router {
        let app = health::router(self.db_pool.clone(), self.publisher_kind)
            .merge(routes::router(self.agent_runtime.clone()));

        let origins: Vec<HeaderValue> = self
            .config
            .server
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        if origins.is_empty() {
            return app;
        }

        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::GET, Method::POST, Method::PATCH])
                .allow_headers(AllowHeaders::any()),
        )
    }
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_from_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        max_connections = config.database.max_connections,
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let (publisher, publisher_kind): (Arc<dyn EventPublisher>, &'static str) =
        match A2aEventPublisher::from_config(&config.a2a).map_err(BootstrapError::Publisher)? {
            Some(publisher) => {
                info!(
                    event_name = "system.bootstrap.a2a_enabled",
                    correlation_id = "bootstrap",
                    agent_url = %publisher.agent_url(),
                    "lifecycle events will be sent to peer agent"
                );
                (Arc::new(publisher), "a2a")
            }
            None => (Arc::new(NoopEventPublisher), "noop"),
        };

    let service = BidCardService::new(Arc::new(SqlBidCardRepository::new(db_pool.clone())));
    let workflow = BidCardWorkflow::new(service, publisher);

    Ok(Application {
        config,
        db_pool,
        agent_runtime: Arc::new(AgentRuntime::new(workflow)),
        publisher_kind,
    })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use instabids_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?).await
    }

    fn overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_rejects_enabled_a2a_without_agent_url() {
        let mut options = overrides("sqlite::memory:");
        options.overrides.a2a_enabled = Some(true);

        let message = bootstrap(options).await.err().expect("bootstrap should fail").to_string();

        assert!(message.contains("a2a.agent_url"), "unexpected error: {message}");
    }

    #[tokio::test]
    async fn bootstrap_rejects_non_sqlite_database() {
        let result = bootstrap(overrides("postgres://localhost/instabids")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn bootstrapped_app_serves_health_and_persists_bid_cards() {
        let app = bootstrap(overrides("sqlite::memory:")).await.expect("bootstrap succeeds");
        assert_eq!(app.publisher_kind, "noop");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'bid_cards'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("schema query");
        assert_eq!(table_count, 1);

        let router = app.router();
        let response = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("health responds");
        assert_eq!(response.status(), StatusCode::OK);

        let created = app
            .agent_runtime
            .handle_tool_call(
                "save_bid_card",
                json!({
                    "homeowner_id": "h-boot",
                    "project_type": "window replacement",
                    "project_scope": "six double-hung windows",
                    "timeline": {"start_date": "2025-10-01"},
                    "location": {"city": "Madison", "state": "WI"}
                }),
            )
            .await;
        assert_eq!(created["status"], json!("success"));

        let response = router
            .oneshot(
                Request::get("/homeowners/h-boot/bid-cards").body(Body::empty()).expect("request"),
            )
            .await
            .expect("list responds");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let listed: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(listed[0]["project_type"], json!("window replacement"));

        app.db_pool.close().await;
    }
}
