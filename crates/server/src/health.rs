use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use instabids_db::DbPool;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    publisher: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub event_publisher: &'static str,
    pub checked_at: String,
}

/// `publisher` names the event sink in use (`a2a` or `noop`).
pub fn router(db_pool: DbPool, publisher: &'static str) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool, publisher })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "instabids-server runtime initialized".to_string(),
        },
        database,
        event_publisher: state.publisher,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bid_cards").fetch_one(pool).await {
        Ok(count) => HealthCheck {
            status: "ready",
            detail: format!("bid_cards table reachable ({count} rows)"),
        },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}
