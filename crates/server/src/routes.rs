//! Bid card HTTP routes.
//!
//! - `POST  /bid-cards/draft`                 build an unsaved draft
//! - `POST  /bid-cards`                       create and persist a bid card
//! - `GET   /bid-cards/{id}`                  fetch a stored bid card
//! - `PATCH /bid-cards/{id}`                  apply a partial update
//! - `GET   /homeowners/{id}/bid-cards`       list a homeowner's bid cards
//! - `POST  /tools/{name}`                    dispatch an agent tool call
//!
//! Mutating routes answer with the same status envelopes the agent tools
//! return. The optional `x-session-id` header ties emitted events to a
//! conversation; `x-correlation-id` is echoed into logs.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use instabids_agent::{AgentRuntime, BidCardWorkflow};
use instabids_core::builder::BidCardRequest;
use instabids_core::domain::bid_card::{BidCard, BidCardId, HomeownerId};
use instabids_core::envelope::{CreateEnvelope, DraftEnvelope, UpdateEnvelope};
use instabids_core::errors::{ApplicationError, BidCardError, InterfaceError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

const SESSION_HEADER: &str = "x-session-id";
const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct ApiState {
    runtime: Arc<AgentRuntime>,
}

impl ApiState {
    fn workflow(&self) -> &BidCardWorkflow {
        self.runtime.workflow()
    }
}

#[derive(Debug, Deserialize)]
struct CreateBidCardBody {
    homeowner_id: HomeownerId,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(flatten)]
    request: BidCardRequest,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub correlation_id: String,
}

type ReadResult<T> = Result<Json<T>, (StatusCode, Json<ErrorBody>)>;

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new()
        .route("/bid-cards/draft", post(draft_bid_card))
        .route("/bid-cards", post(create_bid_card))
        .route("/bid-cards/{id}", get(get_bid_card).patch(update_bid_card))
        .route("/homeowners/{id}/bid-cards", get(list_homeowner_bid_cards))
        .route("/tools/{name}", post(call_tool))
        .with_state(ApiState { runtime })
}

async fn draft_bid_card(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<DraftEnvelope>) {
    let outcome = serde_json::from_value::<BidCardRequest>(body)
        .map_err(|error| BidCardError::Input(format!("Invalid request body: {error}")))
        .and_then(|request| state.workflow().generate(request));

    let status = match &outcome {
        Ok(_) => StatusCode::OK,
        Err(error) => error_status(error, &correlation_id(&headers), "draft"),
    };
    (status, Json(DraftEnvelope::from(outcome)))
}

async fn create_bid_card(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<CreateEnvelope>) {
    let outcome = match serde_json::from_value::<CreateBidCardBody>(body) {
        Ok(body) => {
            let session_id = body.session_id.or_else(|| header(&headers, SESSION_HEADER));
            state.workflow().create(&body.homeowner_id, session_id.as_deref(), body.request).await
        }
        Err(error) => Err(BidCardError::Input(format!("Invalid request body: {error}"))),
    };

    let status = match &outcome {
        Ok(_) => StatusCode::CREATED,
        Err(error) => error_status(error, &correlation_id(&headers), "create"),
    };
    (status, Json(CreateEnvelope::from(outcome)))
}

async fn update_bid_card(
    Path(id): Path<String>,
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(updates): Json<Value>,
) -> (StatusCode, Json<UpdateEnvelope>) {
    let session_id = header(&headers, SESSION_HEADER);
    let outcome = state.workflow().update(&BidCardId(id), session_id.as_deref(), updates).await;

    let status = match &outcome {
        Ok(_) => StatusCode::OK,
        Err(error) => error_status(error, &correlation_id(&headers), "update"),
    };
    (status, Json(UpdateEnvelope::from(outcome)))
}

async fn get_bid_card(
    Path(id): Path<String>,
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> ReadResult<BidCard> {
    state.workflow().fetch(&BidCardId(id)).await.map(Json).map_err(|error| {
        let correlation_id = correlation_id(&headers);
        (error_status(&error, &correlation_id, "fetch"), Json(ErrorBody {
            error: error.to_string(),
            correlation_id,
        }))
    })
}

async fn list_homeowner_bid_cards(
    Path(id): Path<String>,
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> ReadResult<Vec<BidCard>> {
    state.workflow().list_for_homeowner(&HomeownerId(id)).await.map(Json).map_err(|error| {
        let correlation_id = correlation_id(&headers);
        (error_status(&error, &correlation_id, "list"), Json(ErrorBody {
            error: error.to_string(),
            correlation_id,
        }))
    })
}

async fn call_tool(
    Path(name): Path<String>,
    State(state): State<ApiState>,
    Json(arguments): Json<Value>,
) -> Json<Value> {
    Json(state.runtime.handle_tool_call(&name, arguments).await)
}

fn error_status(error: &BidCardError, correlation_id: &str, operation: &'static str) -> StatusCode {
    let interface = ApplicationError::from(error.clone()).into_interface(correlation_id);
    let status = match interface {
        InterfaceError::BadRequest { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    warn!(
        event_name = "http.bid_card.rejected",
        operation,
        correlation_id = %interface.correlation_id(),
        status = status.as_u16(),
        error = %error,
        "bid card request failed"
    );
    status
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn correlation_id(headers: &HeaderMap) -> String {
    header(headers, CORRELATION_HEADER).unwrap_or_else(|| Uuid::new_v4().to_string())
}
