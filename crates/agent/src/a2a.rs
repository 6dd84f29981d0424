//! Agent-to-agent delivery of bid card lifecycle events.
//!
//! Each event is sent to the peer agent as a JSON-RPC 2.0 `tasks/send` call whose
//! message carries the event as a single data part.

use std::time::Duration;

use async_trait::async_trait;
use instabids_core::config::A2aConfig;
use instabids_core::events::{BidCardEvent, EventPublisher, PublishError};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

pub const TASKS_SEND: &str = "tasks/send";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: String,
    pub method: String,
    pub params: TaskSendParams,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskSendParams {
    pub id: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub message: A2aMessage,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct A2aMessage {
    pub role: String,
    pub parts: Vec<MessagePart>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    Text { text: String },
    Data { data: Value },
}

#[derive(Clone, Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

pub struct A2aEventPublisher {
    http: reqwest::Client,
    agent_url: String,
    auth_token: Option<SecretString>,
}

impl A2aEventPublisher {
    pub fn new(
        agent_url: impl Into<String>,
        auth_token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, PublishError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| PublishError::Transport(error.to_string()))?;
        let agent_url = agent_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, agent_url, auth_token })
    }

    /// `None` when publishing is disabled or no peer is configured.
    pub fn from_config(config: &A2aConfig) -> Result<Option<Self>, PublishError> {
        match (config.enabled, config.agent_url.as_deref()) {
            (true, Some(agent_url)) => Self::new(
                agent_url,
                config.auth_token.clone(),
                Duration::from_secs(config.timeout_secs),
            )
            .map(Some),
            _ => Ok(None),
        }
    }

    pub fn agent_url(&self) -> &str {
        &self.agent_url
    }

    pub fn task_request(&self, event: &BidCardEvent) -> Result<JsonRpcRequest, PublishError> {
        let data =
            serde_json::to_value(event).map_err(|error| PublishError::Encoding(error.to_string()))?;

        Ok(JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Uuid::new_v4().to_string(),
            method: TASKS_SEND.to_string(),
            params: TaskSendParams {
                id: event.event_id.clone(),
                session_id: event.session_id.clone(),
                message: A2aMessage {
                    role: "agent".to_string(),
                    parts: vec![
                        MessagePart::Text { text: event.event_type().to_string() },
                        MessagePart::Data { data },
                    ],
                },
            },
        })
    }
}

#[async_trait]
impl EventPublisher for A2aEventPublisher {
    async fn publish(&self, event: &BidCardEvent) -> Result<(), PublishError> {
        let request = self.task_request(event)?;

        let mut call = self.http.post(&self.agent_url).json(&request);
        if let Some(token) = &self.auth_token {
            call = call.bearer_auth(token.expose_secret());
        }

        let response =
            call.send().await.map_err(|error| PublishError::Transport(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Rejected(format!("HTTP {status}")));
        }

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|error| PublishError::Transport(format!("unreadable response: {error}")))?;
        if let Some(error) = body.error {
            return Err(PublishError::Rejected(format!("{} ({})", error.message, error.code)));
        }

        debug!(
            event_name = "a2a.task.sent",
            method = TASKS_SEND,
            task_id = %request.params.id,
            agent_url = %self.agent_url,
            "event delivered to peer agent"
        );
        Ok(())
    }
}
