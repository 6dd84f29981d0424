use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::bid_card::{BidCard, BidCardId, HomeownerId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum BidCardEventPayload {
    BidCardCreated {
        bid_card_id: BidCardId,
        homeowner_id: HomeownerId,
        project_type: String,
        bid_card_data: BidCard,
    },
    BidCardUpdated {
        bid_card_id: BidCardId,
        updated_fields: Vec<String>,
        bid_card_data: BidCard,
    },
}

/// Lifecycle notification handed to other agents after a committed write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BidCardEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(flatten)]
    pub payload: BidCardEventPayload,
}

impl BidCardEvent {
    fn new(session_id: impl Into<String>, payload: BidCardEventPayload) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            session_id: session_id.into(),
            metadata: BTreeMap::new(),
            payload,
        }
    }

    pub fn created(session_id: impl Into<String>, bid_card: &BidCard) -> Self {
        Self::new(
            session_id,
            BidCardEventPayload::BidCardCreated {
                bid_card_id: bid_card.id.clone(),
                homeowner_id: bid_card
                    .homeowner_id
                    .clone()
                    .unwrap_or_else(|| HomeownerId(String::new())),
                project_type: bid_card.project_type.clone().unwrap_or_default(),
                bid_card_data: bid_card.clone(),
            },
        )
    }

    pub fn updated(
        session_id: impl Into<String>,
        bid_card: &BidCard,
        updated_fields: Vec<String>,
    ) -> Self {
        Self::new(
            session_id,
            BidCardEventPayload::BidCardUpdated {
                bid_card_id: bid_card.id.clone(),
                updated_fields,
                bid_card_data: bid_card.clone(),
            },
        )
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn event_type(&self) -> &'static str {
        match self.payload {
            BidCardEventPayload::BidCardCreated { .. } => "bid_card_created",
            BidCardEventPayload::BidCardUpdated { .. } => "bid_card_updated",
        }
    }

    pub fn bid_card_id(&self) -> &BidCardId {
        match &self.payload {
            BidCardEventPayload::BidCardCreated { bid_card_id, .. }
            | BidCardEventPayload::BidCardUpdated { bid_card_id, .. } => bid_card_id,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("event transport failed: {0}")]
    Transport(String),
    #[error("event rejected by peer: {0}")]
    Rejected(String),
    #[error("event could not be encoded: {0}")]
    Encoding(String),
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &BidCardEvent) -> Result<(), PublishError>;
}

#[derive(Clone, Default)]
pub struct InMemoryEventPublisher {
    events: Arc<Mutex<Vec<BidCardEvent>>>,
}

impl InMemoryEventPublisher {
    pub fn events(&self) -> Vec<BidCardEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: &BidCardEvent) -> Result<(), PublishError> {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
        Ok(())
    }
}

/// Publisher used when no peer transport is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(&self, _event: &BidCardEvent) -> Result<(), PublishError> {
        Ok(())
    }
}
