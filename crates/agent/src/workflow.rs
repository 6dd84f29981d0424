use std::sync::Arc;

use instabids_core::builder::BidCardRequest;
use instabids_core::domain::bid_card::{BidCard, BidCardId, HomeownerId};
use instabids_core::errors::BidCardError;
use instabids_core::events::{BidCardEvent, EventPublisher};
use instabids_core::service::{BidCardService, CreatedBidCard, UpdatedBidCard};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

/// Service calls plus lifecycle event emission.
///
/// Events go out only after the gateway accepted the write. A publisher failure
/// is logged and the committed result is still returned.
#[derive(Clone)]
pub struct BidCardWorkflow {
    service: BidCardService,
    publisher: Arc<dyn EventPublisher>,
}

impl BidCardWorkflow {
    pub fn new(service: BidCardService, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { service, publisher }
    }

    pub fn service(&self) -> &BidCardService {
        &self.service
    }

    pub fn generate(&self, request: BidCardRequest) -> Result<BidCard, BidCardError> {
        self.service.generate(request)
    }

    pub async fn create(
        &self,
        homeowner_id: &HomeownerId,
        session_id: Option<&str>,
        request: BidCardRequest,
    ) -> Result<CreatedBidCard, BidCardError> {
        let created = self.service.create(homeowner_id, request).await?;
        let event = BidCardEvent::created(session_or_new(session_id), &created.bid_card);
        self.emit(event).await;
        Ok(created)
    }

    pub async fn update(
        &self,
        id: &BidCardId,
        session_id: Option<&str>,
        updates: Value,
    ) -> Result<UpdatedBidCard, BidCardError> {
        let updated = self.service.update_json(id, updates).await?;
        let event = BidCardEvent::updated(
            session_or_new(session_id),
            &updated.bid_card,
            updated.updated_fields.clone(),
        );
        self.emit(event).await;
        Ok(updated)
    }

    pub async fn fetch(&self, id: &BidCardId) -> Result<BidCard, BidCardError> {
        self.service.fetch(id).await
    }

    pub async fn list_for_homeowner(
        &self,
        homeowner_id: &HomeownerId,
    ) -> Result<Vec<BidCard>, BidCardError> {
        self.service.list_for_homeowner(homeowner_id).await
    }

    async fn emit(&self, event: BidCardEvent) {
        match self.publisher.publish(&event).await {
            Ok(()) => info!(
                event_name = "bid_card.event.published",
                event_type = event.event_type(),
                event_id = %event.event_id,
                bid_card_id = %event.bid_card_id(),
                correlation_id = %event.session_id,
                "lifecycle event published"
            ),
            Err(error) => warn!(
                event_name = "bid_card.event.publish_failed",
                event_type = event.event_type(),
                event_id = %event.event_id,
                bid_card_id = %event.bid_card_id(),
                correlation_id = %event.session_id,
                error = %error,
                "lifecycle event was not delivered"
            ),
        }
    }
}

fn session_or_new(session_id: Option<&str>) -> String {
    session_id
        .map(str::trim)
        .filter(|session_id| !session_id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
