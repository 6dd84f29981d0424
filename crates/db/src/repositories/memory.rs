use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use instabids_core::domain::bid_card::{BidCard, BidCardId, HomeownerId};
use instabids_core::gateway::{missing_required_field, BidCardGateway, GatewayError};

/// Process-local gateway with the same write rules as the SQL repository.
#[derive(Default)]
pub struct InMemoryBidCardRepository {
    bid_cards: RwLock<HashMap<String, BidCard>>,
}

impl InMemoryBidCardRepository {
    pub async fn len(&self) -> usize {
        self.bid_cards.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bid_cards.read().await.is_empty()
    }
}

#[async_trait]
impl BidCardGateway for InMemoryBidCardRepository {
    async fn save(
        &self,
        homeowner_id: &HomeownerId,
        record: &BidCard,
    ) -> Result<BidCardId, GatewayError> {
        if let Some(field) = missing_required_field(record) {
            return Err(GatewayError::MissingRequiredField(field));
        }

        let mut stored = record.clone();
        stored.homeowner_id = Some(homeowner_id.clone());
        stored.project_name = Some(record.display_name());

        let mut bid_cards = self.bid_cards.write().await;
        bid_cards.insert(record.id.0.clone(), stored);
        Ok(record.id.clone())
    }

    async fn fetch(&self, id: &BidCardId) -> Result<BidCard, GatewayError> {
        let bid_cards = self.bid_cards.read().await;
        bid_cards.get(&id.0).cloned().ok_or_else(|| GatewayError::NotFound(id.clone()))
    }

    async fn list_for_homeowner(
        &self,
        homeowner_id: &HomeownerId,
    ) -> Result<Vec<BidCard>, GatewayError> {
        let bid_cards = self.bid_cards.read().await;
        let mut owned: Vec<BidCard> = bid_cards
            .values()
            .filter(|card| card.homeowner_id.as_ref() == Some(homeowner_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.0.cmp(&b.id.0)));
        Ok(owned)
    }
}
