use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::builder::{assemble, build_draft, check_required_inputs, BidCardRequest};
use crate::domain::bid_card::{BidCard, BidCardId, HomeownerId};
use crate::errors::BidCardError;
use crate::gateway::{BidCardGateway, GatewayError};
use crate::patch::BidCardPatch;
use crate::validation::{validate_bid_card, ValidationResult};

#[derive(Clone, Debug, PartialEq)]
pub struct CreatedBidCard {
    pub bid_card_id: BidCardId,
    pub bid_card: BidCard,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdatedBidCard {
    pub bid_card: BidCard,
    pub updated_fields: Vec<String>,
}

/// Create/update orchestration for bid cards.
///
/// Nothing reaches the gateway without passing [`validate_bid_card`]. The
/// service holds no locks: validate-then-save and fetch-merge-validate-save are
/// not atomic, and concurrent updates of one card are last writer wins.
#[derive(Clone)]
pub struct BidCardService {
    gateway: Arc<dyn BidCardGateway>,
}

impl BidCardService {
    pub fn new(gateway: Arc<dyn BidCardGateway>) -> Self {
        Self { gateway }
    }

    pub fn validate(&self, candidate: &BidCard) -> ValidationResult {
        validate_bid_card(candidate)
    }

    pub fn generate(&self, request: BidCardRequest) -> Result<BidCard, BidCardError> {
        build_draft(request)
    }

    pub async fn create(
        &self,
        homeowner_id: &HomeownerId,
        request: BidCardRequest,
    ) -> Result<CreatedBidCard, BidCardError> {
        if homeowner_id.0.trim().is_empty() {
            return Err(BidCardError::Input("Homeowner ID is required".to_string()));
        }
        check_required_inputs(&request)?;

        let mut candidate = assemble(request);
        candidate.homeowner_id = Some(homeowner_id.clone());
        candidate.project_name = Some(candidate.display_name());

        let validation = validate_bid_card(&candidate);
        if !validation.valid {
            warn!(
                event_name = "bid_card.create.rejected",
                homeowner_id = %homeowner_id,
                error_count = validation.errors.len(),
                "bid card candidate failed validation"
            );
            return Err(BidCardError::Validation(validation.errors));
        }

        let bid_card_id = self.gateway.save(homeowner_id, &candidate).await.map_err(|error| {
            warn!(
                event_name = "bid_card.create.persist_failed",
                homeowner_id = %homeowner_id,
                bid_card_id = %candidate.id,
                error = %error,
                "bid card save failed"
            );
            BidCardError::from(error)
        })?;

        info!(
            event_name = "bid_card.create.persisted",
            homeowner_id = %homeowner_id,
            bid_card_id = %bid_card_id,
            "bid card created"
        );
        Ok(CreatedBidCard { bid_card_id, bid_card: candidate })
    }

    /// Parses a JSON update object, then runs [`Self::update`].
    pub async fn update_json(
        &self,
        id: &BidCardId,
        updates: Value,
    ) -> Result<UpdatedBidCard, BidCardError> {
        let patch = BidCardPatch::from_value(updates)?;
        self.update(id, patch).await
    }

    pub async fn update(
        &self,
        id: &BidCardId,
        patch: BidCardPatch,
    ) -> Result<UpdatedBidCard, BidCardError> {
        let mut bid_card = self.gateway.fetch(id).await.map_err(|error| {
            warn!(
                event_name = "bid_card.update.fetch_failed",
                bid_card_id = %id,
                error = %error,
                "bid card fetch failed"
            );
            BidCardError::from(error)
        })?;

        let updated_fields = patch.field_names();
        patch.apply_to(&mut bid_card);
        bid_card.touch();

        let validation = validate_bid_card(&bid_card);
        if !validation.valid {
            warn!(
                event_name = "bid_card.update.rejected",
                bid_card_id = %id,
                error_count = validation.errors.len(),
                "merged bid card failed validation"
            );
            return Err(BidCardError::UpdateValidation(validation.errors));
        }

        let homeowner_id = bid_card.homeowner_id.clone().ok_or_else(|| {
            GatewayError::Decode(format!("bid card {id} has no homeowner reference"))
        })?;

        self.gateway.save(&homeowner_id, &bid_card).await.map_err(|error| {
            warn!(
                event_name = "bid_card.update.persist_failed",
                bid_card_id = %id,
                error = %error,
                "bid card save failed"
            );
            BidCardError::from(error)
        })?;

        info!(
            event_name = "bid_card.update.persisted",
            bid_card_id = %id,
            homeowner_id = %homeowner_id,
            updated_fields = ?updated_fields,
            "bid card updated"
        );
        Ok(UpdatedBidCard { bid_card, updated_fields })
    }

    pub async fn fetch(&self, id: &BidCardId) -> Result<BidCard, BidCardError> {
        Ok(self.gateway.fetch(id).await?)
    }

    pub async fn list_for_homeowner(
        &self,
        homeowner_id: &HomeownerId,
    ) -> Result<Vec<BidCard>, BidCardError> {
        Ok(self.gateway.list_for_homeowner(homeowner_id).await?)
    }
}
