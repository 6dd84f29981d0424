use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::bid_card::{BidCard, BidCardId, HomeownerId};

/// Storage-side required fields, checked again by gateways before every write.
pub const REQUIRED_FIELDS: [&str; 4] = ["project_type", "project_scope", "timeline", "location"];

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),
    #[error("Bid card not found: {0}")]
    NotFound(BidCardId),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Error decoding bid card: {0}")]
    Decode(String),
}

/// Persistence boundary for bid cards.
///
/// Implementations own all concurrency control. Concurrent saves of the same id
/// resolve as last writer wins.
#[async_trait]
pub trait BidCardGateway: Send + Sync {
    /// Stores `record` for `homeowner_id`, overwriting any record with the same id.
    async fn save(
        &self,
        homeowner_id: &HomeownerId,
        record: &BidCard,
    ) -> Result<BidCardId, GatewayError>;

    async fn fetch(&self, id: &BidCardId) -> Result<BidCard, GatewayError>;

    async fn list_for_homeowner(
        &self,
        homeowner_id: &HomeownerId,
    ) -> Result<Vec<BidCard>, GatewayError>;
}

#[async_trait]
impl<T> BidCardGateway for Arc<T>
where
    T: BidCardGateway + ?Sized,
{
    async fn save(
        &self,
        homeowner_id: &HomeownerId,
        record: &BidCard,
    ) -> Result<BidCardId, GatewayError> {
        (**self).save(homeowner_id, record).await
    }

    async fn fetch(&self, id: &BidCardId) -> Result<BidCard, GatewayError> {
        (**self).fetch(id).await
    }

    async fn list_for_homeowner(
        &self,
        homeowner_id: &HomeownerId,
    ) -> Result<Vec<BidCard>, GatewayError> {
        (**self).list_for_homeowner(homeowner_id).await
    }
}

/// First required field absent from `record`, in storage check order.
pub fn missing_required_field(record: &BidCard) -> Option<&'static str> {
    let present = [
        record.project_type.is_some(),
        record.project_scope.is_some(),
        record.timeline.is_some(),
        record.location.is_some(),
    ];
    REQUIRED_FIELDS.iter().zip(present).find(|(_, present)| !present).map(|(field, _)| *field)
}

#[cfg(test)]
mod tests {
    use super::missing_required_field;
    use crate::domain::attributes::Structured;
    use crate::domain::bid_card::{BidCard, Location};

    #[test]
    fn reports_first_missing_field_in_check_order() {
        let mut card = BidCard::blank();
        assert_eq!(missing_required_field(&card), Some("project_type"));

        card.project_type = Some("roofing".to_string());
        card.project_scope = Some("replace shingles".to_string());
        card.location = Some(Structured::Mapping(Location::new("Denver", "CO")));
        assert_eq!(missing_required_field(&card), Some("timeline"));
    }
}
