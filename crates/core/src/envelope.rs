//! Status-discriminated result envelopes returned across the tool and HTTP
//! boundaries. Every operation outcome, success or failure, fits one of these.

use serde::{Deserialize, Serialize};

use crate::domain::bid_card::{BidCard, BidCardId};
use crate::errors::BidCardError;
use crate::service::{CreatedBidCard, UpdatedBidCard};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DraftEnvelope {
    pub status: EnvelopeStatus,
    pub bid_card: Option<BidCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Result<BidCard, BidCardError>> for DraftEnvelope {
    fn from(value: Result<BidCard, BidCardError>) -> Self {
        match value {
            Ok(bid_card) => Self {
                status: EnvelopeStatus::Success,
                bid_card: Some(bid_card),
                error_message: None,
                message: Some("Bid card generated successfully".to_string()),
            },
            Err(error) => Self {
                status: EnvelopeStatus::Error,
                bid_card: None,
                error_message: Some(error.to_string()),
                message: None,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateEnvelope {
    pub status: EnvelopeStatus,
    pub bid_card_id: Option<BidCardId>,
    pub bid_card: Option<BidCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Result<CreatedBidCard, BidCardError>> for CreateEnvelope {
    fn from(value: Result<CreatedBidCard, BidCardError>) -> Self {
        match value {
            Ok(created) => Self {
                status: EnvelopeStatus::Success,
                bid_card_id: Some(created.bid_card_id),
                bid_card: Some(created.bid_card),
                error: None,
                message: Some("Bid card created successfully".to_string()),
            },
            Err(error) => Self {
                status: EnvelopeStatus::Error,
                bid_card_id: None,
                bid_card: None,
                error: Some(error.to_string()),
                message: None,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateEnvelope {
    pub status: EnvelopeStatus,
    pub bid_card: Option<BidCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Result<UpdatedBidCard, BidCardError>> for UpdateEnvelope {
    fn from(value: Result<UpdatedBidCard, BidCardError>) -> Self {
        match value {
            Ok(updated) => Self {
                status: EnvelopeStatus::Success,
                bid_card: Some(updated.bid_card),
                error: None,
                message: Some("Bid card updated successfully".to_string()),
            },
            Err(error) => Self {
                status: EnvelopeStatus::Error,
                bid_card: None,
                error: Some(error.to_string()),
                message: None,
            },
        }
    }
}
