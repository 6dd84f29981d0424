pub mod attributes;
pub mod bid_card;
