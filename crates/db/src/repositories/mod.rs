use instabids_core::gateway::GatewayError;
use thiserror::Error;

pub mod bid_card;
pub mod codec;
pub mod memory;

pub use bid_card::SqlBidCardRepository;
pub use memory::InMemoryBidCardRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("encode error: {0}")]
    Encode(String),
}

impl From<RepositoryError> for GatewayError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Database(error) => Self::Database(error.to_string()),
            RepositoryError::Decode(message) => Self::Decode(message),
            RepositoryError::Encode(message) => Self::Database(message),
        }
    }
}
