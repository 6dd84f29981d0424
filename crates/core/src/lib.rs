//! Bid card lifecycle: the value object, its validation rules, draft building,
//! and the create/update orchestration over a persistence gateway.

pub mod builder;
pub mod config;
pub mod domain;
pub mod envelope;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod patch;
pub mod service;
pub mod validation;

pub use builder::{build_draft, check_required_inputs, BidCardRequest};
pub use domain::attributes::{AttributeValue, Attributes, Structured};
pub use domain::bid_card::{
    BidCard, BidCardId, BidCardStatus, BudgetRange, HomeownerId, Location, Timeline,
};
pub use envelope::{CreateEnvelope, DraftEnvelope, EnvelopeStatus, UpdateEnvelope};
pub use errors::{ApplicationError, BidCardError, DomainError, InterfaceError};
pub use events::{
    BidCardEvent, BidCardEventPayload, EventPublisher, InMemoryEventPublisher,
    NoopEventPublisher, PublishError,
};
pub use gateway::{BidCardGateway, GatewayError};
pub use patch::{BidCardPatch, FieldChange, PatchError};
pub use service::{BidCardService, CreatedBidCard, UpdatedBidCard};
pub use validation::{validate_bid_card, ValidationResult};
