use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
    #[error("bid card validation failed: {}", .0.join(", "))]
    ValidationFailed(Vec<String>),
}

/// Failures of the bid card operations. `Display` is the caller-facing message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BidCardError {
    #[error("{0}")]
    Input(String),
    #[error("Invalid bid card data: {}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("Invalid bid card data after updates: {}", .0.join(", "))]
    UpdateValidation(Vec<String>),
    #[error(transparent)]
    Persistence(#[from] GatewayError),
    #[error("Error generating bid card: {0}")]
    Internal(String),
}

impl BidCardError {
    pub fn validation_errors(&self) -> &[String] {
        match self {
            Self::Validation(errors) | Self::UpdateValidation(errors) => errors,
            _ => &[],
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("invalid input: {0}")]
    Input(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

impl From<BidCardError> for ApplicationError {
    fn from(value: BidCardError) -> Self {
        match value {
            BidCardError::Input(message) => Self::Input(message),
            BidCardError::Validation(errors) | BidCardError::UpdateValidation(errors) => {
                Self::Domain(DomainError::ValidationFailed(errors))
            }
            BidCardError::Persistence(GatewayError::NotFound(id)) => Self::NotFound(id.0),
            BidCardError::Persistence(error @ GatewayError::MissingRequiredField(_)) => {
                Self::Domain(DomainError::InvariantViolation(error.to_string()))
            }
            BidCardError::Persistence(error) => Self::Persistence(error.to_string()),
            BidCardError::Internal(message) => Self::Internal(message),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::NotFound { .. } => "The requested bid card does not exist.",
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::Input(message) => Self::BadRequest { message, correlation_id },
            ApplicationError::NotFound(message) => Self::NotFound { message, correlation_id },
            ApplicationError::Persistence(message) | ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id }
            }
            ApplicationError::Configuration(message) | ApplicationError::Internal(message) => {
                Self::Internal { message, correlation_id }
            }
        }
    }
}
