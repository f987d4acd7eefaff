use crate::{errors::GenericError, utils::error_chain_fmt};

#[derive(thiserror::Error)]
pub enum PreferenceCreateError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    ConfigurationError(String),
    #[error("{0}")]
    GatewayError(String, anyhow::Error),
    #[error("{0}")]
    TicketingServiceError(String, anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for PreferenceCreateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<PreferenceCreateError> for GenericError {
    fn from(err: PreferenceCreateError) -> GenericError {
        match err {
            PreferenceCreateError::ValidationError(message) => {
                GenericError::ValidationError(message)
            }
            PreferenceCreateError::ConfigurationError(message) => {
                GenericError::ConfigurationError(message)
            }
            PreferenceCreateError::GatewayError(message, error) => {
                GenericError::GatewayError(message, error)
            }
            PreferenceCreateError::TicketingServiceError(message, error) => {
                GenericError::TicketingServiceError(message, error)
            }
            PreferenceCreateError::UnexpectedError(error) => GenericError::UnexpectedError(error),
        }
    }
}

#[derive(thiserror::Error)]
pub enum PaymentInfoError {
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    TicketingServiceError(String, anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for PaymentInfoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<PaymentInfoError> for GenericError {
    fn from(err: PaymentInfoError) -> GenericError {
        match err {
            PaymentInfoError::NotFoundError(message) => GenericError::NotFoundError(message),
            PaymentInfoError::TicketingServiceError(message, error) => {
                GenericError::TicketingServiceError(message, error)
            }
            PaymentInfoError::UnexpectedError(error) => GenericError::UnexpectedError(error),
        }
    }
}
