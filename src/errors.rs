use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::schemas::GenericResponse;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum GenericError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    ConfigurationError(String),
    #[error("{0}")]
    SerializationError(String),
    #[error("{0}")]
    GatewayError(String, anyhow::Error),
    #[error("{0}")]
    TicketingServiceError(String, anyhow::Error),
    #[error("{0}")]
    QuotaExceededError(String),
    #[error("{0}")]
    UnsupportedOperationError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for GenericError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for GenericError {
    fn status_code(&self) -> StatusCode {
        match self {
            GenericError::ValidationError(_) => StatusCode::BAD_REQUEST,
            GenericError::ConfigurationError(_) => StatusCode::BAD_REQUEST,
            GenericError::SerializationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GenericError::GatewayError(_, _) => StatusCode::BAD_GATEWAY,
            GenericError::TicketingServiceError(_, _) => StatusCode::INTERNAL_SERVER_ERROR,
            GenericError::QuotaExceededError(_) => StatusCode::CONFLICT,
            GenericError::UnsupportedOperationError(_) => StatusCode::NOT_IMPLEMENTED,
            GenericError::NotFoundError(_) => StatusCode::NOT_FOUND,
            GenericError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let status_code_str = status_code.as_str();
        let inner_error_msg = match self {
            GenericError::ValidationError(message) => message.to_string(),
            GenericError::ConfigurationError(message) => message.to_string(),
            GenericError::SerializationError(message) => message.to_string(),
            GenericError::GatewayError(message, _) => message.to_string(),
            GenericError::TicketingServiceError(message, _) => message.to_string(),
            GenericError::QuotaExceededError(message) => message.to_string(),
            GenericError::UnsupportedOperationError(message) => message.to_string(),
            GenericError::NotFoundError(message) => message.to_string(),
            GenericError::UnexpectedError(error) => error.to_string(),
        };

        HttpResponse::build(status_code).json(GenericResponse::error(
            &inner_error_msg,
            status_code_str,
            Some(()),
        ))
    }
}
