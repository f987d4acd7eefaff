use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::schemas::GenericResponse;
use crate::ticketing_client::TicketingError;
use crate::utils::error_chain_fmt;

/// Webhook failures answer with a server error so the gateway's own retry
/// mechanism redelivers the notification.
#[derive(thiserror::Error)]
pub enum WebhookError {
    #[error("{0}")]
    GatewayLookupError(String, anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for WebhookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<TicketingError> for WebhookError {
    fn from(err: TicketingError) -> WebhookError {
        WebhookError::UnexpectedError(anyhow::Error::new(err))
    }
}

impl ResponseError for WebhookError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let inner_error_msg = match self {
            WebhookError::GatewayLookupError(message, _) => message.to_string(),
            WebhookError::UnexpectedError(error) => error.to_string(),
        };
        HttpResponse::build(status_code).json(GenericResponse::error(
            &inner_error_msg,
            status_code.as_str(),
            Some(()),
        ))
    }
}
