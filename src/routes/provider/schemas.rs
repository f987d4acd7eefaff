use crate::errors::GenericError;
use crate::schemas::CurrencyType;
use actix_http::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Capability surface the host's provider registry looks up by identifier.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetaData {
    pub identifier: String,
    pub display_name: String,
    pub refund_supported: bool,
    pub partial_refund_supported: bool,
    pub abort_pending_allowed: bool,
    pub test_mode_message: Option<String>,
    pub currency_warnings: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProviderMetaQuery {
    pub event: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRequest {
    pub currency: CurrencyType,
}

impl FromRequest for EligibilityRequest {
    type Error = GenericError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = web::Json::<Self>::from_request(req, payload);

        Box::pin(async move {
            match fut.await {
                Ok(json) => Ok(json.into_inner()),
                Err(e) => Err(GenericError::ValidationError(e.to_string())),
            }
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EligibilityData {
    pub allowed: bool,
}
