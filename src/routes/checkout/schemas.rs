use crate::errors::GenericError;
use actix_http::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

macro_rules! impl_json_from_request {
    ($struct_name:ident) => {
        impl FromRequest for $struct_name {
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
    };
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceCreateRequest {
    pub event: String,
    pub order_code: String,
    pub payment_id: Uuid,
}

impl_json_from_request!(PreferenceCreateRequest);

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceCreateData {
    pub redirect_url: String,
    pub preference_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefundExecuteRequest {
    pub payment_id: Uuid,
}

impl_json_from_request!(RefundExecuteRequest);

/// Extraction of the stored gateway payload for the host's control views.
#[derive(Debug, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailsData {
    pub payer_email: Option<String>,
    pub payer_id: Option<String>,
    pub cart_id: Option<String>,
    pub payment_id: Option<String>,
    pub sale_id: Option<String>,
    /// False when the stored payload reports a pending state; the buyer
    /// must not be offered a retry for a payment the gateway may still
    /// complete.
    pub retry_allowed: bool,
}
