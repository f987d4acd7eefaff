use actix_web::web;
use std::sync::Arc;

use crate::constants::{PROVIDER_DISPLAY_NAME, PROVIDER_IDENTIFIER};
use crate::errors::GenericError;
use crate::schemas::GenericResponse;
use crate::ticketing_client::{GenericTicketingService, TicketingError};

use super::schemas::{EligibilityData, EligibilityRequest, ProviderMetaData, ProviderMetaQuery};
use super::utils::{currency_warnings, is_allowed, test_mode_message};

#[utoipa::path(
    get,
    path = "/provider/meta",
    tag = "Provider Metadata",
    params(("event" = String, Query, description = "Event identifier")),
    responses(
        (status=200, description= "Provider capability flags", body= GenericResponse<ProviderMetaData>),
    )
)]
#[tracing::instrument(name = "provider meta", skip(ticketing_service), fields(event = %query.event))]
pub async fn provider_meta(
    query: web::Query<ProviderMetaQuery>,
    ticketing_service: web::Data<Arc<dyn GenericTicketingService>>,
) -> Result<web::Json<GenericResponse<ProviderMetaData>>, GenericError> {
    let settings = ticketing_service
        .get_payment_settings(&query.event)
        .await
        .map_err(|e| match e {
            TicketingError::NotFound(_) => GenericError::ConfigurationError(format!(
                "MercadoPago is not configured for event {}",
                query.event
            )),
            e => GenericError::TicketingServiceError(
                "Something went wrong while fetching payment settings".to_string(),
                anyhow::Error::new(e),
            ),
        })?;

    let meta = ProviderMetaData {
        identifier: PROVIDER_IDENTIFIER.to_string(),
        display_name: PROVIDER_DISPLAY_NAME.to_string(),
        refund_supported: false,
        partial_refund_supported: false,
        abort_pending_allowed: false,
        test_mode_message: test_mode_message(settings.endpoint),
        currency_warnings: currency_warnings(settings.settlement_currency),
    };
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched provider metadata",
        Some(meta),
    )))
}

#[utoipa::path(
    post,
    path = "/provider/eligibility",
    tag = "Provider Eligibility",
    request_body(content = EligibilityRequest, description = "Request Body"),
    responses(
        (status=200, description= "Checkout eligibility for a settlement currency", body= GenericResponse<EligibilityData>),
    )
)]
#[tracing::instrument(name = "provider eligibility")]
pub async fn provider_eligibility(
    body: EligibilityRequest,
) -> Result<web::Json<GenericResponse<EligibilityData>>, GenericError> {
    let allowed = is_allowed(body.currency);
    if !allowed {
        tracing::info!(
            "MercadoPago hidden from checkout: currency {} is unsupported.",
            body.currency
        );
    }
    Ok(web::Json(GenericResponse::success(
        "Successfully checked eligibility",
        Some(EligibilityData { allowed }),
    )))
}
