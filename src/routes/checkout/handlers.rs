use actix_web::web;
use std::sync::Arc;
use utoipa::TupleUnit;
use uuid::Uuid;

use crate::configuration::ApplicationSettings;
use crate::constants::PROVIDER_IDENTIFIER;
use crate::errors::GenericError;
use crate::mercadopago_client::GenericPaymentGateway;
use crate::routes::provider::utils::is_allowed;
use crate::schemas::GenericResponse;
use crate::ticketing_client::{GenericTicketingService, ReferenceRecord, TicketingError};

use super::errors::{PaymentInfoError, PreferenceCreateError};
use super::schemas::{
    PaymentDetailsData, PreferenceCreateData, PreferenceCreateRequest, RefundExecuteRequest,
};
use super::utils::{
    build_preference_request, extract_payment_details, interpret_preference_result, shred_info,
};

#[utoipa::path(
    post,
    path = "/checkout/preference",
    tag = "Preference Creation",
    request_body(content = PreferenceCreateRequest, description = "Request Body"),
    responses(
        (status=200, description= "Preference created", body= GenericResponse<PreferenceCreateData>),
    )
)]
#[tracing::instrument(
    name = "create preference",
    skip(payment_gateway, ticketing_service, application),
    fields(event = %body.event, order_code = %body.order_code)
)]
pub async fn create_preference(
    body: PreferenceCreateRequest,
    payment_gateway: web::Data<Arc<dyn GenericPaymentGateway>>,
    ticketing_service: web::Data<Arc<dyn GenericTicketingService>>,
    application: web::Data<ApplicationSettings>,
) -> Result<web::Json<GenericResponse<PreferenceCreateData>>, GenericError> {
    let settings = ticketing_service
        .get_payment_settings(&body.event)
        .await
        .map_err(|e| match e {
            TicketingError::NotFound(_) => PreferenceCreateError::ConfigurationError(format!(
                "MercadoPago is not configured for event {}",
                body.event
            )),
            e => PreferenceCreateError::TicketingServiceError(
                "Something went wrong while fetching payment settings".to_string(),
                anyhow::Error::new(e),
            ),
        })?;
    if !is_allowed(settings.settlement_currency) {
        return Err(PreferenceCreateError::ConfigurationError(format!(
            "MercadoPago does not process payments in {}",
            settings.settlement_currency
        ))
        .into());
    }

    let order = ticketing_service
        .get_order(&body.event, &body.order_code)
        .await
        .map_err(|e| match e {
            TicketingError::NotFound(message) => PreferenceCreateError::ValidationError(message),
            e => PreferenceCreateError::TicketingServiceError(
                "Something went wrong while fetching the order".to_string(),
                anyhow::Error::new(e),
            ),
        })?;
    let payment = ticketing_service
        .get_payment(body.payment_id)
        .await
        .map_err(|e| match e {
            TicketingError::NotFound(message) => PreferenceCreateError::ValidationError(message),
            e => PreferenceCreateError::TicketingServiceError(
                "Something went wrong while fetching the payment".to_string(),
                anyhow::Error::new(e),
            ),
        })?;
    if payment.order_code != order.code {
        return Err(PreferenceCreateError::ValidationError(format!(
            "Payment {} does not belong to order {}",
            payment.id, order.code
        ))
        .into());
    }

    let preference_request = build_preference_request(&order, &payment, &settings, &application);
    let result = payment_gateway
        .create_preference(&settings.gateway_credentials(), &preference_request)
        .await
        .map_err(|e| {
            PreferenceCreateError::GatewayError(
                "We had trouble communicating with MercadoPago".to_string(),
                e,
            )
        })?;
    let redirect_url = interpret_preference_result(&result, settings.endpoint)?;
    let preference_id = result.id.clone().ok_or_else(|| {
        PreferenceCreateError::GatewayError(
            "We had trouble communicating with MercadoPago".to_string(),
            anyhow::anyhow!("Preference response has no id: {}", result.raw),
        )
    })?;

    // The reference record must exist before the buyer is redirected, or a
    // fast webhook has nothing to correlate against.
    ticketing_service
        .save_reference(&ReferenceRecord {
            reference: preference_id.to_string(),
            event: order.event.to_string(),
            order_code: order.code.to_string(),
            payment_id: payment.id,
        })
        .await
        .map_err(|e| {
            PreferenceCreateError::TicketingServiceError(
                "Something went wrong while saving the payment reference".to_string(),
                anyhow::Error::new(e),
            )
        })?;
    ticketing_service
        .update_payment_info(payment.id, &result.raw)
        .await
        .map_err(|e| {
            PreferenceCreateError::TicketingServiceError(
                "Something went wrong while storing the payment info".to_string(),
                anyhow::Error::new(e),
            )
        })?;

    Ok(web::Json(GenericResponse::success(
        "Successfully created preference",
        Some(PreferenceCreateData {
            redirect_url,
            preference_id,
        }),
    )))
}

#[utoipa::path(
    post,
    path = "/checkout/refund",
    tag = "Refund Execution",
    request_body(content = RefundExecuteRequest, description = "Request Body"),
    responses(
        (status=501, description= "Refunding is not supported", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "execute refund")]
pub async fn execute_refund(
    body: RefundExecuteRequest,
) -> Result<web::Json<GenericResponse<()>>, GenericError> {
    // Policy, not a gap: this provider never initiates refunds.
    tracing::warn!(
        "Refund execution rejected for payment {}: provider does not support refunds.",
        body.payment_id
    );
    Err(GenericError::UnsupportedOperationError(
        "Refunding is not supported".to_string(),
    ))
}

#[utoipa::path(
    get,
    path = "/checkout/payment/{payment_id}/details",
    tag = "Payment Details",
    params(("payment_id" = Uuid, Path, description = "Local payment id")),
    responses(
        (status=200, description= "Extracted gateway payment details", body= GenericResponse<PaymentDetailsData>),
    )
)]
#[tracing::instrument(name = "payment details", skip(ticketing_service))]
pub async fn payment_details(
    path: web::Path<Uuid>,
    ticketing_service: web::Data<Arc<dyn GenericTicketingService>>,
) -> Result<web::Json<GenericResponse<PaymentDetailsData>>, GenericError> {
    let payment_id = path.into_inner();
    let payment = ticketing_service
        .get_payment(payment_id)
        .await
        .map_err(|e| match e {
            TicketingError::NotFound(message) => PaymentInfoError::NotFoundError(message),
            e => PaymentInfoError::TicketingServiceError(
                "Something went wrong while fetching the payment".to_string(),
                anyhow::Error::new(e),
            ),
        })?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched payment details",
        Some(extract_payment_details(&payment.info)),
    )))
}

#[utoipa::path(
    post,
    path = "/checkout/payment/{payment_id}/shred",
    tag = "Payment Info Shredding",
    params(("payment_id" = Uuid, Path, description = "Local payment id")),
    responses(
        (status=200, description= "Payment info shredded", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "shred payment info", skip(ticketing_service))]
pub async fn shred_payment_info(
    path: web::Path<Uuid>,
    ticketing_service: web::Data<Arc<dyn GenericTicketingService>>,
) -> Result<web::Json<GenericResponse<()>>, GenericError> {
    let payment_id = path.into_inner();
    let payment = ticketing_service
        .get_payment(payment_id)
        .await
        .map_err(|e| match e {
            TicketingError::NotFound(message) => PaymentInfoError::NotFoundError(message),
            e => PaymentInfoError::TicketingServiceError(
                "Something went wrong while fetching the payment".to_string(),
                anyhow::Error::new(e),
            ),
        })?;
    if payment.provider != PROVIDER_IDENTIFIER {
        return Err(GenericError::ValidationError(format!(
            "Payment {} does not belong to this provider",
            payment_id
        )));
    }
    if payment.info.is_null() {
        return Ok(web::Json(GenericResponse::success(
            "Payment has no info to shred",
            Some(()),
        )));
    }
    let shredded = shred_info(&payment.info);
    ticketing_service
        .update_payment_info(payment_id, &shredded)
        .await
        .map_err(|e| {
            PaymentInfoError::TicketingServiceError(
                "Something went wrong while storing the shredded info".to_string(),
                anyhow::Error::new(e),
            )
        })?;
    Ok(web::Json(GenericResponse::success(
        "Successfully shredded payment info",
        Some(()),
    )))
}
