use actix_web::http::header;
use actix_web::{web, HttpResponse};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::configuration::TicketingSettings;
use crate::mercadopago_client::{GatewayPaymentStatus, GenericPaymentGateway};
use crate::schemas::WebhookAck;
use crate::ticketing_client::{
    GenericTicketingService, PaymentState, ReferenceRecord, TicketingError,
};

use super::errors::WebhookError;
use super::schemas::{ReturnQuery, WebhookNotification};
use super::utils::{
    apply_gateway_status, checkout_step_url, order_url, reconcile_refund_notification,
    resolve_payment, PaymentResolution, StatusOutcome,
};

fn ack(detail: &str) -> HttpResponse {
    HttpResponse::Ok().json(WebhookAck {
        detail: detail.to_string(),
    })
}

fn see_other(url: String) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, url))
        .finish()
}

/// Global webhook endpoint. Without an event in the URL the degraded-mode
/// info-blob scan is unavailable.
#[tracing::instrument(name = "gateway webhook", skip(body, payment_gateway, ticketing_service))]
pub async fn webhook(
    body: web::Json<Value>,
    payment_gateway: web::Data<Arc<dyn GenericPaymentGateway>>,
    ticketing_service: web::Data<Arc<dyn GenericTicketingService>>,
) -> Result<HttpResponse, WebhookError> {
    process_webhook(
        None,
        body.into_inner(),
        payment_gateway.get_ref().as_ref(),
        ticketing_service.get_ref().as_ref(),
    )
    .await
}

#[tracing::instrument(
    name = "gateway event webhook",
    skip(body, payment_gateway, ticketing_service),
    fields(event = %path)
)]
pub async fn webhook_event(
    path: web::Path<String>,
    body: web::Json<Value>,
    payment_gateway: web::Data<Arc<dyn GenericPaymentGateway>>,
    ticketing_service: web::Data<Arc<dyn GenericTicketingService>>,
) -> Result<HttpResponse, WebhookError> {
    process_webhook(
        Some(path.into_inner()),
        body.into_inner(),
        payment_gateway.get_ref().as_ref(),
        ticketing_service.get_ref().as_ref(),
    )
    .await
}

async fn process_webhook(
    event_hint: Option<String>,
    raw_body: Value,
    payment_gateway: &dyn GenericPaymentGateway,
    ticketing_service: &dyn GenericTicketingService,
) -> Result<HttpResponse, WebhookError> {
    let notification: WebhookNotification = match serde_json::from_value(raw_body.clone()) {
        Ok(notification) => notification,
        Err(e) => {
            tracing::warn!("Discarding malformed webhook body: {}", e);
            return Ok(ack("Not interested in this notification"));
        }
    };
    if notification.resource_type != "sale" && !notification.is_refund() {
        return Ok(ack("Not interested in this resource type"));
    }
    let Some(sale_id) = notification.sale_identifier() else {
        return Ok(ack("Notification carries no resource id"));
    };

    let references = notification.correlation_refs();
    let payment = match resolve_payment(
        ticketing_service,
        &references,
        event_hint.as_deref(),
    )
    .await?
    {
        PaymentResolution::Resolved(payment) => payment,
        PaymentResolution::UnknownEvent => return Ok(ack("Unable to detect event")),
        // A resolved resource the platform does not track is not a
        // transient failure; redelivery would not change the answer.
        PaymentResolution::NotFound => return Ok(ack("Payment not found")),
    };

    let settings = ticketing_service
        .get_payment_settings(&payment.event)
        .await?;
    let credentials = settings.gateway_credentials();
    // Never trust the notification body: re-fetch the authoritative sale
    // record before any state-changing action.
    let sale = payment_gateway
        .get_payment(&credentials, &sale_id)
        .await
        .map_err(|e| {
            tracing::error!("Gateway error on webhook. Event data: {}", raw_body);
            WebhookError::GatewayLookupError("Sale not found".to_string(), e)
        })?;

    ticketing_service
        .log_action(
            &payment.event,
            &payment.order_code,
            "mercadopago.webhook",
            &raw_body,
        )
        .await?;

    if notification.is_refund() {
        if payment.state == PaymentState::Confirmed
            && matches!(
                sale.status,
                GatewayPaymentStatus::PartiallyRefunded | GatewayPaymentStatus::Refunded
            )
        {
            let Some(refund_id) = notification.resource.id() else {
                return Ok(ack("Notification carries no refund id"));
            };
            let refund = payment_gateway
                .get_refund(&credentials, &refund_id)
                .await
                .map_err(|e| {
                    tracing::error!("Gateway error on webhook. Event data: {}", raw_body);
                    WebhookError::GatewayLookupError("Refund not found".to_string(), e)
                })?;
            reconcile_refund_notification(ticketing_service, &payment, &refund).await?;
            return Ok(ack("Refund reconciled"));
        }
        tracing::info!(
            "Ignoring refund notification for payment {} in state {:?} with sale status {}.",
            payment.id,
            payment.state,
            sale.status
        );
        return Ok(ack("Refund notification ignored"));
    }

    match apply_gateway_status(ticketing_service, &payment, &sale).await? {
        StatusOutcome::QuotaExceeded(message) => {
            // No buyer to inform on this path and redelivery cannot fix a
            // full quota, so the notification is still acknowledged.
            tracing::warn!(
                "Quota exceeded while confirming payment {} from webhook: {}",
                payment.id,
                message
            );
        }
        outcome => {
            tracing::info!("Webhook for payment {} resolved as {:?}.", payment.id, outcome);
        }
    }
    Ok(ack("Notification handled"))
}

/// Browser return after a successful or pending gateway checkout. Always
/// answers with a redirect; errors surface on the host's pages.
#[tracing::instrument(
    name = "payment return",
    skip(query, payment_gateway, ticketing_service, ticketing_setting),
    fields(event = %path)
)]
pub async fn return_success(
    path: web::Path<String>,
    query: web::Query<ReturnQuery>,
    payment_gateway: web::Data<Arc<dyn GenericPaymentGateway>>,
    ticketing_service: web::Data<Arc<dyn GenericTicketingService>>,
    ticketing_setting: web::Data<TicketingSettings>,
) -> HttpResponse {
    let event = path.into_inner();
    let query = query.into_inner();
    let presale = ticketing_setting.presale_base_url.as_str();
    let payment_step =
        || see_other(checkout_step_url(presale, &event, "payment", Some("payment_failed")));
    let ticketing = ticketing_service.get_ref().as_ref();

    let Some(reference) = query.external_reference.as_deref() else {
        tracing::error!("Return redirect carries no external reference.");
        return payment_step();
    };
    let Ok(payment_id) = Uuid::parse_str(reference) else {
        tracing::error!("Return redirect external reference {} is not a payment id.", reference);
        return payment_step();
    };
    let payment = match ticketing.get_payment(payment_id).await {
        Ok(payment) => payment,
        Err(e) => {
            tracing::error!("Failed to resolve payment {} on return: {:?}", payment_id, e);
            return payment_step();
        }
    };
    if payment.event != event {
        tracing::error!(
            "Return redirect for event {} references payment {} of event {}.",
            event,
            payment.id,
            payment.event
        );
        return payment_step();
    }
    let order = match ticketing.get_order(&event, &payment.order_code).await {
        Ok(order) => order,
        Err(e) => {
            tracing::error!("Failed to fetch order {} on return: {:?}", payment.order_code, e);
            return payment_step();
        }
    };
    let Some(collection_id) = query.collection_id.as_deref() else {
        tracing::error!("Return redirect carries no collection id.");
        return payment_step();
    };
    let settings = match ticketing.get_payment_settings(&event).await {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Failed to fetch payment settings for {} on return: {:?}", event, e);
            return payment_step();
        }
    };
    // Re-fetch the authoritative record; the redirect parameters only serve
    // as tamper-detection signals below.
    let sale = match payment_gateway
        .get_payment(&settings.gateway_credentials(), collection_id)
        .await
    {
        Ok(sale) => sale,
        Err(e) => {
            tracing::error!(
                "We had trouble communicating with MercadoPago on return: {:?}",
                e
            );
            return payment_step();
        }
    };
    if let Some(query_status) = query.collection_status.as_deref() {
        if query_status != sale.status.to_string() {
            tracing::error!(
                "Invalid response from MercadoPago received: redirect status {} disagrees \
                 with fetched status {} for sale {}.",
                query_status,
                sale.status,
                sale.id
            );
            return payment_step();
        }
    }
    if let Some(external_reference) = sale.external_reference.as_deref() {
        if external_reference != payment.id.to_string() {
            tracing::error!(
                "Invalid response from MercadoPago received: sale {} belongs to reference {}, \
                 not payment {}.",
                sale.id,
                external_reference,
                payment.id
            );
            return payment_step();
        }
    }
    if let Some(preference_id) = query.preference_id.as_deref() {
        match ticketing.lookup_reference(&[preference_id.to_string()]).await {
            Ok(Some(record)) if record.payment_id != payment.id => {
                tracing::error!(
                    "Invalid response from MercadoPago received: preference {} was created for \
                     payment {}, not payment {}.",
                    preference_id,
                    record.payment_id,
                    payment.id
                );
                return payment_step();
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(
                    "Failed to look up preference {} on return: {:?}",
                    preference_id,
                    e
                );
            }
        }
    }

    // First sighting of the gateway-side collection id: record it so later
    // webhooks correlate without the degraded scan.
    if let Err(e) = ticketing
        .save_reference(&ReferenceRecord {
            reference: collection_id.to_string(),
            event: event.to_string(),
            order_code: payment.order_code.to_string(),
            payment_id: payment.id,
        })
        .await
    {
        tracing::error!("Failed to save reference record for sale {}: {:?}", sale.id, e);
    }

    match apply_gateway_status(ticketing, &payment, &sale).await {
        Ok(StatusOutcome::Confirmed) | Ok(StatusOutcome::AlreadyConfirmed) => see_other(
            order_url(presale, &event, &order.code, &order.secret, true),
        ),
        Ok(StatusOutcome::Pending) | Ok(StatusOutcome::NoAction) | Ok(StatusOutcome::Refunded) => {
            see_other(order_url(presale, &event, &order.code, &order.secret, false))
        }
        Ok(StatusOutcome::QuotaExceeded(_)) => see_other(checkout_step_url(
            presale,
            &event,
            "payment",
            Some("quota_exceeded"),
        )),
        Ok(StatusOutcome::Failed) => payment_step(),
        Err(e) => {
            tracing::error!(
                "Failed to apply gateway status for payment {} on return: {:?}",
                payment.id,
                e
            );
            payment_step()
        }
    }
}

/// Failure back-URL: the buyer canceled at the gateway. Never mutates
/// state.
#[tracing::instrument(
    name = "payment abort",
    skip(query, ticketing_service, ticketing_setting),
    fields(event = %path)
)]
pub async fn return_abort(
    path: web::Path<String>,
    query: web::Query<ReturnQuery>,
    ticketing_service: web::Data<Arc<dyn GenericTicketingService>>,
    ticketing_setting: web::Data<TicketingSettings>,
) -> HttpResponse {
    let event = path.into_inner();
    let presale = ticketing_setting.presale_base_url.as_str();
    let ticketing = ticketing_service.get_ref().as_ref();
    tracing::info!("It looks like the buyer canceled the MercadoPago payment.");

    let payment = match query
        .external_reference
        .as_deref()
        .and_then(|r| Uuid::parse_str(r).ok())
    {
        Some(payment_id) => match ticketing.get_payment(payment_id).await {
            Ok(payment) => Some(payment),
            Err(TicketingError::NotFound(_)) => None,
            Err(e) => {
                tracing::error!("Failed to resolve payment {} on abort: {:?}", payment_id, e);
                None
            }
        },
        None => None,
    };

    match payment {
        Some(payment) if payment.event == event => {
            match ticketing.get_order(&event, &payment.order_code).await {
                Ok(order) => see_other(order_url(
                    presale,
                    &event,
                    &order.code,
                    &order.secret,
                    payment.state == PaymentState::Confirmed,
                )),
                Err(e) => {
                    tracing::error!(
                        "Failed to fetch order {} on abort: {:?}",
                        payment.order_code,
                        e
                    );
                    see_other(checkout_step_url(
                        presale,
                        &event,
                        "payment",
                        Some("payment_aborted"),
                    ))
                }
            }
        }
        _ => see_other(checkout_step_url(
            presale,
            &event,
            "payment",
            Some("payment_aborted"),
        )),
    }
}
