use bigdecimal::BigDecimal;

use crate::constants::PROVIDER_IDENTIFIER;
use crate::mercadopago_client::{GatewayPayment, GatewayPaymentStatus, GatewayRefund};
use crate::routes::checkout::utils::extract_sale_id;
use crate::ticketing_client::{
    GenericTicketingService, OrderPayment, OrderRefund, PaymentState, RefundSource, RefundState,
    TicketingError,
};

/// Outcome of mapping a freshly fetched gateway status onto the local
/// payment. Repeated delivery of the same notification lands in the
/// no-op variants.
#[derive(Debug, PartialEq)]
pub enum StatusOutcome {
    Confirmed,
    AlreadyConfirmed,
    Pending,
    Failed,
    Refunded,
    QuotaExceeded(String),
    NoAction,
}

/// The reconciliation step proper: `sale` was re-fetched from the gateway,
/// never taken from redirect parameters.
pub async fn apply_gateway_status(
    ticketing_service: &dyn GenericTicketingService,
    payment: &OrderPayment,
    sale: &GatewayPayment,
) -> Result<StatusOutcome, TicketingError> {
    match sale.status {
        GatewayPaymentStatus::Approved | GatewayPaymentStatus::Completed => {
            if payment.state == PaymentState::Confirmed {
                tracing::warn!(
                    "Gateway reports sale {} completed but payment {} is already confirmed.",
                    sale.id,
                    payment.id
                );
                return Ok(StatusOutcome::AlreadyConfirmed);
            }
            match ticketing_service.confirm_payment(payment.id, &sale.raw).await {
                Ok(()) => Ok(StatusOutcome::Confirmed),
                Err(TicketingError::QuotaExceeded(message)) => {
                    tracing::warn!(
                        "Quota exceeded while confirming payment {}: {}",
                        payment.id,
                        message
                    );
                    Ok(StatusOutcome::QuotaExceeded(message))
                }
                Err(e) => Err(e),
            }
        }
        GatewayPaymentStatus::Pending
        | GatewayPaymentStatus::Authorized
        | GatewayPaymentStatus::InProcess
        | GatewayPaymentStatus::InMediation => {
            if matches!(payment.state, PaymentState::Created | PaymentState::Pending) {
                ticketing_service.pend_payment(payment.id, &sale.raw).await?;
                Ok(StatusOutcome::Pending)
            } else {
                tracing::warn!(
                    "Ignoring pending status for payment {} in state {:?}.",
                    payment.id,
                    payment.state
                );
                Ok(StatusOutcome::NoAction)
            }
        }
        GatewayPaymentStatus::Cancelled => {
            fail_open_payment(
                ticketing_service,
                payment,
                sale,
                "Payment was cancelled at MercadoPago",
            )
            .await
        }
        GatewayPaymentStatus::Rejected => {
            fail_open_payment(
                ticketing_service,
                payment,
                sale,
                "Payment was rejected by MercadoPago",
            )
            .await
        }
        GatewayPaymentStatus::Refunded | GatewayPaymentStatus::ChargedBack => {
            if payment.state == PaymentState::Refunded {
                tracing::warn!("Payment {} is already marked refunded.", payment.id);
                return Ok(StatusOutcome::NoAction);
            }
            if payment.state == PaymentState::Confirmed {
                reconcile_refund_total(ticketing_service, payment.id, &payment.amount).await?;
            }
            ticketing_service
                .mark_payment_refunded(payment.id, &sale.raw)
                .await?;
            Ok(StatusOutcome::Refunded)
        }
        // Individual partial refunds arrive as refund resources; here only
        // the reported total can be reconciled.
        GatewayPaymentStatus::PartiallyRefunded => {
            if payment.state == PaymentState::Confirmed {
                if let Some(total_refunded) = &sale.total_refunded_amount {
                    reconcile_refund_total(ticketing_service, payment.id, total_refunded).await?;
                }
            }
            Ok(StatusOutcome::NoAction)
        }
        GatewayPaymentStatus::Unknown => {
            tracing::warn!(
                "Gateway reported an unknown status for sale {}, leaving payment {} untouched.",
                sale.id,
                payment.id
            );
            Ok(StatusOutcome::NoAction)
        }
    }
}

async fn fail_open_payment(
    ticketing_service: &dyn GenericTicketingService,
    payment: &OrderPayment,
    sale: &GatewayPayment,
    reason: &str,
) -> Result<StatusOutcome, TicketingError> {
    if matches!(payment.state, PaymentState::Created | PaymentState::Pending) {
        ticketing_service
            .fail_payment(payment.id, reason, &sale.raw)
            .await?;
        Ok(StatusOutcome::Failed)
    } else {
        tracing::warn!(
            "Ignoring {} for payment {} in state {:?}.",
            sale.status,
            payment.id,
            payment.state
        );
        Ok(StatusOutcome::NoAction)
    }
}

/// Refund amounts the platform already knows about: anything still counted
/// towards the refunded total, plus externally observed refunds.
pub fn known_refund_sum(refunds: &[OrderRefund]) -> BigDecimal {
    refunds
        .iter()
        .filter(|r| {
            r.source == RefundSource::External
                || matches!(
                    r.state,
                    RefundState::Created | RefundState::Transit | RefundState::Done
                )
        })
        .fold(BigDecimal::from(0), |acc, r| acc + &r.amount)
}

/// Compares the locally known refunded sum against the gateway-reported
/// total and creates a corrective external refund for the exact shortfall.
/// Guards against individually missed refund notifications.
pub async fn reconcile_refund_total(
    ticketing_service: &dyn GenericTicketingService,
    payment_id: uuid::Uuid,
    total_refunded: &BigDecimal,
) -> Result<Option<BigDecimal>, TicketingError> {
    let refunds = ticketing_service.list_refunds(payment_id).await?;
    let known_sum = known_refund_sum(&refunds);
    if known_sum < *total_refunded {
        let shortfall = total_refunded - &known_sum;
        tracing::info!(
            "Refund shortfall of {} detected for payment {}, creating corrective external refund.",
            shortfall,
            payment_id
        );
        ticketing_service
            .create_external_refund(payment_id, &shortfall, None)
            .await?;
        Ok(Some(shortfall))
    } else {
        Ok(None)
    }
}

/// Per-refund-id synchronisation for a `refund` resource notification,
/// followed by the sum reconciliation when the gateway reports a total.
pub async fn reconcile_refund_notification(
    ticketing_service: &dyn GenericTicketingService,
    payment: &OrderPayment,
    refund: &GatewayRefund,
) -> Result<(), TicketingError> {
    let refunds = ticketing_service.list_refunds(payment.id).await?;
    let known = refunds
        .iter()
        .find(|r| r.gateway_refund_id().as_deref() == Some(refund.id.as_str()));
    match known {
        None => {
            ticketing_service
                .create_external_refund(payment.id, &refund.amount.abs(), Some(&refund.raw))
                .await?;
        }
        Some(local)
            if matches!(local.state, RefundState::Created | RefundState::Transit)
                && refund.status.is_completed() =>
        {
            ticketing_service.mark_refund_done(local.id).await?;
        }
        Some(local) => {
            tracing::warn!(
                "Refund {} already reconciled locally as {:?}, nothing to do.",
                local.id,
                local.state
            );
        }
    }

    if let Some(total_refunded) = &refund.total_refunded_amount {
        reconcile_refund_total(ticketing_service, payment.id, total_refunded).await?;
    }
    Ok(())
}

#[derive(Debug)]
pub enum PaymentResolution {
    Resolved(OrderPayment),
    UnknownEvent,
    NotFound,
}

/// Correlates a gateway resource with a local payment. The reference-record
/// lookup is authoritative; the info-blob scan only runs when the record is
/// missing and the event is known from the webhook URL.
pub async fn resolve_payment(
    ticketing_service: &dyn GenericTicketingService,
    references: &[String],
    event_hint: Option<&str>,
) -> Result<PaymentResolution, TicketingError> {
    if let Some(record) = ticketing_service.lookup_reference(references).await? {
        return match ticketing_service.get_payment(record.payment_id).await {
            Ok(payment) => Ok(PaymentResolution::Resolved(payment)),
            Err(TicketingError::NotFound(_)) => Ok(PaymentResolution::NotFound),
            Err(e) => Err(e),
        };
    }
    let Some(event) = event_hint else {
        return Ok(PaymentResolution::UnknownEvent);
    };
    let Some(sale_id) = references.first() else {
        return Ok(PaymentResolution::NotFound);
    };
    for payment in ticketing_service
        .list_provider_payments(event, PROVIDER_IDENTIFIER)
        .await?
    {
        if extract_sale_id(&payment.info).as_deref() == Some(sale_id.as_str()) {
            tracing::warn!(
                "Degraded-mode correlation: payment {} matched sale {} through its stored \
                 info blob, no reference record was found.",
                payment.id,
                sale_id
            );
            return Ok(PaymentResolution::Resolved(payment));
        }
    }
    Ok(PaymentResolution::NotFound)
}

pub fn order_url(
    presale_base_url: &str,
    event: &str,
    order_code: &str,
    order_secret: &str,
    paid: bool,
) -> String {
    let suffix = if paid { "?paid=yes" } else { "" };
    format!(
        "{}/{}/order/{}/{}{}",
        presale_base_url.trim_end_matches('/'),
        event,
        order_code,
        order_secret,
        suffix
    )
}

pub fn checkout_step_url(
    presale_base_url: &str,
    event: &str,
    step: &str,
    error: Option<&str>,
) -> String {
    let suffix = error
        .map(|e| format!("?error={}", e))
        .unwrap_or_default();
    format!(
        "{}/{}/checkout/{}{}",
        presale_base_url.trim_end_matches('/'),
        event,
        step,
        suffix
    )
}
