use bigdecimal::{BigDecimal, RoundingMode};
use serde_json::{json, Value};

use crate::configuration::ApplicationSettings;
use crate::mercadopago_client::{
    PreferenceBackUrls, PreferenceCreateRequest, PreferenceItem, PreferenceResult,
};
use crate::schemas::PaymentGatewayEndpoint;
use crate::ticketing_client::{EventPaymentSettings, Order, OrderPayment};
use crate::utils::{convert_amount, value_as_id};

use super::errors::PreferenceCreateError;
use super::schemas::PaymentDetailsData;

/// Charged amount in the settlement currency. Conversion only applies when
/// the order currency differs from the configured settlement currency.
pub fn settlement_amount(order: &Order, settings: &EventPaymentSettings) -> BigDecimal {
    if order.currency != settings.settlement_currency {
        convert_amount(&order.total, &settings.exchange_rate)
    } else {
        order.total.with_scale_round(2, RoundingMode::HalfUp)
    }
}

pub fn build_preference_request(
    order: &Order,
    payment: &OrderPayment,
    settings: &EventPaymentSettings,
    application: &ApplicationSettings,
) -> PreferenceCreateRequest {
    let base = application.public_base_url.trim_end_matches('/');
    PreferenceCreateRequest {
        items: vec![PreferenceItem {
            title: format!("Order {}-{}", order.event.to_uppercase(), order.code),
            quantity: 1,
            currency_id: settings.settlement_currency,
            unit_price: settlement_amount(order, settings),
        }],
        back_urls: PreferenceBackUrls {
            success: format!("{}/return/{}/success", base, order.event),
            pending: format!("{}/return/{}/success", base, order.event),
            failure: format!("{}/return/{}/abort", base, order.event),
        },
        notification_url: format!("{}/webhook/{}/mercadopago", base, order.event),
        external_reference: payment.id.to_string(),
    }
}

/// A creation status outside 200/201 is a failure; on success the redirect
/// URL variant follows the configured endpoint mode.
pub fn interpret_preference_result(
    result: &PreferenceResult,
    endpoint: PaymentGatewayEndpoint,
) -> Result<String, PreferenceCreateError> {
    if !result.is_created() {
        tracing::error!(
            "Preference creation failed with status {}: {}",
            result.status,
            result.raw
        );
        return Err(PreferenceCreateError::GatewayError(
            "We had trouble communicating with MercadoPago".to_string(),
            anyhow::anyhow!(
                "Preference creation returned status {}: {}",
                result.status,
                result.raw
            ),
        ));
    }
    result
        .redirect_url(endpoint)
        .map(str::to_string)
        .ok_or_else(|| {
            tracing::error!("Preference response has no redirect URL: {}", result.raw);
            PreferenceCreateError::GatewayError(
                "We had trouble communicating with MercadoPago".to_string(),
                anyhow::anyhow!("Preference response has no redirect URL: {}", result.raw),
            )
        })
}

/// Sale id buried in the stored payload, falling back to the top-level
/// payment id. Also used by degraded-mode webhook matching.
pub fn extract_sale_id(info: &Value) -> Option<String> {
    let mut sale_id = None;
    if let Some(transactions) = info.get("transactions").and_then(|v| v.as_array()) {
        for trans in transactions {
            if let Some(resources) = trans.get("related_resources").and_then(|v| v.as_array()) {
                for res in resources {
                    if let Some(id) = res.get("sale").and_then(|s| s.get("id")) {
                        sale_id = value_as_id(id);
                    }
                }
            }
        }
    }
    sale_id.or_else(|| info.get("id").and_then(value_as_id))
}

pub fn extract_payment_details(info: &Value) -> PaymentDetailsData {
    let payer_info = info.get("payer").and_then(|p| p.get("payer_info"));
    let retry_allowed = info
        .get("state")
        .and_then(|v| v.as_str())
        .map(|state| state != "pending")
        .unwrap_or(true);
    PaymentDetailsData {
        payer_email: payer_info
            .and_then(|p| p.get("email"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        payer_id: payer_info
            .and_then(|p| p.get("payer_id"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        cart_id: info.get("cart").and_then(value_as_id),
        payment_id: info.get("id").and_then(value_as_id),
        sale_id: extract_sale_id(info),
        retry_allowed,
    }
}

/// Data-minimization transform for retention expiry: keeps identifiers and
/// amounts, blanks the payer e-mail.
pub fn shred_info(info: &Value) -> Value {
    let amounts: Vec<Value> = info
        .get("transactions")
        .and_then(|v| v.as_array())
        .map(|transactions| {
            transactions
                .iter()
                .map(|t| json!({"amount": t.get("amount").cloned().unwrap_or(Value::Null)}))
                .collect()
        })
        .unwrap_or_default();
    json!({
        "id": info.get("id").cloned().unwrap_or(Value::Null),
        "payer": {
            "payer_info": {
                "email": "█"
            }
        },
        "update_time": info.get("update_time").cloned().unwrap_or(Value::Null),
        "transactions": amounts,
        "_shredded": true
    })
}
