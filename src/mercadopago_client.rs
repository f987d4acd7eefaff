use async_trait::async_trait;
use bigdecimal::BigDecimal;
use rand::Rng;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::configuration::{GatewaySettings, RetrySettings};
use crate::schemas::{CurrencyType, PaymentGatewayEndpoint};
use crate::utils::{value_as_amount, value_as_id};

#[derive(Debug, Serialize)]
pub struct PreferenceItem {
    pub title: String,
    pub quantity: u32,
    pub currency_id: CurrencyType,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Serialize)]
pub struct PreferenceBackUrls {
    pub success: String,
    pub pending: String,
    pub failure: String,
}

#[derive(Debug, Serialize)]
pub struct PreferenceCreateRequest {
    pub items: Vec<PreferenceItem>,
    pub back_urls: PreferenceBackUrls,
    pub notification_url: String,
    /// Local payment id, round-tripped by the gateway into webhook and
    /// return payloads. Sole correlation key for the return handler.
    pub external_reference: String,
}

/// Preference-creation result as reported by the gateway, raw payload
/// included for the payment info blob.
#[derive(Debug, Clone)]
pub struct PreferenceResult {
    pub status: u16,
    pub id: Option<String>,
    pub collector_id: Option<String>,
    pub init_point: Option<String>,
    pub sandbox_init_point: Option<String>,
    pub raw: Value,
}

impl PreferenceResult {
    pub fn is_created(&self) -> bool {
        matches!(self.status, 200 | 201)
    }

    pub fn redirect_url(&self, endpoint: PaymentGatewayEndpoint) -> Option<&str> {
        if endpoint.is_sandbox() {
            self.sandbox_init_point.as_deref()
        } else {
            self.init_point.as_deref()
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GatewayPaymentStatus {
    Approved,
    Completed,
    Pending,
    Authorized,
    InProcess,
    InMediation,
    Cancelled,
    Rejected,
    Refunded,
    ChargedBack,
    PartiallyRefunded,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for GatewayPaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GatewayPaymentStatus::Approved => "approved",
            GatewayPaymentStatus::Completed => "completed",
            GatewayPaymentStatus::Pending => "pending",
            GatewayPaymentStatus::Authorized => "authorized",
            GatewayPaymentStatus::InProcess => "in_process",
            GatewayPaymentStatus::InMediation => "in_mediation",
            GatewayPaymentStatus::Cancelled => "cancelled",
            GatewayPaymentStatus::Rejected => "rejected",
            GatewayPaymentStatus::Refunded => "refunded",
            GatewayPaymentStatus::ChargedBack => "charged_back",
            GatewayPaymentStatus::PartiallyRefunded => "partially_refunded",
            GatewayPaymentStatus::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Authoritative payment record, re-fetched from the gateway before any
/// state-changing action.
#[derive(Debug, Clone)]
pub struct GatewayPayment {
    pub id: String,
    pub status: GatewayPaymentStatus,
    pub transaction_amount: Option<BigDecimal>,
    pub total_refunded_amount: Option<BigDecimal>,
    pub external_reference: Option<String>,
    pub raw: Value,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GatewayRefundStatus {
    Completed,
    Approved,
    Pending,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl GatewayRefundStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, GatewayRefundStatus::Completed | GatewayRefundStatus::Approved)
    }
}

#[derive(Debug, Clone)]
pub struct GatewayRefund {
    pub id: String,
    pub payment_id: Option<String>,
    pub amount: BigDecimal,
    pub status: GatewayRefundStatus,
    pub total_refunded_amount: Option<BigDecimal>,
    pub raw: Value,
}

impl GatewayPayment {
    /// Validates the gateway payload at the adapter boundary; the raw value
    /// is kept for the payment info blob.
    pub fn from_value(raw: Value) -> Result<Self, anyhow::Error> {
        let id = raw
            .get("id")
            .and_then(value_as_id)
            .ok_or_else(|| anyhow::anyhow!("Gateway payment payload has no id"))?;
        let status: GatewayPaymentStatus = raw
            .get("status")
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .ok_or_else(|| anyhow::anyhow!("Gateway payment payload has no status"))?;
        let transaction_amount = raw.get("transaction_amount").and_then(value_as_amount);
        let total_refunded_amount = raw
            .get("transaction_amount_refunded")
            .or_else(|| raw.get("total_refunded_amount"))
            .and_then(value_as_amount);
        let external_reference = raw.get("external_reference").and_then(value_as_id);
        Ok(Self {
            id,
            status,
            transaction_amount,
            total_refunded_amount,
            external_reference,
            raw,
        })
    }
}

impl GatewayRefund {
    pub fn from_value(raw: Value) -> Result<Self, anyhow::Error> {
        let id = raw
            .get("id")
            .and_then(value_as_id)
            .ok_or_else(|| anyhow::anyhow!("Gateway refund payload has no id"))?;
        let payment_id = raw.get("payment_id").and_then(value_as_id);
        let amount = raw
            .get("amount")
            .and_then(value_as_amount)
            .ok_or_else(|| anyhow::anyhow!("Gateway refund payload has no amount"))?;
        let status = raw
            .get("status")
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or(GatewayRefundStatus::Unknown);
        let total_refunded_amount = raw.get("total_refunded_amount").and_then(value_as_amount);
        Ok(Self {
            id,
            payment_id,
            amount,
            status,
            total_refunded_amount,
            raw,
        })
    }
}

/// Per-event credentials, loaded from the host's payment settings.
#[derive(Debug, Clone)]
pub struct GatewayCredentials {
    pub access_token: SecretString,
}

#[async_trait]
pub trait GenericPaymentGateway: Send + Sync {
    async fn create_preference(
        &self,
        credentials: &GatewayCredentials,
        request: &PreferenceCreateRequest,
    ) -> Result<PreferenceResult, anyhow::Error>;

    async fn get_payment(
        &self,
        credentials: &GatewayCredentials,
        payment_id: &str,
    ) -> Result<GatewayPayment, anyhow::Error>;

    async fn get_refund(
        &self,
        credentials: &GatewayCredentials,
        refund_id: &str,
    ) -> Result<GatewayRefund, anyhow::Error>;
}

#[derive(Debug)]
pub struct MercadoPagoClient {
    http_client: Client,
    base_url: String,
    retry: RetrySettings,
}

impl MercadoPagoClient {
    #[tracing::instrument]
    pub fn new(settings: &GatewaySettings) -> Self {
        tracing::info!("Establishing connection to the MercadoPago gateway.");
        let http_client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .expect("Failed to build gateway HTTP client");
        Self {
            http_client,
            base_url: settings.base_url.to_string(),
            retry: settings.retry.clone(),
        }
    }

    fn get_auth_token(&self, credentials: &GatewayCredentials) -> String {
        format!("Bearer {}", credentials.access_token.expose_secret())
    }

    /// Sends the request with bounded retries and doubling backoff. Only
    /// transport errors and 5xx responses are retried; a 4xx is the
    /// gateway's final answer.
    async fn send_with_retry(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, anyhow::Error> {
        let mut delay = Duration::from_millis(self.retry.base_delay_ms);
        let mut attempt = 1;
        loop {
            let response = match request
                .try_clone()
                .ok_or_else(|| anyhow::anyhow!("Gateway request body is not cloneable"))?
                .send()
                .await
            {
                Ok(response) if !response.status().is_server_error() => return Ok(response),
                Ok(response) => Err(anyhow::anyhow!(
                    "Gateway responded with status {}",
                    response.status()
                )),
                Err(e) => Err(anyhow::Error::from(e)),
            };
            if attempt >= self.retry.max_attempts {
                return response.map_err(|e| {
                    e.context(format!("Gateway unavailable after {} attempts", attempt))
                });
            }
            let jitter = rand::rng().random_range(0..=self.retry.base_delay_ms / 2 + 1);
            tracing::warn!(
                "Gateway call failed on attempt {}, retrying in {:?}.",
                attempt,
                delay
            );
            tokio::time::sleep(delay + Duration::from_millis(jitter)).await;
            delay *= 2;
            attempt += 1;
        }
    }
}

#[async_trait]
impl GenericPaymentGateway for MercadoPagoClient {
    #[tracing::instrument(skip(self, credentials))]
    async fn create_preference(
        &self,
        credentials: &GatewayCredentials,
        request: &PreferenceCreateRequest,
    ) -> Result<PreferenceResult, anyhow::Error> {
        let url = format!("{}/checkout/preferences", self.base_url);
        let response = self
            .send_with_retry(
                self.http_client
                    .post(&url)
                    .header("Authorization", self.get_auth_token(credentials))
                    .json(request),
            )
            .await?;

        let status = response.status().as_u16();
        let raw: Value = response
            .json()
            .await
            .map_err(|err| anyhow::anyhow!("Failed to parse preference response: {}", err))?;
        Ok(PreferenceResult {
            status,
            id: raw.get("id").and_then(value_as_id),
            collector_id: raw.get("collector_id").and_then(value_as_id),
            init_point: raw
                .get("init_point")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            sandbox_init_point: raw
                .get("sandbox_init_point")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            raw,
        })
    }

    #[tracing::instrument(skip(self, credentials))]
    async fn get_payment(
        &self,
        credentials: &GatewayCredentials,
        payment_id: &str,
    ) -> Result<GatewayPayment, anyhow::Error> {
        let url = format!("{}/v1/payments/{}", self.base_url, payment_id);
        let response = self
            .send_with_retry(
                self.http_client
                    .get(&url)
                    .header("Authorization", self.get_auth_token(credentials)),
            )
            .await?;
        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Gateway payment lookup for {} failed with status {}",
                payment_id,
                response.status()
            ));
        }
        let raw: Value = response
            .json()
            .await
            .map_err(|err| anyhow::anyhow!("Failed to parse payment response: {}", err))?;
        GatewayPayment::from_value(raw)
    }

    #[tracing::instrument(skip(self, credentials))]
    async fn get_refund(
        &self,
        credentials: &GatewayCredentials,
        refund_id: &str,
    ) -> Result<GatewayRefund, anyhow::Error> {
        let url = format!("{}/v1/refunds/{}", self.base_url, refund_id);
        let response = self
            .send_with_retry(
                self.http_client
                    .get(&url)
                    .header("Authorization", self.get_auth_token(credentials)),
            )
            .await?;
        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Gateway refund lookup for {} failed with status {}",
                refund_id,
                response.status()
            ));
        }
        let raw: Value = response
            .json()
            .await
            .map_err(|err| anyhow::anyhow!("Failed to parse refund response: {}", err))?;
        GatewayRefund::from_value(raw)
    }
}
