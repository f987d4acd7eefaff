use async_trait::async_trait;
use bigdecimal::BigDecimal;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::configuration::TicketingSettings;
use crate::mercadopago_client::GatewayCredentials;
use crate::schemas::{CurrencyType, GenericResponse, PaymentGatewayEndpoint};
use crate::utils::error_chain_fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Canceled,
    Expired,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Created,
    Pending,
    Confirmed,
    Canceled,
    Failed,
    Refunded,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefundState {
    Created,
    Transit,
    Done,
    Canceled,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefundSource {
    Internal,
    External,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    pub code: String,
    pub secret: String,
    pub status: OrderStatus,
    pub total: BigDecimal,
    pub currency: CurrencyType,
    pub event: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderPayment {
    pub id: Uuid,
    pub order_code: String,
    pub event: String,
    pub state: PaymentState,
    pub amount: BigDecimal,
    /// Last-known gateway response, stored as serialized structured data.
    pub info: Value,
    pub provider: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderRefund {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub state: RefundState,
    pub amount: BigDecimal,
    pub source: RefundSource,
    pub info: Value,
}

impl OrderRefund {
    /// Gateway-side refund id this record was created from, if any.
    pub fn gateway_refund_id(&self) -> Option<String> {
        match self.info.get("id") {
            Some(Value::String(s)) => Some(s.to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Durable mapping from a gateway-side transaction identifier to a local
/// payment. Created at preference-creation time, read by the webhook
/// handler, never mutated.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReferenceRecord {
    pub reference: String,
    pub event: String,
    pub order_code: String,
    pub payment_id: Uuid,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventPaymentSettings {
    pub access_token: SecretString,
    pub endpoint: PaymentGatewayEndpoint,
    pub settlement_currency: CurrencyType,
    pub exchange_rate: BigDecimal,
}

impl EventPaymentSettings {
    pub fn gateway_credentials(&self) -> GatewayCredentials {
        GatewayCredentials {
            access_token: self.access_token.clone(),
        }
    }
}

#[derive(thiserror::Error)]
pub enum TicketingError {
    #[error("{0}")]
    QuotaExceeded(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for TicketingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Host-platform collaborator surface. The order, payment, refund and
/// reference entities are owned entirely by the host; this service only
/// drives their state transitions.
#[async_trait]
pub trait GenericTicketingService: Send + Sync {
    async fn get_order(&self, event: &str, order_code: &str) -> Result<Order, TicketingError>;

    async fn get_payment(&self, payment_id: Uuid) -> Result<OrderPayment, TicketingError>;

    async fn update_payment_info(
        &self,
        payment_id: Uuid,
        info: &Value,
    ) -> Result<(), TicketingError>;

    /// Marks the order paid. The host enforces capacity checks here; a
    /// quota failure is surfaced as `TicketingError::QuotaExceeded`.
    async fn confirm_payment(&self, payment_id: Uuid, info: &Value)
        -> Result<(), TicketingError>;

    async fn pend_payment(&self, payment_id: Uuid, info: &Value) -> Result<(), TicketingError>;

    async fn fail_payment(
        &self,
        payment_id: Uuid,
        reason: &str,
        info: &Value,
    ) -> Result<(), TicketingError>;

    async fn mark_payment_refunded(
        &self,
        payment_id: Uuid,
        info: &Value,
    ) -> Result<(), TicketingError>;

    async fn list_refunds(&self, payment_id: Uuid) -> Result<Vec<OrderRefund>, TicketingError>;

    async fn create_external_refund(
        &self,
        payment_id: Uuid,
        amount: &BigDecimal,
        info: Option<&Value>,
    ) -> Result<OrderRefund, TicketingError>;

    async fn mark_refund_done(&self, refund_id: Uuid) -> Result<(), TicketingError>;

    async fn save_reference(&self, record: &ReferenceRecord) -> Result<(), TicketingError>;

    async fn lookup_reference(
        &self,
        references: &[String],
    ) -> Result<Option<ReferenceRecord>, TicketingError>;

    /// All payments of an event for a given provider. Only used by the
    /// degraded-mode webhook correlation when the reference table misses.
    async fn list_provider_payments(
        &self,
        event: &str,
        provider: &str,
    ) -> Result<Vec<OrderPayment>, TicketingError>;

    async fn get_payment_settings(
        &self,
        event: &str,
    ) -> Result<EventPaymentSettings, TicketingError>;

    async fn log_action(
        &self,
        event: &str,
        order_code: &str,
        action: &str,
        data: &Value,
    ) -> Result<(), TicketingError>;
}

#[derive(Debug)]
pub struct TicketingClient {
    http_client: Client,
    base_url: String,
    service_token: SecretString,
}

#[derive(Debug, Serialize)]
struct PaymentTransitionRequest<'a> {
    info: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ExternalRefundCreateRequest<'a> {
    amount: &'a BigDecimal,
    source: RefundSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    info: Option<&'a Value>,
}

#[derive(Debug, Serialize)]
struct ReferenceLookupRequest<'a> {
    references: &'a [String],
}

#[derive(Debug, Serialize)]
struct LogActionRequest<'a> {
    action: &'a str,
    data: &'a Value,
}

impl TicketingClient {
    #[tracing::instrument]
    pub fn new(settings: &TicketingSettings) -> Self {
        tracing::info!("Establishing connection to the ticketing platform.");
        let http_client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .expect("Failed to build ticketing HTTP client");
        Self {
            http_client,
            base_url: settings.base_url.to_string(),
            service_token: settings.service_token.clone(),
        }
    }

    fn get_auth_token(&self) -> String {
        format!("Bearer {}", self.service_token.expose_secret())
    }

    async fn parse_response<D: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        context: &str,
    ) -> Result<D, TicketingError> {
        let status = response.status();
        let response_body: GenericResponse<D> = response
            .json()
            .await
            .map_err(|err| anyhow::anyhow!("Failed to parse {} response: {}", context, err))?;
        if status.is_success() {
            response_body
                .data
                .ok_or_else(|| anyhow::anyhow!("{} response has no data", context).into())
        } else if status == StatusCode::CONFLICT {
            Err(TicketingError::QuotaExceeded(
                response_body.customer_message,
            ))
        } else if status == StatusCode::NOT_FOUND {
            Err(TicketingError::NotFound(response_body.customer_message))
        } else {
            Err(anyhow::anyhow!(
                "{} failed with status {}: {}",
                context,
                status,
                response_body.customer_message
            )
            .into())
        }
    }

    /// Unit responses from the host carry no data payload.
    async fn parse_unit_response(
        &self,
        response: reqwest::Response,
        context: &str,
    ) -> Result<(), TicketingError> {
        let status = response.status();
        let response_body: GenericResponse<Value> = response
            .json()
            .await
            .map_err(|err| anyhow::anyhow!("Failed to parse {} response: {}", context, err))?;
        if status.is_success() {
            Ok(())
        } else if status == StatusCode::CONFLICT {
            Err(TicketingError::QuotaExceeded(
                response_body.customer_message,
            ))
        } else if status == StatusCode::NOT_FOUND {
            Err(TicketingError::NotFound(response_body.customer_message))
        } else {
            Err(anyhow::anyhow!(
                "{} failed with status {}: {}",
                context,
                status,
                response_body.customer_message
            )
            .into())
        }
    }

    async fn payment_transition(
        &self,
        payment_id: Uuid,
        transition: &str,
        body: &PaymentTransitionRequest<'_>,
    ) -> Result<(), TicketingError> {
        let url = format!("{}/payments/{}/{}", self.base_url, payment_id, transition);
        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.get_auth_token())
            .json(body)
            .send()
            .await
            .map_err(|err| anyhow::anyhow!("Payment {} call failed: {}", transition, err))?;
        self.parse_unit_response(response, transition).await
    }
}

#[async_trait]
impl GenericTicketingService for TicketingClient {
    #[tracing::instrument(skip(self))]
    async fn get_order(&self, event: &str, order_code: &str) -> Result<Order, TicketingError> {
        let url = format!("{}/events/{}/orders/{}", self.base_url, event, order_code);
        let response = self
            .http_client
            .get(&url)
            .header("Authorization", self.get_auth_token())
            .send()
            .await
            .map_err(|err| anyhow::anyhow!("Order fetch failed: {}", err))?;
        self.parse_response(response, "order fetch").await
    }

    #[tracing::instrument(skip(self))]
    async fn get_payment(&self, payment_id: Uuid) -> Result<OrderPayment, TicketingError> {
        let url = format!("{}/payments/{}", self.base_url, payment_id);
        let response = self
            .http_client
            .get(&url)
            .header("Authorization", self.get_auth_token())
            .send()
            .await
            .map_err(|err| anyhow::anyhow!("Payment fetch failed: {}", err))?;
        self.parse_response(response, "payment fetch").await
    }

    #[tracing::instrument(skip(self, info))]
    async fn update_payment_info(
        &self,
        payment_id: Uuid,
        info: &Value,
    ) -> Result<(), TicketingError> {
        self.payment_transition(
            payment_id,
            "info",
            &PaymentTransitionRequest { info, reason: None },
        )
        .await
    }

    #[tracing::instrument(skip(self, info))]
    async fn confirm_payment(
        &self,
        payment_id: Uuid,
        info: &Value,
    ) -> Result<(), TicketingError> {
        self.payment_transition(
            payment_id,
            "confirm",
            &PaymentTransitionRequest { info, reason: None },
        )
        .await
    }

    #[tracing::instrument(skip(self, info))]
    async fn pend_payment(&self, payment_id: Uuid, info: &Value) -> Result<(), TicketingError> {
        self.payment_transition(
            payment_id,
            "pend",
            &PaymentTransitionRequest { info, reason: None },
        )
        .await
    }

    #[tracing::instrument(skip(self, info))]
    async fn fail_payment(
        &self,
        payment_id: Uuid,
        reason: &str,
        info: &Value,
    ) -> Result<(), TicketingError> {
        self.payment_transition(
            payment_id,
            "fail",
            &PaymentTransitionRequest {
                info,
                reason: Some(reason),
            },
        )
        .await
    }

    #[tracing::instrument(skip(self, info))]
    async fn mark_payment_refunded(
        &self,
        payment_id: Uuid,
        info: &Value,
    ) -> Result<(), TicketingError> {
        self.payment_transition(
            payment_id,
            "refund",
            &PaymentTransitionRequest { info, reason: None },
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn list_refunds(&self, payment_id: Uuid) -> Result<Vec<OrderRefund>, TicketingError> {
        let url = format!("{}/payments/{}/refunds", self.base_url, payment_id);
        let response = self
            .http_client
            .get(&url)
            .header("Authorization", self.get_auth_token())
            .send()
            .await
            .map_err(|err| anyhow::anyhow!("Refund list failed: {}", err))?;
        self.parse_response(response, "refund list").await
    }

    #[tracing::instrument(skip(self, info))]
    async fn create_external_refund(
        &self,
        payment_id: Uuid,
        amount: &BigDecimal,
        info: Option<&Value>,
    ) -> Result<OrderRefund, TicketingError> {
        let url = format!("{}/payments/{}/refunds/external", self.base_url, payment_id);
        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.get_auth_token())
            .json(&ExternalRefundCreateRequest {
                amount,
                source: RefundSource::External,
                info,
            })
            .send()
            .await
            .map_err(|err| anyhow::anyhow!("External refund create failed: {}", err))?;
        self.parse_response(response, "external refund create").await
    }

    #[tracing::instrument(skip(self))]
    async fn mark_refund_done(&self, refund_id: Uuid) -> Result<(), TicketingError> {
        let url = format!("{}/refunds/{}/done", self.base_url, refund_id);
        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.get_auth_token())
            .send()
            .await
            .map_err(|err| anyhow::anyhow!("Refund done call failed: {}", err))?;
        self.parse_unit_response(response, "refund done").await
    }

    #[tracing::instrument(skip(self))]
    async fn save_reference(&self, record: &ReferenceRecord) -> Result<(), TicketingError> {
        let url = format!("{}/references", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.get_auth_token())
            .json(record)
            .send()
            .await
            .map_err(|err| anyhow::anyhow!("Reference save failed: {}", err))?;
        self.parse_unit_response(response, "reference save").await
    }

    #[tracing::instrument(skip(self))]
    async fn lookup_reference(
        &self,
        references: &[String],
    ) -> Result<Option<ReferenceRecord>, TicketingError> {
        let url = format!("{}/references/lookup", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.get_auth_token())
            .json(&ReferenceLookupRequest { references })
            .send()
            .await
            .map_err(|err| anyhow::anyhow!("Reference lookup failed: {}", err))?;
        match self.parse_response(response, "reference lookup").await {
            Ok(record) => Ok(Some(record)),
            Err(TicketingError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn list_provider_payments(
        &self,
        event: &str,
        provider: &str,
    ) -> Result<Vec<OrderPayment>, TicketingError> {
        let url = format!(
            "{}/events/{}/payments?provider={}",
            self.base_url, event, provider
        );
        let response = self
            .http_client
            .get(&url)
            .header("Authorization", self.get_auth_token())
            .send()
            .await
            .map_err(|err| anyhow::anyhow!("Provider payment scan failed: {}", err))?;
        self.parse_response(response, "provider payment scan").await
    }

    #[tracing::instrument(skip(self))]
    async fn get_payment_settings(
        &self,
        event: &str,
    ) -> Result<EventPaymentSettings, TicketingError> {
        let url = format!(
            "{}/events/{}/settings/payment/mercadopago",
            self.base_url, event
        );
        let response = self
            .http_client
            .get(&url)
            .header("Authorization", self.get_auth_token())
            .send()
            .await
            .map_err(|err| anyhow::anyhow!("Payment settings fetch failed: {}", err))?;
        self.parse_response(response, "payment settings fetch").await
    }

    #[tracing::instrument(skip(self, data))]
    async fn log_action(
        &self,
        event: &str,
        order_code: &str,
        action: &str,
        data: &Value,
    ) -> Result<(), TicketingError> {
        let url = format!(
            "{}/events/{}/orders/{}/log",
            self.base_url, event, order_code
        );
        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.get_auth_token())
            .json(&LogActionRequest { action, data })
            .send()
            .await
            .map_err(|err| anyhow::anyhow!("Audit log append failed: {}", err))?;
        self.parse_unit_response(response, "audit log append").await
    }
}
