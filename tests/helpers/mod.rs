use async_trait::async_trait;
use bigdecimal::BigDecimal;
use once_cell::sync::Lazy;
use secrecy::SecretString;
use serde_json::Value;
use std::collections::HashMap;
use std::net::TcpListener;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use mercadopago_ticketing_bridge::configuration::{
    ApplicationSettings, SecretSetting, TicketingSettings,
};
use mercadopago_ticketing_bridge::mercadopago_client::{
    GatewayCredentials, GatewayPayment, GatewayRefund, GenericPaymentGateway,
    PreferenceCreateRequest, PreferenceResult,
};
use mercadopago_ticketing_bridge::schemas::{CurrencyType, PaymentGatewayEndpoint};
use mercadopago_ticketing_bridge::startup::run;
use mercadopago_ticketing_bridge::telemetry::{get_json_subscriber, init_subscriber};
use mercadopago_ticketing_bridge::ticketing_client::{
    EventPaymentSettings, GenericTicketingService, Order, OrderPayment, OrderRefund, OrderStatus,
    PaymentState, ReferenceRecord, RefundSource, RefundState, TicketingError,
};

pub const SERVICE_TOKEN: &str = "test-service-token";

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber =
            get_json_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_json_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub fn amount(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

#[derive(Default)]
pub struct FakeTicketingService {
    pub orders: Mutex<HashMap<(String, String), Order>>,
    pub payments: Mutex<HashMap<Uuid, OrderPayment>>,
    pub refunds: Mutex<Vec<OrderRefund>>,
    pub references: Mutex<Vec<ReferenceRecord>>,
    pub settings: Mutex<HashMap<String, EventPaymentSettings>>,
    pub actions: Mutex<Vec<(String, String, String)>>,
    pub quota_full: Mutex<bool>,
}

impl FakeTicketingService {
    pub fn payment_state(&self, payment_id: Uuid) -> PaymentState {
        self.payments.lock().unwrap()[&payment_id].state
    }

    pub fn stored_info(&self, payment_id: Uuid) -> Value {
        self.payments.lock().unwrap()[&payment_id].info.clone()
    }

    fn transition(
        &self,
        payment_id: Uuid,
        state: Option<PaymentState>,
        info: &Value,
    ) -> Result<(), TicketingError> {
        let mut payments = self.payments.lock().unwrap();
        let payment = payments
            .get_mut(&payment_id)
            .ok_or_else(|| TicketingError::NotFound("Payment not found".to_string()))?;
        if let Some(state) = state {
            payment.state = state;
        }
        if !info.is_null() {
            payment.info = info.clone();
        }
        Ok(())
    }
}

#[async_trait]
impl GenericTicketingService for FakeTicketingService {
    async fn get_order(&self, event: &str, order_code: &str) -> Result<Order, TicketingError> {
        self.orders
            .lock()
            .unwrap()
            .get(&(event.to_string(), order_code.to_string()))
            .cloned()
            .ok_or_else(|| TicketingError::NotFound("Order not found".to_string()))
    }

    async fn get_payment(&self, payment_id: Uuid) -> Result<OrderPayment, TicketingError> {
        self.payments
            .lock()
            .unwrap()
            .get(&payment_id)
            .cloned()
            .ok_or_else(|| TicketingError::NotFound("Payment not found".to_string()))
    }

    async fn update_payment_info(
        &self,
        payment_id: Uuid,
        info: &Value,
    ) -> Result<(), TicketingError> {
        self.transition(payment_id, None, info)
    }

    async fn confirm_payment(
        &self,
        payment_id: Uuid,
        info: &Value,
    ) -> Result<(), TicketingError> {
        if *self.quota_full.lock().unwrap() {
            return Err(TicketingError::QuotaExceeded(
                "The event sold out in the meantime".to_string(),
            ));
        }
        self.transition(payment_id, Some(PaymentState::Confirmed), info)
    }

    async fn pend_payment(&self, payment_id: Uuid, info: &Value) -> Result<(), TicketingError> {
        self.transition(payment_id, Some(PaymentState::Pending), info)
    }

    async fn fail_payment(
        &self,
        payment_id: Uuid,
        _reason: &str,
        info: &Value,
    ) -> Result<(), TicketingError> {
        self.transition(payment_id, Some(PaymentState::Failed), info)
    }

    async fn mark_payment_refunded(
        &self,
        payment_id: Uuid,
        info: &Value,
    ) -> Result<(), TicketingError> {
        self.transition(payment_id, Some(PaymentState::Refunded), info)
    }

    async fn list_refunds(&self, payment_id: Uuid) -> Result<Vec<OrderRefund>, TicketingError> {
        Ok(self
            .refunds
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.payment_id == payment_id)
            .cloned()
            .collect())
    }

    async fn create_external_refund(
        &self,
        payment_id: Uuid,
        amount: &BigDecimal,
        info: Option<&Value>,
    ) -> Result<OrderRefund, TicketingError> {
        let refund = OrderRefund {
            id: Uuid::new_v4(),
            payment_id,
            state: RefundState::Done,
            amount: amount.clone(),
            source: RefundSource::External,
            info: info.cloned().unwrap_or(Value::Null),
        };
        self.refunds.lock().unwrap().push(refund.clone());
        Ok(refund)
    }

    async fn mark_refund_done(&self, refund_id: Uuid) -> Result<(), TicketingError> {
        let mut refunds = self.refunds.lock().unwrap();
        let refund = refunds
            .iter_mut()
            .find(|r| r.id == refund_id)
            .ok_or_else(|| TicketingError::NotFound("Refund not found".to_string()))?;
        refund.state = RefundState::Done;
        Ok(())
    }

    async fn save_reference(&self, record: &ReferenceRecord) -> Result<(), TicketingError> {
        let mut references = self.references.lock().unwrap();
        references.retain(|r| r.reference != record.reference);
        references.push(record.clone());
        Ok(())
    }

    async fn lookup_reference(
        &self,
        references: &[String],
    ) -> Result<Option<ReferenceRecord>, TicketingError> {
        Ok(self
            .references
            .lock()
            .unwrap()
            .iter()
            .find(|r| references.contains(&r.reference))
            .cloned())
    }

    async fn list_provider_payments(
        &self,
        event: &str,
        provider: &str,
    ) -> Result<Vec<OrderPayment>, TicketingError> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.event == event && p.provider == provider)
            .cloned()
            .collect())
    }

    async fn get_payment_settings(
        &self,
        event: &str,
    ) -> Result<EventPaymentSettings, TicketingError> {
        self.settings
            .lock()
            .unwrap()
            .get(event)
            .cloned()
            .ok_or_else(|| {
                TicketingError::NotFound("Payment settings not configured".to_string())
            })
    }

    async fn log_action(
        &self,
        event: &str,
        order_code: &str,
        action: &str,
        _data: &Value,
    ) -> Result<(), TicketingError> {
        self.actions.lock().unwrap().push((
            event.to_string(),
            order_code.to_string(),
            action.to_string(),
        ));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePaymentGateway {
    pub preference_result: Mutex<Option<PreferenceResult>>,
    pub payments: Mutex<HashMap<String, GatewayPayment>>,
    pub refunds: Mutex<HashMap<String, GatewayRefund>>,
    pub preference_requests: Mutex<Vec<Value>>,
    pub fail_lookups: Mutex<bool>,
}

#[async_trait]
impl GenericPaymentGateway for FakePaymentGateway {
    async fn create_preference(
        &self,
        _credentials: &GatewayCredentials,
        request: &PreferenceCreateRequest,
    ) -> Result<PreferenceResult, anyhow::Error> {
        self.preference_requests
            .lock()
            .unwrap()
            .push(serde_json::to_value(request)?);
        self.preference_result
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("No preference result configured"))
    }

    async fn get_payment(
        &self,
        _credentials: &GatewayCredentials,
        payment_id: &str,
    ) -> Result<GatewayPayment, anyhow::Error> {
        if *self.fail_lookups.lock().unwrap() {
            return Err(anyhow::anyhow!("Gateway unavailable"));
        }
        self.payments
            .lock()
            .unwrap()
            .get(payment_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Gateway payment lookup for {} failed", payment_id))
    }

    async fn get_refund(
        &self,
        _credentials: &GatewayCredentials,
        refund_id: &str,
    ) -> Result<GatewayRefund, anyhow::Error> {
        if *self.fail_lookups.lock().unwrap() {
            return Err(anyhow::anyhow!("Gateway unavailable"));
        }
        self.refunds
            .lock()
            .unwrap()
            .get(refund_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Gateway refund lookup for {} failed", refund_id))
    }
}

pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub ticketing: Arc<FakeTicketingService>,
    pub gateway: Arc<FakePaymentGateway>,
}

impl TestApp {
    pub fn seed_event(&self, event: &str) {
        self.ticketing.settings.lock().unwrap().insert(
            event.to_string(),
            EventPaymentSettings {
                access_token: SecretString::from("TEST-access-token"),
                endpoint: PaymentGatewayEndpoint::Live,
                settlement_currency: CurrencyType::Ars,
                exchange_rate: amount("1.00"),
            },
        );
    }

    pub fn seed_order(&self, event: &str, code: &str, total: &str) -> OrderPayment {
        self.ticketing.orders.lock().unwrap().insert(
            (event.to_string(), code.to_string()),
            Order {
                code: code.to_string(),
                secret: "z3tl6".to_string(),
                status: OrderStatus::Pending,
                total: amount(total),
                currency: CurrencyType::Ars,
                event: event.to_string(),
            },
        );
        let payment = OrderPayment {
            id: Uuid::new_v4(),
            order_code: code.to_string(),
            event: event.to_string(),
            state: PaymentState::Created,
            amount: amount(total),
            info: Value::Null,
            provider: "mercadopago".to_string(),
        };
        self.ticketing
            .payments
            .lock()
            .unwrap()
            .insert(payment.id, payment.clone());
        payment
    }

    pub async fn post_webhook(&self, body: &Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}/webhook/mercadopago", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_event_webhook(&self, event: &str, body: &Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}/webhook/{}/mercadopago", self.address, event))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let ticketing = Arc::new(FakeTicketingService::default());
    let gateway = Arc::new(FakePaymentGateway::default());
    let secret = SecretSetting {
        service_token: SecretString::from(SERVICE_TOKEN),
    };
    let application_setting = ApplicationSettings {
        host: "127.0.0.1".to_string(),
        port,
        public_base_url: address.to_string(),
    };
    let ticketing_setting = TicketingSettings {
        base_url: "http://127.0.0.1:0".to_string(),
        presale_base_url: "https://tickets.example.com".to_string(),
        service_token: SecretString::from(SERVICE_TOKEN),
        timeout_ms: 1000,
    };

    let server = run(
        listener,
        gateway.clone() as Arc<dyn GenericPaymentGateway>,
        ticketing.clone() as Arc<dyn GenericTicketingService>,
        secret,
        application_setting,
        ticketing_setting,
    )
    .await
    .expect("Failed to start test application");
    tokio::spawn(server);

    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        address,
        api_client,
        ticketing,
        gateway,
    }
}
