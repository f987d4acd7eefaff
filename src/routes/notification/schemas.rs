use serde::Deserialize;
use serde_json::Value;

use crate::utils::value_as_id;

/// Gateway webhook body. Identifiers arrive as numbers or strings
/// depending on the resource age, so they are kept raw until read.
#[derive(Debug, Deserialize)]
pub struct WebhookNotification {
    pub resource_type: String,
    pub resource: WebhookResource,
}

#[derive(Debug, Deserialize)]
pub struct WebhookResource {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub sale_id: Value,
    #[serde(default)]
    pub parent_payment: Value,
}

impl WebhookResource {
    pub fn id(&self) -> Option<String> {
        value_as_id(&self.id)
    }

    pub fn sale_id(&self) -> Option<String> {
        value_as_id(&self.sale_id)
    }

    pub fn parent_payment(&self) -> Option<String> {
        value_as_id(&self.parent_payment)
    }
}

impl WebhookNotification {
    pub fn is_refund(&self) -> bool {
        self.resource_type == "refund"
    }

    /// The sale this notification is about: the resource itself, or for a
    /// refund resource its parent sale.
    pub fn sale_identifier(&self) -> Option<String> {
        if self.is_refund() {
            self.resource.sale_id()
        } else {
            self.resource.id()
        }
    }

    /// Identifiers usable for reference-record correlation, most specific
    /// first.
    pub fn correlation_refs(&self) -> Vec<String> {
        let mut refs = Vec::new();
        if let Some(sale_id) = self.sale_identifier() {
            refs.push(sale_id);
        }
        if let Some(parent) = self.resource.parent_payment() {
            refs.push(parent);
        }
        refs
    }
}

/// Query parameters the gateway appends to the browser return redirect.
/// Never trusted for state decisions, only for correlation and tamper
/// detection. The gateway also sends a merchant_order_id, which has no use
/// here and is left unparsed.
#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
    pub collection_id: Option<String>,
    pub collection_status: Option<String>,
    pub preference_id: Option<String>,
    pub external_reference: Option<String>,
}
