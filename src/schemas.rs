use crate::utils::fmt_json;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;
use utoipa::ToSchema;

macro_rules! impl_serialize_format {
    ($struct_name:ident, $trait_name:path) => {
        impl $trait_name for $struct_name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt_json(self, f)
            }
        }
    };
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct GenericResponse<D> {
    pub status: bool,
    pub customer_message: String,
    pub code: String,
    pub data: Option<D>,
}

impl<D> GenericResponse<D> {
    pub fn success(message: &str, data: Option<D>) -> Self {
        Self {
            status: true,
            customer_message: String::from(message),
            code: String::from("200"),
            data,
        }
    }

    pub fn error(message: &str, code: &str, data: Option<D>) -> Self {
        Self {
            status: false,
            customer_message: String::from(message),
            code: String::from(code),
            data,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyType {
    Ars,
    Brl,
    Clp,
    Cop,
    Mxn,
    Pen,
    Uyu,
}

impl Display for CurrencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CurrencyType::Ars => "ARS",
            CurrencyType::Brl => "BRL",
            CurrencyType::Clp => "CLP",
            CurrencyType::Cop => "COP",
            CurrencyType::Mxn => "MXN",
            CurrencyType::Pen => "PEN",
            CurrencyType::Uyu => "UYU",
        };
        write!(f, "{}", s)
    }
}

/// Endpoint mode configured per event: the sandbox variant of the redirect
/// URL is only valid against the sandbox endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentGatewayEndpoint {
    Live,
    Sandbox,
}

impl PaymentGatewayEndpoint {
    pub fn is_sandbox(&self) -> bool {
        matches!(self, PaymentGatewayEndpoint::Sandbox)
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub detail: String,
}

impl_serialize_format!(WebhookAck, Display);
