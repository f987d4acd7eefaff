use crate::schemas::CurrencyType;

pub const PROVIDER_IDENTIFIER: &str = "mercadopago";
pub const PROVIDER_DISPLAY_NAME: &str = "MercadoPago";

// ARS Peso argentino.
// BRL Real brasilero.
// CLP Peso chileno.
// COP Peso colombiano.
// PEN Sol peruano.
// UYU Peso uruguayo.
pub const SUPPORTED_CURRENCIES: [CurrencyType; 6] = [
    CurrencyType::Ars,
    CurrencyType::Brl,
    CurrencyType::Clp,
    CurrencyType::Cop,
    CurrencyType::Pen,
    CurrencyType::Uyu,
];

// Supported as a payment and balance currency for in-country accounts only.
pub const LOCAL_ONLY_CURRENCIES: [CurrencyType; 1] = [CurrencyType::Ars];
