use crate::constants::{LOCAL_ONLY_CURRENCIES, SUPPORTED_CURRENCIES};
use crate::schemas::{CurrencyType, PaymentGatewayEndpoint};

/// The provider is only offered for events settling in a currency the
/// gateway can process.
pub fn is_allowed(currency: CurrencyType) -> bool {
    SUPPORTED_CURRENCIES.contains(&currency)
}

pub fn test_mode_message(endpoint: PaymentGatewayEndpoint) -> Option<String> {
    if endpoint.is_sandbox() {
        Some(
            "The MercadoPago sandbox is being used, you can test without actually \
             sending money but you will need a MercadoPago sandbox user to log in."
                .to_string(),
        )
    } else {
        None
    }
}

pub fn currency_warnings(currency: CurrencyType) -> Vec<String> {
    let mut warnings = Vec::new();
    if !SUPPORTED_CURRENCIES.contains(&currency) {
        warnings.push(format!(
            "MercadoPago does not process payments in {}.",
            currency
        ));
    }
    if LOCAL_ONLY_CURRENCIES.contains(&currency) {
        warnings.push(format!(
            "{} is supported as a payment and balance currency for in-country \
             accounts only. The receiving as well as the sending MercadoPago account \
             must have been created in the same country and use the same currency.",
            currency
        ));
    }
    warnings
}
