#[cfg(test)]
mod tests {
    use crate::routes::provider::utils::{currency_warnings, is_allowed, test_mode_message};
    use crate::schemas::{CurrencyType, PaymentGatewayEndpoint};

    #[test]
    fn test_supported_currencies_are_allowed() {
        assert!(is_allowed(CurrencyType::Ars));
        assert!(is_allowed(CurrencyType::Brl));
        assert!(is_allowed(CurrencyType::Uyu));
    }

    #[test]
    fn test_mxn_is_not_allowed() {
        assert!(!is_allowed(CurrencyType::Mxn));
    }

    #[test]
    fn test_sandbox_mode_has_a_notice() {
        assert!(test_mode_message(PaymentGatewayEndpoint::Sandbox).is_some());
        assert!(test_mode_message(PaymentGatewayEndpoint::Live).is_none());
    }

    #[test]
    fn test_local_only_currency_is_flagged() {
        let warnings = currency_warnings(CurrencyType::Ars);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("in-country"));

        assert!(currency_warnings(CurrencyType::Brl).is_empty());

        // unsupported currency gets the unsupported warning
        let warnings = currency_warnings(CurrencyType::Mxn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("does not process payments"));
    }
}
