#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::configuration::ApplicationSettings;
    use crate::mercadopago_client::PreferenceResult;
    use crate::routes::checkout::utils::{
        build_preference_request, extract_payment_details, extract_sale_id,
        interpret_preference_result, settlement_amount, shred_info,
    };
    use crate::schemas::{CurrencyType, PaymentGatewayEndpoint};
    use crate::tests::{amount, sample_order, sample_payment, sample_settings};
    use crate::ticketing_client::PaymentState;

    fn application_settings() -> ApplicationSettings {
        ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 8026,
            public_base_url: "https://pay.example.com/".to_string(),
        }
    }

    #[test]
    fn test_same_currency_order_is_charged_at_face_value() {
        let order = sample_order("democon", "F8VVL", "1000", CurrencyType::Ars);
        let settings = sample_settings(PaymentGatewayEndpoint::Live, CurrencyType::Ars, "1.00");
        assert_eq!(settlement_amount(&order, &settings), amount("1000.00"));
    }

    #[test]
    fn test_foreign_currency_order_is_converted_at_the_configured_rate() {
        let order = sample_order("democon", "F8VVL", "23.00", CurrencyType::Brl);
        let settings = sample_settings(PaymentGatewayEndpoint::Live, CurrencyType::Ars, "61.37");
        // 23.00 * 61.37 = 1411.51
        assert_eq!(settlement_amount(&order, &settings), amount("1411.51"));
    }

    #[test]
    fn test_conversion_rounds_half_up_to_cents() {
        let order = sample_order("democon", "F8VVL", "10.01", CurrencyType::Brl);
        let settings = sample_settings(PaymentGatewayEndpoint::Live, CurrencyType::Ars, "0.125");
        // 10.01 * 0.125 = 1.25125 -> 1.25
        assert_eq!(settlement_amount(&order, &settings), amount("1.25"));
    }

    #[test]
    fn test_preference_request_carries_the_correlation_key_and_urls() {
        let order = sample_order("democon", "F8VVL", "1000", CurrencyType::Ars);
        let payment = sample_payment("democon", "F8VVL", PaymentState::Created, "1000.00");
        let settings = sample_settings(PaymentGatewayEndpoint::Live, CurrencyType::Ars, "1.00");

        let request = build_preference_request(&order, &payment, &settings, &application_settings());

        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].title, "Order DEMOCON-F8VVL");
        assert_eq!(request.items[0].quantity, 1);
        assert_eq!(request.items[0].unit_price, amount("1000.00"));
        assert_eq!(
            request.back_urls.success,
            "https://pay.example.com/return/democon/success"
        );
        assert_eq!(
            request.back_urls.failure,
            "https://pay.example.com/return/democon/abort"
        );
        assert_eq!(
            request.notification_url,
            "https://pay.example.com/webhook/democon/mercadopago"
        );
        assert_eq!(request.external_reference, payment.id.to_string());
    }

    fn preference_result(status: u16) -> PreferenceResult {
        PreferenceResult {
            status,
            id: Some("127220657-e0de8f56".to_string()),
            collector_id: Some("127220657".to_string()),
            init_point: Some("https://www.mercadopago.com/init".to_string()),
            sandbox_init_point: Some("https://sandbox.mercadopago.com/init".to_string()),
            raw: json!({}),
        }
    }

    #[test]
    fn test_preference_redirect_follows_the_endpoint_mode() {
        let result = preference_result(201);
        assert_eq!(
            interpret_preference_result(&result, PaymentGatewayEndpoint::Live).unwrap(),
            "https://www.mercadopago.com/init"
        );
        assert_eq!(
            interpret_preference_result(&result, PaymentGatewayEndpoint::Sandbox).unwrap(),
            "https://sandbox.mercadopago.com/init"
        );
    }

    #[test]
    fn test_preference_failure_status_is_an_error() {
        let result = preference_result(400);
        assert!(interpret_preference_result(&result, PaymentGatewayEndpoint::Live).is_err());
    }

    fn stored_info() -> Value {
        json!({
            "id": "127220657-e0de8f56",
            "state": "pending",
            "cart": "8271",
            "update_time": "2026-03-14T10:00:00.000-04:00",
            "payer": {
                "payer_info": {
                    "email": "buyer@example.com",
                    "payer_id": "HVXR4FBN"
                }
            },
            "transactions": [
                {
                    "amount": { "total": "1000.00", "currency": "ARS" },
                    "related_resources": [
                        { "sale": { "id": "6367431817", "state": "pending" } }
                    ]
                }
            ]
        })
    }

    #[test]
    fn test_sale_id_is_read_from_the_transaction_resources() {
        assert_eq!(extract_sale_id(&stored_info()).as_deref(), Some("6367431817"));
        // without transactions the top-level id is the best available key
        assert_eq!(
            extract_sale_id(&json!({"id": 6367431817u64})).as_deref(),
            Some("6367431817")
        );
        assert_eq!(extract_sale_id(&json!({})), None);
    }

    #[test]
    fn test_payment_details_extraction() {
        let details = extract_payment_details(&stored_info());
        assert_eq!(details.payer_email.as_deref(), Some("buyer@example.com"));
        assert_eq!(details.payer_id.as_deref(), Some("HVXR4FBN"));
        assert_eq!(details.cart_id.as_deref(), Some("8271"));
        assert_eq!(details.payment_id.as_deref(), Some("127220657-e0de8f56"));
        assert_eq!(details.sale_id.as_deref(), Some("6367431817"));
        // a pending preference blocks retrying the payment
        assert!(!details.retry_allowed);
    }

    #[test]
    fn test_details_of_an_empty_info_blob_allow_retrying() {
        let details = extract_payment_details(&json!({}));
        assert_eq!(details.payer_email, None);
        assert!(details.retry_allowed);
    }

    #[test]
    fn test_shredding_blanks_the_payer_but_keeps_the_figures() {
        let shredded = shred_info(&stored_info());
        assert_eq!(
            shredded,
            json!({
                "id": "127220657-e0de8f56",
                "payer": { "payer_info": { "email": "█" } },
                "update_time": "2026-03-14T10:00:00.000-04:00",
                "transactions": [
                    { "amount": { "total": "1000.00", "currency": "ARS" } }
                ],
                "_shredded": true
            })
        );
    }
}
