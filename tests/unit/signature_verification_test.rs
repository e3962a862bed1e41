// Unit tests for gateway callback signature verification

use edupay::modules::gateways::services::compute_signature;
use proptest::prelude::*;

#[test]
fn test_known_vector() {
    // Verified against a reference HMAC-SHA256 implementation
    let signature = compute_signature("rzp_secret_key", "order_MkVq1", "pay_MkWx2");
    assert_eq!(
        signature,
        "b28c584c9755caf8dc99e09ebffb4716c7e684189a0c0695c24ce82c8f92d3f6"
    );
}

#[test]
fn test_signature_is_deterministic() {
    let a = compute_signature("secret", "order_1", "pay_1");
    let b = compute_signature("secret", "order_1", "pay_1");
    assert_eq!(a, b);
}

#[test]
fn test_signature_is_lowercase_hex() {
    let signature = compute_signature("secret", "order_1", "pay_1");
    assert_eq!(signature.len(), 64);
    assert!(signature
        .chars()
        .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn test_different_secret_changes_signature() {
    let a = compute_signature("secret-a", "order_1", "pay_1");
    let b = compute_signature("secret-b", "order_1", "pay_1");
    assert_ne!(a, b);
}

#[test]
fn test_payload_order_matters() {
    // order|payment must not equal payment|order
    let a = compute_signature("secret", "order_1", "pay_1");
    let b = compute_signature("secret", "pay_1", "order_1");
    assert_ne!(a, b);
}

proptest! {
    /// Any single-character mutation of either id produces a different
    /// signature.
    #[test]
    fn prop_mutated_ids_change_signature(
        order in "[a-z0-9_]{8,20}",
        payment in "[a-z0-9_]{8,20}",
    ) {
        let original = compute_signature("secret", &order, &payment);

        let mutated_order = format!("{}x", order);
        prop_assert_ne!(
            compute_signature("secret", &mutated_order, &payment),
            original.clone()
        );

        let mutated_payment = format!("{}x", payment);
        prop_assert_ne!(
            compute_signature("secret", &order, &mutated_payment),
            original
        );
    }
}
