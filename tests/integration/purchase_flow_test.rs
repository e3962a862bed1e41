// Integration tests for the full purchase flow, driven through the
// orchestration services against in-memory stores.

#[path = "../support/mod.rs"]
mod support;

use rust_decimal_macros::dec;

use edupay::modules::payments::models::{BuyerInfo, PaymentMethod, PaymentStatus};
use edupay::modules::payments::services::{InitiatePurchase, PurchaseService, Verification};
use edupay::modules::purchases::models::PurchaseStatus;
use support::{harness, FakeGateway, TestHarness};

fn purchase_service(h: &TestHarness) -> PurchaseService {
    PurchaseService::new(
        h.state.courses.clone(),
        h.state.payments.clone(),
        h.state.installments.clone(),
        h.state.purchases.clone(),
        h.state.gateway.clone(),
        h.state.notifier.clone(),
    )
}

fn request(method: PaymentMethod, is_emi: bool) -> InitiatePurchase {
    InitiatePurchase {
        course_id: "course-1".to_string(),
        buyer: BuyerInfo {
            student_name: "Asha Verma".to_string(),
            email: "asha@example.com".to_string(),
            mobile: "9876543210".to_string(),
            user_id: Some("user-1".to_string()),
        },
        payment_method: method,
        is_emi,
        emi_duration_months: if is_emi { Some(3) } else { None },
    }
}

#[tokio::test]
async fn test_full_payment_lifecycle() {
    let h = harness();
    let service = purchase_service(&h);

    let initiated = service
        .initiate_purchase(request(PaymentMethod::Card, false))
        .await
        .unwrap();

    assert_eq!(initiated.payment.status, PaymentStatus::Pending);
    assert_eq!(initiated.payment.amount, dec!(10000));
    assert_eq!(initiated.purchase.status, PurchaseStatus::Pending);
    let order = initiated.gateway_order.unwrap();
    assert_eq!(order.amount_minor, 1_000_000);

    let signature = FakeGateway::sign(&order.order_id, "pay_gw_1");
    let outcome = service
        .verify_purchase(&initiated.payment.id, "pay_gw_1", &order.order_id, &signature)
        .await
        .unwrap();

    match outcome {
        Verification::Verified { payment, purchase } => {
            assert_eq!(payment.status, PaymentStatus::Success);
            assert!(payment.paid_at.is_some());
            assert_eq!(
                payment.razorpay_payment_id.as_deref(),
                Some("pay_gw_1")
            );
            assert_eq!(purchase.unwrap().status, PurchaseStatus::Completed);
        }
        Verification::Mismatch { .. } => panic!("expected verified outcome"),
    }
}

#[tokio::test]
async fn test_mismatched_signature_fails_payment_only() {
    let h = harness();
    let service = purchase_service(&h);

    let initiated = service
        .initiate_purchase(request(PaymentMethod::Card, false))
        .await
        .unwrap();
    let order = initiated.gateway_order.unwrap();

    let outcome = service
        .verify_purchase(&initiated.payment.id, "pay_gw_1", &order.order_id, "bogus")
        .await
        .unwrap();

    match outcome {
        Verification::Mismatch { payment } => {
            assert_eq!(payment.status, PaymentStatus::Failed);
        }
        Verification::Verified { .. } => panic!("expected mismatch outcome"),
    }

    // Purchase stays pending; nothing rolled up
    let purchase = h.purchases.get(&initiated.purchase.id).unwrap();
    assert_eq!(purchase.status, PurchaseStatus::Pending);
}

#[tokio::test]
async fn test_replayed_mismatch_does_not_overwrite_settled_payment() {
    let h = harness();
    let service = purchase_service(&h);

    let initiated = service
        .initiate_purchase(request(PaymentMethod::Card, false))
        .await
        .unwrap();
    let order = initiated.gateway_order.unwrap();

    let signature = FakeGateway::sign(&order.order_id, "pay_gw_1");
    let outcome = service
        .verify_purchase(&initiated.payment.id, "pay_gw_1", &order.order_id, &signature)
        .await
        .unwrap();
    assert!(matches!(outcome, Verification::Verified { .. }));

    // Replaying the callback with a forged signature reports a mismatch
    // but leaves the settled payment untouched
    let replay = service
        .verify_purchase(&initiated.payment.id, "pay_gw_1", &order.order_id, "bogus")
        .await
        .unwrap();
    assert!(matches!(replay, Verification::Mismatch { .. }));

    let stored = h.payments.get(&initiated.payment.id).unwrap();
    assert_eq!(stored.status, PaymentStatus::Success);
    assert_eq!(stored.razorpay_payment_id.as_deref(), Some("pay_gw_1"));
}

#[tokio::test]
async fn test_verify_rejects_foreign_order_id() {
    let h = harness();
    let service = purchase_service(&h);

    let first = service
        .initiate_purchase(request(PaymentMethod::Card, false))
        .await
        .unwrap();
    let second = service
        .initiate_purchase(request(PaymentMethod::Card, false))
        .await
        .unwrap();
    let foreign_order = second.gateway_order.unwrap();

    // A signature minted for another order of the same account does not
    // settle this payment
    let signature = FakeGateway::sign(&foreign_order.order_id, "pay_gw_1");
    let result = service
        .verify_purchase(
            &first.payment.id,
            "pay_gw_1",
            &foreign_order.order_id,
            &signature,
        )
        .await;

    assert!(matches!(
        result,
        Err(edupay::core::AppError::Validation(_))
    ));
    let stored = h.payments.get(&first.payment.id).unwrap();
    assert_eq!(stored.status, PaymentStatus::Pending);
}

#[tokio::test]
async fn test_gateway_failure_leaves_pending_payment() {
    let h = harness();
    let service = PurchaseService::new(
        h.state.courses.clone(),
        h.state.payments.clone(),
        h.state.installments.clone(),
        h.state.purchases.clone(),
        std::sync::Arc::new(FakeGateway::failing()),
        h.state.notifier.clone(),
    );

    let result = service
        .initiate_purchase(request(PaymentMethod::Card, false))
        .await;
    assert!(result.is_err());

    // The payment row was written before the gateway call and survives
    // it, with no order attached
    let payments = h.payments.all();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Pending);
    assert!(payments[0].razorpay_order_id.is_none());
}

#[tokio::test]
async fn test_offline_purchase_completes_without_gateway() {
    let h = harness();
    let service = purchase_service(&h);

    let initiated = service
        .initiate_purchase(request(PaymentMethod::Cash, false))
        .await
        .unwrap();

    assert!(initiated.gateway_order.is_none());
    assert_eq!(initiated.payment.status, PaymentStatus::Pending);
    assert!(initiated.payment.razorpay_order_id.is_none());
    assert_eq!(h.gateway.orders_created(), 0);
}

#[tokio::test]
async fn test_receipt_projection() {
    let h = harness();
    let service = purchase_service(&h);

    let initiated = service
        .initiate_purchase(request(PaymentMethod::Upi, true))
        .await
        .unwrap();

    let receipt = service.payment_receipt(&initiated.payment.id).await.unwrap();
    assert_eq!(receipt.receipt_number, initiated.payment.receipt_number);
    assert_eq!(receipt.amount, dec!(10000));
    // EMI receipts show the amount actually collected now
    assert_eq!(receipt.amount_charged, dec!(3333));
    assert_eq!(receipt.course_title.as_deref(), Some("Advanced Mathematics"));
}
