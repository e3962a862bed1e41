// Integration tests for the full EMI lifecycle: purchase initiation,
// first-payment verification, per-installment charges, and the
// completion rollup onto the originating payment and purchase.

#[path = "../support/mod.rs"]
mod support;

use rust_decimal_macros::dec;

use edupay::core::AppError;
use edupay::modules::installments::models::InstallmentStatus;
use edupay::modules::installments::repositories::InstallmentRepository;
use edupay::modules::installments::services::{
    EmiService, InstallmentVerification, ScheduleGenerator,
};
use edupay::modules::payments::models::{
    BuyerInfo, EmiStatus, Payment, PaymentMethod, PaymentStatus,
};
use edupay::modules::payments::repositories::PaymentRepository;
use edupay::modules::payments::services::{InitiatePurchase, PurchaseService, Verification};
use edupay::modules::purchases::models::{CoursePurchase, PurchaseStatus};
use edupay::modules::purchases::repositories::PurchaseRepository;
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

fn emi_service(h: &TestHarness) -> EmiService {
    EmiService::new(
        h.state.payments.clone(),
        h.state.installments.clone(),
        h.state.purchases.clone(),
        h.state.gateway.clone(),
        h.state.notifier.clone(),
    )
}

/// Initiate a 3-month EMI purchase and verify its first payment. Returns
/// the originating payment id.
async fn start_plan(h: &TestHarness) -> String {
    let service = purchase_service(h);
    let initiated = service
        .initiate_purchase(InitiatePurchase {
            course_id: "course-1".to_string(),
            buyer: BuyerInfo {
                student_name: "Asha Verma".to_string(),
                email: "asha@example.com".to_string(),
                mobile: "9876543210".to_string(),
                user_id: Some("user-1".to_string()),
            },
            payment_method: PaymentMethod::Upi,
            is_emi: true,
            emi_duration_months: Some(3),
        })
        .await
        .unwrap();

    let order = initiated.gateway_order.unwrap();
    let signature = FakeGateway::sign(&order.order_id, "pay_first");
    let outcome = service
        .verify_purchase(&initiated.payment.id, "pay_first", &order.order_id, &signature)
        .await
        .unwrap();
    assert!(matches!(outcome, Verification::Verified { .. }));

    initiated.payment.id
}

/// Charge and verify one installment through the EMI service
async fn settle_installment(h: &TestHarness, installment_id: &str, gateway_payment_id: &str) {
    let service = emi_service(h);
    let charge = service.pay_installment(installment_id).await.unwrap();
    let order_id = charge.gateway_order.order_id;

    let signature = FakeGateway::sign(&order_id, gateway_payment_id);
    let outcome = service
        .verify_installment_payment(installment_id, gateway_payment_id, &order_id, &signature)
        .await
        .unwrap();
    assert!(matches!(outcome, InstallmentVerification::Verified { .. }));
}

#[tokio::test]
async fn test_emi_plan_runs_to_completion() {
    let h = harness();
    let payment_id = start_plan(&h).await;

    // First installment settled during purchase verification
    let schedule = h.installments.all_for_payment(&payment_id);
    assert_eq!(schedule[0].status, InstallmentStatus::Paid);
    assert_eq!(schedule[1].status, InstallmentStatus::Pending);

    settle_installment(&h, &schedule[1].id, "pay_second").await;
    let original = h.payments.get(&payment_id).unwrap();
    assert_eq!(original.installments_completed, 2);
    assert_eq!(original.emi_status, Some(EmiStatus::Active));

    settle_installment(&h, &schedule[2].id, "pay_third").await;

    // Completion rolls up everywhere
    let original = h.payments.get(&payment_id).unwrap();
    assert_eq!(original.installments_completed, 3);
    assert_eq!(original.emi_status, Some(EmiStatus::Completed));

    let purchase = h
        .purchases
        .get(&h.installments.all_for_payment(&payment_id)[0]
            .course_purchase_id
            .clone()
            .unwrap())
        .unwrap();
    assert_eq!(purchase.status, PurchaseStatus::Completed);

    // Paid amounts reconstruct the full price
    let total: rust_decimal::Decimal = h
        .installments
        .all_for_payment(&payment_id)
        .iter()
        .map(|i| i.amount_due)
        .sum();
    assert_eq!(total, dec!(10000));
}

#[tokio::test]
async fn test_last_installment_progress_summary() {
    let h = harness();
    let payment_id = start_plan(&h).await;
    let schedule = h.installments.all_for_payment(&payment_id);

    settle_installment(&h, &schedule[1].id, "pay_second").await;

    let service = emi_service(&h);
    let charge = service.pay_installment(&schedule[2].id).await.unwrap();
    let order_id = charge.gateway_order.order_id;
    let signature = FakeGateway::sign(&order_id, "pay_third");
    let outcome = service
        .verify_installment_payment(&schedule[2].id, "pay_third", &order_id, &signature)
        .await
        .unwrap();

    match outcome {
        InstallmentVerification::Verified { progress, .. } => {
            // Final installment carries the rounding remainder
            assert_eq!(progress.amount_paid_now, dec!(3334));
            assert_eq!(progress.total_paid, dec!(10000));
            assert_eq!(progress.remaining_amount, dec!(0));
            assert_eq!(progress.installments_completed, 3);
            assert_eq!(progress.installments_pending, 0);
            assert!(progress.plan_completed);
        }
        InstallmentVerification::Mismatch { .. } => panic!("expected verified outcome"),
    }
}

#[tokio::test]
async fn test_double_verification_is_rejected_without_mutation() {
    let h = harness();
    let payment_id = start_plan(&h).await;
    let schedule = h.installments.all_for_payment(&payment_id);

    let service = emi_service(&h);
    let charge = service.pay_installment(&schedule[1].id).await.unwrap();
    let order_id = charge.gateway_order.order_id;
    let signature = FakeGateway::sign(&order_id, "pay_second");

    service
        .verify_installment_payment(&schedule[1].id, "pay_second", &order_id, &signature)
        .await
        .unwrap();

    let before = h.installments.get(&schedule[1].id).unwrap();
    let result = service
        .verify_installment_payment(&schedule[1].id, "pay_second", &order_id, &signature)
        .await;

    assert!(matches!(result, Err(AppError::AlreadyPaid(_))));

    // Second callback changed nothing on the installment
    let after = h.installments.get(&schedule[1].id).unwrap();
    assert_eq!(after.status, InstallmentStatus::Paid);
    assert_eq!(after.paid_date, before.paid_date);
    assert_eq!(after.payment_ref_id, before.payment_ref_id);

    let original = h.payments.get(&payment_id).unwrap();
    assert_eq!(original.installments_completed, 2);
}

#[tokio::test]
async fn test_mismatched_installment_callback_leaves_schedule_intact() {
    let h = harness();
    let payment_id = start_plan(&h).await;
    let schedule = h.installments.all_for_payment(&payment_id);

    let service = emi_service(&h);
    let charge = service.pay_installment(&schedule[1].id).await.unwrap();
    let order_id = charge.gateway_order.order_id;

    let outcome = service
        .verify_installment_payment(&schedule[1].id, "pay_second", &order_id, "bogus")
        .await
        .unwrap();

    match outcome {
        InstallmentVerification::Mismatch { payment } => {
            assert_eq!(payment.status, PaymentStatus::Failed);
        }
        InstallmentVerification::Verified { .. } => panic!("expected mismatch outcome"),
    }

    let installment = h.installments.get(&schedule[1].id).unwrap();
    assert_eq!(installment.status, InstallmentStatus::Pending);
    let original = h.payments.get(&payment_id).unwrap();
    assert_eq!(original.installments_completed, 1);
}

#[tokio::test]
async fn test_overdue_installments_are_flagged_late_on_read() {
    let h = harness();

    // A plan whose schedule started a year ago, so months 1-12 are overdue
    let payment = Payment::new(
        BuyerInfo {
            student_name: "Asha Verma".to_string(),
            email: "asha@example.com".to_string(),
            mobile: "9876543210".to_string(),
            user_id: Some("user-1".to_string()),
        },
        "course-1".to_string(),
        dec!(12000),
        edupay::core::Currency::INR,
        PaymentMethod::Upi,
        true,
        Some(12),
        Some(dec!(1000)),
    );
    h.state.payments.create(&payment).await.unwrap();

    let purchase = CoursePurchase::new(
        "course-1".to_string(),
        Some("user-1".to_string()),
        None,
        None,
        None,
        payment.id.clone(),
        dec!(12000),
        true,
        Some(12),
    );
    h.state.purchases.create(&purchase).await.unwrap();

    let start = chrono::Utc::now()
        .date_naive()
        .checked_sub_months(chrono::Months::new(12))
        .unwrap();
    let schedule = ScheduleGenerator::generate(
        dec!(12000),
        12,
        &payment.id,
        Some("user-1"),
        Some(&purchase.id),
        start,
    )
    .unwrap();
    h.state.installments.create_batch(&schedule).await.unwrap();

    let plan = emi_service(&h)
        .plan_for_course("course-1", "user-1")
        .await
        .unwrap();

    assert_eq!(plan.len(), 12);
    // Everything due before today is flagged; at least the first months
    let today = chrono::Utc::now().date_naive();
    for installment in &plan {
        if installment.due_date < today {
            assert_eq!(installment.status, InstallmentStatus::Late);
        } else {
            assert_eq!(installment.status, InstallmentStatus::Pending);
        }
    }
    assert!(plan
        .iter()
        .any(|i| i.status == InstallmentStatus::Late));

    // Flag is persisted, not just projected
    let stored = h.installments.get(&plan[0].id).unwrap();
    assert_eq!(stored.status, InstallmentStatus::Late);

    // And the plan itself is demoted from ACTIVE
    let stored_payment = h.payments.get(&payment.id).unwrap();
    assert_eq!(stored_payment.emi_status, Some(EmiStatus::Late));
}

#[tokio::test]
async fn test_late_installment_can_still_be_settled() {
    let h = harness();

    // A 3-month plan whose schedule started half a year ago
    let payment = Payment::new(
        BuyerInfo {
            student_name: "Asha Verma".to_string(),
            email: "asha@example.com".to_string(),
            mobile: "9876543210".to_string(),
            user_id: Some("user-1".to_string()),
        },
        "course-1".to_string(),
        dec!(9000),
        edupay::core::Currency::INR,
        PaymentMethod::Upi,
        true,
        Some(3),
        Some(dec!(3000)),
    );
    h.state.payments.create(&payment).await.unwrap();

    let purchase = CoursePurchase::new(
        "course-1".to_string(),
        Some("user-1".to_string()),
        None,
        None,
        None,
        payment.id.clone(),
        dec!(9000),
        true,
        Some(3),
    );
    h.state.purchases.create(&purchase).await.unwrap();

    let start = chrono::Utc::now()
        .date_naive()
        .checked_sub_months(chrono::Months::new(6))
        .unwrap();
    let schedule = ScheduleGenerator::generate(
        dec!(9000),
        3,
        &payment.id,
        Some("user-1"),
        Some(&purchase.id),
        start,
    )
    .unwrap();
    h.state.installments.create_batch(&schedule).await.unwrap();

    // Reading the plan flags every overdue installment
    let plan = emi_service(&h)
        .plan_for_course("course-1", "user-1")
        .await
        .unwrap();
    assert!(plan
        .iter()
        .all(|i| i.status == InstallmentStatus::Late));

    // A correctly signed callback still settles a LATE installment
    settle_installment(&h, &plan[0].id, "pay_late_1").await;

    let settled = h.installments.get(&plan[0].id).unwrap();
    assert_eq!(settled.status, InstallmentStatus::Paid);
    assert_eq!(settled.payment_ref_id.as_deref(), Some("pay_late_1"));
    assert!(settled.paid_date.is_some());

    let original = h.payments.get(&payment.id).unwrap();
    assert_eq!(original.installments_completed, 1);
}

#[tokio::test]
async fn test_emi_summary_scopes_to_user() {
    let h = harness();
    start_plan(&h).await;

    let service = emi_service(&h);

    let all = service.emi_summary(None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].installments_paid, 1);
    assert_eq!(all[0].total_paid, dec!(3333));
    assert_eq!(all[0].remaining_amount, dec!(6667));

    let scoped = service.emi_summary(Some("user-1")).await.unwrap();
    assert_eq!(scoped.len(), 1);

    let none = service.emi_summary(Some("someone-else")).await.unwrap();
    assert!(none.is_empty());
}
