// Contract tests for the EMI endpoints:
// POST /emi/pay-installment, POST /emi/verify-installment-payment,
// GET /emi/{course_id}/installments, GET /emi/summary

#[path = "../support/mod.rs"]
mod support;

use actix_web::{test, web, App};
use serde_json::{json, Value};

use edupay::modules::installments::controllers::emi_controller;
use edupay::modules::payments::controllers::payment_controller;
use support::{admin_token, harness, user_token, FakeGateway};

macro_rules! emi_app {
    ($harness:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($harness.state.clone()))
                .service(
                    web::scope("/api/v1")
                        .configure(payment_controller::configure)
                        .configure(emi_controller::configure),
                ),
        )
        .await
    };
}

/// Drive an EMI purchase through initiation and first-payment
/// verification; yields (payment_id, installment ids in order).
macro_rules! seed_active_plan {
    ($app:expr, $harness:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/v1/initiate-course-payment")
            .set_json(json!({
                "courseId": "course-1",
                "studentName": "Asha Verma",
                "email": "asha@example.com",
                "mobile": "9876543210",
                "userId": "user-1",
                "paymentMethod": "UPI",
                "isEmi": true,
                "emiDurationMonths": 3,
            }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), 201);
        let body: Value = test::read_body_json(resp).await;

        let payment_id = body["data"]["payment"]["id"].as_str().unwrap().to_string();
        let order_id = body["data"]["gatewayOrder"]["order_id"]
            .as_str()
            .unwrap()
            .to_string();

        let req = test::TestRequest::post()
            .uri("/api/v1/verify-course-payment")
            .set_json(json!({
                "paymentId": payment_id,
                "gatewayPaymentId": "pay_first",
                "gatewayOrderId": order_id,
                "gatewaySignature": FakeGateway::sign(&order_id, "pay_first"),
            }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), 200);

        let ids: Vec<String> = $harness
            .installments
            .all_for_payment(&payment_id)
            .into_iter()
            .map(|i| i.id)
            .collect();
        (payment_id, ids)
    }};
}

#[actix_web::test]
async fn test_pay_installment_creates_derivative_payment() {
    let h = harness();
    let app = emi_app!(h);
    let (payment_id, ids) = seed_active_plan!(app, h);

    let req = test::TestRequest::post()
        .uri("/api/v1/emi/pay-installment")
        .set_json(json!({ "installmentId": ids[1] }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(true));

    let derivative_id = body["data"]["payment"]["id"].as_str().unwrap();
    assert_ne!(derivative_id, payment_id);
    assert_eq!(body["data"]["payment"]["amountCharged"], json!("3333"));
    assert_eq!(body["data"]["gatewayOrder"]["amount_minor"], json!(333_300));

    // Derivative keeps the total on `amount`, charges only the due amount
    let derivative = h.payments.get(derivative_id).unwrap();
    assert_eq!(derivative.amount.to_string(), "10000");
    assert_eq!(derivative.installment_id.as_deref(), Some(ids[1].as_str()));
}

#[actix_web::test]
async fn test_pay_installment_rejects_already_paid() {
    let h = harness();
    let app = emi_app!(h);
    let (_, ids) = seed_active_plan!(app, h);

    // Installment 1 was settled during purchase verification
    let req = test::TestRequest::post()
        .uri("/api/v1/emi/pay-installment")
        .set_json(json!({ "installmentId": ids[0] }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("already paid"));
}

#[actix_web::test]
async fn test_pay_installment_unknown_returns_404() {
    let h = harness();
    let app = emi_app!(h);

    let req = test::TestRequest::post()
        .uri("/api/v1/emi/pay-installment")
        .set_json(json!({ "installmentId": "no-such-installment" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_verify_installment_payment_success() {
    let h = harness();
    let app = emi_app!(h);
    let (payment_id, ids) = seed_active_plan!(app, h);

    let req = test::TestRequest::post()
        .uri("/api/v1/emi/pay-installment")
        .set_json(json!({ "installmentId": ids[1] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    let order_id = body["data"]["gatewayOrder"]["order_id"]
        .as_str()
        .unwrap()
        .to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/emi/verify-installment-payment")
        .set_json(json!({
            "installmentId": ids[1],
            "gatewayPaymentId": "pay_second",
            "gatewayOrderId": order_id,
            "gatewaySignature": FakeGateway::sign(&order_id, "pay_second"),
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["verified"], json!(true));
    assert_eq!(body["data"]["installment"]["status"], json!("PAID"));

    let summary = &body["data"]["summary"];
    assert_eq!(summary["amount_paid_now"], json!("3333"));
    assert_eq!(summary["total_paid"], json!("6666"));
    assert_eq!(summary["remaining_amount"], json!("3334"));
    assert_eq!(summary["installments_completed"], json!(2));
    assert_eq!(summary["installments_pending"], json!(1));
    assert_eq!(summary["plan_completed"], json!(false));

    // Rollup reaches the original payment
    let original = h.payments.get(&payment_id).unwrap();
    assert_eq!(original.installments_completed, 2);
}

#[actix_web::test]
async fn test_verify_installment_tampered_signature() {
    let h = harness();
    let app = emi_app!(h);
    let (_, ids) = seed_active_plan!(app, h);

    let req = test::TestRequest::post()
        .uri("/api/v1/emi/pay-installment")
        .set_json(json!({ "installmentId": ids[1] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    let order_id = body["data"]["gatewayOrder"]["order_id"]
        .as_str()
        .unwrap()
        .to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/emi/verify-installment-payment")
        .set_json(json!({
            "installmentId": ids[1],
            "gatewayPaymentId": "pay_second",
            "gatewayOrderId": order_id,
            "gatewaySignature": "00".repeat(32),
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["verified"], json!(false));

    // Installment untouched, derivative payment failed
    let installment = h.installments.get(&ids[1]).unwrap();
    assert_eq!(installment.status.to_string(), "PENDING");
}

#[actix_web::test]
async fn test_course_installments_requires_auth() {
    let h = harness();
    let app = emi_app!(h);

    let req = test::TestRequest::get()
        .uri("/api/v1/emi/course-1/installments")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_course_installments_for_authenticated_user() {
    let h = harness();
    let app = emi_app!(h);
    seed_active_plan!(app, h);

    let req = test::TestRequest::get()
        .uri("/api/v1/emi/course-1/installments")
        .insert_header(("Authorization", format!("Bearer {}", user_token("user-1"))))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let installments = body["data"]["installments"].as_array().unwrap();
    assert_eq!(installments.len(), 3);
    assert_eq!(installments[0]["installmentNumber"], json!(1));
    assert_eq!(installments[0]["status"], json!("PAID"));
    assert_eq!(installments[1]["status"], json!("PENDING"));
}

#[actix_web::test]
async fn test_emi_summary_requires_admin() {
    let h = harness();
    let app = emi_app!(h);

    let req = test::TestRequest::get()
        .uri("/api/v1/emi/summary")
        .insert_header(("Authorization", format!("Bearer {}", user_token("user-1"))))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn test_emi_summary_for_admin() {
    let h = harness();
    let app = emi_app!(h);
    seed_active_plan!(app, h);

    let req = test::TestRequest::get()
        .uri("/api/v1/emi/summary")
        .insert_header(("Authorization", format!("Bearer {}", admin_token("admin-1"))))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let summaries = body["data"].as_array().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0]["installments_total"], json!(3));
    assert_eq!(summaries[0]["installments_paid"], json!(1));
    assert_eq!(summaries[0]["total_paid"], json!("3333"));
    assert_eq!(summaries[0]["purchase_status"], json!("ACTIVE"));
}
