// HTTP handlers for course payment endpoints
//
// Endpoints:
// - POST /initiate-course-payment - Start a purchase, reserve a gateway order
// - POST /verify-course-payment - Verify a gateway payment callback
// - GET /payment-receipt/{payment_id} - Receipt projection for a payment

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::core::{response, AppError, Result};
use crate::modules::payments::models::{BuyerInfo, Payment, PaymentMethod};
use crate::modules::payments::services::{
    InitiatePurchase, PurchaseService, Verification,
};
use crate::state::AppState;

/// Request for POST /initiate-course-payment
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
    pub course_id: String,
    pub student_name: String,
    pub email: String,
    pub mobile: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub payment_method: String,
    #[serde(default)]
    pub is_emi: bool,
    #[serde(default)]
    pub emi_duration_months: Option<i32>,
}

/// Request for POST /verify-course-payment
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub payment_id: String,
    pub gateway_payment_id: String,
    pub gateway_order_id: String,
    pub gateway_signature: String,
}

/// Payment projection returned by the payment endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: String,
    pub student_name: String,
    pub email: String,
    pub course_id: String,
    pub amount: String,
    pub currency: String,
    pub payment_method: String,
    pub status: String,
    pub is_emi: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emi_duration_months: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_emi_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emi_status: Option<String>,
    pub installments_completed: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_order_id: Option<String>,
    pub receipt_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<String>,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id.clone(),
            student_name: payment.student_name.clone(),
            email: payment.email.clone(),
            course_id: payment.course_id.clone(),
            amount: payment.amount.to_string(),
            currency: payment.currency.to_string(),
            payment_method: payment.payment_method.to_string(),
            status: payment.status.to_string(),
            is_emi: payment.is_emi,
            emi_duration_months: payment.emi_duration_months,
            monthly_emi_amount: payment.monthly_emi_amount.map(|a| a.to_string()),
            emi_status: payment.emi_status.map(|s| s.to_string()),
            installments_completed: payment.installments_completed,
            gateway_order_id: payment.razorpay_order_id.clone(),
            receipt_number: payment.receipt_number.clone(),
            paid_at: payment.paid_at.map(|dt| dt.to_string()),
        }
    }
}

fn purchase_service(state: &AppState) -> PurchaseService {
    PurchaseService::new(
        state.courses.clone(),
        state.payments.clone(),
        state.installments.clone(),
        state.purchases.clone(),
        state.gateway.clone(),
        state.notifier.clone(),
    )
}

/// POST /initiate-course-payment
///
/// Starts a course purchase. Persists the pending payment (and, for EMI,
/// the installment schedule) and reserves a gateway order for the amount
/// charged now. CASH/CHEQUE purchases return with no gateway order.
///
/// # Returns
/// - 201: payment, course, purchase, and gateway order (if any)
/// - 400: validation failure (guest EMI, missing fields, bad method)
/// - 404: course not found
pub async fn initiate_course_payment(
    request: web::Json<InitiatePaymentRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let request = request.into_inner();

    let payment_method = PaymentMethod::try_from(request.payment_method.clone())
        .map_err(AppError::Validation)?;

    let initiated = purchase_service(&state)
        .initiate_purchase(InitiatePurchase {
            course_id: request.course_id,
            buyer: BuyerInfo {
                student_name: request.student_name,
                email: request.email,
                mobile: request.mobile,
                user_id: request.user_id,
            },
            payment_method,
            is_emi: request.is_emi,
            emi_duration_months: request.emi_duration_months,
        })
        .await?;

    Ok(response::created(serde_json::json!({
        "payment": PaymentResponse::from(&initiated.payment),
        "course": {
            "id": initiated.course.id,
            "title": initiated.course.title,
            "sellingPrice": initiated.course.selling_price.to_string(),
        },
        "purchase": {
            "id": initiated.purchase.id,
            "status": initiated.purchase.status.to_string(),
        },
        "gatewayOrder": initiated.gateway_order,
    })))
}

/// POST /verify-course-payment
///
/// Verifies a gateway callback for a purchase payment. A signature
/// mismatch returns 400 with `verified: false`; it is not an error.
pub async fn verify_course_payment(
    request: web::Json<VerifyPaymentRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let request = request.into_inner();

    let outcome = purchase_service(&state)
        .verify_purchase(
            &request.payment_id,
            &request.gateway_payment_id,
            &request.gateway_order_id,
            &request.gateway_signature,
        )
        .await?;

    match outcome {
        Verification::Verified { payment, purchase } => Ok(response::ok(serde_json::json!({
            "verified": true,
            "payment": PaymentResponse::from(&payment),
            "purchase": purchase.map(|p| serde_json::json!({
                "id": p.id,
                "status": p.status.to_string(),
            })),
        }))),
        Verification::Mismatch { payment } => Ok(response::rejected(serde_json::json!({
            "verified": false,
            "payment": PaymentResponse::from(&payment),
        }))),
    }
}

/// GET /payment-receipt/{payment_id}
pub async fn payment_receipt(
    payment_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let receipt = purchase_service(&state)
        .payment_receipt(&payment_id)
        .await?;

    Ok(response::ok(receipt))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/initiate-course-payment",
        web::post().to(initiate_course_payment),
    )
    .route("/verify-course-payment", web::post().to(verify_course_payment))
    .route("/payment-receipt/{payment_id}", web::get().to(payment_receipt));
}
