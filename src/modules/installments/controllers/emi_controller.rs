// HTTP handlers for EMI installment endpoints
//
// Endpoints:
// - POST /emi/pay-installment - Reserve a gateway order for one installment
// - POST /emi/verify-installment-payment - Verify an installment callback
// - GET /emi/{course_id}/installments - Schedule for the caller's purchase
// - GET /emi/summary - Admin overview of EMI plans

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::core::{response, Result};
use crate::middleware::{AdminUser, AuthUser};
use crate::modules::installments::models::EmiInstallment;
use crate::modules::installments::services::{EmiService, InstallmentVerification};
use crate::state::AppState;

/// Request for POST /emi/pay-installment
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayInstallmentRequest {
    pub installment_id: String,
}

/// Request for POST /emi/verify-installment-payment
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyInstallmentRequest {
    pub installment_id: String,
    pub gateway_payment_id: String,
    pub gateway_order_id: String,
    pub gateway_signature: String,
}

/// Query for GET /emi/summary
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Installment projection returned by the EMI endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentResponse {
    pub id: String,
    pub payment_id: String,
    pub installment_number: i32,
    pub amount_due: String,
    pub due_date: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_ref_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<String>,
}

impl From<&EmiInstallment> for InstallmentResponse {
    fn from(installment: &EmiInstallment) -> Self {
        Self {
            id: installment.id.clone(),
            payment_id: installment.payment_id.clone(),
            installment_number: installment.installment_number,
            amount_due: installment.amount_due.to_string(),
            due_date: installment.due_date.to_string(),
            status: installment.status.to_string(),
            payment_ref_id: installment.payment_ref_id.clone(),
            paid_date: installment.paid_date.map(|dt| dt.to_string()),
        }
    }
}

fn emi_service(state: &AppState) -> EmiService {
    EmiService::new(
        state.payments.clone(),
        state.installments.clone(),
        state.purchases.clone(),
        state.gateway.clone(),
        state.notifier.clone(),
    )
}

/// POST /emi/pay-installment
///
/// Creates a derivative payment for one scheduled installment and
/// reserves a gateway order for its due amount.
///
/// # Returns
/// - 201: installment, derivative payment, gateway order
/// - 400: installment already paid
/// - 404: installment or originating payment not found
pub async fn pay_installment(
    request: web::Json<PayInstallmentRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let charge = emi_service(&state)
        .pay_installment(&request.installment_id)
        .await?;

    Ok(response::created(serde_json::json!({
        "installment": InstallmentResponse::from(&charge.installment),
        "payment": {
            "id": charge.payment.id,
            "receiptNumber": charge.payment.receipt_number,
            "status": charge.payment.status.to_string(),
            "amountCharged": charge.payment.charge_amount().to_string(),
        },
        "gatewayOrder": charge.gateway_order,
    })))
}

/// POST /emi/verify-installment-payment
///
/// Verifies a gateway callback for an installment charge. A signature
/// mismatch returns 400 with `verified: false`.
pub async fn verify_installment_payment(
    request: web::Json<VerifyInstallmentRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let outcome = emi_service(&state)
        .verify_installment_payment(
            &request.installment_id,
            &request.gateway_payment_id,
            &request.gateway_order_id,
            &request.gateway_signature,
        )
        .await?;

    match outcome {
        InstallmentVerification::Verified {
            installment,
            payment,
            progress,
        } => Ok(response::ok(serde_json::json!({
            "verified": true,
            "installment": InstallmentResponse::from(&installment),
            "payment": {
                "id": payment.id,
                "status": payment.status.to_string(),
                "receiptNumber": payment.receipt_number,
            },
            "summary": progress,
        }))),
        InstallmentVerification::Mismatch { payment } => {
            Ok(response::rejected(serde_json::json!({
                "verified": false,
                "payment": {
                    "id": payment.id,
                    "status": payment.status.to_string(),
                },
            })))
        }
    }
}

/// GET /emi/{course_id}/installments
///
/// Installment schedule for the authenticated user's EMI purchase of a
/// course, ordered by installment number. Overdue pending installments
/// are flagged LATE on the way out.
pub async fn course_installments(
    course_id: web::Path<String>,
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let installments = emi_service(&state)
        .plan_for_course(&course_id, &user.user_id)
        .await?;

    Ok(response::ok(serde_json::json!({
        "courseId": course_id.into_inner(),
        "installments": installments
            .iter()
            .map(InstallmentResponse::from)
            .collect::<Vec<_>>(),
    })))
}

/// GET /emi/summary
///
/// Admin-only overview of EMI plans, optionally filtered to one user via
/// `?userId=`.
pub async fn emi_summary(
    _admin: AdminUser,
    query: web::Query<SummaryQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let summaries = emi_service(&state)
        .emi_summary(query.user_id.as_deref())
        .await?;

    Ok(response::ok(summaries))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/emi")
            .route("/pay-installment", web::post().to(pay_installment))
            .route(
                "/verify-installment-payment",
                web::post().to(verify_installment_payment),
            )
            .route("/summary", web::get().to(emi_summary))
            .route("/{course_id}/installments", web::get().to(course_installments)),
    );
}
