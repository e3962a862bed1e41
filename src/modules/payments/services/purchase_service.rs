use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::core::{AppError, Result};
use crate::modules::courses::models::Course;
use crate::modules::courses::repositories::CourseRepository;
use crate::modules::gateways::services::{CheckoutGateway, GatewayOrder, OrderRequest};
use crate::modules::installments::repositories::InstallmentRepository;
use crate::modules::installments::services::ScheduleGenerator;
use crate::modules::notifications::services::{log_email_failure, Notifier, PurchaseMail};
use crate::modules::payments::models::{BuyerInfo, Payment, PaymentMethod};
use crate::modules::payments::repositories::PaymentRepository;
use crate::modules::purchases::models::{CoursePurchase, PurchaseStatus};
use crate::modules::purchases::repositories::PurchaseRepository;

/// Purchase initiation request, already shape-validated by the controller
#[derive(Debug, Clone)]
pub struct InitiatePurchase {
    pub course_id: String,
    pub buyer: BuyerInfo,
    pub payment_method: PaymentMethod,
    pub is_emi: bool,
    pub emi_duration_months: Option<i32>,
}

/// Result of purchase initiation
#[derive(Debug, Clone, Serialize)]
pub struct InitiatedPurchase {
    pub payment: Payment,
    pub course: Course,
    pub purchase: CoursePurchase,
    /// None for CASH/CHEQUE purchases, which never touch the gateway
    pub gateway_order: Option<GatewayOrder>,
}

/// Outcome of gateway callback verification.
///
/// A signature mismatch is a normal result, carried as a variant rather
/// than an error, so controllers render it as `verified: false`.
#[derive(Debug, Clone)]
pub enum Verification {
    Verified {
        payment: Payment,
        purchase: Option<CoursePurchase>,
    },
    Mismatch {
        payment: Payment,
    },
}

/// Receipt projection for a payment event
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub receipt_number: String,
    pub student_name: String,
    pub email: String,
    pub course_id: String,
    pub course_title: Option<String>,
    pub amount: Decimal,
    pub amount_charged: Decimal,
    pub currency: String,
    pub payment_method: String,
    pub status: String,
    pub is_emi: bool,
    pub paid_at: Option<chrono::NaiveDateTime>,
}

/// Coordinates course purchases: pricing, payment and installment
/// persistence, gateway order creation, callback verification, and the
/// purchase-status rollup.
pub struct PurchaseService {
    courses: Arc<dyn CourseRepository>,
    payments: Arc<dyn PaymentRepository>,
    installments: Arc<dyn InstallmentRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    gateway: Arc<dyn CheckoutGateway>,
    notifier: Arc<dyn Notifier>,
}

impl PurchaseService {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        payments: Arc<dyn PaymentRepository>,
        installments: Arc<dyn InstallmentRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        gateway: Arc<dyn CheckoutGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            courses,
            payments,
            installments,
            purchases,
            gateway,
            notifier,
        }
    }

    /// Start a purchase: persist the pending payment, the purchase, and
    /// (for EMI) the full installment schedule, then reserve a gateway
    /// order for the amount charged now.
    ///
    /// All persistence happens before the gateway call; a gateway failure
    /// leaves the payment PENDING with no order attached.
    pub async fn initiate_purchase(&self, request: InitiatePurchase) -> Result<InitiatedPurchase> {
        self.validate_initiation(&request)?;

        let course = self
            .courses
            .find_by_id(&request.course_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Course '{}' not found", request.course_id))
            })?;

        let total_amount = course.selling_price;
        course
            .currency
            .validate_amount(total_amount)
            .map_err(AppError::Validation)?;

        let monthly_emi_amount = if request.is_emi {
            // Same computation the schedule generator uses for every
            // installment, so the first charge equals installment 1.
            request
                .emi_duration_months
                .map(|months| ScheduleGenerator::monthly_charge(total_amount, months))
        } else {
            None
        };

        let payment = Payment::new(
            request.buyer.clone(),
            course.id.clone(),
            total_amount,
            course.currency,
            request.payment_method,
            request.is_emi,
            request.emi_duration_months,
            monthly_emi_amount,
        );
        self.payments.create(&payment).await?;

        let purchase = CoursePurchase::new(
            course.id.clone(),
            request.buyer.user_id.clone(),
            Some(request.buyer.student_name.clone()),
            Some(request.buyer.email.clone()),
            Some(request.buyer.mobile.clone()),
            payment.id.clone(),
            total_amount,
            request.is_emi,
            request.emi_duration_months,
        );
        self.purchases.create(&purchase).await?;

        if let Some(months) = request.emi_duration_months.filter(|_| request.is_emi) {
            let schedule = ScheduleGenerator::generate(
                total_amount,
                months,
                &payment.id,
                request.buyer.user_id.as_deref(),
                Some(&purchase.id),
                chrono::Utc::now().date_naive(),
            )?;
            self.installments.create_batch(&schedule).await?;
        }

        // CASH/CHEQUE purchases are settled offline, no gateway order
        if request.payment_method.is_offline() {
            info!(
                payment_id = payment.id.as_str(),
                method = %request.payment_method,
                "Offline payment initiated, skipping gateway"
            );
            return Ok(InitiatedPurchase {
                payment,
                course,
                purchase,
                gateway_order: None,
            });
        }

        let charge_now = monthly_emi_amount.unwrap_or(total_amount);
        let order = self
            .gateway
            .create_order(OrderRequest {
                amount_minor: course.currency.minor_units(charge_now),
                currency: course.currency.to_string(),
                receipt: payment.receipt_number.clone(),
            })
            .await?;

        let mut payment = payment;
        payment.attach_order(order.order_id.clone());
        self.payments.update(&payment).await?;

        info!(
            payment_id = payment.id.as_str(),
            order_id = order.order_id.as_str(),
            charge_now = %charge_now,
            is_emi = request.is_emi,
            "Purchase initiated"
        );

        Ok(InitiatedPurchase {
            payment,
            course,
            purchase,
            gateway_order: Some(order),
        })
    }

    /// Verify a gateway callback for a purchase-initiation payment.
    ///
    /// A mismatched signature marks the payment FAILED and mutates
    /// nothing else. A match settles the payment, pays installment 1 on
    /// EMI plans, and rolls status up onto the purchase.
    pub async fn verify_purchase(
        &self,
        payment_id: &str,
        gateway_payment_id: &str,
        gateway_order_id: &str,
        gateway_signature: &str,
    ) -> Result<Verification> {
        let mut payment = self
            .payments
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payment '{}' not found", payment_id)))?;

        // The callback's order id must be the order reserved for this
        // payment; a signature minted for another order does not settle it.
        if payment.razorpay_order_id.as_deref() != Some(gateway_order_id) {
            return Err(AppError::validation(format!(
                "Gateway order '{}' does not belong to payment '{}'",
                gateway_order_id, payment_id
            )));
        }

        if !self
            .gateway
            .verify_signature(gateway_order_id, gateway_payment_id, gateway_signature)
        {
            warn!(
                payment_id = payment_id,
                order_id = gateway_order_id,
                "Signature mismatch, marking payment failed"
            );
            if payment.mark_failed() {
                self.payments.update(&payment).await?;
            }
            return Ok(Verification::Mismatch { payment });
        }

        payment.mark_success(
            gateway_payment_id.to_string(),
            gateway_signature.to_string(),
        )?;

        if payment.is_emi {
            let installments = self.installments.find_by_payment(&payment.id).await?;
            if let Some(first) = installments.iter().find(|i| i.installment_number == 1) {
                self.installments
                    .mark_paid_if_unpaid(
                        &first.id,
                        gateway_payment_id,
                        chrono::Utc::now().naive_utc(),
                    )
                    .await?;
            }
            payment.installments_completed = self.installments.count_paid(&payment.id).await?;
        }

        self.payments.update(&payment).await?;

        let purchase = self.purchases.find_by_payment(&payment.id).await?;
        if let Some(ref purchase) = purchase {
            let status = if payment.is_emi {
                PurchaseStatus::Active
            } else {
                PurchaseStatus::Completed
            };
            self.purchases.update_status(&purchase.id, status).await?;
        }

        info!(
            payment_id = payment.id.as_str(),
            is_emi = payment.is_emi,
            "Payment verified"
        );

        self.send_confirmation(&payment).await;

        // Re-read so callers see the rolled-up purchase status
        let purchase = self.purchases.find_by_payment(&payment.id).await?;
        Ok(Verification::Verified { payment, purchase })
    }

    /// Receipt projection for the receipt endpoint
    pub async fn payment_receipt(&self, payment_id: &str) -> Result<PaymentReceipt> {
        let payment = self
            .payments
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payment '{}' not found", payment_id)))?;

        let course_title = self
            .courses
            .find_by_id(&payment.course_id)
            .await?
            .map(|c| c.title);

        Ok(PaymentReceipt {
            receipt_number: payment.receipt_number.clone(),
            student_name: payment.student_name.clone(),
            email: payment.email.clone(),
            course_id: payment.course_id.clone(),
            course_title,
            amount: payment.amount,
            amount_charged: payment.charge_amount(),
            currency: payment.currency.to_string(),
            payment_method: payment.payment_method.to_string(),
            status: payment.status.to_string(),
            is_emi: payment.is_emi,
            paid_at: payment.paid_at,
        })
    }

    fn validate_initiation(&self, request: &InitiatePurchase) -> Result<()> {
        if request.course_id.trim().is_empty() {
            return Err(AppError::validation("courseId is required"));
        }
        if request.buyer.student_name.trim().is_empty() {
            return Err(AppError::validation("studentName is required"));
        }
        if request.buyer.email.trim().is_empty() || !request.buyer.email.contains('@') {
            return Err(AppError::validation("A valid email is required"));
        }
        if request.buyer.mobile.trim().is_empty() {
            return Err(AppError::validation("mobile is required"));
        }

        if request.is_emi {
            if request.buyer.user_id.is_none() {
                return Err(AppError::validation(
                    "EMI option is only available for registered users.",
                ));
            }
            match request.emi_duration_months {
                Some(months) if months >= 2 => {}
                _ => {
                    return Err(AppError::validation(
                        "EMI duration must be at least 2 months",
                    ))
                }
            }
        }

        Ok(())
    }

    async fn send_confirmation(&self, payment: &Payment) {
        let course_title = match self.courses.find_by_id(&payment.course_id).await {
            Ok(Some(course)) => course.title,
            _ => payment.course_id.clone(),
        };

        let mail = PurchaseMail {
            to: payment.email.clone(),
            student_name: payment.student_name.clone(),
            course_title,
            receipt_number: payment.receipt_number.clone(),
            amount_paid: payment.charge_amount(),
            is_emi: payment.is_emi,
        };

        if let Err(e) = self.notifier.send_purchase_confirmation(mail).await {
            log_email_failure("purchase confirmation", &e);
        }
    }
}
