use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::core::{AppError, Result};
use crate::modules::gateways::services::{CheckoutGateway, GatewayOrder, OrderRequest};
use crate::modules::installments::models::{EmiInstallment, InstallmentStatus};
use crate::modules::installments::repositories::InstallmentRepository;
use crate::modules::notifications::services::{log_email_failure, InstallmentMail, Notifier};
use crate::modules::payments::models::{EmiStatus, Payment};
use crate::modules::payments::repositories::PaymentRepository;
use crate::modules::purchases::models::PurchaseStatus;
use crate::modules::purchases::repositories::PurchaseRepository;

/// A derivative payment reserved against one installment, awaiting
/// gateway verification
#[derive(Debug, Clone, Serialize)]
pub struct PendingInstallmentCharge {
    pub installment: EmiInstallment,
    pub payment: Payment,
    pub gateway_order: GatewayOrder,
}

/// Plan progress after an installment payment settles
#[derive(Debug, Clone, Serialize)]
pub struct EmiProgress {
    pub amount_paid_now: Decimal,
    pub total_paid: Decimal,
    pub remaining_amount: Decimal,
    pub installments_completed: i32,
    pub installments_pending: i32,
    pub plan_completed: bool,
}

/// Outcome of installment callback verification; a signature mismatch is
/// a normal result, not an error
#[derive(Debug, Clone)]
pub enum InstallmentVerification {
    Verified {
        installment: EmiInstallment,
        payment: Payment,
        progress: EmiProgress,
    },
    Mismatch {
        payment: Payment,
    },
}

/// One row of the admin EMI overview
#[derive(Debug, Clone, Serialize)]
pub struct EmiPlanSummary {
    pub course_purchase_id: String,
    pub course_id: String,
    pub user_id: Option<String>,
    pub purchase_status: String,
    pub total_amount: Decimal,
    pub total_paid: Decimal,
    pub remaining_amount: Decimal,
    pub installments_total: i32,
    pub installments_paid: i32,
    pub next_due_date: Option<NaiveDate>,
}

/// Orchestrates the per-installment payment cycle: charging a single
/// installment, verifying its callback, and rolling plan progress up
/// onto the originating payment and purchase.
pub struct EmiService {
    payments: Arc<dyn PaymentRepository>,
    installments: Arc<dyn InstallmentRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    gateway: Arc<dyn CheckoutGateway>,
    notifier: Arc<dyn Notifier>,
}

impl EmiService {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        installments: Arc<dyn InstallmentRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        gateway: Arc<dyn CheckoutGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            payments,
            installments,
            purchases,
            gateway,
            notifier,
        }
    }

    /// Reserve a gateway order for one scheduled installment.
    ///
    /// Creates a derivative payment linked to the installment and charges
    /// only the installment's due amount. Rejects installments that are
    /// already settled.
    pub async fn pay_installment(&self, installment_id: &str) -> Result<PendingInstallmentCharge> {
        let installment = self
            .installments
            .find_by_id(installment_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Installment '{}' not found", installment_id))
            })?;

        if installment.status == InstallmentStatus::Paid {
            return Err(AppError::already_paid(format!(
                "Installment {} of payment {} is already paid",
                installment.installment_number, installment.payment_id
            )));
        }

        let original = self
            .payments
            .find_by_id(&installment.payment_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Payment '{}' not found", installment.payment_id))
            })?;

        let mut payment = Payment::for_installment(&original, &installment.id, installment.amount_due);
        self.payments.create(&payment).await?;

        let order = self
            .gateway
            .create_order(OrderRequest {
                amount_minor: payment.currency.minor_units(installment.amount_due),
                currency: payment.currency.to_string(),
                receipt: payment.receipt_number.clone(),
            })
            .await?;

        payment.attach_order(order.order_id.clone());
        self.payments.update(&payment).await?;

        info!(
            installment_id = installment.id.as_str(),
            payment_id = payment.id.as_str(),
            order_id = order.order_id.as_str(),
            amount_due = %installment.amount_due,
            "Installment charge reserved"
        );

        Ok(PendingInstallmentCharge {
            installment,
            payment,
            gateway_order: order,
        })
    }

    /// Verify a gateway callback for an installment's derivative payment.
    ///
    /// The installment flips to PAID under a conditional update that only
    /// matches unpaid rows, so two concurrent callbacks settle it exactly
    /// once. LATE installments settle the same way as PENDING ones. After settling,
    /// progress is recounted from stored installments and rolled up: the
    /// originating payment's counter always, and COMPLETED onto the
    /// payment and purchase when the plan is fully paid.
    pub async fn verify_installment_payment(
        &self,
        installment_id: &str,
        gateway_payment_id: &str,
        gateway_order_id: &str,
        gateway_signature: &str,
    ) -> Result<InstallmentVerification> {
        let installment = self
            .installments
            .find_by_id(installment_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Installment '{}' not found", installment_id))
            })?;

        // The callback's order id belongs to the derivative payment that
        // pay_installment reserved for this installment.
        let mut payment = self
            .payments
            .find_by_order_id(gateway_order_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "No payment found for gateway order '{}'",
                    gateway_order_id
                ))
            })?;

        if payment.installment_id.as_deref() != Some(installment_id) {
            return Err(AppError::validation(format!(
                "Gateway order '{}' does not belong to installment '{}'",
                gateway_order_id, installment_id
            )));
        }

        if !self
            .gateway
            .verify_signature(gateway_order_id, gateway_payment_id, gateway_signature)
        {
            warn!(
                payment_id = payment.id.as_str(),
                installment_id = installment_id,
                "Signature mismatch on installment callback"
            );
            if payment.mark_failed() {
                self.payments.update(&payment).await?;
            }
            return Ok(InstallmentVerification::Mismatch { payment });
        }

        let settled = self
            .installments
            .mark_paid_if_unpaid(
                installment_id,
                gateway_payment_id,
                chrono::Utc::now().naive_utc(),
            )
            .await?;
        if !settled {
            return Err(AppError::already_paid(format!(
                "Installment '{}' is already paid",
                installment_id
            )));
        }

        payment.mark_success(
            gateway_payment_id.to_string(),
            gateway_signature.to_string(),
        )?;

        let installment = self
            .installments
            .find_by_id(installment_id)
            .await?
            .unwrap_or(installment);

        let progress = self.roll_up(&mut payment, &installment).await?;
        self.payments.update(&payment).await?;

        info!(
            payment_id = payment.id.as_str(),
            installment_number = installment.installment_number,
            completed = progress.installments_completed,
            plan_completed = progress.plan_completed,
            "Installment payment verified"
        );

        self.send_receipt(&payment, &installment, &progress).await;

        Ok(InstallmentVerification::Verified {
            installment,
            payment,
            progress,
        })
    }

    /// Installment schedule for a user's purchase of a course, ordered by
    /// installment number. Pending installments past their due date are
    /// flagged LATE on the way out.
    pub async fn plan_for_course(
        &self,
        course_id: &str,
        user_id: &str,
    ) -> Result<Vec<EmiInstallment>> {
        let purchase = self
            .purchases
            .find_by_course_and_user(course_id, user_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "No EMI purchase of course '{}' for this user",
                    course_id
                ))
            })?;

        let mut installments = self.installments.find_by_purchase(&purchase.id).await?;
        let mut flagged_late = false;
        for installment in installments.iter_mut() {
            if installment.status == InstallmentStatus::Pending && installment.is_past_due() {
                self.installments.mark_late(&installment.id).await?;
                installment.status = InstallmentStatus::Late;
                flagged_late = true;
            }
        }

        // An overdue installment demotes the plan itself
        if flagged_late {
            if let Some(mut payment) = self.payments.find_by_id(&purchase.payment_id).await? {
                if payment.emi_status == Some(EmiStatus::Active) {
                    payment.emi_status = Some(EmiStatus::Late);
                    payment.updated_at = chrono::Utc::now().naive_utc();
                    self.payments.update(&payment).await?;
                }
            }
        }

        installments.sort_by_key(|i| i.installment_number);
        Ok(installments)
    }

    /// Admin overview of EMI plans, optionally narrowed to one user
    pub async fn emi_summary(&self, user_id: Option<&str>) -> Result<Vec<EmiPlanSummary>> {
        let purchases = self.purchases.list_emi(user_id).await?;

        let mut summaries = Vec::with_capacity(purchases.len());
        for purchase in purchases {
            let mut installments = self.installments.find_by_purchase(&purchase.id).await?;
            installments.sort_by_key(|i| i.installment_number);

            let total_paid: Decimal = installments
                .iter()
                .filter(|i| i.status == InstallmentStatus::Paid)
                .map(|i| i.amount_due)
                .sum();
            let paid = installments
                .iter()
                .filter(|i| i.status == InstallmentStatus::Paid)
                .count() as i32;
            let next_due_date = installments
                .iter()
                .find(|i| i.status != InstallmentStatus::Paid)
                .map(|i| i.due_date);

            summaries.push(EmiPlanSummary {
                course_purchase_id: purchase.id,
                course_id: purchase.course_id,
                user_id: purchase.user_id,
                purchase_status: purchase.status.to_string(),
                total_amount: purchase.total_amount,
                total_paid,
                remaining_amount: purchase.total_amount - total_paid,
                installments_total: installments.len() as i32,
                installments_paid: paid,
                next_due_date,
            });
        }

        Ok(summaries)
    }

    /// Recount progress from stored installments and propagate completion
    /// onto the originating payment and its purchase.
    async fn roll_up(
        &self,
        derivative: &mut Payment,
        installment: &EmiInstallment,
    ) -> Result<EmiProgress> {
        let all = self.installments.find_by_payment(&installment.payment_id).await?;

        let total: Decimal = all.iter().map(|i| i.amount_due).sum();
        let total_paid: Decimal = all
            .iter()
            .filter(|i| i.status == InstallmentStatus::Paid)
            .map(|i| i.amount_due)
            .sum();
        let completed = all
            .iter()
            .filter(|i| i.status == InstallmentStatus::Paid)
            .count() as i32;
        let pending = all.len() as i32 - completed;
        let plan_completed = pending == 0 && !all.is_empty();

        derivative.installments_completed = completed;

        if let Some(mut original) = self.payments.find_by_id(&installment.payment_id).await? {
            original.installments_completed = completed;
            if plan_completed {
                original.emi_status = Some(EmiStatus::Completed);
            }
            original.updated_at = chrono::Utc::now().naive_utc();
            self.payments.update(&original).await?;
        }

        if plan_completed {
            derivative.emi_status = Some(EmiStatus::Completed);
            if let Some(purchase) = self
                .purchases
                .find_by_payment(&installment.payment_id)
                .await?
            {
                self.purchases
                    .update_status(&purchase.id, PurchaseStatus::Completed)
                    .await?;
            }
        }

        Ok(EmiProgress {
            amount_paid_now: installment.amount_due,
            total_paid,
            remaining_amount: total - total_paid,
            installments_completed: completed,
            installments_pending: pending,
            plan_completed,
        })
    }

    async fn send_receipt(
        &self,
        payment: &Payment,
        installment: &EmiInstallment,
        progress: &EmiProgress,
    ) {
        let mail = InstallmentMail {
            to: payment.email.clone(),
            student_name: payment.student_name.clone(),
            installment_number: installment.installment_number,
            total_installments: payment.emi_duration_months.unwrap_or(0),
            amount_paid: installment.amount_due,
            remaining_amount: progress.remaining_amount,
        };

        if let Err(e) = self.notifier.send_installment_receipt(mail).await {
            log_email_failure("installment receipt", &e);
        }
    }
}
