use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::info;

use crate::core::{AppError, Result};
use crate::modules::installments::models::EmiInstallment;

/// Generator for EMI installment schedules.
///
/// Splits a course price into equal monthly charges, absorbing the
/// rounding remainder into the final installment so the schedule sums
/// back to the total exactly.
pub struct ScheduleGenerator;

impl ScheduleGenerator {
    /// Per-month charge for an EMI plan: round(total / months), half-up,
    /// in whole currency units.
    ///
    /// This is the single source of the amount-charged-now computation;
    /// the purchase orchestrator uses it for the first charge and the
    /// generator uses it for every scheduled installment, so the two can
    /// never drift apart.
    pub fn monthly_charge(total_amount: Decimal, months: i32) -> Decimal {
        (total_amount / Decimal::from(months))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Build the installment schedule for an EMI plan.
    ///
    /// Installment *i* is due exactly *i* calendar months from `start_date`
    /// for i = 1..=months. Trusts the caller to have rejected plans with
    /// fewer than two months.
    ///
    /// # Arguments
    /// * `total_amount` - Total course price to split
    /// * `months` - Plan duration in months
    /// * `payment_id` - Originating payment
    /// * `user_id` - Plan owner, if a registered user
    /// * `course_purchase_id` - Owning purchase, if linked
    /// * `start_date` - Initiation date (first due date is one month later)
    pub fn generate(
        total_amount: Decimal,
        months: i32,
        payment_id: &str,
        user_id: Option<&str>,
        course_purchase_id: Option<&str>,
        start_date: NaiveDate,
    ) -> Result<Vec<EmiInstallment>> {
        let monthly_amount = Self::monthly_charge(total_amount, months);

        info!(
            payment_id = payment_id,
            months = months,
            total_amount = %total_amount,
            monthly_amount = %monthly_amount,
            "Generating installment schedule"
        );

        let mut installments = Vec::with_capacity(months as usize);
        let mut distributed = Decimal::ZERO;

        for i in 1..=months {
            let amount_due = if i == months {
                // Last installment absorbs the rounding remainder
                total_amount - distributed
            } else {
                monthly_amount
            };

            let due_date = start_date
                .checked_add_months(Months::new(i as u32))
                .ok_or_else(|| AppError::validation("Failed to calculate due date"))?;

            distributed += amount_due;

            installments.push(EmiInstallment::new(
                payment_id.to_string(),
                course_purchase_id.map(str::to_string),
                user_id.map(str::to_string),
                i,
                amount_due,
                due_date,
            ));
        }

        Ok(installments)
    }
}
