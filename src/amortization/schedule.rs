use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};

use super::{monthly_payment, total_payments, MAX_TERM_YEARS};

/// one row of an amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPayment {
    pub payment_number: u32,
    pub payment_date: DateTime<Utc>,
    pub beginning_balance: Money,
    pub payment_amount: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub ending_balance: Money,
    pub cumulative_interest: Money,
}

/// month-by-month amortization schedule for a level-payment loan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub payments: Vec<ScheduledPayment>,
    pub total_interest: Money,
    pub total_payment: Money,
}

impl AmortizationSchedule {
    /// generate the full schedule, first payment one month after `start_date`
    ///
    /// Terms longer than [`MAX_TERM_YEARS`] produce an empty schedule.
    pub fn generate(
        principal: Money,
        annual_rate: Rate,
        term_years: u32,
        start_date: DateTime<Utc>,
    ) -> Self {
        let emi = monthly_payment(principal, annual_rate, term_years);
        if emi.is_zero() || term_years > MAX_TERM_YEARS {
            return Self::default();
        }

        let monthly_rate = annual_rate.monthly_rate().as_decimal();
        let term_months = total_payments(term_years);

        let mut payments = Vec::with_capacity(term_months as usize);
        let mut balance = principal;
        let mut cumulative_interest = Money::ZERO;

        for i in 1..=term_months {
            let interest_portion = balance * monthly_rate;
            let mut principal_portion = (emi - interest_portion).min(balance);
            let mut payment_amount = principal_portion + interest_portion;

            // final payment clears whatever rounding left behind
            if i == term_months {
                principal_portion = balance;
                payment_amount = balance + interest_portion;
            }

            cumulative_interest += interest_portion;
            let ending_balance = (balance - principal_portion).non_negative();

            payments.push(ScheduledPayment {
                payment_number: i,
                payment_date: add_months(start_date, i),
                beginning_balance: balance,
                payment_amount,
                principal_portion,
                interest_portion,
                ending_balance,
                cumulative_interest,
            });

            balance = ending_balance;
        }

        let total_payment = payments.iter().map(|p| p.payment_amount).sum();

        Self {
            payments,
            total_interest: cumulative_interest,
            total_payment,
        }
    }

    /// get payment for specific period (1-based)
    pub fn get_payment(&self, payment_number: u32) -> Option<&ScheduledPayment> {
        payment_number
            .checked_sub(1)
            .and_then(|index| self.payments.get(index as usize))
    }

    /// balance after the given payment, the opening principal before the first one
    pub fn balance_after_payment(&self, payment_number: u32) -> Money {
        match self.get_payment(payment_number) {
            Some(p) => p.ending_balance,
            None if payment_number == 0 => self
                .payments
                .first()
                .map(|p| p.beginning_balance)
                .unwrap_or(Money::ZERO),
            None => Money::ZERO,
        }
    }

    /// payments falling strictly after `as_of`
    pub fn remaining_payments(&self, as_of: DateTime<Utc>) -> impl Iterator<Item = &ScheduledPayment> {
        self.payments.iter().filter(move |p| p.payment_date > as_of)
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.payments.len()
    }
}

/// add calendar months, clamping to the last day of shorter months
fn add_months(date: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    date.checked_add_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
