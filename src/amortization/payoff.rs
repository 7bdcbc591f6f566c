use log::warn;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};

/// effect of adding an extra amount to every monthly payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PayoffSavings {
    pub months_saved: u32,
    pub interest_saved: Money,
    pub baseline_months: u32,
    pub accelerated_months: u32,
}

/// months needed to retire `balance` at a fixed monthly payment
///
/// Closed form `-ln(1 - B*r/P) / ln(1 + r)`, rounded up to whole months.
/// A payment that does not exceed the first month's interest never retires
/// the balance and is reported as [`EngineError::NonAmortizing`].
pub fn payoff_time(balance: Money, monthly_rate: Rate, payment: Money) -> Result<u32> {
    if !balance.is_positive() {
        return Ok(0);
    }

    let r = monthly_rate.as_decimal().max(Decimal::ZERO);
    let monthly_interest = balance * r;

    if payment <= monthly_interest || !payment.is_positive() {
        warn!(
            "payment {} does not cover monthly interest {} on balance {}",
            payment, monthly_interest, balance
        );
        return Err(EngineError::NonAmortizing {
            balance,
            payment,
            monthly_interest,
        });
    }

    let months = if r.is_zero() {
        balance.as_decimal() / payment.as_decimal()
    } else {
        let coverage = Decimal::ONE - balance.as_decimal() * r / payment.as_decimal();
        let numerator = coverage.checked_ln().ok_or_else(|| overflow("payoff numerator"))?;
        let denominator = (Decimal::ONE + r)
            .checked_ln()
            .ok_or_else(|| overflow("payoff denominator"))?;
        -numerator / denominator
    };

    // absorb ln rounding noise before taking the ceiling
    months
        .round_dp(4)
        .ceil()
        .to_u32()
        .ok_or_else(|| overflow("payoff months"))
}

/// months and interest saved by paying `extra_payment` on top of `current_payment`
pub fn payoff_savings(
    balance: Money,
    annual_rate: Rate,
    current_payment: Money,
    extra_payment: Money,
) -> Result<PayoffSavings> {
    if !balance.is_positive() {
        return Ok(PayoffSavings::default());
    }

    let monthly_rate = annual_rate.monthly_rate();
    let baseline_months = payoff_time(balance, monthly_rate, current_payment)?;

    if !extra_payment.is_positive() {
        return Ok(PayoffSavings {
            baseline_months,
            accelerated_months: baseline_months,
            ..PayoffSavings::default()
        });
    }

    let accelerated_payment = current_payment + extra_payment;
    let accelerated_months = payoff_time(balance, monthly_rate, accelerated_payment)?;

    let baseline_interest =
        (current_payment * Decimal::from(baseline_months) - balance).non_negative();
    let accelerated_interest =
        (accelerated_payment * Decimal::from(accelerated_months) - balance).non_negative();

    Ok(PayoffSavings {
        months_saved: baseline_months.saturating_sub(accelerated_months),
        interest_saved: (baseline_interest - accelerated_interest).non_negative(),
        baseline_months,
        accelerated_months,
    })
}

fn overflow(stage: &str) -> EngineError {
    EngineError::invalid("payoff_time", format!("{} out of range", stage))
}
