pub mod payoff;
pub mod schedule;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::{Decimal, MathematicalOps};

use crate::decimal::{Money, Rate};

pub use payoff::{payoff_savings, payoff_time, PayoffSavings};
pub use schedule::{AmortizationSchedule, ScheduledPayment};

/// longest term accepted for a loan
pub const MAX_TERM_YEARS: u32 = 100;

/// number of monthly payments for a term
pub fn total_payments(term_years: u32) -> u32 {
    term_years.saturating_mul(12)
}

/// whole calendar months from `start` to `as_of`, zero when `as_of` precedes `start`
pub fn months_between(start: DateTime<Utc>, as_of: DateTime<Utc>) -> u32 {
    if as_of <= start {
        return 0;
    }

    let mut months = (as_of.year() - start.year()) as i64 * 12
        + as_of.month() as i64
        - start.month() as i64;

    // a month only counts once its anniversary day has been reached
    if as_of.day() < start.day() {
        months -= 1;
    }

    months.clamp(0, u32::MAX as i64) as u32
}

/// (1 + r)^n, `None` when the power overflows the decimal range
fn growth_factor(monthly_rate: Decimal, periods: u32) -> Option<Decimal> {
    (Decimal::ONE + monthly_rate).checked_powu(periods as u64)
}

/// level monthly payment for a fully amortizing loan
///
/// `P * r * (1 + r)^n / ((1 + r)^n - 1)` with `r` the monthly rate and `n` the
/// number of payments. A zero rate falls back to straight-line `P / n`. A
/// non-positive principal, an empty term, or a negative rate carry no
/// obligation and yield zero.
pub fn monthly_payment(principal: Money, annual_rate: Rate, term_years: u32) -> Money {
    let n = total_payments(term_years);
    if !principal.is_positive() || n == 0 || annual_rate.is_negative() {
        return Money::ZERO;
    }

    let r = annual_rate.monthly_rate().as_decimal();
    if r.is_zero() {
        return principal / Decimal::from(n);
    }

    match growth_factor(r, n) {
        Some(compound) => {
            let numerator = principal.as_decimal() * r * compound;
            let denominator = compound - Decimal::ONE;
            Money::from_decimal(numerator / denominator)
        }
        // (1 + r)^n too large to represent: the payment converges to interest only
        None => principal * r,
    }
}

/// principal still owed after `months_elapsed` scheduled payments
pub fn remaining_balance(
    principal: Money,
    annual_rate: Rate,
    term_years: u32,
    months_elapsed: u32,
) -> Money {
    let n = total_payments(term_years);
    if months_elapsed >= n || !principal.is_positive() || annual_rate.is_negative() {
        return Money::ZERO;
    }

    if months_elapsed == 0 {
        return principal;
    }

    let r = annual_rate.monthly_rate().as_decimal();
    if r.is_zero() {
        let per_month = principal / Decimal::from(n);
        return (principal - per_month * Decimal::from(months_elapsed)).non_negative();
    }

    // present value of the payments still to come
    let payment = monthly_payment(principal, annual_rate, term_years);
    let remaining = n - months_elapsed;
    let balance = match growth_factor(r, remaining) {
        Some(compound) => {
            let discount = Decimal::ONE - Decimal::ONE / compound;
            payment * (discount / r)
        }
        None => payment / r,
    };

    balance.min(principal).non_negative()
}

/// interest paid through the first `months_elapsed` payments; zero for a zero-rate loan
pub fn interest_paid_to_date(
    principal: Money,
    annual_rate: Rate,
    term_years: u32,
    months_elapsed: u32,
) -> Money {
    let n = total_payments(term_years);
    if annual_rate.is_zero() || !principal.is_positive() {
        return Money::ZERO;
    }
    if months_elapsed >= n {
        return total_interest(principal, annual_rate, term_years);
    }

    let payment = monthly_payment(principal, annual_rate, term_years);
    let paid = payment * Decimal::from(months_elapsed);
    let principal_reduction =
        principal - remaining_balance(principal, annual_rate, term_years, months_elapsed);

    (paid - principal_reduction).non_negative()
}

/// interest over the full life of the loan
///
/// The final payment clears whatever balance is left after `n - 1` level
/// payments, matching the last row of [`AmortizationSchedule`].
pub fn total_interest(principal: Money, annual_rate: Rate, term_years: u32) -> Money {
    let n = total_payments(term_years);
    let payment = monthly_payment(principal, annual_rate, term_years);
    if payment.is_zero() || annual_rate.is_zero() {
        return Money::ZERO;
    }

    let r = annual_rate.monthly_rate().as_decimal();
    let last_balance = remaining_balance(principal, annual_rate, term_years, n - 1);
    let final_payment = last_balance * (Decimal::ONE + r);

    (payment * Decimal::from(n - 1) + final_payment - principal).non_negative()
}

/// interest still to be paid after `months_elapsed` payments
pub fn remaining_interest(
    principal: Money,
    annual_rate: Rate,
    term_years: u32,
    months_elapsed: u32,
) -> Money {
    let total = total_interest(principal, annual_rate, term_years);
    let paid = interest_paid_to_date(principal, annual_rate, term_years, months_elapsed);
    (total - paid).non_negative()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_payment_annuity() {
        let payment = monthly_payment(Money::from_major(1_000_000), Rate::from_percentage(12), 1);
        assert_eq!(payment.round_dp(2), Money::from_str_exact("88848.79").unwrap());
    }

    #[test]
    fn test_monthly_payment_zero_rate() {
        let payment = monthly_payment(Money::from_major(120_000), Rate::ZERO, 1);
        assert_eq!(payment, Money::from_major(10_000));
    }

    #[test]
    fn test_monthly_payment_degenerate_inputs() {
        assert_eq!(monthly_payment(Money::ZERO, Rate::from_percentage(5), 30), Money::ZERO);
        assert_eq!(monthly_payment(Money::from_major(-10), Rate::from_percentage(5), 30), Money::ZERO);
        assert_eq!(monthly_payment(Money::from_major(1_000), Rate::from_percentage(5), 0), Money::ZERO);
        assert_eq!(
            monthly_payment(Money::from_major(1_000), Rate::from_decimal(dec!(-0.01)), 5),
            Money::ZERO
        );
    }

    #[test]
    fn test_remaining_balance_consistent_with_interest() {
        let principal = Money::from_major(1_000_000);
        let rate = Rate::from_percentage(12);
        let payment = monthly_payment(principal, rate, 1);

        let balance = remaining_balance(principal, rate, 1, 6);
        let interest = interest_paid_to_date(principal, rate, 1, 6);

        // principal reduction equals payments made minus interest
        let reduction = payment * dec!(6) - interest;
        assert!((principal - reduction - balance).abs() < Money::from_str_exact("0.01").unwrap());
        assert!(balance > Money::from_major(500_000));
        assert!(balance < principal);
    }

    #[test]
    fn test_remaining_balance_zero_rate_is_exact() {
        let balance = remaining_balance(Money::from_major(120_000), Rate::ZERO, 1, 6);
        assert_eq!(balance, Money::from_major(60_000));
    }

    #[test]
    fn test_fully_amortized_balance_is_zero() {
        for rate in [Rate::ZERO, Rate::from_percentage(3), Rate::from_percentage(18)] {
            assert_eq!(remaining_balance(Money::from_major(50_000), rate, 5, 60), Money::ZERO);
            assert_eq!(remaining_balance(Money::from_major(50_000), rate, 5, 200), Money::ZERO);
        }
    }

    #[test]
    fn test_interest_totals() {
        let principal = Money::from_major(100_000);
        let rate = Rate::from_percentage(6);

        let total = total_interest(principal, rate, 30);
        let paid = interest_paid_to_date(principal, rate, 30, 120);
        let remaining = remaining_interest(principal, rate, 30, 120);

        assert!(total > Money::from_major(115_000));
        assert!(total < Money::from_major(116_000));
        assert!((paid + remaining - total).abs() < Money::from_str_exact("0.01").unwrap());

        // nothing left once the term has run
        assert_eq!(remaining_interest(principal, rate, 30, 360), Money::ZERO);
        assert_eq!(total_interest(principal, Rate::ZERO, 30), Money::ZERO);
    }

    #[test]
    fn test_zero_rate_loan_carries_no_interest() {
        // 100000 / 360 does not divide evenly at money precision
        let principal = Money::from_major(100_000);

        assert_eq!(total_interest(principal, Rate::ZERO, 30), Money::ZERO);
        assert_eq!(interest_paid_to_date(principal, Rate::ZERO, 30, 7), Money::ZERO);
        assert_eq!(remaining_interest(principal, Rate::ZERO, 30, 7), Money::ZERO);
        assert_eq!(interest_paid_to_date(principal, Rate::ZERO, 30, 360), Money::ZERO);
    }

    #[test]
    fn test_total_interest_matches_schedule() {
        let principal = Money::from_major(25_000);
        let rate = Rate::from_percentage(7);
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let schedule = AmortizationSchedule::generate(principal, rate, 5, start);
        let total = total_interest(principal, rate, 5);

        assert!((schedule.total_interest - total).abs() < Money::from_str_exact("0.01").unwrap());
        assert_eq!(interest_paid_to_date(principal, rate, 5, 60), total);
        assert_eq!(remaining_interest(principal, rate, 5, 60), Money::ZERO);
    }

    #[test]
    fn test_months_between() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();

        assert_eq!(months_between(start, Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap()), 0);
        assert_eq!(months_between(start, Utc.with_ymd_and_hms(2024, 2, 14, 0, 0, 0).unwrap()), 0);
        assert_eq!(months_between(start, Utc.with_ymd_and_hms(2024, 2, 15, 0, 0, 0).unwrap()), 1);
        assert_eq!(months_between(start, Utc.with_ymd_and_hms(2025, 7, 31, 0, 0, 0).unwrap()), 18);

        // future start dates clamp to zero
        assert_eq!(months_between(start, Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap()), 0);
    }
}
