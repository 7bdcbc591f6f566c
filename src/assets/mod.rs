pub mod revenue;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::amortization::{self, PayoffSavings};
use crate::config::DepreciationTable;
use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::loan::Loan;
use crate::types::{AssetCategory, AssetId, PerformanceRating, RiskLevel};

pub use revenue::{RevenueProfile, RevenueRange};

/// loaned assets beyond this LTV are at risk
const AT_RISK_LTV: Decimal = dec!(0.9);
/// loaned assets beyond this LTV carry medium risk
const ELEVATED_LTV: Decimal = dec!(0.7);
const LOANED_AT_RISK_APPRECIATION: Decimal = dec!(-0.3);
const UNLOANED_AT_RISK_APPRECIATION: Decimal = dec!(-0.5);
const ELEVATED_RISK_APPRECIATION: Decimal = dec!(-0.15);
const EXCELLENT_APPRECIATION: Decimal = dec!(0.1);
const FAIR_UNLOANED_APPRECIATION: Decimal = dec!(-0.1);
/// ceiling on the annualized rate (100,000% a year)
pub const MAX_ANNUALIZED_RATE: Decimal = dec!(1000);

/// an owned asset, optionally financed, optionally producing revenue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    pub asset_type: String,
    pub category: AssetCategory,
    pub acquisition_date: DateTime<Utc>,
    pub acquisition_price: Money,
    pub current_market_value: Option<Money>,
    pub custom_depreciation_rate: Option<Rate>,
    pub expense_category_ref: String,
    pub loan: Option<Loan>,
    pub revenue: Option<RevenueProfile>,
}

impl Asset {
    /// create an unfinanced asset valued at its acquisition price
    pub fn new(
        name: impl Into<String>,
        asset_type: impl Into<String>,
        category: AssetCategory,
        acquisition_date: DateTime<Utc>,
        acquisition_price: Money,
    ) -> Result<Self> {
        if !acquisition_price.is_positive() {
            return Err(EngineError::invalid(
                "acquisition_price",
                format!("must be positive, got {}", acquisition_price),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            asset_type: asset_type.into(),
            category,
            acquisition_date,
            acquisition_price,
            current_market_value: None,
            custom_depreciation_rate: None,
            expense_category_ref: String::new(),
            loan: None,
            revenue: None,
        })
    }

    pub fn with_id(mut self, id: AssetId) -> Self {
        self.id = id;
        self
    }

    pub fn with_loan(mut self, loan: Loan) -> Self {
        self.loan = Some(loan);
        self
    }

    pub fn with_market_value(mut self, value: Money) -> Result<Self> {
        if value.is_negative() {
            return Err(EngineError::invalid("current_market_value", format!("must not be negative, got {}", value)));
        }
        self.current_market_value = Some(value);
        Ok(self)
    }

    pub fn with_depreciation_rate(mut self, rate: Rate) -> Self {
        self.custom_depreciation_rate = Some(rate);
        self
    }

    pub fn with_revenue(mut self, revenue: RevenueProfile) -> Self {
        self.revenue = Some(revenue);
        self
    }

    pub fn with_expense_category(mut self, category_ref: impl Into<String>) -> Self {
        self.expense_category_ref = category_ref.into();
        self
    }

    /// externally supplied market value, else what was paid
    pub fn current_value(&self) -> Money {
        self.current_market_value.unwrap_or(self.acquisition_price)
    }

    pub fn has_active_loan(&self) -> bool {
        self.loan.as_ref().is_some_and(Loan::is_active)
    }

    pub fn active_loan(&self) -> Option<&Loan> {
        self.loan.as_ref().filter(|l| l.is_active())
    }

    pub fn remaining_balance(&self, as_of: DateTime<Utc>) -> Money {
        self.loan
            .as_ref()
            .map(|l| l.remaining_balance(as_of))
            .unwrap_or(Money::ZERO)
    }

    pub fn monthly_payment(&self) -> Money {
        self.loan.as_ref().map(Loan::monthly_payment).unwrap_or(Money::ZERO)
    }

    pub fn equity(&self, as_of: DateTime<Utc>) -> Money {
        self.current_value() - self.remaining_balance(as_of)
    }

    pub fn total_appreciation(&self) -> Money {
        self.current_value() - self.acquisition_price
    }

    pub fn appreciation_rate(&self) -> Rate {
        if !self.acquisition_price.is_positive() {
            return Rate::ZERO;
        }
        Rate::from_decimal(self.total_appreciation().as_decimal() / self.acquisition_price.as_decimal())
    }

    /// whole months held, at least one
    pub fn months_owned(&self, as_of: DateTime<Utc>) -> u32 {
        amortization::months_between(self.acquisition_date, as_of).max(1)
    }

    pub fn years_owned(&self, as_of: DateTime<Utc>) -> Decimal {
        Decimal::from(self.months_owned(as_of)) / Decimal::from(12)
    }

    /// compound annual growth rate since acquisition
    ///
    /// Capped at [`MAX_ANNUALIZED_RATE`], which is also returned when the
    /// growth factor is too large to represent (large gains over a few months).
    pub fn annualized_appreciation_rate(&self, as_of: DateTime<Utc>) -> Rate {
        if !self.acquisition_price.is_positive() {
            return Rate::ZERO;
        }

        let years = self.years_owned(as_of);
        let base = self.current_value().as_decimal() / self.acquisition_price.as_decimal();
        if base <= Decimal::ZERO {
            return -Rate::ONE;
        }

        let exponent = Decimal::ONE / years;
        let cap = Rate::from_decimal(MAX_ANNUALIZED_RATE);
        match base.checked_powd(exponent) {
            Some(factor) => Rate::from_decimal(factor - Decimal::ONE).min(cap),
            None => cap,
        }
    }

    /// remaining loan balance over current value
    pub fn loan_to_value_ratio(&self, as_of: DateTime<Utc>) -> Rate {
        let balance = self.remaining_balance(as_of);
        let value = self.current_value();
        if !value.is_positive() {
            return if balance.is_positive() { Rate::ONE } else { Rate::ZERO };
        }
        balance.ratio_to(value)
    }

    pub fn is_underwater(&self, as_of: DateTime<Utc>) -> bool {
        self.has_active_loan() && self.equity(as_of).is_negative()
    }

    pub fn is_at_risk(&self, as_of: DateTime<Utc>) -> bool {
        let appreciation = self.appreciation_rate().as_decimal();
        if self.has_active_loan() {
            self.is_underwater(as_of)
                || appreciation < LOANED_AT_RISK_APPRECIATION
                || self.loan_to_value_ratio(as_of).as_decimal() > AT_RISK_LTV
        } else {
            appreciation < UNLOANED_AT_RISK_APPRECIATION
        }
    }

    pub fn risk_level(&self, as_of: DateTime<Utc>) -> RiskLevel {
        if self.is_at_risk(as_of) {
            return RiskLevel::High;
        }

        let elevated_ltv =
            self.has_active_loan() && self.loan_to_value_ratio(as_of).as_decimal() > ELEVATED_LTV;
        if elevated_ltv || self.appreciation_rate().as_decimal() < ELEVATED_RISK_APPRECIATION {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn performance_rating(&self, as_of: DateTime<Utc>) -> PerformanceRating {
        let equity_positive = self.equity(as_of).is_positive();
        let appreciation = self.appreciation_rate().as_decimal();

        if equity_positive && appreciation > EXCELLENT_APPRECIATION {
            PerformanceRating::Excellent
        } else if equity_positive && appreciation > Decimal::ZERO {
            PerformanceRating::Good
        } else if equity_positive
            || (!self.has_active_loan() && appreciation > FAIR_UNLOANED_APPRECIATION)
        {
            PerformanceRating::Fair
        } else {
            PerformanceRating::Poor
        }
    }

    /// annual value change: the asset's own rate, else the configured default for its type
    pub fn annual_value_change(&self, table: &DepreciationTable) -> Rate {
        self.custom_depreciation_rate
            .unwrap_or_else(|| table.rate_for(&self.asset_type, self.category))
    }

    /// `current_value * (1 + rate)^years`
    pub fn projected_value(&self, after_years: u32, table: &DepreciationTable) -> Money {
        let rate = self.annual_value_change(table);
        let base = (Decimal::ONE + rate.as_decimal()).max(Decimal::ZERO);

        base.checked_powu(after_years as u64)
            .and_then(|factor| self.current_value().as_decimal().checked_mul(factor))
            .map(Money::from_decimal)
            .unwrap_or_else(|| Money::from_decimal(Decimal::MAX))
    }

    /// how close the asset is to being worth selling; lower sorts first
    pub fn flip_score(&self, as_of: DateTime<Utc>) -> Decimal {
        let equity_share = self.equity(as_of).ratio_to(self.current_value());
        equity_share.as_decimal() + self.appreciation_rate().as_decimal()
    }

    /// months and interest saved by paying `extra_payment` more on the loan each month
    pub fn payoff_analysis(&self, extra_payment: Money, as_of: DateTime<Utc>) -> Result<PayoffSavings> {
        match self.active_loan() {
            Some(loan) => loan.payoff_savings(extra_payment, as_of),
            None => Ok(PayoffSavings::default()),
        }
    }

    /// months of expected revenue to recover the acquisition price
    pub fn revenue_payback_months(&self) -> Option<u32> {
        self.revenue
            .as_ref()
            .and_then(|r| r.payback_months(self.acquisition_price))
    }

    /// close out the loan, if any; false when nothing changed
    pub fn mark_loan_paid_off(&mut self, at: DateTime<Utc>) -> bool {
        self.loan.as_mut().is_some_and(|l| l.mark_paid_off(at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::LoanTerms;
    use chrono::TimeZone;

    fn acquired() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap()
    }

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn car(price: i64) -> Asset {
        Asset::new("Hatchback", "vehicle", AssetCategory::Tangible, acquired(), Money::from_major(price)).unwrap()
    }

    fn loan(amount: i64, percent: u32, years: u32) -> Loan {
        Loan::new(
            LoanTerms::new(
                Money::from_major(amount),
                Rate::from_percentage(percent),
                years,
                acquired(),
                Money::ZERO,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let result = Asset::new("Nothing", "vehicle", AssetCategory::Tangible, acquired(), Money::ZERO);
        assert!(matches!(result, Err(EngineError::InvalidInput { field: "acquisition_price", .. })));
    }

    #[test]
    fn test_current_value_falls_back_to_price() {
        let asset = car(20_000);
        assert_eq!(asset.current_value(), Money::from_major(20_000));

        let asset = asset.with_market_value(Money::from_major(15_000)).unwrap();
        assert_eq!(asset.current_value(), Money::from_major(15_000));
        assert_eq!(asset.total_appreciation(), Money::from_major(-5_000));
        assert_eq!(asset.appreciation_rate().as_decimal(), dec!(-0.25));
    }

    #[test]
    fn test_equity_is_value_minus_balance() {
        let asset = car(30_000)
            .with_market_value(Money::from_major(25_000))
            .unwrap()
            .with_loan(loan(30_000, 6, 5));

        let balance = asset.remaining_balance(as_of());
        assert!(balance.is_positive());
        assert_eq!(asset.equity(as_of()), asset.current_value() - balance);
    }

    #[test]
    fn test_underwater_requires_active_loan() {
        let mut asset = car(40_000)
            .with_market_value(Money::from_major(10_000))
            .unwrap()
            .with_loan(loan(40_000, 5, 10));

        assert!(asset.is_underwater(as_of()));
        assert!(asset.is_at_risk(as_of()));
        assert_eq!(asset.risk_level(as_of()), RiskLevel::High);
        assert_eq!(asset.performance_rating(as_of()), PerformanceRating::Poor);

        assert!(asset.mark_loan_paid_off(as_of()));
        assert!(!asset.is_underwater(as_of()));
        assert_eq!(asset.equity(as_of()), Money::from_major(10_000));
    }

    #[test]
    fn test_unloaned_risk_and_rating() {
        let steady = car(10_000).with_market_value(Money::from_major(9_500)).unwrap();
        assert!(!steady.is_at_risk(as_of()));
        assert_eq!(steady.risk_level(as_of()), RiskLevel::Low);
        assert_eq!(steady.performance_rating(as_of()), PerformanceRating::Fair);

        let sliding = car(10_000).with_market_value(Money::from_major(8_000)).unwrap();
        assert_eq!(sliding.risk_level(as_of()), RiskLevel::Medium);

        let crashed = car(10_000).with_market_value(Money::from_major(4_000)).unwrap();
        assert!(crashed.is_at_risk(as_of()));
        assert_eq!(crashed.risk_level(as_of()), RiskLevel::High);

        let grown = car(10_000).with_market_value(Money::from_major(12_000)).unwrap();
        assert_eq!(grown.performance_rating(as_of()), PerformanceRating::Excellent);

        let nudged = car(10_000).with_market_value(Money::from_major(10_500)).unwrap();
        assert_eq!(nudged.performance_rating(as_of()), PerformanceRating::Good);
    }

    #[test]
    fn test_elevated_ltv_is_medium_risk() {
        // fresh loan for 80% of the value
        let asset = Asset::new("Flat", "real estate", AssetCategory::Tangible, as_of(), Money::from_major(100_000))
            .unwrap()
            .with_loan(Loan::new(
                LoanTerms::new(Money::from_major(80_000), Rate::from_percentage(4), 25, as_of(), Money::ZERO)
                    .unwrap(),
            ));

        assert_eq!(asset.loan_to_value_ratio(as_of()).as_decimal(), dec!(0.8));
        assert!(!asset.is_at_risk(as_of()));
        assert_eq!(asset.risk_level(as_of()), RiskLevel::Medium);
        assert_eq!(asset.performance_rating(as_of()), PerformanceRating::Fair);
    }

    #[test]
    fn test_annualized_appreciation() {
        let asset = Asset::new("Plot", "real_estate", AssetCategory::Tangible, acquired(), Money::from_major(100_000))
            .unwrap()
            .with_market_value(Money::from_major(121_000))
            .unwrap();

        assert_eq!(asset.months_owned(as_of()), 24);
        let cagr = asset.annualized_appreciation_rate(as_of()).as_decimal();
        assert!((cagr - dec!(0.1)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_future_dated_asset_clamps_ownership() {
        let future = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let asset = Asset::new("Preorder", "vehicle", AssetCategory::Tangible, future, Money::from_major(1_000))
            .unwrap()
            .with_market_value(Money::from_major(1_100))
            .unwrap();

        assert_eq!(asset.months_owned(as_of()), 1);
        assert_eq!(asset.years_owned(as_of()), Decimal::ONE / Decimal::from(12));
        assert!(asset.annualized_appreciation_rate(as_of()).as_decimal() > Decimal::ONE);
    }

    #[test]
    fn test_annualized_rate_is_capped_when_growth_overflows() {
        let future = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let asset = Asset::new("Collectible", "art", AssetCategory::Tangible, future, Money::from_major(1))
            .unwrap()
            .with_market_value(Money::from_major(1_000_000))
            .unwrap();

        // 1e6 ^ 12 does not fit in a decimal
        let rate = asset.annualized_appreciation_rate(as_of());
        assert_eq!(rate.as_decimal(), MAX_ANNUALIZED_RATE);
        assert_ne!(rate, asset.appreciation_rate());
    }

    #[test]
    fn test_projected_value_uses_table_or_custom_rate() {
        let table = DepreciationTable::default();
        let asset = car(10_000);

        assert_eq!(asset.projected_value(0, &table), Money::from_major(10_000));
        assert_eq!(asset.projected_value(1, &table), Money::from_major(8_500));
        assert_eq!(asset.projected_value(2, &table), Money::from_major(7_225));

        let custom = car(10_000).with_depreciation_rate(Rate::from_percentage(10));
        assert_eq!(custom.projected_value(1, &table), Money::from_major(11_000));

        let wiped = car(10_000).with_depreciation_rate(Rate::from_decimal(dec!(-1.5)));
        assert_eq!(wiped.projected_value(3, &table), Money::ZERO);
    }

    #[test]
    fn test_payoff_analysis() {
        let unloaned = car(10_000);
        assert_eq!(
            unloaned.payoff_analysis(Money::from_major(100), as_of()).unwrap(),
            PayoffSavings::default()
        );

        let financed = car(30_000).with_loan(loan(30_000, 7, 6));
        let savings = financed.payoff_analysis(Money::from_major(150), as_of()).unwrap();
        assert!(savings.months_saved > 0);

        // past the term the balance is gone
        let matured = Utc.with_ymd_and_hms(2029, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            financed.payoff_analysis(Money::from_major(150), matured).unwrap(),
            PayoffSavings::default()
        );
    }

    #[test]
    fn test_flip_score() {
        let asset = car(10_000).with_market_value(Money::from_major(12_000)).unwrap();
        // full equity (1.0) plus 20% appreciation
        assert_eq!(asset.flip_score(as_of()), dec!(1.2));
    }

    #[test]
    fn test_revenue_payback() {
        let shop = Asset::new("Print shop", "business", AssetCategory::Intangible, acquired(), Money::from_major(12_000))
            .unwrap()
            .with_revenue(RevenueProfile::new(Money::from_major(1_000), Rate::ONE, Rate::ZERO).unwrap());

        assert_eq!(shop.revenue_payback_months(), Some(12));
        assert_eq!(car(5_000).revenue_payback_months(), None);
    }
}
