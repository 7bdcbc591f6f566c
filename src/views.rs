//! serializable snapshots for presentation layers
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assets::Asset;
use crate::config::DepreciationTable;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::loan::LoanStatus;
use crate::portfolio::{Portfolio, PortfolioHealth};
use crate::recommendations::Recommendation;
use crate::scoring::{CapitalAllocation, FinancialHealthScore};
use crate::types::{AssetCategory, AssetId, Grade, PerformanceRating, RiskLevel};

/// one asset's valuation and loan position as of a given instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetView {
    pub id: AssetId,
    pub name: String,
    pub asset_type: String,
    pub category: AssetCategory,
    pub valuation: ValuationView,
    pub loan: LoanView,
    pub risk_level: RiskLevel,
    pub performance_rating: PerformanceRating,
    pub is_underwater: bool,
    pub is_at_risk: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationView {
    pub acquisition_date: DateTime<Utc>,
    pub acquisition_price: Money,
    pub current_value: Money,
    pub equity: Money,
    pub total_appreciation: Money,
    pub appreciation_rate: Rate,
    pub annualized_appreciation_rate: Rate,
    pub annual_value_change: Rate,
    pub projected_value_one_year: Money,
    pub months_owned: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanView {
    pub status: LoanStatus,
    pub interest_rate: Rate,
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub remaining_balance: Money,
    pub interest_paid_to_date: Money,
    pub remaining_interest: Money,
    pub loan_to_value_ratio: Rate,
    pub paid_off_date: Option<DateTime<Utc>>,
}

impl AssetView {
    pub fn from_asset(asset: &Asset, as_of: DateTime<Utc>, table: &DepreciationTable) -> Self {
        let loan = asset.loan.as_ref();

        AssetView {
            id: asset.id,
            name: asset.name.clone(),
            asset_type: asset.asset_type.clone(),
            category: asset.category,
            valuation: ValuationView {
                acquisition_date: asset.acquisition_date,
                acquisition_price: asset.acquisition_price,
                current_value: asset.current_value(),
                equity: asset.equity(as_of),
                total_appreciation: asset.total_appreciation(),
                appreciation_rate: asset.appreciation_rate(),
                annualized_appreciation_rate: asset.annualized_appreciation_rate(as_of),
                annual_value_change: asset.annual_value_change(table),
                projected_value_one_year: asset.projected_value(1, table),
                months_owned: asset.months_owned(as_of),
            },
            loan: LoanView {
                status: loan.map(|l| l.status()).unwrap_or(LoanStatus::NoLoan),
                interest_rate: loan.map(|l| l.interest_rate()).unwrap_or(Rate::ZERO),
                loan_amount: loan.map(|l| l.loan_amount()).unwrap_or(Money::ZERO),
                monthly_payment: asset.monthly_payment(),
                remaining_balance: asset.remaining_balance(as_of),
                interest_paid_to_date: loan
                    .map(|l| l.interest_paid_to_date(as_of))
                    .unwrap_or(Money::ZERO),
                remaining_interest: loan
                    .map(|l| l.remaining_interest(as_of))
                    .unwrap_or(Money::ZERO),
                loan_to_value_ratio: asset.loan_to_value_ratio(as_of),
                paid_off_date: loan.and_then(|l| l.paid_off_date()),
            },
            risk_level: asset.risk_level(as_of),
            performance_rating: asset.performance_rating(as_of),
            is_underwater: asset.is_underwater(as_of),
            is_at_risk: asset.is_at_risk(as_of),
        }
    }
}

/// portfolio aggregates plus the three asset orderings, by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub as_of: DateTime<Utc>,
    pub asset_count: usize,
    pub total_value: Money,
    pub total_acquisition_cost: Money,
    pub total_debt: Money,
    pub total_equity: Money,
    pub total_monthly_payments: Money,
    pub total_appreciation: Money,
    pub appreciation_rate: Rate,
    pub average_interest_rate: Rate,
    pub loan_to_value_ratio: Rate,
    pub health: PortfolioHealth,
    pub at_risk_assets: Vec<AssetId>,
    pub underwater_assets: Vec<AssetId>,
    pub optimal_payoff_order: Vec<AssetId>,
    pub emotional_payoff_order: Vec<AssetId>,
    pub flip_priority_order: Vec<AssetId>,
    pub assets: Vec<AssetView>,
}

impl PortfolioSummary {
    pub fn from_portfolio(portfolio: &Portfolio, as_of: DateTime<Utc>, table: &DepreciationTable) -> Self {
        PortfolioSummary {
            as_of,
            asset_count: portfolio.len(),
            total_value: portfolio.total_value(),
            total_acquisition_cost: portfolio.total_acquisition_cost(),
            total_debt: portfolio.total_debt(as_of),
            total_equity: portfolio.total_equity(as_of),
            total_monthly_payments: portfolio.total_monthly_payments(),
            total_appreciation: portfolio.total_appreciation(),
            appreciation_rate: portfolio.appreciation_rate(),
            average_interest_rate: portfolio.average_interest_rate(),
            loan_to_value_ratio: portfolio.loan_to_value_ratio(as_of),
            health: portfolio.health_score(as_of),
            at_risk_assets: ids(portfolio.at_risk_assets(as_of)),
            underwater_assets: ids(portfolio.underwater_assets(as_of)),
            optimal_payoff_order: ids(portfolio.optimal_payoff_order()),
            emotional_payoff_order: ids(portfolio.emotional_payoff_order(as_of)),
            flip_priority_order: ids(portfolio.flip_priority_order(as_of)),
            assets: portfolio
                .assets()
                .iter()
                .map(|a| AssetView::from_asset(a, as_of, table))
                .collect(),
        }
    }
}

fn ids(assets: Vec<&Asset>) -> Vec<AssetId> {
    assets.into_iter().map(|a| a.id).collect()
}

/// everything one evaluation pass produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialReport {
    pub as_of: DateTime<Utc>,
    pub portfolio: PortfolioSummary,
    pub net_worth: Money,
    pub allocation: CapitalAllocation,
    pub health: FinancialHealthScore,
    pub overall_score: Decimal,
    pub grade: Grade,
    pub recommendations: Vec<Recommendation>,
}

impl FinancialReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::{Loan, LoanTerms};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_asset_view_without_loan() {
        let asset = Asset::new("Laptop", "equipment", AssetCategory::Tangible, as_of(), Money::from_major(2_000)).unwrap();
        let view = AssetView::from_asset(&asset, as_of(), &DepreciationTable::default());

        assert_eq!(view.loan.status, LoanStatus::NoLoan);
        assert_eq!(view.loan.remaining_balance, Money::ZERO);
        assert_eq!(view.valuation.equity, Money::from_major(2_000));
        // tangible fallback of -5%
        assert_eq!(view.valuation.annual_value_change.as_decimal(), dec!(-0.05));
        assert_eq!(view.valuation.projected_value_one_year, Money::from_major(1_900));
    }

    #[test]
    fn test_summary_lists_ids_in_order() {
        let terms = LoanTerms::new(Money::from_major(8_000), Rate::from_percentage(6), 4, as_of(), Money::ZERO).unwrap();
        let car = Asset::new("Car", "vehicle", AssetCategory::Tangible, as_of(), Money::from_major(10_000))
            .unwrap()
            .with_loan(Loan::new(terms));
        let car_id = car.id;
        let portfolio = Portfolio::from_assets(vec![car]).unwrap();

        let summary = PortfolioSummary::from_portfolio(&portfolio, as_of(), &DepreciationTable::default());
        assert_eq!(summary.asset_count, 1);
        assert_eq!(summary.total_debt, Money::from_major(8_000));
        assert_eq!(summary.optimal_payoff_order, vec![car_id]);
        assert_eq!(summary.assets[0].loan.status, LoanStatus::Active);

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"total_debt\""));
    }
}
