pub mod allocation;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::activity::ActivitySummary;
use crate::config::ScoringConfig;
use crate::decimal::{Money, Rate};
use crate::portfolio::Portfolio;
use crate::types::{AllocationBucket, Grade};

pub use allocation::CapitalAllocation;

/// score given to the investment factor when nothing is invested
const UNINVESTED_PORTFOLIO_SCORE: Decimal = dec!(40);
const HUNDRED: Decimal = dec!(100);

/// balances and activity supplied by the account collaborators
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub cash_balance: Money,
    pub savings_balance: Money,
    pub investment_value: Money,
    /// amount paid into investments, used for the return rate
    pub investment_cost_basis: Money,
    pub activity: ActivitySummary,
}

impl AccountSummary {
    /// simple investment return, zero without a cost basis
    pub fn investment_return_rate(&self) -> Rate {
        (self.investment_value - self.investment_cost_basis).ratio_to(self.investment_cost_basis)
    }

    /// months of expenses covered by savings; expenses below 1 are treated as 1
    pub fn emergency_months(&self) -> Decimal {
        let expenses = self.activity.monthly_expenses.as_decimal();
        if expenses < Decimal::ONE {
            warn!("monthly expenses {} below 1, clamping emergency fund denominator", expenses);
        }
        self.savings_balance.as_decimal() / expenses.max(Decimal::ONE)
    }

    /// trailing six months of spending relative to the six before, zero without a baseline
    pub fn expense_growth(&self) -> Decimal {
        let prior = self.activity.prior_expenses.as_decimal();
        if prior <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.activity.trailing_expenses.as_decimal() - prior) / prior
    }

    /// saved share of income; income below 1 is treated as 1
    pub fn savings_rate(&self) -> Decimal {
        let income = self.activity.total_income.as_decimal();
        if income < Decimal::ONE {
            warn!("total income {} below 1, clamping savings rate denominator", income);
        }
        self.activity.total_savings_credits.as_decimal() / income.max(Decimal::ONE)
    }
}

/// four-factor financial health score, each factor in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialHealthScore {
    pub portfolio_health: Decimal,
    pub budget_health: Decimal,
    pub savings_health: Decimal,
    pub diversification_health: Decimal,
}

impl FinancialHealthScore {
    pub fn overall_score(&self) -> Decimal {
        (self.portfolio_health + self.budget_health + self.savings_health + self.diversification_health)
            / Decimal::from(4)
    }

    pub fn overall_grade(&self) -> Grade {
        grade_for(self.overall_score())
    }
}

pub fn grade_for(score: Decimal) -> Grade {
    if score >= dec!(90) {
        Grade::APlus
    } else if score >= dec!(80) {
        Grade::A
    } else if score >= dec!(70) {
        Grade::B
    } else if score >= dec!(60) {
        Grade::C
    } else if score >= dec!(50) {
        Grade::D
    } else {
        Grade::F
    }
}

/// combines portfolio aggregates with account balances as of one instant
pub struct ScoringEngine<'a> {
    portfolio: &'a Portfolio,
    accounts: &'a AccountSummary,
    config: &'a ScoringConfig,
    as_of: DateTime<Utc>,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(
        portfolio: &'a Portfolio,
        accounts: &'a AccountSummary,
        config: &'a ScoringConfig,
        as_of: DateTime<Utc>,
    ) -> Self {
        Self {
            portfolio,
            accounts,
            config,
            as_of,
        }
    }

    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }

    pub fn net_worth(&self) -> Money {
        self.portfolio.total_value()
            + self.accounts.investment_value
            + self.accounts.savings_balance
            + self.accounts.cash_balance
            - self.portfolio.total_debt(self.as_of)
    }

    pub fn capital_allocation(&self) -> CapitalAllocation {
        CapitalAllocation::new(
            self.accounts.savings_balance,
            self.accounts.investment_value,
            self.portfolio.total_value(),
            self.portfolio.total_debt(self.as_of),
            self.accounts.cash_balance,
        )
    }

    /// investment share of net worth and investment return
    pub fn portfolio_health(&self) -> Decimal {
        let investments = self.accounts.investment_value;
        if !investments.is_positive() {
            return UNINVESTED_PORTFOLIO_SCORE;
        }

        let net_worth = self.net_worth().as_decimal();
        if net_worth < Decimal::ONE {
            warn!("net worth {} below 1, clamping investment ratio denominator", net_worth);
        }
        let investment_ratio = investments.as_decimal() / net_worth.max(Decimal::ONE);
        let return_rate = self.accounts.investment_return_rate().as_decimal();

        let ratio_score = unit(investment_ratio * dec!(2));
        let return_score = unit((return_rate + dec!(0.1)) / dec!(0.2));

        (dec!(0.6) * ratio_score + dec!(0.4) * return_score) * HUNDRED
    }

    /// emergency fund coverage and expense trend
    pub fn budget_health(&self) -> Decimal {
        let target = self.config.emergency_fund_target_months.max(Decimal::ONE);
        let coverage = unit(self.accounts.emergency_months() / target);
        let trend = unit((-self.accounts.expense_growth() + dec!(0.05)) / dec!(0.1));

        (dec!(0.7) * coverage + dec!(0.3) * trend) * HUNDRED
    }

    /// savings rate against a 20% benchmark and saving consistency
    pub fn savings_health(&self) -> Decimal {
        let rate_score = unit(self.accounts.savings_rate() / dec!(0.2));
        let consistency = if self.accounts.activity.recent_savings_months
            >= self.config.consistent_savings_months
        {
            Decimal::ONE
        } else {
            dec!(0.5)
        };

        (dec!(0.7) * rate_score + dec!(0.3) * consistency) * HUNDRED
    }

    /// closeness of the savings / investments / assets split to the targets
    pub fn diversification_health(&self) -> Decimal {
        if !self.accounts.investment_value.is_positive() {
            return Decimal::ZERO;
        }

        let allocation = self.capital_allocation();
        if !allocation.total_capital.is_positive() {
            return Decimal::ZERO;
        }

        let buckets = [
            AllocationBucket::Savings,
            AllocationBucket::Investments,
            AllocationBucket::Assets,
        ];
        let total_deviation: Decimal = buckets
            .iter()
            .map(|&bucket| {
                (allocation.share(bucket).as_decimal()
                    - self.config.targets.target_for(bucket).as_decimal())
                .abs()
            })
            .sum();
        let average_deviation = total_deviation / Decimal::from(buckets.len());

        unit(Decimal::ONE - average_deviation * dec!(2)) * HUNDRED
    }

    pub fn health_score(&self) -> FinancialHealthScore {
        let score = FinancialHealthScore {
            portfolio_health: self.portfolio_health(),
            budget_health: self.budget_health(),
            savings_health: self.savings_health(),
            diversification_health: self.diversification_health(),
        };

        debug!(
            "health score as of {}: portfolio {}, budget {}, savings {}, diversification {} (overall {})",
            self.as_of,
            score.portfolio_health.round_dp(2),
            score.budget_health.round_dp(2),
            score.savings_health.round_dp(2),
            score.diversification_health.round_dp(2),
            score.overall_score().round_dp(2)
        );
        score
    }
}

/// clamp into [0, 1]
fn unit(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).min(Decimal::ONE)
}
