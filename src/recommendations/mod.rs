use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assets::Asset;
use crate::config::ScoringConfig;
use crate::decimal::Money;
use crate::portfolio::Portfolio;
use crate::scoring::{AccountSummary, CapitalAllocation, ScoringEngine};
use crate::types::{AllocationBucket, AssetId, Priority, RecommendationCategory, TradeSide};

/// how far and in which direction one bucket should move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceInstruction {
    pub bucket: AllocationBucket,
    pub side: TradeSide,
    pub amount: Money,
}

/// an action item; rebuilt from scratch on every pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: RecommendationCategory,
    pub action_text: String,
    /// asset the recommendation is about, if any
    pub asset_id: Option<AssetId>,
    pub rebalance: Option<RebalanceInstruction>,
}

impl Recommendation {
    fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
        category: RecommendationCategory,
        action_text: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            priority,
            category,
            action_text: action_text.into(),
            asset_id: None,
            rebalance: None,
        }
    }

    fn for_asset(mut self, id: AssetId) -> Self {
        self.asset_id = Some(id);
        self
    }

    fn with_rebalance(mut self, instruction: RebalanceInstruction) -> Self {
        self.rebalance = Some(instruction);
        self
    }
}

/// rule-based recommendation pass over the same inputs the scoring engine reads
pub struct RecommendationSynthesizer<'a> {
    portfolio: &'a Portfolio,
    accounts: &'a AccountSummary,
    config: &'a ScoringConfig,
    as_of: DateTime<Utc>,
}

impl<'a> RecommendationSynthesizer<'a> {
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

    /// every rule's output, High priority first; rule order is kept within a priority
    pub fn synthesize(&self) -> Vec<Recommendation> {
        let allocation = ScoringEngine::new(self.portfolio, self.accounts, self.config, self.as_of)
            .capital_allocation();

        let mut recommendations: Vec<Recommendation> = self
            .portfolio
            .assets()
            .iter()
            .filter_map(|asset| self.debt_recommendation(asset))
            .collect();
        recommendations.extend(self.idle_cash_recommendation());
        recommendations.extend(self.emergency_fund_recommendation());
        recommendations.extend(self.rebalancing_recommendations(&allocation));

        recommendations.sort_by_key(|r| r.priority);
        debug!(
            "synthesized {} recommendations as of {}",
            recommendations.len(),
            self.as_of
        );
        recommendations
    }

    /// pay off when the loan costs more than the market is expected to return
    pub fn debt_recommendation(&self, asset: &Asset) -> Option<Recommendation> {
        let balance = asset.remaining_balance(self.as_of);
        if !balance.is_positive() {
            return None;
        }

        let loan_rate = asset.active_loan()?.interest_rate();
        let expected = self.config.expected_market_return;

        let recommendation = if loan_rate > expected {
            Recommendation::new(
                format!("Pay off {} loan", asset.name),
                format!(
                    "The loan on {} charges {}%, above the expected market return of {}%. \
                     Remaining balance: {}.",
                    asset.name,
                    loan_rate.as_percentage().round_dp(2),
                    expected.as_percentage().round_dp(2),
                    balance.round_dp(2)
                ),
                Priority::High,
                RecommendationCategory::DebtPayoff,
                "Direct extra payments to this loan",
            )
        } else {
            Recommendation::new(
                format!("Invest instead of prepaying {}", asset.name),
                format!(
                    "The loan on {} charges {}%, at or below the expected market return of {}%. \
                     Keep the scheduled payments and invest surplus cash.",
                    asset.name,
                    loan_rate.as_percentage().round_dp(2),
                    expected.as_percentage().round_dp(2)
                ),
                Priority::Medium,
                RecommendationCategory::Investment,
                "Invest surplus cash",
            )
        };
        Some(recommendation.for_asset(asset.id))
    }

    pub fn idle_cash_recommendation(&self) -> Option<Recommendation> {
        let cash = self.accounts.cash_balance;
        let threshold = self.accounts.savings_balance * self.config.idle_cash_ratio;
        if cash <= threshold {
            return None;
        }

        Some(Recommendation::new(
            "Deploy idle cash",
            format!(
                "Cash of {} exceeds {} of savings. Put the excess to work.",
                cash.round_dp(2),
                threshold.round_dp(2)
            ),
            Priority::Medium,
            RecommendationCategory::CashManagement,
            "Move excess cash into savings or investments",
        ))
    }

    pub fn emergency_fund_recommendation(&self) -> Option<Recommendation> {
        let months = self.accounts.emergency_months();
        let minimum = self.config.emergency_fund_minimum_months;
        if months >= minimum {
            return None;
        }

        Some(Recommendation::new(
            "Build an emergency fund",
            format!(
                "Savings cover {} months of expenses; aim for at least {} and ideally {}.",
                months.round_dp(1),
                minimum,
                self.config.emergency_fund_target_months
            ),
            Priority::High,
            RecommendationCategory::EmergencyFund,
            "Increase monthly savings contributions",
        ))
    }

    /// one recommendation per bucket drifting past the threshold
    pub fn rebalancing_recommendations(&self, allocation: &CapitalAllocation) -> Vec<Recommendation> {
        if !allocation.total_capital.is_positive() {
            return Vec::new();
        }

        [
            AllocationBucket::Savings,
            AllocationBucket::Investments,
            AllocationBucket::Assets,
        ]
        .into_iter()
        .filter_map(|bucket| {
            let actual = allocation.share(bucket);
            let target = self.config.targets.target_for(bucket);
            let drift = actual - target;
            let threshold = self.config.rebalance_threshold.as_decimal();
            if drift.abs().as_decimal() <= threshold {
                return None;
            }

            let side = if drift.is_negative() {
                TradeSide::Buy
            } else {
                TradeSide::Sell
            };
            let amount = allocation.total_capital.apply(drift.abs());
            let priority = if drift.abs().as_decimal() > threshold * Decimal::from(3) {
                Priority::Medium
            } else {
                Priority::Low
            };
            let verb = match side {
                TradeSide::Buy => "Increase",
                TradeSide::Sell => "Reduce",
            };

            Some(
                Recommendation::new(
                    format!("Rebalance {}", bucket),
                    format!(
                        "{} is {}% of capital against a {}% target.",
                        bucket,
                        actual.as_percentage().round_dp(1),
                        target.as_percentage().round_dp(1)
                    ),
                    priority,
                    RecommendationCategory::Rebalancing,
                    format!("{} {} by {}", verb, bucket, amount.round_dp(2)),
                )
                .with_rebalance(RebalanceInstruction {
                    bucket,
                    side,
                    amount,
                }),
            )
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivitySummary;
    use crate::decimal::Rate;
    use crate::loan::{Loan, LoanTerms};
    use crate::types::AssetCategory;
    use chrono::TimeZone;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn financed(name: &str, value: i64, balance: i64, percent: u32) -> Asset {
        let terms = LoanTerms::new(
            Money::from_major(balance),
            Rate::from_percentage(percent),
            5,
            as_of(),
            Money::ZERO,
        )
        .unwrap();
        Asset::new(name, "vehicle", AssetCategory::Tangible, as_of(), Money::from_major(value))
            .unwrap()
            .with_loan(Loan::new(terms))
    }

    /// balances that sit exactly on the 10 / 60 / 30 targets
    fn balanced_accounts(assets_value: i64) -> AccountSummary {
        let total = assets_value * 10 / 3;
        AccountSummary {
            cash_balance: Money::ZERO,
            savings_balance: Money::from_major(total / 10),
            investment_value: Money::from_major(total * 6 / 10),
            investment_cost_basis: Money::from_major(total * 6 / 10),
            activity: ActivitySummary {
                monthly_expenses: Money::from_major(1),
                ..ActivitySummary::default()
            },
        }
    }

    #[test]
    fn test_pay_off_versus_invest() {
        let portfolio = Portfolio::from_assets(vec![
            financed("Truck", 30_000, 20_000, 9),
            financed("Van", 30_000, 20_000, 3),
        ])
        .unwrap();
        let accounts = balanced_accounts(60_000);
        let config = ScoringConfig::default();

        let synthesizer = RecommendationSynthesizer::new(&portfolio, &accounts, &config, as_of());
        let truck = synthesizer.debt_recommendation(&portfolio.assets()[0]).unwrap();
        let van = synthesizer.debt_recommendation(&portfolio.assets()[1]).unwrap();

        assert_eq!(truck.priority, Priority::High);
        assert_eq!(truck.category, RecommendationCategory::DebtPayoff);
        assert_eq!(truck.asset_id, Some(portfolio.assets()[0].id));
        assert_eq!(van.priority, Priority::Medium);
        assert_eq!(van.category, RecommendationCategory::Investment);
    }

    #[test]
    fn test_no_debt_recommendation_without_balance() {
        let owned = Asset::new("Bike", "vehicle", AssetCategory::Tangible, as_of(), Money::from_major(500)).unwrap();
        let mut portfolio = Portfolio::from_assets(vec![owned, financed("Car", 10_000, 8_000, 12)]).unwrap();
        let car = portfolio.assets()[1].id;
        portfolio.mark_loan_paid_off(car, as_of()).unwrap();

        let accounts = balanced_accounts(10_500);
        let config = ScoringConfig::default();
        let synthesizer = RecommendationSynthesizer::new(&portfolio, &accounts, &config, as_of());

        assert!(portfolio
            .assets()
            .iter()
            .all(|a| synthesizer.debt_recommendation(a).is_none()));
    }

    #[test]
    fn test_idle_cash_and_emergency_fund() {
        let portfolio = Portfolio::new();
        let config = ScoringConfig::default();
        let accounts = AccountSummary {
            cash_balance: Money::from_major(6_000),
            savings_balance: Money::from_major(10_000),
            activity: ActivitySummary {
                monthly_expenses: Money::from_major(4_000),
                ..ActivitySummary::default()
            },
            ..AccountSummary::default()
        };

        let synthesizer = RecommendationSynthesizer::new(&portfolio, &accounts, &config, as_of());
        let idle = synthesizer.idle_cash_recommendation().unwrap();
        assert_eq!(idle.priority, Priority::Medium);
        assert_eq!(idle.category, RecommendationCategory::CashManagement);

        // 2.5 months of coverage
        let emergency = synthesizer.emergency_fund_recommendation().unwrap();
        assert_eq!(emergency.priority, Priority::High);

        let enough = AccountSummary {
            cash_balance: Money::from_major(5_000),
            ..accounts.clone()
        };
        let synthesizer = RecommendationSynthesizer::new(&portfolio, &enough, &config, as_of());
        assert!(synthesizer.idle_cash_recommendation().is_none());
    }

    #[test]
    fn test_rebalancing_amounts_and_sides() {
        let allocation = CapitalAllocation::new(
            Money::from_major(10_000),
            Money::from_major(20_000),
            Money::from_major(70_000),
            Money::ZERO,
            Money::ZERO,
        );
        let portfolio = Portfolio::new();
        let accounts = AccountSummary::default();
        let config = ScoringConfig::default();
        let synthesizer = RecommendationSynthesizer::new(&portfolio, &accounts, &config, as_of());

        let recommendations = synthesizer.rebalancing_recommendations(&allocation);
        assert_eq!(recommendations.len(), 2);

        let investments = recommendations[0].rebalance.unwrap();
        assert_eq!(investments.bucket, AllocationBucket::Investments);
        assert_eq!(investments.side, TradeSide::Buy);
        assert_eq!(investments.amount, Money::from_major(40_000));
        assert_eq!(recommendations[0].priority, Priority::Medium);

        let assets = recommendations[1].rebalance.unwrap();
        assert_eq!(assets.side, TradeSide::Sell);
        assert_eq!(assets.amount, Money::from_major(40_000));
    }

    #[test]
    fn test_small_drift_is_low_priority() {
        let allocation = CapitalAllocation::new(
            Money::from_major(10_000),
            Money::from_major(52_000),
            Money::from_major(38_000),
            Money::ZERO,
            Money::ZERO,
        );
        let portfolio = Portfolio::new();
        let accounts = AccountSummary::default();
        let config = ScoringConfig::default();
        let synthesizer = RecommendationSynthesizer::new(&portfolio, &accounts, &config, as_of());

        let recommendations = synthesizer.rebalancing_recommendations(&allocation);
        assert_eq!(recommendations.len(), 2);
        assert!(recommendations.iter().all(|r| r.priority == Priority::Low));
    }

    #[test]
    fn test_synthesize_orders_by_priority() {
        let portfolio = Portfolio::from_assets(vec![
            financed("Van", 30_000, 20_000, 3),
            financed("Truck", 30_000, 20_000, 9),
        ])
        .unwrap();
        let accounts = AccountSummary {
            cash_balance: Money::from_major(50_000),
            savings_balance: Money::from_major(1_000),
            activity: ActivitySummary {
                monthly_expenses: Money::from_major(2_000),
                ..ActivitySummary::default()
            },
            ..AccountSummary::default()
        };
        let config = ScoringConfig::default();

        let recommendations =
            RecommendationSynthesizer::new(&portfolio, &accounts, &config, as_of()).synthesize();

        let priorities: Vec<Priority> = recommendations.iter().map(|r| r.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);

        // truck payoff precedes the emergency fund item within High
        assert_eq!(recommendations[0].category, RecommendationCategory::DebtPayoff);
        assert_eq!(recommendations[1].category, RecommendationCategory::EmergencyFund);
        assert!(recommendations
            .iter()
            .any(|r| r.category == RecommendationCategory::CashManagement));
    }
}
