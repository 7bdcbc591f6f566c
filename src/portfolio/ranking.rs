use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assets::Asset;
use crate::decimal::Rate;

use super::Portfolio;

/// ordering used by the payoff and sell decision tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoffStrategy {
    /// highest interest rate first
    Avalanche,
    /// smallest remaining balance first
    Snowball,
    /// least ready to sell first, ready-to-sell assets last
    FlipPriority,
}

impl Portfolio {
    /// active-loan assets by interest rate, highest first
    pub fn optimal_payoff_order(&self) -> Vec<&Asset> {
        let mut ranked: Vec<&Asset> = self.assets().iter().filter(|a| a.has_active_loan()).collect();
        ranked.sort_by(|a, b| b.active_interest_rate().cmp(&a.active_interest_rate()));
        ranked
    }

    /// active-loan assets by remaining balance, smallest first
    pub fn emotional_payoff_order(&self, as_of: DateTime<Utc>) -> Vec<&Asset> {
        let mut ranked: Vec<&Asset> = self.assets().iter().filter(|a| a.has_active_loan()).collect();
        ranked.sort_by_key(|a| a.remaining_balance(as_of));
        ranked
    }

    /// every asset by equity share plus appreciation, ascending; ties keep insertion order
    pub fn flip_priority_order(&self, as_of: DateTime<Utc>) -> Vec<&Asset> {
        let mut ranked: Vec<&Asset> = self.assets().iter().collect();
        ranked.sort_by_cached_key(|a| a.flip_score(as_of));
        ranked
    }

    pub fn ranked(&self, strategy: PayoffStrategy, as_of: DateTime<Utc>) -> Vec<&Asset> {
        match strategy {
            PayoffStrategy::Avalanche => self.optimal_payoff_order(),
            PayoffStrategy::Snowball => self.emotional_payoff_order(as_of),
            PayoffStrategy::FlipPriority => self.flip_priority_order(as_of),
        }
    }
}

impl Asset {
    fn active_interest_rate(&self) -> Rate {
        self.active_loan().map(|l| l.interest_rate()).unwrap_or(Rate::ZERO)
    }
}
