use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::AllocationBucket;

/// where capital currently sits; debt is reported alongside, never netted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapitalAllocation {
    pub savings: Money,
    pub investments: Money,
    pub assets: Money,
    pub debt: Money,
    pub cash: Money,
    pub total_capital: Money,
}

impl CapitalAllocation {
    pub fn new(savings: Money, investments: Money, assets: Money, debt: Money, cash: Money) -> Self {
        let savings = savings.non_negative();
        let investments = investments.non_negative();
        let assets = assets.non_negative();
        let cash = cash.non_negative();

        Self {
            savings,
            investments,
            assets,
            debt: debt.non_negative(),
            cash,
            total_capital: savings + investments + assets + cash,
        }
    }

    pub fn amount(&self, bucket: AllocationBucket) -> Money {
        match bucket {
            AllocationBucket::Savings => self.savings,
            AllocationBucket::Investments => self.investments,
            AllocationBucket::Assets => self.assets,
        }
    }

    /// share of total capital held in `bucket`, zero when there is no capital
    pub fn share(&self, bucket: AllocationBucket) -> Rate {
        self.amount(bucket).ratio_to(self.total_capital)
    }

    pub fn cash_share(&self) -> Rate {
        self.cash.ratio_to(self.total_capital)
    }

    /// debt relative to capital, for display next to the split
    pub fn debt_ratio(&self) -> Rate {
        self.debt.ratio_to(self.total_capital)
    }
}
