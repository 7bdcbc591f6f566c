use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};

/// expected income from a revenue-generating asset such as a side business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueProfile {
    pub monthly_target: Money,
    /// probability that a given month produces revenue, in [0, 1]
    pub generation_rate: Rate,
    /// relative spread around the expected figure, in [0, 1]
    pub variability: Rate,
}

/// low / expected / high monthly revenue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueRange {
    pub low: Money,
    pub expected: Money,
    pub high: Money,
}

impl RevenueProfile {
    pub fn new(monthly_target: Money, generation_rate: Rate, variability: Rate) -> Result<Self> {
        if monthly_target.is_negative() {
            return Err(EngineError::invalid("monthly_target", format!("must not be negative, got {}", monthly_target)));
        }
        check_unit("generation_rate", generation_rate)?;
        check_unit("variability", variability)?;

        Ok(Self {
            monthly_target,
            generation_rate,
            variability,
        })
    }

    pub fn expected_monthly_revenue(&self) -> Money {
        self.monthly_target.apply(self.generation_rate)
    }

    pub fn annual_expected_revenue(&self) -> Money {
        self.expected_monthly_revenue() * Decimal::from(12)
    }

    pub fn monthly_range(&self) -> RevenueRange {
        let expected = self.expected_monthly_revenue();
        let spread = expected.apply(self.variability);
        RevenueRange {
            low: (expected - spread).non_negative(),
            expected,
            high: expected + spread,
        }
    }

    /// months of expected revenue needed to recover `cost`, `None` if revenue is zero
    pub fn payback_months(&self, cost: Money) -> Option<u32> {
        let expected = self.expected_monthly_revenue();
        if !expected.is_positive() {
            return None;
        }
        (cost.non_negative().as_decimal() / expected.as_decimal())
            .ceil()
            .to_u32()
    }
}

fn check_unit(field: &'static str, value: Rate) -> Result<()> {
    if value.as_decimal() < Decimal::ZERO || value.as_decimal() > Decimal::ONE {
        return Err(EngineError::invalid(field, format!("must be within [0, 1], got {}", value.as_decimal())));
    }
    Ok(())
}
