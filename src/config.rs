use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};

use crate::decimal::Rate;
use crate::errors::{EngineError, Result};
use crate::types::{AllocationBucket, AssetCategory};

/// engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub depreciation: DepreciationTable,
    pub scoring: ScoringConfig,
}

/// annual value change per asset type, with a fallback per category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepreciationTable {
    /// keyed by [`normalize_type`]
    #[serde(deserialize_with = "normalized_rates")]
    pub rates: HashMap<String, Rate>,
    pub tangible_fallback: Rate,
    pub intangible_fallback: Rate,
}

/// ideal split of capital across savings, investments and held assets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationTargets {
    pub savings: Rate,
    pub investments: Rate,
    pub assets: Rate,
}

/// thresholds used by the health score and recommendation rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub targets: AllocationTargets,
    /// return assumed for money that is invested instead of repaying debt
    pub expected_market_return: Rate,
    /// drift from a target, as a fraction of total capital, before rebalancing is advised
    pub rebalance_threshold: Rate,
    pub emergency_fund_minimum_months: Decimal,
    pub emergency_fund_target_months: Decimal,
    /// cash above this share of savings counts as idle
    pub idle_cash_ratio: Decimal,
    /// months with a savings credit (out of the last six) that count as consistent
    pub consistent_savings_months: u32,
}

impl Default for DepreciationTable {
    fn default() -> Self {
        let rates = [
            ("vehicle", dec!(-0.15)),
            ("real_estate", dec!(0.03)),
            ("business", dec!(0.05)),
            ("intellectual_property", dec!(-0.05)),
        ]
        .into_iter()
        .map(|(key, rate)| (key.to_string(), Rate::from_decimal(rate)))
        .collect();

        Self {
            rates,
            tangible_fallback: Rate::from_decimal(dec!(-0.05)),
            intangible_fallback: Rate::ZERO,
        }
    }
}

impl DepreciationTable {
    /// annual rate for an asset type, falling back to its category default
    pub fn rate_for(&self, asset_type: &str, category: AssetCategory) -> Rate {
        self.rates
            .get(&normalize_type(asset_type))
            .copied()
            .unwrap_or(match category {
                AssetCategory::Tangible => self.tangible_fallback,
                AssetCategory::Intangible => self.intangible_fallback,
            })
    }

    /// register or override the rate for an asset type
    pub fn with_rate(mut self, asset_type: &str, rate: Rate) -> Self {
        self.rates.insert(normalize_type(asset_type), rate);
        self
    }
}

fn normalized_rates<'de, D>(deserializer: D) -> std::result::Result<HashMap<String, Rate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, Rate>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(key, rate)| (normalize_type(&key), rate))
        .collect())
}

/// "Real Estate", "real-estate" and "real_estate" share a key
pub fn normalize_type(asset_type: &str) -> String {
    asset_type
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

impl Default for AllocationTargets {
    fn default() -> Self {
        Self {
            savings: Rate::from_percentage(10),
            investments: Rate::from_percentage(60),
            assets: Rate::from_percentage(30),
        }
    }
}

impl AllocationTargets {
    pub fn target_for(&self, bucket: AllocationBucket) -> Rate {
        match bucket {
            AllocationBucket::Savings => self.savings,
            AllocationBucket::Investments => self.investments,
            AllocationBucket::Assets => self.assets,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            targets: AllocationTargets::default(),
            expected_market_return: Rate::from_percentage(7),
            rebalance_threshold: Rate::from_percentage(5),
            emergency_fund_minimum_months: dec!(3),
            emergency_fund_target_months: dec!(6),
            idle_cash_ratio: dec!(0.5),
            consistent_savings_months: 4,
        }
    }
}

impl EngineConfig {
    /// parse and validate a JSON configuration, missing sections take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let targets = &self.scoring.targets;
        let sum = targets.savings.as_decimal()
            + targets.investments.as_decimal()
            + targets.assets.as_decimal();
        if sum != Decimal::ONE {
            return Err(EngineError::InvalidConfiguration {
                message: format!("allocation targets must sum to 100%, got {}", Rate::from_decimal(sum)),
            });
        }

        for target in [targets.savings, targets.investments, targets.assets] {
            if target.is_negative() {
                return Err(EngineError::InvalidConfiguration {
                    message: format!("allocation target {} is negative", target),
                });
            }
        }

        let floor = -Decimal::ONE;
        let depreciation = &self.depreciation;
        let below_floor = depreciation
            .rates
            .iter()
            .map(|(key, rate)| (key.as_str(), *rate))
            .chain([
                ("tangible_fallback", depreciation.tangible_fallback),
                ("intangible_fallback", depreciation.intangible_fallback),
            ])
            .find(|(_, rate)| rate.as_decimal() < floor);
        if let Some((key, rate)) = below_floor {
            return Err(EngineError::InvalidConfiguration {
                message: format!("annual rate for {} cannot fall below -100%, got {}", key, rate),
            });
        }

        if self.scoring.emergency_fund_minimum_months > self.scoring.emergency_fund_target_months {
            return Err(EngineError::InvalidConfiguration {
                message: "emergency fund minimum exceeds target".to_string(),
            });
        }

        Ok(())
    }
}
