pub mod ranking;

use chrono::{DateTime, Utc};
use log::{debug, info};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::assets::Asset;
use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::events::{EventStore, PortfolioEvent};
use crate::types::AssetId;

pub use ranking::PayoffStrategy;

/// portfolio LTV at which the leverage sub-score peaks
const IDEAL_LTV: Decimal = dec!(0.5);
/// half-width of the band around the ideal LTV that still scores 1.0
const LTV_BAND: Decimal = dec!(0.15);
/// distance beyond the band over which the leverage sub-score falls to zero
const LTV_FALLOFF: Decimal = dec!(0.35);

/// the three components of the portfolio health score, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioHealth {
    pub equity_score: Rate,
    pub ltv_score: Rate,
    pub appreciation_score: Rate,
    pub overall: Rate,
}

/// owned assets keyed by id
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    assets: Vec<Asset>,
    events: EventStore,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// build from records, rejecting duplicate ids
    pub fn from_assets(assets: impl IntoIterator<Item = Asset>) -> Result<Self> {
        let mut portfolio = Self::new();
        for asset in assets {
            portfolio.insert(asset)?;
        }
        Ok(portfolio)
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    fn position(&self, id: AssetId) -> Result<usize> {
        self.assets
            .iter()
            .position(|a| a.id == id)
            .ok_or(EngineError::AssetNotFound { id })
    }

    fn insert(&mut self, asset: Asset) -> Result<()> {
        if self.get(asset.id).is_some() {
            return Err(EngineError::DuplicateAsset { id: asset.id });
        }
        self.assets.push(asset);
        Ok(())
    }

    pub fn add_asset(&mut self, asset: Asset, at: DateTime<Utc>) -> Result<()> {
        let event = PortfolioEvent::AssetAdded {
            asset_id: asset.id,
            name: asset.name.clone(),
            acquisition_price: asset.acquisition_price,
            timestamp: at,
        };
        let (id, name) = (asset.id, asset.name.clone());
        self.insert(asset)?;
        info!("asset {} ({}) added to portfolio", id, name);
        self.events.emit(event);
        Ok(())
    }

    /// replace the asset sharing `asset.id`, keeping its position
    pub fn replace_asset(&mut self, asset: Asset, at: DateTime<Utc>) -> Result<Asset> {
        let index = self.position(asset.id)?;

        info!("asset {} replaced", asset.id);
        self.events.emit(PortfolioEvent::AssetReplaced {
            asset_id: asset.id,
            old_value: self.assets[index].current_value(),
            new_value: asset.current_value(),
            timestamp: at,
        });
        Ok(std::mem::replace(&mut self.assets[index], asset))
    }

    pub fn remove_asset(&mut self, id: AssetId, at: DateTime<Utc>) -> Result<Asset> {
        let index = self.position(id)?;
        let removed = self.assets.remove(index);

        info!("asset {} ({}) removed from portfolio", removed.id, removed.name);
        self.events.emit(PortfolioEvent::AssetRemoved {
            asset_id: removed.id,
            name: removed.name.clone(),
            timestamp: at,
        });
        Ok(removed)
    }

    pub fn update_market_value(&mut self, id: AssetId, value: Money, at: DateTime<Utc>) -> Result<()> {
        if value.is_negative() {
            return Err(EngineError::invalid("current_market_value", format!("must not be negative, got {}", value)));
        }

        let index = self.position(id)?;
        let asset = &mut self.assets[index];
        let old_value = asset.current_value();
        asset.current_market_value = Some(value);

        self.events.emit(PortfolioEvent::MarketValueUpdated {
            asset_id: id,
            old_value,
            new_value: value,
            timestamp: at,
        });
        Ok(())
    }

    /// mark the asset's loan paid off at `at`; `Ok(false)` when it was not active
    pub fn mark_loan_paid_off(&mut self, id: AssetId, at: DateTime<Utc>) -> Result<bool> {
        let index = self.position(id)?;
        let asset = &mut self.assets[index];
        if !asset.mark_loan_paid_off(at) {
            return Ok(false);
        }

        if let Some(loan) = &asset.loan {
            info!("loan {} on asset {} paid off", loan.id, id);
            self.events.emit(PortfolioEvent::LoanPaidOff {
                asset_id: id,
                loan_id: loan.id,
                timestamp: at,
            });
        }
        Ok(true)
    }

    pub fn events(&self) -> &[PortfolioEvent] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<PortfolioEvent> {
        self.events.take_events()
    }

    pub fn total_value(&self) -> Money {
        self.assets.iter().map(Asset::current_value).sum()
    }

    pub fn total_acquisition_cost(&self) -> Money {
        self.assets.iter().map(|a| a.acquisition_price).sum()
    }

    pub fn total_debt(&self, as_of: DateTime<Utc>) -> Money {
        self.assets.iter().map(|a| a.remaining_balance(as_of)).sum()
    }

    pub fn total_equity(&self, as_of: DateTime<Utc>) -> Money {
        self.assets.iter().map(|a| a.equity(as_of)).sum()
    }

    pub fn total_monthly_payments(&self) -> Money {
        self.assets.iter().map(Asset::monthly_payment).sum()
    }

    pub fn total_appreciation(&self) -> Money {
        self.total_value() - self.total_acquisition_cost()
    }

    pub fn appreciation_rate(&self) -> Rate {
        self.total_appreciation().ratio_to(self.total_acquisition_cost())
    }

    /// interest rate of active loans weighted by financed amount
    pub fn average_interest_rate(&self) -> Rate {
        let (weighted, total) = self
            .assets
            .iter()
            .filter_map(Asset::active_loan)
            .fold((Decimal::ZERO, Decimal::ZERO), |(weighted, total), loan| {
                let amount = loan.loan_amount().as_decimal();
                (weighted + loan.interest_rate().as_decimal() * amount, total + amount)
            });

        if total <= Decimal::ZERO {
            return Rate::ZERO;
        }
        Rate::from_decimal(weighted / total)
    }

    pub fn loan_to_value_ratio(&self, as_of: DateTime<Utc>) -> Rate {
        self.total_debt(as_of).ratio_to(self.total_value())
    }

    pub fn at_risk_assets(&self, as_of: DateTime<Utc>) -> Vec<&Asset> {
        self.assets.iter().filter(|a| a.is_at_risk(as_of)).collect()
    }

    pub fn underwater_assets(&self, as_of: DateTime<Utc>) -> Vec<&Asset> {
        self.assets.iter().filter(|a| a.is_underwater(as_of)).collect()
    }

    /// mean of equity positivity, leverage and appreciation sub-scores
    pub fn health_score(&self, as_of: DateTime<Utc>) -> PortfolioHealth {
        let equity_score = if self.assets.is_empty() {
            Rate::ONE
        } else {
            let non_negative = self
                .assets
                .iter()
                .filter(|a| !a.equity(as_of).is_negative())
                .count();
            Rate::from_decimal(Decimal::from(non_negative) / Decimal::from(self.assets.len()))
        };

        let ltv_score = ltv_score(self.loan_to_value_ratio(as_of));
        let appreciation_score =
            Rate::from_decimal(Decimal::ONE + self.appreciation_rate().as_decimal()).clamp_unit();

        let overall = Rate::from_decimal(
            (equity_score.as_decimal() + ltv_score.as_decimal() + appreciation_score.as_decimal())
                / Decimal::from(3),
        );

        debug!(
            "portfolio health as of {}: equity {}, ltv {}, appreciation {}",
            as_of, equity_score, ltv_score, appreciation_score
        );

        PortfolioHealth {
            equity_score,
            ltv_score,
            appreciation_score,
            overall,
        }
    }
}

/// 1.0 within the band around the ideal LTV, falling linearly to 0 outside it
fn ltv_score(ltv: Rate) -> Rate {
    let deviation = (ltv.as_decimal() - IDEAL_LTV).abs();
    if deviation <= LTV_BAND {
        return Rate::ONE;
    }
    Rate::from_decimal(Decimal::ONE - (deviation - LTV_BAND) / LTV_FALLOFF).clamp_unit()
}
