use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{AssetId, LoanId};

/// all events that can be emitted by a portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PortfolioEvent {
    AssetAdded {
        asset_id: AssetId,
        name: String,
        acquisition_price: Money,
        timestamp: DateTime<Utc>,
    },
    AssetReplaced {
        asset_id: AssetId,
        old_value: Money,
        new_value: Money,
        timestamp: DateTime<Utc>,
    },
    AssetRemoved {
        asset_id: AssetId,
        name: String,
        timestamp: DateTime<Utc>,
    },
    MarketValueUpdated {
        asset_id: AssetId,
        old_value: Money,
        new_value: Money,
        timestamp: DateTime<Utc>,
    },
    LoanPaidOff {
        asset_id: AssetId,
        loan_id: LoanId,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<PortfolioEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: PortfolioEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<PortfolioEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[PortfolioEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
