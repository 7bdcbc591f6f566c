pub mod activity;
pub mod amortization;
pub mod assets;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod loan;
pub mod portfolio;
pub mod recommendations;
pub mod scoring;
pub mod types;
pub mod views;

// re-export key types
pub use activity::{ActivitySummary, Transaction, TransactionKind};
pub use amortization::{AmortizationSchedule, PayoffSavings, ScheduledPayment};
pub use assets::{Asset, RevenueProfile};
pub use config::{AllocationTargets, DepreciationTable, EngineConfig, ScoringConfig};
pub use decimal::{Money, Rate};
pub use engine::FinancialEngine;
pub use errors::{EngineError, Result};
pub use events::{EventStore, PortfolioEvent};
pub use loan::{Loan, LoanState, LoanStatus, LoanTerms};
pub use portfolio::{PayoffStrategy, Portfolio, PortfolioHealth};
pub use recommendations::{RebalanceInstruction, Recommendation, RecommendationSynthesizer};
pub use scoring::{AccountSummary, CapitalAllocation, FinancialHealthScore, ScoringEngine};
pub use types::{
    AllocationBucket, AssetCategory, AssetId, Grade, LoanId, PerformanceRating, Priority,
    RecommendationCategory, RiskLevel, TradeSide,
};
pub use views::{AssetView, FinancialReport, PortfolioSummary};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
