use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use log::{debug, info};

use crate::config::EngineConfig;
use crate::errors::Result;
use crate::portfolio::Portfolio;
use crate::recommendations::RecommendationSynthesizer;
use crate::scoring::{AccountSummary, ScoringEngine};
use crate::views::{FinancialReport, PortfolioSummary};

/// runs a full valuation, scoring and recommendation pass
#[derive(Debug, Clone, Default)]
pub struct FinancialEngine {
    pub config: EngineConfig,
}

impl FinancialEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// evaluate as of the provider's current time
    pub fn evaluate(
        &self,
        portfolio: &Portfolio,
        accounts: &AccountSummary,
        time_provider: &SafeTimeProvider,
    ) -> FinancialReport {
        self.evaluate_at(portfolio, accounts, time_provider.now())
    }

    pub fn evaluate_at(
        &self,
        portfolio: &Portfolio,
        accounts: &AccountSummary,
        as_of: DateTime<Utc>,
    ) -> FinancialReport {
        debug!("evaluating {} assets as of {}", portfolio.len(), as_of);

        let scoring = ScoringEngine::new(portfolio, accounts, &self.config.scoring, as_of);
        let health = scoring.health_score();
        let overall_score = health.overall_score();
        let recommendations =
            RecommendationSynthesizer::new(portfolio, accounts, &self.config.scoring, as_of).synthesize();

        let report = FinancialReport {
            as_of,
            portfolio: PortfolioSummary::from_portfolio(portfolio, as_of, &self.config.depreciation),
            net_worth: scoring.net_worth(),
            allocation: scoring.capital_allocation(),
            health,
            overall_score,
            grade: health.overall_grade(),
            recommendations,
        };

        info!(
            "evaluation as of {}: net worth {}, score {} ({}), {} recommendations",
            as_of,
            report.net_worth.round_dp(2),
            report.overall_score.round_dp(2),
            report.grade,
            report.recommendations.len()
        );
        report
    }
}
