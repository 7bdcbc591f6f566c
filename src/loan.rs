use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::amortization::{self, AmortizationSchedule, PayoffSavings};
use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::types::LoanId;

/// contractual terms of a fixed-rate, level-payment loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub original_amount: Money,
    pub interest_rate: Rate,
    pub term_years: u32,
    pub start_date: DateTime<Utc>,
    pub down_payment: Money,
}

impl LoanTerms {
    /// validate and build loan terms
    pub fn new(
        original_amount: Money,
        interest_rate: Rate,
        term_years: u32,
        start_date: DateTime<Utc>,
        down_payment: Money,
    ) -> Result<Self> {
        if !original_amount.is_positive() {
            return Err(EngineError::invalid("original_amount", format!("must be positive, got {}", original_amount)));
        }
        if interest_rate.is_negative() {
            return Err(EngineError::invalid("interest_rate", format!("must not be negative, got {}", interest_rate)));
        }
        if term_years == 0 || term_years > amortization::MAX_TERM_YEARS {
            return Err(EngineError::invalid(
                "term_years",
                format!("must be between 1 and {} years, got {}", amortization::MAX_TERM_YEARS, term_years),
            ));
        }
        if down_payment.is_negative() || down_payment > original_amount {
            return Err(EngineError::invalid(
                "down_payment",
                format!("must be between 0 and {}, got {}", original_amount, down_payment),
            ));
        }

        Ok(Self {
            original_amount,
            interest_rate,
            term_years,
            start_date,
            down_payment,
        })
    }

    /// amount actually financed
    pub fn principal(&self) -> Money {
        (self.original_amount - self.down_payment).non_negative()
    }

    pub fn term_months(&self) -> u32 {
        amortization::total_payments(self.term_years)
    }

    pub fn months_since_start(&self, as_of: DateTime<Utc>) -> u32 {
        amortization::months_between(self.start_date, as_of)
    }
}

/// loan lifecycle; money math only runs in the `Active` state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoanState {
    NoLoan,
    Active(LoanTerms),
    PaidOff {
        terms: LoanTerms,
        paid_off_date: DateTime<Utc>,
    },
}

/// status without the attached terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    NoLoan,
    Active,
    PaidOff,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    state: LoanState,
}

impl Loan {
    /// create an active loan
    pub fn new(terms: LoanTerms) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: LoanState::Active(terms),
        }
    }

    /// placeholder for an asset bought outright
    pub fn no_loan() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: LoanState::NoLoan,
        }
    }

    pub fn with_id(mut self, id: LoanId) -> Self {
        self.id = id;
        self
    }

    pub fn state(&self) -> &LoanState {
        &self.state
    }

    pub fn status(&self) -> LoanStatus {
        match self.state {
            LoanState::NoLoan => LoanStatus::NoLoan,
            LoanState::Active(_) => LoanStatus::Active,
            LoanState::PaidOff { .. } => LoanStatus::PaidOff,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, LoanState::Active(_))
    }

    /// terms regardless of whether the loan is still running
    pub fn terms(&self) -> Option<&LoanTerms> {
        match &self.state {
            LoanState::NoLoan => None,
            LoanState::Active(terms) | LoanState::PaidOff { terms, .. } => Some(terms),
        }
    }

    /// terms only while the loan is active
    pub fn active_terms(&self) -> Option<&LoanTerms> {
        match &self.state {
            LoanState::Active(terms) => Some(terms),
            _ => None,
        }
    }

    pub fn paid_off_date(&self) -> Option<DateTime<Utc>> {
        match self.state {
            LoanState::PaidOff { paid_off_date, .. } => Some(paid_off_date),
            _ => None,
        }
    }

    pub fn interest_rate(&self) -> Rate {
        self.terms().map(|t| t.interest_rate).unwrap_or(Rate::ZERO)
    }

    /// financed principal while active, zero otherwise
    pub fn loan_amount(&self) -> Money {
        self.active_terms().map(LoanTerms::principal).unwrap_or(Money::ZERO)
    }

    pub fn months_since_start(&self, as_of: DateTime<Utc>) -> u32 {
        self.terms().map(|t| t.months_since_start(as_of)).unwrap_or(0)
    }

    pub fn monthly_payment(&self) -> Money {
        self.active_terms()
            .map(|t| amortization::monthly_payment(t.principal(), t.interest_rate, t.term_years))
            .unwrap_or(Money::ZERO)
    }

    pub fn remaining_balance(&self, as_of: DateTime<Utc>) -> Money {
        self.active_terms()
            .map(|t| {
                amortization::remaining_balance(
                    t.principal(),
                    t.interest_rate,
                    t.term_years,
                    t.months_since_start(as_of),
                )
            })
            .unwrap_or(Money::ZERO)
    }

    pub fn interest_paid_to_date(&self, as_of: DateTime<Utc>) -> Money {
        self.active_terms()
            .map(|t| {
                amortization::interest_paid_to_date(
                    t.principal(),
                    t.interest_rate,
                    t.term_years,
                    t.months_since_start(as_of),
                )
            })
            .unwrap_or(Money::ZERO)
    }

    pub fn remaining_interest(&self, as_of: DateTime<Utc>) -> Money {
        self.active_terms()
            .map(|t| {
                amortization::remaining_interest(
                    t.principal(),
                    t.interest_rate,
                    t.term_years,
                    t.months_since_start(as_of),
                )
            })
            .unwrap_or(Money::ZERO)
    }

    pub fn total_interest(&self) -> Money {
        self.active_terms()
            .map(|t| amortization::total_interest(t.principal(), t.interest_rate, t.term_years))
            .unwrap_or(Money::ZERO)
    }

    /// effect of paying `extra_payment` more each month from `as_of` on
    pub fn payoff_savings(&self, extra_payment: Money, as_of: DateTime<Utc>) -> Result<PayoffSavings> {
        let Some(terms) = self.active_terms() else {
            return Ok(PayoffSavings::default());
        };

        let balance = self.remaining_balance(as_of);
        if balance.is_zero() {
            return Ok(PayoffSavings::default());
        }

        amortization::payoff_savings(balance, terms.interest_rate, self.monthly_payment(), extra_payment)
    }

    /// full schedule for an active loan, empty otherwise
    pub fn schedule(&self) -> AmortizationSchedule {
        self.active_terms()
            .map(|t| AmortizationSchedule::generate(t.principal(), t.interest_rate, t.term_years, t.start_date))
            .unwrap_or_default()
    }

    /// close out an active loan; returns false when there was nothing to close
    pub fn mark_paid_off(&mut self, at: DateTime<Utc>) -> bool {
        let state = std::mem::replace(&mut self.state, LoanState::NoLoan);
        let (state, changed) = match state {
            LoanState::Active(terms) => (
                LoanState::PaidOff {
                    terms,
                    paid_off_date: at,
                },
                true,
            ),
            other => (other, false),
        };
        self.state = state;

        if changed {
            debug!("loan {} marked paid off at {}", self.id, at);
        }
        changed
    }
}
