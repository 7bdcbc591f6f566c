use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;

/// months in each comparison window
pub const WINDOW_MONTHS: u32 = 6;

/// ledger entry kinds the scoring engine cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Income,
    Expense,
    SavingsCredit,
}

/// a ledger entry supplied by the accounts collaborator; amounts are positive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: DateTime<Utc>,
    pub amount: Money,
    pub kind: TransactionKind,
}

impl Transaction {
    pub fn new(date: DateTime<Utc>, amount: Money, kind: TransactionKind) -> Self {
        Self { date, amount, kind }
    }
}

/// income, spending and saving figures consumed by the health score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub trailing_expenses: Money,
    pub prior_expenses: Money,
    pub total_savings_credits: Money,
    pub total_income: Money,
    /// distinct calendar months with a savings credit in the trailing window
    pub recent_savings_months: u32,
    pub monthly_expenses: Money,
    pub monthly_income: Money,
}

impl ActivitySummary {
    /// summarize entries up to and including `as_of`; later entries are ignored
    pub fn from_transactions(transactions: &[Transaction], as_of: DateTime<Utc>) -> Self {
        let trailing_start = months_before(as_of, WINDOW_MONTHS);
        let prior_start = months_before(as_of, WINDOW_MONTHS * 2);
        let current_month = month_index(as_of);

        let mut summary = Self::default();
        let mut savings_months = BTreeSet::new();

        for tx in transactions.iter().filter(|tx| tx.date <= as_of) {
            let amount = tx.amount.non_negative();
            let trailing = tx.date > trailing_start;
            let prior = !trailing && tx.date > prior_start;

            match tx.kind {
                TransactionKind::Expense if trailing => summary.trailing_expenses += amount,
                TransactionKind::Expense if prior => summary.prior_expenses += amount,
                TransactionKind::Expense => {}
                TransactionKind::Income => {
                    summary.total_income += amount;
                    if trailing {
                        summary.monthly_income += amount;
                    }
                }
                TransactionKind::SavingsCredit => {
                    summary.total_savings_credits += amount;
                    // calendar months: the current one and the five before it
                    let month = month_index(tx.date);
                    if current_month - month < WINDOW_MONTHS as i64 {
                        savings_months.insert(month);
                    }
                }
            }
        }

        let window = Decimal::from(WINDOW_MONTHS);
        summary.recent_savings_months = savings_months.len() as u32;
        summary.monthly_expenses = summary.trailing_expenses / window;
        summary.monthly_income = summary.monthly_income / window;
        summary
    }
}

/// months since year zero, so calendar months can be compared by subtraction
fn month_index(date: DateTime<Utc>) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

fn months_before(as_of: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    as_of
        .checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
