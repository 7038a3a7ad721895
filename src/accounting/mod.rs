use chrono::NaiveDate;
use enum_dispatch::enum_dispatch;
use rust_decimal::Decimal;
use thiserror::Error;

pub mod daily;
pub mod ledger;
pub mod transactions;

#[cfg(test)]
mod ledger_tests;

pub use transactions::{Entry, Sale, ServiceCharge, TransactionRow};

/// Why a report row was left out of the ledger.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("unparseable date {0:?}")]
    UnparseableDate(String),
    #[error("unparseable amount {0:?}")]
    UnparseableAmount(String),
}

/// Sums that do not fit in a `Decimal`. These stop the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("sales total for {0} is too large")]
    TotalOverflow(NaiveDate),
    #[error("service charge for {0} is too large")]
    ChargeOverflow(NaiveDate),
}

/// One side of a posting.
#[derive(Debug, Clone, PartialEq)]
pub struct Party<'a> {
    pub account: &'a str,
    pub name: &'a str,
    pub doc_number: &'a str,
}

/// A balanced two-line transaction. `amount` goes on the TRNS line against `debit`,
/// its negation on the SPL line against `credit`.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting<'a> {
    pub transaction_type: &'a str,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub memo: &'a str,
    pub debit: Party<'a>,
    pub credit: Party<'a>,
}

#[enum_dispatch]
pub trait IifTransaction {
    fn posting(&self) -> Posting<'_>;
}
