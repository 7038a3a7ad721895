use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io;

use anyhow::Result;
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;

use super::daily::DailyTotal;
use super::transactions::{Entry, Sale, ServiceCharge, TransactionRow, IIF_DATE_FORMAT};
use super::{IifTransaction, LedgerError, Party, Posting, RowError};
use crate::profile::{ConversionProfile, FeeSchedule, LedgerAccounts};

const FIELD_NAMES: &str = "TRNSTYPE\tDATE\tACCNT\tNAME\tAMOUNT\tMEMO";

/// Rows left out of the ledger, by reason.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DropCounts {
    pub unparseable_date: usize,
    pub unparseable_amount: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.unparseable_date + self.unparseable_amount
    }
}

/// Sales of one conversion run, in report order, with their per-day totals.
///
/// Memo text is written verbatim: it must not contain tabs or newlines, the IIF
/// format has no escaping for them.
pub struct Ledger {
    accounts: LedgerAccounts,
    fees: Option<FeeSchedule>,
    doc_numbers: bool,
    pub sales: Vec<Sale>,
    pub days: BTreeMap<NaiveDate, DailyTotal>,
    pub dropped: DropCounts,
}

impl Ledger {
    pub fn new(profile: &ConversionProfile) -> Ledger {
        Ledger {
            accounts: profile.accounts.clone(),
            fees: profile.fees.clone(),
            doc_numbers: profile.doc_numbers,
            sales: Vec::new(),
            days: BTreeMap::new(),
            dropped: DropCounts::default(),
        }
    }

    pub fn record_sale(&mut self, row: TransactionRow) -> Result<(), LedgerError> {
        let date = row.date();
        let day = self.days.entry(date).or_insert_with(|| DailyTotal::new(date));
        day.add(row.amount())?;
        if let Some(fees) = &self.fees {
            day.service_charge(fees.rate)?;
        }

        self.sales.push(Sale::new(row, &self.accounts));

        Ok(())
    }

    pub fn record_drop(&mut self, err: &RowError) {
        match err {
            RowError::UnparseableDate(_) => self.dropped.unparseable_date += 1,
            RowError::UnparseableAmount(_) => self.dropped.unparseable_amount += 1,
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &TransactionRow> {
        self.sales.iter().map(Sale::row)
    }

    pub fn preview(&self, limit: usize) -> impl Iterator<Item = &TransactionRow> {
        self.rows().take(limit)
    }

    /// One charge per day in date order. Days whose charge rounds to zero are skipped.
    pub fn service_charges(&self) -> Result<Vec<ServiceCharge>, LedgerError> {
        let Some(fees) = &self.fees else {
            return Ok(Vec::new());
        };

        let mut charges = Vec::new();
        for day in self.days.values() {
            let charge = day.service_charge(fees.rate)?;
            if charge.is_zero() {
                debug!("no service charge, date={}, total={}", day.date, day.total);
                continue;
            }

            charges.push(ServiceCharge::new(day.date, charge, &self.accounts, fees));
        }

        Ok(charges)
    }

    /// Every block of the document: the sales in report order, then the daily charges.
    pub fn entries(&self) -> Result<Vec<Entry>, LedgerError> {
        let sales = self.sales.iter().cloned().map(Entry::from);
        let charges = self.service_charges()?.into_iter().map(Entry::from);

        Ok(sales.chain(charges).collect())
    }

    pub fn render(&self) -> Result<String, LedgerError> {
        let mut out = String::new();
        write_header(&mut out, self.doc_numbers);

        for entry in self.entries()? {
            write_block(&mut out, &entry.posting(), self.doc_numbers);
        }

        Ok(out)
    }

    pub fn write_iif<W: io::Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(self.render()?.as_bytes())?;
        writer.flush()?;

        Ok(())
    }
}

fn write_header(out: &mut String, doc_numbers: bool) {
    for tag in ["!TRNS", "!SPL"] {
        let _ = write!(out, "{}\t{}", tag, FIELD_NAMES);
        if doc_numbers {
            out.push_str("\tDOCNUM");
        }
        out.push('\n');
    }
    out.push_str("!ENDTRNS\n");
}

fn write_block(out: &mut String, posting: &Posting, doc_numbers: bool) {
    write_line(out, "TRNS", posting, &posting.debit, posting.amount, doc_numbers);
    write_line(out, "SPL", posting, &posting.credit, -posting.amount, doc_numbers);
    out.push_str("ENDTRNS\n");
}

fn write_line(out: &mut String, tag: &str, posting: &Posting, party: &Party, amount: Decimal, doc_numbers: bool) {
    let _ = write!(
        out,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        tag,
        posting.transaction_type,
        posting.date.format(IIF_DATE_FORMAT),
        party.account,
        party.name,
        amount,
        posting.memo
    );
    if doc_numbers {
        let _ = write!(out, "\t{}", party.doc_number);
    }
    out.push('\n');
}
