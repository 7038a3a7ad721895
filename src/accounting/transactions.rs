use chrono::NaiveDate;
use enum_dispatch::enum_dispatch;
use getset::{CopyGetters, Getters};
use rust_decimal::Decimal;

use super::{IifTransaction, Party, Posting};
use crate::profile::{FeeSchedule, LedgerAccounts, MemoTemplate};

/// Date layout expected by the IIF importer.
pub const IIF_DATE_FORMAT: &str = "%m/%d/%Y";

/// A till report row that survived filtering and normalisation.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct TransactionRow {
    #[getset(get = "pub")]
    till_id: String,
    #[getset(get_copy = "pub")]
    date: NaiveDate,
    #[getset(get = "pub")]
    bill_no: String,
    #[getset(get_copy = "pub")]
    amount: Decimal,
    #[getset(get = "pub")]
    memo: String,
}

impl TransactionRow {
    pub fn new(
        till_id: impl Into<String>,
        date: NaiveDate,
        bill_no: impl Into<String>,
        amount: Decimal,
        memo: &MemoTemplate,
    ) -> TransactionRow {
        let till_id = till_id.into();
        let bill_no = bill_no.into();
        let memo = memo.render(&till_id, &bill_no);

        TransactionRow {
            till_id,
            date,
            bill_no,
            amount,
            memo,
        }
    }

    pub fn formatted_date(&self) -> String {
        self.date.format(IIF_DATE_FORMAT).to_string()
    }
}

#[enum_dispatch(IifTransaction)]
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Sale,
    ServiceCharge,
}

/// Card sale moved from receivables into the clearing account.
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    row: TransactionRow,
    accounts: LedgerAccounts,
}

impl Sale {
    pub fn new(row: TransactionRow, accounts: &LedgerAccounts) -> Sale {
        Sale {
            row,
            accounts: accounts.clone(),
        }
    }

    pub fn row(&self) -> &TransactionRow {
        &self.row
    }
}

impl IifTransaction for Sale {
    fn posting(&self) -> Posting<'_> {
        Posting {
            transaction_type: &self.accounts.transaction_type,
            date: self.row.date,
            amount: self.row.amount,
            memo: &self.row.memo,
            debit: Party {
                account: &self.accounts.clearing,
                name: &self.accounts.customer,
                doc_number: &self.row.bill_no,
            },
            credit: Party {
                account: &self.accounts.receivable,
                name: &self.accounts.customer,
                doc_number: "",
            },
        }
    }
}

/// The bank's cut of one day's card takings.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCharge {
    date: NaiveDate,
    charge: Decimal,
    memo: String,
    doc_number: String,
    transaction_type: String,
    clearing: String,
    payee: String,
    expense_account: String,
}

impl ServiceCharge {
    pub fn new(date: NaiveDate, charge: Decimal, accounts: &LedgerAccounts, fees: &FeeSchedule) -> ServiceCharge {
        let day = date.format(IIF_DATE_FORMAT).to_string();

        ServiceCharge {
            date,
            charge,
            memo: format!("{}% Bank Charges on Credit Card Sales {}", fees.percent(), day),
            doc_number: format!("{}{}", fees.doc_prefix, day.replace('/', "")),
            transaction_type: fees.transaction_type.clone(),
            clearing: accounts.clearing.clone(),
            payee: fees.payee.clone(),
            expense_account: fees.expense_account.clone(),
        }
    }

    pub fn charge(&self) -> Decimal {
        self.charge
    }

    pub fn doc_number(&self) -> &str {
        &self.doc_number
    }
}

impl IifTransaction for ServiceCharge {
    fn posting(&self) -> Posting<'_> {
        Posting {
            transaction_type: &self.transaction_type,
            date: self.date,
            amount: -self.charge,
            memo: &self.memo,
            debit: Party {
                account: &self.clearing,
                name: &self.payee,
                doc_number: &self.doc_number,
            },
            credit: Party {
                account: &self.expense_account,
                name: "",
                doc_number: &self.doc_number,
            },
        }
    }
}
