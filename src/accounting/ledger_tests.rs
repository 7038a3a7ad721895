use anyhow::{bail, Result};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::daily::DailyTotal;
use super::ledger::{DropCounts, Ledger};
use super::*;
use crate::profile::{ConversionProfile, FeeSchedule, MemoTemplate};

const FEE_HEADER: &str = "!TRNS\tTRNSTYPE\tDATE\tACCNT\tNAME\tAMOUNT\tMEMO\tDOCNUM\n\
                          !SPL\tTRNSTYPE\tDATE\tACCNT\tNAME\tAMOUNT\tMEMO\tDOCNUM\n\
                          !ENDTRNS\n";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn row(day: NaiveDate, bill_no: &str, amount: Decimal) -> TransactionRow {
    TransactionRow::new("MT01", day, bill_no, amount, &MemoTemplate::TillInvoice)
}

fn fields(line: &str) -> Vec<&str> {
    line.split('\t').collect()
}

#[test]
fn test_empty_ledger_renders_header_only() -> Result<()> {
    let ledger = Ledger::new(&ConversionProfile::card_sales());

    assert_eq!(ledger.render()?, FEE_HEADER);

    Ok(())
}

#[test]
fn test_header_without_doc_numbers() -> Result<()> {
    let ledger = Ledger::new(&ConversionProfile::site_sales("Westlands", 0));

    assert_eq!(
        ledger.render()?,
        "!TRNS\tTRNSTYPE\tDATE\tACCNT\tNAME\tAMOUNT\tMEMO\n!SPL\tTRNSTYPE\tDATE\tACCNT\tNAME\tAMOUNT\tMEMO\n!ENDTRNS\n"
    );

    Ok(())
}

#[test]
fn test_sale_block() -> Result<()> {
    let mut ledger = Ledger::new(&ConversionProfile::card_sales().without_fees());
    ledger.record_sale(row(date(2024, 1, 1), "B1", dec!(1000.00)))?;

    let expected = format!(
        "{}{}{}{}",
        FEE_HEADER,
        "TRNS\tPAYMENT\t01/01/2024\tPesapal\tWalk In\t1000.00\tTill MT01 | Invoice B1\tB1\n",
        "SPL\tPAYMENT\t01/01/2024\tAccounts Receivable\tWalk In\t-1000.00\tTill MT01 | Invoice B1\t\n",
        "ENDTRNS\n"
    );
    assert_eq!(ledger.render()?, expected);

    Ok(())
}

#[test]
fn test_sale_block_without_doc_numbers() -> Result<()> {
    let profile = ConversionProfile::site_sales("Westlands", 0);
    let mut ledger = Ledger::new(&profile);
    ledger.record_sale(TransactionRow::new("MT01", date(2024, 1, 5), "B7", dec!(2000), &profile.memo))?;

    let rendered = ledger.render()?;
    let lines: Vec<&str> = rendered.lines().skip(3).collect();
    assert_eq!(
        lines,
        vec![
            "TRNS\tPAYMENT\t01/05/2024\tPesapal\tWalk In\t2000\tWestlands Bill B7 Credit card sale",
            "SPL\tPAYMENT\t01/05/2024\tAccounts Receivable\tWalk In\t-2000\tWestlands Bill B7 Credit card sale",
            "ENDTRNS",
        ]
    );

    Ok(())
}

#[test]
fn test_blocks_balance_and_share_date_and_memo() -> Result<()> {
    let mut ledger = Ledger::new(&ConversionProfile::card_sales());
    ledger.record_sale(row(date(2024, 1, 1), "B1", dec!(1000.00)))?;
    ledger.record_sale(row(date(2024, 1, 1), "B2", dec!(-120.35)))?;
    ledger.record_sale(row(date(2024, 1, 2), "B3", dec!(99.99)))?;

    let rendered = ledger.render()?;
    let lines: Vec<&str> = rendered.lines().skip(3).collect();
    assert_eq!(lines.len() % 3, 0);

    for block in lines.chunks(3) {
        let trns = fields(block[0]);
        let spl = fields(block[1]);
        if trns[0] != "TRNS" || spl[0] != "SPL" || block[2] != "ENDTRNS" {
            bail!("malformed block {:?}", block);
        }

        let debit: Decimal = trns[5].parse()?;
        let credit: Decimal = spl[5].parse()?;
        assert_eq!(debit, -credit);
        assert_eq!(trns[2], spl[2]);
        assert_eq!(trns[6], spl[6]);
    }

    Ok(())
}

#[test]
fn test_daily_service_charge() -> Result<()> {
    let mut ledger = Ledger::new(&ConversionProfile::card_sales());
    ledger.record_sale(row(date(2024, 1, 1), "B1", dec!(1000.00)))?;
    ledger.record_sale(row(date(2024, 1, 1), "B2", dec!(500.00)))?;

    let rendered = ledger.render()?;
    let lines: Vec<&str> = rendered.lines().skip(9).collect();
    assert_eq!(
        lines,
        vec![
            "TRNS\tCHECK\t01/01/2024\tPesapal\tBank Service Charges\t-30.00\t2% Bank Charges on Credit Card Sales 01/01/2024\tCHG-01012024",
            "SPL\tCHECK\t01/01/2024\tBank Service Charges:Bank Charges - Pesapal\t\t30.00\t2% Bank Charges on Credit Card Sales 01/01/2024\tCHG-01012024",
            "ENDTRNS",
        ]
    );

    Ok(())
}

#[test]
fn test_service_charges_follow_date_order() -> Result<()> {
    let mut ledger = Ledger::new(&ConversionProfile::card_sales());
    ledger.record_sale(row(date(2024, 1, 2), "B1", dec!(100)))?;
    ledger.record_sale(row(date(2023, 12, 31), "B2", dec!(200)))?;
    ledger.record_sale(row(date(2024, 1, 2), "B3", dec!(50)))?;

    let charges = ledger.service_charges()?;
    let docs: Vec<&str> = charges.iter().map(|charge| charge.doc_number()).collect();
    assert_eq!(docs, vec!["CHG-12312023", "CHG-01022024"]);
    assert_eq!(charges[0].charge(), dec!(4.00));
    assert_eq!(charges[1].charge(), dec!(3.00));

    Ok(())
}

#[test]
fn test_zero_service_charge_is_skipped() -> Result<()> {
    let mut ledger = Ledger::new(&ConversionProfile::card_sales());
    ledger.record_sale(row(date(2024, 1, 1), "B1", dec!(0.20)))?;
    ledger.record_sale(row(date(2024, 1, 2), "B2", dec!(100)))?;
    ledger.record_sale(row(date(2024, 1, 2), "B3", dec!(-100)))?;
    ledger.record_sale(row(date(2024, 1, 3), "B4", dec!(1)))?;

    let charges = ledger.service_charges()?;
    assert_eq!(charges.len(), 1);
    assert_eq!(charges[0].doc_number(), "CHG-01032024");
    assert_eq!(charges[0].charge(), dec!(0.02));

    Ok(())
}

#[test]
fn test_no_service_charges_without_fee_schedule() -> Result<()> {
    let mut ledger = Ledger::new(&ConversionProfile::card_sales().without_fees());
    ledger.record_sale(row(date(2024, 1, 1), "B1", dec!(1000)))?;

    assert_eq!(ledger.service_charges()?, Vec::new());
    assert_eq!(ledger.render()?.lines().count(), 6);

    Ok(())
}

#[test]
fn test_service_charge_posting_balances() -> Result<()> {
    let mut ledger = Ledger::new(&ConversionProfile::card_sales());
    ledger.record_sale(row(date(2024, 3, 9), "B1", dec!(1234.56)))?;

    let charges = ledger.service_charges()?;
    let posting = charges[0].posting();
    assert_eq!(posting.amount, dec!(-24.69));
    assert_eq!(posting.debit.doc_number, posting.credit.doc_number);
    assert_eq!(posting.credit.name, "");

    Ok(())
}

#[test]
fn test_charge_rounds_half_to_even() -> Result<()> {
    let mut day = DailyTotal::new(date(2024, 1, 1));
    day.add(dec!(0.25))?;
    day.add(dec!(0.50))?;

    assert_eq!(day.sales, 2);
    assert_eq!(day.total, dec!(0.75));
    // 0.015 goes to the even cent
    assert_eq!(day.service_charge(dec!(0.02))?, dec!(0.02));

    let mut day = DailyTotal::new(date(2024, 1, 1));
    day.add(dec!(0.25))?;
    // 0.005
    assert_eq!(day.service_charge(dec!(0.02))?, dec!(0.00));

    Ok(())
}

#[test]
fn test_record_drop_counts_by_reason() {
    let mut ledger = Ledger::new(&ConversionProfile::card_sales());
    ledger.record_drop(&RowError::UnparseableDate("x".to_string()));
    ledger.record_drop(&RowError::UnparseableAmount("y".to_string()));
    ledger.record_drop(&RowError::UnparseableAmount("z".to_string()));

    assert_eq!(
        ledger.dropped,
        DropCounts {
            unparseable_date: 1,
            unparseable_amount: 2,
        }
    );
    assert_eq!(ledger.dropped.total(), 3);
}

#[test]
fn test_preview_is_limited_and_ordered() -> Result<()> {
    let mut ledger = Ledger::new(&ConversionProfile::card_sales());
    for n in 0..15 {
        ledger.record_sale(row(date(2024, 1, 1), &format!("B{}", n), dec!(1)))?;
    }

    let bills: Vec<&str> = ledger.preview(10).map(|row| row.bill_no().as_str()).collect();
    assert_eq!(bills.len(), 10);
    assert_eq!(bills[0], "B0");
    assert_eq!(bills[9], "B9");

    Ok(())
}

#[test]
fn test_write_iif_matches_render() -> Result<()> {
    let mut ledger = Ledger::new(&ConversionProfile::card_sales());
    ledger.record_sale(row(date(2024, 1, 1), "B1", dec!(10)))?;

    let mut out = Vec::new();
    ledger.write_iif(&mut out)?;
    assert_eq!(String::from_utf8(out)?, ledger.render()?);

    Ok(())
}

#[test]
fn test_entries_put_charges_after_sales() -> Result<()> {
    let mut ledger = Ledger::new(&ConversionProfile::card_sales());
    ledger.record_sale(row(date(2024, 1, 2), "B1", dec!(100)))?;
    ledger.record_sale(row(date(2024, 1, 1), "B2", dec!(50)))?;

    let kinds: Vec<&str> = ledger
        .entries()?
        .iter()
        .map(|entry| match entry {
            Entry::Sale(_) => "sale",
            Entry::ServiceCharge(_) => "charge",
        })
        .collect();
    assert_eq!(kinds, vec!["sale", "sale", "charge", "charge"]);

    Ok(())
}

#[test]
fn test_daily_total_overflow_is_an_error() {
    let mut day = DailyTotal::new(date(2024, 1, 1));

    assert_eq!(day.add(Decimal::MAX), Ok(()));
    assert_eq!(day.add(Decimal::MAX), Err(LedgerError::TotalOverflow(date(2024, 1, 1))));
    assert_eq!(day.total, Decimal::MAX);
    assert_eq!(day.sales, 1);
}

#[test]
fn test_record_sale_rejects_overflowing_day() -> Result<()> {
    let mut ledger = Ledger::new(&ConversionProfile::card_sales().without_fees());
    ledger.record_sale(row(date(2024, 1, 1), "B1", Decimal::MAX))?;

    let err = ledger.record_sale(row(date(2024, 1, 1), "B2", Decimal::MAX));
    assert_eq!(err, Err(LedgerError::TotalOverflow(date(2024, 1, 1))));
    assert_eq!(ledger.rows().count(), 1);

    Ok(())
}

#[test]
fn test_record_sale_rejects_overflowing_charge() {
    let mut profile = ConversionProfile::card_sales();
    profile.fees = Some(FeeSchedule {
        rate: dec!(2),
        ..FeeSchedule::default()
    });
    let mut ledger = Ledger::new(&profile);

    let err = ledger.record_sale(row(date(2024, 1, 1), "B1", Decimal::MAX));
    assert_eq!(err, Err(LedgerError::ChargeOverflow(date(2024, 1, 1))));
    assert_eq!(ledger.rows().count(), 0);
}
