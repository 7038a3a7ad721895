use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::Result;
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveDateTime;
use log::{debug, info};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::accounting::ledger::Ledger;
use crate::accounting::{LedgerError, RowError, TransactionRow};
use crate::dates::DateParser;
use crate::profile::{ConversionProfile, Fields, SheetLayout};

const THOUSANDS_SEPARATOR: char = ',';

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to read spreadsheet: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("failed to read csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("spreadsheet has no worksheets")]
    NoWorksheet,
    #[error("header row {0} is past the end of the sheet")]
    HeaderRowMissing(usize),
    #[error("expected column {0:?} not found in header row")]
    MissingColumn(String),
    #[error("report has {found} columns, at least {needed} are required")]
    InsufficientColumns { needed: usize, found: usize },
    #[error("{0}")]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            Cell::Number(_) | Cell::DateTime(_) => false,
        }
    }

    /// Trimmed text of the cell, empty for blank cells.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.trim().to_string(),
            Cell::Number(number) => number.to_string(),
            Cell::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => Cell::Text(text.clone()),
            Data::Float(number) => Cell::Number(*number),
            Data::Int(number) => Cell::Number(*number as f64),
            Data::Bool(flag) => Cell::Text(flag.to_string()),
            Data::DateTime(dt) => dt.as_datetime().map_or(Cell::Empty, Cell::DateTime),
            Data::Error(err) => Cell::Text(err.to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        if text.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(text.to_string())
        }
    }
}

/// A worksheet as a grid of cells, addressed from the sheet's top-left corner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<Cell>>) -> RawTable {
        RawTable { rows }
    }

    pub fn from_range(range: &Range<Data>) -> RawTable {
        // `rows()` starts at the first used cell, not at A1.
        let (top, left) = range.start().unwrap_or((0, 0));

        let mut rows: Vec<Vec<Cell>> = (0..top).map(|_| Vec::new()).collect();
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; left as usize];
            cells.extend(row.iter().map(Cell::from));
            rows.push(cells);
        }

        RawTable { rows }
    }

    pub fn width(rows: &[Vec<Cell>]) -> usize {
        rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// The four report fields of one row, before normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub till: Cell,
    pub date: Cell,
    pub bill_no: Cell,
    pub amount: Cell,
}

impl RawRow {
    fn pick(row: &[Cell], columns: &Fields<usize>) -> RawRow {
        let cell = |index: usize| row.get(index).cloned().unwrap_or(Cell::Empty);

        RawRow {
            till: cell(columns.till),
            date: cell(columns.date),
            bill_no: cell(columns.bill_no),
            amount: cell(columns.amount),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.till.is_empty() && self.date.is_empty() && self.bill_no.is_empty() && self.amount.is_empty()
    }

    pub fn normalize(&self, profile: &ConversionProfile) -> Result<TransactionRow, RowError> {
        let date = match &self.date {
            Cell::DateTime(dt) => Some(dt.date()),
            Cell::Empty => None,
            other => profile.date_format.parse_date(&other.to_text()),
        }
        .ok_or_else(|| RowError::UnparseableDate(self.date.to_text()))?;

        let amount = parse_amount(&self.amount.to_text(), profile.currency_label.as_deref())
            .ok_or_else(|| RowError::UnparseableAmount(self.amount.to_text()))?;

        Ok(TransactionRow::new(
            self.till.to_text(),
            date,
            self.bill_no.to_text(),
            amount,
            &profile.memo,
        ))
    }
}

/// Drops thousands separators and the currency label, then parses what is left.
pub fn parse_amount(text: &str, currency_label: Option<&str>) -> Option<Decimal> {
    let mut cleaned = text.replace(THOUSANDS_SEPARATOR, "");
    if let Some(label) = currency_label.filter(|label| !label.is_empty()) {
        cleaned = cleaned.replace(label, "");
    }

    cleaned.trim().parse::<Decimal>().ok()
}

#[derive(Debug, Serialize)]
pub struct PreviewRecord<'a> {
    #[serde(rename = "Till No")]
    pub till_id: &'a str,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Bill No.")]
    pub bill_no: &'a str,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "Memo")]
    pub memo: &'a str,
}

impl<'a> From<&'a TransactionRow> for PreviewRecord<'a> {
    fn from(row: &'a TransactionRow) -> Self {
        PreviewRecord {
            till_id: row.till_id(),
            date: row.formatted_date(),
            bill_no: row.bill_no(),
            amount: row.amount().to_string(),
            memo: row.memo(),
        }
    }
}

/// Loads the first worksheet of a workbook, or a whole `.csv` file.
pub fn load_table(path: &Path) -> Result<RawTable, IngestError> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        read_csv(File::open(path)?)
    } else {
        read_workbook(path)
    }
}

pub fn read_workbook(path: &Path) -> Result<RawTable, IngestError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = workbook.sheet_names().first().cloned().ok_or(IngestError::NoWorksheet)?;
    let range = workbook.worksheet_range(&sheet)?;
    debug!("loaded worksheet, name={}, size={:?}", sheet, range.get_size());

    Ok(RawTable::from_range(&range))
}

pub fn read_csv<R: Read>(reader: R) -> Result<RawTable, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new().has_headers(false).flexible(true).from_reader(reader);

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for record in csv_reader.records() {
        rows.push(record?.iter().map(Cell::from).collect());
    }

    Ok(RawTable::new(rows))
}

/// Projects the table onto the four report fields.
pub fn select_columns(table: &RawTable, layout: &SheetLayout) -> Result<Vec<RawRow>, IngestError> {
    match layout {
        SheetLayout::Positional { skip_rows, columns } => {
            let data = table.rows.get(*skip_rows..).unwrap_or_default();
            if data.is_empty() {
                return Ok(Vec::new());
            }

            let needed = columns.as_array().into_iter().max().map_or(0, |index| index + 1);
            let found = RawTable::width(data);
            if found < needed {
                return Err(IngestError::InsufficientColumns { needed, found });
            }

            Ok(data.iter().map(|row| RawRow::pick(row, columns)).collect())
        },
        SheetLayout::Labelled { header_row, columns } => {
            let header = table.rows.get(*header_row).ok_or(IngestError::HeaderRowMissing(*header_row))?;
            let labels: Vec<String> = header.iter().map(Cell::to_text).collect();

            let needed = columns.as_array().len();
            let found = labels.iter().filter(|label| !label.is_empty()).count();
            if found < needed {
                return Err(IngestError::InsufficientColumns { needed, found });
            }

            let mut missing = None;
            let positions = columns.map(|label| {
                labels.iter().position(|l| l == label).unwrap_or_else(|| {
                    missing.get_or_insert_with(|| label.clone());
                    usize::MAX
                })
            });
            if let Some(label) = missing {
                return Err(IngestError::MissingColumn(label));
            }

            Ok(table.rows[header_row + 1..]
                .iter()
                .map(|row| RawRow::pick(row, &positions))
                .collect())
        },
    }
}

/// Keeps the rows above the first blank one.
pub fn truncate_at_blank(mut rows: Vec<RawRow>) -> Vec<RawRow> {
    if let Some(first_blank) = rows.iter().position(RawRow::is_blank) {
        rows.truncate(first_blank);
    }

    rows
}

/// Keeps rows whose till id contains `channel`, case-sensitively.
pub fn filter_channel(rows: Vec<RawRow>, channel: &str) -> Vec<RawRow> {
    rows.into_iter()
        .filter(|row| !row.till.is_empty() && row.till.to_text().contains(channel))
        .collect()
}

pub fn process_table(table: &RawTable, profile: &ConversionProfile, ledger: &mut Ledger) -> Result<(), IngestError> {
    let mut rows = select_columns(table, &profile.layout)?;
    info!("selected report rows, count={}", rows.len());

    if profile.truncate_at_blank {
        rows = truncate_at_blank(rows);
        info!("truncated at first blank row, count={}", rows.len());
    }

    if let Some(channel) = &profile.channel {
        rows = filter_channel(rows, channel);
        info!("filtered to channel, channel={}, count={}", channel, rows.len());
    }

    for row in &rows {
        match row.normalize(profile) {
            Ok(row) => ledger.record_sale(row)?,
            Err(err) => {
                debug!("dropped row, bill={}, err={}", row.bill_no.to_text(), err);
                ledger.record_drop(&err);
            },
        }
    }

    info!(
        "normalised rows, kept={}, bad_date={}, bad_amount={}",
        ledger.sales.len(),
        ledger.dropped.unparseable_date,
        ledger.dropped.unparseable_amount
    );

    Ok(())
}

pub fn export_preview<W: Write>(ledger: &Ledger, limit: usize, writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    for row in ledger.preview(limit) {
        let record: PreviewRecord = row.into();
        csv_writer.serialize(record)?;
    }

    csv_writer.flush()?;

    Ok(())
}
