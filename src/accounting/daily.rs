use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::LedgerError;

const CHARGE_PRECISION: u32 = 2;

/// Card takings for one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: Decimal,
    pub sales: usize,
}

impl DailyTotal {
    pub fn new(date: NaiveDate) -> DailyTotal {
        DailyTotal {
            date,
            total: Decimal::ZERO,
            sales: 0,
        }
    }

    pub fn add(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        self.total = self
            .total
            .checked_add(amount)
            .ok_or(LedgerError::TotalOverflow(self.date))?;
        self.sales += 1;

        Ok(())
    }

    /// `rate` of the day's total, rounded half-to-even to cents.
    pub fn service_charge(&self, rate: Decimal) -> Result<Decimal, LedgerError> {
        self.total
            .checked_mul(rate)
            .map(|charge| charge.round_dp(CHARGE_PRECISION))
            .ok_or(LedgerError::ChargeOverflow(self.date))
    }
}
