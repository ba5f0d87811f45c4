use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::{Decimal, dec};
use serde::Serialize;

use crate::currency::Currency;
use crate::error::{Error, Result};

/// Rate used by the bill form when nothing else is configured: 325 LKR
/// for one USD.
pub const DEFAULT_LKR_PER_USD: Decimal = dec!(325);

/// How many units of `primary` buy one unit of `secondary`, from
/// `effective` onwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExchangeRate {
    pub primary: Currency,
    pub secondary: Currency,
    pub rate: Decimal,
    pub effective: NaiveDate,
}

impl ExchangeRate {
    /// Fails with `InvalidAmount` unless `rate` is strictly positive.
    pub fn new(
        primary: Currency,
        secondary: Currency,
        rate: Decimal,
        effective: NaiveDate,
    ) -> Result<ExchangeRate> {
        if rate <= Decimal::ZERO {
            return Err(Error::InvalidAmount(rate.to_string()));
        }

        Ok(ExchangeRate {
            primary,
            secondary,
            rate,
            effective,
        })
    }

    /// Fails with `InvalidAmount` when the result does not fit.
    pub fn to_secondary(&self, primary: Decimal) -> Result<Decimal> {
        primary
            .checked_div(self.rate)
            .ok_or_else(|| Error::InvalidAmount(primary.to_string()))
    }

    pub fn to_primary(&self, secondary: Decimal) -> Result<Decimal> {
        secondary
            .checked_mul(self.rate)
            .ok_or_else(|| Error::InvalidAmount(secondary.to_string()))
    }
}

/// Supplies the rate in force between two currencies on a given day.
pub trait RateSource {
    fn rate_as_of(&self, primary: Currency, secondary: Currency, on: NaiveDate)
    -> Option<ExchangeRate>;

    fn require_rate(
        &self,
        primary: Currency,
        secondary: Currency,
        on: NaiveDate,
    ) -> Result<ExchangeRate> {
        self.rate_as_of(primary, secondary, on)
            .ok_or(Error::NoRate {
                from: primary,
                to: secondary,
            })
    }
}

/// An in-memory history of exchange rates.
#[derive(Debug, Default)]
pub struct RateTable {
    data: HashMap<(Currency, Currency), BTreeMap<NaiveDate, Decimal>>,
}

impl RateTable {
    pub fn new() -> RateTable {
        RateTable::default()
    }

    /// A table holding only `DEFAULT_LKR_PER_USD`, in force since
    /// forever.
    pub fn with_default_rate() -> RateTable {
        let mut table = RateTable::new();
        let rate = ExchangeRate {
            primary: Currency::new("LKR"),
            secondary: Currency::new("USD"),
            rate: DEFAULT_LKR_PER_USD,
            effective: NaiveDate::MIN,
        };
        table.upsert(rate);
        table
    }

    pub fn upsert(&mut self, rate: ExchangeRate) {
        self.data
            .entry((rate.primary, rate.secondary))
            .or_default()
            .insert(rate.effective, rate.rate);
    }
}

impl RateSource for RateTable {
    fn rate_as_of(
        &self,
        primary: Currency,
        secondary: Currency,
        on: NaiveDate,
    ) -> Option<ExchangeRate> {
        self.data
            .get(&(primary, secondary))
            .and_then(|rates| rates.range(..=on).next_back())
            .map(|(&effective, &rate)| ExchangeRate {
                primary,
                secondary,
                rate,
                effective,
            })
    }
}
