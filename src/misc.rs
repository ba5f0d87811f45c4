use chrono::{NaiveDate, Utc};
use std::sync::OnceLock;

use crate::error::{Error, Result};

static TODAY: OnceLock<NaiveDate> = OnceLock::new();
pub fn today() -> NaiveDate {
    *TODAY.get_or_init(|| Utc::now().date_naive())
}

/// Parses a `YYYY-MM-DD` date typed into a form. Blank input yields
/// `None`.
pub fn parse_date(input: &str) -> Result<Option<NaiveDate>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| Error::InvalidDate(input.to_string()))
}

/// An inclusive date range; a missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BetweenDate {
    FromTo(NaiveDate, NaiveDate),
    From(NaiveDate),
    To(NaiveDate),
    #[default]
    Always,
}

impl BetweenDate {
    /// The range between two optional bounds of a list filter.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use ledgerdesk::misc::BetweenDate;
    ///
    /// let from = NaiveDate::from_ymd_opt(2024, 12, 16);
    /// let between = BetweenDate::new(from, None);
    ///
    /// assert!(!between.check(NaiveDate::from_ymd_opt(2024, 12, 15).unwrap()));
    /// assert!(between.check(NaiveDate::from_ymd_opt(2024, 12, 16).unwrap()));
    /// ```
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        match (from, to) {
            (Some(f), Some(t)) => BetweenDate::FromTo(f, t),
            (Some(f), None) => BetweenDate::From(f),
            (None, Some(t)) => BetweenDate::To(t),
            (None, None) => BetweenDate::Always,
        }
    }

    pub fn from(&self) -> Option<NaiveDate> {
        match self {
            BetweenDate::FromTo(f, _) | BetweenDate::From(f) => Some(*f),
            _ => None,
        }
    }

    pub fn to(&self) -> Option<NaiveDate> {
        match self {
            BetweenDate::FromTo(_, t) | BetweenDate::To(t) => Some(*t),
            _ => None,
        }
    }

    /// Bounds are inclusive.
    pub fn check(&self, d: NaiveDate) -> bool {
        match self {
            BetweenDate::FromTo(from, to) => d >= *from && d <= *to,
            BetweenDate::From(from) => d >= *from,
            BetweenDate::To(to) => d <= *to,
            BetweenDate::Always => true,
        }
    }
}
