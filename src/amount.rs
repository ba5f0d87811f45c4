use std::fmt::{self, Display};
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::currency::Currency;
use crate::error::{Error, Result};

/// Parses an amount typed into a form.
///
/// Blank input clears the field and yields `None`. Anything else must be a
/// non-negative decimal, either plain (`1234.5`) or with US thousands
/// separators (`1,234.5`).
pub fn parse_amount(input: &str) -> Result<Option<Decimal>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let cleaned = if plain().is_match(input) {
        input.trim_start_matches('+').to_string()
    } else if grouped().is_match(input) {
        input.trim_start_matches('+').replace(',', "")
    } else {
        return Err(Error::InvalidAmount(input.to_string()));
    };

    Decimal::from_str_exact(&cleaned)
        .map(Some)
        .map_err(|_| Error::InvalidAmount(input.to_string()))
}

static PLAIN: OnceLock<Regex> = OnceLock::new();
static GROUPED: OnceLock<Regex> = OnceLock::new();

fn plain() -> &'static Regex {
    PLAIN.get_or_init(|| Regex::new(r"^\+?\d+(\.\d+)?$").unwrap())
}

fn grouped() -> &'static Regex {
    GROUPED.get_or_init(|| Regex::new(r"^\+?\d{1,3}(,\d{3})+(\.\d+)?$").unwrap())
}

/// `pct` percent of `value`. With `pct` at most 100 the result never
/// exceeds `value`.
pub fn percent_of(value: Decimal, pct: Decimal) -> Result<Decimal> {
    pct.checked_div(Decimal::ONE_HUNDRED)
        .and_then(|p| value.checked_mul(p))
        .ok_or_else(|| Error::InvalidAmount(value.to_string()))
}

/// `a + b`, or `InvalidAmount` when the sum does not fit in a `Decimal`.
pub fn checked_sum(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| Error::InvalidAmount(b.to_string()))
}

/// A decimal amount in a single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Money {
        Money { amount, currency }
    }

    pub fn abs(self) -> Money {
        Money {
            amount: self.amount.abs(),
            currency: self.currency,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}

impl Display for Money {
    /// Renders as `LKR 1,234.50`; the precision defaults to 2.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let pre = f.precision().unwrap_or(2);
        let q = format_decimal(self.amount, pre);

        if self.currency.is_empty() {
            return write!(f, "{}", q);
        }

        write!(f, "{} {}", self.currency, q)
    }
}

/// Formats `value` rounded to `precision` places with `,` as the
/// thousands separator.
pub fn format_decimal(value: Decimal, precision: usize) -> String {
    let rounded = value.round_dp(precision as u32);
    let formatted = format!("{:.prec$}", rounded, prec = precision);

    let (integer_part, decimal_part) = match formatted.split_once('.') {
        Some((i, d)) => (i, d),
        None => (formatted.as_str(), ""),
    };

    let formatted_integer = add_thousands_separator(integer_part);

    if decimal_part.is_empty() {
        formatted_integer
    } else {
        format!("{}.{}", formatted_integer, decimal_part)
    }
}

fn add_thousands_separator(s: &str) -> String {
    let (sign, num) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s),
    };

    let chars: Vec<char> = num.chars().collect();
    let mut result = String::with_capacity(chars.len() + chars.len() / 3);

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    format!("{}{}", sign, result)
}
