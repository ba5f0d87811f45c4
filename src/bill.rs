use std::fmt::{self, Display};
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::amount::{checked_sum, parse_amount, percent_of};
use crate::currency::Currency;
use crate::error::{Error, Result};
use crate::line_items::{IdGenerator, LineItems, LineRow, RowId, UuidIds};
use crate::misc::{parse_date, today};
use crate::notice::Notice;
use crate::rate::ExchangeRate;

/// VAT rates offered on an expense line, in percent.
pub const VAT_RATES: [u32; 5] = [0, 8, 12, 15, 18];

/// Currencies a bill can be raised in.
pub const BILL_CURRENCIES: [&str; 4] = ["LKR", "USD", "EUR", "GBP"];

/// One expense line of a bill. The amount is entered either in the
/// primary currency or in the secondary one and the other side is derived
/// from the exchange rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseLine {
    pub id: RowId,
    pub account: Option<String>,
    pub amount_primary: Option<Decimal>,
    pub vat_percentage: Decimal,
    pub amount_secondary: Option<Decimal>,
    pub memo: String,
}

impl LineRow for ExpenseLine {
    fn blank(id: RowId) -> Self {
        ExpenseLine {
            id,
            account: None,
            amount_primary: None,
            vat_percentage: Decimal::ZERO,
            amount_secondary: None,
            memo: String::new(),
        }
    }

    fn id(&self) -> &RowId {
        &self.id
    }
}

impl ExpenseLine {
    pub fn primary(&self) -> Decimal {
        self.amount_primary.unwrap_or_default()
    }

    pub fn secondary(&self) -> Decimal {
        self.amount_secondary.unwrap_or_default()
    }

    pub fn vat_amount(&self) -> Result<Decimal> {
        percent_of(self.primary(), self.vat_percentage)
    }

    pub fn total_inclusive(&self) -> Result<Decimal> {
        checked_sum(self.primary(), self.vat_amount()?)
    }

    /// Sets `field` from user input. Only the derivation of the edited
    /// amount runs, so the last amount typed wins.
    pub fn set(&mut self, field: ExpenseField, input: &str, rate: &ExchangeRate) -> Result<()> {
        match field {
            ExpenseField::Account => {
                let input = input.trim();
                self.account = (!input.is_empty()).then(|| input.to_string());
            }
            ExpenseField::AmountPrimary => {
                let primary = parse_amount(input)?;
                self.amount_secondary = primary.map(|p| rate.to_secondary(p)).transpose()?;
                self.amount_primary = primary;
            }
            ExpenseField::AmountSecondary => {
                let secondary = parse_amount(input)?;
                self.amount_primary = secondary.map(|s| rate.to_primary(s)).transpose()?;
                self.amount_secondary = secondary;
            }
            ExpenseField::VatPercentage => {
                let pct = parse_amount(input)?.unwrap_or_default();
                if pct > Decimal::ONE_HUNDRED {
                    return Err(Error::InvalidAmount(input.trim().to_string()));
                }
                self.vat_percentage = pct;
            }
            ExpenseField::Memo => self.memo = input.to_string(),
        }
        self.total_inclusive()
            .map(|_| ())
            .map_err(|_| Error::InvalidAmount(input.trim().to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseField {
    Account,
    AmountPrimary,
    VatPercentage,
    AmountSecondary,
    Memo,
}

impl FromStr for ExpenseField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "account" => Ok(ExpenseField::Account),
            "amount" | "primary" => Ok(ExpenseField::AmountPrimary),
            "vat" => Ok(ExpenseField::VatPercentage),
            "secondary" => Ok(ExpenseField::AmountSecondary),
            "memo" => Ok(ExpenseField::Memo),
            _ => Err(Error::UnknownField(s.to_string())),
        }
    }
}

/// Column sums of the expense lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BillTotals {
    pub subtotal: Decimal,
    pub vat: Decimal,
    pub secondary: Decimal,
    pub grand_total: Decimal,
}

impl BillTotals {
    /// Fails with `InvalidAmount` when a sum does not fit in a `Decimal`.
    pub fn of<'a>(lines: impl IntoIterator<Item = &'a ExpenseLine>) -> Result<BillTotals> {
        let mut t = BillTotals::default();
        for l in lines {
            t.subtotal = checked_sum(t.subtotal, l.primary())?;
            t.vat = checked_sum(t.vat, l.vat_amount()?)?;
            t.secondary = checked_sum(t.secondary, l.secondary())?;
        }
        t.grand_total = checked_sum(t.subtotal, t.vat)?;
        Ok(t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentTerms {
    #[serde(rename = "net15")]
    Net15,
    #[serde(rename = "net30")]
    Net30,
    #[serde(rename = "net45")]
    Net45,
    #[serde(rename = "net60")]
    Net60,
    #[serde(rename = "due-on-receipt")]
    DueOnReceipt,
}

impl PaymentTerms {
    pub fn days(&self) -> u64 {
        match self {
            PaymentTerms::Net15 => 15,
            PaymentTerms::Net30 => 30,
            PaymentTerms::Net45 => 45,
            PaymentTerms::Net60 => 60,
            PaymentTerms::DueOnReceipt => 0,
        }
    }

    pub fn due_date(&self, bill_date: NaiveDate) -> NaiveDate {
        bill_date
            .checked_add_days(Days::new(self.days()))
            .unwrap_or(NaiveDate::MAX)
    }
}

impl Display for PaymentTerms {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PaymentTerms::DueOnReceipt => write!(f, "Due on Receipt"),
            t => write!(f, "Net {}", t.days()),
        }
    }
}

impl FromStr for PaymentTerms {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "net15" => Ok(PaymentTerms::Net15),
            "net30" => Ok(PaymentTerms::Net30),
            "net45" => Ok(PaymentTerms::Net45),
            "net60" => Ok(PaymentTerms::Net60),
            "due-on-receipt" => Ok(PaymentTerms::DueOnReceipt),
            other => Err(Error::UnknownField(other.to_string())),
        }
    }
}

/// What a saved bill looks like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bill {
    pub bill_number: String,
    pub supplier: Option<String>,
    pub bill_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: Currency,
    pub terms: Option<PaymentTerms>,
    pub memo: String,
    pub total_amount: Decimal,
    pub expenses: Vec<ExpenseLine>,
    pub totals: BillTotals,
}

/// The new-bill screen: a header and its expense lines.
#[derive(Debug, Clone)]
pub struct BillForm<G = UuidIds> {
    pub supplier: Option<String>,
    pub bill_number: String,
    pub bill_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: Currency,
    pub terms: Option<PaymentTerms>,
    pub memo: String,
    lines: LineItems<ExpenseLine, G>,
    rate: ExchangeRate,
}

impl BillForm<UuidIds> {
    pub fn new(rate: ExchangeRate) -> BillForm<UuidIds> {
        BillForm::with_ids(rate, UuidIds)
    }
}

impl<G: IdGenerator> BillForm<G> {
    pub fn with_ids(rate: ExchangeRate, ids: G) -> BillForm<G> {
        BillForm {
            supplier: None,
            bill_number: String::new(),
            bill_date: today(),
            due_date: today(),
            currency: Currency::base(),
            terms: None,
            memo: String::new(),
            lines: LineItems::with_ids(ids),
            rate,
        }
    }

    pub fn rate(&self) -> &ExchangeRate {
        &self.rate
    }

    pub fn lines(&self) -> &[ExpenseLine] {
        self.lines.rows()
    }

    pub fn set_supplier(&mut self, id: &str) {
        let id = id.trim();
        self.supplier = (!id.is_empty()).then(|| id.to_string());
    }

    pub fn set_bill_date(&mut self, input: &str) -> Result<()> {
        self.bill_date = parse_date(input)?.unwrap_or_else(today);
        Ok(())
    }

    pub fn set_due_date(&mut self, input: &str) -> Result<()> {
        self.due_date = parse_date(input)?.unwrap_or_else(today);
        Ok(())
    }

    /// Picking terms also moves the due date to match them.
    pub fn set_terms(&mut self, input: &str) -> Result<()> {
        if input.trim().is_empty() {
            self.terms = None;
            return Ok(());
        }
        let terms: PaymentTerms = input.parse()?;
        self.terms = Some(terms);
        self.due_date = terms.due_date(self.bill_date);
        Ok(())
    }

    pub fn set_currency(&mut self, code: &str) -> Result<()> {
        let code = code.trim().to_uppercase();
        if !BILL_CURRENCIES.contains(&code.as_str()) {
            return Err(Error::UnknownField(code));
        }
        self.currency = Currency::new(&code);
        Ok(())
    }

    pub fn add_line(&mut self) -> RowId {
        self.lines.add()
    }

    pub fn remove_line(&mut self, id: &RowId) -> Result<bool> {
        self.lines.remove(id)
    }

    /// The edit is refused when the bill totals would no longer fit in a
    /// `Decimal`.
    pub fn set_line(&mut self, id: &RowId, field: ExpenseField, input: &str) -> Result<()> {
        let rate = self.rate;
        let others: Vec<ExpenseLine> = self
            .lines
            .rows()
            .iter()
            .filter(|l| &l.id != id)
            .cloned()
            .collect();
        self.lines.update(id, |l| {
            l.set(field, input, &rate)?;
            BillTotals::of(others.iter().chain(std::iter::once(&*l)))
                .map(|_| ())
                .map_err(|_| Error::InvalidAmount(input.trim().to_string()))
        })
    }

    pub fn totals(&self) -> Result<BillTotals> {
        BillTotals::of(self.lines.rows())
    }

    /// Back to an empty bill dated today with a single blank line.
    pub fn clear(&mut self) {
        self.supplier = None;
        self.bill_number.clear();
        self.bill_date = today();
        self.due_date = today();
        self.currency = Currency::base();
        self.terms = None;
        self.memo.clear();
        self.lines.reset();
        debug!("bill form cleared");
    }

    pub fn save(&self) -> Result<(Bill, Notice)> {
        let totals = self.totals()?;
        let bill = Bill {
            bill_number: self.bill_number.clone(),
            supplier: self.supplier.clone(),
            bill_date: self.bill_date,
            due_date: self.due_date,
            currency: self.currency,
            terms: self.terms,
            memo: self.memo.clone(),
            total_amount: totals.grand_total,
            expenses: self.lines.rows().to_vec(),
            totals,
        };
        info!(bill = %bill.bill_number, total = %bill.total_amount, "bill saved");

        let notice = Notice::success(
            "Bill Saved",
            format!("Bill {} has been saved.", self.bill_number),
        );
        Ok((bill, notice))
    }
}
