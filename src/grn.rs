//! Goods received notes: the list record and the entry form.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::amount::{checked_sum, parse_amount, percent_of};
use crate::error::{Error, Result};
use crate::filter::Searchable;
use crate::line_items::{IdGenerator, LineItems, LineRow, RowId, SequentialIds};
use crate::misc::{parse_date, today};
use crate::notice::Notice;
use crate::repo::Record;
use crate::route::Mode;

/// A row of the GRN list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrnRecord {
    pub id: String,
    pub grn_number: String,
    pub invoice_number: String,
    pub date: NaiveDate,
}

impl Record for GrnRecord {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrnRecordField {
    GrnNumber,
    InvoiceNumber,
}

impl Searchable for GrnRecord {
    type Field = GrnRecordField;

    const QUICK_FIELDS: &'static [GrnRecordField] =
        &[GrnRecordField::GrnNumber, GrnRecordField::InvoiceNumber];

    fn text(&self, field: GrnRecordField) -> &str {
        match field {
            GrnRecordField::GrnNumber => &self.grn_number,
            GrnRecordField::InvoiceNumber => &self.invoice_number,
        }
    }

    fn date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }
}

/// An item received. Amounts are derived from the unit price, the
/// quantity and the tax percentage of the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrnLine {
    pub id: RowId,
    pub item_description: String,
    pub model: String,
    pub serial_no: String,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub warranty_period: String,
    pub remarks: String,
}

impl LineRow for GrnLine {
    fn blank(id: RowId) -> Self {
        GrnLine {
            id,
            item_description: String::new(),
            model: String::new(),
            serial_no: String::new(),
            quantity: None,
            unit_price: None,
            warranty_period: String::new(),
            remarks: String::new(),
        }
    }

    fn id(&self) -> &RowId {
        &self.id
    }
}

impl GrnLine {
    /// Unit price times quantity, once both are filled in.
    pub fn line_total(&self) -> Result<Option<Decimal>> {
        match (self.unit_price, self.quantity) {
            (Some(price), Some(qty)) => price
                .checked_mul(qty)
                .map(Some)
                .ok_or_else(|| Error::InvalidAmount(format!("{} x {}", price, qty))),
            _ => Ok(None),
        }
    }

    pub fn tax_amount(&self, tax_percentage: Option<Decimal>) -> Result<Option<Decimal>> {
        match (self.line_total()?, tax_percentage) {
            (Some(total), Some(pct)) => percent_of(total, pct).map(Some),
            _ => Ok(None),
        }
    }

    pub fn total_inclusive(&self, tax_percentage: Option<Decimal>) -> Result<Option<Decimal>> {
        let Some(total) = self.line_total()? else {
            return Ok(None);
        };
        let tax = self.tax_amount(tax_percentage)?.unwrap_or_default();
        checked_sum(total, tax).map(Some)
    }

    pub fn set(&mut self, field: GrnField, input: &str) -> Result<()> {
        match field {
            GrnField::ItemDescription => self.item_description = input.to_string(),
            GrnField::Model => self.model = input.to_string(),
            GrnField::SerialNo => self.serial_no = input.to_string(),
            GrnField::Quantity => self.quantity = parse_amount(input)?,
            GrnField::UnitPrice => self.unit_price = parse_amount(input)?,
            GrnField::WarrantyPeriod => self.warranty_period = input.to_string(),
            GrnField::Remarks => self.remarks = input.to_string(),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrnField {
    ItemDescription,
    Model,
    SerialNo,
    Quantity,
    UnitPrice,
    WarrantyPeriod,
    Remarks,
}

impl FromStr for GrnField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "description" => Ok(GrnField::ItemDescription),
            "model" => Ok(GrnField::Model),
            "serial" => Ok(GrnField::SerialNo),
            "qty" | "quantity" => Ok(GrnField::Quantity),
            "price" => Ok(GrnField::UnitPrice),
            "warranty" => Ok(GrnField::WarrantyPeriod),
            "remarks" => Ok(GrnField::Remarks),
            _ => Err(Error::UnknownField(s.to_string())),
        }
    }
}

/// Column sums of the lines that have both price and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GrnTotals {
    pub amount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl GrnTotals {
    /// Fails with `InvalidAmount` when a sum does not fit in a `Decimal`.
    pub fn of<'a>(
        lines: impl IntoIterator<Item = &'a GrnLine>,
        tax_percentage: Option<Decimal>,
    ) -> Result<GrnTotals> {
        let mut t = GrnTotals::default();
        for l in lines {
            t.amount = checked_sum(t.amount, l.line_total()?.unwrap_or_default())?;
            t.tax = checked_sum(t.tax, l.tax_amount(tax_percentage)?.unwrap_or_default())?;
        }
        t.total = checked_sum(t.amount, t.tax)?;
        Ok(t)
    }
}

/// Header of a goods received note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrnHeader {
    pub grn_no: String,
    pub date: NaiveDate,
    pub invoice_no: String,
    pub received_by: String,
    pub supplier_name: String,
    pub company_name: String,
    pub proforma_order_no: String,
    pub purchasing_purpose: String,
    pub taxable: bool,
    pub tax_percentage: Option<Decimal>,
}

impl Default for GrnHeader {
    fn default() -> Self {
        GrnHeader {
            grn_no: String::new(),
            date: today(),
            invoice_no: String::new(),
            received_by: String::new(),
            supplier_name: String::new(),
            company_name: String::new(),
            proforma_order_no: String::new(),
            purchasing_purpose: String::new(),
            taxable: false,
            tax_percentage: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    GrnNo,
    Date,
    InvoiceNo,
    ReceivedBy,
    SupplierName,
    CompanyName,
    ProformaOrderNo,
    PurchasingPurpose,
    Taxable,
    TaxPercentage,
}

impl FromStr for HeaderField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "grn-no" => Ok(HeaderField::GrnNo),
            "date" => Ok(HeaderField::Date),
            "invoice" => Ok(HeaderField::InvoiceNo),
            "received-by" => Ok(HeaderField::ReceivedBy),
            "supplier" => Ok(HeaderField::SupplierName),
            "company" => Ok(HeaderField::CompanyName),
            "proforma" => Ok(HeaderField::ProformaOrderNo),
            "purpose" => Ok(HeaderField::PurchasingPurpose),
            "taxable" => Ok(HeaderField::Taxable),
            "tax" => Ok(HeaderField::TaxPercentage),
            _ => Err(Error::UnknownField(s.to_string())),
        }
    }
}

impl GrnHeader {
    fn set(&mut self, field: HeaderField, input: &str) -> Result<()> {
        match field {
            HeaderField::GrnNo => self.grn_no = input.trim().to_string(),
            HeaderField::Date => self.date = parse_date(input)?.unwrap_or_else(today),
            HeaderField::InvoiceNo => self.invoice_no = input.trim().to_string(),
            HeaderField::ReceivedBy => self.received_by = input.to_string(),
            HeaderField::SupplierName => self.supplier_name = input.to_string(),
            HeaderField::CompanyName => self.company_name = input.to_string(),
            HeaderField::ProformaOrderNo => self.proforma_order_no = input.to_string(),
            HeaderField::PurchasingPurpose => self.purchasing_purpose = input.to_string(),
            HeaderField::Taxable => {
                self.taxable = matches!(input.trim(), "true" | "yes" | "1" | "on")
            }
            HeaderField::TaxPercentage => {
                let pct = parse_amount(input)?;
                if pct.is_some_and(|p| p > Decimal::ONE_HUNDRED) {
                    return Err(Error::InvalidAmount(input.trim().to_string()));
                }
                self.tax_percentage = pct;
            }
        }
        Ok(())
    }
}

/// The GRN entry screen. Line ids start at `"1"`.
#[derive(Debug, Clone)]
pub struct GrnForm<G = SequentialIds> {
    mode: Mode,
    id: Option<String>,
    header: GrnHeader,
    lines: LineItems<GrnLine, G>,
}

impl GrnForm<SequentialIds> {
    /// An empty form for a new GRN.
    pub fn new() -> GrnForm<SequentialIds> {
        GrnForm::with_ids(SequentialIds::default())
    }
}

impl Default for GrnForm<SequentialIds> {
    fn default() -> Self {
        GrnForm::new()
    }
}

impl<G: IdGenerator + Default> GrnForm<G> {
    pub fn with_ids(ids: G) -> GrnForm<G> {
        GrnForm {
            mode: Mode::Create,
            id: None,
            header: GrnHeader::default(),
            lines: LineItems::with_ids(ids),
        }
    }

    /// Opens an existing GRN in `mode`, filling the header from the list
    /// record.
    pub fn open(record: &GrnRecord, mode: Mode) -> GrnForm<G> {
        let mut form = GrnForm::with_ids(G::default());
        form.mode = mode;
        form.id = Some(record.id.clone());
        form.header.grn_no = record.grn_number.clone();
        form.header.invoice_no = record.invoice_number.clone();
        form.header.date = record.date;
        form
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn header(&self) -> &GrnHeader {
        &self.header
    }

    pub fn lines(&self) -> &[GrnLine] {
        self.lines.rows()
    }

    pub fn title(&self) -> String {
        let no = if self.header.grn_no.is_empty() {
            "record"
        } else {
            &self.header.grn_no
        };
        match self.mode {
            Mode::View => format!("View GRN - {} (Read-only mode)", no),
            Mode::Edit => format!("Edit GRN - {}", no),
            Mode::Create => "New GRN".to_string(),
        }
    }

    fn writable(&self) -> Result<()> {
        if self.mode.is_read_only() {
            return Err(Error::ReadOnly);
        }
        Ok(())
    }

    pub fn set_header(&mut self, field: HeaderField, input: &str) -> Result<()> {
        self.writable()?;
        let mut draft = self.header.clone();
        draft.set(field, input)?;
        GrnTotals::of(self.lines.rows(), draft.tax_percentage)
            .map_err(|_| Error::InvalidAmount(input.trim().to_string()))?;
        self.header = draft;
        debug!(?field, "grn header updated");
        Ok(())
    }

    pub fn add_line(&mut self) -> Result<RowId> {
        self.writable()?;
        Ok(self.lines.add())
    }

    pub fn remove_line(&mut self, id: &RowId) -> Result<bool> {
        self.writable()?;
        self.lines.remove(id)
    }

    /// The edit is refused when the GRN totals would no longer fit in a
    /// `Decimal`.
    pub fn set_line(&mut self, id: &RowId, field: GrnField, input: &str) -> Result<()> {
        self.writable()?;
        let pct = self.header.tax_percentage;
        let others: Vec<GrnLine> = self
            .lines
            .rows()
            .iter()
            .filter(|l| &l.id != id)
            .cloned()
            .collect();
        self.lines.update(id, |l| {
            l.set(field, input)?;
            GrnTotals::of(others.iter().chain(std::iter::once(&*l)), pct)
                .map(|_| ())
                .map_err(|_| Error::InvalidAmount(input.trim().to_string()))
        })
    }

    pub fn totals(&self) -> Result<GrnTotals> {
        GrnTotals::of(self.lines.rows(), self.header.tax_percentage)
    }

    /// Empties the header and restarts the lines at a single row `"1"`.
    /// The date is kept.
    pub fn clear(&mut self) -> Result<()> {
        self.writable()?;
        self.header = GrnHeader {
            date: self.header.date,
            ..GrnHeader::default()
        };
        self.lines = LineItems::with_ids(G::default());
        debug!("grn form cleared");
        Ok(())
    }

    /// The list record this form stands for, and the banner to show.
    pub fn save(&self) -> Result<(GrnRecord, Notice)> {
        self.writable()?;
        let record = GrnRecord {
            id: self.id.clone().unwrap_or_else(|| self.header.grn_no.clone()),
            grn_number: self.header.grn_no.clone(),
            invoice_number: self.header.invoice_no.clone(),
            date: self.header.date,
        };

        let no = if self.header.grn_no.is_empty() {
            "record"
        } else {
            &self.header.grn_no
        };
        let notice = match self.mode {
            Mode::Edit => Notice::success(
                "GRN Updated",
                format!("GRN {} has been updated successfully.", no),
            ),
            _ => Notice::success(
                "GRN Saved",
                format!("GRN {} has been saved successfully.", no),
            ),
        };
        info!(grn = no, mode = %self.mode, "grn saved");
        Ok((record, notice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::dec;

    fn record() -> GrnRecord {
        GrnRecord {
            id: "1".to_string(),
            grn_number: "GRN001".to_string(),
            invoice_number: "INV2024001".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 12, 15).unwrap(),
        }
    }

    #[test]
    fn line_amounts_need_price_and_quantity() {
        let mut form = GrnForm::new();
        let id: RowId = "1".into();
        form.set_line(&id, GrnField::UnitPrice, "250").unwrap();
        assert_eq!(form.lines()[0].line_total().unwrap(), None);

        form.set_line(&id, GrnField::Quantity, "4").unwrap();
        assert_eq!(form.lines()[0].line_total().unwrap(), Some(dec!(1000)));
        assert_eq!(form.lines()[0].tax_amount(None).unwrap(), None);

        form.set_header(HeaderField::TaxPercentage, "15").unwrap();
        let pct = form.header().tax_percentage;
        assert_eq!(form.lines()[0].tax_amount(pct).unwrap(), Some(dec!(150.00)));
        assert_eq!(form.lines()[0].total_inclusive(pct).unwrap(), Some(dec!(1150.00)));
    }

    #[test]
    fn totals_skip_incomplete_lines() {
        let mut form = GrnForm::new();
        let second = form.add_line().unwrap();
        assert_eq!(second.as_str(), "2");

        form.set_line(&"1".into(), GrnField::UnitPrice, "10").unwrap();
        form.set_line(&"1".into(), GrnField::Quantity, "3").unwrap();
        form.set_line(&second, GrnField::UnitPrice, "99").unwrap();
        form.set_header(HeaderField::TaxPercentage, "10").unwrap();

        assert_eq!(
            form.totals().unwrap(),
            GrnTotals {
                amount: dec!(30),
                tax: dec!(3),
                total: dec!(33),
            }
        );
    }

    #[test]
    fn amounts_out_of_range_are_rejected() {
        let mut form = GrnForm::new();
        let id: RowId = "1".into();
        let max = Decimal::MAX.to_string();

        form.set_line(&id, GrnField::UnitPrice, &max).unwrap();
        assert!(matches!(
            form.set_line(&id, GrnField::Quantity, "2"),
            Err(Error::InvalidAmount(_))
        ));
        assert_eq!(form.lines()[0].quantity, None);

        form.set_line(&id, GrnField::Quantity, "1").unwrap();
        assert!(form.set_header(HeaderField::TaxPercentage, "10").is_err());
        assert_eq!(form.header().tax_percentage, None);

        let second = form.add_line().unwrap();
        form.set_line(&second, GrnField::UnitPrice, "1").unwrap();
        assert!(form.set_line(&second, GrnField::Quantity, "1").is_err());
        assert_eq!(form.totals().unwrap().total, Decimal::MAX);
    }

    #[test]
    fn last_line_stays() {
        let mut form = GrnForm::new();
        assert!(!form.remove_line(&"1".into()).unwrap());
        assert_eq!(form.lines().len(), 1);
        assert_eq!(form.lines()[0].id.as_str(), "1");
    }

    #[test]
    fn view_mode_is_read_only() {
        let mut form: GrnForm = GrnForm::open(&record(), Mode::View);
        assert_eq!(form.header().grn_no, "GRN001");
        assert!(matches!(form.set_header(HeaderField::GrnNo, "X"), Err(Error::ReadOnly)));
        assert!(matches!(form.add_line(), Err(Error::ReadOnly)));
        assert!(matches!(form.remove_line(&"1".into()), Err(Error::ReadOnly)));
        assert!(matches!(
            form.set_line(&"1".into(), GrnField::Model, "M"),
            Err(Error::ReadOnly)
        ));
        assert!(matches!(form.clear(), Err(Error::ReadOnly)));
        assert!(matches!(form.save(), Err(Error::ReadOnly)));
        assert_eq!(form.title(), "View GRN - GRN001 (Read-only mode)");
    }

    #[test]
    fn save_notice_depends_on_mode() {
        let mut form: GrnForm = GrnForm::open(&record(), Mode::Edit);
        form.set_header(HeaderField::InvoiceNo, "INV-X").unwrap();
        let (rec, notice) = form.save().unwrap();
        assert_eq!(rec.id, "1");
        assert_eq!(rec.invoice_number, "INV-X");
        assert_eq!(notice.title, "GRN Updated");
        assert_eq!(notice.description, "GRN GRN001 has been updated successfully.");

        let form = GrnForm::new();
        let (_, notice) = form.save().unwrap();
        assert_eq!(notice.title, "GRN Saved");
        assert_eq!(notice.description, "GRN record has been saved successfully.");
    }

    #[test]
    fn clear_restarts_lines_at_one() {
        let mut form = GrnForm::new();
        form.set_header(HeaderField::GrnNo, "GRN100").unwrap();
        form.set_header(HeaderField::Date, "2024-12-20").unwrap();
        form.add_line().unwrap();
        form.add_line().unwrap();

        form.clear().unwrap();
        assert_eq!(form.header().grn_no, "");
        assert_eq!(form.header().date, NaiveDate::from_ymd_opt(2024, 12, 20).unwrap());
        assert_eq!(form.lines(), &[GrnLine::blank("1".into())]);
    }

    #[test]
    fn rejected_inputs_change_nothing() {
        let mut form = GrnForm::new();
        form.set_line(&"1".into(), GrnField::Quantity, "2").unwrap();
        assert!(form.set_line(&"1".into(), GrnField::Quantity, "two").is_err());
        assert_eq!(form.lines()[0].quantity, Some(dec!(2)));

        assert!(form.set_header(HeaderField::TaxPercentage, "101").is_err());
        assert!(form.set_header(HeaderField::Date, "20/12/2024").is_err());
        assert_eq!(form.header().tax_percentage, None);
        assert!(matches!("colour".parse::<GrnField>(), Err(Error::UnknownField(_))));
    }
}
