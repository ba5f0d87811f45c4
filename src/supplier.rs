use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::filter::Searchable;
use crate::group::{Balanced, Group, group_by};
use crate::repo::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_purchases: Option<Decimal>,
}

impl Record for Supplier {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }
}

/// Suppliers with no recorded balance owe nothing; those with no currency
/// are kept in the home currency.
impl Balanced for Supplier {
    fn balance(&self) -> Decimal {
        self.balance.unwrap_or_default()
    }

    fn currency(&self) -> Currency {
        self.currency.unwrap_or_else(Currency::base)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplierField {
    Name,
    Email,
}

impl Searchable for Supplier {
    type Field = SupplierField;

    const QUICK_FIELDS: &'static [SupplierField] = &[SupplierField::Name, SupplierField::Email];

    fn text(&self, field: SupplierField) -> &str {
        match field {
            SupplierField::Name => &self.name,
            SupplierField::Email => &self.email,
        }
    }
}

/// Suppliers grouped by the currency their balance is kept in, so each
/// group total is single-currency.
pub fn payable_by_currency<'a>(
    suppliers: impl IntoIterator<Item = &'a Supplier>,
) -> Vec<Group<'a, Currency, Supplier>> {
    group_by(suppliers, |s| s.currency())
}
