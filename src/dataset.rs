use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::{Decimal, dec};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::account::{Account, AccountType};
use crate::currency::Currency;
use crate::error::{Error, Result};
use crate::grn::GrnRecord;
use crate::inventory::{self, InventoryItem};
use crate::repo::Record;
use crate::supplier::Supplier;
use crate::tree::check_acyclic;

/// Every collection the screens read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub suppliers: Vec<Supplier>,
    #[serde(default)]
    pub grns: Vec<GrnRecord>,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
}

impl Dataset {
    /// The built-in demo records.
    pub fn mock() -> Dataset {
        Dataset {
            accounts: mock_accounts(),
            suppliers: mock_suppliers(),
            grns: mock_grns(),
            inventory: mock_inventory(),
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Dataset> {
        let data: Dataset = serde_json::from_reader(reader)?;
        data.validate()?;
        Ok(data)
    }

    pub fn from_path(path: &Path) -> Result<Dataset> {
        let file = File::open(path)?;
        let data = Dataset::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            accounts = data.accounts.len(),
            suppliers = data.suppliers.len(),
            grns = data.grns.len(),
            "dataset loaded"
        );
        Ok(data)
    }

    /// Ids are unique per collection, account parents resolve and never
    /// loop back.
    pub fn validate(&self) -> Result<()> {
        unique_ids(&self.accounts)?;
        unique_ids(&self.suppliers)?;
        unique_ids(&self.grns)?;
        check_acyclic(&self.accounts)?;
        inventory::check_unique_ids(&self.inventory)?;
        debug!("dataset validated");
        Ok(())
    }
}

fn unique_ids<R>(records: &[R]) -> Result<()>
where
    R: Record<Id = String>,
{
    let mut seen = HashSet::new();
    for r in records {
        if !seen.insert(r.id().as_str()) {
            return Err(Error::DuplicateId(r.id().clone()));
        }
    }
    Ok(())
}

fn account(
    id: &str,
    name: &str,
    number: &str,
    kind: AccountType,
    balance: Decimal,
    parent: Option<&str>,
) -> Account {
    Account {
        id: id.to_string(),
        name: name.to_string(),
        number: Some(number.to_string()),
        kind,
        balance,
        currency: Currency::base(),
        parent: parent.map(str::to_string),
    }
}

pub fn mock_accounts() -> Vec<Account> {
    use AccountType::*;

    let mut accounts = vec![
        account("1", "Commercial Bank - Current", "1010", Bank, dec!(4500000), None),
        account("2", "HNB - Savings", "1020", Bank, dec!(2800000), None),
        account("4", "Cash on Hand", "1100", Cash, dec!(150000), None),
        account("5", "Petty Cash", "1110", Cash, dec!(20000), Some("4")),
        account("6", "Trade Receivables", "1200", AccountsReceivable, dec!(1250000), None),
        account("7", "Office Equipment", "1500", FixedAsset, dec!(1500000), None),
        account("8", "Trade Creditors", "2000", AccountsPayable, dec!(-860000), None),
        account("9", "VAT Payable", "2100", OtherCurrentLiability, dec!(-295000), None),
        account("10", "Share Capital", "3000", Equity, dec!(-10000000), None),
        account("11", "Sales", "4000", Income, dec!(-2500000), None),
        account("12", "Purchases", "5000", CostOfGoodsSold, dec!(680000), None),
        account("13", "Rent", "6000", Expense, dec!(240000), None),
        account("14", "Utilities", "6100", Expense, dec!(85000), None),
        account("15", "Office Supplies", "6200", Expense, dec!(50000), Some("13")),
    ];
    accounts.insert(
        2,
        Account {
            currency: Currency::new("USD"),
            ..account("3", "Sampath - USD", "1030", Bank, dec!(12500), None)
        },
    );
    accounts
}

pub fn mock_suppliers() -> Vec<Supplier> {
    let supplier = |id: &str, name: &str, email: &str, balance: Option<Decimal>, currency: &str| {
        Supplier {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: "+94 11 234 5678".to_string(),
            address: "Colombo".to_string(),
            balance,
            currency: Some(Currency::new(currency)),
            status: Some("active".to_string()),
            total_purchases: balance.map(|b| b * dec!(4)),
        }
    };

    vec![
        supplier("1", "ABC Traders", "sales@abctraders.lk", Some(dec!(500000)), "LKR"),
        supplier("2", "Lanka Hardware", "info@lankahardware.lk", Some(dec!(360000)), "LKR"),
        supplier("3", "Global Tech Supplies", "orders@globaltech.com", Some(dec!(150000)), "USD"),
        supplier("4", "Ceylon Office Mart", "hello@officemart.lk", None, "LKR"),
    ]
}

/// GRN001 to GRN015 with matching invoices.
pub fn mock_grns() -> Vec<GrnRecord> {
    const DAYS: [u32; 15] = [15, 18, 20, 22, 25, 26, 27, 28, 29, 29, 28, 27, 26, 25, 24];

    DAYS.iter()
        .enumerate()
        .map(|(i, &day)| {
            let n = i + 1;
            GrnRecord {
                id: n.to_string(),
                grn_number: format!("GRN{:03}", n),
                invoice_number: format!("INV2024{:03}", n),
                date: NaiveDate::from_ymd_opt(2024, 12, day).unwrap_or_default(),
            }
        })
        .collect()
}

pub fn mock_inventory() -> Vec<InventoryItem> {
    let item = |id: &str, sku: &str, children: Vec<InventoryItem>| InventoryItem {
        id: id.to_string(),
        product_name: "Footmen - Fleet - Backpack...".to_string(),
        sku: Some(sku.to_string()),
        status: "11,982 Ready".to_string(),
        current_qty: 653,
        incoming: 653,
        usage: 653,
        out_of_stock: "Sep 14, 2022".to_string(),
        orders_by: "Sep 14, 2022".to_string(),
        weeks_stock: 43,
        lead: 103,
        children,
    };

    vec![
        item("1", "Table Grand Plastic", vec![]),
        item("2", "Table Grand Plastic", vec![]),
        item(
            "3",
            "Table Grand Plastic",
            vec![
                item("3-1", "Table Grand Plastic", vec![]),
                item("3-2", "Table Grand Plastic", vec![]),
                item("3-3", "Table Grand Plastic", vec![]),
            ],
        ),
        item("4", "Show Varieties", vec![]),
        item("5", "Table Grand Plastic", vec![]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::account::Summary;

    #[test]
    fn mock_data_is_valid() {
        let data = Dataset::mock();
        data.validate().unwrap();
        assert_eq!(data.grns.len(), 15);
        assert_eq!(data.grns[14].grn_number, "GRN015");
        assert_eq!(data.grns[14].invoice_number, "INV2024015");
        assert_eq!(data.inventory[2].children.len(), 3);
    }

    #[test]
    fn mock_accounts_add_up() {
        let s = Summary::from_accounts(&mock_accounts(), Currency::base());
        assert_eq!(s.assets, dec!(10220000));
        assert_eq!(s.liabilities, dec!(1155000));
        assert_eq!(s.equity, dec!(10000000));
        assert_eq!(s.net_income, dec!(1445000));
        assert_eq!(s.skipped, 1);
    }

    #[test]
    fn loads_json_and_validates() {
        let json = r#"{
            "accounts": [
                {"id": "1", "name": "Bank", "type": "Bank", "balance": "10", "currency": "LKR"},
                {"id": "2", "name": "Sub", "accountNumber": "1011", "type": "Bank",
                 "balance": "5", "currency": "LKR", "parent": "1"}
            ],
            "grns": [{"id": "1", "grnNumber": "GRN001", "invoiceNumber": "INV1", "date": "2024-12-15"}]
        }"#;
        let data = Dataset::from_reader(json.as_bytes()).unwrap();
        assert_eq!(data.accounts[1].number.as_deref(), Some("1011"));
        assert!(data.suppliers.is_empty());
        assert_eq!(data.grns[0].date, NaiveDate::from_ymd_opt(2024, 12, 15).unwrap());
    }

    #[test]
    fn rejects_broken_hierarchies_and_duplicates() {
        let looped = r#"{"accounts": [
            {"id": "1", "name": "A", "type": "Bank", "balance": "1", "currency": "LKR", "parent": "2"},
            {"id": "2", "name": "B", "type": "Bank", "balance": "1", "currency": "LKR", "parent": "1"}
        ]}"#;
        assert!(matches!(
            Dataset::from_reader(looped.as_bytes()),
            Err(Error::CyclicHierarchy(_))
        ));

        let dup = r#"{"grns": [
            {"id": "1", "grnNumber": "A", "invoiceNumber": "I", "date": "2024-12-15"},
            {"id": "1", "grnNumber": "B", "invoiceNumber": "J", "date": "2024-12-16"}
        ]}"#;
        assert!(matches!(Dataset::from_reader(dup.as_bytes()), Err(Error::DuplicateId(_))));

        assert!(matches!(Dataset::from_reader("{".as_bytes()), Err(Error::Json(_))));
    }
}
