use std::fmt::{self, Display};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::Money;
use crate::currency::Currency;
use crate::error::{Error, Result};
use crate::filter::Searchable;
use crate::group::{Balanced, Expansion, Group, group_by};
use crate::repo::Record;
use crate::tree::Hierarchical;

/// The type tag of an account, also the key the chart of accounts is
/// grouped by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum AccountType {
    Bank,
    Cash,
    #[serde(rename = "Accounts Receivable")]
    AccountsReceivable,
    #[serde(rename = "Other Current")]
    OtherCurrent,
    #[serde(rename = "Fixed Asset")]
    FixedAsset,
    #[serde(rename = "Other Asset")]
    OtherAsset,
    #[serde(rename = "Accounts Payable")]
    AccountsPayable,
    #[serde(rename = "Other Current Liability")]
    OtherCurrentLiability,
    Equity,
    Income,
    #[serde(rename = "Cost of Goods Sold")]
    CostOfGoodsSold,
    Expense,
    #[serde(rename = "Other Income")]
    OtherIncome,
    #[serde(rename = "Other Expense")]
    OtherExpense,
}

/// The statement section an account type rolls up into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccountClass {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

impl AccountType {
    pub const ALL: [AccountType; 14] = [
        AccountType::Bank,
        AccountType::Cash,
        AccountType::AccountsReceivable,
        AccountType::OtherCurrent,
        AccountType::FixedAsset,
        AccountType::OtherAsset,
        AccountType::AccountsPayable,
        AccountType::OtherCurrentLiability,
        AccountType::Equity,
        AccountType::Income,
        AccountType::CostOfGoodsSold,
        AccountType::Expense,
        AccountType::OtherIncome,
        AccountType::OtherExpense,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AccountType::Bank => "Bank",
            AccountType::Cash => "Cash",
            AccountType::AccountsReceivable => "Accounts Receivable",
            AccountType::OtherCurrent => "Other Current",
            AccountType::FixedAsset => "Fixed Asset",
            AccountType::OtherAsset => "Other Asset",
            AccountType::AccountsPayable => "Accounts Payable",
            AccountType::OtherCurrentLiability => "Other Current Liability",
            AccountType::Equity => "Equity",
            AccountType::Income => "Income",
            AccountType::CostOfGoodsSold => "Cost of Goods Sold",
            AccountType::Expense => "Expense",
            AccountType::OtherIncome => "Other Income",
            AccountType::OtherExpense => "Other Expense",
        }
    }

    pub fn class(&self) -> AccountClass {
        match self {
            AccountType::Bank
            | AccountType::Cash
            | AccountType::AccountsReceivable
            | AccountType::OtherCurrent
            | AccountType::FixedAsset
            | AccountType::OtherAsset => AccountClass::Asset,
            AccountType::AccountsPayable | AccountType::OtherCurrentLiability => {
                AccountClass::Liability
            }
            AccountType::Equity => AccountClass::Equity,
            AccountType::Income | AccountType::OtherIncome => AccountClass::Income,
            AccountType::CostOfGoodsSold | AccountType::Expense | AccountType::OtherExpense => {
                AccountClass::Expense
            }
        }
    }

    /// Types a bill expense line may be booked against.
    pub fn takes_bills(&self) -> bool {
        matches!(self, AccountType::Expense | AccountType::CostOfGoodsSold)
    }
}

impl Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AccountType {
    type Err = Error;

    /// Accepts the display name in any case, e.g. `accounts receivable`.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        AccountType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidAccountType(s.to_string()))
    }
}

/// An entry of the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "accountNumber", skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(rename = "type")]
    pub kind: AccountType,
    pub balance: Decimal,
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Account {
    pub fn balance_money(&self) -> Money {
        Money::new(self.balance, self.currency)
    }
}

impl Record for Account {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }
}

impl Hierarchical for Account {
    fn parent(&self) -> Option<&String> {
        self.parent.as_ref()
    }
}

impl Balanced for Account {
    fn balance(&self) -> Decimal {
        self.balance
    }

    fn currency(&self) -> Currency {
        self.currency
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountField {
    Name,
    Number,
}

impl Searchable for Account {
    type Field = AccountField;

    const QUICK_FIELDS: &'static [AccountField] = &[AccountField::Name, AccountField::Number];

    fn text(&self, field: AccountField) -> &str {
        match field {
            AccountField::Name => &self.name,
            AccountField::Number => self.number.as_deref().unwrap_or(""),
        }
    }
}

/// Groups open when the chart of accounts is first shown.
pub fn default_expansion() -> Expansion<AccountType> {
    [
        AccountType::Bank,
        AccountType::Cash,
        AccountType::AccountsReceivable,
    ]
    .into_iter()
    .collect()
}

/// The chart of accounts grouped by account type.
pub fn group_by_type<'a>(
    accounts: impl IntoIterator<Item = &'a Account>,
) -> Vec<Group<'a, AccountType, Account>> {
    group_by(accounts, |a| a.kind)
}

/// Accounts offered on a bill expense line.
pub fn bill_accounts(accounts: &[Account]) -> impl Iterator<Item = &Account> {
    accounts.iter().filter(|a| a.kind.takes_bills())
}

/// Headline figures of the chart of accounts in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub currency: Currency,
    pub assets: Decimal,
    pub liabilities: Decimal,
    pub equity: Decimal,
    pub net_income: Decimal,
    /// Accounts left out because they are kept in another currency.
    pub skipped: usize,
}

impl Summary {
    /// Sums absolute balances per class; net income is income less
    /// expenses.
    pub fn from_accounts(accounts: &[Account], currency: Currency) -> Summary {
        let mut s = Summary {
            currency,
            assets: Decimal::ZERO,
            liabilities: Decimal::ZERO,
            equity: Decimal::ZERO,
            net_income: Decimal::ZERO,
            skipped: 0,
        };

        for a in accounts {
            if a.currency != currency {
                s.skipped += 1;
                continue;
            }
            let v = a.balance.abs();
            match a.kind.class() {
                AccountClass::Asset => s.assets += v,
                AccountClass::Liability => s.liabilities += v,
                AccountClass::Equity => s.equity += v,
                AccountClass::Income => s.net_income += v,
                AccountClass::Expense => s.net_income -= v,
            }
        }

        s
    }
}
