use std::io;

use thiserror::Error;

use crate::currency::Currency;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while loading records or editing a form.
#[derive(Debug, Error)]
pub enum Error {
    /// The input is not a well-formed non-negative decimal.
    #[error("invalid amount {0:?}: expected a non-negative decimal")]
    InvalidAmount(String),

    #[error("invalid date {0:?}: expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid mode {0:?}: expected view, edit or create")]
    InvalidMode(String),

    #[error("unknown account type {0:?}")]
    InvalidAccountType(String),

    #[error("invalid navigation target {0:?}")]
    InvalidRoute(String),

    #[error("page size {0} is not one of 10, 25, 50 or 100")]
    InvalidPageSize(usize),

    #[error("mode {0} needs a record id")]
    MissingId(&'static str),

    #[error("no line with id {0}")]
    UnknownRow(String),

    #[error("no record with id {0}")]
    UnknownRecord(String),

    #[error("a record with id {0} already exists")]
    DuplicateId(String),

    #[error("record {id} refers to unknown parent {parent}")]
    UnknownParent { id: String, parent: String },

    /// A record is its own ancestor.
    #[error("record {0} is part of a parent cycle")]
    CyclicHierarchy(String),

    #[error("group {key} mixes {first} and {other}")]
    MixedCurrency {
        key: String,
        first: Currency,
        other: Currency,
    },

    #[error("the form is read-only")]
    ReadOnly,

    #[error("unknown field {0:?}")]
    UnknownField(String),

    #[error("no exchange rate from {from} to {to}")]
    NoRate { from: Currency, to: Currency },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
