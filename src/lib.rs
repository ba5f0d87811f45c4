pub mod account;
pub mod amount;
pub mod bill;
pub mod currency;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod grn;
pub mod group;
pub mod inventory;
pub mod line_items;
pub mod listing;
pub mod misc;
pub mod notice;
pub mod printing;
pub mod rate;
pub mod repo;
pub mod route;
pub mod supplier;
pub mod tree;

// private modules
mod interner;

pub use error::{Error, Result};
