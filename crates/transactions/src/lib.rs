//! Income and expense tracking: persistence, the in-memory ledger and the
//! filters and totals built on top of it.

pub mod controller;
pub mod filter;
pub mod handler;
pub mod models;
pub mod repository;
pub mod selection;
mod store;

pub use controller::{Ledger, TransactionController};
pub use filter::{Filter, Period, Summary};
pub use models::{NewTransaction, Transaction, TransactionType};
pub use repository::{TransactionError, TransactionRepository};
pub use selection::Selection;
