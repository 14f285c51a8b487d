pub mod config;
pub mod error;
pub mod filter;
pub mod jira;
pub mod reconcile;
pub mod release;
pub mod report;
pub mod store;
pub mod ticket;
pub mod types;

#[cfg(test)]
pub(crate) mod memory;

pub use error::{RelsyncError, Result};
