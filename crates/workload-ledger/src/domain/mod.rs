//! Domain layer for the ledger context.

pub mod commands;
pub mod ledger;
pub mod summary;
