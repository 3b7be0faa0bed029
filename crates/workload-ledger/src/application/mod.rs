//! Application layer for the ledger context.

pub mod command_handlers;
pub mod query_handlers;
