//! Workload core: shared domain abstractions.
//!
//! This crate defines the value types, the bucket store port and the error
//! taxonomy that the ledger and its adapters depend on. It contains no
//! infrastructure code.

pub mod clock;
pub mod command;
pub mod error;
pub mod period;
pub mod repository;
