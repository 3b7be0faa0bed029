//! Trainer workload ledger bounded context.
//!
//! Responsible for applying ADD/DELETE deltas to monthly workload buckets
//! and folding a trainer's buckets into a year/month summary.

pub mod application;
pub mod domain;
