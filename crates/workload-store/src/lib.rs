//! PostgreSQL persistence for workload buckets.

pub mod pg_bucket_store;

/// Embedded schema migrations, shared with `#[sqlx::test]` integration tests.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
