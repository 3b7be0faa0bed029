//! Shared test doubles and utilities for the trainer workload service.

mod clock;
mod repository;

pub use clock::FixedClock;
pub use repository::{ConflictingBucketStore, FailingBucketStore, InMemoryBucketStore};
