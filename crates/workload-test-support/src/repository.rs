//! `BucketStore` implementations for tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use workload_core::error::DomainError;
use workload_core::period::Period;
use workload_core::repository::{BucketStore, WorkloadBucket};

type BucketKey = (String, Period);

/// A bucket store held in memory with the same optimistic-concurrency rules
/// as the PostgreSQL store. Counts `find_by_key` reads and `upsert` writes.
#[derive(Debug)]
pub struct InMemoryBucketStore {
    buckets: Mutex<BTreeMap<BucketKey, WorkloadBucket>>,
    next_id: AtomicI64,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryBucketStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Creates a store pre-populated with `buckets`. Buckets without an id
    /// are assigned one at version 1. Seeding does not count as a write.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_buckets(buckets: Vec<WorkloadBucket>) -> Self {
        let store = Self::new();
        {
            let mut map = store.buckets.lock().unwrap();
            for mut bucket in buckets {
                if bucket.id.is_none() {
                    bucket.id = Some(store.next_id.fetch_add(1, Ordering::SeqCst));
                    bucket.version = 1;
                }
                map.insert((bucket.trainer_username.clone(), bucket.period), bucket);
            }
        }
        store
    }

    /// Returns the stored bucket for a key, bypassing the read counter.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn get(&self, trainer_username: &str, period: Period) -> Option<WorkloadBucket> {
        self.buckets
            .lock()
            .unwrap()
            .get(&(trainer_username.to_owned(), period))
            .cloned()
    }

    /// Number of stored buckets.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn len(&self) -> usize {
        self.buckets.lock().unwrap().len()
    }

    /// Whether the store holds no buckets.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `find_by_key` calls so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `upsert` calls so far, successful or not.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryBucketStore {
    fn default() -> Self {
        Self::new()
    }
}

fn conflict(bucket: &WorkloadBucket) -> DomainError {
    DomainError::ConcurrencyConflict {
        trainer_username: bucket.trainer_username.clone(),
        period: bucket.period,
    }
}

#[async_trait]
impl BucketStore for InMemoryBucketStore {
    async fn find_by_key(
        &self,
        trainer_username: &str,
        period: Period,
    ) -> Result<Option<WorkloadBucket>, DomainError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.get(trainer_username, period))
    }

    async fn list_by_trainer_ordered(
        &self,
        trainer_username: &str,
    ) -> Result<Vec<WorkloadBucket>, DomainError> {
        // BTreeMap keys order by (username, period), so a filtered scan is
        // already ascending by (year, month).
        Ok(self
            .buckets
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.trainer_username == trainer_username)
            .cloned()
            .collect())
    }

    async fn upsert(&self, bucket: &WorkloadBucket) -> Result<WorkloadBucket, DomainError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut buckets = self.buckets.lock().unwrap();
        let key = (bucket.trainer_username.clone(), bucket.period);

        let stored = match (bucket.id, buckets.get(&key)) {
            (None, None) => WorkloadBucket {
                id: Some(self.next_id.fetch_add(1, Ordering::SeqCst)),
                version: 1,
                ..bucket.clone()
            },
            (Some(id), Some(existing))
                if existing.id == Some(id) && existing.version == bucket.version =>
            {
                WorkloadBucket {
                    version: bucket.version + 1,
                    ..bucket.clone()
                }
            }
            _ => return Err(conflict(bucket)),
        };

        buckets.insert(key, stored.clone());
        Ok(stored)
    }
}

/// A bucket store that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingBucketStore;

#[async_trait]
impl BucketStore for FailingBucketStore {
    async fn find_by_key(
        &self,
        _trainer_username: &str,
        _period: Period,
    ) -> Result<Option<WorkloadBucket>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn list_by_trainer_ordered(
        &self,
        _trainer_username: &str,
    ) -> Result<Vec<WorkloadBucket>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn upsert(&self, _bucket: &WorkloadBucket) -> Result<WorkloadBucket, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

/// An in-memory store whose first `conflicts` upserts lose a simulated race
/// and fail with `DomainError::ConcurrencyConflict` without writing.
#[derive(Debug)]
pub struct ConflictingBucketStore {
    inner: InMemoryBucketStore,
    conflicts_remaining: AtomicU32,
}

impl ConflictingBucketStore {
    /// Creates a store that rejects the next `conflicts` upserts.
    #[must_use]
    pub fn new(conflicts: u32) -> Self {
        Self {
            inner: InMemoryBucketStore::new(),
            conflicts_remaining: AtomicU32::new(conflicts),
        }
    }

    /// The backing in-memory store.
    #[must_use]
    pub fn inner(&self) -> &InMemoryBucketStore {
        &self.inner
    }
}

#[async_trait]
impl BucketStore for ConflictingBucketStore {
    async fn find_by_key(
        &self,
        trainer_username: &str,
        period: Period,
    ) -> Result<Option<WorkloadBucket>, DomainError> {
        self.inner.find_by_key(trainer_username, period).await
    }

    async fn list_by_trainer_ordered(
        &self,
        trainer_username: &str,
    ) -> Result<Vec<WorkloadBucket>, DomainError> {
        self.inner.list_by_trainer_ordered(trainer_username).await
    }

    async fn upsert(&self, bucket: &WorkloadBucket) -> Result<WorkloadBucket, DomainError> {
        let lost_race = self
            .conflicts_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if lost_race {
            return Err(conflict(bucket));
        }
        self.inner.upsert(bucket).await
    }
}
