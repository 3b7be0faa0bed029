//! `PostgreSQL` implementation of the `BucketStore` trait.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;

use workload_core::error::DomainError;
use workload_core::period::Period;
use workload_core::repository::{BucketStore, TrainerProfile, WorkloadBucket};

const BUCKET_COLUMNS: &str = "id, username, first_name, last_name, is_active, \
                              training_year, training_month, duration_min, version";

/// PostgreSQL-backed bucket store over the `trainer_workload` table.
#[derive(Debug, Clone)]
pub struct PgBucketStore {
    pool: PgPool,
}

impl PgBucketStore {
    /// Creates a new `PgBucketStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, bucket: &WorkloadBucket) -> Result<WorkloadBucket, DomainError> {
        let sql = format!(
            "INSERT INTO trainer_workload \
                 (username, first_name, last_name, is_active, training_year, training_month, duration_min, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 1) \
             ON CONFLICT (username, training_year, training_month) DO NOTHING \
             RETURNING {BUCKET_COLUMNS}"
        );

        let maybe_row = sqlx::query(&sql)
            .bind(&bucket.trainer_username)
            .bind(&bucket.profile.first_name)
            .bind(&bucket.profile.last_name)
            .bind(bucket.profile.is_active)
            .bind(bucket.period.year())
            .bind(month_column(bucket.period)?)
            .bind(minutes_column(bucket)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        // Another writer created the key between our read and this insert.
        let Some(row) = maybe_row else {
            debug!(trainer = %bucket.trainer_username, period = %bucket.period, "insert lost race");
            return Err(conflict(bucket));
        };
        row_to_bucket(&row)
    }

    async fn update(&self, id: i64, bucket: &WorkloadBucket) -> Result<WorkloadBucket, DomainError> {
        let sql = format!(
            "UPDATE trainer_workload \
             SET first_name = $1, last_name = $2, is_active = $3, duration_min = $4, version = version + 1 \
             WHERE id = $5 AND version = $6 \
             RETURNING {BUCKET_COLUMNS}"
        );

        let maybe_row = sqlx::query(&sql)
            .bind(&bucket.profile.first_name)
            .bind(&bucket.profile.last_name)
            .bind(bucket.profile.is_active)
            .bind(minutes_column(bucket)?)
            .bind(id)
            .bind(bucket.version)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let Some(row) = maybe_row else {
            debug!(trainer = %bucket.trainer_username, period = %bucket.period, version = bucket.version, "stale update");
            return Err(conflict(bucket));
        };
        row_to_bucket(&row)
    }
}

#[async_trait]
impl BucketStore for PgBucketStore {
    async fn find_by_key(
        &self,
        trainer_username: &str,
        period: Period,
    ) -> Result<Option<WorkloadBucket>, DomainError> {
        let sql = format!(
            "SELECT {BUCKET_COLUMNS} FROM trainer_workload \
             WHERE username = $1 AND training_year = $2 AND training_month = $3"
        );

        let maybe_row = sqlx::query(&sql)
            .bind(trainer_username)
            .bind(period.year())
            .bind(month_column(period)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        maybe_row.as_ref().map(row_to_bucket).transpose()
    }

    async fn list_by_trainer_ordered(
        &self,
        trainer_username: &str,
    ) -> Result<Vec<WorkloadBucket>, DomainError> {
        let sql = format!(
            "SELECT {BUCKET_COLUMNS} FROM trainer_workload \
             WHERE username = $1 \
             ORDER BY training_year ASC, training_month ASC"
        );

        let rows = sqlx::query(&sql)
            .bind(trainer_username)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_bucket).collect()
    }

    async fn upsert(&self, bucket: &WorkloadBucket) -> Result<WorkloadBucket, DomainError> {
        match bucket.id {
            None => self.insert(bucket).await,
            Some(id) => self.update(id, bucket).await,
        }
    }
}

fn conflict(bucket: &WorkloadBucket) -> DomainError {
    DomainError::ConcurrencyConflict {
        trainer_username: bucket.trainer_username.clone(),
        period: bucket.period,
    }
}

fn month_column(period: Period) -> Result<i32, DomainError> {
    i32::try_from(period.month())
        .map_err(|_| DomainError::Validation(format!("month out of range: {}", period.month())))
}

fn minutes_column(bucket: &WorkloadBucket) -> Result<i32, DomainError> {
    i32::try_from(bucket.accumulated_minutes).map_err(|_| {
        DomainError::Validation(format!(
            "duration does not fit the column: {}",
            bucket.accumulated_minutes
        ))
    })
}

fn row_to_bucket(row: &PgRow) -> Result<WorkloadBucket, DomainError> {
    let month: i32 = row.try_get("training_month").map_err(map_sqlx_error)?;
    let minutes: i32 = row.try_get("duration_min").map_err(map_sqlx_error)?;

    let month = u32::try_from(month)
        .map_err(|_| DomainError::Infrastructure(format!("stored month is negative: {month}")))?;
    let accumulated_minutes = u32::try_from(minutes).map_err(|_| {
        DomainError::Infrastructure(format!("stored duration is negative: {minutes}"))
    })?;
    let period = Period::new(row.try_get("training_year").map_err(map_sqlx_error)?, month)
        .map_err(|e| DomainError::Infrastructure(format!("stored period is invalid: {e}")))?;

    Ok(WorkloadBucket {
        id: Some(row.try_get("id").map_err(map_sqlx_error)?),
        version: row.try_get("version").map_err(map_sqlx_error)?,
        trainer_username: row.try_get("username").map_err(map_sqlx_error)?,
        period,
        profile: TrainerProfile {
            first_name: row.try_get("first_name").map_err(map_sqlx_error)?,
            last_name: row.try_get("last_name").map_err(map_sqlx_error)?,
            is_active: row.try_get("is_active").map_err(map_sqlx_error)?,
        },
        accumulated_minutes,
    })
}

fn map_sqlx_error(error: sqlx::Error) -> DomainError {
    match error {
        sqlx::Error::Database(db_error) if db_error.code().as_deref() == Some("23514") => {
            DomainError::Validation(db_error.message().to_owned())
        }
        other => DomainError::Infrastructure(other.to_string()),
    }
}
