//! Year/month summary of a trainer's workload.

use workload_core::error::DomainError;
use workload_core::repository::WorkloadBucket;

/// Minutes trained in one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthSummary {
    /// The month number, `1..=12`.
    pub month: u32,
    /// Upper-case month name, e.g. `JANUARY`.
    pub month_name: &'static str,
    /// Accumulated minutes for the month.
    pub minutes: u32,
}

/// Months trained within one year, in bucket order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSummary {
    /// The calendar year.
    pub year: i32,
    /// Month entries in the order the buckets were supplied.
    pub months: Vec<MonthSummary>,
}

/// Hierarchical workload report for a single trainer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainerSummary {
    /// The trainer's username.
    pub username: String,
    /// First name from the first bucket.
    pub first_name: String,
    /// Last name from the first bucket.
    pub last_name: String,
    /// Active flag from the first bucket.
    pub is_active: bool,
    /// Year entries in the order first encountered.
    pub years: Vec<YearSummary>,
}

/// Folds buckets already sorted by `(year, month)` into a summary in one pass.
///
/// The builder does not sort or regroup. Profile fields come from the first
/// bucket.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if `buckets` is empty.
pub fn build_summary(
    trainer_username: &str,
    buckets: &[WorkloadBucket],
) -> Result<TrainerSummary, DomainError> {
    let Some(first) = buckets.first() else {
        return Err(DomainError::NotFound(trainer_username.to_owned()));
    };

    let mut years = Vec::new();
    let mut current_year = first.period.year();
    let mut months = Vec::new();

    for bucket in buckets {
        let year = bucket.period.year();
        if year != current_year {
            years.push(YearSummary {
                year: current_year,
                months: std::mem::take(&mut months),
            });
            current_year = year;
        }
        months.push(MonthSummary {
            month: bucket.period.month(),
            month_name: bucket.period.month_name(),
            minutes: bucket.accumulated_minutes,
        });
    }
    years.push(YearSummary {
        year: current_year,
        months,
    });

    Ok(TrainerSummary {
        username: first.trainer_username.clone(),
        first_name: first.profile.first_name.clone(),
        last_name: first.profile.last_name.clone(),
        is_active: first.profile.is_active,
        years,
    })
}
