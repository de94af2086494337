//! # Query Module
//!
//! Read-only views over a `RecordStore`:
//! - `series_revision_history`: per-period value and revision listing
//! - `StoreMetrics`: record counts and revision totals

use crate::store::{RecordStore, TypedStore};
use crate::{Collection, ReleaseDate, Series, VintageError};
use serde::Serialize;

/// Current and superseded values of one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodHistory {
    /// Period index on the series' integer axis.
    pub period: i64,
    /// Current value, `None` when absent.
    pub value: Option<String>,
    /// Release date of the current value.
    pub release_date: Option<ReleaseDate>,
    /// Superseded values as `(date superseded, value)`, oldest first.
    pub prior: Vec<(ReleaseDate, String)>,
}

impl PeriodHistory {
    /// Check if the period was ever revised.
    #[must_use]
    pub fn is_revised(&self) -> bool {
        !self.prior.is_empty()
    }
}

/// Revision history of one stored series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionHistory {
    pub key: String,
    pub frequency: String,
    pub periods: Vec<PeriodHistory>,
}

impl RevisionHistory {
    /// Build the history of `series`.
    #[must_use]
    pub fn of(series: &Series) -> Self {
        let periods = series
            .observations()
            .map(|observation| PeriodHistory {
                period: observation.period,
                value: observation.value.map(str::to_string),
                release_date: observation.release_date,
                prior: observation
                    .revisions
                    .iter()
                    .map(|(date, value)| (*date, value.clone()))
                    .collect(),
            })
            .collect();

        Self {
            key: series.key().to_string(),
            frequency: series.frequency().to_string(),
            periods,
        }
    }

    /// Periods that carry at least one revision.
    pub fn revised(&self) -> impl Iterator<Item = &PeriodHistory> {
        self.periods.iter().filter(|p| p.is_revised())
    }
}

/// Load the revision history of the series stored under `key`.
///
/// Fails with `KeyNotFound` if no series has that key.
pub fn series_revision_history<S: RecordStore + ?Sized>(
    store: &S,
    key: &str,
) -> Result<RevisionHistory, VintageError> {
    let stored = store
        .find_record::<Series>(key)?
        .ok_or_else(|| VintageError::KeyNotFound {
            collection: Collection::Series,
            key: key.to_string(),
        })?;
    Ok(RevisionHistory::of(&stored.record))
}

/// Aggregate figures of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreMetrics {
    pub datasets: usize,
    pub series: usize,
    pub categories: usize,
    /// Observations across all series with at least one revision.
    pub revised_observations: usize,
    /// Series with at least one revised observation.
    pub revised_series: usize,
}

impl StoreMetrics {
    /// Scan `store` and collect its metrics.
    ///
    /// Decodes every series, so the cost is linear in the store size.
    pub fn collect<S: RecordStore + ?Sized>(store: &S) -> Result<Self, VintageError> {
        let mut metrics = Self {
            datasets: store.count(Collection::Datasets)?,
            series: store.count(Collection::Series)?,
            categories: store.count(Collection::Categories)?,
            ..Self::default()
        };

        for stored in store.all_records::<Series>()? {
            let revised = stored.record.revised_count();
            if revised > 0 {
                metrics.revised_series += 1;
                metrics.revised_observations += revised;
            }
        }
        Ok(metrics)
    }

    /// Total number of records.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.datasets + self.series + self.categories
    }
}
