//! # Series Merge
//!
//! Observation-by-observation merge of a candidate series into the stored
//! one. Runs on every lookup that finds a stored record; drift is then
//! detected between the stored record and the merge result.
//!
//! ## Reindexing
//!
//! Both records are laid onto the union of their period ranges. A period
//! outside a record's range, or holding `None`, is *absent*: it has no
//! value, no release date and contributes no revision. Absent is never read
//! as zero.
//!
//! ## Per-period rules
//!
//! | stored  | candidate | value     | release date      | revisions                          |
//! |---------|-----------|-----------|-------------------|------------------------------------|
//! | `a`     | `a`       | `a`       | stored            | stored                             |
//! | `a`     | `b`       | `b`       | candidate         | stored + `candidate date -> a`     |
//! | absent  | `b`       | `b`       | candidate         | stored                             |
//! | `a`     | absent    | `a`       | stored            | stored                             |
//! | absent  | absent    | absent    | none              | stored                             |
//!
//! A period the candidate does not report keeps its stored observation:
//! providers commonly resend a trailing window only.

use crate::primitives::MAX_OBSERVATIONS;
use crate::series::period_count;
use crate::{Revisions, Series, SeriesDraft, VintageError};
use std::collections::BTreeMap;

/// Which record supplies the observation kept at one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Stored,
    Candidate,
    Neither,
}

/// Merge `candidate` into `stored`, returning the record to persist.
///
/// All non-observation fields come from the candidate. The result covers
/// the union range of both records.
///
/// # Errors
///
/// `RangeTooWide` when the union range holds more than `MAX_OBSERVATIONS`
/// periods. Both inputs are valid on their own, so this is not a
/// validation failure.
pub fn merge_series(stored: &Series, candidate: Series) -> Result<Series, VintageError> {
    let start = stored.start_date().min(candidate.start_date());
    let end = stored.end_date().max(candidate.end_date());
    let len = period_count(start, end).ok_or_else(|| VintageError::RangeTooWide {
        key: candidate.key().to_string(),
        start,
        end,
        limit: MAX_OBSERVATIONS,
    })?;

    let mut values = Vec::with_capacity(len);
    let mut release_dates = Vec::with_capacity(len);
    let mut revisions = Vec::with_capacity(len);
    let mut sources = Vec::with_capacity(len);

    for period in start..=end {
        let old = stored.observation(period);
        let new = candidate.observation(period);

        let old_value = old.and_then(|o| o.value);
        let new_value = new.and_then(|o| o.value);
        let mut slot: Revisions = old.map(|o| o.revisions.clone()).unwrap_or_default();

        let (value, release_date, source) = match (old_value, new_value) {
            (Some(a), Some(b)) if a == b => {
                let date = old
                    .and_then(|o| o.release_date)
                    .or_else(|| new.and_then(|o| o.release_date));
                (Some(b), date, Source::Candidate)
            }
            (Some(a), Some(b)) => {
                let date = new.and_then(|o| o.release_date);
                if let Some(date) = date {
                    // The first value superseded at a release date is kept.
                    slot.entry(date).or_insert_with(|| a.to_string());
                }
                (Some(b), date, Source::Candidate)
            }
            (None, Some(b)) => (
                Some(b),
                new.and_then(|o| o.release_date),
                Source::Candidate,
            ),
            (Some(a), None) => (
                Some(a),
                old.and_then(|o| o.release_date),
                Source::Stored,
            ),
            (None, None) => (None, None, Source::Neither),
        };

        values.push(value.map(str::to_string));
        release_dates.push(release_date);
        revisions.push(slot);
        sources.push((period, source));
    }

    let attributes = merge_attributes(stored, &candidate, &sources);

    let mut draft = SeriesDraft::from(candidate);
    draft.start_date = start;
    draft.end_date = end;
    draft.values = values;
    draft.release_dates = release_dates;
    draft.revisions = revisions;
    draft.attributes = attributes;

    Series::try_from(draft)
}

/// Per-observation attributes follow the record whose value was kept.
fn merge_attributes(
    stored: &Series,
    candidate: &Series,
    sources: &[(i64, Source)],
) -> BTreeMap<String, Vec<String>> {
    let names = stored
        .attributes()
        .keys()
        .chain(candidate.attributes().keys());

    let mut merged = BTreeMap::new();
    for name in names {
        if merged.contains_key(name) {
            continue;
        }
        let codes = sources
            .iter()
            .map(|&(period, source)| {
                let code = match source {
                    Source::Candidate => candidate.attribute_at(name, period),
                    Source::Stored => stored.attribute_at(name, period),
                    Source::Neither => candidate
                        .attribute_at(name, period)
                        .or_else(|| stored.attribute_at(name, period)),
                };
                code.unwrap_or_default().to_string()
            })
            .collect();
        merged.insert(name.clone(), codes);
    }
    merged
}

// =============================================================================
// TESTS
// =============================================================================
