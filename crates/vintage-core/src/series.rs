//! # Series Records
//!
//! A series is a single named observation sequence over the ordinal period
//! range `[startDate, endDate]`, carrying one release date and one revision
//! slot per observation.
//!
//! `SeriesDraft` is the wire shape handed over by provider fetchers and kept
//! by the stores. `Series` is the validated form: it can only be obtained
//! through `Series::try_from(draft)` or `SeriesBuilder`, both of which enforce
//!
//! `len(values) == len(releaseDates) == len(revisions) == endDate - startDate + 1`
//!
//! together with the required fields. Deserializing a `Series` goes through
//! the same checks.

use crate::primitives::{MAX_OBSERVATIONS, MAX_VALUE_LENGTH};
use crate::record::{Record, check_length, require_text};
use crate::schema::{SERIES_SCHEMA, Schema};
use crate::{ReleaseDate, Revisions, VintageError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// WIRE SHAPE
// =============================================================================

/// Unvalidated series as exchanged with fetchers and stores.
///
/// `revisions`, `attributes`, `dimensions` and `versionDate` may be omitted
/// from JSON input. An omitted `revisions` is read as "never revised".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDraft {
    pub name: String,
    pub key: String,
    pub dataset_code: String,
    pub start_date: i64,
    pub end_date: i64,
    pub values: Vec<Option<String>>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<String>>,
    pub release_dates: Vec<Option<ReleaseDate>>,
    #[serde(default)]
    pub revisions: Vec<Revisions>,
    pub frequency: String,
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
    #[serde(default)]
    pub version_date: Option<ReleaseDate>,
}

// =============================================================================
// VALIDATED SERIES
// =============================================================================

/// A validated series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SeriesDraft", into = "SeriesDraft")]
pub struct Series {
    name: String,
    key: String,
    dataset_code: String,
    start_date: i64,
    end_date: i64,
    values: Vec<Option<String>>,
    attributes: BTreeMap<String, Vec<String>>,
    release_dates: Vec<Option<ReleaseDate>>,
    revisions: Vec<Revisions>,
    frequency: String,
    dimensions: BTreeMap<String, String>,
    version_date: Option<ReleaseDate>,
}

/// Borrowed view of the observation at one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation<'a> {
    /// Ordinal period index.
    pub period: i64,
    /// Observed value, `None` when the period has no observation.
    pub value: Option<&'a str>,
    /// Release date of the current value.
    pub release_date: Option<ReleaseDate>,
    /// Superseded values keyed by the release date that replaced them.
    pub revisions: &'a Revisions,
}

/// Number of periods in `[start, end]`, bounded by `MAX_OBSERVATIONS`.
pub(crate) fn span(start: i64, end: i64) -> Result<usize, VintageError> {
    if end < start {
        return Err(VintageError::invalid(format!(
            "endDate {end} precedes startDate {start}"
        )));
    }
    period_count(start, end).ok_or_else(|| {
        VintageError::invalid(format!(
            "period range [{start}, {end}] exceeds {MAX_OBSERVATIONS} observations"
        ))
    })
}

/// Number of periods in `[start, end]`, or `None` past `MAX_OBSERVATIONS`.
pub(crate) fn period_count(start: i64, end: i64) -> Option<usize> {
    end.checked_sub(start)
        .and_then(|d| d.checked_add(1))
        .and_then(|n| usize::try_from(n).ok())
        .filter(|&n| n <= MAX_OBSERVATIONS)
}

impl TryFrom<SeriesDraft> for Series {
    type Error = VintageError;

    fn try_from(draft: SeriesDraft) -> Result<Self, Self::Error> {
        require_text("name", &draft.name)?;
        require_text("key", &draft.key)?;
        require_text("datasetCode", &draft.dataset_code)?;
        require_text("frequency", &draft.frequency)?;

        let len = span(draft.start_date, draft.end_date)?;
        let key = &draft.key;

        if draft.values.len() != len {
            return Err(VintageError::invalid(format!(
                "series {key}: {} values for {len} periods",
                draft.values.len()
            )));
        }
        if draft.release_dates.len() != len {
            return Err(VintageError::invalid(format!(
                "series {key}: {} release dates for {len} periods",
                draft.release_dates.len()
            )));
        }

        let revisions = if draft.revisions.is_empty() {
            vec![Revisions::new(); len]
        } else if draft.revisions.len() == len {
            draft.revisions
        } else {
            return Err(VintageError::invalid(format!(
                "series {key}: {} revision slots for {len} periods",
                draft.revisions.len()
            )));
        };

        for (name, codes) in &draft.attributes {
            require_text("attribute name", name)?;
            if codes.len() != len {
                return Err(VintageError::invalid(format!(
                    "series {key}: attribute {name} has {} entries for {len} periods",
                    codes.len()
                )));
            }
        }

        for (dimension, code) in &draft.dimensions {
            require_text("dimension name", dimension)?;
            check_length("dimension code", code)?;
        }

        for (i, value) in draft.values.iter().enumerate() {
            let Some(value) = value else { continue };
            if value.is_empty() || value.len() > MAX_VALUE_LENGTH {
                return Err(VintageError::invalid(format!(
                    "series {key}: value at offset {i} must be 1..={MAX_VALUE_LENGTH} bytes"
                )));
            }
            if draft.release_dates[i].is_none() {
                return Err(VintageError::invalid(format!(
                    "series {key}: value at offset {i} has no release date"
                )));
            }
        }

        Ok(Self {
            name: draft.name,
            key: draft.key,
            dataset_code: draft.dataset_code,
            start_date: draft.start_date,
            end_date: draft.end_date,
            values: draft.values,
            attributes: draft.attributes,
            release_dates: draft.release_dates,
            revisions,
            frequency: draft.frequency,
            dimensions: draft.dimensions,
            version_date: draft.version_date,
        })
    }
}

impl From<Series> for SeriesDraft {
    fn from(series: Series) -> Self {
        Self {
            name: series.name,
            key: series.key,
            dataset_code: series.dataset_code,
            start_date: series.start_date,
            end_date: series.end_date,
            values: series.values,
            attributes: series.attributes,
            release_dates: series.release_dates,
            revisions: series.revisions,
            frequency: series.frequency,
            dimensions: series.dimensions,
            version_date: series.version_date,
        }
    }
}

impl Record for Series {
    const SCHEMA: Schema = SERIES_SCHEMA;

    fn natural_key(&self) -> &str {
        &self.key
    }
}

impl Series {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn dataset_code(&self) -> &str {
        &self.dataset_code
    }

    /// First period index covered.
    #[must_use]
    pub const fn start_date(&self) -> i64 {
        self.start_date
    }

    /// Last period index covered (inclusive).
    #[must_use]
    pub const fn end_date(&self) -> i64 {
        self.end_date
    }

    #[must_use]
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, Vec<String>> {
        &self.attributes
    }

    #[must_use]
    pub fn release_dates(&self) -> &[Option<ReleaseDate>] {
        &self.release_dates
    }

    #[must_use]
    pub fn revisions(&self) -> &[Revisions] {
        &self.revisions
    }

    #[must_use]
    pub fn frequency(&self) -> &str {
        &self.frequency
    }

    #[must_use]
    pub fn dimensions(&self) -> &BTreeMap<String, String> {
        &self.dimensions
    }

    #[must_use]
    pub const fn version_date(&self) -> Option<ReleaseDate> {
        self.version_date
    }

    /// Number of periods covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// A validated series always covers at least one period.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Offset of `period` within this series, if covered.
    #[must_use]
    pub fn offset_of(&self, period: i64) -> Option<usize> {
        if period < self.start_date || period > self.end_date {
            return None;
        }
        usize::try_from(period - self.start_date).ok()
    }

    /// Observation at `period`, if the period lies within the range.
    #[must_use]
    pub fn observation(&self, period: i64) -> Option<Observation<'_>> {
        let offset = self.offset_of(period)?;
        Some(Observation {
            period,
            value: self.values.get(offset)?.as_deref(),
            release_date: self.release_dates.get(offset).copied().flatten(),
            revisions: self.revisions.get(offset)?,
        })
    }

    /// Iterate over every period of the range in order.
    pub fn observations(&self) -> impl Iterator<Item = Observation<'_>> + '_ {
        (self.start_date..=self.end_date).filter_map(|period| self.observation(period))
    }

    /// Attribute code recorded for `name` at `period`, if any.
    #[must_use]
    pub fn attribute_at(&self, name: &str, period: i64) -> Option<&str> {
        let offset = self.offset_of(period)?;
        self.attributes
            .get(name)?
            .get(offset)
            .map(String::as_str)
    }

    /// Number of observations with at least one recorded revision.
    #[must_use]
    pub fn revised_count(&self) -> usize {
        self.revisions.iter().filter(|slot| !slot.is_empty()).count()
    }

    /// Replace the version stamp, keeping everything else.
    #[must_use]
    pub fn with_version_date(mut self, version_date: ReleaseDate) -> Self {
        self.version_date = Some(version_date);
        self
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Incremental construction of a `Series` for in-process fetchers.
///
/// `endDate` is derived from `startDate` and the number of values. A single
/// `release_date` may stand in for every present value.
#[derive(Debug, Clone, Default)]
pub struct SeriesBuilder {
    draft: SeriesDraft,
    release_date: Option<ReleaseDate>,
    explicit_release_dates: bool,
}

impl SeriesBuilder {
    /// Start a series with its required text fields.
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        dataset_code: impl Into<String>,
        frequency: impl Into<String>,
    ) -> Self {
        Self {
            draft: SeriesDraft {
                key: key.into(),
                name: name.into(),
                dataset_code: dataset_code.into(),
                frequency: frequency.into(),
                ..SeriesDraft::default()
            },
            release_date: None,
            explicit_release_dates: false,
        }
    }

    /// First period index.
    #[must_use]
    pub const fn start_date(mut self, start_date: i64) -> Self {
        self.draft.start_date = start_date;
        self
    }

    /// Observation values; `None` marks a period without observation.
    #[must_use]
    pub fn values(mut self, values: impl IntoIterator<Item = Option<String>>) -> Self {
        self.draft.values = values.into_iter().collect();
        self
    }

    /// Observation values, all present.
    #[must_use]
    pub fn observed<V: Into<String>>(self, values: impl IntoIterator<Item = V>) -> Self {
        self.values(values.into_iter().map(|v| Some(v.into())))
    }

    /// Use one release date for every present value.
    #[must_use]
    pub const fn release_date(mut self, release_date: ReleaseDate) -> Self {
        self.release_date = Some(release_date);
        self
    }

    /// Per-observation release dates.
    #[must_use]
    pub fn release_dates(mut self, dates: impl IntoIterator<Item = Option<ReleaseDate>>) -> Self {
        self.draft.release_dates = dates.into_iter().collect();
        self.explicit_release_dates = true;
        self
    }

    /// Per-observation revision slots.
    #[must_use]
    pub fn revisions(mut self, revisions: Vec<Revisions>) -> Self {
        self.draft.revisions = revisions;
        self
    }

    /// Per-observation attribute codes.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, codes: Vec<String>) -> Self {
        self.draft.attributes.insert(name.into(), codes);
        self
    }

    #[must_use]
    pub fn dimension(mut self, name: impl Into<String>, code: impl Into<String>) -> Self {
        self.draft.dimensions.insert(name.into(), code.into());
        self
    }

    #[must_use]
    pub const fn version_date(mut self, version_date: ReleaseDate) -> Self {
        self.draft.version_date = Some(version_date);
        self
    }

    /// Validate and produce the series.
    pub fn build(mut self) -> Result<Series, VintageError> {
        let len = i64::try_from(self.draft.values.len())
            .map_err(|_| VintageError::invalid("too many observations"))?;
        if len == 0 {
            return Err(VintageError::invalid(format!(
                "series {}: no observations",
                self.draft.key
            )));
        }
        self.draft.end_date = self
            .draft
            .start_date
            .checked_add(len - 1)
            .ok_or_else(|| VintageError::invalid("period range overflows"))?;

        if !self.explicit_release_dates {
            let date = self.release_date;
            self.draft.release_dates = self
                .draft
                .values
                .iter()
                .map(|value| value.as_ref().and(date))
                .collect();
        }

        Series::try_from(self.draft)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn date(day: u32) -> ReleaseDate {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0)
            .single()
            .expect("valid date")
    }

    fn draft() -> SeriesDraft {
        SeriesDraft {
            name: "GDP".to_string(),
            key: "GDP.A.FR".to_string(),
            dataset_code: "NAAG".to_string(),
            start_date: 10,
            end_date: 12,
            values: vec![Some("1".into()), Some("2".into()), Some("3".into())],
            release_dates: vec![Some(date(1)); 3],
            frequency: "A".to_string(),
            ..SeriesDraft::default()
        }
    }

    #[test]
    fn missing_revisions_become_empty_slots() {
        let series = Series::try_from(draft()).expect("valid");
        assert_eq!(series.revisions().len(), 3);
        assert!(series.revisions().iter().all(Revisions::is_empty));
    }

    #[test]
    fn misaligned_values_rejected() {
        let mut bad = draft();
        bad.values.pop();
        assert!(matches!(
            Series::try_from(bad),
            Err(VintageError::Validation(_))
        ));
    }

    #[test]
    fn misaligned_release_dates_rejected() {
        let mut bad = draft();
        bad.release_dates.push(None);
        assert!(Series::try_from(bad).is_err());
    }

    #[test]
    fn misaligned_revisions_rejected() {
        let mut bad = draft();
        bad.revisions = vec![Revisions::new()];
        assert!(Series::try_from(bad).is_err());
    }

    #[test]
    fn inverted_range_rejected() {
        let mut bad = draft();
        bad.start_date = 13;
        assert!(Series::try_from(bad).is_err());
    }

    #[test]
    fn missing_key_rejected() {
        let mut bad = draft();
        bad.key = String::new();
        assert!(Series::try_from(bad).is_err());
    }

    #[test]
    fn present_value_needs_release_date() {
        let mut bad = draft();
        bad.release_dates[1] = None;
        assert!(Series::try_from(bad).is_err());
    }

    #[test]
    fn absent_value_may_lack_release_date() {
        let mut ok = draft();
        ok.values[1] = None;
        ok.release_dates[1] = None;
        assert!(Series::try_from(ok).is_ok());
    }

    #[test]
    fn attribute_length_must_match() {
        let mut bad = draft();
        bad.attributes
            .insert("OBS_STATUS".to_string(), vec![String::new()]);
        assert!(Series::try_from(bad).is_err());
    }

    #[test]
    fn builder_derives_end_date_and_release_dates() {
        let series = SeriesBuilder::new("K", "Name", "DS", "Q")
            .start_date(100)
            .values(vec![Some("1.5".to_string()), None, Some("2".to_string())])
            .release_date(date(3))
            .build()
            .expect("build");

        assert_eq!(series.end_date(), 102);
        assert_eq!(
            series.release_dates(),
            &[Some(date(3)), None, Some(date(3))]
        );
    }

    #[test]
    fn builder_without_values_fails() {
        assert!(SeriesBuilder::new("K", "N", "DS", "A").build().is_err());
    }

    #[test]
    fn observation_lookup_by_period() {
        let series = Series::try_from(draft()).expect("valid");
        let obs = series.observation(11).expect("in range");
        assert_eq!(obs.value, Some("2"));
        assert_eq!(obs.release_date, Some(date(1)));
        assert!(series.observation(9).is_none());
        assert!(series.observation(13).is_none());
        assert_eq!(series.observations().count(), 3);
    }

    #[test]
    fn json_deserialization_validates() {
        let json = serde_json::json!({
            "name": "GDP",
            "key": "K",
            "datasetCode": "DS",
            "startDate": 0,
            "endDate": 1,
            "values": ["1"],
            "releaseDates": ["2024-01-01T00:00:00Z"],
            "frequency": "A"
        });
        assert!(serde_json::from_value::<Series>(json).is_err());
    }

    #[test]
    fn json_uses_wire_field_names() {
        let series = Series::try_from(draft()).expect("valid");
        let value = serde_json::to_value(&series).expect("json");
        for field in SERIES_SCHEMA.fields {
            assert!(value.get(field).is_some(), "missing {field}");
        }
    }
}
