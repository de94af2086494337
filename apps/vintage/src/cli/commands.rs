//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use vintage_core::{
    BackendKind, Category, Collection, Dataset, Outcome, Reconciler, Reconciliation, Record,
    Series, StorageBackend, StoreMetrics, TypedStore, VintageConfig, VintageError,
    primitives::MAX_BATCH_LENGTH, series_revision_history,
};

// =============================================================================
// INPUT FILES
// =============================================================================

/// Maximum candidate file size (100 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_INPUT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), VintageError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| VintageError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(VintageError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path to an existing regular file.
///
/// Canonicalizing resolves "..", symlinks and validates existence.
fn validate_file_path(path: &Path) -> Result<PathBuf, VintageError> {
    let canonical = path.canonicalize().map_err(|e| {
        VintageError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(VintageError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Parse candidates from a JSON document holding one object or an array.
///
/// Every candidate is validated before any of them reaches the store.
fn parse_candidates<R: DeserializeOwned>(contents: &[u8]) -> Result<Vec<R>, VintageError> {
    let document: serde_json::Value = serde_json::from_slice(contents)
        .map_err(|e| VintageError::invalid(format!("malformed JSON: {}", e)))?;

    let items = match document {
        serde_json::Value::Array(items) => items,
        object @ serde_json::Value::Object(_) => vec![object],
        other => {
            return Err(VintageError::invalid(format!(
                "expected a JSON object or array, found {}",
                other
            )));
        }
    };

    if items.len() > MAX_BATCH_LENGTH {
        return Err(VintageError::invalid(format!(
            "Record count {} exceeds maximum allowed {}",
            items.len(),
            MAX_BATCH_LENGTH
        )));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item)
                .map_err(|e| VintageError::invalid(format!("entry {}: {}", index, e)))
        })
        .collect()
}

fn read_candidates<R: DeserializeOwned>(file: &Path) -> Result<Vec<R>, VintageError> {
    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_INPUT_FILE_SIZE)?;

    let contents = std::fs::read(&validated_path)
        .map_err(|e| VintageError::Io(format!("Read file: {}", e)))?;
    parse_candidates(&contents)
}

fn print_json(value: &impl Serialize) -> Result<(), VintageError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| VintageError::Serialization(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new empty store.
pub fn cmd_init(config: &VintageConfig, force: bool) -> Result<(), VintageError> {
    let storage = &config.storage;
    if storage.backend == BackendKind::Memory {
        return Err(VintageError::Config(
            "The memory backend has no store to initialize".to_string(),
        ));
    }

    if storage.path.exists() {
        if !force {
            return Err(VintageError::Storage(
                "Store already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(&storage.path).map_err(|e| {
            VintageError::Io(format!("Remove {}: {}", storage.path.display(), e))
        })?;
    }

    let backend = StorageBackend::open(storage)?;
    backend.persist()?;
    println!(
        "Initialized new {} store at {:?}",
        storage.backend, storage.path
    );
    Ok(())
}

// =============================================================================
// RECONCILE COMMANDS
// =============================================================================

/// Counts of a reconciled batch.
#[derive(Debug, Serialize)]
struct BatchSummary {
    collection: Collection,
    inserted: usize,
    updated: usize,
    unchanged: usize,
    drift_events: usize,
}

impl BatchSummary {
    fn new(collection: Collection) -> Self {
        Self {
            collection,
            inserted: 0,
            updated: 0,
            unchanged: 0,
            drift_events: 0,
        }
    }

    fn add(&mut self, report: &Reconciliation) {
        match report.outcome {
            Outcome::Inserted => self.inserted += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Unchanged => self.unchanged += 1,
        }
        self.drift_events += report.drift.len();
    }

    fn total(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }
}

/// One reconciled record in JSON output.
#[derive(Debug, Serialize)]
struct ReconciledRecord {
    key: String,
    #[serde(flatten)]
    report: Reconciliation,
}

/// Reconcile every candidate of `file` with `reconcile`, then persist.
///
/// If a candidate fails, the ones before it stay reconciled on every
/// backend: redb has already committed them and the snapshot backends are
/// persisted before the error is returned.
fn reconcile_file<R: Record>(
    config: &VintageConfig,
    json_mode: bool,
    file: &Path,
    reconcile: impl Fn(&mut Reconciler<StorageBackend>, R) -> Result<Reconciliation, VintageError>,
) -> Result<(), VintageError> {
    let collection = R::SCHEMA.collection;
    tracing::info!("Reconciling {} from {:?}", collection, file);

    let candidates: Vec<R> = read_candidates(file)?;

    let backend = StorageBackend::open(&config.storage)?;
    let mut reconciler = Reconciler::new(backend, config.reconciler.clone());

    let mut summary = BatchSummary::new(collection);
    let mut records = Vec::with_capacity(candidates.len());
    for (index, candidate) in candidates.into_iter().enumerate() {
        let key = candidate.natural_key().to_string();
        let report = match reconcile(&mut reconciler, candidate) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(
                    entry = index,
                    key = %key,
                    kept = summary.total(),
                    "batch stopped, earlier entries kept"
                );
                reconciler.store().persist()?;
                return Err(e);
            }
        };
        summary.add(&report);
        records.push(ReconciledRecord { key, report });
    }

    reconciler.store().persist()?;

    if json_mode {
        return print_json(&serde_json::json!({
            "summary": summary,
            "records": records,
        }));
    }

    println!(
        "Reconciled {} {}: {} inserted, {} updated, {} unchanged",
        summary.total(),
        collection,
        summary.inserted,
        summary.updated,
        summary.unchanged
    );
    if summary.drift_events > 0 {
        println!("Drift events: {}", summary.drift_events);
    }
    Ok(())
}

/// Reconcile datasets from a JSON file.
pub fn cmd_dataset(config: &VintageConfig, json_mode: bool, file: &Path) -> Result<(), VintageError> {
    reconcile_file::<Dataset>(config, json_mode, file, |reconciler, candidate| {
        reconciler.reconcile_dataset(candidate)
    })
}

/// Reconcile series from a JSON file.
pub fn cmd_series(config: &VintageConfig, json_mode: bool, file: &Path) -> Result<(), VintageError> {
    reconcile_file::<Series>(config, json_mode, file, |reconciler, candidate| {
        reconciler.reconcile_series(candidate)
    })
}

/// Reconcile category nodes from a JSON file.
pub fn cmd_category(
    config: &VintageConfig,
    json_mode: bool,
    file: &Path,
) -> Result<(), VintageError> {
    reconcile_file::<Category>(config, json_mode, file, |reconciler, candidate| {
        reconciler.reconcile_category(candidate)
    })
}

// =============================================================================
// SHOW COMMAND
// =============================================================================

/// Print a stored series.
pub fn cmd_show(config: &VintageConfig, json_mode: bool, key: &str) -> Result<(), VintageError> {
    let backend = StorageBackend::open(&config.storage)?;
    let stored = backend
        .find_record::<Series>(key)?
        .ok_or_else(|| VintageError::KeyNotFound {
            collection: Collection::Series,
            key: key.to_string(),
        })?;

    if json_mode {
        return print_json(&serde_json::json!({
            "id": stored.id,
            "series": stored.record,
        }));
    }

    let series = &stored.record;
    println!("Series {} ({})", series.key(), stored.id);
    println!("=================");
    println!("Name:      {}", series.name());
    println!("Dataset:   {}", series.dataset_code());
    println!("Frequency: {}", series.frequency());
    println!(
        "Periods:   {} to {} ({} observations)",
        series.start_date(),
        series.end_date(),
        series.len()
    );
    for (dimension, code) in series.dimensions() {
        println!("  {} = {}", dimension, code);
    }
    println!();

    for observation in series.observations() {
        let released = observation
            .release_date
            .map(|date| date.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        let marker = if observation.revisions.is_empty() {
            ""
        } else {
            " (revised)"
        };
        println!(
            "  {:>8}  {:<16}  {}{}",
            observation.period,
            observation.value.unwrap_or("-"),
            released,
            marker
        );
    }

    Ok(())
}

// =============================================================================
// HISTORY COMMAND
// =============================================================================

/// Print the revision history of a stored series.
pub fn cmd_history(
    config: &VintageConfig,
    json_mode: bool,
    key: &str,
    all: bool,
) -> Result<(), VintageError> {
    let backend = StorageBackend::open(&config.storage)?;
    let mut history = series_revision_history(&backend, key)?;
    if !all {
        history.periods.retain(|period| period.is_revised());
    }

    if json_mode {
        return print_json(&history);
    }

    println!("Revision history of {} ({})", history.key, history.frequency);
    println!("=========================");
    if history.periods.is_empty() {
        println!("No revised observations");
        return Ok(());
    }

    for period in &history.periods {
        let released = period
            .release_date
            .map(|date| date.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>8}  {:<16}  released {}",
            period.period,
            period.value.as_deref().unwrap_or("-"),
            released
        );
        for (superseded_on, value) in &period.prior {
            println!(
                "            was {} until {}",
                value,
                superseded_on.to_rfc3339()
            );
        }
    }

    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show store status.
pub fn cmd_status(config: &VintageConfig, json_mode: bool) -> Result<(), VintageError> {
    let backend = StorageBackend::open(&config.storage)?;
    let metrics = StoreMetrics::collect(&backend)?;

    if json_mode {
        return print_json(&serde_json::json!({
            "database": config.storage.path.to_string_lossy(),
            "backend": config.storage.backend,
            "namespace": config.reconciler.namespace,
            "metrics": metrics,
        }));
    }

    println!("Vintage Store Status");
    println!("====================");
    println!("Database:  {:?}", config.storage.path);
    println!("Backend:   {}", config.storage.backend);
    println!("Namespace: {}", config.reconciler.namespace);
    println!();
    println!("Datasets:             {}", metrics.datasets);
    println!("Series:               {}", metrics.series);
    println!("Categories:           {}", metrics.categories);
    println!("Revised series:       {}", metrics.revised_series);
    println!("Revised observations: {}", metrics.revised_observations);

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn single_object_is_one_candidate() {
        let datasets: Vec<Dataset> =
            parse_candidates(br#"{"datasetCode": "MEI", "name": "Main indicators"}"#)
                .expect("parse");
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].dataset_code(), "MEI");
    }

    #[test]
    fn array_is_a_batch() {
        let categories: Vec<Category> = parse_candidates(
            br#"[
                {"categoryCode": "ECO", "name": "Economy", "children": ["GDP"]},
                {"categoryCode": "GDP", "name": "Output"}
            ]"#,
        )
        .expect("parse");
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].children(), ["GDP".to_string()]);
    }

    #[test]
    fn invalid_entry_rejects_whole_batch() {
        let result: Result<Vec<Dataset>, _> =
            parse_candidates(br#"[{"datasetCode": "MEI"}, {"datasetCode": ""}]"#);
        assert!(matches!(
            &result,
            Err(VintageError::Validation(message)) if message.contains("entry 1")
        ));
    }

    #[test]
    fn scalar_document_rejected() {
        let result: Result<Vec<Dataset>, _> = parse_candidates(b"42");
        assert!(matches!(result, Err(VintageError::Validation(_))));
    }

    #[test]
    fn series_with_misaligned_dates_rejected() {
        let result: Result<Vec<Series>, _> = parse_candidates(
            br#"{
                "name": "GDP", "key": "GDP.A", "datasetCode": "NA", "frequency": "A",
                "startDate": 0, "endDate": 1,
                "values": ["1", "2"],
                "releaseDates": ["2024-01-01T00:00:00Z"]
            }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn unserializable_output_is_an_error() {
        let tuple_keys = std::collections::BTreeMap::from([((1u8, 2u8), 3u8)]);
        assert!(matches!(
            print_json(&tuple_keys),
            Err(VintageError::Serialization(_))
        ));
    }

    #[test]
    fn directory_is_not_an_input_file() {
        let temp = tempdir().expect("temp dir");
        assert!(matches!(
            validate_file_path(temp.path()),
            Err(VintageError::Io(_))
        ));
    }

    #[test]
    fn oversized_file_rejected() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("big.json");
        std::fs::write(&path, b"[1, 2, 3]").expect("write");
        assert!(validate_file_size(&path, 4).is_err());
        assert!(validate_file_size(&path, 1024).is_ok());
    }
}
