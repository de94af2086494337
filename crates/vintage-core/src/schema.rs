//! # Record Schemas
//!
//! Static shape definitions for every record kind.
//!
//! A `Schema` names the collection a record lives in, its natural key, the
//! volatile field excluded from change detection, and the ordered list of
//! wire field names. Drift detection walks `fields` in this order, so drift
//! events always come out in schema order.

use crate::Collection;
use crate::primitives::VOLATILE_FIELD;

/// Shape of one record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    /// Collection holding records of this kind.
    pub collection: Collection,
    /// Wire name of the natural key field.
    pub key_field: &'static str,
    /// Wire name of the field that never triggers change detection.
    pub volatile_field: Option<&'static str>,
    /// All wire field names, in canonical order.
    pub fields: &'static [&'static str],
}

impl Schema {
    /// Fields that take part in change detection.
    pub fn compared_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .copied()
            .filter(move |field| Some(*field) != self.volatile_field)
    }

    /// Check whether `field` belongs to this schema.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }
}

/// Series: one observation sequence with per-observation release history.
pub const SERIES_SCHEMA: Schema = Schema {
    collection: Collection::Series,
    key_field: "key",
    volatile_field: Some(VOLATILE_FIELD),
    fields: &[
        "name",
        "key",
        "datasetCode",
        "startDate",
        "endDate",
        "values",
        "attributes",
        "releaseDates",
        "revisions",
        "frequency",
        "dimensions",
        "versionDate",
    ],
};

/// Dataset: static metadata for a collection of series.
pub const DATASET_SCHEMA: Schema = Schema {
    collection: Collection::Datasets,
    key_field: "datasetCode",
    volatile_field: Some(VOLATILE_FIELD),
    fields: &[
        "datasetCode",
        "name",
        "dimensionList",
        "docHref",
        "attributeList",
        "lastUpdate",
        "versionDate",
    ],
};

/// Category: one node of a provider topic tree.
pub const CATEGORY_SCHEMA: Schema = Schema {
    collection: Collection::Categories,
    key_field: "categoryCode",
    volatile_field: None,
    fields: &["name", "children", "categoryCode", "present"],
};
