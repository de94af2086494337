//! # Dataset Records
//!
//! Metadata for a collection of series. Datasets carry no time series; on
//! any change the candidate replaces the stored record wholesale.

use crate::record::{Record, check_length, require_text};
use crate::schema::{DATASET_SCHEMA, Schema};
use crate::{ReleaseDate, VintageError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unvalidated dataset as exchanged with fetchers and stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDraft {
    pub dataset_code: String,
    #[serde(default)]
    pub name: String,
    /// Dimension name to its ordered code list.
    #[serde(default)]
    pub dimension_list: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub doc_href: Option<String>,
    /// Attribute name to its ordered code list.
    #[serde(default)]
    pub attribute_list: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub last_update: Option<ReleaseDate>,
    #[serde(default)]
    pub version_date: Option<ReleaseDate>,
}

/// A validated dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DatasetDraft", into = "DatasetDraft")]
pub struct Dataset(DatasetDraft);

impl TryFrom<DatasetDraft> for Dataset {
    type Error = VintageError;

    fn try_from(draft: DatasetDraft) -> Result<Self, Self::Error> {
        require_text("datasetCode", &draft.dataset_code)?;
        check_length("name", &draft.name)?;
        if let Some(href) = &draft.doc_href {
            check_length("docHref", href)?;
        }
        for (label, list) in [
            ("dimensionList", &draft.dimension_list),
            ("attributeList", &draft.attribute_list),
        ] {
            for (name, codes) in list {
                require_text(label, name)?;
                for code in codes {
                    check_length(label, code)?;
                }
            }
        }
        Ok(Self(draft))
    }
}

impl From<Dataset> for DatasetDraft {
    fn from(dataset: Dataset) -> Self {
        dataset.0
    }
}

impl Record for Dataset {
    const SCHEMA: Schema = DATASET_SCHEMA;

    fn natural_key(&self) -> &str {
        &self.0.dataset_code
    }
}

impl Dataset {
    /// Create a dataset with only its code set.
    pub fn new(dataset_code: impl Into<String>) -> Result<Self, VintageError> {
        Self::try_from(DatasetDraft {
            dataset_code: dataset_code.into(),
            ..DatasetDraft::default()
        })
    }

    #[must_use]
    pub fn dataset_code(&self) -> &str {
        &self.0.dataset_code
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[must_use]
    pub fn dimension_list(&self) -> &BTreeMap<String, Vec<String>> {
        &self.0.dimension_list
    }

    #[must_use]
    pub fn doc_href(&self) -> Option<&str> {
        self.0.doc_href.as_deref()
    }

    #[must_use]
    pub fn attribute_list(&self) -> &BTreeMap<String, Vec<String>> {
        &self.0.attribute_list
    }

    #[must_use]
    pub const fn last_update(&self) -> Option<ReleaseDate> {
        self.0.last_update
    }

    #[must_use]
    pub const fn version_date(&self) -> Option<ReleaseDate> {
        self.0.version_date
    }

    /// Replace the version stamp, keeping everything else.
    #[must_use]
    pub fn with_version_date(mut self, version_date: ReleaseDate) -> Self {
        self.0.version_date = Some(version_date);
        self
    }

    /// Return a copy with `edit` applied to the underlying draft, revalidated.
    pub fn edited(&self, edit: impl FnOnce(&mut DatasetDraft)) -> Result<Self, VintageError> {
        let mut draft = self.0.clone();
        edit(&mut draft);
        Self::try_from(draft)
    }
}
