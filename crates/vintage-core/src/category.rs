//! # Category Records
//!
//! One node of a provider topic tree. Children are referenced by category
//! code; walking and mirroring the tree is left to the crawler that builds
//! these nodes.

use crate::record::{Record, require_text};
use crate::schema::{CATEGORY_SCHEMA, Schema};
use crate::VintageError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unvalidated category node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    pub name: String,
    /// Codes of the child categories, in display order.
    #[serde(default)]
    pub children: Vec<String>,
    pub category_code: String,
    /// Whether this category is selected for mirroring.
    #[serde(default)]
    pub present: bool,
}

/// A validated category node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CategoryDraft", into = "CategoryDraft")]
pub struct Category(CategoryDraft);

impl TryFrom<CategoryDraft> for Category {
    type Error = VintageError;

    fn try_from(draft: CategoryDraft) -> Result<Self, Self::Error> {
        require_text("categoryCode", &draft.category_code)?;
        require_text("name", &draft.name)?;

        let mut seen = BTreeSet::new();
        for child in &draft.children {
            require_text("child categoryCode", child)?;
            if *child == draft.category_code {
                return Err(VintageError::invalid(format!(
                    "category {} lists itself as a child",
                    draft.category_code
                )));
            }
            if !seen.insert(child.as_str()) {
                return Err(VintageError::invalid(format!(
                    "category {} lists child {child} twice",
                    draft.category_code
                )));
            }
        }
        Ok(Self(draft))
    }
}

impl From<Category> for CategoryDraft {
    fn from(category: Category) -> Self {
        category.0
    }
}

impl Record for Category {
    const SCHEMA: Schema = CATEGORY_SCHEMA;

    fn natural_key(&self) -> &str {
        &self.0.category_code
    }
}

impl Category {
    /// Create a leaf category, not selected for mirroring.
    pub fn new(
        category_code: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, VintageError> {
        Self::try_from(CategoryDraft {
            category_code: category_code.into(),
            name: name.into(),
            ..CategoryDraft::default()
        })
    }

    /// Replace the children list.
    pub fn with_children(
        self,
        children: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, VintageError> {
        let mut draft = self.0;
        draft.children = children.into_iter().map(Into::into).collect();
        Self::try_from(draft)
    }

    /// Toggle the mirroring flag without touching the structure.
    #[must_use]
    pub fn with_present(mut self, present: bool) -> Self {
        self.0.present = present;
        self
    }

    #[must_use]
    pub fn category_code(&self) -> &str {
        &self.0.category_code
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[must_use]
    pub fn children(&self) -> &[String] {
        &self.0.children
    }

    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.0.present
    }
}
