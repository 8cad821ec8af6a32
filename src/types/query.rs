use std::collections::BTreeSet;
use std::collections::btree_set;

use serde::{Deserialize, Serialize};

/// An ordered set of string values.
///
/// Every "one value or several values" parameter takes a `ValueSet`; a single
/// value converts into a one-element set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueSet(BTreeSet<String>);

impl ValueSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.0.contains(value)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        self.0.insert(value.into())
    }

    pub fn extend<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.extend(values.into_iter().map(Into::into));
    }

    pub fn iter(&self) -> btree_set::Iter<'_, String> {
        self.0.iter()
    }

    /// True when `tags` carries at least one value of this set (`Any`) or
    /// every value of it (`All`).
    #[must_use]
    pub fn matches_tags(&self, tags: &ValueSet, mode: TagMatch) -> bool {
        match mode {
            TagMatch::Any => self.iter().any(|t| tags.contains(t)),
            TagMatch::All => !self.is_empty() && self.0.is_subset(&tags.0),
        }
    }
}

impl From<&str> for ValueSet {
    fn from(value: &str) -> Self {
        Self(BTreeSet::from([value.to_string()]))
    }
}

impl From<String> for ValueSet {
    fn from(value: String) -> Self {
        Self(BTreeSet::from([value]))
    }
}

impl From<&String> for ValueSet {
    fn from(value: &String) -> Self {
        Self::from(value.as_str())
    }
}

impl<S: Into<String>> From<Vec<S>> for ValueSet {
    fn from(values: Vec<S>) -> Self {
        values.into_iter().collect()
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for ValueSet {
    fn from(values: [S; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ValueSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for ValueSet {
    type Item = String;
    type IntoIter = btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValueSet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// How a tag criterion is matched against a checkpoint's tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMatch {
    /// At least one listed tag. Used for listing.
    Any,
    /// Every listed tag. Used where an action is taken on the selection.
    All,
}

/// Criteria for selecting checkpoints.
///
/// Omitted criteria match everything. A present but empty set matches
/// nothing. Supplied criteria are combined as a conjunction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook_id: Option<ValueSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook_name: Option<ValueSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<ValueSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ValueSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<ValueSet>,
}

impl CheckpointQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn notebook_id(mut self, ids: impl Into<ValueSet>) -> Self {
        self.notebook_id = Some(ids.into());
        self
    }

    #[must_use]
    pub fn notebook_name(mut self, names: impl Into<ValueSet>) -> Self {
        self.notebook_name = Some(names.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tags: impl Into<ValueSet>) -> Self {
        self.tag = Some(tags.into());
        self
    }

    #[must_use]
    pub fn owner(mut self, owners: impl Into<ValueSet>) -> Self {
        self.owner = Some(owners.into());
        self
    }

    #[must_use]
    pub fn checkpoint_id(mut self, ids: impl Into<ValueSet>) -> Self {
        self.checkpoint_id = Some(ids.into());
        self
    }

    /// Whether any criterion needs the owning notebook's record to evaluate.
    #[must_use]
    pub fn needs_notebooks(&self) -> bool {
        self.notebook_name.is_some() || self.owner.is_some()
    }
}
