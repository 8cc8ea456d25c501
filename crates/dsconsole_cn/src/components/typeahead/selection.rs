//! Selected value(s) of a typeahead
//!
//! The caller may pass a single string or a collection regardless of mode;
//! [`Selection::normalize`] folds either shape into the one the mode needs.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// What the caller passes as `selected`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SelectedInput {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for SelectedInput {
    fn from(value: &str) -> Self {
        SelectedInput::One(value.to_string())
    }
}

impl From<String> for SelectedInput {
    fn from(value: String) -> Self {
        SelectedInput::One(value)
    }
}

impl From<Vec<String>> for SelectedInput {
    fn from(values: Vec<String>) -> Self {
        SelectedInput::Many(values)
    }
}

impl From<Vec<&str>> for SelectedInput {
    fn from(values: Vec<&str>) -> Self {
        SelectedInput::Many(values.into_iter().map(String::from).collect())
    }
}

impl From<&[String]> for SelectedInput {
    fn from(values: &[String]) -> Self {
        SelectedInput::Many(values.to_vec())
    }
}

impl From<Selection> for SelectedInput {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::Single(value) => SelectedInput::One(value),
            Selection::Multi(values) => SelectedInput::Many(values.into_iter().collect()),
        }
    }
}

/// Current selection: one value (possibly empty) or an ordered set
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Selection {
    Single(String),
    Multi(IndexSet<String>),
}

impl Selection {
    /// The empty selection for a mode: `""` or `[]`
    pub fn empty(multi: bool) -> Self {
        if multi {
            Selection::Multi(IndexSet::new())
        } else {
            Selection::Single(String::new())
        }
    }

    /// Fold either input shape into the shape `multi` requires
    pub fn normalize(input: impl Into<SelectedInput>, multi: bool) -> Self {
        match (input.into(), multi) {
            (SelectedInput::One(value), false) => Selection::Single(value),
            (SelectedInput::Many(values), false) => {
                Selection::Single(values.into_iter().next().unwrap_or_default())
            }
            (SelectedInput::One(value), true) if value.is_empty() => Selection::empty(true),
            (SelectedInput::One(value), true) => Selection::Multi(IndexSet::from([value])),
            (SelectedInput::Many(values), true) => Selection::Multi(values.into_iter().collect()),
        }
    }

    /// Re-shape for a mode (used when syncing a caller value)
    pub fn into_mode(self, multi: bool) -> Self {
        if self.is_multi() == multi {
            self
        } else {
            Selection::normalize(self, multi)
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, Selection::Multi(_))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Selection::Single(value) => value.is_empty(),
            Selection::Multi(values) => values.is_empty(),
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        match self {
            Selection::Single(current) => !current.is_empty() && current == value,
            Selection::Multi(values) => values.contains(value),
        }
    }

    /// Selected values in order (empty single selection yields none)
    pub fn values(&self) -> Vec<&str> {
        match self {
            Selection::Single(value) if value.is_empty() => Vec::new(),
            Selection::Single(value) => vec![value.as_str()],
            Selection::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// Owned copy of the selected values
    pub fn to_vec(&self) -> Vec<String> {
        self.values().into_iter().map(String::from).collect()
    }

    /// Selection after committing `value`.
    ///
    /// Single mode replaces the value; multi mode removes it when present and
    /// appends it otherwise.
    pub fn toggled(&self, value: &str) -> Self {
        match self {
            Selection::Single(_) => Selection::Single(value.to_string()),
            Selection::Multi(values) => {
                let mut values = values.clone();
                if !values.shift_remove(value) {
                    values.insert(value.to_string());
                }
                Selection::Multi(values)
            }
        }
    }

    /// Selection with `value` added (single replaces, multi appends once)
    pub fn with(&self, value: &str) -> Self {
        match self {
            Selection::Single(_) => Selection::Single(value.to_string()),
            Selection::Multi(values) => {
                let mut values = values.clone();
                values.insert(value.to_string());
                Selection::Multi(values)
            }
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Selection::empty(false)
    }
}
