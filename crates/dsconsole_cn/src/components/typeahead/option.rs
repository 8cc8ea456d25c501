//! Select options and their normalization
//!
//! Callers hand options over either as bare strings (the label is the value)
//! or as value/label pairs; both end up as the same [`SelectOption`].

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Value of the synthetic "create new option" candidate.
///
/// Starts with a NUL so it cannot be typed; options carrying it are dropped
/// during normalization.
pub const CREATE_OPTION_VALUE: &str = "\u{0}create-new-option";

/// An option in the typeahead dropdown
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "OptionInput")]
pub struct SelectOption {
    /// The value (stored in the selection when picked)
    pub value: String,
    /// The display label (used for filtering and display)
    pub label: String,
    /// Whether this option can be focused and picked
    pub disabled: bool,
}

impl SelectOption {
    /// Create an option whose label is its value
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
            disabled: false,
        }
    }

    /// Create an option with a distinct label
    pub fn labeled(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            disabled: false,
        }
    }

    /// Mark this option as disabled
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Check if the label contains an already-lowercased needle
    pub fn matches(&self, needle_lower: &str) -> bool {
        needle_lower.is_empty() || self.label.to_lowercase().contains(needle_lower)
    }
}

impl From<&str> for SelectOption {
    fn from(value: &str) -> Self {
        SelectOption::new(value)
    }
}

impl From<String> for SelectOption {
    fn from(value: String) -> Self {
        SelectOption::new(value)
    }
}

impl From<&String> for SelectOption {
    fn from(value: &String) -> Self {
        SelectOption::new(value.as_str())
    }
}

impl<V: Into<String>, L: Into<String>> From<(V, L)> for SelectOption {
    fn from((value, label): (V, L)) -> Self {
        SelectOption::labeled(value, label)
    }
}

/// Wire shape accepted for options: `"x"` or `{"value": "x", "label": "X"}`
#[derive(Deserialize)]
#[serde(untagged)]
enum OptionInput {
    Bare(String),
    Pair {
        value: String,
        #[serde(default)]
        label: Option<String>,
        #[serde(default, alias = "isDisabled")]
        disabled: bool,
    },
}

impl From<OptionInput> for SelectOption {
    fn from(input: OptionInput) -> Self {
        match input {
            OptionInput::Bare(value) => SelectOption::new(value),
            OptionInput::Pair {
                value,
                label,
                disabled,
            } => SelectOption {
                label: label.unwrap_or_else(|| value.clone()),
                value,
                disabled,
            },
        }
    }
}

/// Normalize caller options: unique by value (first wins), sentinel dropped
pub fn normalize_options<I, O>(options: I) -> Vec<SelectOption>
where
    I: IntoIterator<Item = O>,
    O: Into<SelectOption>,
{
    let mut seen = IndexSet::new();
    let mut normalized = Vec::new();

    for option in options.into_iter().map(Into::into) {
        if option.value == CREATE_OPTION_VALUE {
            tracing::warn!("dropping option that uses the reserved create value");
            continue;
        }
        if seen.insert(option.value.clone()) {
            normalized.push(option);
        }
    }
    normalized
}
