//! Stable instance keys and DOM id derivation.
//!
//! Every component instance gets a key that stays the same for its whole
//! lifetime, so two selects on one screen never share ids. Option rows derive
//! their ids from the option value instead, which keeps `aria-activedescendant`
//! deterministic across renders.
//!
//! # Example
//!
//! ```
//! use dsconsole_core::key::{option_dom_id, InstanceKey};
//!
//! let key = InstanceKey::explicit("group-attr");
//! assert_eq!(key.derive("listbox"), "group-attr-listbox");
//! assert_eq!(option_dom_id("cn=Directory Manager"), "select-typeahead-cn-Directory-Manager");
//! ```

use std::cell::OnceCell;
use std::sync::OnceLock;

use regex::Regex;
use uuid::Uuid;

/// Prefix shared by every option row id
pub const OPTION_ID_PREFIX: &str = "select-typeahead";

/// Stable unique key for one component instance.
///
/// Key format: `{prefix}-{uuid}`. The uuid is generated lazily on first access
/// and cached, so the key is stable for the instance's lifetime.
pub struct InstanceKey {
    key: OnceCell<String>,
    prefix: &'static str,
    line: u32,
}

impl InstanceKey {
    /// Create a key for the calling component, generating the uuid on first use.
    #[track_caller]
    pub fn new(prefix: &'static str) -> Self {
        Self {
            key: OnceCell::new(),
            prefix,
            line: std::panic::Location::caller().line(),
        }
    }

    /// Create with an explicit key (deterministic ids for tests and fixed forms).
    pub fn explicit(key: impl Into<String>) -> Self {
        let instance = Self {
            key: OnceCell::new(),
            prefix: "",
            line: 0,
        };
        let _ = instance.key.set(sanitize_dom_id(&key.into()));
        instance
    }

    /// Get or generate the key.
    pub fn get(&self) -> &str {
        self.key
            .get_or_init(|| format!("{}-{}", self.prefix, Uuid::new_v4().as_simple()))
    }

    /// Derive a sub-element id, e.g. the listbox or the clear button.
    pub fn derive(&self, suffix: &str) -> String {
        format!("{}-{}", self.get(), suffix)
    }

    /// Source line of the creating call site (0 for explicit keys).
    pub fn line(&self) -> u32 {
        self.line
    }
}

impl std::fmt::Debug for InstanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InstanceKey({})", self.get())
    }
}

impl Clone for InstanceKey {
    fn clone(&self) -> Self {
        Self::explicit(self.get())
    }
}

fn non_alphanumeric_runs() -> &'static Regex {
    static RUNS: OnceLock<Regex> = OnceLock::new();
    RUNS.get_or_init(|| Regex::new("[^A-Za-z0-9]+").expect("static regex is valid"))
}

/// Replace every run of non-alphanumeric characters with a single hyphen.
pub fn sanitize_dom_id(raw: &str) -> String {
    non_alphanumeric_runs().replace_all(raw, "-").into_owned()
}

/// DOM id of the option row carrying `value`.
///
/// Values differing only in punctuation or whitespace map to the same id
/// (`a b` and `a.b` both give `select-typeahead-a-b`), so a list holding
/// both has duplicate row ids.
pub fn option_dom_id(value: &str) -> String {
    format!("{}-{}", OPTION_ID_PREFIX, sanitize_dom_id(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_keys_per_instance() {
        let keys: Vec<String> = (0..5)
            .map(|_| InstanceKey::new("typeahead").get().to_string())
            .collect();
        let unique: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), 5);
        assert!(keys.iter().all(|k| k.starts_with("typeahead-")));
    }

    #[test]
    fn test_key_records_call_line() {
        let line = line!() + 1;
        let key = InstanceKey::new("typeahead");
        assert_eq!(key.line(), line);
    }

    #[test]
    fn test_option_ids_collide_on_punctuation() {
        assert_eq!(option_dom_id("a b"), option_dom_id("a.b"));
    }

    #[test]
    fn test_key_is_stable() {
        let key = InstanceKey::new("typeahead");
        let first = key.get().to_string();
        assert_eq!(key.get(), first);
        assert_eq!(key.clone().get(), first);
    }

    #[test]
    fn test_explicit_key_is_sanitized() {
        let key = InstanceKey::explicit("scope exclude");
        assert_eq!(key.get(), "scope-exclude");
        assert_eq!(key.line(), 0);
    }

    #[test]
    fn test_sanitize_collapses_runs() {
        assert_eq!(sanitize_dom_id("cn=config, o=root"), "cn-config-o-root");
        assert_eq!(sanitize_dom_id("uniqueMember"), "uniqueMember");
        assert_eq!(sanitize_dom_id("a..b__c"), "a-b-c");
    }

    #[test]
    fn test_option_dom_id() {
        assert_eq!(option_dom_id("member"), "select-typeahead-member");
        assert_eq!(
            option_dom_id("ou=people,dc=example,dc=com"),
            "select-typeahead-ou-people-dc-example-dc-com"
        );
    }
}
