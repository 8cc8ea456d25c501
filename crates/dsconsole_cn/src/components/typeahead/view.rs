//! Render-ready snapshot of a typeahead
//!
//! The view carries everything a renderer needs without reaching back into
//! the state machine: row ids for `aria-activedescendant`, chip labels,
//! checkbox affordances and the current validation styling.

use std::fmt;

use dsconsole_core::option_dom_id;
use serde::{Deserialize, Serialize};

use super::machine::{Candidate, SelectConfig, SelectState};

/// Visual validation state of the input
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validated {
    #[default]
    Default,
    Error,
    Warning,
    Success,
}

/// Display-only props that never influence transitions
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Appearance {
    pub placeholder: Option<String>,
    pub aria_label: Option<String>,
    /// Multi-mode rows render a checkbox
    pub has_checkbox: bool,
    pub validated: Validated,
}

/// A removable label for one selected value (multi mode)
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Chip {
    pub value: String,
    pub label: String,
}

/// One dropdown row
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowView {
    pub id: String,
    pub label: String,
    pub value: String,
    pub focused: bool,
    pub selected: bool,
    pub disabled: bool,
    /// `Some(checked)` when the row renders a checkbox
    pub checkbox: Option<bool>,
    pub create: bool,
}

/// Everything needed to draw the component once
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectView {
    pub id: String,
    pub aria_label: Option<String>,
    pub placeholder: Option<String>,
    pub display_value: String,
    pub chips: Vec<Chip>,
    /// Empty while the dropdown is closed
    pub rows: Vec<RowView>,
    pub active_descendant: Option<String>,
    pub show_clear: bool,
    pub validated: Validated,
    pub create_hint: Option<String>,
    pub is_open: bool,
    pub is_disabled: bool,
    pub is_multi: bool,
}

impl SelectView {
    pub fn build(id: &str, state: &SelectState, config: &SelectConfig, appearance: &Appearance) -> Self {
        let selection = state.selection();
        let is_open = state.is_open();

        let chips = if config.multi {
            selection
                .values()
                .into_iter()
                .map(|value| Chip {
                    value: value.to_string(),
                    label: state
                        .options()
                        .iter()
                        .find(|option| option.value == value)
                        .map_or_else(|| value.to_string(), |option| option.label.clone()),
                })
                .collect()
        } else {
            Vec::new()
        };

        let rows: Vec<RowView> = if is_open {
            state
                .candidates()
                .iter()
                .enumerate()
                .map(|(index, candidate)| {
                    let selected = matches!(candidate, Candidate::Option(option) if selection.contains(&option.value));
                    RowView {
                        id: option_dom_id(candidate.value()),
                        label: candidate.label().into_owned(),
                        value: candidate.value().to_string(),
                        focused: state.focus() == Some(index),
                        selected,
                        disabled: candidate.is_disabled(),
                        checkbox: (config.multi
                            && appearance.has_checkbox
                            && matches!(candidate, Candidate::Option(_)))
                        .then_some(selected),
                        create: candidate.is_create(),
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        let active_descendant = rows.iter().find(|row| row.focused).map(|row| row.id.clone());

        Self {
            id: id.to_string(),
            aria_label: appearance.aria_label.clone(),
            placeholder: appearance.placeholder.clone(),
            display_value: state.display_value(config),
            chips,
            rows,
            active_descendant,
            show_clear: !config.disabled && (!selection.is_empty() || !state.text().is_empty()),
            validated: appearance.validated,
            create_hint: state.create_hint(config),
            is_open,
            is_disabled: config.disabled,
            is_multi: config.multi,
        }
    }
}

impl fmt::Display for SelectView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.id)?;
        if self.display_value.is_empty() {
            if let Some(placeholder) = &self.placeholder {
                write!(f, " ({})", placeholder)?;
            }
        } else {
            write!(f, " \"{}\"", self.display_value)?;
        }
        write!(f, " {}", if self.is_open { "open" } else { "closed" })?;
        if self.is_disabled {
            write!(f, " disabled")?;
        }
        if self.validated != Validated::Default {
            write!(f, " {:?}", self.validated)?;
        }
        writeln!(f)?;

        if !self.chips.is_empty() {
            let chips: Vec<String> = self.chips.iter().map(|c| format!("[{} x]", c.label)).collect();
            writeln!(f, "  chips: {}", chips.join(" "))?;
        }

        for row in &self.rows {
            let cursor = if row.focused { ">" } else { " " };
            let mark = match row.checkbox {
                Some(true) => "[x] ",
                Some(false) => "[ ] ",
                None if row.selected => "* ",
                None => "",
            };
            let disabled = if row.disabled { " (disabled)" } else { "" };
            writeln!(f, "  {} {}{}{}", cursor, mark, row.label, disabled)?;
        }

        if let Some(hint) = &self.create_hint {
            writeln!(f, "  hint: {}", hint)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::typeahead::machine::SelectEvent;
    use crate::components::typeahead::option::SelectOption;
    use dsconsole_core::Key;

    fn open(state: SelectState, config: &SelectConfig) -> SelectState {
        state.on_event(config, SelectEvent::InputClick).state
    }

    #[test]
    fn test_rows_only_when_open() {
        let config = SelectConfig::default();
        let state = SelectState::new(&config, ["a", "b"], "", None);
        let view = SelectView::build("t", &state, &config, &Appearance::default());
        assert!(view.rows.is_empty());
        assert!(!view.show_clear);

        let view = SelectView::build("t", &open(state, &config), &config, &Appearance::default());
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].id, "select-typeahead-a");
    }

    #[test]
    fn test_active_descendant_follows_focus() {
        let config = SelectConfig::default();
        let state = SelectState::new(&config, ["cn=Directory Manager", "uid=admin"], "", None);
        let state = open(state, &config);
        let state = state.on_event(&config, SelectEvent::KeyDown(Key::ArrowDown)).state;

        let view = SelectView::build("t", &state, &config, &Appearance::default());
        assert_eq!(
            view.active_descendant.as_deref(),
            Some("select-typeahead-cn-Directory-Manager")
        );
        assert!(view.rows[0].focused);
    }

    #[test]
    fn test_multi_chips_and_checkboxes() {
        let config = SelectConfig {
            multi: true,
            ..SelectConfig::default()
        };
        let options = vec![
            SelectOption::labeled("member", "Member"),
            SelectOption::new("uniqueMember"),
        ];
        let state = SelectState::new(&config, options, vec!["member", "custom"], None);
        let appearance = Appearance {
            has_checkbox: true,
            ..Appearance::default()
        };
        let view = SelectView::build("t", &open(state, &config), &config, &appearance);

        let chips: Vec<_> = view.chips.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(chips, vec!["Member", "custom"]);

        let checks: Vec<_> = view.rows.iter().map(|r| r.checkbox).collect();
        assert_eq!(checks, vec![Some(true), Some(false), Some(true)]);
        assert!(view.show_clear);
    }

    #[test]
    fn test_display_renders_rows() {
        let config = SelectConfig::default();
        let state = SelectState::new(&config, ["member", "uniqueMember"], "", None);
        let state = open(state, &config);
        let state = state.on_event(&config, SelectEvent::KeyDown(Key::ArrowDown)).state;
        let appearance = Appearance {
            placeholder: Some("Type an attribute".into()),
            ..Appearance::default()
        };

        let text = SelectView::build("attr", &state, &config, &appearance).to_string();
        assert_eq!(
            text,
            "[attr] (Type an attribute) open\n  > member\n    uniqueMember\n"
        );
    }
}
