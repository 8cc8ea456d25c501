//! Selection & filter state machine
//!
//! [`SelectState::on_event`] is a pure reducer: it never calls back into the
//! caller and never touches a clock. Everything the outside world has to do
//! (notify the caller, forward an open/close intent, start the post-commit
//! guard timer) comes back as [`SelectOutput`]s for the host to run.
//!
//! ```text
//!            click / type / arrow / enter
//!   Closed ─────────────────────────────────▶ Open(filtered[, focus])
//!     ▲                                            │
//!     └──── escape / tab / single commit / click ──┘
//! ```
//!
//! After a commit the state enters [`Phase::Debounced`] for the guard window;
//! the candidate list is frozen until [`SelectEvent::GuardElapsed`] arrives.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dsconsole_core::Key;
use smallvec::SmallVec;

use super::option::{normalize_options, SelectOption, CREATE_OPTION_VALUE};
use super::selection::{SelectedInput, Selection};

/// Guard window used when the caller does not configure one
pub const DEFAULT_GUARD_WINDOW: Duration = Duration::from_millis(10);

/// Result of validating text for inline creation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateValidation {
    pub is_valid: bool,
    pub message: Option<String>,
}

impl CreateValidation {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }
}

impl From<bool> for CreateValidation {
    fn from(is_valid: bool) -> Self {
        Self {
            is_valid,
            message: None,
        }
    }
}

/// Validator invoked with the trimmed input text
pub type CreateValidator = Arc<dyn Fn(&str) -> CreateValidation + Send + Sync>;

/// Behavioural configuration the reducer reads on every event
#[derive(Clone)]
pub struct SelectConfig {
    /// Multi-select with chips and toggling commits
    pub multi: bool,
    /// Offer a synthetic "create" candidate for unknown text
    pub creatable: bool,
    pub validate_create: Option<CreateValidator>,
    /// All user events become no-ops
    pub disabled: bool,
    pub open_on_click: bool,
    /// Empty-input clicks open only when the option count is at most this
    pub max_options_for_click_open: Option<usize>,
    /// Post-commit window during which candidates are not recomputed
    pub guard_window: Duration,
    pub no_results_text: Option<String>,
    /// The caller handles the clear button itself
    pub custom_clear: bool,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            multi: false,
            creatable: false,
            validate_create: None,
            disabled: false,
            open_on_click: true,
            max_options_for_click_open: None,
            guard_window: DEFAULT_GUARD_WINDOW,
            no_results_text: None,
            custom_clear: false,
        }
    }
}

impl fmt::Debug for SelectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectConfig")
            .field("multi", &self.multi)
            .field("creatable", &self.creatable)
            .field("validate_create", &self.validate_create.is_some())
            .field("disabled", &self.disabled)
            .field("open_on_click", &self.open_on_click)
            .field("max_options_for_click_open", &self.max_options_for_click_open)
            .field("guard_window", &self.guard_window)
            .field("no_results_text", &self.no_results_text)
            .field("custom_clear", &self.custom_clear)
            .finish()
    }
}

impl SelectConfig {
    /// Validate creation text; empty or whitespace-only text never passes
    pub fn validate(&self, text: &str) -> CreateValidation {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return CreateValidation::from(false);
        }
        match &self.validate_create {
            Some(validator) => validator(trimmed),
            None => CreateValidation::valid(),
        }
    }

    fn no_results_label(&self, text: &str) -> String {
        self.no_results_text
            .clone()
            .unwrap_or_else(|| format!("No results found for \"{}\"", text))
    }
}

/// An entry in the dropdown
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Candidate {
    Option(SelectOption),
    /// Synthetic entry that creates `text` when committed
    Create { text: String },
    /// Placeholder row shown when a filter matches nothing
    NoResults { label: String },
}

impl Candidate {
    pub fn value(&self) -> &str {
        match self {
            Candidate::Option(option) => &option.value,
            Candidate::Create { .. } => CREATE_OPTION_VALUE,
            Candidate::NoResults { .. } => "",
        }
    }

    pub fn label(&self) -> Cow<'_, str> {
        match self {
            Candidate::Option(option) => Cow::Borrowed(option.label.as_str()),
            Candidate::Create { text } => Cow::Owned(format!("Create \"{}\"", text)),
            Candidate::NoResults { label } => Cow::Borrowed(label.as_str()),
        }
    }

    pub fn is_disabled(&self) -> bool {
        match self {
            Candidate::Option(option) => option.disabled,
            Candidate::Create { .. } => false,
            Candidate::NoResults { .. } => true,
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, Candidate::Create { .. })
    }
}

/// Whether the candidate list follows the state or is held after a commit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    Live,
    Debounced,
}

/// Input to the reducer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectEvent {
    InputClick,
    TextChanged(String),
    KeyDown(Key),
    ClearClick,
    /// Click on the candidate row at this index
    OptionClick(usize),
    /// Close button on a multi-select chip
    ChipClose(String),
    OptionsChanged(Vec<SelectOption>),
    SelectedChanged(Selection),
    OpenPropChanged(Option<bool>),
    GuardElapsed,
}

/// Effect the host must carry out
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectOutput {
    /// A commit changed the selection
    Select(Selection),
    /// The clear button was pressed and the caller handles it
    Clear,
    /// Created text, emitted before the matching `Select`
    CreateOption(String),
    /// Requested open state differs from the effective one
    Toggle(bool),
    /// Deliver `GuardElapsed` after this long
    ArmGuard(Duration),
}

pub type Outputs = SmallVec<[SelectOutput; 4]>;

/// Next state plus the effects of one event
#[derive(Clone, Debug)]
pub struct Transition {
    pub state: SelectState,
    pub outputs: Outputs,
}

/// Immutable snapshot of a typeahead's transient state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectState {
    options: Vec<SelectOption>,
    selection: Selection,
    text: String,
    local_open: bool,
    open_prop: Option<bool>,
    focus: Option<usize>,
    candidates: Vec<Candidate>,
    phase: Phase,
}

impl SelectState {
    pub fn new<O>(
        config: &SelectConfig,
        options: impl IntoIterator<Item = O>,
        selected: impl Into<SelectedInput>,
        open_prop: Option<bool>,
    ) -> Self
    where
        O: Into<SelectOption>,
    {
        let mut state = Self {
            options: normalize_options(options),
            selection: Selection::normalize(selected, config.multi),
            text: String::new(),
            local_open: false,
            open_prop,
            focus: None,
            candidates: Vec::new(),
            phase: Phase::Live,
        };
        state.refresh(config, false);
        state
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Raw input text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Effective open state (the caller's value wins when controlled)
    pub fn is_open(&self) -> bool {
        self.open_prop.unwrap_or(self.local_open)
    }

    pub fn is_controlled(&self) -> bool {
        self.open_prop.is_some()
    }

    pub fn focus(&self) -> Option<usize> {
        self.focus
    }

    pub fn focused_candidate(&self) -> Option<&Candidate> {
        self.focus.and_then(|index| self.candidates.get(index))
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Text shown in the input box
    pub fn display_value(&self, config: &SelectConfig) -> String {
        match &self.selection {
            Selection::Single(value) if !config.multi && !value.is_empty() && self.text.is_empty() => {
                self.options
                    .iter()
                    .find(|option| &option.value == value)
                    .map(|option| option.label.clone())
                    .unwrap_or_else(|| value.clone())
            }
            _ => self.text.clone(),
        }
    }

    /// Text the create candidate would commit, if one is offered right now
    pub fn create_text(&self, config: &SelectConfig) -> Option<&str> {
        if !config.creatable {
            return None;
        }
        let trimmed = self.text.trim();
        if trimmed.is_empty()
            || self.options.iter().any(|option| option.value == trimmed)
            || self.selection.contains(trimmed)
            || self.selection.contains(&self.text)
        {
            return None;
        }
        config.validate(&self.text).is_valid.then_some(self.text.as_str())
    }

    /// Validator message for the current text, when creation is rejected
    pub fn create_hint(&self, config: &SelectConfig) -> Option<String> {
        if !config.creatable || self.text.trim().is_empty() {
            return None;
        }
        let validation = config.validate(&self.text);
        if validation.is_valid {
            None
        } else {
            validation.message
        }
    }

    /// Apply one event
    pub fn on_event(&self, config: &SelectConfig, event: SelectEvent) -> Transition {
        let mut state = self.clone();
        let mut outputs = Outputs::new();
        state.apply(config, event, &mut outputs);
        Transition { state, outputs }
    }

    fn apply(&mut self, config: &SelectConfig, event: SelectEvent, outputs: &mut Outputs) {
        let user_event = !matches!(
            event,
            SelectEvent::OptionsChanged(_)
                | SelectEvent::SelectedChanged(_)
                | SelectEvent::OpenPropChanged(_)
                | SelectEvent::GuardElapsed
        );
        if config.disabled && user_event {
            return;
        }

        match event {
            SelectEvent::InputClick => self.input_click(config, outputs),
            SelectEvent::TextChanged(text) => {
                self.text = text;
                self.phase = Phase::Live;
                self.refresh(config, false);
                if !self.text.is_empty() && !self.is_open() {
                    self.request_open(true, outputs);
                }
            }
            SelectEvent::KeyDown(key) => self.key_down(config, key, outputs),
            SelectEvent::ClearClick => {
                if config.custom_clear {
                    outputs.push(SelectOutput::Clear);
                } else {
                    self.selection = Selection::empty(config.multi);
                    outputs.push(SelectOutput::Select(self.selection.clone()));
                }
                self.text.clear();
                self.phase = Phase::Live;
                self.refresh(config, false);
            }
            SelectEvent::OptionClick(index) => {
                if let Some(candidate) = self.candidates.get(index).cloned() {
                    self.commit(config, candidate, outputs);
                }
            }
            SelectEvent::ChipClose(value) => {
                if config.multi && self.selection.contains(&value) {
                    self.commit(config, Candidate::Option(SelectOption::new(value)), outputs);
                }
            }
            SelectEvent::OptionsChanged(options) => {
                self.options = normalize_options(options);
                self.refresh(config, true);
            }
            SelectEvent::SelectedChanged(selection) => {
                self.selection = selection.into_mode(config.multi);
                self.refresh(config, true);
            }
            SelectEvent::OpenPropChanged(open_prop) => {
                self.open_prop = open_prop;
                if !self.is_open() {
                    self.focus = None;
                }
            }
            SelectEvent::GuardElapsed => {
                if self.phase == Phase::Debounced {
                    self.phase = Phase::Live;
                    self.refresh(config, true);
                }
            }
        }
    }

    fn input_click(&mut self, config: &SelectConfig, outputs: &mut Outputs) {
        if self.is_open() {
            if self.text.is_empty() {
                self.request_open(false, outputs);
            }
            return;
        }

        let within_threshold = config
            .max_options_for_click_open
            .map_or(true, |max| self.options.len() <= max);
        if config.open_on_click && (!self.text.is_empty() || within_threshold) {
            self.request_open(true, outputs);
        }
    }

    fn key_down(&mut self, config: &SelectConfig, key: Key, outputs: &mut Outputs) {
        match key {
            key if key.is_vertical_arrow() => {
                if self.is_open() {
                    self.move_focus(key == Key::ArrowDown);
                } else {
                    self.request_open(true, outputs);
                }
            }
            Key::Enter => {
                if !self.is_open() {
                    self.request_open(true, outputs);
                    return;
                }
                match self.focused_candidate().filter(|c| !c.is_disabled()).cloned() {
                    Some(candidate) => self.commit(config, candidate, outputs),
                    None => {
                        if let Some(text) = self.create_text(config) {
                            let candidate = Candidate::Create {
                                text: text.to_string(),
                            };
                            self.commit(config, candidate, outputs);
                        }
                    }
                }
            }
            Key::Escape => {
                self.request_open(false, outputs);
                self.text.clear();
                self.phase = Phase::Live;
                self.refresh(config, false);
            }
            Key::Tab => self.request_open(false, outputs),
            _ => {}
        }
    }

    /// Move focus to the next/previous enabled candidate, wrapping around
    fn move_focus(&mut self, forward: bool) {
        let enabled: Vec<usize> = self
            .candidates
            .iter()
            .enumerate()
            .filter(|(_, candidate)| !candidate.is_disabled())
            .map(|(index, _)| index)
            .collect();
        let (Some(&first), Some(&last)) = (enabled.first(), enabled.last()) else {
            return;
        };

        self.focus = Some(match (self.focus, forward) {
            (None, true) => first,
            (None, false) => last,
            (Some(current), true) => enabled
                .iter()
                .copied()
                .find(|&index| index > current)
                .unwrap_or(first),
            (Some(current), false) => enabled
                .iter()
                .rev()
                .copied()
                .find(|&index| index < current)
                .unwrap_or(last),
        });
    }

    fn commit(&mut self, config: &SelectConfig, candidate: Candidate, outputs: &mut Outputs) {
        let next = match candidate {
            Candidate::Option(option) if !option.disabled => self.selection.toggled(&option.value),
            Candidate::Create { text } => {
                if self.selection.contains(&text)
                    || self.selection.contains(text.trim())
                    || !config.validate(&text).is_valid
                {
                    return;
                }
                let next = self.selection.with(&text);
                outputs.push(SelectOutput::CreateOption(text));
                next
            }
            _ => return,
        };

        tracing::debug!(selection = ?next.values(), "typeahead commit");
        self.selection = next;
        outputs.push(SelectOutput::Select(self.selection.clone()));
        self.text.clear();
        if !config.multi {
            self.request_open(false, outputs);
        }

        if config.guard_window.is_zero() {
            self.phase = Phase::Live;
            self.refresh(config, true);
        } else {
            self.phase = Phase::Debounced;
            self.drop_create_rows();
            outputs.push(SelectOutput::ArmGuard(config.guard_window));
        }
    }

    /// The held list must not offer a create entry for text already committed
    fn drop_create_rows(&mut self) {
        let focused_value = self
            .focused_candidate()
            .filter(|candidate| !candidate.is_create())
            .map(|candidate| candidate.value().to_string());
        self.candidates.retain(|candidate| !candidate.is_create());
        self.focus = focused_value.and_then(|value| {
            self.candidates
                .iter()
                .position(|candidate| candidate.value() == value)
        });
    }

    /// Change the local flag, or forward the intent when controlled
    fn request_open(&mut self, open: bool, outputs: &mut Outputs) {
        if !open {
            self.focus = None;
        }
        if self.is_open() == open {
            return;
        }
        if self.open_prop.is_none() {
            self.local_open = open;
        }
        outputs.push(SelectOutput::Toggle(open));
    }

    /// Recompute candidates unless held by the guard window
    fn refresh(&mut self, config: &SelectConfig, keep_focus: bool) {
        if self.phase == Phase::Debounced {
            return;
        }

        let focused_value = keep_focus
            .then(|| self.focused_candidate().map(|c| c.value().to_string()))
            .flatten();

        let mut pool = self.options.clone();
        if config.multi {
            for value in self.selection.values() {
                if !pool.iter().any(|option| option.value == value) {
                    pool.push(SelectOption::new(value));
                }
            }
        }

        let needle = self.text.to_lowercase();
        let mut candidates: Vec<Candidate> = pool
            .into_iter()
            .filter(|option| option.matches(&needle))
            .map(Candidate::Option)
            .collect();

        if let Some(text) = self.create_text(config) {
            candidates.push(Candidate::Create {
                text: text.to_string(),
            });
        } else if candidates.is_empty() && !self.text.is_empty() {
            candidates.push(Candidate::NoResults {
                label: config.no_results_label(&self.text),
            });
        }

        self.focus = focused_value.and_then(|value| {
            candidates
                .iter()
                .position(|candidate| candidate.value() == value && !candidate.is_disabled())
        });
        self.candidates = candidates;
    }
}
