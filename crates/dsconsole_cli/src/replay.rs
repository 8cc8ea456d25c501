//! Scripted typeahead sessions
//!
//! A script is JSON with the component props and a list of user actions:
//!
//! ```json
//! {
//!   "props": { "multi": true, "options": ["member", "uniqueMember"] },
//!   "steps": [
//!     { "action": "type", "text": "uni" },
//!     { "action": "key", "key": "Enter" },
//!     { "action": "wait", "ms": 10 }
//!   ]
//! }
//! ```
//!
//! Each step is applied to a live select driven by a virtual clock, and the
//! callbacks it fired are reported along with the rendered view.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dsconsole_cn::{
    typeahead_select, CreateValidation, SelectEvent, SelectOption, SelectTuning, SelectView,
    SelectedInput, TypeaheadSelect, Validated,
};
use dsconsole_core::{Key, TimerScheduler};

use crate::kind::ValueKind;

#[derive(Debug, Default, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub props: Props,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Initial component props; unset tuning falls back to the configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Props {
    pub id: Option<String>,
    pub selected: Option<SelectedInput>,
    pub options: Vec<SelectOption>,
    pub multi: bool,
    pub creatable: bool,
    /// Only offer created values of this kind
    pub validate_create: Option<ValueKind>,
    pub has_checkbox: bool,
    pub placeholder: Option<String>,
    pub no_results_text: Option<String>,
    pub aria_label: Option<String>,
    pub disabled: bool,
    pub validated: Validated,
    pub is_open: Option<bool>,
    /// Route the clear button to the script instead of resetting
    pub custom_clear: bool,
    pub guard_window_ms: Option<u64>,
    pub open_on_click: Option<bool>,
    pub max_options_for_click_open: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    ClickInput,
    /// Replace the input text
    Type { text: String },
    /// A DOM key name such as `ArrowDown` or `Enter`
    Key { key: Key },
    ClickClear,
    /// Click the visible row holding this option value
    ClickOption { value: String },
    /// Click the create row
    ClickCreate,
    CloseChip { value: String },
    /// Advance the virtual clock
    Wait { ms: u64 },
    SetOpen { open: Option<bool> },
    SetSelected { selected: SelectedInput },
    SetOptions { options: Vec<SelectOption> },
    SetDisabled { disabled: bool },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::ClickInput => write!(f, "click input"),
            Step::Type { text } => write!(f, "type {:?}", text),
            Step::Key { key } => write!(f, "key {:?}", key),
            Step::ClickClear => write!(f, "click clear"),
            Step::ClickOption { value } => write!(f, "click option {:?}", value),
            Step::ClickCreate => write!(f, "click create"),
            Step::CloseChip { value } => write!(f, "close chip {:?}", value),
            Step::Wait { ms } => write!(f, "wait {}ms", ms),
            Step::SetOpen { open } => write!(f, "set open {:?}", open),
            Step::SetSelected { selected } => write!(f, "set selected {:?}", selected),
            Step::SetOptions { options } => write!(f, "set {} options", options.len()),
            Step::SetDisabled { disabled } => write!(f, "set disabled {}", disabled),
        }
    }
}

/// Outcome of one step
#[derive(Debug, Serialize)]
pub struct StepReport {
    pub step: String,
    /// Callbacks fired, in order
    pub callbacks: Vec<String>,
    pub view: SelectView,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}", self.step)?;
        for callback in &self.callbacks {
            writeln!(f, "  -> {}", callback)?;
        }
        write!(f, "{}", self.view)
    }
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Run every step; the first report shows the initial render
    pub fn run(&self, defaults: &SelectTuning) -> Result<Vec<StepReport>> {
        let scheduler = TimerScheduler::new();
        let transcript: Arc<Mutex<Vec<String>>> = Arc::default();
        let select = self.build(defaults, &scheduler, &transcript);

        let mut reports = vec![StepReport {
            step: "initial".to_string(),
            callbacks: Vec::new(),
            view: select.view(),
        }];

        for (index, step) in self.steps.iter().enumerate() {
            tracing::debug!(index, %step, "replay step");
            apply(&select, &scheduler, step)
                .with_context(|| format!("Step {} ({}) failed", index + 1, step))?;
            let callbacks =
                std::mem::take(&mut *transcript.lock().unwrap_or_else(|p| p.into_inner()));
            reports.push(StepReport {
                step: step.to_string(),
                callbacks,
                view: select.view(),
            });
        }

        Ok(reports)
    }

    fn build(
        &self,
        defaults: &SelectTuning,
        scheduler: &TimerScheduler,
        transcript: &Arc<Mutex<Vec<String>>>,
    ) -> TypeaheadSelect {
        let props = &self.props;

        let mut tuning = defaults.clone();
        tuning.scheduler = Some(scheduler.handle());
        if let Some(ms) = props.guard_window_ms {
            tuning.guard_window = Duration::from_millis(ms);
        }
        if let Some(open_on_click) = props.open_on_click {
            tuning.open_on_click = open_on_click;
        }
        if props.max_options_for_click_open.is_some() {
            tuning.max_options_for_click_open = props.max_options_for_click_open;
        }

        let selected = props.selected.clone().unwrap_or_else(|| SelectedInput::from(""));
        let record = |transcript: &Arc<Mutex<Vec<String>>>| {
            let transcript = transcript.clone();
            move |line: String| transcript.lock().unwrap_or_else(|p| p.into_inner()).push(line)
        };

        let on_select = record(transcript);
        let on_create = record(transcript);
        let on_toggle = record(transcript);

        let mut builder = typeahead_select(selected)
            .with_key(props.id.clone().unwrap_or_else(|| "replay".to_string()))
            .tuning(tuning)
            .options(props.options.iter().cloned())
            .multi(props.multi)
            .creatable(props.creatable)
            .has_checkbox(props.has_checkbox)
            .disabled(props.disabled)
            .validated(props.validated)
            .on_select(move |selection| on_select(format!("select {:?}", selection.values())))
            .on_create_option(move |text| on_create(format!("create {:?}", text)))
            .on_toggle(move |open| on_toggle(format!("toggle {}", open)));

        if let Some(kind) = props.validate_create {
            builder = builder.validate_create(move |text: &str| {
                if kind.check(text) {
                    CreateValidation::valid()
                } else {
                    CreateValidation::invalid(kind.message())
                }
            });
        }
        if props.custom_clear {
            let on_clear = record(transcript);
            builder = builder.on_clear(move || on_clear("clear".to_string()));
        }
        if let Some(placeholder) = &props.placeholder {
            builder = builder.placeholder(placeholder.clone());
        }
        if let Some(text) = &props.no_results_text {
            builder = builder.no_results_text(text.clone());
        }
        if let Some(label) = &props.aria_label {
            builder = builder.aria_label(label.clone());
        }
        if let Some(open) = props.is_open {
            builder = builder.is_open(open);
        }

        builder.build()
    }
}

fn apply(select: &TypeaheadSelect, scheduler: &TimerScheduler, step: &Step) -> Result<()> {
    match step {
        Step::ClickInput => {
            select.dispatch(SelectEvent::InputClick);
        }
        Step::Type { text } => {
            select.dispatch(SelectEvent::TextChanged(text.clone()));
        }
        Step::Key { key } => {
            if *key == Key::Unknown {
                anyhow::bail!("Unknown key");
            }
            select.dispatch(SelectEvent::KeyDown(*key));
        }
        Step::ClickClear => {
            select.dispatch(SelectEvent::ClearClick);
        }
        Step::ClickOption { value } => {
            let index = select
                .view()
                .rows
                .iter()
                .position(|row| !row.create && row.value == *value)
                .with_context(|| format!("No visible row for '{}'", value))?;
            select.dispatch(SelectEvent::OptionClick(index));
        }
        Step::ClickCreate => {
            let index = select
                .view()
                .rows
                .iter()
                .position(|row| row.create)
                .context("No create row is offered")?;
            select.dispatch(SelectEvent::OptionClick(index));
        }
        Step::CloseChip { value } => {
            select.dispatch(SelectEvent::ChipClose(value.clone()));
        }
        Step::Wait { ms } => {
            scheduler.advance(Duration::from_millis(*ms));
        }
        Step::SetOpen { open } => select.set_open_prop(*open),
        Step::SetSelected { selected } => select.set_selected(selected.clone()),
        Step::SetOptions { options } => select.set_options(options.iter().cloned()),
        Step::SetDisabled { disabled } => select.set_disabled(*disabled),
    }
    Ok(())
}
