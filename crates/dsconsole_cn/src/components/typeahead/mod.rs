//! TypeaheadSelect component - filterable single/multi select
//!
//! A combo-box input that filters its options by substring as the user
//! types, supports keyboard navigation, multi-select chips and creating new
//! values inline. The behaviour lives in the pure reducer in [`machine`];
//! [`TypeaheadSelect`] runs it, invokes the caller's callbacks and owns the
//! post-commit guard timer.
//!
//! # Example
//!
//! ```
//! use dsconsole_cn::prelude::*;
//! use std::time::Duration;
//!
//! let scheduler = TimerScheduler::new();
//!
//! let scope = cn::typeahead_select(vec!["dc=example,dc=com"])
//!     .with_key("scope")
//!     .multi(true)
//!     .creatable(true)
//!     .validate_create(|text: &str| dsconsole_core::valid_dn(text))
//!     .placeholder("Type a subtree DN...")
//!     .scheduler(scheduler.handle())
//!     .on_create_option(|dn| println!("created {}", dn))
//!     .build();
//!
//! scope.dispatch(SelectEvent::TextChanged("ou=people,dc=example,dc=com".into()));
//! scope.dispatch(SelectEvent::KeyDown(Key::Enter));
//! assert_eq!(scope.selection().values().len(), 2);
//!
//! // Candidates are recomputed once the guard window lapses
//! scheduler.advance(Duration::from_millis(10));
//! ```

pub mod machine;
pub mod option;
pub mod selection;
pub mod view;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use dsconsole_core::{InstanceKey, TimerHandle, TimerId};

pub use machine::{
    Candidate, CreateValidation, CreateValidator, Outputs, Phase, SelectConfig, SelectEvent,
    SelectOutput, SelectState, Transition, DEFAULT_GUARD_WINDOW,
};
pub use option::{normalize_options, SelectOption, CREATE_OPTION_VALUE};
pub use selection::{SelectedInput, Selection};
pub use view::{Appearance, Chip, RowView, SelectView, Validated};

type SelectCallback = Arc<dyn Fn(&Selection) + Send + Sync>;
type ClearCallback = Arc<dyn Fn() + Send + Sync>;
type CreateCallback = Arc<dyn Fn(&str) + Send + Sync>;
type ToggleCallback = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Clone, Default)]
struct Callbacks {
    on_select: Option<SelectCallback>,
    on_clear: Option<ClearCallback>,
    on_create_option: Option<CreateCallback>,
    on_toggle: Option<ToggleCallback>,
}

/// Timing and click-open knobs, usually loaded from configuration
#[derive(Clone, Debug)]
pub struct SelectTuning {
    pub guard_window: Duration,
    pub open_on_click: bool,
    pub max_options_for_click_open: Option<usize>,
    /// Without a scheduler the guard window collapses to an immediate refresh
    pub scheduler: Option<TimerHandle>,
}

impl Default for SelectTuning {
    fn default() -> Self {
        Self {
            guard_window: DEFAULT_GUARD_WINDOW,
            open_on_click: true,
            max_options_for_click_open: None,
            scheduler: None,
        }
    }
}

struct Inner {
    state: SelectState,
    config: SelectConfig,
    guard: Option<TimerId>,
    disposed: bool,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Deliver `GuardElapsed` unless the instance was disposed meanwhile
fn guard_elapsed(inner: &Mutex<Inner>) {
    let mut inner = lock(inner);
    if inner.disposed {
        return;
    }
    inner.guard = None;
    let next = inner.state.on_event(&inner.config, SelectEvent::GuardElapsed).state;
    inner.state = next;
}

/// A live typeahead instance
pub struct TypeaheadSelect {
    key: InstanceKey,
    inner: Arc<Mutex<Inner>>,
    callbacks: Callbacks,
    appearance: Appearance,
    scheduler: Option<TimerHandle>,
}

impl TypeaheadSelect {
    /// Stable id, also used as the DOM id of the input
    pub fn id(&self) -> &str {
        self.key.get()
    }

    /// Feed one event through the reducer and run its outputs.
    ///
    /// Callbacks run after the internal lock is released, so they may call
    /// back into this instance.
    pub fn dispatch(&self, event: SelectEvent) -> Outputs {
        let outputs = {
            let mut inner = lock(&self.inner);
            if inner.disposed {
                return Outputs::new();
            }
            let Transition { state, outputs } = inner.state.on_event(&inner.config, event);
            inner.state = state;
            outputs
        };

        for output in &outputs {
            self.run_output(output);
        }
        outputs
    }

    fn run_output(&self, output: &SelectOutput) {
        match output {
            SelectOutput::Select(selection) => match &self.callbacks.on_select {
                Some(on_select) => on_select(selection),
                None => tracing::warn!(id = self.id(), "typeahead commit without on_select"),
            },
            SelectOutput::Clear => {
                if let Some(on_clear) = &self.callbacks.on_clear {
                    on_clear();
                }
            }
            SelectOutput::CreateOption(text) => {
                if let Some(on_create) = &self.callbacks.on_create_option {
                    on_create(text);
                }
            }
            SelectOutput::Toggle(open) => {
                if let Some(on_toggle) = &self.callbacks.on_toggle {
                    on_toggle(*open);
                }
            }
            SelectOutput::ArmGuard(window) => self.arm_guard(*window),
        }
    }

    fn arm_guard(&self, window: Duration) {
        let id = self.scheduler.as_ref().and_then(|scheduler| {
            let weak = Arc::downgrade(&self.inner);
            scheduler.schedule(window, move || {
                if let Some(inner) = weak.upgrade() {
                    guard_elapsed(&inner);
                }
            })
        });

        let previous = {
            let mut inner = lock(&self.inner);
            std::mem::replace(&mut inner.guard, id)
        };
        if let (Some(scheduler), Some(previous)) = (&self.scheduler, previous) {
            scheduler.cancel(previous);
        }

        if id.is_none() {
            guard_elapsed(&self.inner);
        }
    }

    /// Snapshot for rendering
    pub fn view(&self) -> SelectView {
        let inner = lock(&self.inner);
        SelectView::build(self.id(), &inner.state, &inner.config, &self.appearance)
    }

    pub fn state(&self) -> SelectState {
        lock(&self.inner).state.clone()
    }

    pub fn selection(&self) -> Selection {
        lock(&self.inner).state.selection().clone()
    }

    pub fn is_open(&self) -> bool {
        lock(&self.inner).state.is_open()
    }

    /// Check whether a guard timer is still pending
    pub fn is_debounced(&self) -> bool {
        lock(&self.inner).state.phase() == Phase::Debounced
    }

    /// Replace the caller-supplied options
    pub fn set_options<O>(&self, options: impl IntoIterator<Item = O>)
    where
        O: Into<SelectOption>,
    {
        let options = options.into_iter().map(Into::into).collect();
        self.dispatch(SelectEvent::OptionsChanged(options));
    }

    /// Sync the caller's `selected` value
    pub fn set_selected(&self, selected: impl Into<SelectedInput>) {
        let multi = lock(&self.inner).config.multi;
        self.dispatch(SelectEvent::SelectedChanged(Selection::normalize(selected, multi)));
    }

    /// Sync the caller's `is_open` value (`None` hands control back)
    pub fn set_open_prop(&self, open: Option<bool>) {
        self.dispatch(SelectEvent::OpenPropChanged(open));
    }

    pub fn set_disabled(&self, disabled: bool) {
        lock(&self.inner).config.disabled = disabled;
    }

    pub fn set_validated(&mut self, validated: Validated) {
        self.appearance.validated = validated;
    }

    /// Cancel the pending guard timer and ignore every later event
    pub fn dispose(&self) {
        let guard = {
            let mut inner = lock(&self.inner);
            inner.disposed = true;
            inner.guard.take()
        };
        if let (Some(scheduler), Some(id)) = (&self.scheduler, guard) {
            scheduler.cancel(id);
        }
    }
}

impl Drop for TypeaheadSelect {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for TypeaheadSelect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("TypeaheadSelect")
            .field("id", &self.id())
            .field("state", &inner.state)
            .field("config", &inner.config)
            .finish()
    }
}

/// Builder for creating TypeaheadSelect instances with a fluent API
pub struct TypeaheadSelectBuilder {
    key: InstanceKey,
    selected: SelectedInput,
    options: Vec<SelectOption>,
    config: SelectConfig,
    appearance: Appearance,
    open_prop: Option<bool>,
    callbacks: Callbacks,
    scheduler: Option<TimerHandle>,
}

impl TypeaheadSelectBuilder {
    /// Create a builder with the caller's current selection.
    ///
    /// Uses `#[track_caller]` to derive the instance key from the call site.
    #[track_caller]
    pub fn new(selected: impl Into<SelectedInput>) -> Self {
        Self {
            key: InstanceKey::new("typeahead"),
            selected: selected.into(),
            options: Vec::new(),
            config: SelectConfig::default(),
            appearance: Appearance::default(),
            open_prop: None,
            callbacks: Callbacks::default(),
            scheduler: None,
        }
    }

    /// Use an explicit, deterministic instance key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = InstanceKey::explicit(key);
        self
    }

    /// Add multiple options (bare strings, pairs or [`SelectOption`]s)
    pub fn options<O>(mut self, options: impl IntoIterator<Item = O>) -> Self
    where
        O: Into<SelectOption>,
    {
        self.options.extend(options.into_iter().map(Into::into));
        self
    }

    /// Add an option with value and label
    pub fn option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.push(SelectOption::labeled(value, label));
        self
    }

    /// Add a disabled option
    pub fn option_disabled(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.push(SelectOption::labeled(value, label).disabled());
        self
    }

    pub fn multi(mut self, multi: bool) -> Self {
        self.config.multi = multi;
        self
    }

    pub fn creatable(mut self, creatable: bool) -> Self {
        self.config.creatable = creatable;
        self
    }

    /// Validate text before a create entry is offered.
    ///
    /// The validator receives trimmed text and may return a `bool` or a
    /// [`CreateValidation`] with a message.
    pub fn validate_create<F, R>(mut self, validator: F) -> Self
    where
        F: Fn(&str) -> R + Send + Sync + 'static,
        R: Into<CreateValidation>,
    {
        self.config.validate_create = Some(Arc::new(move |text: &str| validator(text).into()));
        self
    }

    pub fn has_checkbox(mut self, has_checkbox: bool) -> Self {
        self.appearance.has_checkbox = has_checkbox;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.appearance.placeholder = Some(placeholder.into());
        self
    }

    pub fn no_results_text(mut self, text: impl Into<String>) -> Self {
        self.config.no_results_text = Some(text.into());
        self
    }

    pub fn aria_label(mut self, label: impl Into<String>) -> Self {
        self.appearance.aria_label = Some(label.into());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.config.disabled = disabled;
        self
    }

    pub fn validated(mut self, validated: Validated) -> Self {
        self.appearance.validated = validated;
        self
    }

    /// Control the open state from outside; pair with [`Self::on_toggle`]
    pub fn is_open(mut self, open: bool) -> Self {
        self.open_prop = Some(open);
        self
    }

    pub fn open_on_click(mut self, open_on_click: bool) -> Self {
        self.config.open_on_click = open_on_click;
        self
    }

    pub fn max_options_for_click_open(mut self, max: usize) -> Self {
        self.config.max_options_for_click_open = Some(max);
        self
    }

    pub fn guard_window(mut self, window: Duration) -> Self {
        self.config.guard_window = window;
        self
    }

    /// Scheduler driving the post-commit guard window
    pub fn scheduler(mut self, scheduler: TimerHandle) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Apply timing knobs in one go
    pub fn tuning(mut self, tuning: SelectTuning) -> Self {
        self.config.guard_window = tuning.guard_window;
        self.config.open_on_click = tuning.open_on_click;
        self.config.max_options_for_click_open = tuning.max_options_for_click_open;
        if tuning.scheduler.is_some() {
            self.scheduler = tuning.scheduler;
        }
        self
    }

    pub fn on_select<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Selection) + Send + Sync + 'static,
    {
        self.callbacks.on_select = Some(Arc::new(callback));
        self
    }

    /// Override the clear button; the selection is then left to the caller
    pub fn on_clear<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callbacks.on_clear = Some(Arc::new(callback));
        self.config.custom_clear = true;
        self
    }

    pub fn on_create_option<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.on_create_option = Some(Arc::new(callback));
        self
    }

    pub fn on_toggle<F>(mut self, callback: F) -> Self
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.callbacks.on_toggle = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> TypeaheadSelect {
        if self.open_prop.is_some() && self.callbacks.on_toggle.is_none() {
            tracing::warn!(
                id = self.key.get(),
                line = self.key.line(),
                "controlled open state without on_toggle"
            );
        }

        let state = SelectState::new(&self.config, self.options, self.selected, self.open_prop);
        TypeaheadSelect {
            key: self.key,
            inner: Arc::new(Mutex::new(Inner {
                state,
                config: self.config,
                guard: None,
                disposed: false,
            })),
            callbacks: self.callbacks,
            appearance: self.appearance,
            scheduler: self.scheduler,
        }
    }
}

/// Create a typeahead select with the caller's current selection
///
/// `selected` may be a string or a collection of strings in either mode.
///
/// # Example
///
/// ```
/// use dsconsole_cn::prelude::*;
///
/// let attr = cn::typeahead_select("memberOf")
///     .options(["memberOf"])
///     .aria_label("Membership attribute")
///     .on_select(|selection| println!("{:?}", selection))
///     .build();
///
/// assert_eq!(attr.view().display_value, "memberOf");
/// ```
#[track_caller]
pub fn typeahead_select(selected: impl Into<SelectedInput>) -> TypeaheadSelectBuilder {
    TypeaheadSelectBuilder::new(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsconsole_core::{Key, TimerScheduler};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_auto_key_is_stable() {
        let select = typeahead_select("").build();
        let id = select.id().to_string();
        assert!(id.starts_with("typeahead-"));
        assert_eq!(select.view().id, id);

        let explicit = typeahead_select("").with_key("member attr").build();
        assert_eq!(explicit.id(), "member-attr");
    }

    #[test]
    fn test_callbacks_follow_outputs() {
        let selects = Arc::new(AtomicUsize::new(0));
        let toggles = Arc::new(AtomicUsize::new(0));
        let (s, t) = (selects.clone(), toggles.clone());

        let select = typeahead_select("")
            .options(["a", "b"])
            .guard_window(Duration::ZERO)
            .on_select(move |_| {
                s.fetch_add(1, Ordering::SeqCst);
            })
            .on_toggle(move |_| {
                t.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        select.dispatch(SelectEvent::InputClick);
        select.dispatch(SelectEvent::OptionClick(1));
        assert_eq!(selects.load(Ordering::SeqCst), 1);
        assert_eq!(toggles.load(Ordering::SeqCst), 2);
        assert_eq!(select.selection(), Selection::Single("b".into()));
    }

    #[test]
    fn test_guard_without_scheduler_collapses() {
        let select = typeahead_select(Vec::<String>::new())
            .multi(true)
            .options(["a", "b"])
            .build();
        select.dispatch(SelectEvent::TextChanged("a".into()));
        select.dispatch(SelectEvent::KeyDown(Key::ArrowDown));
        select.dispatch(SelectEvent::KeyDown(Key::Enter));
        assert!(!select.is_debounced());
        assert_eq!(select.state().candidates().len(), 2);
    }

    #[test]
    fn test_rearm_cancels_previous_timer() {
        let scheduler = TimerScheduler::new();
        let select = typeahead_select(Vec::<String>::new())
            .multi(true)
            .options(["a", "b"])
            .scheduler(scheduler.handle())
            .build();

        select.dispatch(SelectEvent::InputClick);
        select.dispatch(SelectEvent::OptionClick(0));
        select.dispatch(SelectEvent::OptionClick(1));
        assert_eq!(scheduler.pending(), 1);

        scheduler.advance(DEFAULT_GUARD_WINDOW);
        assert!(!select.is_debounced());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_dispose_cancels_and_ignores_events() {
        let scheduler = TimerScheduler::new();
        let select = typeahead_select(Vec::<String>::new())
            .multi(true)
            .options(["a"])
            .scheduler(scheduler.handle())
            .build();
        select.dispatch(SelectEvent::InputClick);
        select.dispatch(SelectEvent::OptionClick(0));
        assert_eq!(scheduler.pending(), 1);

        select.dispose();
        assert_eq!(scheduler.pending(), 0);
        assert!(select.dispatch(SelectEvent::ClearClick).is_empty());
    }
}
