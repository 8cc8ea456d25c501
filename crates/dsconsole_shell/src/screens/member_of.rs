//! MemberOf plugin configuration screen
//!
//! Loads the plugin entry with `dsconf plugin memberof show`, edits it
//! through typeahead selects and writes it back with `plugin memberof set`.
//! Subtree scope lists accept new DNs inline; created DNs are added to the
//! select's options so they stay listed after being deselected.
//!
//! The same settings can live in a shared config entry, managed with
//! `plugin memberof config-entry show|add|set|delete`.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex, MutexGuard};

use dsconsole_cn::components::typeahead::Outputs;
use dsconsole_cn::prelude::*;
use dsconsole_core::{lists_equal, parent_dn, valid_dn};
use serde::{Deserialize, Serialize};

use crate::dsconf::{log_cmd, DsCommand};
use crate::error::{Result, ShellError};
use crate::notify::{NotificationSink, Severity};
use crate::runner::{CommandError, CommandRunner, RunOptions};
use crate::session::ServerSession;

pub const MEMBER_ATTR_OPTIONS: [&str; 1] = ["memberOf"];
pub const GROUP_ATTR_OPTIONS: [&str; 3] = ["member", "memberCertificate", "uniqueMember"];

/// Entry as printed by `dsconf -j .. plugin memberof show`
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PluginEntry {
    #[serde(default)]
    pub dn: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, Vec<String>>,
}

impl PluginEntry {
    /// Values of an attribute (names compare case-insensitively)
    pub fn values(&self, name: &str) -> &[String] {
        self.attrs
            .iter()
            .find(|(attr, _)| attr.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn first(&self, name: &str) -> &str {
        self.values(name).first().map_or("", String::as_str)
    }

    /// Missing or `off` reads as false
    pub fn is_on(&self, name: &str) -> bool {
        let value = self.first(name);
        !value.is_empty() && !value.eq_ignore_ascii_case("off")
    }
}

/// Editable plugin settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemberOfConfig {
    pub attr: String,
    pub group_attr: Vec<String>,
    pub entry_scope: Vec<String>,
    pub exclude_subtree: Vec<String>,
    pub auto_add_oc: String,
    pub all_backends: bool,
    pub skip_nested: bool,
    pub config_entry: String,
}

impl MemberOfConfig {
    pub fn from_entry(entry: &PluginEntry) -> Self {
        Self {
            attr: entry.first("memberofattr").to_owned(),
            group_attr: entry.values("memberofgroupattr").to_vec(),
            entry_scope: entry.values("memberofentryscope").to_vec(),
            exclude_subtree: entry.values("memberofentryscopeexcludesubtree").to_vec(),
            auto_add_oc: entry.first("memberofautoaddoc").to_owned(),
            all_backends: entry.is_on("memberofallbackends"),
            skip_nested: entry.is_on("memberofskipnested"),
            config_entry: entry.first("nsslapd-pluginConfigArea").to_owned(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entry: PluginEntry = serde_json::from_str(json)?;
        Ok(Self::from_entry(&entry))
    }

    /// Compare against another config, ignoring list order
    pub fn differs_from(&self, other: &Self) -> bool {
        self.attr != other.attr
            || self.auto_add_oc != other.auto_add_oc
            || self.all_backends != other.all_backends
            || self.skip_nested != other.skip_nested
            || self.config_entry != other.config_entry
            || !lists_equal(&self.group_attr, &other.group_attr)
            || !lists_equal(&self.entry_scope, &other.entry_scope)
            || !lists_equal(&self.exclude_subtree, &other.exclude_subtree)
    }

    /// DN-valued settings that do not parse as DNs
    pub fn invalid_dns(&self) -> Vec<&str> {
        let config_entry = Some(self.config_entry.as_str()).filter(|dn| !dn.is_empty());
        self.entry_scope
            .iter()
            .chain(&self.exclude_subtree)
            .map(String::as_str)
            .chain(config_entry)
            .filter(|dn| !valid_dn(dn))
            .collect()
    }

    /// Required select fields left empty
    pub fn missing_required(&self) -> Vec<MemberOfField> {
        let mut missing = Vec::new();
        if self.attr.trim().is_empty() {
            missing.push(MemberOfField::Attr);
        }
        if self.group_attr.is_empty() {
            missing.push(MemberOfField::GroupAttr);
        }
        missing
    }

    /// `plugin memberof set` with every setting, emptied ones as `delete`
    pub fn set_command(&self, session: &ServerSession) -> DsCommand {
        session
            .dsconf()
            .args(["plugin", "memberof", "set"])
            .value_or_delete("--attr", &self.attr)
            .value_or_delete("--config-entry", &self.config_entry)
            .on_off("--allbackends", self.all_backends)
            .on_off("--skipnested", self.skip_nested)
            .value_or_delete("--autoaddoc", &self.auto_add_oc)
            .values_or_delete("--scope", &self.entry_scope)
            .values_or_delete("--exclude", &self.exclude_subtree)
            .values_or_delete("--groupattr", &self.group_attr)
    }

    /// `plugin memberof config-entry add|set <dn>` with these settings.
    ///
    /// `add` leaves out empty optional settings; `set` sends them as `delete`.
    pub fn config_entry_command(
        &self,
        session: &ServerSession,
        action: EntryAction,
        dn: &str,
    ) -> DsCommand {
        let add = action == EntryAction::Add;
        let mut cmd = session
            .dsconf()
            .args(["plugin", "memberof", "config-entry", action.as_str(), dn])
            .value_or_delete("--attr", &self.attr)
            .on_off("--allbackends", self.all_backends)
            .on_off("--skipnested", self.skip_nested);

        if !(add && self.entry_scope.is_empty()) {
            cmd = cmd.values_or_delete("--scope", &self.entry_scope);
        }
        if !(add && self.auto_add_oc.is_empty()) {
            cmd = cmd.value_or_delete("--autoaddoc", &self.auto_add_oc);
        }
        if !(add && self.exclude_subtree.is_empty()) {
            cmd = cmd.values_or_delete("--exclude", &self.exclude_subtree);
        }
        if !(add && self.group_attr.is_empty()) {
            cmd = cmd.values_or_delete("--groupattr", &self.group_attr);
        }
        cmd
    }
}

impl fmt::Display for MemberOfConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Membership Attribute: {}", self.attr)?;
        writeln!(f, "Group Attribute: {}", self.group_attr.join(", "))?;
        writeln!(f, "Subtree Scope: {}", self.entry_scope.join(", "))?;
        writeln!(f, "Exclude Subtree: {}", self.exclude_subtree.join(", "))?;
        writeln!(f, "Auto Add OC: {}", self.auto_add_oc)?;
        writeln!(f, "All Backends: {}", self.all_backends)?;
        writeln!(f, "Skip Nested: {}", self.skip_nested)?;
        if !self.config_entry.is_empty() {
            writeln!(f, "Shared Config Entry: {}", self.config_entry)?;
        }
        Ok(())
    }
}

/// Write operations on the shared config entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryAction {
    Add,
    Set,
}

impl EntryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryAction::Add => "add",
            EntryAction::Set => "set",
        }
    }

    fn past_tense(&self) -> &'static str {
        match self {
            EntryAction::Add => "added",
            EntryAction::Set => "edited",
        }
    }
}

/// The select-backed settings of the screen
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemberOfField {
    Attr,
    GroupAttr,
    EntryScope,
    ExcludeSubtree,
}

impl MemberOfField {
    pub const ALL: [MemberOfField; 4] = [
        MemberOfField::Attr,
        MemberOfField::GroupAttr,
        MemberOfField::EntryScope,
        MemberOfField::ExcludeSubtree,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            MemberOfField::Attr => "memberof-attr",
            MemberOfField::GroupAttr => "memberof-group-attr",
            MemberOfField::EntryScope => "memberof-entry-scope",
            MemberOfField::ExcludeSubtree => "memberof-exclude-subtree",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MemberOfField::Attr => "Membership Attribute",
            MemberOfField::GroupAttr => "Group Attribute",
            MemberOfField::EntryScope => "Subtree Scope",
            MemberOfField::ExcludeSubtree => "Exclude Subtree",
        }
    }

    fn is_dn_list(&self) -> bool {
        matches!(self, MemberOfField::EntryScope | MemberOfField::ExcludeSubtree)
    }

    fn values(&self, config: &MemberOfConfig) -> Vec<String> {
        match self {
            MemberOfField::Attr => Some(config.attr.clone())
                .filter(|attr| !attr.is_empty())
                .into_iter()
                .collect(),
            MemberOfField::GroupAttr => config.group_attr.clone(),
            MemberOfField::EntryScope => config.entry_scope.clone(),
            MemberOfField::ExcludeSubtree => config.exclude_subtree.clone(),
        }
    }

    fn store(&self, config: &mut MemberOfConfig, selection: &Selection) {
        let values = selection.to_vec();
        match self {
            MemberOfField::Attr => config.attr = values.into_iter().next().unwrap_or_default(),
            MemberOfField::GroupAttr => config.group_attr = values,
            MemberOfField::EntryScope => config.entry_scope = values,
            MemberOfField::ExcludeSubtree => config.exclude_subtree = values,
        }
    }
}

/// The tool's `desc` when it printed one, else the whole error
fn error_desc(err: &CommandError) -> String {
    match err.payload() {
        Some(payload) => payload.desc.clone(),
        None => err.to_string(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

type SharedConfig = Arc<Mutex<MemberOfConfig>>;
type CreatedValues = Arc<Mutex<Vec<(MemberOfField, String)>>>;

fn build_select(
    field: MemberOfField,
    config: &MemberOfConfig,
    draft: &SharedConfig,
    created: &CreatedValues,
    tuning: &SelectTuning,
) -> TypeaheadSelect {
    let values = field.values(config);
    let draft = draft.clone();
    let builder = cn::typeahead_select(values.clone())
        .with_key(field.key())
        .aria_label(field.label())
        .tuning(tuning.clone())
        .on_select(move |selection| field.store(&mut lock(&draft), selection));

    let builder = match field {
        MemberOfField::Attr => builder
            .options(MEMBER_ATTR_OPTIONS)
            .placeholder("Type a member attribute..."),
        MemberOfField::GroupAttr => builder
            .multi(true)
            .has_checkbox(true)
            .options(GROUP_ATTR_OPTIONS)
            .placeholder("Type a member group attribute..."),
        MemberOfField::EntryScope | MemberOfField::ExcludeSubtree => {
            let created = created.clone();
            builder
                .multi(true)
                .creatable(true)
                .options(values)
                .validate_create(|text: &str| {
                    if valid_dn(text) {
                        CreateValidation::valid()
                    } else {
                        CreateValidation::invalid("Value must be a valid DN")
                    }
                })
                .on_create_option(move |text| lock(&created).push((field, text.to_owned())))
                .placeholder("Type a subtree DN...")
                .no_results_text("Type a valid DN to add it")
        }
    };
    builder.build()
}

fn fetch_config(session: &ServerSession, runner: &dyn CommandRunner) -> Result<MemberOfConfig> {
    let cmd = session.dsconf().args(["plugin", "memberof", "show"]);
    log_cmd("fetchConfig", "Fetch the MemberOf Plugin configuration", cmd.argv());
    let output = runner.run(cmd.argv(), RunOptions::elevated())?;
    MemberOfConfig::from_json(&output)
}

/// MemberOf plugin settings bound to one server
pub struct MemberOfScreen {
    session: ServerSession,
    runner: Arc<dyn CommandRunner>,
    notifier: Arc<dyn NotificationSink>,
    saved: MemberOfConfig,
    draft: SharedConfig,
    created: CreatedValues,
    attr: TypeaheadSelect,
    group_attr: TypeaheadSelect,
    entry_scope: TypeaheadSelect,
    exclude_subtree: TypeaheadSelect,
}

impl MemberOfScreen {
    /// Fetch the plugin entry and build the screen
    pub fn load(
        session: ServerSession,
        runner: Arc<dyn CommandRunner>,
        notifier: Arc<dyn NotificationSink>,
        tuning: SelectTuning,
    ) -> Result<Self> {
        let config = fetch_config(&session, runner.as_ref())?;
        Ok(Self::with_config(session, runner, notifier, tuning, config))
    }

    /// Build the screen around an already fetched configuration
    pub fn with_config(
        session: ServerSession,
        runner: Arc<dyn CommandRunner>,
        notifier: Arc<dyn NotificationSink>,
        tuning: SelectTuning,
        config: MemberOfConfig,
    ) -> Self {
        let draft = Arc::new(Mutex::new(config.clone()));
        let created = CreatedValues::default();
        let select = |field| build_select(field, &config, &draft, &created, &tuning);

        Self {
            attr: select(MemberOfField::Attr),
            group_attr: select(MemberOfField::GroupAttr),
            entry_scope: select(MemberOfField::EntryScope),
            exclude_subtree: select(MemberOfField::ExcludeSubtree),
            session,
            runner,
            notifier,
            saved: config,
            draft,
            created,
        }
    }

    pub fn session(&self) -> &ServerSession {
        &self.session
    }

    pub fn select(&self, field: MemberOfField) -> &TypeaheadSelect {
        match field {
            MemberOfField::Attr => &self.attr,
            MemberOfField::GroupAttr => &self.group_attr,
            MemberOfField::EntryScope => &self.entry_scope,
            MemberOfField::ExcludeSubtree => &self.exclude_subtree,
        }
    }

    fn select_mut(&mut self, field: MemberOfField) -> &mut TypeaheadSelect {
        match field {
            MemberOfField::Attr => &mut self.attr,
            MemberOfField::GroupAttr => &mut self.group_attr,
            MemberOfField::EntryScope => &mut self.entry_scope,
            MemberOfField::ExcludeSubtree => &mut self.exclude_subtree,
        }
    }

    /// Route a UI event to one of the selects
    pub fn dispatch(&self, field: MemberOfField, event: SelectEvent) -> Outputs {
        let outputs = self.select(field).dispatch(event);
        self.absorb_created();
        outputs
    }

    /// Add DNs created since the last event to their select's options
    fn absorb_created(&self) {
        let created = std::mem::take(&mut *lock(&self.created));
        for (field, value) in created {
            let select = self.select(field);
            let mut options: Vec<String> = select
                .state()
                .options()
                .iter()
                .map(|option| option.value.clone())
                .collect();
            if value.trim().is_empty() || !valid_dn(&value) || options.contains(&value) {
                continue;
            }
            tracing::debug!(field = field.key(), dn = %value, "adding created DN to options");
            options.push(value);
            select.set_options(options);
        }
    }

    /// Replace a select's values without going through UI events
    pub fn set_values<S: AsRef<str>>(&self, field: MemberOfField, values: &[S]) -> Result<()> {
        let values: Vec<String> = values.iter().map(|v| v.as_ref().to_owned()).collect();
        let select = self.select(field);

        if field.is_dn_list() {
            if let Some(bad) = values.iter().find(|dn| !valid_dn(dn)) {
                return Err(ShellError::Invalid(format!("not a valid DN: {}", bad)));
            }
            let mut options: Vec<String> = select
                .state()
                .options()
                .iter()
                .map(|option| option.value.clone())
                .collect();
            for value in &values {
                if !options.contains(value) {
                    options.push(value.clone());
                }
            }
            select.set_options(options);
        }

        select.set_selected(values);
        field.store(&mut lock(&self.draft), &select.selection());
        Ok(())
    }

    pub fn set_auto_add_oc(&self, objectclass: impl Into<String>) {
        lock(&self.draft).auto_add_oc = objectclass.into();
    }

    pub fn set_all_backends(&self, on: bool) {
        lock(&self.draft).all_backends = on;
    }

    pub fn set_skip_nested(&self, on: bool) {
        lock(&self.draft).skip_nested = on;
    }

    pub fn set_config_entry(&self, dn: impl Into<String>) {
        lock(&self.draft).config_entry = dn.into();
    }

    /// Settings as last loaded from the server
    pub fn saved(&self) -> &MemberOfConfig {
        &self.saved
    }

    /// Settings as currently edited
    pub fn draft(&self) -> MemberOfConfig {
        lock(&self.draft).clone()
    }

    pub fn is_modified(&self) -> bool {
        self.draft().differs_from(&self.saved)
    }

    /// Write the draft to the server, report the outcome and reload
    pub fn save(&mut self) -> Result<()> {
        let draft = self.draft();
        let missing = draft.missing_required();
        for field in [MemberOfField::Attr, MemberOfField::GroupAttr] {
            let validated = if missing.contains(&field) {
                Validated::Error
            } else {
                Validated::Default
            };
            self.select_mut(field).set_validated(validated);
        }
        if !missing.is_empty() {
            let message = match missing.as_slice() {
                [field] => format!("{} is required.", field.label()),
                _ => "Membership Attribute and Group Attribute are required.".to_owned(),
            };
            self.notifier.notify(Severity::Warning, &message);
            return Err(ShellError::Invalid(message));
        }

        let invalid = draft.invalid_dns();
        if !invalid.is_empty() {
            let message = format!("Invalid DN: {}", invalid.join(", "));
            self.notifier.notify(Severity::Warning, &message);
            return Err(ShellError::Invalid(message));
        }

        let cmd = draft.set_command(&self.session);
        log_cmd("saveConfig", "Save MemberOf Plugin", cmd.argv());

        self.set_disabled(true);
        let result = self.runner.run(cmd.argv(), RunOptions::elevated());
        self.set_disabled(false);

        match &result {
            Ok(_) => self
                .notifier
                .notify(Severity::Success, "Successfully updated MemberOf Plugin"),
            Err(err) => self
                .notifier
                .notify(Severity::Error, &format!("Error during update - {}", err)),
        }

        if let Err(err) = self.reload() {
            tracing::warn!(error = %err, "failed to reload MemberOf configuration");
        }
        result.map(|_| ()).map_err(ShellError::from)
    }

    /// Fetch the entry again and reset every select to it
    pub fn reload(&mut self) -> Result<()> {
        let config = fetch_config(&self.session, self.runner.as_ref())?;
        for field in MemberOfField::ALL {
            let select = self.select(field);
            let values = field.values(&config);
            if field.is_dn_list() {
                select.set_options(values.clone());
            }
            select.set_selected(values);
        }
        *lock(&self.draft) = config.clone();
        self.saved = config;
        Ok(())
    }

    /// Start a fixup task regenerating memberOf values under `dn`
    pub fn fixup(&self, dn: &str, filter: Option<&str>) -> Result<()> {
        if dn.is_empty() {
            self.notifier.notify(Severity::Warning, "Fixup DN is required.");
            return Err(ShellError::Invalid("Fixup DN is required.".to_owned()));
        }
        if !valid_dn(dn) {
            let message = format!("Fixup DN is not a valid DN: {}", dn);
            self.notifier.notify(Severity::Warning, &message);
            return Err(ShellError::Invalid(message));
        }

        let mut cmd = self.session.dsconf().args(["plugin", "memberof", "fixup", dn]);
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            cmd = cmd.args(["--filter", filter]);
        }
        log_cmd("runFixup", "Run fixup MemberOf Plugin", cmd.argv());

        match self.runner.run(cmd.argv(), RunOptions::elevated()) {
            Ok(_) => {
                self.notifier
                    .notify(Severity::Success, &format!("Fixup task for {} was successful", dn));
                Ok(())
            }
            Err(err) => {
                self.notifier.notify(
                    Severity::Error,
                    &format!("Fixup task for {} has failed {}", dn, error_desc(&err)),
                );
                Err(err.into())
            }
        }
    }

    /// Settings stored in a shared config entry, `None` when it does not exist
    pub fn show_config_entry(&self, dn: &str) -> Result<Option<MemberOfConfig>> {
        let cmd = self
            .session
            .dsconf()
            .args(["plugin", "memberof", "config-entry", "show", dn]);
        log_cmd("showConfigEntry", "Fetch the MemberOf Plugin config entry", cmd.argv());

        match self.runner.run(cmd.argv(), RunOptions::elevated()) {
            Ok(output) => MemberOfConfig::from_json(&output).map(Some),
            Err(CommandError::Failed(payload)) => {
                tracing::debug!(dn, error = %payload, "config entry not found");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Create a shared config entry; its parent must already exist
    pub fn add_config_entry(&self, dn: &str, settings: &MemberOfConfig) -> Result<()> {
        self.check_config_entry(dn, settings)?;

        match self.parent_exists(dn) {
            Ok(true) => {}
            Ok(false) => {
                let message = format!("Config DN \"{}\" does not exist, it must be a full DN!", dn);
                self.notifier.notify(Severity::Error, &message);
                return Err(ShellError::Invalid(message));
            }
            Err(err) => {
                tracing::warn!(dn, error = %err, "parent lookup failed");
                self.notifier.notify(Severity::Error, "Error checking DN");
                return Err(err);
            }
        }

        self.write_config_entry(EntryAction::Add, dn, settings)
    }

    /// Overwrite an existing shared config entry
    pub fn edit_config_entry(&self, dn: &str, settings: &MemberOfConfig) -> Result<()> {
        self.check_config_entry(dn, settings)?;
        self.write_config_entry(EntryAction::Set, dn, settings)
    }

    pub fn delete_config_entry(&self, dn: &str) -> Result<()> {
        let cmd = self
            .session
            .dsconf()
            .args(["plugin", "memberof", "config-entry", "delete", dn]);
        log_cmd("deleteConfig", "Delete the MemberOf Plugin config entry", cmd.argv());

        match self.runner.run(cmd.argv(), RunOptions::elevated()) {
            Ok(_) => {
                self.notifier.notify(
                    Severity::Success,
                    &format!("Config entry {} was successfully deleted", dn),
                );
                Ok(())
            }
            Err(err) => {
                self.notifier.notify(
                    Severity::Error,
                    &format!(
                        "Error during the config entry removal operation - {}",
                        error_desc(&err)
                    ),
                );
                Err(err.into())
            }
        }
    }

    fn check_config_entry(&self, dn: &str, settings: &MemberOfConfig) -> Result<()> {
        let message = if !settings.missing_required().is_empty() {
            "Config Attribute and Group Attribute are required.".to_owned()
        } else if !valid_dn(dn) {
            format!("Config DN is not a valid DN: {}", dn)
        } else {
            let invalid = settings.invalid_dns();
            if invalid.is_empty() {
                return Ok(());
            }
            format!("Invalid DN: {}", invalid.join(", "))
        };
        self.notifier.notify(Severity::Warning, &message);
        Err(ShellError::Invalid(message))
    }

    /// Base-scope search for the entry one level above `dn`
    fn parent_exists(&self, dn: &str) -> Result<bool> {
        let Some(parent) = parent_dn(dn) else {
            return Ok(false);
        };
        let cmd = self.session.ldapsearch_base(&parent);
        log_cmd("parentExists", "Check the parent entry exists", cmd.argv());

        match self.runner.run(cmd.argv(), RunOptions::elevated()) {
            Ok(_) => Ok(true),
            Err(CommandError::Failed(payload)) if payload.desc.contains("No such object") => {
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn write_config_entry(
        &self,
        action: EntryAction,
        dn: &str,
        settings: &MemberOfConfig,
    ) -> Result<()> {
        let cmd = settings.config_entry_command(&self.session, action, dn);
        log_cmd(
            "memberOfOperation",
            &format!("Do the {} operation on the MemberOf Plugin", action.as_str()),
            cmd.argv(),
        );

        match self.runner.run(cmd.argv(), RunOptions::elevated()) {
            Ok(_) => {
                self.notifier.notify(
                    Severity::Success,
                    &format!("Config entry {} was successfully {}", dn, action.past_tense()),
                );
                Ok(())
            }
            Err(err) => {
                self.notifier.notify(
                    Severity::Error,
                    &format!(
                        "Error during the config entry {} operation - {}",
                        action.as_str(),
                        error_desc(&err)
                    ),
                );
                Err(err.into())
            }
        }
    }

    fn set_disabled(&self, disabled: bool) {
        for field in MemberOfField::ALL {
            self.select(field).set_disabled(disabled);
        }
    }

    /// Plain-text rendering of every select plus the scalar settings
    pub fn render(&self) -> String {
        let draft = self.draft();
        let mut out = String::new();
        for field in MemberOfField::ALL {
            let _ = write!(out, "{}: {}", field.label(), self.select(field).view());
        }
        let _ = writeln!(out, "Auto Add OC: {}", draft.auto_add_oc);
        let _ = writeln!(out, "All Backends: {}", draft.all_backends);
        let _ = writeln!(out, "Skip Nested: {}", draft.skip_nested);
        let _ = writeln!(out, "Shared Config Entry: {}", draft.config_entry);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationLog;
    use crate::runner::scripted::ScriptedRunner;
    use crate::runner::ErrorPayload;

    const ENTRY: &str = r#"{
        "dn": "cn=MemberOf Plugin,cn=plugins,cn=config",
        "attrs": {
            "cn": ["MemberOf Plugin"],
            "memberofattr": ["memberOf"],
            "memberofgroupattr": ["member"],
            "memberofentryscope": ["dc=example,dc=com"],
            "memberofallbackends": ["off"],
            "memberofskipnested": ["on"],
            "nsslapd-pluginEnabled": ["on"]
        }
    }"#;

    struct Fixture {
        runner: Arc<ScriptedRunner>,
        log: NotificationLog,
        screen: MemberOfScreen,
    }

    fn fixture() -> Fixture {
        let runner = Arc::new(ScriptedRunner::default());
        runner.respond(&["memberof", "show"], Ok(ENTRY.to_owned()));
        let log = NotificationLog::new();
        let screen = MemberOfScreen::load(
            ServerSession::new("localhost").unwrap(),
            runner.clone(),
            Arc::new(log.clone()),
            SelectTuning::default(),
        )
        .unwrap();
        Fixture {
            runner,
            log,
            screen,
        }
    }

    fn click_value(screen: &MemberOfScreen, field: MemberOfField, value: &str) {
        if !screen.select(field).is_open() {
            screen.dispatch(field, SelectEvent::InputClick);
        }
        let index = screen
            .select(field)
            .view()
            .rows
            .iter()
            .position(|row| row.value == value)
            .unwrap();
        screen.dispatch(field, SelectEvent::OptionClick(index));
    }

    #[test]
    fn test_config_from_entry() {
        let config = MemberOfConfig::from_json(ENTRY).unwrap();
        assert_eq!(config.attr, "memberOf");
        assert_eq!(config.group_attr, vec!["member"]);
        assert_eq!(config.entry_scope, vec!["dc=example,dc=com"]);
        assert!(config.exclude_subtree.is_empty());
        assert!(!config.all_backends);
        assert!(config.skip_nested);
        assert_eq!(config.config_entry, "");
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let err = MemberOfConfig::from_json("Plugin not found").unwrap_err();
        assert!(matches!(err, ShellError::Parse(_)));
    }

    #[test]
    fn test_load_populates_selects() {
        let f = fixture();
        assert_eq!(
            f.runner.calls()[0],
            [
                "dsconf",
                "-j",
                "ldapi://%2fvar%2frun%2fslapd-localhost.socket",
                "plugin",
                "memberof",
                "show"
            ]
        );
        assert_eq!(f.screen.select(MemberOfField::Attr).view().display_value, "memberOf");
        let chips = f.screen.select(MemberOfField::GroupAttr).view().chips;
        assert_eq!(chips.len(), 1);
        assert!(!f.screen.is_modified());
    }

    #[test]
    fn test_group_attr_toggle_and_save() {
        let mut f = fixture();
        click_value(&f.screen, MemberOfField::GroupAttr, "uniqueMember");
        assert_eq!(f.screen.draft().group_attr, vec!["member", "uniqueMember"]);
        assert!(f.screen.is_modified());

        let updated = ENTRY.replace(r#"["member"]"#, r#"["member", "uniqueMember"]"#);
        f.runner.respond(&["memberof", "set"], Ok(String::new()));
        f.runner.respond(&["memberof", "show"], Ok(updated));
        f.screen.save().unwrap();

        let calls = f.runner.calls();
        assert_eq!(
            calls[1][3..],
            [
                "plugin",
                "memberof",
                "set",
                "--attr",
                "memberOf",
                "--config-entry",
                "delete",
                "--allbackends",
                "off",
                "--skipnested",
                "on",
                "--autoaddoc",
                "delete",
                "--scope",
                "dc=example,dc=com",
                "--exclude",
                "delete",
                "--groupattr",
                "member",
                "uniqueMember"
            ]
        );
        assert!(f.runner.calls.lock().unwrap()[1].1.elevated);
        assert_eq!(
            f.log.take(),
            vec![(Severity::Success, "Successfully updated MemberOf Plugin".to_owned())]
        );
        assert!(!f.screen.is_modified());
    }

    #[test]
    fn test_save_failure_reports_desc_and_info() {
        let mut f = fixture();
        f.screen.set_skip_nested(false);
        f.runner.respond(
            &["memberof", "set"],
            Err(ErrorPayload {
                desc: "Server is unwilling to perform".into(),
                info: Some("plugin is disabled".into()),
            }),
        );
        f.runner.respond(&["memberof", "show"], Ok(ENTRY.to_owned()));

        assert!(f.screen.save().is_err());
        assert_eq!(
            f.log.last(),
            Some((
                Severity::Error,
                "Error during update - Server is unwilling to perform plugin is disabled".to_owned()
            ))
        );
        // The reload resets the draft to what the server has
        assert!(f.screen.draft().skip_nested);
    }

    #[test]
    fn test_create_scope_dn() {
        let f = fixture();
        let field = MemberOfField::ExcludeSubtree;
        f.screen
            .dispatch(field, SelectEvent::TextChanged("ou=people,dc=example,dc=com".into()));
        f.screen.dispatch(field, SelectEvent::KeyDown(Key::Enter));

        assert_eq!(f.screen.draft().exclude_subtree, vec!["ou=people,dc=example,dc=com"]);
        let options = f.screen.select(field).state().options().to_vec();
        assert_eq!(options.len(), 1);

        // Deselecting keeps the created DN available
        click_value(&f.screen, field, "ou=people,dc=example,dc=com");
        assert!(f.screen.draft().exclude_subtree.is_empty());
        assert_eq!(f.screen.select(field).state().options().len(), 1);
    }

    #[test]
    fn test_invalid_scope_dn_is_not_created() {
        let f = fixture();
        let field = MemberOfField::EntryScope;
        f.screen.dispatch(field, SelectEvent::TextChanged("bad dn".into()));
        f.screen.dispatch(field, SelectEvent::KeyDown(Key::Enter));

        assert_eq!(f.screen.draft().entry_scope, vec!["dc=example,dc=com"]);
        assert_eq!(
            f.screen.select(field).view().create_hint.as_deref(),
            Some("Value must be a valid DN")
        );
        assert!(f.screen.set_values(field, &["bad dn"]).is_err());
    }

    #[test]
    fn test_emptied_lists_are_deleted() {
        let f = fixture();
        f.screen.set_values::<&str>(MemberOfField::EntryScope, &[]).unwrap();
        f.screen.dispatch(MemberOfField::GroupAttr, SelectEvent::ClearClick);

        let argv = f.screen.draft().set_command(f.screen.session()).into_argv();
        let joined = argv.join(" ");
        assert!(joined.contains("--scope delete"));
        assert!(joined.contains("--groupattr delete"));
        assert!(f.screen.is_modified());
    }

    #[test]
    fn test_fixup() {
        let f = fixture();
        assert!(f.screen.fixup("", None).is_err());
        assert_eq!(
            f.log.take(),
            vec![(Severity::Warning, "Fixup DN is required.".to_owned())]
        );

        f.runner.respond(
            &["memberof", "fixup"],
            Err(ErrorPayload {
                desc: "No such object".into(),
                info: None,
            }),
        );
        assert!(f.screen.fixup("dc=example,dc=com", Some("(uid=*)")).is_err());
        let calls = f.runner.calls();
        assert_eq!(
            calls.last().unwrap()[3..],
            ["plugin", "memberof", "fixup", "dc=example,dc=com", "--filter", "(uid=*)"]
        );
        assert_eq!(
            f.log.take(),
            vec![(
                Severity::Error,
                "Fixup task for dc=example,dc=com has failed No such object".to_owned()
            )]
        );
    }

    #[test]
    fn test_save_requires_group_attr() {
        let mut f = fixture();
        f.screen.set_values::<&str>(MemberOfField::GroupAttr, &[]).unwrap();

        let err = f.screen.save().unwrap_err();
        assert!(matches!(err, ShellError::Invalid(_)));
        assert!(f.runner.calls().iter().all(|argv| !argv.contains(&"set".to_string())));
        assert_eq!(
            f.log.take(),
            vec![(Severity::Warning, "Group Attribute is required.".to_owned())]
        );
        assert_eq!(
            f.screen.select(MemberOfField::GroupAttr).view().validated,
            Validated::Error
        );
        assert_eq!(f.screen.select(MemberOfField::Attr).view().validated, Validated::Default);

        // Both missing at once
        f.screen.set_values::<&str>(MemberOfField::Attr, &[]).unwrap();
        assert!(f.screen.save().is_err());
        assert_eq!(
            f.log.take(),
            vec![(
                Severity::Warning,
                "Membership Attribute and Group Attribute are required.".to_owned()
            )]
        );

        // Filling them in clears the error marks
        f.screen.set_values(MemberOfField::Attr, &["memberOf"]).unwrap();
        f.screen.set_values(MemberOfField::GroupAttr, &["member"]).unwrap();
        f.runner.respond(&["memberof", "set"], Ok(String::new()));
        f.runner.respond(&["memberof", "show"], Ok(ENTRY.to_owned()));
        f.screen.save().unwrap();
        assert_eq!(
            f.screen.select(MemberOfField::GroupAttr).view().validated,
            Validated::Default
        );
    }

    fn entry_settings() -> MemberOfConfig {
        MemberOfConfig {
            attr: "memberOf".into(),
            group_attr: vec!["member".into(), "uniqueMember".into()],
            ..MemberOfConfig::default()
        }
    }

    const CONFIG_DN: &str = "cn=memberof shared,cn=config";

    #[test]
    fn test_add_config_entry_requires_fields() {
        let f = fixture();
        let settings = MemberOfConfig {
            group_attr: Vec::new(),
            ..entry_settings()
        };
        assert!(f.screen.add_config_entry(CONFIG_DN, &settings).is_err());
        assert_eq!(
            f.log.take(),
            vec![(
                Severity::Warning,
                "Config Attribute and Group Attribute are required.".to_owned()
            )]
        );
        // Only the initial load ran
        assert_eq!(f.runner.calls().len(), 1);
    }

    #[test]
    fn test_add_config_entry_checks_parent() {
        let f = fixture();
        let dn = "cn=memberof shared,ou=missing,dc=example,dc=com";
        f.runner.respond(
            &["ldapsearch"],
            Err(ErrorPayload {
                desc: "No such object (32)".into(),
                info: None,
            }),
        );
        assert!(f.screen.add_config_entry(dn, &entry_settings()).is_err());
        assert_eq!(
            f.log.take(),
            vec![(
                Severity::Error,
                format!("Config DN \"{}\" does not exist, it must be a full DN!", dn)
            )]
        );
        let calls = f.runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1][0], "ldapsearch");
        assert!(calls[1].contains(&"ou=missing,dc=example,dc=com".to_string()));

        f.runner.respond(
            &["ldapsearch"],
            Err(ErrorPayload {
                desc: "Can't contact LDAP server (-1)".into(),
                info: None,
            }),
        );
        assert!(f.screen.add_config_entry(dn, &entry_settings()).is_err());
        assert_eq!(
            f.log.take(),
            vec![(Severity::Error, "Error checking DN".to_owned())]
        );
        assert!(!f.runner.calls().iter().any(|argv| argv.contains(&"add".to_string())));
    }

    #[test]
    fn test_add_config_entry() {
        let f = fixture();
        f.runner.respond(&["ldapsearch"], Ok("dn: cn=config\n".to_owned()));
        f.runner.respond(&["config-entry", "add"], Ok(String::new()));

        f.screen.add_config_entry(CONFIG_DN, &entry_settings()).unwrap();
        let calls = f.runner.calls();
        assert_eq!(
            calls.last().unwrap()[3..],
            [
                "plugin",
                "memberof",
                "config-entry",
                "add",
                CONFIG_DN,
                "--attr",
                "memberOf",
                "--allbackends",
                "off",
                "--skipnested",
                "off",
                "--groupattr",
                "member",
                "uniqueMember"
            ]
        );
        assert_eq!(
            f.log.take(),
            vec![(
                Severity::Success,
                format!("Config entry {} was successfully added", CONFIG_DN)
            )]
        );
    }

    #[test]
    fn test_edit_config_entry_clears_emptied_settings() {
        let f = fixture();
        let shared = ENTRY.replace("cn=MemberOf Plugin,cn=plugins,cn=config", CONFIG_DN);
        f.runner.respond(&["config-entry", "show"], Ok(shared));
        let mut settings = f.screen.show_config_entry(CONFIG_DN).unwrap().unwrap();
        assert_eq!(settings.entry_scope, vec!["dc=example,dc=com"]);

        settings.entry_scope.clear();
        settings.auto_add_oc = "nsMemberOf".into();
        f.runner.respond(&["config-entry", "set"], Ok(String::new()));
        f.screen.edit_config_entry(CONFIG_DN, &settings).unwrap();

        let calls = f.runner.calls();
        let joined = calls.last().unwrap().join(" ");
        assert!(joined.contains("config-entry set cn=memberof shared,cn=config --attr memberOf"));
        assert!(joined.contains("--scope delete --autoaddoc nsMemberOf --exclude delete"));
        assert_eq!(
            f.log.last(),
            Some((
                Severity::Success,
                format!("Config entry {} was successfully edited", CONFIG_DN)
            ))
        );
    }

    #[test]
    fn test_missing_config_entry_shows_none() {
        let f = fixture();
        f.runner.respond(
            &["config-entry", "show"],
            Err(ErrorPayload {
                desc: "No such object".into(),
                info: None,
            }),
        );
        assert_eq!(f.screen.show_config_entry(CONFIG_DN).unwrap(), None);
    }

    #[test]
    fn test_delete_config_entry() {
        let f = fixture();
        f.runner.respond(&["config-entry", "delete"], Ok(String::new()));
        f.screen.delete_config_entry(CONFIG_DN).unwrap();
        assert_eq!(
            f.log.take(),
            vec![(
                Severity::Success,
                format!("Config entry {} was successfully deleted", CONFIG_DN)
            )]
        );

        f.runner.respond(
            &["config-entry", "delete"],
            Err(ErrorPayload {
                desc: "Insufficient access".into(),
                info: Some("ignored in this message".into()),
            }),
        );
        assert!(f.screen.delete_config_entry(CONFIG_DN).is_err());
        assert_eq!(
            f.log.take(),
            vec![(
                Severity::Error,
                "Error during the config entry removal operation - Insufficient access".to_owned()
            )]
        );
    }

    #[test]
    fn test_render_lists_every_field() {
        let f = fixture();
        let text = f.screen.render();
        for field in MemberOfField::ALL {
            assert!(text.contains(field.label()));
        }
        assert!(text.contains("Skip Nested: true"));
    }
}
