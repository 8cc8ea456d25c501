//! dsconsole CLI
//!
//! Replay typeahead interaction scripts, check values with the console's
//! validators and manage the MemberOf plugin of a directory server.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dsconsole_shell::{MemberOfConfig, MemberOfField, MemberOfScreen, Severity};

mod config;
mod kind;
mod replay;

use config::DsConsoleConfig;
use kind::ValueKind;
use replay::Script;

#[derive(Parser)]
#[command(name = "dsconsole")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Directory server console tools", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./dsconsole.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a typeahead select through a JSON script
    Replay {
        /// Script file
        script: PathBuf,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a value the way the console's forms do
    Validate {
        /// Kind of value
        #[arg(value_enum)]
        kind: ValueKind,

        value: String,
    },

    /// Manage the MemberOf plugin
    Memberof {
        /// Server instance id (overrides the configuration)
        #[arg(short, long, global = true)]
        server: Option<String>,

        #[command(subcommand)]
        command: MemberOfCommands,
    },

    /// Show version and the effective configuration
    Info,
}

#[derive(Subcommand)]
enum MemberOfCommands {
    /// Show the current plugin settings
    Show {
        /// Print settings as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change plugin settings; list flags without values clear the list
    Set {
        #[command(flatten)]
        settings: SettingsArgs,

        /// Shared configuration entry DN
        #[arg(long)]
        config_entry: Option<String>,
    },

    /// Manage the shared configuration entry
    #[command(subcommand)]
    ConfigEntry(ConfigEntryCommands),

    /// Run a fixup task regenerating membership values
    Fixup {
        /// Base DN of the task
        dn: String,

        /// Filter for entries to fix up
        #[arg(short, long)]
        filter: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigEntryCommands {
    /// Show the settings stored in a config entry
    Show {
        dn: String,

        /// Print settings as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a config entry under an existing parent
    Add {
        dn: String,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Change the settings of an existing config entry
    Set {
        dn: String,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Delete a config entry
    Delete { dn: String },
}

/// Settings shared by the plugin entry and config entries; `None` leaves a
/// setting alone
#[derive(Args, Debug)]
struct SettingsArgs {
    /// Membership attribute
    #[arg(long)]
    attr: Option<String>,

    /// Group membership attributes
    #[arg(long, num_args = 0..)]
    groupattr: Option<Vec<String>>,

    /// Subtrees in scope
    #[arg(long, num_args = 0..)]
    scope: Option<Vec<String>>,

    /// Subtrees excluded from scope
    #[arg(long, num_args = 0..)]
    exclude: Option<Vec<String>>,

    /// Objectclass added to entries that get the membership attribute
    #[arg(long)]
    autoaddoc: Option<String>,

    /// Search every backend (on/off)
    #[arg(long, value_parser = parse_on_off)]
    allbackends: Option<bool>,

    /// Skip nested groups (on/off)
    #[arg(long, value_parser = parse_on_off)]
    skipnested: Option<bool>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = DsConsoleConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Replay { script, json } => cmd_replay(&config, &script, json),

        Commands::Validate { kind, value } => cmd_validate(kind, &value),

        Commands::Memberof { server, command } => {
            let server = server.as_deref();
            match command {
                MemberOfCommands::Show { json } => cmd_memberof_show(&config, server, json),
                MemberOfCommands::Set {
                    settings,
                    config_entry,
                } => cmd_memberof_set(&config, server, settings, config_entry),
                MemberOfCommands::ConfigEntry(command) => {
                    cmd_config_entry(&config, server, command)
                }
                MemberOfCommands::Fixup { dn, filter } => {
                    cmd_memberof_fixup(&config, server, &dn, filter.as_deref())
                }
            }
        }

        Commands::Info => cmd_info(&config, cli.config.as_deref()),
    }
}

fn parse_on_off(value: &str) -> std::result::Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        _ => Err(format!("expected 'on' or 'off', got '{}'", value)),
    }
}

fn cmd_replay(config: &DsConsoleConfig, path: &Path, json: bool) -> Result<()> {
    let script = Script::load(path)?;
    info!("Replaying {} steps from {}", script.steps.len(), path.display());

    let reports = script.run(&config.tuning(None))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print!("{}", report);
        }
    }
    Ok(())
}

fn cmd_validate(kind: ValueKind, value: &str) -> Result<()> {
    if kind.check(value) {
        println!("valid");
        Ok(())
    } else {
        println!("invalid: {}", kind.message());
        std::process::exit(1);
    }
}

/// Successes go to stdout, problems to stderr
fn print_notification(severity: Severity, message: &str) {
    match severity {
        Severity::Success | Severity::Info => println!("{}", message),
        Severity::Warning | Severity::Error => eprintln!("{}: {}", severity, message),
    }
}

fn open_memberof(config: &DsConsoleConfig, server: Option<&str>) -> Result<MemberOfScreen> {
    let session = config.session(server)?;
    info!("Loading MemberOf Plugin from {}", session.server_id());
    let screen = MemberOfScreen::load(
        session,
        Arc::new(config.runner()),
        Arc::new(print_notification),
        config.tuning(None),
    )?;
    Ok(screen)
}

fn cmd_memberof_show(config: &DsConsoleConfig, server: Option<&str>, json: bool) -> Result<()> {
    let screen = open_memberof(config, server)?;
    if json {
        println!("{}", serde_json::to_string_pretty(screen.saved())?);
    } else {
        print!("{}", screen.render());
    }
    Ok(())
}

impl SettingsArgs {
    /// Push the given settings into the screen's selects and draft
    fn apply(self, screen: &MemberOfScreen) -> Result<()> {
        if let Some(attr) = self.attr {
            screen.set_values(MemberOfField::Attr, &[attr])?;
        }
        let lists = [
            (MemberOfField::GroupAttr, self.groupattr),
            (MemberOfField::EntryScope, self.scope),
            (MemberOfField::ExcludeSubtree, self.exclude),
        ];
        for (field, values) in lists {
            if let Some(values) = values {
                screen.set_values(field, &values)?;
            }
        }
        if let Some(objectclass) = self.autoaddoc {
            screen.set_auto_add_oc(objectclass);
        }
        if let Some(on) = self.allbackends {
            screen.set_all_backends(on);
        }
        if let Some(on) = self.skipnested {
            screen.set_skip_nested(on);
        }
        Ok(())
    }

    /// Overlay the given settings on a config entry's settings
    fn apply_to(self, entry: &mut MemberOfConfig) {
        if let Some(attr) = self.attr {
            entry.attr = attr;
        }
        if let Some(values) = self.groupattr {
            entry.group_attr = values;
        }
        if let Some(values) = self.scope {
            entry.entry_scope = values;
        }
        if let Some(values) = self.exclude {
            entry.exclude_subtree = values;
        }
        if let Some(objectclass) = self.autoaddoc {
            entry.auto_add_oc = objectclass;
        }
        if let Some(on) = self.allbackends {
            entry.all_backends = on;
        }
        if let Some(on) = self.skipnested {
            entry.skip_nested = on;
        }
    }
}

fn cmd_memberof_set(
    config: &DsConsoleConfig,
    server: Option<&str>,
    settings: SettingsArgs,
    config_entry: Option<String>,
) -> Result<()> {
    let mut screen = open_memberof(config, server)?;
    settings.apply(&screen)?;
    if let Some(dn) = config_entry {
        screen.set_config_entry(dn);
    }

    if !screen.is_modified() {
        info!("No changes to save");
        return Ok(());
    }

    screen.save()?;
    print!("{}", screen.render());
    Ok(())
}

fn cmd_config_entry(
    config: &DsConsoleConfig,
    server: Option<&str>,
    command: ConfigEntryCommands,
) -> Result<()> {
    let screen = open_memberof(config, server)?;
    match command {
        ConfigEntryCommands::Show { dn, json } => {
            let Some(entry) = screen.show_config_entry(&dn)? else {
                anyhow::bail!("Config entry {} does not exist", dn);
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                print!("{}", entry);
            }
        }
        ConfigEntryCommands::Add { dn, settings } => {
            let mut entry = MemberOfConfig::default();
            settings.apply_to(&mut entry);
            screen.add_config_entry(&dn, &entry)?;
        }
        ConfigEntryCommands::Set { dn, settings } => {
            let Some(mut entry) = screen.show_config_entry(&dn)? else {
                anyhow::bail!("Config entry {} does not exist; use `config-entry add`", dn);
            };
            settings.apply_to(&mut entry);
            screen.edit_config_entry(&dn, &entry)?;
        }
        ConfigEntryCommands::Delete { dn } => screen.delete_config_entry(&dn)?,
    }
    Ok(())
}

fn cmd_memberof_fixup(
    config: &DsConsoleConfig,
    server: Option<&str>,
    dn: &str,
    filter: Option<&str>,
) -> Result<()> {
    let screen = open_memberof(config, server)?;
    screen.fixup(dn, filter)?;
    Ok(())
}

fn cmd_info(config: &DsConsoleConfig, path: Option<&Path>) -> Result<()> {
    println!("dsconsole");
    println!("=========");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    match path {
        Some(path) => println!("Config:  {}", path.display()),
        None if Path::new(config::DEFAULT_CONFIG_FILE).exists() => {
            println!("Config:  {}", config::DEFAULT_CONFIG_FILE)
        }
        None => println!("Config:  (defaults)"),
    }
    println!();
    print!("{}", config.to_toml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_on_off_values() {
        assert_eq!(parse_on_off("on"), Ok(true));
        assert_eq!(parse_on_off("OFF"), Ok(false));
        assert!(parse_on_off("maybe").is_err());
    }

    #[test]
    fn test_empty_list_flag_clears() {
        let cli = Cli::parse_from([
            "dsconsole",
            "memberof",
            "--server",
            "localhost",
            "set",
            "--scope",
            "--groupattr",
            "member",
            "uniqueMember",
            "--skipnested",
            "on",
        ]);
        let Commands::Memberof { server, command } = cli.command else {
            panic!("expected memberof");
        };
        assert_eq!(server.as_deref(), Some("localhost"));
        let MemberOfCommands::Set { settings, .. } = command else {
            panic!("expected set");
        };
        assert_eq!(
            settings.groupattr,
            Some(vec!["member".to_string(), "uniqueMember".to_string()])
        );
        assert_eq!(settings.scope, Some(Vec::new()));
        assert_eq!(settings.exclude, None);
        assert_eq!(settings.skipnested, Some(true));
    }

    #[test]
    fn test_config_entry_subcommand() {
        let cli = Cli::parse_from([
            "dsconsole",
            "memberof",
            "config-entry",
            "add",
            "cn=memberof shared,cn=config",
            "--attr",
            "memberOf",
            "--groupattr",
            "member",
        ]);
        let Commands::Memberof {
            command: MemberOfCommands::ConfigEntry(ConfigEntryCommands::Add { dn, settings }),
            ..
        } = cli.command
        else {
            panic!("expected config-entry add");
        };
        assert_eq!(dn, "cn=memberof shared,cn=config");

        let mut entry = MemberOfConfig {
            skip_nested: true,
            ..MemberOfConfig::default()
        };
        settings.apply_to(&mut entry);
        assert_eq!(entry.attr, "memberOf");
        assert_eq!(entry.group_attr, vec!["member"]);
        assert!(entry.skip_nested);
    }
}
