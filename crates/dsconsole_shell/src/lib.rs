//! # dsconsole Shell
//!
//! Everything around the components that talks to a directory server:
//!
//! - **Session**: the explicit server context every screen is bound to
//! - **Runner**: executes `dsconf`/`dsctl` and parses their error payloads
//! - **Notifications**: severity-tagged messages for the user
//! - **Screens**: plugin configuration forms built from typeahead selects
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dsconsole_cn::SelectTuning;
//! use dsconsole_shell::{MemberOfScreen, ProcessRunner, ServerSession, TracingSink};
//!
//! # fn main() -> dsconsole_shell::Result<()> {
//! let session = ServerSession::new("localhost")?;
//! let screen = MemberOfScreen::load(
//!     session,
//!     Arc::new(ProcessRunner::new()),
//!     Arc::new(TracingSink),
//!     SelectTuning::default(),
//! )?;
//! println!("{}", screen.render());
//! # Ok(())
//! # }
//! ```

pub mod dsconf;
pub mod error;
pub mod notify;
pub mod runner;
pub mod screens;
pub mod session;

pub use dsconf::{log_cmd, DsCommand, DELETE_VALUE};
pub use error::{Result, ShellError};
pub use notify::{NotificationLog, NotificationSink, Severity, TracingSink};
pub use runner::{CommandError, CommandRunner, ErrorPayload, ProcessRunner, RunOptions};
pub use screens::{EntryAction, MemberOfConfig, MemberOfField, MemberOfScreen, PluginEntry};
pub use session::{ServerSession, ToolPaths};
