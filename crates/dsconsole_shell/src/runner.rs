//! Command execution
//!
//! Every screen talks to the server through a [`CommandRunner`]: an argv
//! goes in, stdout comes out, or the tool's JSON error payload is handed back
//! as a [`CommandError`].

use std::fmt;
use std::io;
use std::process::Command;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

/// Options for a single command run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Run through the configured privilege-elevation prefix
    pub elevated: bool,
}

impl RunOptions {
    pub fn elevated() -> Self {
        Self { elevated: true }
    }
}

/// Error payload printed by the admin tools on failure: `{"desc": .., "info": ..}`
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub info: Option<String>,
}

impl ErrorPayload {
    /// Parse stderr, falling back to the raw text when it is not JSON
    pub fn parse(stderr: &str) -> Self {
        let trimmed = stderr.trim();
        serde_json::from_str(trimmed).unwrap_or_else(|_| Self {
            desc: trimmed.to_owned(),
            info: None,
        })
    }

    /// `desc`, followed by `info` when present
    pub fn message(&self) -> String {
        match self.info.as_deref().filter(|info| !info.is_empty()) {
            Some(info) => format!("{} {}", self.desc, info),
            None => self.desc.clone(),
        }
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Failure of one command run
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Empty command line")]
    Empty,

    #[error("Required binary not found: {0}")]
    NotFound(String),

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The tool ran and reported an error
    #[error("{0}")]
    Failed(ErrorPayload),
}

impl CommandError {
    /// The tool's error payload, if the tool got far enough to print one
    pub fn payload(&self) -> Option<&ErrorPayload> {
        match self {
            CommandError::Failed(payload) => Some(payload),
            _ => None,
        }
    }
}

/// Something that can execute an admin tool command line
pub trait CommandRunner: Send + Sync {
    /// Run `argv` and return its stdout
    fn run(&self, argv: &[String], opts: RunOptions) -> Result<String, CommandError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for Arc<R> {
    fn run(&self, argv: &[String], opts: RunOptions) -> Result<String, CommandError> {
        (**self).run(argv, opts)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, argv: &[String], opts: RunOptions) -> Result<String, CommandError> {
        (**self).run(argv, opts)
    }
}

/// Runs commands as local subprocesses
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    elevate: Vec<String>,
}

impl ProcessRunner {
    /// Runner elevating through `sudo -n`
    pub fn new() -> Self {
        Self {
            elevate: vec!["sudo".to_owned(), "-n".to_owned()],
        }
    }

    /// Runner with a custom elevation prefix (empty runs everything as-is)
    pub fn with_elevate(elevate: Vec<String>) -> Self {
        Self { elevate }
    }

    /// Full command line for `argv`, including the elevation prefix
    pub fn command_line(&self, argv: &[String], opts: RunOptions) -> Vec<String> {
        let prefix: &[String] = if opts.elevated { &self.elevate } else { &[] };
        prefix.iter().chain(argv).cloned().collect()
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, argv: &[String], opts: RunOptions) -> Result<String, CommandError> {
        let line = self.command_line(argv, opts);
        let (program, args) = line.split_first().ok_or(CommandError::Empty)?;

        tracing::debug!(program, elevated = opts.elevated, "running command");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|error| map_spawn_error(program, error))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let payload = ErrorPayload::parse(&String::from_utf8_lossy(&output.stderr));
        tracing::warn!(program, status = ?output.status.code(), error = %payload, "command failed");
        Err(CommandError::Failed(payload))
    }
}

fn map_spawn_error(program: &str, error: io::Error) -> CommandError {
    if error.kind() == io::ErrorKind::NotFound {
        return CommandError::NotFound(program.to_owned());
    }
    CommandError::Spawn {
        program: program.to_owned(),
        source: error,
    }
}

/// Canned responses keyed by argv, recording every call
#[cfg(test)]
pub(crate) mod scripted {
    use super::*;
    use std::sync::Mutex;

    type Response = Result<String, ErrorPayload>;

    #[derive(Default)]
    pub(crate) struct ScriptedRunner {
        responses: Mutex<Vec<(Vec<String>, Response)>>,
        pub(crate) calls: Mutex<Vec<(Vec<String>, RunOptions)>>,
    }

    impl ScriptedRunner {
        /// Answer the next call whose argv contains all of `needle`
        pub(crate) fn respond(&self, needle: &[&str], response: Response) {
            let needle = needle.iter().map(|s| s.to_string()).collect();
            self.responses.lock().unwrap().push((needle, response));
        }

        pub(crate) fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().iter().map(|(argv, _)| argv.clone()).collect()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, argv: &[String], opts: RunOptions) -> Result<String, CommandError> {
            self.calls.lock().unwrap().push((argv.to_vec(), opts));
            let mut responses = self.responses.lock().unwrap();
            let index = responses
                .iter()
                .position(|(needle, _)| needle.iter().all(|part| argv.contains(part)))
                .ok_or_else(|| CommandError::NotFound(argv.join(" ")))?;
            responses.remove(index).1.map_err(CommandError::Failed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_payload_parse_json() {
        let payload = ErrorPayload::parse(
            r#"{"desc": "Invalid syntax", "info": "memberofattr: bad value"}"#,
        );
        assert_eq!(payload.desc, "Invalid syntax");
        assert_eq!(payload.message(), "Invalid syntax memberofattr: bad value");

        let payload = ErrorPayload::parse(r#"{"desc": "No such object"}"#);
        assert_eq!(payload.message(), "No such object");
    }

    #[test]
    fn test_payload_parse_plain_text() {
        let payload = ErrorPayload::parse("  sudo: a password is required\n");
        assert_eq!(payload.desc, "sudo: a password is required");
        assert_eq!(payload.info, None);
    }

    #[test]
    fn test_command_line_prefix() {
        let runner = ProcessRunner::new();
        let cmd = argv(&["dsctl", "-j", "localhost", "status"]);
        assert_eq!(runner.command_line(&cmd, RunOptions::default()), cmd);
        assert_eq!(
            runner.command_line(&cmd, RunOptions::elevated()),
            argv(&["sudo", "-n", "dsctl", "-j", "localhost", "status"])
        );
    }

    #[test]
    fn test_empty_command() {
        let runner = ProcessRunner::with_elevate(Vec::new());
        let err = runner.run(&[], RunOptions::elevated()).unwrap_err();
        assert!(matches!(err, CommandError::Empty));
    }

    #[test]
    fn test_missing_binary() {
        let runner = ProcessRunner::with_elevate(Vec::new());
        let err = runner
            .run(&argv(&["dsconsole-no-such-binary-4711"]), RunOptions::default())
            .unwrap_err();
        assert!(matches!(err, CommandError::NotFound(ref p) if p == "dsconsole-no-such-binary-4711"));
        assert!(err.payload().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_carries_stderr_payload() {
        let runner = ProcessRunner::with_elevate(Vec::new());
        let script = r#"echo '{"desc": "Server is down", "info": "ldapi socket missing"}' >&2; exit 1"#;
        let err = runner
            .run(&argv(&["sh", "-c", script]), RunOptions::default())
            .unwrap_err();
        assert_eq!(
            err.payload().map(ErrorPayload::message).as_deref(),
            Some("Server is down ldapi socket missing")
        );

        let out = runner
            .run(&argv(&["sh", "-c", "printf ok"]), RunOptions::default())
            .unwrap();
        assert_eq!(out, "ok");
    }
}
