//! dsconf / dsctl command lines
//!
//! The admin tools take list-valued options as a flag followed by every
//! value; an emptied list is sent as the single value `delete`.

use std::fmt;

/// Value that tells the admin tools to remove an attribute
pub const DELETE_VALUE: &str = "delete";

/// An admin tool argv under construction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DsCommand {
    argv: Vec<String>,
}

impl DsCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            argv: vec![program.into()],
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.argv.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
        self
    }

    /// `flag value`, or `flag delete` when the value is empty
    pub fn value_or_delete(self, flag: &str, value: &str) -> Self {
        let value = if value.is_empty() { DELETE_VALUE } else { value };
        self.args([flag, value])
    }

    /// `flag v1 v2 ..`, or `flag delete` when the list is empty
    pub fn values_or_delete<S: AsRef<str>>(self, flag: &str, values: &[S]) -> Self {
        if values.is_empty() {
            return self.args([flag, DELETE_VALUE]);
        }
        self.arg(flag).args(values.iter().map(|v| v.as_ref()))
    }

    /// `flag on` / `flag off`
    pub fn on_off(self, flag: &str, on: bool) -> Self {
        self.args([flag, if on { "on" } else { "off" }])
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn into_argv(self) -> Vec<String> {
        self.argv
    }
}

impl fmt::Display for DsCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv.join(" "))
    }
}

/// Log a command before running it
pub fn log_cmd(func: &str, desc: &str, argv: &[String]) {
    tracing::debug!(target: "dsconsole::cmd", "CMD: {}: {} ==> {:?}", func, desc, argv);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_values() {
        let cmd = DsCommand::new("dsconf")
            .values_or_delete("--groupattr", &["member", "uniqueMember"])
            .values_or_delete::<&str>("--scope", &[]);
        assert_eq!(
            cmd.argv(),
            ["dsconf", "--groupattr", "member", "uniqueMember", "--scope", "delete"]
        );
    }

    #[test]
    fn test_scalar_values() {
        let cmd = DsCommand::new("dsconf")
            .value_or_delete("--attr", "memberOf")
            .value_or_delete("--autoaddoc", "")
            .on_off("--skipnested", false);
        assert_eq!(cmd.to_string(), "dsconf --attr memberOf --autoaddoc delete --skipnested off");
    }
}
