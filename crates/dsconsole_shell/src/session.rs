//! Server session context
//!
//! A [`ServerSession`] names the directory server instance a screen works on
//! and the tool binaries used to reach it. It is passed explicitly to every
//! screen; nothing in the shell keeps a process-wide current server.

use serde::{Deserialize, Serialize};

use crate::dsconf::DsCommand;
use crate::error::{Result, ShellError};

/// Admin tool binaries
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub dsconf: String,
    pub dsctl: String,
    pub ldapsearch: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            dsconf: "dsconf".to_owned(),
            dsctl: "dsctl".to_owned(),
            ldapsearch: "ldapsearch".to_owned(),
        }
    }
}

/// The instance a screen is bound to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerSession {
    server_id: String,
    tools: ToolPaths,
}

impl ServerSession {
    /// Bind to an instance id such as `localhost` (the part after `slapd-`)
    pub fn new(server_id: impl Into<String>) -> Result<Self> {
        let server_id = server_id.into();
        let server_id = server_id.strip_prefix("slapd-").unwrap_or(&server_id).to_owned();
        if server_id.is_empty()
            || !server_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(ShellError::Invalid(format!(
                "not a valid server instance id: {:?}",
                server_id
            )));
        }
        Ok(Self {
            server_id,
            tools: ToolPaths::default(),
        })
    }

    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// LDAPI socket URL of the instance
    pub fn ldapi_url(&self) -> String {
        format!("ldapi://%2fvar%2frun%2fslapd-{}.socket", self.server_id)
    }

    /// `dsconf -j <ldapi-url>` for this instance
    pub fn dsconf(&self) -> DsCommand {
        DsCommand::new(&self.tools.dsconf).args(["-j".to_owned(), self.ldapi_url()])
    }

    /// `dsctl -j <server-id>` for this instance
    pub fn dsctl(&self) -> DsCommand {
        DsCommand::new(&self.tools.dsctl).args(["-j", self.server_id.as_str()])
    }

    /// Base-scope `ldapsearch` of `base` over LDAPI with SASL EXTERNAL
    pub fn ldapsearch_base(&self, base: &str) -> DsCommand {
        DsCommand::new(&self.tools.ldapsearch)
            .args(["-LLL", "-Y", "EXTERNAL", "-H"])
            .arg(self.ldapi_url())
            .args(["-b", base, "-s", "base", "dn"])
    }
}
