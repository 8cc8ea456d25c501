//! Value kinds accepted by `dsconsole validate` and replay create validators

use clap::ValueEnum;
use serde::Deserialize;

use dsconsole_core::validate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    /// LDAP distinguished name
    Dn,
    /// TCP port, 1-65535
    Port,
    Hostname,
    /// IPv4 or IPv6 address
    Ip,
    /// `ldap:///` URL
    LdapUrl,
    /// Absolute file path
    Path,
    /// File name without path separators or odd characters
    FileName,
}

impl ValueKind {
    pub fn check(self, value: &str) -> bool {
        match self {
            ValueKind::Dn => validate::valid_dn(value),
            ValueKind::Port => validate::valid_port(value),
            ValueKind::Hostname => validate::is_valid_hostname(value),
            ValueKind::Ip => validate::is_valid_ip_address(value),
            ValueKind::LdapUrl => validate::is_valid_ldap_url(value),
            ValueKind::Path => validate::file_is_path(value),
            ValueKind::FileName => !validate::bad_file_name(value),
        }
    }

    /// Message shown when a created value fails this check
    pub fn message(self) -> &'static str {
        match self {
            ValueKind::Dn => "Value must be a valid DN",
            ValueKind::Port => "Value must be a valid port number",
            ValueKind::Hostname => "Value must be a valid hostname",
            ValueKind::Ip => "Value must be a valid IP address",
            ValueKind::LdapUrl => "Value must be an LDAP URL",
            ValueKind::Path => "Value must be an absolute path",
            ValueKind::FileName => "Value must be a plain file name",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checks_dispatch() {
        assert!(ValueKind::Dn.check("ou=groups,dc=example,dc=com"));
        assert!(!ValueKind::Dn.check("groups"));
        assert!(ValueKind::Port.check("389"));
        assert!(!ValueKind::Port.check("70000"));
        assert!(ValueKind::LdapUrl.check("ldap:///dc=example,dc=com??sub?(uid=*)"));
    }

    #[test]
    fn test_kebab_case_names() {
        let kind: ValueKind = serde_json::from_str("\"ldap-url\"").unwrap();
        assert_eq!(kind, ValueKind::LdapUrl);
        assert_eq!(ValueKind::from_str("file-name", false), Ok(ValueKind::FileName));
    }
}
