//! Form validation helpers
//!
//! Pure checks used by the console's forms before a value is handed to the
//! directory server tools. None of these talk to the server; they only catch
//! input that can never be valid.

use std::net::Ipv6Addr;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

fn hostname_regex() -> &'static Regex {
    static HOSTNAME: OnceLock<Regex> = OnceLock::new();
    HOSTNAME.get_or_init(|| {
        Regex::new(
            r"^(\*|((25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)|(\*\.)?([a-zA-Z0-9-]+\.){0,5}[a-zA-Z0-9-]+\.[a-zA-Z]{2,63})$",
        )
        .expect("static regex is valid")
    })
}

fn attribute_type_regex() -> &'static Regex {
    static ATTR_TYPE: OnceLock<Regex> = OnceLock::new();
    ATTR_TYPE.get_or_init(|| {
        // descriptor (cn, nsslapd-suffix) or numeric OID (2.5.4.3)
        Regex::new(r"^([A-Za-z][A-Za-z0-9-]*|[0-9]+(\.[0-9]+)*)$").expect("static regex is valid")
    })
}

/// Split on separators that are not escaped with a backslash
fn split_unescaped(value: &str, separators: &[char]) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for c in value.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            current.push(c);
            escaped = true;
        } else if separators.contains(&c) {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

/// Check that a value looks like a distinguished name.
///
/// Every RDN (and every `+`-joined attribute value assertion inside it) must
/// be `type=value` with a non-empty value. Escaped separators are allowed.
pub fn valid_dn(dn: &str) -> bool {
    let dn = dn.trim();
    if dn.is_empty() {
        return false;
    }

    split_unescaped(dn, &[',']).iter().all(|rdn| {
        split_unescaped(rdn, &['+']).iter().all(|ava| {
            let Some((attr, value)) = ava.split_once('=') else {
                return false;
            };
            attribute_type_regex().is_match(attr.trim()) && !value.trim().is_empty()
        })
    })
}

/// DN of the entry one level up; `None` for a single-RDN DN
pub fn parent_dn(dn: &str) -> Option<String> {
    let rdns = split_unescaped(dn.trim(), &[',']);
    if rdns.len() < 2 {
        return None;
    }
    let parent: Vec<&str> = rdns[1..].iter().map(|rdn| rdn.trim()).collect();
    Some(parent.join(","))
}

/// Check that a value is a TCP port (1-65535)
pub fn valid_port(value: &str) -> bool {
    valid_num_range(value, 1, 65535)
}

/// Check that a value is an integer within `min..=max`
pub fn valid_num_range(value: &str, min: i64, max: i64) -> bool {
    match value.trim().parse::<i64>() {
        Ok(number) => (min..=max).contains(&number),
        Err(_) => false,
    }
}

/// True when a value cannot be used as a plain file name (it is empty,
/// contains a path separator, or names a directory entry like `..`)
pub fn bad_file_name(file_name: &str) -> bool {
    file_name.is_empty()
        || file_name.contains('/')
        || file_name == "."
        || file_name == ".."
        || file_name.chars().any(char::is_control)
}

/// True when a value is an absolute path to a file (not a directory)
pub fn file_is_path(file_name: &str) -> bool {
    file_name.len() > 1 && file_name.starts_with('/') && !file_name.ends_with('/')
}

/// Check a hostname, IPv4 address, or wildcard host (`*`, `*.example.com`)
pub fn is_valid_hostname(hostname: &str) -> bool {
    hostname_regex().is_match(hostname)
}

fn is_octet(part: &str) -> bool {
    (1..=3).contains(&part.len())
        && part.chars().all(|c| c.is_ascii_digit())
        && part.parse::<u16>().map(|n| n <= 255).unwrap_or(false)
}

/// Check an IP address as used by host-based access rules.
///
/// IPv4 accepts full and partial addresses with an optional trailing
/// wildcard (`10.0.0.1`, `192.168.1`, `192.168.1.*`); IPv6 accepts any
/// address, including link-local addresses with a zone (`fe80::1%eth0`).
pub fn is_valid_ip_address(address: &str) -> bool {
    if address.contains(':') {
        let (addr, zone) = match address.split_once('%') {
            Some((addr, zone)) => (addr, Some(zone)),
            None => (address, None),
        };
        if let Some(zone) = zone {
            if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphanumeric()) {
                return false;
            }
        }
        return Ipv6Addr::from_str(addr).is_ok();
    }

    let dots = address.matches('.').count();
    if !(2..=3).contains(&dots) {
        return false;
    }
    let octets = address.strip_suffix(".*").unwrap_or(address);
    let parts: Vec<&str> = octets.split('.').collect();
    (2..=4).contains(&parts.len()) && parts.iter().all(|p| is_octet(p))
}

/// Check an LDAP URL of the form `ldap:///<dn>?...`
pub fn is_valid_ldap_url(url: &str) -> bool {
    url.starts_with("ldap:///")
}

/// Compare two value lists ignoring order
pub fn lists_equal<A, B>(left: &[A], right: &[B]) -> bool
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    if left.len() != right.len() {
        return false;
    }
    let mut left: Vec<&str> = left.iter().map(AsRef::as_ref).collect();
    let mut right: Vec<&str> = right.iter().map(AsRef::as_ref).collect();
    left.sort_unstable();
    right.sort_unstable();
    left == right
}
