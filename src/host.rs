//! Classification of host strings into Subject Alternative Name categories.
//!
//! Each input maps to exactly one [`HostEntry`], tried in the order IP literal,
//! bare email address, URI with scheme and host, then DNS name.

use std::fmt;
use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DevCertError, Result};

static HOSTNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\*\.)?[0-9a-z_-]([0-9a-z._-]*[0-9a-z_-])?$").expect("valid regex")
});

// RFC 5322 dot-atom on both sides of the `@`.
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    let atom = r"[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+";
    Regex::new(&format!(r"^{atom}(\.{atom})*@{atom}(\.{atom})*$")).expect("valid regex")
});

static SECOND_LEVEL_WILDCARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\*\.[0-9a-z_-]+$").expect("valid regex"));

/// A host string after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEntry {
    IpAddress(IpAddr),
    EmailAddress(String),
    Uri(String),
    /// ASCII (IDNA-encoded) DNS name, optionally with a leading `*.` label.
    DnsName(String),
}

impl HostEntry {
    /// Classifies a single host string.
    ///
    /// Returns a `ValidationError` naming the input when it is none of the four kinds.
    pub fn classify(input: &str) -> Result<Self> {
        if let Ok(ip) = input.parse::<IpAddr>() {
            return Ok(HostEntry::IpAddress(normalize_ip(ip)));
        }
        if EMAIL.is_match(input) {
            return Ok(HostEntry::EmailAddress(input.to_string()));
        }
        if let Ok(uri) = url::Url::parse(input) {
            if uri.host_str().is_some_and(|host| !host.is_empty()) {
                let uri = if input.is_ascii() {
                    input.to_string()
                } else {
                    uri.to_string()
                };
                return Ok(HostEntry::Uri(uri));
            }
        }

        let name = to_ascii(input)?;
        if !HOSTNAME.is_match(&name) {
            return Err(DevCertError::ValidationError(format!(
                "{input:?} is not a valid hostname, IP, URL or email"
            )));
        }
        Ok(HostEntry::DnsName(name))
    }

    /// Whether this entry makes the certificate usable for server authentication.
    pub fn is_server_name(&self) -> bool {
        match self {
            HostEntry::IpAddress(_) | HostEntry::Uri(_) | HostEntry::DnsName(_) => true,
            HostEntry::EmailAddress(_) => false,
        }
    }
}

impl fmt::Display for HostEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEntry::IpAddress(ip) => write!(f, "{ip}"),
            HostEntry::EmailAddress(value) | HostEntry::Uri(value) | HostEntry::DnsName(value) => {
                f.write_str(value)
            }
        }
    }
}

/// IPv4-mapped IPv6 literals are stored in their four-octet form.
fn normalize_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
        IpAddr::V4(_) => ip,
    }
}

fn to_ascii(input: &str) -> Result<String> {
    if input.is_ascii() {
        return Ok(input.to_string());
    }
    let (wildcard, rest) = match input.strip_prefix("*.") {
        Some(rest) => ("*.", rest),
        None => ("", input),
    };
    match url::Host::parse(rest) {
        Ok(url::Host::Domain(domain)) => Ok(format!("{wildcard}{domain}")),
        Ok(_) => Err(DevCertError::ValidationError(format!(
            "{input:?} is not a valid hostname, IP, URL or email"
        ))),
        Err(e) => Err(DevCertError::ValidationError(format!(
            "{input:?} is not a valid hostname, IP, URL or email: {e}"
        ))),
    }
}

/// Classifies every host, preserving order and failing on the first invalid entry.
pub fn classify_hosts<S: AsRef<str>>(hosts: &[S]) -> Result<Vec<HostEntry>> {
    if hosts.is_empty() {
        return Err(DevCertError::ValidationError(
            "at least one host is required".to_string(),
        ));
    }
    hosts
        .iter()
        .map(|host| HostEntry::classify(host.as_ref()))
        .collect()
}

/// Hosts for the common name, file name and messages: IP addresses and emails as
/// written, DNS names and URIs in the form placed in the SAN.
pub fn display_names<S: AsRef<str>>(inputs: &[S], entries: &[HostEntry]) -> Vec<String> {
    inputs
        .iter()
        .zip(entries)
        .map(|(input, entry)| match entry {
            HostEntry::DnsName(name) | HostEntry::Uri(name) => name.clone(),
            HostEntry::IpAddress(_) | HostEntry::EmailAddress(_) => input.as_ref().to_string(),
        })
        .collect()
}

/// Non-fatal advice about wildcard names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostHint {
    /// Many browsers refuse wildcards directly below a top-level domain.
    SecondLevelWildcard(String),
    /// Wildcards match exactly one label.
    WildcardDepth(String),
}

impl fmt::Display for HostHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostHint::SecondLevelWildcard(host) => write!(
                f,
                "many browsers don't support second-level wildcards like {host:?}"
            ),
            HostHint::WildcardDepth(suffix) => write!(
                f,
                "X.509 wildcards only go one level deep, so this won't match a.b.{suffix}"
            ),
        }
    }
}

/// Collects wildcard hints for the given hosts; at most one depth reminder is produced.
pub fn host_hints(hosts: &[HostEntry]) -> Vec<HostHint> {
    let mut hints: Vec<HostHint> = hosts
        .iter()
        .filter_map(|host| match host {
            HostEntry::DnsName(name) if SECOND_LEVEL_WILDCARD.is_match(name) => {
                Some(HostHint::SecondLevelWildcard(name.clone()))
            }
            _ => None,
        })
        .collect();

    let first_wildcard = hosts.iter().find_map(|host| match host {
        HostEntry::DnsName(name) => name.strip_prefix("*."),
        _ => None,
    });
    if let Some(suffix) = first_wildcard {
        hints.push(HostHint::WildcardDepth(suffix.to_string()));
    }
    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_is_order_preserving() {
        let hosts = [
            "example.com",
            "*.example.com",
            "example.test",
            "localhost",
            "127.0.0.1",
            "::1",
        ];
        let entries = classify_hosts(&hosts).unwrap();
        assert_eq!(
            entries,
            vec![
                HostEntry::DnsName("example.com".into()),
                HostEntry::DnsName("*.example.com".into()),
                HostEntry::DnsName("example.test".into()),
                HostEntry::DnsName("localhost".into()),
                HostEntry::IpAddress("127.0.0.1".parse().unwrap()),
                HostEntry::IpAddress("::1".parse().unwrap()),
            ]
        );
        let rendered: Vec<String> = entries.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, hosts);
    }

    #[test]
    fn test_precedence() {
        assert!(matches!(
            HostEntry::classify("filippo@example.com").unwrap(),
            HostEntry::EmailAddress(_)
        ));
        assert!(matches!(
            HostEntry::classify("https://example.com/path").unwrap(),
            HostEntry::Uri(_)
        ));
        assert!(matches!(
            HostEntry::classify("spiffe://cluster.local/ns/default").unwrap(),
            HostEntry::Uri(_)
        ));
        assert!(matches!(
            HostEntry::classify("under_score.example").unwrap(),
            HostEntry::DnsName(_)
        ));
    }

    #[test]
    fn test_mapped_ipv4_is_stored_short() {
        assert_eq!(
            HostEntry::classify("::ffff:10.0.0.1").unwrap(),
            HostEntry::IpAddress("10.0.0.1".parse().unwrap())
        );
    }

    #[test]
    fn test_idna() {
        assert_eq!(
            HostEntry::classify("bücher.example").unwrap(),
            HostEntry::DnsName("xn--bcher-kva.example".into())
        );
        assert_eq!(
            HostEntry::classify("*.bücher.example").unwrap(),
            HostEntry::DnsName("*.xn--bcher-kva.example".into())
        );
    }

    #[test]
    fn test_rejects_invalid() {
        for bad in ["exa mple.com", "exa!mple", "foo.", "*.*.example.com", "a:b", "name@"] {
            let err = HostEntry::classify(bad).unwrap_err();
            assert!(
                matches!(&err, DevCertError::ValidationError(msg) if msg.contains(bad)),
                "{bad}: {err}"
            );
        }
    }

    #[test]
    fn test_display_names_keep_ip_text() {
        let inputs = ["::ffff:10.0.0.1", "bücher.example", "me@example.com"];
        let entries = classify_hosts(&inputs).unwrap();
        assert_eq!(entries[0], HostEntry::IpAddress("10.0.0.1".parse().unwrap()));
        assert_eq!(
            display_names(&inputs, &entries),
            vec!["::ffff:10.0.0.1", "xn--bcher-kva.example", "me@example.com"]
        );
    }

    #[test]
    fn test_empty_list_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            classify_hosts(&empty),
            Err(DevCertError::ValidationError(_))
        ));
    }

    #[test]
    fn test_hints() {
        let hosts = classify_hosts(&["*.com", "*.example.com", "example.org"]).unwrap();
        assert_eq!(
            host_hints(&hosts),
            vec![
                HostHint::SecondLevelWildcard("*.com".into()),
                HostHint::WildcardDepth("com".into()),
            ]
        );
        assert!(host_hints(&classify_hosts(&["example.org"]).unwrap()).is_empty());
    }
}
