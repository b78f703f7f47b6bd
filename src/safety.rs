// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - URL Safety Gate
 * SSRF defense: validates and resolves caller-supplied URLs before any
 * outbound probe is allowed to dial the host
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::net::{IpAddr, Ipv4Addr};

use hickory_resolver::TokioResolver;
use tracing::{debug, warn};
use url::{Host, Url};

/// Why a URL was refused. The string forms are part of the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    InvalidUrl,
    BadScheme(String),
    NoHost,
    NotInAllowlist,
    DnsResolutionFailed,
    ResolvedToPrivateIp(IpAddr),
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::InvalidUrl => write!(f, "invalid_url"),
            BlockReason::BadScheme(scheme) => write!(f, "bad_scheme:{scheme}"),
            BlockReason::NoHost => write!(f, "no_host"),
            BlockReason::NotInAllowlist => write!(f, "not_in_allowlist"),
            BlockReason::DnsResolutionFailed => write!(f, "dns_resolution_failed"),
            BlockReason::ResolvedToPrivateIp(ip) => {
                write!(f, "resolved_to_private_ip:{ip}")
            }
        }
    }
}

/// Per-request verdict. Allowed decisions carry the validated address set so
/// downstream probes can dial a vetted IP instead of re-resolving.
#[derive(Debug, Clone)]
pub enum SafetyDecision {
    Allowed { resolved_addrs: Vec<IpAddr> },
    Blocked { reason: BlockReason },
}

impl SafetyDecision {
    pub fn allowed(&self) -> bool {
        matches!(self, SafetyDecision::Allowed { .. })
    }

    /// Contract string: `ok` for allowed decisions, the block reason otherwise
    pub fn reason_str(&self) -> String {
        match self {
            SafetyDecision::Allowed { .. } => "ok".to_string(),
            SafetyDecision::Blocked { reason } => reason.to_string(),
        }
    }
}

/// Validates URLs against scheme, allowlist and resolved-address policy.
/// Re-evaluated on every call: DNS answers change between requests.
pub struct UrlSafetyGate {
    resolver: TokioResolver,
    allowlist: Vec<String>,
}

impl UrlSafetyGate {
    pub fn new(resolver: TokioResolver, allowlist: Vec<String>) -> Self {
        let allowlist = allowlist
            .into_iter()
            .map(|d| d.to_lowercase().trim_end_matches('.').to_string())
            .filter(|d| !d.is_empty())
            .collect();
        Self {
            resolver,
            allowlist,
        }
    }

    /// Validate a URL for outbound fetching
    pub async fn evaluate(&self, url: &str) -> SafetyDecision {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(url = url, error = %e, "URL failed to parse");
                return SafetyDecision::Blocked {
                    reason: BlockReason::InvalidUrl,
                };
            }
        };

        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return SafetyDecision::Blocked {
                reason: BlockReason::BadScheme(scheme.to_string()),
            };
        }

        let Some(host) = parsed.host() else {
            return SafetyDecision::Blocked {
                reason: BlockReason::NoHost,
            };
        };

        if !self.allowlist.is_empty() {
            let normalized = match &host {
                Host::Domain(domain) => {
                    domain.to_lowercase().trim_end_matches('.').to_string()
                }
                Host::Ipv4(ip) => ip.to_string(),
                Host::Ipv6(ip) => ip.to_string(),
            };
            if !self.allowlist.contains(&normalized) {
                return SafetyDecision::Blocked {
                    reason: BlockReason::NotInAllowlist,
                };
            }
        }

        let resolved_addrs: Vec<IpAddr> = match host {
            Host::Ipv4(ip) => vec![IpAddr::V4(ip)],
            Host::Ipv6(ip) => vec![IpAddr::V6(ip)],
            Host::Domain(domain) => match self.resolver.lookup_ip(domain).await {
                Ok(lookup) => lookup.iter().collect(),
                Err(e) => {
                    debug!(host = domain, error = %e, "DNS resolution failed");
                    Vec::new()
                }
            },
        };

        if resolved_addrs.is_empty() {
            return SafetyDecision::Blocked {
                reason: BlockReason::DnsResolutionFailed,
            };
        }

        for addr in &resolved_addrs {
            if ip_is_private(*addr) {
                warn!(url = url, addr = %addr, "URL resolved to private address space");
                return SafetyDecision::Blocked {
                    reason: BlockReason::ResolvedToPrivateIp(*addr),
                };
            }
        }

        SafetyDecision::Allowed { resolved_addrs }
    }
}

/// True if the address must never be dialed: private-range, loopback,
/// link-local, reserved, multicast or unspecified.
pub fn ip_is_private(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => ipv4_is_private(v4),
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return ipv4_is_private(mapped);
            }
            let segments = v6.segments();
            v6.is_loopback()
                || v6.is_multicast()
                || v6.is_unspecified()
                || (segments[0] & 0xfe00) == 0xfc00 // fc00::/7 unique local
                || (segments[0] & 0xffc0) == 0xfe80 // fe80::/10 link-local
                || (segments[0] == 0x2001 && segments[1] == 0xdb8) // 2001:db8::/32 documentation
        }
    }
}

fn ipv4_is_private(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        || octets[0] >= 240 // 240.0.0.0/4 reserved
        || (octets[0] == 100 && (octets[1] & 0xc0) == 64) // 100.64.0.0/10 shared
        || (octets[0] == 198 && (octets[1] & 0xfe) == 18) // 198.18.0.0/15 benchmarking
        || (octets[0] == 192 && octets[1] == 0 && octets[2] == 0) // 192.0.0.0/24 IETF
}

/// String-level classifier for addresses that arrive untyped. Unparsable
/// input is treated as private.
pub fn ip_str_is_private(addr: &str) -> bool {
    addr.parse::<IpAddr>().map(ip_is_private).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_resolver::config::ResolverConfig;
    use hickory_resolver::name_server::TokioConnectionProvider;

    fn test_gate(allowlist: Vec<String>) -> UrlSafetyGate {
        let resolver = TokioResolver::builder_with_config(
            ResolverConfig::default(),
            TokioConnectionProvider::default(),
        )
        .build();
        UrlSafetyGate::new(resolver, allowlist)
    }

    #[test]
    fn test_private_ipv4_classification() {
        for addr in [
            "10.0.0.1",
            "172.16.5.5",
            "192.168.1.1",
            "127.0.0.1",
            "169.254.169.254",
            "0.0.0.0",
            "224.0.0.1",
            "255.255.255.255",
            "240.0.0.1",
            "100.64.0.1",
            "198.18.0.1",
            "192.0.0.8",
        ] {
            assert!(ip_str_is_private(addr), "{addr} should be private");
        }
    }

    #[test]
    fn test_public_ipv4_classification() {
        for addr in ["1.1.1.1", "8.8.8.8", "93.184.216.34", "198.41.0.4"] {
            assert!(!ip_str_is_private(addr), "{addr} should be public");
        }
    }

    #[test]
    fn test_private_ipv6_classification() {
        for addr in ["::1", "::", "fe80::1", "fc00::1", "fd12:3456::1", "ff02::1", "2001:db8::1"] {
            assert!(ip_str_is_private(addr), "{addr} should be private");
        }
        assert!(!ip_str_is_private("2606:4700:4700::1111"));
    }

    #[test]
    fn test_mapped_ipv4_in_ipv6_classified_as_embedded_v4() {
        assert!(ip_str_is_private("::ffff:127.0.0.1"));
        assert!(ip_str_is_private("::ffff:192.168.0.1"));
        assert!(!ip_str_is_private("::ffff:1.1.1.1"));
    }

    #[test]
    fn test_unparsable_address_treated_as_private() {
        assert!(ip_str_is_private("not-an-ip"));
        assert!(ip_str_is_private(""));
        assert!(ip_str_is_private("999.1.1.1"));
    }

    #[tokio::test]
    async fn test_gate_rejects_bad_scheme() {
        let gate = test_gate(Vec::new());
        let decision = gate.evaluate("ftp://example.com").await;
        assert!(!decision.allowed());
        assert_eq!(decision.reason_str(), "bad_scheme:ftp");
    }

    #[tokio::test]
    async fn test_gate_rejects_invalid_url() {
        let gate = test_gate(Vec::new());
        let decision = gate.evaluate("not a url").await;
        assert!(!decision.allowed());
        assert_eq!(decision.reason_str(), "invalid_url");
    }

    #[tokio::test]
    async fn test_gate_rejects_loopback_literal() {
        let gate = test_gate(Vec::new());
        let decision = gate.evaluate("http://127.0.0.1/").await;
        assert!(!decision.allowed());
        assert_eq!(decision.reason_str(), "resolved_to_private_ip:127.0.0.1");
    }

    #[tokio::test]
    async fn test_gate_rejects_link_local_metadata_literal() {
        let gate = test_gate(Vec::new());
        let decision = gate.evaluate("http://169.254.169.254/").await;
        assert!(!decision.allowed());
        assert_eq!(
            decision.reason_str(),
            "resolved_to_private_ip:169.254.169.254"
        );
    }

    #[tokio::test]
    async fn test_gate_allows_public_ip_literal() {
        let gate = test_gate(Vec::new());
        let decision = gate.evaluate("https://1.1.1.1/").await;
        assert!(decision.allowed());
        assert_eq!(decision.reason_str(), "ok");
        match decision {
            SafetyDecision::Allowed { resolved_addrs } => {
                assert_eq!(resolved_addrs, vec!["1.1.1.1".parse::<IpAddr>().unwrap()]);
            }
            SafetyDecision::Blocked { .. } => panic!("expected allowed"),
        }
    }

    #[tokio::test]
    async fn test_gate_enforces_allowlist() {
        let gate = test_gate(vec!["Example.COM.".to_string()]);

        let decision = gate.evaluate("https://other.org/").await;
        assert!(!decision.allowed());
        assert_eq!(decision.reason_str(), "not_in_allowlist");

        // Allowlisted IP literals still go through address classification
        let gate = test_gate(vec!["1.1.1.1".to_string()]);
        let decision = gate.evaluate("https://1.1.1.1/").await;
        assert!(decision.allowed());
    }

    #[tokio::test]
    async fn test_empty_allowlist_is_open_policy() {
        let gate = test_gate(Vec::new());
        let decision = gate.evaluate("https://8.8.8.8/").await;
        assert!(decision.allowed());
    }
}
