// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Signal Probes
 * Domain-age, certificate, cipher and DNS probes behind one suite trait
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod certificate;
pub mod cipher;
pub mod dns;
pub mod domain_age;

use std::net::IpAddr;

use anyhow::Result;
use async_trait::async_trait;
use hickory_resolver::TokioResolver;
use tokio::net::TcpStream;
use url::Url;

use crate::config::ProbeConfig;
use crate::types::{CertInfo, CipherInfo, DnsInfo, DomainInfo};

pub use certificate::CertificateProbe;
pub use cipher::CipherProbe;
pub use dns::DnsProbe;
pub use domain_age::DomainAgeProbe;

/// The four signal probes as one injectable seam. Implementations never
/// error: failures surface inside the returned result shapes.
#[async_trait]
pub trait ProbeSuite: Send + Sync {
    async fn domain_age(&self, domain: &str) -> DomainInfo;
    async fn certificate(&self, host: &str, port: u16, pinned: &[IpAddr]) -> CertInfo;
    async fn cipher(&self, host: &str, port: u16, pinned: &[IpAddr]) -> CipherInfo;
    async fn dns(&self, domain: &str) -> DnsInfo;
}

/// Production probe suite wired from configuration
pub struct LiveProbes {
    domain_age: DomainAgeProbe,
    certificate: CertificateProbe,
    cipher: CipherProbe,
    dns: DnsProbe,
}

impl LiveProbes {
    pub fn new(config: &ProbeConfig, resolver: TokioResolver) -> Result<Self> {
        Ok(Self {
            domain_age: DomainAgeProbe::new(config)?,
            certificate: CertificateProbe::new(config),
            cipher: CipherProbe::new(config),
            dns: DnsProbe::new(config, resolver),
        })
    }
}

#[async_trait]
impl ProbeSuite for LiveProbes {
    async fn domain_age(&self, domain: &str) -> DomainInfo {
        self.domain_age.check(domain).await
    }

    async fn certificate(&self, host: &str, port: u16, pinned: &[IpAddr]) -> CertInfo {
        self.certificate.check(host, port, pinned).await
    }

    async fn cipher(&self, host: &str, port: u16, pinned: &[IpAddr]) -> CipherInfo {
        self.cipher.check(host, port, pinned).await
    }

    async fn dns(&self, domain: &str) -> DnsInfo {
        self.dns.check(domain).await
    }
}

/// Normalize user input into a bare registrable domain: lower-case, strip
/// scheme, `www.` prefix and trailing dot.
pub fn normalize_domain(input: &str) -> String {
    let mut domain = input.trim().to_lowercase();

    if domain.starts_with("http://") || domain.starts_with("https://") {
        if let Ok(url) = Url::parse(&domain) {
            if let Some(host) = url.host_str() {
                domain = host.to_string();
            }
        }
    }

    let domain = domain.trim_end_matches('.');
    let domain = domain.strip_prefix("www.").unwrap_or(domain);
    domain.to_string()
}

/// Basic domain-shape validation before spending network time
pub fn is_valid_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > 253 {
        return false;
    }
    if domain.contains(' ') || domain.contains("..") {
        return false;
    }
    if domain.starts_with("http://") || domain.starts_with("https://") {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

/// Open a TCP connection to one of the gate-validated addresses, falling
/// back to hostname connect only when no pinned address is supplied.
pub(crate) async fn connect_pinned(
    host: &str,
    port: u16,
    pinned: &[IpAddr],
) -> std::io::Result<TcpStream> {
    if pinned.is_empty() {
        return TcpStream::connect((host, port)).await;
    }

    let mut last_err = None;
    for addr in pinned {
        match TcpStream::connect((*addr, port)).await {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            "no pinned addresses reachable",
        )
    }))
}
