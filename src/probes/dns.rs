// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

// DNS Posture Probe
// Record completeness and email authentication analysis
// © 2026 Bountyy Oy

use std::time::Duration;

use hickory_resolver::TokioResolver;
use tracing::{debug, info};

use crate::config::ProbeConfig;
use crate::probes::{is_valid_domain, normalize_domain};
use crate::types::{DnsInfo, DnsReliability, MxRecord};

/// Common DKIM selectors checked under `_domainkey`
const DKIM_SELECTORS: &[&str] = &[
    "default", "google", "k1", "dkim", "mail", "selector1", "selector2", "s1", "s2",
];

pub struct DnsProbe {
    resolver: TokioResolver,
    timeout: Duration,
}

impl DnsProbe {
    pub fn new(config: &ProbeConfig, resolver: TokioResolver) -> Self {
        Self {
            resolver,
            timeout: Duration::from_secs(config.dns_timeout_secs),
        }
    }

    /// Query record sets and score configuration completeness
    pub async fn check(&self, domain: &str) -> DnsInfo {
        let hostname = normalize_domain(domain);
        if !is_valid_domain(&hostname) {
            return DnsInfo::failed(format!("invalid domain: {hostname}"));
        }

        info!(domain = %hostname, "Starting DNS posture check");

        match tokio::time::timeout(self.timeout, self.query_all(&hostname)).await {
            Ok(mut result) => {
                let (score, reliability) = calculate_dns_score(&result);
                result.dns_score = score;
                result.dns_reliability = reliability;

                if result.a_records.is_empty()
                    && result.aaaa_records.is_empty()
                    && result.mx_records.is_empty()
                    && result.ns_records.is_empty()
                {
                    result.error = Some("No DNS records found".to_string());
                }

                info!(
                    domain = %hostname,
                    score = result.dns_score,
                    a = result.a_records.len(),
                    mx = result.mx_records.len(),
                    ns = result.ns_records.len(),
                    "DNS posture check complete"
                );
                result
            }
            Err(_) => DnsInfo::failed("DNS query timeout"),
        }
    }

    async fn query_all(&self, hostname: &str) -> DnsInfo {
        let mut result = DnsInfo::default();

        match self.resolver.lookup_ip(hostname).await {
            Ok(response) => {
                for ip in response.iter() {
                    if ip.is_ipv4() {
                        result.a_records.push(ip.to_string());
                    } else {
                        result.aaaa_records.push(ip.to_string());
                    }
                }
            }
            Err(e) => debug!(domain = hostname, error = %e, "IP lookup failed"),
        }

        match self.resolver.mx_lookup(hostname).await {
            Ok(response) => {
                result.mx_records = response
                    .iter()
                    .map(|mx| MxRecord {
                        priority: mx.preference(),
                        host: mx.exchange().to_string().trim_end_matches('.').to_string(),
                    })
                    .collect();
            }
            Err(e) => debug!(domain = hostname, error = %e, "MX lookup failed"),
        }

        match self.resolver.ns_lookup(hostname).await {
            Ok(response) => {
                result.ns_records = response
                    .iter()
                    .map(|ns| ns.to_string().trim_end_matches('.').to_string())
                    .collect();
            }
            Err(e) => debug!(domain = hostname, error = %e, "NS lookup failed"),
        }

        result.txt_records = self.query_txt(hostname).await;

        result.spf_record = result
            .txt_records
            .iter()
            .find(|record| record.to_lowercase().starts_with("v=spf1"))
            .cloned();

        result.dmarc_record = self
            .query_txt(&format!("_dmarc.{hostname}"))
            .await
            .into_iter()
            .find(|record| record.to_lowercase().starts_with("v=dmarc1"));

        result.dkim_configured = self.check_dkim(hostname).await;

        result
    }

    /// TXT segments are joined per record so split values stay intact
    async fn query_txt(&self, name: &str) -> Vec<String> {
        match self.resolver.txt_lookup(name).await {
            Ok(response) => response
                .iter()
                .map(|txt| {
                    txt.iter()
                        .map(|segment| String::from_utf8_lossy(segment))
                        .collect::<String>()
                })
                .collect(),
            Err(e) => {
                debug!(name = name, error = %e, "TXT lookup failed");
                Vec::new()
            }
        }
    }

    async fn check_dkim(&self, hostname: &str) -> bool {
        for selector in DKIM_SELECTORS {
            let dkim_domain = format!("{selector}._domainkey.{hostname}");
            if !self.query_txt(&dkim_domain).await.is_empty() {
                debug!(domain = hostname, selector = selector, "DKIM selector found");
                return true;
            }
        }
        false
    }
}

/// Score DNS configuration completeness into [0.0, 1.0] with a reliability
/// band. Component weights: A 20%, AAAA 10%, MX 15% (+5% redundancy),
/// NS 20%, SPF 10%, DMARC 15%, DKIM 10%.
pub fn calculate_dns_score(dns: &DnsInfo) -> (f64, DnsReliability) {
    let mut score: f64 = 0.0;

    if !dns.a_records.is_empty() {
        score += 0.20;
    }

    if !dns.aaaa_records.is_empty() {
        score += 0.10;
    }

    if !dns.mx_records.is_empty() {
        score += 0.15;
        if dns.mx_records.len() > 1 {
            score += 0.05;
        }
    }

    match dns.ns_records.len() {
        0 => {}
        1 => score += 0.10,
        _ => score += 0.20,
    }

    if dns.spf_record.is_some() {
        score += 0.10;
    }

    if dns.dmarc_record.is_some() {
        score += 0.15;
    }

    if dns.dkim_configured {
        score += 0.10;
    }

    let score = ((score * 100.0).round() / 100.0).min(1.0);

    let reliability = if score >= 0.80 {
        DnsReliability::High
    } else if score >= 0.60 {
        DnsReliability::Medium
    } else if score >= 0.40 {
        DnsReliability::Low
    } else {
        DnsReliability::VeryLow
    };

    (score, reliability)
}
