// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Site Check Orchestrator
 * Drives one check: safety gate, concurrent probes, composite scoring,
 * response envelope and cache read-through
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::net::IpAddr;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::{json, Value};
use tracing::{error, info};
use url::Url;

use crate::cache::ResultCache;
use crate::config::{CacheConfig, MAX_BATCH_URLS};
use crate::probes::{normalize_domain, ProbeSuite};
use crate::safety::{SafetyDecision, UrlSafetyGate};
use crate::scoring::{CertSignal, CipherSignal, DnsSignal, ScoreEngine, SignalInputs};
use crate::types::{CertInfo, CipherInfo, DnsInfo, DomainInfo};

/// Default TLS port when the URL does not carry one
const DEFAULT_TLS_PORT: u16 = 443;

/// One fully-wired check pipeline. Every dependency is passed in at
/// construction; the orchestrator holds no process-wide state.
pub struct SiteChecker {
    gate: UrlSafetyGate,
    probes: Arc<dyn ProbeSuite>,
    engine: ScoreEngine,
    cache: Arc<ResultCache>,
    check_ttl_secs: u64,
    batch_ttl_secs: u64,
}

impl SiteChecker {
    pub fn new(
        gate: UrlSafetyGate,
        probes: Arc<dyn ProbeSuite>,
        engine: ScoreEngine,
        cache: Arc<ResultCache>,
        cache_config: &CacheConfig,
    ) -> Self {
        Self {
            gate,
            probes,
            engine,
            cache,
            check_ttl_secs: cache_config.check_ttl_secs,
            batch_ttl_secs: cache_config.batch_ttl_secs,
        }
    }

    /// Run one full check. Total: every failure mode folds into the returned
    /// envelope, nothing propagates.
    pub async fn check(&self, url: &str) -> Value {
        if let Some(cached) = self.cache.get(url).await {
            info!(url = url, "Serving check from cache");
            return cached;
        }

        let resolved_addrs = match self.gate.evaluate(url).await {
            SafetyDecision::Allowed { resolved_addrs } => resolved_addrs,
            SafetyDecision::Blocked { reason } => {
                info!(url = url, reason = %reason, "Check blocked by safety gate");
                return blocked_envelope(url, &reason.to_string());
            }
        };

        let (domain_info, cert_info, cipher_info, dns_info) =
            self.run_probes(url, &resolved_addrs).await;

        let score = self.score_signals(&domain_info, &cert_info, &cipher_info, &dns_info);

        let envelope = full_envelope(url, &domain_info, &cert_info, &score);
        self.cache
            .set(url, envelope.clone(), self.check_ttl_secs)
            .await;

        envelope
    }

    /// Check a list of URLs, capped to the first `MAX_BATCH_URLS`. Each
    /// entry fails independently.
    pub async fn batch_check(&self, urls: &[String]) -> Vec<Value> {
        let capped = &urls[..urls.len().min(MAX_BATCH_URLS)];
        if capped.len() < urls.len() {
            info!(
                requested = urls.len(),
                processed = capped.len(),
                "Batch request capped"
            );
        }

        let futures: Vec<_> = capped.iter().map(|url| self.batch_one(url)).collect();
        join_all(futures).await
    }

    async fn batch_one(&self, url: &str) -> Value {
        let resolved_addrs = match self.gate.evaluate(url).await {
            SafetyDecision::Allowed { resolved_addrs } => resolved_addrs,
            SafetyDecision::Blocked { reason } => {
                return blocked_envelope(url, &reason.to_string());
            }
        };

        if let Some(cached) = self.cache.get(url).await {
            return cached;
        }

        let (domain_info, cert_info, cipher_info, dns_info) =
            self.run_probes(url, &resolved_addrs).await;

        let score = self.score_signals(&domain_info, &cert_info, &cipher_info, &dns_info);

        if score.trust_level == crate::scoring::TrustLevel::Error {
            error!(url = url, detail = ?score.detail, "Scoring failed for batch entry");
        }

        let envelope = json!({
            "url": url,
            "domain": domain_for(url),
            "domain_age_years": domain_info.domain_age_years,
            "ssl_valid": cert_info.valid,
            "score": score.composite_score,
            "trust_level": score.trust_level,
        });

        self.cache
            .set(url, envelope.clone(), self.batch_ttl_secs)
            .await;

        envelope
    }

    /// The four probes have no data dependency on each other and run
    /// concurrently; each is internally bounded by its own timeout.
    async fn run_probes(
        &self,
        url: &str,
        resolved_addrs: &[IpAddr],
    ) -> (DomainInfo, CertInfo, CipherInfo, DnsInfo) {
        let (host, port) = host_and_port(url);
        let domain = normalize_domain(&host);

        tokio::join!(
            self.probes.domain_age(&domain),
            self.probes.certificate(&host, port, resolved_addrs),
            self.probes.cipher(&host, port, resolved_addrs),
            self.probes.dns(&domain),
        )
    }

    fn score_signals(
        &self,
        domain_info: &DomainInfo,
        cert_info: &CertInfo,
        cipher_info: &CipherInfo,
        dns_info: &DnsInfo,
    ) -> crate::scoring::CompositeResult {
        // A probe that produced only an error carries no usable signal; the
        // engine substitutes its documented default for the absent input.
        let inputs = SignalInputs {
            domain_age_years: domain_info.domain_age_years,
            certificate: Some(CertSignal::from(cert_info)),
            cipher: if cipher_info.error.is_some() && cipher_info.supported_ciphers.is_empty() {
                None
            } else {
                Some(CipherSignal::from(cipher_info))
            },
            dns: if dns_info.error.is_some() && dns_info.dns_score == 0.0 {
                None
            } else {
                Some(DnsSignal::from(dns_info))
            },
        };

        self.engine.score(&inputs)
    }
}

/// Host and TLS port for probe dialing. The gate guarantees the URL parses.
fn host_and_port(url: &str) -> (String, u16) {
    match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default().to_string();
            let port = parsed.port().unwrap_or(DEFAULT_TLS_PORT);
            (host, port)
        }
        Err(_) => (String::new(), DEFAULT_TLS_PORT),
    }
}

fn domain_for(url: &str) -> String {
    let (host, _) = host_and_port(url);
    normalize_domain(&host)
}

/// Envelope for a gate-refused URL: reported, never silently dropped
fn blocked_envelope(url: &str, reason: &str) -> Value {
    json!({
        "url": url,
        "error": "URL not allowed",
        "reason": reason,
        "score": 0,
        "trust_level": "blocked",
    })
}

/// Full single-check envelope: score breakdown plus domain and SSL detail
fn full_envelope(
    url: &str,
    domain_info: &DomainInfo,
    cert_info: &CertInfo,
    score: &crate::scoring::CompositeResult,
) -> Value {
    json!({
        "url": url,
        "domain": domain_for(url),
        "domain_age_years": domain_info.domain_age_years,
        "domain_creation_date": domain_info.creation_date,
        "domain_registrar": domain_info.registrar,
        "ssl_valid": cert_info.valid,
        "ssl_issuer": cert_info.issuer,
        "ssl_expiry": cert_info.expiry_date,
        "ssl_days_remaining": cert_info.days_until_expiry,
        "score": score.composite_score,
        "score_details": score,
        "trust_level": score.trust_level,
        "checked_at": chrono::Utc::now().to_rfc3339(),
    })
}
