// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Domain Age Probe
 * Registration date resolution through an ordered registry fallback chain:
 * who-dat, then RDAP, then raw WHOIS
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::ProbeConfig;
use crate::errors::{CheckError, CheckResult, NetworkError};
use crate::probes::{is_valid_domain, normalize_domain};
use crate::retry::{retry_with_backoff, RetryConfig};
use crate::types::DomainInfo;

const IANA_WHOIS_SERVER: &str = "whois.iana.org";
const WHOIS_PORT: u16 = 43;

/// Date string layouts seen in WHOIS/RDAP responses
const DATE_FORMATS_DATETIME: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS_DATE: &[&str] = &[
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%m/%d/%Y",
    "%Y.%m.%d",
    "%d/%m/%Y",
    "%d-%b-%Y",
];

/// One registry lookup outcome: a creation date and/or a registrar name
#[derive(Debug, Default, Clone)]
pub struct RegistryRecord {
    pub creation_date: Option<DateTime<Utc>>,
    pub registrar: Option<String>,
}

/// A single strategy in the fallback chain
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    fn name(&self) -> &'static str;
    async fn lookup(&self, domain: &str) -> CheckResult<RegistryRecord>;
}

/// who-dat JSON API lookup
pub struct WhoDatLookup {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl WhoDatLookup {
    pub fn new(client: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl RegistryLookup for WhoDatLookup {
    fn name(&self) -> &'static str {
        "who-dat"
    }

    async fn lookup(&self, domain: &str) -> CheckResult<RegistryRecord> {
        let url = format!("{}/{domain}", self.base_url.trim_end_matches('/'));

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(CheckError::from)?;

        if response.status().as_u16() == 429 {
            warn!(domain = domain, "Rate limited by who-dat API");
            return Err(CheckError::RateLimited {
                host: self.base_url.clone(),
                retry_after: Some(Duration::from_secs(60)),
            });
        }

        let response = response.error_for_status().map_err(CheckError::from)?;
        let data: serde_json::Value = response.json().await.map_err(CheckError::from)?;

        let mut record = RegistryRecord::default();

        for scope in [Some(&data), data.get("domain")] {
            let Some(scope) = scope else { continue };
            for field in ["creation_date", "created", "created_date", "registered", "registration"] {
                if let Some(raw) = scope.get(field).and_then(|v| v.as_str()) {
                    if let Some(date) = parse_creation_date(raw) {
                        record.creation_date = Some(date);
                        break;
                    }
                }
            }
            if record.creation_date.is_some() {
                break;
            }
        }

        record.registrar = data
            .get("registrar")
            .and_then(|r| {
                r.as_str()
                    .map(|s| s.to_string())
                    .or_else(|| r.get("name").and_then(|n| n.as_str()).map(|s| s.to_string()))
            })
            .filter(|s| !s.is_empty());

        if record.creation_date.is_some() {
            info!(domain = domain, "Got creation date from who-dat");
        }

        Ok(record)
    }
}

/// RDAP registration-event lookup
pub struct RdapLookup {
    client: reqwest::Client,
    base_url: String,
}

impl RdapLookup {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl RegistryLookup for RdapLookup {
    fn name(&self) -> &'static str {
        "rdap"
    }

    async fn lookup(&self, domain: &str) -> CheckResult<RegistryRecord> {
        let url = format!("{}/{domain}", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(CheckError::from)?
            .error_for_status()
            .map_err(CheckError::from)?;

        let data: serde_json::Value = response.json().await.map_err(CheckError::from)?;

        let mut record = RegistryRecord::default();

        if let Some(events) = data.get("events").and_then(|e| e.as_array()) {
            for event in events {
                if event.get("eventAction").and_then(|a| a.as_str()) == Some("registration") {
                    if let Some(raw) = event.get("eventDate").and_then(|d| d.as_str()) {
                        if let Some(date) = parse_creation_date(raw) {
                            info!(domain = domain, "Got creation date from RDAP");
                            record.creation_date = Some(date);
                            break;
                        }
                    }
                }
            }
        }

        Ok(record)
    }
}

/// Raw WHOIS over TCP/43, following the IANA referral for the TLD
pub struct WhoisLookup {
    timeout: Duration,
}

impl WhoisLookup {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn query(&self, server: &str, query: &str) -> CheckResult<String> {
        let mut stream = timeout(self.timeout, TcpStream::connect((server, WHOIS_PORT)))
            .await
            .map_err(|_| CheckError::Timeout {
                duration: self.timeout,
            })?
            .map_err(|e| {
                CheckError::Network(NetworkError::ConnectionRefused {
                    host: format!("{server}: {e}"),
                })
            })?;

        stream
            .write_all(format!("{query}\r\n").as_bytes())
            .await
            .map_err(|e| CheckError::Network(NetworkError::Other(e.to_string())))?;

        let mut buf = Vec::new();
        timeout(self.timeout, stream.read_to_end(&mut buf))
            .await
            .map_err(|_| CheckError::Timeout {
                duration: self.timeout,
            })?
            .map_err(|e| CheckError::Network(NetworkError::Other(e.to_string())))?;

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[async_trait]
impl RegistryLookup for WhoisLookup {
    fn name(&self) -> &'static str {
        "whois"
    }

    async fn lookup(&self, domain: &str) -> CheckResult<RegistryRecord> {
        let referral = self.query(IANA_WHOIS_SERVER, domain).await?;
        let server = whois_field(&referral, &["refer"])
            .ok_or_else(|| CheckError::Parse(format!("no WHOIS referral for {domain}")))?;

        let response = self.query(&server, domain).await?;

        let record = RegistryRecord {
            creation_date: whois_field(
                &response,
                &[
                    "creation date",
                    "created",
                    "registered on",
                    "registration time",
                ],
            )
            .and_then(|raw| parse_creation_date(&raw)),
            registrar: whois_field(&response, &["registrar"]),
        };

        if record.creation_date.is_some() {
            info!(domain = domain, server = %server, "Got creation date from WHOIS");
        }

        Ok(record)
    }
}

/// First value for any of the given keys in a `key: value` WHOIS response
fn whois_field(response: &str, keys: &[&str]) -> Option<String> {
    for line in response.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if keys.iter().any(|k| key == *k) {
            return Some(value.to_string());
        }
    }
    None
}

/// Resolves a domain's registration age through the strategy chain
pub struct DomainAgeProbe {
    strategies: Vec<Box<dyn RegistryLookup>>,
    retry: RetryConfig,
    overall_timeout: Duration,
}

impl DomainAgeProbe {
    pub fn new(config: &ProbeConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.domain_timeout_secs))
            .user_agent("SiteTrust-Checker/1.2 (+https://bountyy.fi)")
            .build()?;

        let strategies: Vec<Box<dyn RegistryLookup>> = vec![
            Box::new(WhoDatLookup::new(
                client.clone(),
                config.who_dat_url.clone(),
                config.registry_api_key.clone(),
            )),
            Box::new(RdapLookup::new(client, config.rdap_url.clone())),
            Box::new(WhoisLookup::new(Duration::from_secs(
                config.domain_timeout_secs,
            ))),
        ];

        Ok(Self::with_strategies(strategies, config.domain_timeout_secs))
    }

    pub fn with_strategies(
        strategies: Vec<Box<dyn RegistryLookup>>,
        per_lookup_timeout_secs: u64,
    ) -> Self {
        let strategy_count = strategies.len().max(1) as u64;
        Self {
            strategies,
            retry: RetryConfig::default().with_max_attempts(2),
            // Bound the whole chain even if every strategy retries
            overall_timeout: Duration::from_secs(per_lookup_timeout_secs * 2 * strategy_count),
        }
    }

    /// Resolve registration age in years for a normalized domain
    pub async fn check(&self, domain: &str) -> DomainInfo {
        let domain = normalize_domain(domain);
        if !is_valid_domain(&domain) {
            return DomainInfo::failed(format!("invalid domain: {domain}"));
        }

        match timeout(self.overall_timeout, self.run_chain(&domain)).await {
            Ok(info) => info,
            Err(_) => DomainInfo::failed("registry lookup timeout"),
        }
    }

    async fn run_chain(&self, domain: &str) -> DomainInfo {
        let mut creation_date: Option<DateTime<Utc>> = None;
        let mut registrar: Option<String> = None;

        for strategy in &self.strategies {
            let outcome = retry_with_backoff(&self.retry, strategy.name(), || {
                strategy.lookup(domain)
            })
            .await;

            match outcome {
                Ok(record) => {
                    if registrar.is_none() {
                        registrar = record.registrar;
                    }
                    if let Some(date) = record.creation_date {
                        creation_date = Some(date);
                        break;
                    }
                    debug!(
                        domain = domain,
                        strategy = strategy.name(),
                        "No creation date, trying next registry"
                    );
                }
                Err(e) => {
                    debug!(
                        domain = domain,
                        strategy = strategy.name(),
                        error = %e,
                        "Registry lookup failed, trying next"
                    );
                }
            }
        }

        match creation_date {
            Some(date) => DomainInfo {
                domain_age_years: Some(calculate_domain_age(date)),
                creation_date: Some(date.to_rfc3339()),
                registrar,
                error: None,
            },
            None => DomainInfo {
                registrar,
                ..DomainInfo::failed("creation date unavailable")
            },
        }
    }
}

/// Age in years from a creation date; future-dated registrations clamp to 0
pub fn calculate_domain_age(creation_date: DateTime<Utc>) -> f64 {
    let now = Utc::now();
    if creation_date > now {
        return 0.0;
    }

    let age_years = (now - creation_date).num_days() as f64 / 365.25;
    (age_years * 100.0).round() / 100.0
}

/// Parse the date layouts that WHOIS/RDAP responses actually use
pub fn parse_creation_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(date.with_timezone(&Utc));
    }

    for format in DATE_FORMATS_DATETIME {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for format in DATE_FORMATS_DATE {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }

    warn!(raw = trimmed, "WHOIS date parse failed");
    None
}
