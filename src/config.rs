// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Service Configuration
 * Application configuration with environment variable overrides
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Cache TTL for single-check results (7 days)
pub const DEFAULT_CHECK_TTL_SECS: u64 = 604_800;

/// Cache TTL for batch-check results (1 day)
pub const DEFAULT_BATCH_TTL_SECS: u64 = 86_400;

/// Maximum number of URLs processed per batch request
pub const MAX_BATCH_URLS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_capacity: u64,
    pub check_ttl_secs: u64,
    pub batch_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Registry lookup timeout (who-dat / RDAP / WHOIS)
    pub domain_timeout_secs: u64,
    /// TLS handshake timeout for the certificate probe
    pub tls_timeout_secs: u64,
    /// Per-protocol handshake timeout for the cipher sweep
    pub cipher_timeout_secs: u64,
    /// DNS query timeout
    pub dns_timeout_secs: u64,
    /// who-dat lookup endpoint
    pub who_dat_url: String,
    /// RDAP lookup endpoint
    pub rdap_url: String,
    /// Credential for the fallback domain-age provider, sent as a bearer
    /// token when set
    pub registry_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SafetyConfig {
    /// Exact-match domain allowlist; empty means open policy
    pub allowlist: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub probes: ProbeConfig,
    pub safety: SafetyConfig,
}

pub fn create_default_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 5000,
        },
        cache: CacheConfig {
            enabled: true,
            max_capacity: 10_000,
            check_ttl_secs: DEFAULT_CHECK_TTL_SECS,
            batch_ttl_secs: DEFAULT_BATCH_TTL_SECS,
        },
        probes: ProbeConfig {
            domain_timeout_secs: 5,
            tls_timeout_secs: 10,
            cipher_timeout_secs: 10,
            dns_timeout_secs: 10,
            who_dat_url: "https://who-dat.as93.net".to_string(),
            rdap_url: "https://rdap.net/domain".to_string(),
            registry_api_key: None,
        },
        safety: SafetyConfig::default(),
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        create_default_config()
    }
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults
    ///
    /// Supports the following environment variables:
    /// - HOST / PORT: bind address
    /// - CACHE_ENABLED / CACHE_MAX_CAPACITY: result cache tuning
    /// - CHECK_CACHE_TTL_SECS / BATCH_CACHE_TTL_SECS: cache lifetimes
    /// - DOMAIN_ALLOWLIST: comma-separated exact-match host allowlist
    /// - WHO_DAT_URL / RDAP_URL: registry lookup endpoints
    /// - REGISTRY_API_KEY: fallback domain-age provider credential
    /// - DOMAIN_TIMEOUT_SECS / TLS_TIMEOUT_SECS / CIPHER_TIMEOUT_SECS /
    ///   DNS_TIMEOUT_SECS: per-probe timeout overrides
    /// - LOG_LEVEL: tracing filter directive
    pub fn from_env() -> Result<Self> {
        let mut config = create_default_config();

        if let Ok(host) = std::env::var("HOST") {
            config.server.host = host;
        }

        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid PORT value"))?;
        }

        if let Ok(enabled) = std::env::var("CACHE_ENABLED") {
            config.cache.enabled = enabled.to_lowercase() == "true";
        }

        if let Ok(capacity) = std::env::var("CACHE_MAX_CAPACITY") {
            config.cache.max_capacity = capacity
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid CACHE_MAX_CAPACITY value"))?;
        }

        if let Ok(ttl) = std::env::var("CHECK_CACHE_TTL_SECS") {
            config.cache.check_ttl_secs = ttl
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid CHECK_CACHE_TTL_SECS value"))?;
        }

        if let Ok(ttl) = std::env::var("BATCH_CACHE_TTL_SECS") {
            config.cache.batch_ttl_secs = ttl
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid BATCH_CACHE_TTL_SECS value"))?;
        }

        if let Ok(allowlist) = std::env::var("DOMAIN_ALLOWLIST") {
            config.safety.allowlist = allowlist
                .split(',')
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect();
        }

        if let Ok(url) = std::env::var("WHO_DAT_URL") {
            config.probes.who_dat_url = url;
        }

        if let Ok(url) = std::env::var("RDAP_URL") {
            config.probes.rdap_url = url;
        }

        if let Ok(key) = std::env::var("REGISTRY_API_KEY") {
            if !key.is_empty() {
                config.probes.registry_api_key = Some(key);
            }
        }

        config.probes.domain_timeout_secs =
            env_timeout("DOMAIN_TIMEOUT_SECS", config.probes.domain_timeout_secs)?;
        config.probes.tls_timeout_secs =
            env_timeout("TLS_TIMEOUT_SECS", config.probes.tls_timeout_secs)?;
        config.probes.cipher_timeout_secs =
            env_timeout("CIPHER_TIMEOUT_SECS", config.probes.cipher_timeout_secs)?;
        config.probes.dns_timeout_secs =
            env_timeout("DNS_TIMEOUT_SECS", config.probes.dns_timeout_secs)?;

        Ok(config)
    }
}

fn env_timeout(var: &str, default: u64) -> Result<u64> {
    match std::env::var(var) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid {var} value")),
        Err(_) => Ok(default),
    }
}
