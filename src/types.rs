// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Probe Result Types
 * Fixed result shapes returned by the domain, certificate, cipher and DNS probes
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};

/// Negotiated cipher strength category, derived from the symmetric key size
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CipherStrength {
    Strong,
    Medium,
    Weak,
    Unknown,
}

impl CipherStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            CipherStrength::Strong => "strong",
            CipherStrength::Medium => "medium",
            CipherStrength::Weak => "weak",
            CipherStrength::Unknown => "unknown",
        }
    }

    /// Classify by symmetric key size in bits
    pub fn from_bits(bits: Option<u32>) -> Self {
        match bits {
            Some(b) if b >= 256 => CipherStrength::Strong,
            Some(b) if b >= 128 => CipherStrength::Medium,
            Some(_) => CipherStrength::Weak,
            None => CipherStrength::Unknown,
        }
    }
}

impl std::fmt::Display for CipherStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// DNS configuration completeness banding
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DnsReliability {
    High,
    Medium,
    Low,
    VeryLow,
    Unknown,
}

impl DnsReliability {
    pub fn as_str(&self) -> &'static str {
        match self {
            DnsReliability::High => "high",
            DnsReliability::Medium => "medium",
            DnsReliability::Low => "low",
            DnsReliability::VeryLow => "very_low",
            DnsReliability::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DnsReliability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain registration data resolved through the registry fallback chain.
///
/// A failed lookup yields the defaults with `error` populated; the scoring
/// engine treats a missing age identically to an unknown one.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DomainInfo {
    pub domain_age_years: Option<f64>,
    pub creation_date: Option<String>,
    pub registrar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DomainInfo {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// TLS certificate inspection result
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CertInfo {
    pub valid: bool,
    pub issuer: Option<String>,
    pub subject: Option<String>,
    pub expiry_date: Option<String>,
    pub days_until_expiry: Option<i64>,
    pub cipher_strength: Option<CipherStrength>,
    pub protocol_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CertInfo {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Cipher suite / protocol version sweep result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CipherInfo {
    /// Normalized score in [0.0, 1.0]
    pub cipher_score: f64,
    pub cipher_strength: CipherStrength,
    pub protocol_version: Option<String>,
    pub supported_ciphers: Vec<String>,
    pub weak_ciphers_found: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for CipherInfo {
    fn default() -> Self {
        Self {
            cipher_score: 0.0,
            cipher_strength: CipherStrength::Unknown,
            protocol_version: None,
            supported_ciphers: Vec::new(),
            weak_ciphers_found: Vec::new(),
            error: None,
        }
    }
}

impl CipherInfo {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// MX record entry (priority + exchange host)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MxRecord {
    pub priority: u16,
    pub host: String,
}

/// DNS posture probe result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsInfo {
    /// Normalized score in [0.0, 1.0]
    pub dns_score: f64,
    pub dns_reliability: DnsReliability,
    pub a_records: Vec<String>,
    pub aaaa_records: Vec<String>,
    pub mx_records: Vec<MxRecord>,
    pub ns_records: Vec<String>,
    pub txt_records: Vec<String>,
    pub spf_record: Option<String>,
    pub dmarc_record: Option<String>,
    pub dkim_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for DnsInfo {
    fn default() -> Self {
        Self {
            dns_score: 0.0,
            dns_reliability: DnsReliability::Unknown,
            a_records: Vec::new(),
            aaaa_records: Vec::new(),
            mx_records: Vec::new(),
            ns_records: Vec::new(),
            txt_records: Vec::new(),
            spf_record: None,
            dmarc_record: None,
            dkim_configured: false,
            error: None,
        }
    }
}

impl DnsInfo {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cipher_strength_from_bits() {
        assert_eq!(CipherStrength::from_bits(Some(256)), CipherStrength::Strong);
        assert_eq!(CipherStrength::from_bits(Some(128)), CipherStrength::Medium);
        assert_eq!(CipherStrength::from_bits(Some(56)), CipherStrength::Weak);
        assert_eq!(CipherStrength::from_bits(None), CipherStrength::Unknown);
    }

    #[test]
    fn test_dns_reliability_serialization() {
        let json = serde_json::to_string(&DnsReliability::VeryLow).unwrap();
        assert_eq!(json, "\"very_low\"");
    }

    #[test]
    fn test_failed_results_keep_neutral_defaults() {
        let cert = CertInfo::failed("Connection timeout");
        assert!(!cert.valid);
        assert!(cert.issuer.is_none());
        assert_eq!(cert.error.as_deref(), Some("Connection timeout"));

        let dns = DnsInfo::failed("DNS query timeout");
        assert_eq!(dns.dns_score, 0.0);
        assert_eq!(dns.dns_reliability, DnsReliability::Unknown);
    }
}
