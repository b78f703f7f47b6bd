// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Composite Scoring Engine
 * Normalizes and weights domain, certificate, cipher and DNS signals into a
 * single bounded trust score with qualitative banding and recommendations
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{CertInfo, CipherInfo, CipherStrength, DnsInfo};

/// Days-until-expiry threshold below which a certificate is near-expiry
const EXPIRY_WARN_DAYS: i64 = 30;

/// Neutral sub-score substituted when an optional probe produced no data
const NEUTRAL_SUBSCORE: f64 = 50.0;

/// Per-weak-cipher penalty and its total cap, in composite points
const WEAK_CIPHER_PENALTY: f64 = 10.0;
const WEAK_CIPHER_PENALTY_CAP: f64 = 30.0;

/// Qualitative trust banding derived from the final composite score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    High,
    Medium,
    Low,
    Error,
}

impl TrustLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustLevel::High => "high",
            TrustLevel::Medium => "medium",
            TrustLevel::Low => "low",
            TrustLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Signal weights for the four sub-scores. Must sum to 1.0; a drifting sum is
/// logged, not rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreWeights {
    pub domain: f64,
    pub ssl: f64,
    pub cipher: f64,
    pub dns: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            domain: 0.35,
            ssl: 0.25,
            cipher: 0.20,
            dns: 0.20,
        }
    }
}

impl ScoreWeights {
    /// Domain+SSL only weighting, retained for callers that have no cipher or
    /// DNS signal at all
    pub fn two_factor() -> Self {
        Self {
            domain: 0.6,
            ssl: 0.4,
            cipher: 0.0,
            dns: 0.0,
        }
    }

    fn sum(&self) -> f64 {
        self.domain + self.ssl + self.cipher + self.dns
    }

    fn warn_if_unnormalized(&self) {
        let sum = self.sum();
        if (sum - 1.0).abs() > 1e-6 {
            warn!(sum = sum, "Score weights do not sum to 1.0");
        }
    }
}

/// Certificate fields the engine scores on. `expiring_soon` is carried
/// separately from `days_until_expiry` so upstream callers that already
/// computed the flag keep their semantics.
#[derive(Debug, Clone, Default)]
pub struct CertSignal {
    pub valid: bool,
    pub cipher_strength: Option<CipherStrength>,
    pub expiring_soon: Option<bool>,
    pub days_until_expiry: Option<i64>,
}

impl From<&CertInfo> for CertSignal {
    fn from(info: &CertInfo) -> Self {
        Self {
            valid: info.valid,
            cipher_strength: info.cipher_strength,
            expiring_soon: info.days_until_expiry.map(|d| d < EXPIRY_WARN_DAYS),
            days_until_expiry: info.days_until_expiry,
        }
    }
}

/// Cipher fields the engine scores on
#[derive(Debug, Clone, Default)]
pub struct CipherSignal {
    /// Probe score in [0.0, 1.0]
    pub score: f64,
    pub weak_ciphers_found: Vec<String>,
}

impl From<&CipherInfo> for CipherSignal {
    fn from(info: &CipherInfo) -> Self {
        Self {
            score: info.cipher_score,
            weak_ciphers_found: info.weak_ciphers_found.clone(),
        }
    }
}

/// DNS fields the engine scores on
#[derive(Debug, Clone, Default)]
pub struct DnsSignal {
    /// Probe score in [0.0, 1.0]
    pub score: f64,
    pub spf_present: bool,
    pub dmarc_present: bool,
}

impl From<&DnsInfo> for DnsSignal {
    fn from(info: &DnsInfo) -> Self {
        Self {
            score: info.dns_score,
            spf_present: info.spf_record.is_some(),
            dmarc_present: info.dmarc_record.is_some(),
        }
    }
}

/// Structured inputs for one scoring call. Every field is optional; the
/// engine substitutes documented defaults for anything absent.
#[derive(Debug, Clone, Default)]
pub struct SignalInputs {
    pub domain_age_years: Option<f64>,
    pub certificate: Option<CertSignal>,
    pub cipher: Option<CipherSignal>,
    pub dns: Option<DnsSignal>,
}

/// Terminal scoring artifact: composite score, per-signal breakdown, trust
/// banding and ordered recommendations. Never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeResult {
    pub composite_score: f64,
    pub domain_score: f64,
    pub ssl_score: f64,
    pub cipher_score: f64,
    pub dns_score: f64,
    pub trust_level: TrustLevel,
    pub weights: ScoreWeights,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CompositeResult {
    /// Error-shaped result: composite pinned to 0 with a diagnostic detail
    fn error(weights: ScoreWeights, detail: String) -> Self {
        Self {
            composite_score: 0.0,
            domain_score: 0.0,
            ssl_score: 0.0,
            cipher_score: 0.0,
            dns_score: 0.0,
            trust_level: TrustLevel::Error,
            weights,
            recommendations: Vec::new(),
            detail: Some(detail),
        }
    }
}

/// Composite scoring engine. Construct once with the desired weights and
/// reuse across requests; scoring holds no mutable state.
#[derive(Debug, Clone, Default)]
pub struct ScoreEngine {
    weights: ScoreWeights,
}

impl ScoreEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: ScoreWeights) -> Self {
        weights.warn_if_unnormalized();
        Self { weights }
    }

    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }

    /// Score one set of signals. Total over all inputs: malformed numerics
    /// are caught and produce the error-shaped result instead of propagating.
    pub fn score(&self, inputs: &SignalInputs) -> CompositeResult {
        if let Some(detail) = malformed_input(inputs) {
            return CompositeResult::error(self.weights, detail);
        }

        let domain_score = domain_age_score(inputs.domain_age_years);
        let ssl_score = certificate_score(inputs.certificate.as_ref());
        let cipher_score = cipher_subscore(inputs.cipher.as_ref());
        let dns_score = dns_subscore(inputs.dns.as_ref());

        let composite = round1(
            domain_score * self.weights.domain
                + ssl_score * self.weights.ssl
                + cipher_score * self.weights.cipher
                + dns_score * self.weights.dns,
        );

        let trust_level = trust_level_for(composite);
        let recommendations = build_recommendations(composite, inputs);

        CompositeResult {
            composite_score: composite,
            domain_score: round1(domain_score),
            ssl_score: round1(ssl_score),
            cipher_score: round1(cipher_score),
            dns_score: round1(dns_score),
            trust_level,
            weights: self.weights,
            recommendations,
            detail: None,
        }
    }
}

/// Reject non-finite numerics before they can poison the composite
fn malformed_input(inputs: &SignalInputs) -> Option<String> {
    if let Some(age) = inputs.domain_age_years {
        if !age.is_finite() {
            return Some(format!("non-finite domain age: {age}"));
        }
    }
    if let Some(cipher) = &inputs.cipher {
        if !cipher.score.is_finite() {
            return Some(format!("non-finite cipher score: {}", cipher.score));
        }
    }
    if let Some(dns) = &inputs.dns {
        if !dns.score.is_finite() {
            return Some(format!("non-finite dns score: {}", dns.score));
        }
    }
    None
}

/// Step function of domain age in years.
///
/// Age is a weak but monotonic trust proxy; the steps avoid false precision.
pub fn domain_age_score(age_years: Option<f64>) -> f64 {
    match age_years {
        None => 20.0,
        Some(age) if age < 0.0 => 20.0,
        Some(age) if age >= 5.0 => 100.0,
        Some(age) if age >= 3.0 => 70.0,
        Some(age) if age >= 1.0 => 50.0,
        Some(_) => 20.0,
    }
}

/// Certificate score: 0 for invalid, else 100 degraded by cipher strength and
/// proximity to expiry. Caps combine via `min` so the worst condition wins.
pub fn certificate_score(cert: Option<&CertSignal>) -> f64 {
    let Some(cert) = cert else {
        return 0.0;
    };

    if !cert.valid {
        return 0.0;
    }

    let mut score: f64 = 100.0;

    match cert.cipher_strength {
        Some(CipherStrength::Weak) | Some(CipherStrength::Medium) => score = 70.0,
        _ => {}
    }

    if cert.expiring_soon.unwrap_or(false) {
        score = score.min(50.0);
    } else if let Some(days) = cert.days_until_expiry {
        if days < EXPIRY_WARN_DAYS {
            score = score.min(70.0);
        }
    }

    score
}

/// Cipher sub-score: probe score scaled to 0-100, penalized per weak cipher
/// with a capped total penalty. Missing data scores neutral, not zero.
pub fn cipher_subscore(cipher: Option<&CipherSignal>) -> f64 {
    let Some(cipher) = cipher else {
        return NEUTRAL_SUBSCORE;
    };

    let scaled = cipher.score * 100.0;
    let penalty = (cipher.weak_ciphers_found.len() as f64 * WEAK_CIPHER_PENALTY)
        .min(WEAK_CIPHER_PENALTY_CAP);

    (scaled - penalty).clamp(0.0, 100.0)
}

/// DNS sub-score: probe score scaled to 0-100. Missing data scores neutral.
pub fn dns_subscore(dns: Option<&DnsSignal>) -> f64 {
    let Some(dns) = dns else {
        return NEUTRAL_SUBSCORE;
    };

    (dns.score * 100.0).clamp(0.0, 100.0)
}

/// Band the final composite score. Applied only to the composite, never to
/// individual sub-scores.
pub fn trust_level_for(composite: f64) -> TrustLevel {
    if composite >= 80.0 {
        TrustLevel::High
    } else if composite >= 60.0 {
        TrustLevel::Medium
    } else {
        TrustLevel::Low
    }
}

/// Legacy positional contract: plain domain and SSL sub-scores in, bare
/// composite out. Weights outside `(0, 1]` fall back to the two-factor
/// defaults. Adapter only; the engine itself never sniffs argument shapes.
pub fn weighted_composite(
    domain_score: f64,
    ssl_score: f64,
    weights: Option<(f64, f64)>,
) -> f64 {
    let (domain_weight, ssl_weight) = match weights {
        Some((d, s)) if d > 0.0 && d <= 1.0 && s > 0.0 && s <= 1.0 => (d, s),
        Some(_) => {
            warn!("Legacy composite called with out-of-range weights, using defaults");
            (0.6, 0.4)
        }
        None => (0.6, 0.4),
    };

    round1(domain_score * domain_weight + ssl_score * ssl_weight)
}

/// Ordered recommendation list: overall assessment first, then domain,
/// certificate, cipher and DNS findings. Deterministic for identical inputs.
fn build_recommendations(composite: f64, inputs: &SignalInputs) -> Vec<String> {
    let mut recommendations = Vec::new();

    if composite >= 80.0 {
        recommendations.push("This appears to be a trustworthy site".to_string());
    } else if composite >= 60.0 {
        recommendations.push("Exercise normal caution when interacting".to_string());
    } else {
        recommendations
            .push("Exercise caution when providing sensitive information".to_string());
    }

    if let Some(age) = inputs.domain_age_years {
        if age < 1.0 {
            recommendations.push("Domain is relatively new - verify legitimacy".to_string());
        }
    }

    match &inputs.certificate {
        Some(cert) if !cert.valid => {
            recommendations.push(
                "SSL certificate is invalid - avoid entering sensitive data".to_string(),
            );
        }
        Some(cert) if cert.expiring_soon.unwrap_or(false) => {
            recommendations.push("SSL certificate expiring soon".to_string());
        }
        _ => {}
    }

    if let Some(cipher) = &inputs.cipher {
        let weak_count = cipher.weak_ciphers_found.len();
        if weak_count > 0 {
            recommendations.push(format!(
                "Disable {weak_count} weak cipher suite(s) detected"
            ));
        }
    }

    if let Some(dns) = &inputs.dns {
        if !dns.spf_present {
            recommendations
                .push("No SPF record found - add to prevent email spoofing".to_string());
        }
        if !dns.dmarc_present {
            recommendations
                .push("No DMARC record found - add for email authentication".to_string());
        }
    }

    recommendations
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
