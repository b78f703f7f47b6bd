// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

// Certificate Probe
// TLS handshake and X.509 inspection: validity, issuer, expiry, bit strength
// © 2026 Bountyy Oy

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::{debug, info};
use x509_parser::prelude::*;

use crate::config::ProbeConfig;
use crate::probes::connect_pinned;
use crate::types::{CertInfo, CipherStrength};

/// Days below which the probe flags an upcoming expiry in its error field
const EXPIRY_WARN_DAYS: i64 = 30;

pub struct CertificateProbe {
    connector: TlsConnector,
    timeout: Duration,
}

impl CertificateProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let tls_config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        Self {
            connector: TlsConnector::from(Arc::new(tls_config)),
            timeout: Duration::from_secs(config.tls_timeout_secs),
        }
    }

    /// Handshake against a validated address and inspect the presented leaf
    /// certificate. Verification failures come back as invalid results, not
    /// errors.
    pub async fn check(&self, host: &str, port: u16, pinned: &[std::net::IpAddr]) -> CertInfo {
        info!(host = host, port = port, "Starting certificate check");

        let tcp = match timeout(self.timeout, connect_pinned(host, port, pinned)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return CertInfo::failed(format!("Connection failed: {e}")),
            Err(_) => return CertInfo::failed("Connection timeout"),
        };

        let server_name = match ServerName::try_from(host.to_string()) {
            Ok(name) => name,
            Err(_) => return CertInfo::failed(format!("Invalid server name: {host}")),
        };

        let tls = match timeout(self.timeout, self.connector.connect(server_name, tcp)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                debug!(host = host, error = %e, "TLS handshake rejected");
                return CertInfo::failed(format!("Certificate verification failed: {e}"));
            }
            Err(_) => return CertInfo::failed("Connection timeout"),
        };

        let (_, conn) = tls.get_ref();

        let protocol_version = match conn.protocol_version() {
            Some(rustls::ProtocolVersion::TLSv1_3) => Some("TLSv1.3".to_string()),
            Some(rustls::ProtocolVersion::TLSv1_2) => Some("TLSv1.2".to_string()),
            Some(other) => Some(format!("{other:?}")),
            None => None,
        };

        let cipher_strength = conn
            .negotiated_cipher_suite()
            .map(|suite| CipherStrength::from_bits(suite_bits(&format!("{:?}", suite.suite()))));

        let Some(der) = conn.peer_certificates().and_then(|certs| certs.first()) else {
            return CertInfo::failed("No peer certificate presented");
        };

        let mut result = match inspect_leaf(der.as_ref(), host) {
            Ok(result) => result,
            Err(e) => return CertInfo::failed(e),
        };

        result.cipher_strength = cipher_strength;
        result.protocol_version = protocol_version;

        info!(
            host = host,
            valid = result.valid,
            days_remaining = ?result.days_until_expiry,
            "Certificate check complete"
        );

        result
    }
}

/// Symmetric key size implied by a negotiated suite name
fn suite_bits(suite_name: &str) -> Option<u32> {
    let normalized = suite_name.to_uppercase().replace(['-', '_'], "");
    if normalized.contains("AES256") || normalized.contains("CHACHA20") {
        Some(256)
    } else if normalized.contains("AES128") {
        Some(128)
    } else if normalized.contains("3DES") || normalized.contains("DES") {
        Some(112)
    } else {
        None
    }
}

/// Parse the leaf certificate and derive validity per policy: expired or
/// self-signed certificates are invalid, near-expiry is flagged but valid.
fn inspect_leaf(der: &[u8], host: &str) -> Result<CertInfo, String> {
    let (_, cert) =
        X509Certificate::from_der(der).map_err(|e| format!("Certificate parse failed: {e}"))?;

    let issuer = name_attribute(cert.issuer());
    let subject = name_attribute(cert.subject()).or_else(|| Some(host.to_string()));

    let not_after = cert.validity().not_after.timestamp();
    let expiry_date = DateTime::<Utc>::from_timestamp(not_after, 0).map(|d| d.to_rfc3339());
    let days_until_expiry = (not_after - Utc::now().timestamp()) / 86_400;

    // Coarse heuristic: identical issuer and subject attribute sets imply
    // self-signed. The signature is not verified against the issuer key.
    let self_signed = cert.issuer().to_string() == cert.subject().to_string();

    let is_expired = days_until_expiry <= 0;
    let valid = !is_expired && !self_signed;

    let error = if is_expired {
        Some("Certificate has expired".to_string())
    } else if self_signed {
        Some("Self-signed certificate".to_string())
    } else if days_until_expiry < EXPIRY_WARN_DAYS {
        Some("Certificate expiring soon (less than 30 days)".to_string())
    } else {
        None
    };

    Ok(CertInfo {
        valid,
        issuer,
        subject,
        expiry_date,
        days_until_expiry: Some(days_until_expiry),
        cipher_strength: None,
        protocol_version: None,
        error,
    })
}

/// Prefer the organization attribute, falling back to the common name
fn name_attribute(name: &X509Name<'_>) -> Option<String> {
    name.iter_organization()
        .next()
        .or_else(|| name.iter_common_name().next())
        .and_then(|attr| attr.as_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_bits_classification() {
        assert_eq!(suite_bits("TLS13_AES_256_GCM_SHA384"), Some(256));
        assert_eq!(suite_bits("TLS13_CHACHA20_POLY1305_SHA256"), Some(256));
        assert_eq!(suite_bits("TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256"), Some(128));
        assert_eq!(suite_bits("ECDHE-RSA-AES256-GCM-SHA384"), Some(256));
        assert_eq!(suite_bits("TLS_RSA_WITH_3DES_EDE_CBC_SHA"), Some(112));
        assert_eq!(suite_bits("TLS_UNKNOWN_SUITE"), None);
    }

    #[test]
    fn test_suite_bits_feed_strength_thresholds() {
        assert_eq!(
            CipherStrength::from_bits(suite_bits("TLS13_AES_256_GCM_SHA384")),
            CipherStrength::Strong
        );
        assert_eq!(
            CipherStrength::from_bits(suite_bits("TLS13_AES_128_GCM_SHA256")),
            CipherStrength::Medium
        );
        assert_eq!(
            CipherStrength::from_bits(suite_bits("TLS_RSA_WITH_3DES_EDE_CBC_SHA")),
            CipherStrength::Weak
        );
    }

    #[test]
    fn test_failed_handshake_shape() {
        let result = CertInfo::failed("Certificate verification failed: bad chain");
        assert!(!result.valid);
        assert!(result.days_until_expiry.is_none());
        assert!(result.error.unwrap().starts_with("Certificate verification failed"));
    }
}
