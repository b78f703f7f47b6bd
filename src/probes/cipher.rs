// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

// Cipher Probe
// Negotiates TLS handshakes across protocol versions and scores the cipher set
// © 2026 Bountyy Oy

use std::sync::Arc;
use std::time::Duration;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::{debug, info};

use crate::config::ProbeConfig;
use crate::errors::{CheckError, CheckResult, NetworkError};
use crate::probes::connect_pinned;
use crate::types::{CipherInfo, CipherStrength};

/// Substrings marking a cipher suite as weak
const WEAK_CIPHER_MARKERS: &[&str] = &["RC4", "3DES", "DES", "NULL", "EXPORT", "ANON", "MD5"];

/// Substrings marking a cipher suite as modern AEAD
const STRONG_CIPHER_MARKERS: &[&str] = &["AES_256_GCM", "AES_128_GCM", "CHACHA20_POLY1305"];

const WEAK_PROTOCOLS: &[&str] = &["SSLv2", "SSLv3", "TLSv1.0", "TLSv1.1"];
const STRONG_PROTOCOLS: &[&str] = &["TLSv1.2", "TLSv1.3"];

/// Accepts any presented certificate: the cipher sweep measures protocol and
/// suite support, certificate trust is the certificate probe's concern.
#[derive(Debug)]
struct AcceptAnyCert;

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}

fn sweep_connector(versions: &[&'static rustls::SupportedProtocolVersion]) -> TlsConnector {
    let config = ClientConfig::builder_with_protocol_versions(versions)
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

pub struct CipherProbe {
    tls13: TlsConnector,
    tls12: TlsConnector,
    timeout: Duration,
}

impl CipherProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            tls13: sweep_connector(&[&rustls::version::TLS13]),
            tls12: sweep_connector(&[&rustls::version::TLS12]),
            timeout: Duration::from_secs(config.cipher_timeout_secs),
        }
    }

    /// Attempt a handshake per protocol version and score the negotiated set
    pub async fn check(&self, host: &str, port: u16, pinned: &[std::net::IpAddr]) -> CipherInfo {
        info!(host = host, port = port, "Starting cipher sweep");

        let mut supported_ciphers: Vec<String> = Vec::new();
        let mut protocol_version: Option<String> = None;

        let attempts = [("TLSv1.3", &self.tls13), ("TLSv1.2", &self.tls12)];
        for (label, connector) in attempts {
            match self.handshake(connector, host, port, pinned).await {
                Ok((suite, negotiated)) => {
                    if protocol_version.is_none() {
                        protocol_version = Some(negotiated);
                    }
                    if let Some(suite) = suite {
                        if !supported_ciphers.contains(&suite) {
                            supported_ciphers.push(suite);
                        }
                    }
                }
                Err(e) => {
                    debug!(host = host, protocol = label, error = %e, "Handshake attempt failed");
                }
            }
        }

        let Some(protocol_version) = protocol_version else {
            return CipherInfo::failed("Unable to establish TLS connection");
        };

        let (cipher_score, cipher_strength, weak_ciphers_found) =
            score_cipher_set(&supported_ciphers, Some(&protocol_version));

        let error = if supported_ciphers.is_empty() {
            Some("No cipher suites reported".to_string())
        } else {
            None
        };

        info!(
            host = host,
            score = cipher_score,
            protocol = %protocol_version,
            "Cipher sweep complete"
        );

        CipherInfo {
            cipher_score,
            cipher_strength,
            protocol_version: Some(protocol_version),
            supported_ciphers,
            weak_ciphers_found,
            error,
        }
    }

    async fn handshake(
        &self,
        connector: &TlsConnector,
        host: &str,
        port: u16,
        pinned: &[std::net::IpAddr],
    ) -> CheckResult<(Option<String>, String)> {
        let tcp = timeout(self.timeout, connect_pinned(host, port, pinned))
            .await
            .map_err(|_| CheckError::Timeout {
                duration: self.timeout,
            })?
            .map_err(|e| {
                CheckError::Network(NetworkError::Other(format!("TCP connect failed: {e}")))
            })?;

        let server_name = ServerName::try_from(host.to_string()).map_err(|_| {
            CheckError::Network(NetworkError::InvalidUrl {
                url: host.to_string(),
            })
        })?;

        let tls = timeout(self.timeout, connector.connect(server_name, tcp))
            .await
            .map_err(|_| CheckError::Timeout {
                duration: self.timeout,
            })?
            .map_err(|e| {
                CheckError::Network(NetworkError::TlsHandshakeFailed {
                    host: host.to_string(),
                    reason: e.to_string(),
                })
            })?;

        let (_, conn) = tls.get_ref();
        let suite = conn
            .negotiated_cipher_suite()
            .map(|s| format!("{:?}", s.suite()));
        let version = protocol_label(conn.protocol_version());

        Ok((suite, version))
    }
}

fn protocol_label(version: Option<rustls::ProtocolVersion>) -> String {
    match version {
        Some(rustls::ProtocolVersion::TLSv1_3) => "TLSv1.3".to_string(),
        Some(rustls::ProtocolVersion::TLSv1_2) => "TLSv1.2".to_string(),
        Some(other) => format!("{other:?}"),
        None => "unknown".to_string(),
    }
}

/// Score a cipher set into [0.0, 1.0]: protocol version contributes 40%,
/// cipher suite quality 60%. Weak findings are returned for the composite
/// engine's penalty pass.
pub fn score_cipher_set(
    ciphers: &[String],
    protocol: Option<&str>,
) -> (f64, CipherStrength, Vec<String>) {
    if ciphers.is_empty() {
        return (0.0, CipherStrength::Unknown, Vec::new());
    }

    let mut score: f64 = 0.0;
    let mut weak_ciphers: Vec<String> = Vec::new();

    match protocol {
        Some(p) if STRONG_PROTOCOLS.contains(&p) => score += 0.4,
        Some(p) if WEAK_PROTOCOLS.contains(&p) => {
            weak_ciphers.push(format!("Weak protocol: {p}"));
        }
        _ => score += 0.2,
    }

    let mut strong_count = 0usize;
    let mut weak_count = 0usize;

    for cipher in ciphers {
        let normalized = cipher.to_uppercase().replace('-', "_");

        let is_weak = WEAK_CIPHER_MARKERS
            .iter()
            .any(|marker| normalized.contains(marker));

        if is_weak {
            weak_count += 1;
            weak_ciphers.push(cipher.clone());
        } else if STRONG_CIPHER_MARKERS
            .iter()
            .any(|marker| normalized.contains(marker))
        {
            strong_count += 1;
        }
    }

    let cipher_component = if weak_count > 0 {
        (0.6 * (1.0 - weak_count as f64 / ciphers.len() as f64)).max(0.0)
    } else if strong_count > 0 {
        0.6
    } else {
        0.4
    };

    score += cipher_component;
    let score = (score * 100.0).round() / 100.0;

    let strength = if score >= 0.8 {
        CipherStrength::Strong
    } else if score >= 0.5 {
        CipherStrength::Medium
    } else {
        CipherStrength::Weak
    };

    (score, strength, weak_ciphers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cipher_set_scores_zero() {
        let (score, strength, weak) = score_cipher_set(&[], Some("TLSv1.3"));
        assert_eq!(score, 0.0);
        assert_eq!(strength, CipherStrength::Unknown);
        assert!(weak.is_empty());
    }

    #[test]
    fn test_modern_stack_scores_strong() {
        let ciphers = vec![
            "TLS13_AES_256_GCM_SHA384".to_string(),
            "TLS13_CHACHA20_POLY1305_SHA256".to_string(),
        ];
        let (score, strength, weak) = score_cipher_set(&ciphers, Some("TLSv1.3"));
        assert_eq!(score, 1.0);
        assert_eq!(strength, CipherStrength::Strong);
        assert!(weak.is_empty());
    }

    #[test]
    fn test_weak_protocol_recorded_and_penalized() {
        let ciphers = vec!["TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256".to_string()];
        let (score, _, weak) = score_cipher_set(&ciphers, Some("TLSv1.0"));
        // 0.0 protocol + 0.6 strong suites
        assert_eq!(score, 0.6);
        assert_eq!(weak, vec!["Weak protocol: TLSv1.0".to_string()]);
    }

    #[test]
    fn test_weak_ciphers_reduce_component() {
        let ciphers = vec![
            "ECDHE-RSA-AES256-GCM-SHA384".to_string(),
            "RC4-SHA".to_string(),
        ];
        let (score, strength, weak) = score_cipher_set(&ciphers, Some("TLSv1.2"));
        // 0.4 protocol + 0.6 * (1 - 1/2) = 0.7
        assert_eq!(score, 0.7);
        assert_eq!(strength, CipherStrength::Medium);
        assert_eq!(weak, vec!["RC4-SHA".to_string()]);
    }

    #[test]
    fn test_all_weak_ciphers_floor_at_protocol_score() {
        let ciphers = vec!["RC4-MD5".to_string(), "DES-CBC3-SHA".to_string()];
        let (score, strength, weak) = score_cipher_set(&ciphers, Some("TLSv1.2"));
        assert_eq!(score, 0.4);
        assert_eq!(strength, CipherStrength::Weak);
        assert_eq!(weak.len(), 2);
    }

    #[test]
    fn test_unrecognized_suites_score_medium_component() {
        let ciphers = vec!["TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA".to_string()];
        let (score, strength, _) = score_cipher_set(&ciphers, Some("TLSv1.2"));
        // 0.4 protocol + 0.4 medium component
        assert_eq!(score, 0.8);
        assert_eq!(strength, CipherStrength::Strong);
    }

    #[test]
    fn test_unknown_protocol_scores_partial() {
        let ciphers = vec!["TLS13_AES_128_GCM_SHA256".to_string()];
        let (score, _, _) = score_cipher_set(&ciphers, None);
        // 0.2 unknown protocol + 0.6 strong suites
        assert_eq!(score, 0.8);
    }
}
