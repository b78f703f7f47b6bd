// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! SiteTrust - Scoring Benchmarks
//! © 2026 Bountyy Oy
//!
//! Benchmarks for the composite scoring engine and safety classification

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sitetrust::safety::ip_str_is_private;
use sitetrust::scoring::{
    CertSignal, CipherSignal, DnsSignal, ScoreEngine, SignalInputs,
};
use sitetrust::types::CipherStrength;

fn benchmark_composite_scoring(c: &mut Criterion) {
    let engine = ScoreEngine::new();
    let inputs = SignalInputs {
        domain_age_years: Some(7.3),
        certificate: Some(CertSignal {
            valid: true,
            cipher_strength: Some(CipherStrength::Strong),
            expiring_soon: Some(false),
            days_until_expiry: Some(120),
        }),
        cipher: Some(CipherSignal {
            score: 0.92,
            weak_ciphers_found: vec!["Weak protocol: TLSv1.0".to_string()],
        }),
        dns: Some(DnsSignal {
            score: 0.80,
            spf_present: true,
            dmarc_present: false,
        }),
    };

    c.bench_function("composite_scoring", |b| {
        b.iter(|| engine.score(black_box(&inputs)))
    });
}

fn benchmark_ip_classification(c: &mut Criterion) {
    let addrs = [
        "127.0.0.1",
        "169.254.169.254",
        "10.20.30.40",
        "8.8.8.8",
        "2606:4700:4700::1111",
        "fe80::1",
    ];

    c.bench_function("ip_classification", |b| {
        b.iter(|| {
            for addr in &addrs {
                let _ = ip_str_is_private(black_box(addr));
            }
        })
    });
}

criterion_group!(
    benches,
    benchmark_composite_scoring,
    benchmark_ip_classification
);
criterion_main!(benches);
