// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use std::sync::Arc;

use anyhow::{Context, Result};
use hickory_resolver::config::LookupIpStrategy;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use tracing::info;

use sitetrust::api::{create_router, AppState};
use sitetrust::cache::ResultCache;
use sitetrust::checker::SiteChecker;
use sitetrust::config::AppConfig;
use sitetrust::probes::LiveProbes;
use sitetrust::safety::UrlSafetyGate;
use sitetrust::scoring::ScoreEngine;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                )
            }),
        )
        .init();

    print!("\x1b[96m");
    println!("   _____ _ __     ______                __");
    println!("  / ___/(_) /____/_  __/______  _______/ /_");
    println!("  \\__ \\/ / __/ _ \\/ / / ___/ / / / ___/ __/");
    print!("\x1b[94m");
    println!(" ___/ / / /_/  __/ / / /  / /_/ (__  ) /_");
    println!("/____/_/\\__/\\___/_/ /_/   \\__,_/____/\\__/");
    print!("\x1b[0m");
    println!();
    print!("\x1b[1m\x1b[97m");
    println!("        Website Trust Scoring Service");
    print!("\x1b[0m\x1b[96m");
    println!("         v1.2 - (c) 2026 Bountyy Oy");
    print!("\x1b[0m");
    println!();

    info!("SiteTrust v1.2.0 - Starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .thread_name("sitetrust-worker")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let config = AppConfig::from_env()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        cache_enabled = config.cache.enabled,
        allowlist_entries = config.safety.allowlist.len(),
        "Configuration loaded"
    );

    let mut resolver_builder = TokioResolver::builder(TokioConnectionProvider::default())
        .context("Failed to create DNS resolver")?;
    // The gate must see every resolved address, not the first family to answer
    resolver_builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
    let resolver = resolver_builder.build();

    let cache = Arc::new(ResultCache::new(
        config.cache.enabled,
        config.cache.max_capacity,
    ));

    let probes = Arc::new(
        LiveProbes::new(&config.probes, resolver.clone())
            .context("Failed to initialize probe suite")?,
    );
    info!("[SUCCESS] Probe suite initialized");

    let gate = UrlSafetyGate::new(resolver, config.safety.allowlist.clone());
    let engine = ScoreEngine::new();

    let checker = SiteChecker::new(gate, probes, engine, cache, &config.cache);
    let state = Arc::new(AppState { checker });

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(addr = %addr, "[SUCCESS] SiteTrust listening");

    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
