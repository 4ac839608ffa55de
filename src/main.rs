use clap::Parser;
use number_lookup::api::create_router;
use number_lookup::utils::{logger, validation::Validate};
use number_lookup::{CliConfig, HttpFetcher, LookupEngine};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting number-lookup server");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = cli.load()?;

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let settings = config.settings();
    let fetcher = Arc::new(HttpFetcher::new(&settings)?);
    let engine = Arc::new(LookupEngine::from_config(&config, fetcher));

    tracing::info!(
        "🔧 {} sources configured, timeout {:?}, concurrency {}",
        engine.probes().len(),
        settings.request_timeout,
        settings.max_concurrent_probes
    );
    for probe in engine.probes() {
        tracing::debug!("  - {} ({})", probe.platform, probe.strategy);
    }

    let app = create_router(engine, config.server.cors);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Listening on http://{}", listener.local_addr()?);
    tracing::info!("📖 GET /health, GET /search?number=919876543210");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
