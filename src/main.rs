mod api;
mod charts;
mod config;
mod core;
mod deck;
mod decklist;
mod pipeline;
mod resolver;

use crate::api::routes::{AppState, router};
use crate::charts::png::PngChartRenderer;
use crate::charts::renderer::ChartRenderer;
use crate::charts::svg::SvgChartRenderer;
use crate::config::config::{AppCfg, ChartFormat};
use crate::pipeline::analyzer::DeckAnalyzer;
use crate::resolver::rate::RateGate;
use crate::resolver::scryfall::ScryfallResolver;
use anyhow::{Context, Result};
use reqwest::Client;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg_path = std::env::var("DECKSTAT_CONFIG").unwrap_or_else(|_| "config.yml".to_string());
    let cfg = AppCfg::load(&cfg_path)?;

    let span = info_span!(
        "Server",
        pid = %std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
    );

    run(cfg).instrument(span).await
}

async fn run(cfg: AppCfg) -> Result<()> {
    info!("Starting up");

    info!("Initializing Client");
    let client = Client::builder()
        .user_agent(cfg.http.user_agent.clone())
        .pool_idle_timeout(cfg.http.pool_idle_timeout)
        .pool_max_idle_per_host(cfg.http.pool_max_idle_per_host)
        .tcp_keepalive(cfg.http.tcp_keep_alive)
        .timeout(cfg.http.timeout)
        .build()
        .context("building http client")?;

    let resolver = Arc::new(ScryfallResolver::new(cfg.scryfall.clone(), client));
    let gate = RateGate::new(cfg.scryfall.rate_limit_delay)?;
    info!(
        base_url = %cfg.scryfall.base_url,
        spacing_ms = gate.spacing().as_millis() as u64,
        "Card lookups rate gated"
    );

    let renderer: Arc<dyn ChartRenderer> = match cfg.charts.format {
        ChartFormat::Png => Arc::new(PngChartRenderer::new()),
        ChartFormat::Svg => Arc::new(SvgChartRenderer::new()),
    };
    info!(media_type = renderer.media_type(), "Chart renderer ready");

    let analyzer = DeckAnalyzer::new(resolver, renderer, gate);
    let app = router(
        AppState {
            analyzer: Arc::new(analyzer),
        },
        &cfg.server,
    )?;

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.server.bind_addr))?;
    info!(addr = %cfg.server.bind_addr, "Listening");

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, shutting down");
                    shutdown.cancel();
                }
                Err(e) => error!(?e, "Unable to listen for Ctrl-C"),
            }
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("serving http")?;

    info!("Server exit");
    Ok(())
}
