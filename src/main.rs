use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tracing::{info, Level};

use clap::Parser;

use asnd::config::AsndConfig;
use asnd::http::HttpServer;
use asnd::lookup::LookupService;
use asnd::ratelimit::RateLimiter;
use asnd::upstream::{AsnResolver, BgpView, CymruWhois};

#[derive(Parser, Debug)]
#[command(name = "asnd")]
#[command(about = "IP-to-ASN lookup service with per-client rate limiting")]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Address to listen on, overriding the configuration file
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Maximum requests per client per window; 0 disables rate limiting
    #[arg(long)]
    max_requests: Option<u32>,

    /// Rate limit window length in seconds
    #[arg(long)]
    window_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    info!("Starting asnd ASN Lookup Service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => AsndConfig::from_file(path)?,
        None => AsndConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }
    if let Some(max_requests) = args.max_requests {
        config.rate_limiting.max_requests = max_requests;
    }
    if let Some(window_secs) = args.window_secs {
        config.rate_limiting.window_secs = window_secs;
    }
    if config.rate_limiting.max_requests > 0 && config.rate_limiting.window_secs == 0 {
        anyhow::bail!("rate_limiting.window_secs must be positive when rate limiting is enabled");
    }
    info!(listen_addr = %config.server.listen_addr, "Configuration loaded");

    // Initialize the rate limiter
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limiting.max_requests,
        Duration::from_secs(config.rate_limiting.window_secs),
    ));
    if limiter.is_disabled() {
        info!("Rate limiting disabled");
    } else {
        info!(
            max_requests = config.rate_limiting.max_requests,
            window_secs = config.rate_limiting.window_secs,
            "Rate limiter initialized"
        );
        spawn_eviction_sweeper(
            Arc::clone(&limiter),
            config.rate_limiting.eviction_interval_secs,
        );
    }

    // Wire up the upstream resolvers
    let primary: Arc<dyn AsnResolver> = Arc::new(CymruWhois::new(
        config.upstream.whois_host.clone(),
        config.upstream.whois_port,
    ));
    let fallback: Option<Arc<dyn AsnResolver>> = if config.upstream.fallback_enabled {
        Some(Arc::new(BgpView::new(config.upstream.bgpview_url.clone())))
    } else {
        None
    };
    info!(
        whois = %config.upstream.whois_host,
        fallback_enabled = config.upstream.fallback_enabled,
        timeout_ms = config.upstream.timeout_ms,
        "Upstream resolvers initialized"
    );

    let service = Arc::new(LookupService::new(
        limiter,
        primary,
        fallback,
        Duration::from_millis(config.upstream.timeout_ms),
    ));

    // Run the server with graceful shutdown on Ctrl+C
    let server = HttpServer::new(config.server.listen_addr, service);
    server.serve_with_shutdown(shutdown_signal()).await?;

    info!("asnd ASN Lookup Service stopped");
    Ok(())
}

/// Periodically purge counters for idle clients. An interval of zero
/// disables the sweep.
fn spawn_eviction_sweeper(limiter: Arc<RateLimiter>, interval_secs: u64) {
    if interval_secs == 0 {
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick completes immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            limiter.evict_idle(Instant::now());
        }
    });
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
