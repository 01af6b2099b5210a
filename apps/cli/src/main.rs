mod args;
mod config;
mod logging;

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use app_api::AppContext;
use folio_app::{AppConfig, AppState};
use http_api::HttpState;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = args::parse_args().map_err(|err| {
        eprintln!("{err}");
        args::print_help();
        io::Error::new(io::ErrorKind::InvalidInput, "invalid arguments")
    })?;
    if args.help {
        args::print_help();
        return Ok(());
    }

    let dotenv = dotenvy::dotenv();
    logging::init();
    match dotenv {
        Ok(path) => info!("loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => warn!("ignoring .env: {err}"),
    }

    let config = config::load_or_create().map_err(io::Error::other)?;
    if config.created {
        info!(
            "created config at {} (default port {})",
            config.paths.file.display(),
            config.config.port
        );
    }

    let app_config = AppConfig::from_env()
        .with_github_user(config.config.github_user.clone())
        .with_upstream_timeout(Duration::from_secs(config.config.upstream_timeout_secs));
    log_feature_status(&app_config);

    let app_state = AppState::new(app_config)?;
    let router = http_api::router(HttpState::new(AppContext::new(app_state)));

    let host = args.host.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
    let port = args.port.unwrap_or(config.config.port);
    let (listener, actual_port, used_fallback) = bind_port(host, port).await?;
    if used_fallback {
        warn!("configured port {port} was unavailable; using {actual_port} for this run");
    }
    info!("folio is listening on http://{}", SocketAddr::new(host, actual_port));

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

fn log_feature_status(config: &AppConfig) {
    let feeds = [
        ("anthropic usage", config.anthropic.admin_key.is_some()),
        ("openai usage", config.openai.admin_key.is_some()),
        (
            "site stats",
            config.cloudflare.api_token.is_some() && config.cloudflare.zone_id.is_some(),
        ),
        ("iss trail store", config.kv.is_some()),
        ("github token", config.github_token.is_some()),
    ];
    for (feed, configured) in feeds {
        if configured {
            info!("{feed}: configured");
        } else {
            warn!("{feed}: not configured");
        }
    }
}

async fn bind_port(host: IpAddr, port: u16) -> Result<(tokio::net::TcpListener, u16, bool), io::Error> {
    if port == 0 {
        let listener = tokio::net::TcpListener::bind(SocketAddr::new(host, 0)).await?;
        let actual_port = listener.local_addr()?.port();
        return Ok((listener, actual_port, false));
    }

    match tokio::net::TcpListener::bind(SocketAddr::new(host, port)).await {
        Ok(listener) => Ok((listener, port, false)),
        Err(err) => {
            warn!("bind {host}:{port} failed: {err}");
            let listener = tokio::net::TcpListener::bind(SocketAddr::new(host, 0)).await?;
            let actual_port = listener.local_addr()?.port();
            Ok((listener, actual_port, true))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received SIGTERM, shutting down");
            }
            Err(err) => {
                warn!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
