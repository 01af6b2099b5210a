#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use folio_app::{AppConfig, AppState};
use folio_upstream::{KvCredentials, UpstreamEndpoints};

/// Serves `router` on an ephemeral loopback port and returns its base URL.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve fake upstream");
    });
    format!("http://{addr}")
}

/// Config with no secrets, every upstream pointed at `base`.
pub fn config_for(base: &str) -> AppConfig {
    AppConfig::default()
        .with_endpoints(UpstreamEndpoints::with_base(base))
        .with_upstream_timeout(Duration::from_secs(5))
        .with_github_user("octo")
}

pub fn with_store(mut config: AppConfig, base: &str) -> AppConfig {
    config.kv = Some(KvCredentials {
        url: format!("{base}/kv"),
        token: "kv-token".to_string(),
    });
    config
}

pub fn state(config: AppConfig) -> AppState {
    AppState::new(config).expect("app state")
}

/// A base URL nothing listens on.
pub async fn closed_port() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
