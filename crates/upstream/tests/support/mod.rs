#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use folio_upstream::{UpstreamEndpoints, build_http_client};

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

pub fn http_client() -> reqwest::Client {
    build_http_client(Duration::from_secs(5)).expect("http client")
}

pub fn endpoints(base: &str) -> UpstreamEndpoints {
    UpstreamEndpoints::with_base(base)
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
