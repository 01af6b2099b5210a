//! Adapters for every third-party API the dashboard reads.
//!
//! Each client wraps one upstream (or one family of calls) and maps its
//! response into `folio_core` types. Clients share a single `reqwest::Client`
//! and take their base URLs from [`UpstreamEndpoints`].

pub mod anthropic;
pub mod atom;
pub mod client;
pub mod cloudflare;
pub mod contributions;
pub mod error;
pub mod github;
pub mod iss;
pub mod kv;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use atom::{AtomEntry, atom_items, parse_atom_entries};
pub use client::{UpstreamEndpoints, build_http_client};
pub use cloudflare::CloudflareClient;
pub use contributions::parse_contribution_cells;
pub use error::{Result, UpstreamError};
pub use github::{GITHUB_TIMEOUT, GithubClient, GithubCommit, GithubRepo, commit_item, event_items};
pub use iss::{IssClient, IssNow};
pub use kv::{KvClient, KvCredentials};
pub use openai::OpenAiClient;
