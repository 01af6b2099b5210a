//! Cloudflare GraphQL analytics for a single zone.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use folio_core::TrafficWindow;
use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::client::decode_json;
use crate::error::{Result, UpstreamError};
use crate::UpstreamEndpoints;

const ZONE_TRAFFIC_QUERY: &str = r#"
query ($zoneTag: String!, $start: Time!, $end: Time!) {
  viewer {
    zones(filter: { zoneTag: $zoneTag }) {
      httpRequestsAdaptiveGroups(
        limit: 1
        filter: { datetime_geq: $start, datetime_lt: $end, requestSource: "eyeball" }
      ) {
        count
        sum {
          visits
          edgeResponseBytes
        }
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<Viewer>,
    errors: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct Viewer {
    viewer: Option<Zones>,
}

#[derive(Debug, Deserialize)]
struct Zones {
    #[serde(default)]
    zones: Vec<Zone>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Zone {
    #[serde(default)]
    http_requests_adaptive_groups: Vec<Group>,
}

#[derive(Debug, Default, Deserialize)]
struct Group {
    count: Option<u64>,
    sum: Option<GroupSum>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupSum {
    visits: Option<u64>,
    edge_response_bytes: Option<u64>,
}

#[derive(Clone)]
pub struct CloudflareClient {
    http: reqwest::Client,
    endpoint: String,
}

impl CloudflareClient {
    pub fn new(http: reqwest::Client, endpoints: &UpstreamEndpoints) -> Self {
        Self {
            http,
            endpoint: endpoints.cloudflare_graphql.clone(),
        }
    }

    pub async fn traffic_window(
        &self,
        token: &str,
        zone_tag: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<TrafficWindow> {
        let body = json!({
            "query": ZONE_TRAFFIC_QUERY,
            "variables": {
                "zoneTag": zone_tag,
                "start": start.to_rfc3339_opts(SecondsFormat::Millis, true),
                "end": end.to_rfc3339_opts(SecondsFormat::Millis, true),
            }
        });
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let payload: GraphqlResponse = decode_json(response).await?;
        if let Some(errors) = payload.errors.filter(|errors| !errors.is_empty()) {
            return Err(UpstreamError::Graphql(Value::Array(errors)));
        }
        let group = payload
            .data
            .and_then(|data| data.viewer)
            .and_then(|viewer| viewer.zones.into_iter().next())
            .and_then(|zone| zone.http_requests_adaptive_groups.into_iter().next())
            .unwrap_or_default();
        let sum = group.sum.unwrap_or_default();
        Ok(TrafficWindow {
            visits: sum.visits.unwrap_or(0),
            requests: group.count.unwrap_or(0),
            edge_response_bytes: sum.edge_response_bytes.unwrap_or(0),
        })
    }

    /// Queries `days` consecutive daily windows ending at `end`, concurrently.
    pub async fn daily_traffic(
        &self,
        token: &str,
        zone_tag: &str,
        end: DateTime<Utc>,
        days: u32,
    ) -> Result<Vec<TrafficWindow>> {
        let requests = daily_windows(end, days)
            .into_iter()
            .map(|(start, end)| self.traffic_window(token, zone_tag, start, end));
        try_join_all(requests).await
    }
}

fn daily_windows(end: DateTime<Utc>, days: u32) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    (0..days)
        .map(|index| {
            let window_end = end - Duration::days(i64::from(index));
            (window_end - Duration::days(1), window_end)
        })
        .collect()
}
