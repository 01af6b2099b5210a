use folio_core::IssPosition;
use serde::Deserialize;

use crate::client::decode_json;
use crate::error::{Result, UpstreamError};
use crate::UpstreamEndpoints;

#[derive(Debug, Clone, Deserialize)]
pub struct IssNow {
    pub message: String,
    pub timestamp: i64,
    pub iss_position: IssPosition,
}

impl IssNow {
    /// Latitude and longitude as numbers.
    pub fn coordinates(&self) -> Result<(f64, f64)> {
        let parse = |value: &str| {
            value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .ok_or_else(|| UpstreamError::Payload(format!("invalid ISS coordinate {value:?}")))
        };
        Ok((
            parse(&self.iss_position.latitude)?,
            parse(&self.iss_position.longitude)?,
        ))
    }
}

#[derive(Clone)]
pub struct IssClient {
    http: reqwest::Client,
    url: String,
}

impl IssClient {
    pub fn new(http: reqwest::Client, endpoints: &UpstreamEndpoints) -> Self {
        Self {
            http,
            url: endpoints.iss_now.clone(),
        }
    }

    pub async fn current_position(&self) -> Result<IssNow> {
        let response = self
            .http
            .get(&self.url)
            .header("Cache-Control", "no-cache")
            .send()
            .await?;
        let payload: IssNow = decode_json(response).await?;
        if payload.message != "success" {
            return Err(UpstreamError::Payload(format!(
                "ISS API returned {:?}",
                payload.message
            )));
        }
        Ok(payload)
    }
}
