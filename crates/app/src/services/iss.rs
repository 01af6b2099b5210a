use std::sync::Arc;

use folio_core::{IssSnapshot, TRAIL_STORE_KEY, TrailPoint, advance_trail};
use folio_upstream::{IssClient, KvClient};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::WriteGate;
use crate::error::{AppError, Result};
use crate::util::time::{next_utc_midnight_ms, now_ms};

/// Live ISS position plus the persisted 30-minute trail.
#[derive(Clone)]
pub struct IssService {
    client: IssClient,
    store: Option<KvClient>,
    gate: Arc<WriteGate>,
}

impl IssService {
    pub(super) fn new(client: IssClient, store: Option<KvClient>) -> Self {
        Self {
            client,
            store,
            gate: Arc::new(WriteGate::default()),
        }
    }

    pub fn write_gate(&self) -> &WriteGate {
        &self.gate
    }

    pub async fn snapshot(&self) -> Result<IssSnapshot> {
        self.snapshot_at(now_ms()).await
    }

    /// Same as [`snapshot`](Self::snapshot) with an explicit clock for the
    /// window, cooldown and lockout rules.
    pub async fn snapshot_at(&self, now_ms: i64) -> Result<IssSnapshot> {
        let position = self
            .client
            .current_position()
            .await
            .map_err(|err| AppError::upstream("Failed to fetch ISS position", err))?;
        let (lat, lon) = position
            .coordinates()
            .map_err(|err| AppError::upstream("Failed to fetch ISS position", err))?;

        let trail = match &self.store {
            Some(store) => self.update_trail(store, lat, lon, now_ms).await,
            None => Vec::new(),
        };

        Ok(IssSnapshot {
            message: position.message,
            timestamp: position.timestamp,
            iss_position: position.iss_position,
            trail,
        })
    }

    async fn update_trail(&self, store: &KvClient, lat: f64, lon: f64, now_ms: i64) -> Vec<TrailPoint> {
        let stored = match store.get(TRAIL_STORE_KEY).await {
            Ok(Some(raw)) => decode_stored_trail(&raw),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("reading ISS trail failed: {err}");
                Vec::new()
            }
        };

        let update = advance_trail(stored, lat, lon, now_ms);
        if !update.appended {
            return update.points;
        }
        if self.gate.is_blocked(now_ms) {
            debug!("trail writes locked out; dropping point");
            return update.points;
        }

        let encoded = match serde_json::to_string(&update.points) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!("encoding ISS trail failed: {err}");
                return update.points;
            }
        };
        if let Err(err) = store.set(TRAIL_STORE_KEY, &encoded).await {
            if err.is_quota_exceeded() {
                let until = next_utc_midnight_ms(now_ms);
                self.gate.block_until(until);
                warn!("store quota exceeded; trail writes paused until {until}: {err}");
            } else {
                warn!("writing ISS trail failed: {err}");
            }
        } else {
            info!(points = update.points.len(), "ISS trail persisted");
        }
        update.points
    }
}

/// Decodes a persisted trail. Anything unreadable is an empty trail.
///
/// Accepts the array itself or a JSON string wrapping it.
pub fn decode_stored_trail(raw: &str) -> Vec<TrailPoint> {
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
            Ok(value) => value,
            Err(err) => {
                debug!("stored trail string is not JSON: {err}");
                return Vec::new();
            }
        },
        Ok(value) => value,
        Err(err) => {
            debug!("stored trail is not JSON: {err}");
            return Vec::new();
        }
    };
    match serde_json::from_value::<Vec<TrailPoint>>(value) {
        Ok(points) => points,
        Err(err) => {
            debug!("stored trail has an unexpected shape: {err}");
            Vec::new()
        }
    }
}
