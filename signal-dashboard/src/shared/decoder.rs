//! Strict decoding of inbound signal frames into [`MarketSnapshot`]s.
//!
//! Frames that fail to decode are rejected as a whole; nothing untyped reaches the view.

use crate::shared::{
    error::DashboardError,
    types::{MarketSnapshot, Signal},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Wire shape of a signal frame. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct SnapshotMessage {
    price: f64,
    signal: Signal,
    confidence: f64,
    stop_loss: f64,
    take_profit: f64,
    #[serde(default)]
    news: Option<Vec<String>>,
}

/// Decode a raw text frame, stamping it with the current time.
pub fn decode(raw: &str) -> Result<MarketSnapshot, DashboardError> {
    decode_at(raw, Utc::now())
}

/// Decode a raw text frame received at `received_at`.
pub fn decode_at(raw: &str, received_at: DateTime<Utc>) -> Result<MarketSnapshot, DashboardError> {
    let message = serde_json::from_str::<SnapshotMessage>(raw)?;
    validate(message, received_at)
}

fn validate(
    message: SnapshotMessage,
    received_at: DateTime<Utc>,
) -> Result<MarketSnapshot, DashboardError> {
    let SnapshotMessage {
        price,
        signal,
        confidence,
        stop_loss,
        take_profit,
        news,
    } = message;

    if !price.is_finite() || price <= 0.0 {
        return Err(DashboardError::MalformedMessage(format!(
            "price must be positive, got {price}"
        )));
    }
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(DashboardError::MalformedMessage(format!(
            "confidence must be within [0, 1], got {confidence}"
        )));
    }
    for (name, level) in [("stop_loss", stop_loss), ("take_profit", take_profit)] {
        if !level.is_finite() || level < 0.0 {
            return Err(DashboardError::MalformedMessage(format!(
                "{name} must be non-negative, got {level}"
            )));
        }
    }

    Ok(MarketSnapshot {
        price,
        signal,
        confidence,
        stop_loss,
        take_profit,
        news: news.unwrap_or_default(),
        received_at,
    })
}
