//! Startup configuration read from environment variables
//!
//! | Variable                | Default                   |
//! |-------------------------|---------------------------|
//! | `SIGNAL_WS_URL`         | `ws://localhost:8000/ws`  |
//! | `SIGNAL_SYMBOLS`        | `BTCUSDT,ETHUSDT,BNBUSDT,ADAUSDT,SOLUSDT` |
//! | `SIGNAL_PING_SECS`      | `30`                      |
//! | `SIGNAL_ORDER_RESET_MS` | `3000`                    |
//! | `SIGNAL_DASHBOARD_LOG`  | `signal-dashboard.log`    |

use crate::shared::{error::DashboardError, websocket::WebSocketConfig};
use std::{path::PathBuf, time::Duration};
use url::Url;

pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws";
pub const DEFAULT_SYMBOLS: [&str; 5] = ["BTCUSDT", "ETHUSDT", "BNBUSDT", "ADAUSDT", "SOLUSDT"];
pub const DEFAULT_LOG_PATH: &str = "signal-dashboard.log";

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Signal backend endpoint, without stream query parameters
    pub ws_url: Url,
    /// Symbol presets offered by the selector
    pub symbols: Vec<String>,
    pub ping_interval: Duration,
    /// How long the order success banner stays up
    pub order_reset_delay: Duration,
    pub log_path: PathBuf,
}

impl DashboardConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, DashboardError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for unset keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DashboardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ws_url = match lookup("SIGNAL_WS_URL") {
            Some(url) => parse_ws_url(&url)?,
            None => parse_ws_url(DEFAULT_WS_URL)?,
        };

        let symbols = match lookup("SIGNAL_SYMBOLS") {
            Some(raw) => parse_symbols(&raw)?,
            None => DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        };

        let ping_interval = match lookup("SIGNAL_PING_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("SIGNAL_PING_SECS", &raw)?),
            None => Duration::from_secs(30),
        };

        let order_reset_delay = match lookup("SIGNAL_ORDER_RESET_MS") {
            Some(raw) => Duration::from_millis(parse_positive("SIGNAL_ORDER_RESET_MS", &raw)?),
            None => Duration::from_millis(3000),
        };

        let log_path = lookup("SIGNAL_DASHBOARD_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH));

        Ok(Self {
            ws_url,
            symbols,
            ping_interval,
            order_reset_delay,
            log_path,
        })
    }

    /// Socket settings for the connection manager
    pub fn websocket_config(&self) -> WebSocketConfig {
        WebSocketConfig::new(self.ws_url.clone()).with_ping_interval(self.ping_interval)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            ws_url: Url::parse(DEFAULT_WS_URL).expect("default url is valid"),
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            ping_interval: Duration::from_secs(30),
            order_reset_delay: Duration::from_millis(3000),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

fn parse_ws_url(raw: &str) -> Result<Url, DashboardError> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        scheme => Err(DashboardError::Config(format!(
            "SIGNAL_WS_URL must use ws:// or wss://, got {scheme}://"
        ))),
    }
}

fn parse_symbols(raw: &str) -> Result<Vec<String>, DashboardError> {
    let symbols: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

    if symbols.is_empty() {
        return Err(DashboardError::Config(
            "SIGNAL_SYMBOLS must name at least one symbol".to_string(),
        ));
    }
    Ok(symbols)
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, DashboardError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(DashboardError::Config(format!(
            "{key} must be a positive integer, got {raw:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.ws_url.as_str(), "ws://localhost:8000/ws");
        assert_eq!(config.symbols.len(), 5);
        assert_eq!(config.order_reset_delay, Duration::from_secs(3));
    }

    #[test]
    fn test_overrides() {
        let config = DashboardConfig::from_lookup(lookup(&[
            ("SIGNAL_WS_URL", "wss://signals.example.com/ws"),
            ("SIGNAL_SYMBOLS", " ethusdt, solusdt ,,"),
            ("SIGNAL_PING_SECS", "10"),
            ("SIGNAL_ORDER_RESET_MS", "500"),
            ("SIGNAL_DASHBOARD_LOG", "/tmp/dash.log"),
        ]))
        .unwrap();

        assert_eq!(config.ws_url.as_str(), "wss://signals.example.com/ws");
        assert_eq!(config.symbols, vec!["ETHUSDT", "SOLUSDT"]);
        assert_eq!(config.ping_interval, Duration::from_secs(10));
        assert_eq!(config.order_reset_delay, Duration::from_millis(500));
        assert_eq!(config.log_path, PathBuf::from("/tmp/dash.log"));
    }

    #[test]
    fn test_invalid_values() {
        let cases: [&[(&str, &str)]; 5] = [
            &[("SIGNAL_WS_URL", "not a url")],
            &[("SIGNAL_WS_URL", "http://localhost:8000/ws")],
            &[("SIGNAL_SYMBOLS", " , ")],
            &[("SIGNAL_PING_SECS", "0")],
            &[("SIGNAL_ORDER_RESET_MS", "soon")],
        ];

        for (index, vars) in cases.into_iter().enumerate() {
            let actual = DashboardConfig::from_lookup(lookup(vars));
            assert!(
                matches!(actual, Err(DashboardError::Config(_))),
                "TC{index} failed, got {actual:?}"
            );
        }
    }

    #[test]
    fn test_websocket_config() {
        let config = DashboardConfig::default();
        let ws = config.websocket_config();
        assert_eq!(ws.url, config.ws_url);
        assert_eq!(ws.ping_interval, config.ping_interval);
    }
}
