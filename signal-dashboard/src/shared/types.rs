/// Core data types for the signal stream
///
/// These types match the JSON frames sent by the signal backend at
/// ws://localhost:8000/ws

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Advisory trading direction published by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Convert to the wire/display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }

    /// Stop-loss and take-profit only carry meaning for directional signals
    pub fn is_directional(&self) -> bool {
        !matches!(self, Signal::Hold)
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Side of a simulated order (Buy/Long or Sell/Short)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Convert to display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "Buy / Long",
            Side::Sell => "Sell / Short",
        }
    }

    /// The only signal under which an order on this side may be placed
    pub fn required_signal(&self) -> Signal {
        match self {
            Side::Buy => Signal::Buy,
            Side::Sell => Signal::Sell,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bar timeframe accepted by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Interval {
    pub const ALL: [Interval; 7] = [
        Interval::M1,
        Interval::M5,
        Interval::M15,
        Interval::M30,
        Interval::H1,
        Interval::H4,
        Interval::D1,
    ];

    /// Query parameter token
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::H1 => "1h",
            Interval::H4 => "4h",
            Interval::D1 => "1d",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, true)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::ALL, self, false)
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Signal generation strategy run by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    FvgLiquidity,
    RsiMacd,
    BollingerBreakout,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::FvgLiquidity,
        Strategy::RsiMacd,
        Strategy::BollingerBreakout,
    ];

    /// Query parameter token
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::FvgLiquidity => "fvg_liquidity",
            Strategy::RsiMacd => "rsi_macd",
            Strategy::BollingerBreakout => "bollinger_breakout",
        }
    }

    /// Human readable label for the selector
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::FvgLiquidity => "FVG + Liquidity",
            Strategy::RsiMacd => "RSI + MACD",
            Strategy::BollingerBreakout => "Bollinger Breakout",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, true)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::ALL, self, false)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Step through a closed set, wrapping at both ends
pub fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let len = all.len();
    let idx = all.iter().position(|v| *v == current).unwrap_or(0);
    let next = if forward {
        (idx + 1) % len
    } else {
        (idx + len - 1) % len
    };
    all[next]
}

/// Query parameters addressing one signal stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamParams {
    /// Exchange pair ticker (e.g., "BTCUSDT")
    pub symbol: String,
    pub interval: Interval,
    pub strategy: Strategy,
}

impl StreamParams {
    pub fn new(symbol: impl Into<String>, interval: Interval, strategy: Strategy) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            strategy,
        }
    }
}

impl Default for StreamParams {
    fn default() -> Self {
        Self::new("BTCUSDT", Interval::M1, Strategy::FvgLiquidity)
    }
}

/// One immutable, fully-replacing update of market and signal state
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    /// Current quoted price
    pub price: f64,
    pub signal: Signal,
    /// Model confidence in [0, 1]
    pub confidence: f64,
    /// Only meaningful when the signal is directional
    pub stop_loss: f64,
    /// Only meaningful when the signal is directional
    pub take_profit: f64,
    /// Headlines, most recent first
    pub news: Vec<String>,
    /// Local receive time
    pub received_at: DateTime<Utc>,
}
