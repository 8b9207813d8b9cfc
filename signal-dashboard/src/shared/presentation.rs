//! Display semantics for the current snapshot
//!
//! Every value here is recomputed from the snapshot on each render.

use crate::shared::types::{MarketSnapshot, Signal};
use ratatui::style::Color;

pub const C_BUY: Color = Color::Rgb(100, 220, 100);
pub const C_SELL: Color = Color::Rgb(220, 100, 100);
pub const C_NEUTRAL: Color = Color::Rgb(180, 180, 100);
pub const C_DIM: Color = Color::Rgb(120, 120, 120);
pub const C_BRIGHT: Color = Color::Rgb(220, 220, 220);
pub const C_ACCENT: Color = Color::Rgb(100, 180, 220);

/// Display emphasis of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Positive,
    Negative,
    Neutral,
}

impl Emphasis {
    pub fn color(&self) -> Color {
        match self {
            Emphasis::Positive => C_BUY,
            Emphasis::Negative => C_SELL,
            Emphasis::Neutral => C_NEUTRAL,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Emphasis::Positive => "▲",
            Emphasis::Negative => "▼",
            Emphasis::Neutral => "▶",
        }
    }
}

impl From<Signal> for Emphasis {
    fn from(signal: Signal) -> Self {
        match signal {
            Signal::Buy => Emphasis::Positive,
            Signal::Sell => Emphasis::Negative,
            Signal::Hold => Emphasis::Neutral,
        }
    }
}

/// Three-tier confidence band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    /// `> 0.8` high, `> 0.5` medium, else low
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.8 {
            ConfidenceBand::High
        } else if confidence > 0.5 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "HIGH",
            ConfidenceBand::Medium => "MEDIUM",
            ConfidenceBand::Low => "LOW",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            ConfidenceBand::High => C_BUY,
            ConfidenceBand::Medium => C_ACCENT,
            ConfidenceBand::Low => C_NEUTRAL,
        }
    }
}

/// Stop-loss and take-profit levels of a directional signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitLevels {
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Presentation model of one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SignalView {
    pub signal: Signal,
    pub emphasis: Emphasis,
    pub band: ConfidenceBand,
    /// Confidence as a percentage
    pub confidence_pct: f64,
    /// `None` while the signal is HOLD
    pub exit_levels: Option<ExitLevels>,
}

impl SignalView {
    pub fn from_snapshot(snapshot: &MarketSnapshot) -> Self {
        let exit_levels = snapshot.signal.is_directional().then_some(ExitLevels {
            stop_loss: snapshot.stop_loss,
            take_profit: snapshot.take_profit,
        });

        Self {
            signal: snapshot.signal,
            emphasis: Emphasis::from(snapshot.signal),
            band: ConfidenceBand::from_confidence(snapshot.confidence),
            confidence_pct: snapshot.confidence * 100.0,
            exit_levels,
        }
    }

    /// Confidence gauge of `width` cells
    pub fn confidence_bar(&self, width: usize) -> String {
        let filled = ((self.confidence_pct / 100.0 * width as f64).round() as usize).min(width);
        format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
    }
}
