//! Potential profit, potential loss and risk/reward for a hypothetical position
//!
//! All calculations are pure functions of the current snapshot and the order draft.
//! Results are never clamped: inconsistent stop-loss/take-profit levels surface as
//! negative numbers.

use crate::shared::types::{MarketSnapshot, Signal};

/// Potential profit divided by potential loss, when loss is positive
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RiskReward {
    Ratio(f64),
    NotApplicable,
}

impl std::fmt::Display for RiskReward {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskReward::Ratio(ratio) => write!(f, "{ratio:.2}"),
            RiskReward::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// Derived figures shown in the order panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderMetrics {
    pub potential_profit: f64,
    pub potential_loss: f64,
    pub risk_reward: RiskReward,
}

/// Parse amount text; empty or unparsable text is unset
pub fn parse_amount(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|amount| amount.is_finite())
}

/// Parse leverage text; empty or unparsable text is unset
pub fn parse_leverage(text: &str) -> Option<u32> {
    text.parse::<u32>().ok()
}

/// Leverage applied to the notional, where zero or unset means 1x
pub fn effective_leverage(leverage: Option<u32>) -> f64 {
    match leverage {
        Some(0) | None => 1.0,
        Some(value) => f64::from(value),
    }
}

/// Amount and leverage to size with, or `None` when there is nothing to size
fn sizing(snapshot: &MarketSnapshot, amount: Option<f64>, leverage: Option<u32>) -> Option<(f64, f64)> {
    if snapshot.signal == Signal::Hold {
        return None;
    }
    let amount = amount.filter(|amount| *amount > 0.0)?;
    Some((amount, effective_leverage(leverage)))
}

/// Profit if the take-profit level is reached
pub fn potential_profit(snapshot: &MarketSnapshot, amount: Option<f64>, leverage: Option<u32>) -> f64 {
    let Some((amount, leverage)) = sizing(snapshot, amount, leverage) else {
        return 0.0;
    };
    let price = snapshot.price;
    match snapshot.signal {
        Signal::Buy => (snapshot.take_profit - price) / price * amount * leverage,
        Signal::Sell => (price - snapshot.take_profit) / price * amount * leverage,
        Signal::Hold => 0.0,
    }
}

/// Loss if the stop-loss level is reached
pub fn potential_loss(snapshot: &MarketSnapshot, amount: Option<f64>, leverage: Option<u32>) -> f64 {
    let Some((amount, leverage)) = sizing(snapshot, amount, leverage) else {
        return 0.0;
    };
    let price = snapshot.price;
    match snapshot.signal {
        Signal::Buy => (price - snapshot.stop_loss) / price * amount * leverage,
        Signal::Sell => (snapshot.stop_loss - price) / price * amount * leverage,
        Signal::Hold => 0.0,
    }
}

pub fn risk_reward(profit: f64, loss: f64) -> RiskReward {
    if loss > 0.0 {
        RiskReward::Ratio(profit / loss)
    } else {
        RiskReward::NotApplicable
    }
}

/// Calculate every derived figure for the order panel
pub fn calculate(snapshot: &MarketSnapshot, amount: Option<f64>, leverage: Option<u32>) -> OrderMetrics {
    let potential_profit = potential_profit(snapshot, amount, leverage);
    let potential_loss = potential_loss(snapshot, amount, leverage);
    OrderMetrics {
        potential_profit,
        potential_loss,
        risk_reward: risk_reward(potential_profit, potential_loss),
    }
}
