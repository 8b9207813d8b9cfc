/// Signal Dashboard - Shared Library
///
/// Everything behind the `signal-dashboard` terminal binary lives here:
/// - Core data types for the signal stream and a strict frame decoder
/// - WebSocket connection manager with an explicit lifecycle state machine
/// - Derived order metrics, signal presentation and order-form validation
/// - View state and ratatui rendering
pub mod shared;

// Re-export commonly used types for convenience
pub use shared::types::{Interval, MarketSnapshot, Side, Signal, Strategy, StreamParams};

pub use shared::app::{App, Focus};
pub use shared::config::DashboardConfig;
pub use shared::decoder::decode;
pub use shared::error::DashboardError;
pub use shared::metrics::{OrderMetrics, RiskReward};
pub use shared::order_form::{OrderDraft, OrderField, OrderForm};
pub use shared::presentation::{ConfidenceBand, Emphasis, SignalView};
pub use shared::websocket::{
    ConnectionManager, ConnectionState, ConnectionUpdate, SessionEvent, WebSocketConfig,
};
pub use shared::widget::render_ui;
