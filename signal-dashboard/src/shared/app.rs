//! Dashboard view state
//!
//! The app exclusively owns the connection manager and the current snapshot. All
//! input arrives through `handle_key`, `handle_session_event` and `tick`, which
//! the binary calls from a single select loop.

use crate::shared::{
    config::DashboardConfig,
    decoder,
    order_form::{OrderField, OrderForm},
    types::{MarketSnapshot, Side, StreamParams, cycle},
    websocket::{ConnectionManager, ConnectionState, ConnectionUpdate, SessionEvent},
};
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{collections::VecDeque, time::Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Prices kept for the price sparkline
const PRICE_HISTORY_LEN: usize = 240;

/// Focusable control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Symbol,
    Interval,
    Strategy,
    Amount,
    Leverage,
}

impl Focus {
    pub const ALL: [Focus; 5] = [
        Focus::Symbol,
        Focus::Interval,
        Focus::Strategy,
        Focus::Amount,
        Focus::Leverage,
    ];

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, true)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::ALL, self, false)
    }

    pub fn order_field(&self) -> Option<OrderField> {
        match self {
            Focus::Amount => Some(OrderField::Amount),
            Focus::Leverage => Some(OrderField::Leverage),
            _ => None,
        }
    }
}

pub struct App {
    connection: ConnectionManager,
    symbols: Vec<String>,
    params: StreamParams,
    focus: Focus,
    snapshot: Option<MarketSnapshot>,
    snapshot_live: bool,
    price_history: VecDeque<f64>,
    order_form: OrderForm,
    error_banner: Option<String>,
    dropped_frames: u64,
    should_quit: bool,
}

impl App {
    /// Create the app and the receiver its connection events arrive on
    pub fn new(config: &DashboardConfig) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (connection, event_rx) = ConnectionManager::new(config.websocket_config());
        let symbols = config.symbols.clone();
        let params = StreamParams {
            symbol: symbols.first().cloned().unwrap_or_default(),
            ..StreamParams::default()
        };

        let app = Self {
            connection,
            symbols,
            params,
            focus: Focus::Symbol,
            snapshot: None,
            snapshot_live: false,
            price_history: VecDeque::with_capacity(PRICE_HISTORY_LEN),
            order_form: OrderForm::new(config.order_reset_delay),
            error_banner: None,
            dropped_frames: 0,
            should_quit: false,
        };
        (app, event_rx)
    }

    pub fn params(&self) -> &StreamParams {
        &self.params
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn snapshot(&self) -> Option<&MarketSnapshot> {
        self.snapshot.as_ref()
    }

    /// Whether the displayed snapshot came from the currently open connection
    pub fn is_live(&self) -> bool {
        self.snapshot_live
    }

    pub fn price_history(&self) -> &VecDeque<f64> {
        &self.price_history
    }

    pub fn order_form(&self) -> &OrderForm {
        &self.order_form
    }

    pub fn error_banner(&self) -> Option<&str> {
        self.error_banner.as_deref()
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Dial the backend with the selected parameters, replacing any open connection
    pub fn connect(&mut self) {
        info!(
            symbol = %self.params.symbol,
            interval = %self.params.interval,
            strategy = %self.params.strategy,
            "Connecting"
        );
        self.error_banner = None;
        self.snapshot_live = false;
        self.price_history.clear();
        self.connection.connect(&self.params);
    }

    /// Close the connection and stop the event loop
    pub fn quit(&mut self) {
        self.connection.close();
        self.should_quit = true;
    }

    pub fn dismiss_error(&mut self) {
        self.error_banner = None;
    }

    pub fn place_order(&mut self, side: Side, now: Instant) {
        if let Err(e) = self
            .order_form
            .place_order(side, self.snapshot.as_ref(), now)
        {
            debug!(%side, "Order rejected: {}", e);
        }
    }

    /// Advance timers; returns whether the screen needs a redraw
    pub fn tick(&mut self, now: Instant) -> bool {
        self.order_form.tick(now)
    }

    pub fn handle_session_event(&mut self, event: SessionEvent) {
        if let Some(update) = self.connection.handle_event(event) {
            self.handle_update(update, Utc::now());
        }
    }

    /// Apply an accepted connection update
    pub fn handle_update(&mut self, update: ConnectionUpdate, received_at: DateTime<Utc>) {
        match update {
            ConnectionUpdate::Opened => {
                debug!("Stream open, waiting for first snapshot");
            }
            ConnectionUpdate::Frame(text) => match decoder::decode_at(&text, received_at) {
                Ok(snapshot) => self.apply_snapshot(snapshot),
                Err(e) => {
                    self.dropped_frames += 1;
                    warn!("Dropping frame: {}", e);
                    debug!("Raw frame: {}", text.chars().take(200).collect::<String>());
                }
            },
            ConnectionUpdate::Closed => {
                self.snapshot_live = false;
            }
            ConnectionUpdate::Failed(e) => {
                self.snapshot_live = false;
                self.error_banner = Some(format!("{e}. Press c to reconnect."));
            }
        }
    }

    /// Replace the current snapshot wholesale
    fn apply_snapshot(&mut self, snapshot: MarketSnapshot) {
        if self.price_history.len() == PRICE_HISTORY_LEN {
            self.price_history.pop_front();
        }
        self.price_history.push_back(snapshot.price);
        self.snapshot = Some(snapshot);
        self.snapshot_live = true;
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Left => self.cycle_selector(false),
            KeyCode::Right => self.cycle_selector(true),
            KeyCode::Enter if self.focus.order_field().is_none() => self.connect(),
            KeyCode::Char('c') | KeyCode::Char('C') => self.connect(),
            KeyCode::Char('b') | KeyCode::Char('B') => self.place_order(Side::Buy, now),
            KeyCode::Char('s') | KeyCode::Char('S') => self.place_order(Side::Sell, now),
            KeyCode::Char('x') | KeyCode::Char('X') => self.dismiss_error(),
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => self.edit_focused(|form, field| {
                form.insert_char(field, c);
            }),
            KeyCode::Backspace => self.edit_focused(|form, field| {
                form.backspace(field);
            }),
            _ => {}
        }
    }

    fn edit_focused<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut OrderForm, OrderField),
    {
        let Some(field) = self.focus.order_field() else {
            return;
        };
        if OrderForm::is_editable(self.snapshot.as_ref()) {
            edit(&mut self.order_form, field);
        }
    }

    fn cycle_selector(&mut self, forward: bool) {
        match self.focus {
            Focus::Symbol => {
                if let Some(idx) = self.symbols.iter().position(|s| *s == self.params.symbol) {
                    let len = self.symbols.len();
                    let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
                    self.params.symbol = self.symbols[next].clone();
                }
            }
            Focus::Interval => {
                self.params.interval = if forward {
                    self.params.interval.next()
                } else {
                    self.params.interval.prev()
                };
            }
            Focus::Strategy => {
                self.params.strategy = if forward {
                    self.params.strategy.next()
                } else {
                    self.params.strategy.prev()
                };
            }
            Focus::Amount | Focus::Leverage => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{
        error::DashboardError,
        types::{Interval, Signal, Strategy},
    };

    const BUY_FRAME: &str = r#"{"price": 100.0, "signal": "BUY", "confidence": 0.9, "stop_loss": 95.0, "take_profit": 110.0, "news": ["Headline"]}"#;
    const HOLD_FRAME: &str = r#"{"price": 101.0, "signal": "HOLD", "confidence": 0.3, "stop_loss": 0.0, "take_profit": 0.0}"#;

    fn app() -> App {
        App::new(&DashboardConfig::default()).0
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE), Instant::now());
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn frame(app: &mut App, text: &str) {
        app.handle_update(ConnectionUpdate::Frame(text.to_string()), Utc::now());
    }

    #[test]
    fn test_snapshot_replaced_wholesale() {
        let mut app = app();
        frame(&mut app, BUY_FRAME);
        assert_eq!(app.snapshot().unwrap().news, vec!["Headline".to_string()]);

        frame(&mut app, HOLD_FRAME);
        let snapshot = app.snapshot().unwrap();
        assert_eq!(snapshot.signal, Signal::Hold);
        assert!(snapshot.news.is_empty());
        assert_eq!(app.price_history().iter().copied().collect::<Vec<_>>(), vec![100.0, 101.0]);
    }

    #[test]
    fn test_malformed_frame_keeps_previous_snapshot() {
        let mut app = app();
        frame(&mut app, BUY_FRAME);
        let before = app.snapshot().cloned();

        frame(&mut app, r#"{"signal": "SELL", "confidence": 0.9, "stop_loss": 1.0, "take_profit": 2.0}"#);
        assert_eq!(app.snapshot().cloned(), before);
        assert_eq!(app.dropped_frames(), 1);
        assert!(app.is_live());
        assert_eq!(app.error_banner(), None);
    }

    #[test]
    fn test_failure_shows_banner_and_marks_stale() {
        let mut app = app();
        frame(&mut app, BUY_FRAME);
        app.handle_update(
            ConnectionUpdate::Failed(DashboardError::Connection("connection reset".to_string())),
            Utc::now(),
        );

        assert!(!app.is_live());
        assert!(app.snapshot().is_some());
        assert!(app.error_banner().unwrap().contains("connection reset"));

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.error_banner(), None);
    }

    #[tokio::test]
    async fn test_reconnect_keeps_last_snapshot_as_stale() {
        let mut app = app();
        frame(&mut app, BUY_FRAME);
        app.handle_update(ConnectionUpdate::Closed, Utc::now());
        assert!(!app.is_live());

        app.connect();
        assert_eq!(app.connection_state(), ConnectionState::Connecting);
        assert!(app.snapshot().is_some());
        assert!(!app.is_live());
        assert!(app.price_history().is_empty());
        app.quit();
        assert_eq!(app.connection_state(), ConnectionState::Closed);
    }

    #[test]
    fn test_selectors_cycle() {
        let mut app = app();
        assert_eq!(app.params().symbol, "BTCUSDT");
        press(&mut app, KeyCode::Right);
        assert_eq!(app.params().symbol, "ETHUSDT");
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.params().symbol, "SOLUSDT");

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus(), Focus::Interval);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.params().interval, Interval::M5);

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.params().strategy, Strategy::BollingerBreakout);

        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus(), Focus::Interval);
    }

    #[test]
    fn test_order_fields_read_only_without_directional_signal() {
        let mut app = app();
        app.focus = Focus::Amount;
        type_text(&mut app, "12");
        assert_eq!(app.order_form().text(OrderField::Amount), "");

        frame(&mut app, HOLD_FRAME);
        type_text(&mut app, "12");
        assert_eq!(app.order_form().text(OrderField::Amount), "");

        frame(&mut app, BUY_FRAME);
        type_text(&mut app, "12.345");
        assert_eq!(app.order_form().text(OrderField::Amount), "12.34");
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.order_form().text(OrderField::Amount), "12.3");
    }

    #[test]
    fn test_place_order_flow() {
        let mut app = app();
        frame(&mut app, BUY_FRAME);

        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.order_form().error(), Some("Please enter a valid amount"));
        assert!(!app.order_form().order_placed());

        app.focus = Focus::Amount;
        type_text(&mut app, "100");
        let now = Instant::now();
        app.place_order(Side::Buy, now);
        assert!(app.order_form().order_placed());
        assert_eq!(app.order_form().error(), None);

        assert!(app.tick(now + std::time::Duration::from_secs(3)));
        assert!(!app.order_form().order_placed());
        assert_eq!(app.order_form().text(OrderField::Amount), "");
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit());

        let mut app = self::app();
        app.handle_key(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Instant::now(),
        );
        assert!(app.should_quit());
    }
}
