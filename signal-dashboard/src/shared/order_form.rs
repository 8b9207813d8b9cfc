//! Simulated order entry
//!
//! Amount and leverage are edited keystroke by keystroke; an edit that would leave a
//! field in an invalid format is silently dropped. Orders are never sent anywhere.

use crate::shared::{
    error::DashboardError,
    metrics::{self, OrderMetrics},
    types::{MarketSnapshot, Side},
};
use regex::Regex;
use std::{
    sync::LazyLock,
    time::{Duration, Instant},
};
use tracing::info;

/// Non-negative amount with at most two decimal places. A trailing `.` is allowed while typing.
static AMOUNT_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d{0,2})?$").expect("amount pattern is valid"));

static LEVERAGE_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("leverage pattern is valid"));

pub const MAX_LEVERAGE: u32 = 100;

/// Delay before the success banner and the amount are reset
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_secs(3);

pub fn is_valid_amount(text: &str) -> bool {
    text.is_empty() || AMOUNT_FORMAT.is_match(text)
}

pub fn is_valid_leverage(text: &str) -> bool {
    text.is_empty()
        || (LEVERAGE_FORMAT.is_match(text)
            && text.parse::<u32>().is_ok_and(|value| value <= MAX_LEVERAGE))
}

/// Editable field of the order form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Amount,
    Leverage,
}

impl OrderField {
    pub fn label(&self) -> &'static str {
        match self {
            OrderField::Amount => "Amount (USD)",
            OrderField::Leverage => "Leverage",
        }
    }

    fn accepts(&self, text: &str) -> bool {
        match self {
            OrderField::Amount => is_valid_amount(text),
            OrderField::Leverage => is_valid_leverage(text),
        }
    }
}

/// Raw user input, never persisted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderDraft {
    pub amount: String,
    pub leverage: String,
}

impl OrderDraft {
    pub fn amount(&self) -> Option<f64> {
        metrics::parse_amount(&self.amount)
    }

    pub fn leverage(&self) -> Option<u32> {
        metrics::parse_leverage(&self.leverage)
    }

    fn field_mut(&mut self, field: OrderField) -> &mut String {
        match field {
            OrderField::Amount => &mut self.amount,
            OrderField::Leverage => &mut self.leverage,
        }
    }
}

/// Order draft plus the transient submission feedback
#[derive(Debug, Clone)]
pub struct OrderForm {
    draft: OrderDraft,
    reset_delay: Duration,
    success_until: Option<Instant>,
    error: Option<String>,
}

impl Default for OrderForm {
    fn default() -> Self {
        Self::new(DEFAULT_RESET_DELAY)
    }
}

impl OrderForm {
    pub fn new(reset_delay: Duration) -> Self {
        Self {
            draft: OrderDraft::default(),
            reset_delay,
            success_until: None,
            error: None,
        }
    }

    pub fn text(&self, field: OrderField) -> &str {
        match field {
            OrderField::Amount => &self.draft.amount,
            OrderField::Leverage => &self.draft.leverage,
        }
    }

    /// Replace a field's text if the candidate is well formed
    ///
    /// Returns whether the edit was accepted.
    pub fn edit(&mut self, field: OrderField, candidate: &str) -> bool {
        if !field.accepts(candidate) {
            return false;
        }
        let text = self.draft.field_mut(field);
        text.clear();
        text.push_str(candidate);
        true
    }

    pub fn insert_char(&mut self, field: OrderField, c: char) -> bool {
        let mut candidate = self.text(field).to_string();
        candidate.push(c);
        self.edit(field, &candidate)
    }

    pub fn backspace(&mut self, field: OrderField) -> bool {
        let mut candidate = self.text(field).to_string();
        if candidate.pop().is_none() {
            return false;
        }
        self.edit(field, &candidate)
    }

    /// Fields are read-only until a directional signal is present
    pub fn is_editable(snapshot: Option<&MarketSnapshot>) -> bool {
        snapshot.is_some_and(|snapshot| snapshot.signal.is_directional())
    }

    pub fn metrics(&self, snapshot: &MarketSnapshot) -> OrderMetrics {
        metrics::calculate(snapshot, self.draft.amount(), self.draft.leverage())
    }

    fn check(&self, side: Side, snapshot: Option<&MarketSnapshot>) -> Result<(), DashboardError> {
        let Some(snapshot) = snapshot else {
            return Err(DashboardError::Validation(
                "Connect to start trading".to_string(),
            ));
        };
        if snapshot.signal != side.required_signal() {
            return Err(DashboardError::Validation(format!(
                "{side} is only available on a {} signal",
                side.required_signal()
            )));
        }
        match self.draft.amount() {
            Some(amount) if amount > 0.0 => Ok(()),
            _ => Err(DashboardError::Validation(
                "Please enter a valid amount".to_string(),
            )),
        }
    }

    /// Whether `place_order` would currently accept an order on `side`
    pub fn can_submit(&self, side: Side, snapshot: Option<&MarketSnapshot>) -> bool {
        self.check(side, snapshot).is_ok()
    }

    /// Simulate placing an order
    ///
    /// On success the banner stays up until `now + reset_delay`; see [`OrderForm::tick`].
    pub fn place_order(
        &mut self,
        side: Side,
        snapshot: Option<&MarketSnapshot>,
        now: Instant,
    ) -> Result<(), DashboardError> {
        if let Err(error) = self.check(side, snapshot) {
            self.error = Some(error.to_string());
            return Err(error);
        }

        info!(
            %side,
            amount = %self.draft.amount,
            leverage = %self.draft.leverage,
            "Simulated order placed"
        );
        self.error = None;
        self.success_until = Some(now + self.reset_delay);
        Ok(())
    }

    /// Expire the success banner, clearing the amount
    ///
    /// Returns whether anything changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.success_until {
            Some(deadline) if now >= deadline => {
                self.success_until = None;
                self.draft.amount.clear();
                true
            }
            _ => false,
        }
    }

    /// Next instant at which [`OrderForm::tick`] has work to do
    pub fn deadline(&self) -> Option<Instant> {
        self.success_until
    }

    pub fn order_placed(&self) -> bool {
        self.success_until.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::Signal;
    use chrono::Utc;

    fn snapshot(signal: Signal) -> MarketSnapshot {
        MarketSnapshot {
            price: 100.0,
            signal,
            confidence: 0.9,
            stop_loss: 95.0,
            take_profit: 110.0,
            news: Vec::new(),
            received_at: Utc::now(),
        }
    }

    fn typed(form: &mut OrderForm, field: OrderField, text: &str) {
        for c in text.chars() {
            form.insert_char(field, c);
        }
    }

    #[test]
    fn test_amount_format() {
        struct TestCase {
            input: &'static str,
            expected: bool,
        }

        let tests = vec![
            TestCase { input: "", expected: true },
            TestCase { input: "12", expected: true },
            TestCase { input: "12.", expected: true },
            TestCase { input: "12.3", expected: true },
            TestCase { input: "12.34", expected: true },
            TestCase { input: "12.345", expected: false },
            TestCase { input: ".5", expected: false },
            TestCase { input: "-1", expected: false },
            TestCase { input: "1e3", expected: false },
            TestCase { input: "1.2.3", expected: false },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(is_valid_amount(test.input), test.expected, "TC{index} failed");
        }
    }

    #[test]
    fn test_leverage_format() {
        struct TestCase {
            input: &'static str,
            expected: bool,
        }

        let tests = vec![
            TestCase { input: "", expected: true },
            TestCase { input: "0", expected: true },
            TestCase { input: "1", expected: true },
            TestCase { input: "100", expected: true },
            TestCase { input: "101", expected: false },
            TestCase { input: "1.5", expected: false },
            TestCase { input: "x", expected: false },
            TestCase { input: "99999999999", expected: false },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(is_valid_leverage(test.input), test.expected, "TC{index} failed");
        }
    }

    #[test]
    fn test_rejected_keystroke_leaves_field_unchanged() {
        let mut form = OrderForm::default();
        typed(&mut form, OrderField::Amount, "12.345");
        assert_eq!(form.text(OrderField::Amount), "12.34");

        typed(&mut form, OrderField::Leverage, "101");
        assert_eq!(form.text(OrderField::Leverage), "10");
        assert!(!form.insert_char(OrderField::Leverage, 'a'));
        assert_eq!(form.error(), None);
    }

    #[test]
    fn test_backspace() {
        let mut form = OrderForm::default();
        typed(&mut form, OrderField::Amount, "7.5");
        assert!(form.backspace(OrderField::Amount));
        assert_eq!(form.text(OrderField::Amount), "7.");
        assert!(form.backspace(OrderField::Amount));
        assert!(form.backspace(OrderField::Amount));
        assert!(!form.backspace(OrderField::Amount));
        assert_eq!(form.text(OrderField::Amount), "");
    }

    #[test]
    fn test_empty_amount_is_rejected_without_banner() {
        let mut form = OrderForm::default();
        let buy = snapshot(Signal::Buy);

        let result = form.place_order(Side::Buy, Some(&buy), Instant::now());
        assert_eq!(
            result,
            Err(DashboardError::Validation("Please enter a valid amount".to_string()))
        );
        assert!(!form.order_placed());
        assert_eq!(form.error(), Some("Please enter a valid amount"));
    }

    #[test]
    fn test_zero_amount_is_rejected() {
        let mut form = OrderForm::default();
        typed(&mut form, OrderField::Amount, "0.00");
        let buy = snapshot(Signal::Buy);
        assert!(form.place_order(Side::Buy, Some(&buy), Instant::now()).is_err());
        assert!(!form.order_placed());
    }

    #[test]
    fn test_side_must_match_signal() {
        let mut form = OrderForm::default();
        typed(&mut form, OrderField::Amount, "50");

        let sell = snapshot(Signal::Sell);
        assert!(!form.can_submit(Side::Buy, Some(&sell)));
        assert!(form.can_submit(Side::Sell, Some(&sell)));
        assert!(form.place_order(Side::Buy, Some(&sell), Instant::now()).is_err());
        assert!(!form.can_submit(Side::Buy, None));
        assert!(!form.can_submit(Side::Sell, Some(&snapshot(Signal::Hold))));
    }

    #[test]
    fn test_success_banner_resets_after_delay() {
        let mut form = OrderForm::new(Duration::from_secs(3));
        typed(&mut form, OrderField::Amount, "250");
        typed(&mut form, OrderField::Leverage, "5");
        let buy = snapshot(Signal::Buy);
        let now = Instant::now();

        // A previous failure is cleared by a successful submission
        form.error = Some("Please enter a valid amount".to_string());
        assert_eq!(form.place_order(Side::Buy, Some(&buy), now), Ok(()));
        assert!(form.order_placed());
        assert_eq!(form.error(), None);
        assert_eq!(form.deadline(), Some(now + Duration::from_secs(3)));

        assert!(!form.tick(now + Duration::from_secs(2)));
        assert!(form.order_placed());
        assert_eq!(form.text(OrderField::Amount), "250");

        assert!(form.tick(now + Duration::from_secs(3)));
        assert!(!form.order_placed());
        assert_eq!(form.text(OrderField::Amount), "");
        assert_eq!(form.text(OrderField::Leverage), "5");
    }

    #[test]
    fn test_editable_only_on_directional_signal() {
        assert!(!OrderForm::is_editable(None));
        assert!(!OrderForm::is_editable(Some(&snapshot(Signal::Hold))));
        assert!(OrderForm::is_editable(Some(&snapshot(Signal::Buy))));
    }

    #[test]
    fn test_metrics_use_draft() {
        let mut form = OrderForm::default();
        typed(&mut form, OrderField::Amount, "1000");
        typed(&mut form, OrderField::Leverage, "2");
        let metrics = form.metrics(&snapshot(Signal::Buy));
        assert!((metrics.potential_profit - 200.0).abs() < 1e-9);
        assert!((metrics.potential_loss - 100.0).abs() < 1e-9);
    }
}
