//! Ratatui rendering of the dashboard screen

use crate::shared::{
    app::{App, Focus},
    metrics::RiskReward,
    order_form::{OrderField, OrderForm},
    presentation::{C_ACCENT, C_BRIGHT, C_BUY, C_DIM, C_NEUTRAL, C_SELL, SignalView},
    types::Side,
    websocket::ConnectionState,
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline, Wrap},
};

/// Render the whole dashboard
pub fn render_ui(f: &mut Frame, app: &App) {
    let banner_height = if app.error_banner().is_some() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(banner_height),
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .split(f.area());

    let body = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[3]);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(body[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(body[1]);

    render_header(f, app, chunks[0]);
    if let Some(message) = app.error_banner() {
        render_error_banner(f, message, chunks[1]);
    }
    render_selectors(f, app, chunks[2]);
    render_price_panel(f, app, top[0]);
    render_signal_panel(f, app, top[1]);
    render_order_panel(f, app, bottom[0]);
    render_news_panel(f, app, bottom[1]);
    render_footer(f, chunks[4]);
}

fn state_color(state: ConnectionState) -> Color {
    match state {
        ConnectionState::Open => C_BUY,
        ConnectionState::Connecting => C_NEUTRAL,
        ConnectionState::Errored => C_SELL,
        ConnectionState::Idle | ConnectionState::Closed => C_DIM,
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let state = app.connection_state();
    let last_update = app
        .snapshot()
        .map(|s| s.received_at.format("%H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "--".to_string());

    let mut spans = vec![
        Span::styled(
            " ▲ AI SIGNAL DASHBOARD ",
            Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            format!("[{state}]"),
            Style::default()
                .fg(state_color(state))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("Last update: ", Style::default().fg(C_DIM)),
        Span::styled(last_update, Style::default().fg(C_BRIGHT)),
    ];
    if app.dropped_frames() > 0 {
        spans.push(Span::styled(
            format!("  dropped frames: {}", app.dropped_frames()),
            Style::default().fg(C_NEUTRAL),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(state_color(state)));
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_error_banner(f: &mut Frame, message: &str, area: Rect) {
    let block = Block::default()
        .title(" ERROR (x to dismiss) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_SELL));
    let paragraph = Paragraph::new(Span::styled(message.to_string(), Style::default().fg(C_SELL)))
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn selector_span(label: &'static str, value: String, focused: bool) -> Vec<Span<'static>> {
    let value_style = if focused {
        Style::default()
            .fg(Color::Black)
            .bg(C_ACCENT)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(C_BRIGHT)
    };
    vec![
        Span::styled(label, Style::default().fg(C_DIM)),
        Span::styled(format!(" ◀ {value} ▶ "), value_style),
        Span::raw("   "),
    ]
}

fn render_selectors(f: &mut Frame, app: &App, area: Rect) {
    let params = app.params();
    let focus = app.focus();
    let action = match app.connection_state() {
        ConnectionState::Connecting => "Connecting...",
        ConnectionState::Open => "[c] Reconnect",
        _ => "[c] Start Trading",
    };

    let mut spans = Vec::new();
    spans.extend(selector_span("Symbol", params.symbol.clone(), focus == Focus::Symbol));
    spans.extend(selector_span(
        "Timeframe",
        params.interval.to_string(),
        focus == Focus::Interval,
    ));
    spans.extend(selector_span(
        "Strategy",
        params.strategy.label().to_string(),
        focus == Focus::Strategy,
    ));
    spans.push(Span::styled(
        action,
        Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
    ));

    let block = Block::default()
        .title(" MARKET ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

/// Scale prices into sparkline heights, keeping the minimum visible
fn sparkline_data(prices: impl Iterator<Item = f64> + Clone) -> Vec<u64> {
    let min = prices.clone().fold(f64::INFINITY, f64::min);
    let max = prices.clone().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    prices
        .map(|p| {
            if range > 0.0 {
                ((p - min) / range * 99.0) as u64 + 1
            } else {
                50
            }
        })
        .collect()
}

fn render_price_panel(f: &mut Frame, app: &App, area: Rect) {
    let title = match app.snapshot() {
        Some(_) if !app.is_live() => " PRICE (stale) ".to_string(),
        _ => format!(" PRICE {} ", app.params().symbol),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(snapshot) = app.snapshot() else {
        let placeholder = Paragraph::new(Span::styled(
            "Connect to start receiving prices",
            Style::default().fg(C_DIM),
        ));
        f.render_widget(placeholder, inner);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(inner);

    let price_color = if app.is_live() { C_BRIGHT } else { C_DIM };
    let mut lines = vec![Line::from(vec![
        Span::styled("Current Price  ", Style::default().fg(C_DIM)),
        Span::styled(
            format!("${:.2}", snapshot.price),
            Style::default().fg(price_color).add_modifier(Modifier::BOLD),
        ),
    ])];
    let history = app.price_history();
    if let (Some(first), Some(last)) = (history.front(), history.back()) {
        let change = (last - first) / first * 100.0;
        lines.push(Line::from(vec![
            Span::styled("Session change ", Style::default().fg(C_DIM)),
            Span::styled(
                format!("{change:+.2}%"),
                Style::default().fg(if change >= 0.0 { C_BUY } else { C_SELL }),
            ),
        ]));
    }
    f.render_widget(Paragraph::new(lines), rows[0]);

    let data = sparkline_data(history.iter().copied());
    let sparkline = Sparkline::default()
        .data(&data)
        .style(Style::default().fg(C_ACCENT))
        .max(100);
    f.render_widget(sparkline, rows[1]);
}

fn render_signal_panel(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" TRADING SIGNAL ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let Some(snapshot) = app.snapshot() else {
        let paragraph = Paragraph::new(Span::styled(
            "Connect to start receiving signals",
            Style::default().fg(C_DIM),
        ))
        .block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let view = SignalView::from_snapshot(snapshot);
    let color = view.emphasis.color();
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Signal      ", Style::default().fg(C_DIM)),
            Span::styled(
                format!("{} {}", view.emphasis.glyph(), view.signal),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Confidence  ", Style::default().fg(C_DIM)),
            Span::styled(view.confidence_bar(10), Style::default().fg(view.band.color())),
            Span::raw(" "),
            Span::styled(
                format!("{:.1}%", view.confidence_pct),
                Style::default().fg(C_BRIGHT),
            ),
            Span::raw(" "),
            Span::styled(
                view.band.as_str(),
                Style::default()
                    .fg(view.band.color())
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    if let Some(levels) = view.exit_levels {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Stop Loss   ", Style::default().fg(C_DIM)),
            Span::styled(format!("${:.2}", levels.stop_loss), Style::default().fg(C_SELL)),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Take Profit ", Style::default().fg(C_DIM)),
            Span::styled(format!("${:.2}", levels.take_profit), Style::default().fg(C_BUY)),
        ]));
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn field_line(form: &OrderForm, field: OrderField, focused: bool, editable: bool) -> Line<'static> {
    let text = form.text(field);
    let shown = if text.is_empty() { "_".to_string() } else { text.to_string() };
    let style = match (focused, editable) {
        (_, false) => Style::default().fg(C_DIM),
        (true, true) => Style::default()
            .fg(Color::Black)
            .bg(C_ACCENT)
            .add_modifier(Modifier::BOLD),
        (false, true) => Style::default().fg(C_BRIGHT),
    };
    Line::from(vec![
        Span::styled(format!("{:<14}", field.label()), Style::default().fg(C_DIM)),
        Span::styled(format!(" {shown} "), style),
    ])
}

fn side_hint(form: &OrderForm, side: Side, app: &App, key: char, color: Color) -> Span<'static> {
    let style = if form.can_submit(side, app.snapshot()) {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(C_DIM)
    };
    Span::styled(format!("[{key}] {side}"), style)
}

fn render_order_panel(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" TRADING PANEL - {} ", app.params().symbol))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let Some(snapshot) = app.snapshot() else {
        let paragraph = Paragraph::new(Span::styled(
            "Connect to start trading",
            Style::default().fg(C_DIM),
        ))
        .block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let form = app.order_form();
    let editable = OrderForm::is_editable(Some(snapshot));
    let metrics = form.metrics(snapshot);
    let mut lines = Vec::new();

    if form.order_placed() {
        lines.push(Line::from(Span::styled(
            "✔ Order placed successfully!",
            Style::default().fg(C_BUY).add_modifier(Modifier::BOLD),
        )));
    }
    if let Some(error) = form.error() {
        lines.push(Line::from(Span::styled(
            format!("✖ {error}"),
            Style::default().fg(C_SELL).add_modifier(Modifier::BOLD),
        )));
    }

    lines.push(field_line(form, OrderField::Amount, app.focus() == Focus::Amount, editable));
    lines.push(field_line(form, OrderField::Leverage, app.focus() == Focus::Leverage, editable));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(format!("{:<15}", "Potential Profit"), Style::default().fg(C_DIM)),
        Span::styled(format!("${:.2}", metrics.potential_profit), Style::default().fg(C_BUY)),
    ]));
    lines.push(Line::from(vec![
        Span::styled(format!("{:<15}", "Potential Loss"), Style::default().fg(C_DIM)),
        Span::styled(format!("${:.2}", metrics.potential_loss), Style::default().fg(C_SELL)),
    ]));
    let ratio_color = match metrics.risk_reward {
        RiskReward::Ratio(ratio) if ratio >= 1.0 => C_BUY,
        RiskReward::Ratio(_) => C_NEUTRAL,
        RiskReward::NotApplicable => C_DIM,
    };
    lines.push(Line::from(vec![
        Span::styled(format!("{:<15}", "Risk/Reward"), Style::default().fg(C_DIM)),
        Span::styled(metrics.risk_reward.to_string(), Style::default().fg(ratio_color)),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        side_hint(form, Side::Buy, app, 'b', C_BUY),
        Span::raw("    "),
        side_hint(form, Side::Sell, app, 's', C_SELL),
    ]));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_news_panel(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" MARKET NEWS ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let news = app.snapshot().map(|s| s.news.as_slice()).unwrap_or_default();
    if news.is_empty() {
        let paragraph = Paragraph::new(Span::styled(
            "No news available",
            Style::default().fg(C_DIM),
        ))
        .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let lines: Vec<Line> = news
        .iter()
        .enumerate()
        .map(|(i, headline)| {
            Line::from(vec![
                Span::styled(format!("{:>2}. ", i + 1), Style::default().fg(C_ACCENT)),
                Span::styled(headline.clone(), Style::default().fg(C_BRIGHT)),
            ])
        })
        .collect();
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let hints = Line::from(vec![
        Span::styled(" Tab", Style::default().fg(C_ACCENT)),
        Span::styled(" focus  ", Style::default().fg(C_DIM)),
        Span::styled("←/→", Style::default().fg(C_ACCENT)),
        Span::styled(" select  ", Style::default().fg(C_DIM)),
        Span::styled("c", Style::default().fg(C_ACCENT)),
        Span::styled(" connect  ", Style::default().fg(C_DIM)),
        Span::styled("b/s", Style::default().fg(C_ACCENT)),
        Span::styled(" buy/sell  ", Style::default().fg(C_DIM)),
        Span::styled("x", Style::default().fg(C_ACCENT)),
        Span::styled(" dismiss  ", Style::default().fg(C_DIM)),
        Span::styled("q", Style::default().fg(C_ACCENT)),
        Span::styled(" quit", Style::default().fg(C_DIM)),
    ]);
    f.render_widget(Paragraph::new(hints), area);
}
