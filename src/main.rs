// ===============================
// src/main.rs
// ===============================
//
// Dashboard orchestrator. On every poll all feeds are fetched concurrently
// and each result is routed to its own store/panel: one failing feed logs a
// warning and leaves its panel alone, it never blocks or aborts siblings.
// View commands read from stdin mutate the per-table sort/filter state and
// trigger a re-render without refetching.
//
// Commands:
//   sort <table> <field>             toggle sort (tables: positions,
//                                    scanner, signals, trades)
//   filter <table> <name> <value>    set a named filter; value `off` clears
//   refresh                          poll immediately
//   quit

mod client;
mod config;
mod domain;
mod format;
mod mock;
mod render;
mod view;

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::client::FeedClient;
use crate::config::{Args, FeedMode};
use crate::domain::{
    AccountSnapshot, Action, EquityPoint, MetricsSnapshot, PositionRow, ScannerRow, SignalRow,
    TradeRow, Verdict,
};
use crate::format::fmt_date;
use crate::render::{
    account_card, metrics_card, position_rows, scanner_rows, signal_rows, trade_rows, Empty,
    EquityChart, Panel, POSITION_HEADERS, SCANNER_HEADERS, SIGNAL_HEADERS, TRADE_HEADERS,
};
use crate::view::{
    PositionField, ScannerField, SignalField, SortField, TableView, TradeField,
};

struct Dashboard {
    account: Option<AccountSnapshot>,
    metrics: Option<MetricsSnapshot>,
    equity: Vec<EquityPoint>,
    scan_date: Option<chrono::NaiveDate>,

    positions: TableView<PositionRow, PositionField>,
    scanner: TableView<ScannerRow, ScannerField>,
    signals: TableView<SignalRow, SignalField>,
    trades: TableView<TradeRow, TradeField>,

    chart: EquityChart,
    positions_panel: Panel,
    scanner_panel: Panel,
    signals_panel: Panel,
    trades_panel: Panel,
    color: bool,
}

impl Dashboard {
    fn new(args: &Args) -> Self {
        Self {
            account: None,
            metrics: None,
            equity: Vec::new(),
            scan_date: None,
            positions: TableView::new(PositionField::MarketValue),
            scanner: TableView::new(ScannerField::Symbol),
            signals: TableView::new(SignalField::GeneratedAt),
            trades: TableView::new(TradeField::Date),
            chart: EquityChart::new(args.chart_width, args.chart_height),
            positions_panel: Panel::new("Open Positions", POSITION_HEADERS, args.color),
            scanner_panel: Panel::new("Market Scanner", SCANNER_HEADERS, args.color),
            signals_panel: Panel::new("Pending Signals", SIGNAL_HEADERS, args.color),
            trades_panel: Panel::new("Recent Trades", TRADE_HEADERS, args.color),
            color: args.color,
        }
    }

    /// One poll: all feeds concurrently, results routed independently.
    /// Failed feeds keep their last-known (or initial empty) state.
    async fn refresh(&mut self, client: &FeedClient, args: &Args) {
        if args.feed_mode == FeedMode::Mock {
            self.account = mock::account();
            self.metrics = mock::metrics();
            self.equity = mock::equity_curve(args.history_limit);
            let scan = mock::scanner();
            self.scan_date = scan.scan_date;
            self.scanner.replace(scan.rows);
            self.positions.replace(mock::positions());
            self.signals.replace(mock::signals());
            self.trades.replace(mock::trades(args.trades_limit));
            info!("mock feeds refreshed");
            return;
        }

        let (account, equity, metrics, scan, positions, signals, trades) = tokio::join!(
            client.account(),
            client.equity_curve(args.history_limit),
            client.metrics(),
            client.scanner(),
            client.positions(),
            client.signals(),
            client.trades(args.trades_limit),
        );

        match account {
            Ok(snap) => self.account = snap,
            Err(e) => warn!(error = %e, "account feed failed"),
        }
        match equity {
            Ok(points) => self.equity = points,
            Err(e) => warn!(error = %e, "equity feeds failed"),
        }
        match metrics {
            Ok(snap) => self.metrics = snap,
            Err(e) => warn!(error = %e, "metrics feed failed"),
        }
        match scan {
            Ok(latest) => {
                self.scan_date = latest.scan_date;
                self.scanner.replace(latest.rows);
            }
            Err(e) => warn!(error = %e, "scanner feed failed"),
        }
        match positions {
            Ok(rows) => self.positions.replace(rows),
            Err(e) => warn!(error = %e, "positions feed failed"),
        }
        match signals {
            Ok(rows) => self.signals.replace(rows),
            Err(e) => warn!(error = %e, "signals feed failed"),
        }
        match trades {
            Ok(rows) => self.trades.replace(rows),
            Err(e) => warn!(error = %e, "trades feed failed"),
        }

        info!(
            positions = self.positions.row_count(),
            scanner = self.scanner.row_count(),
            signals = self.signals.row_count(),
            trades = self.trades.row_count(),
            equity_points = self.equity.len(),
            "poll complete"
        );
    }

    fn draw(&mut self) -> String {
        let mut out = String::new();

        out.push_str(&account_card(self.account.as_ref(), self.color));
        out.push('\n');
        out.push_str(&metrics_card(self.metrics.as_ref(), self.color));
        out.push('\n');

        out.push_str("== Equity Curve ==\n");
        out.push_str(self.chart.draw(&self.equity));
        out.push('\n');

        let derived = self.scanner.derive();
        let shaped = scanner_rows(&derived);
        let note = format!(
            "scan: {}, {}",
            fmt_date(self.scan_date),
            view_note(&self.scanner, |f| f.name())
        );
        out.push_str(&self.scanner_panel.render(&note, &shaped, empty_kind(&self.scanner)));
        out.push('\n');

        let derived = self.positions.derive();
        let shaped = position_rows(&derived);
        let note = view_note(&self.positions, |f| f.name());
        out.push_str(&self.positions_panel.render(&note, &shaped, empty_kind(&self.positions)));
        out.push('\n');

        let derived = self.signals.derive();
        let shaped = signal_rows(&derived);
        let note = view_note(&self.signals, |f| f.name());
        out.push_str(&self.signals_panel.render(&note, &shaped, empty_kind(&self.signals)));
        out.push('\n');

        let derived = self.trades.derive();
        let shaped = trade_rows(&derived);
        let note = view_note(&self.trades, |f| f.name());
        out.push_str(&self.trades_panel.render(&note, &shaped, empty_kind(&self.trades)));

        out
    }
}

fn view_note<R, S: SortField<R>>(view: &TableView<R, S>, name: impl Fn(S) -> &'static str) -> String {
    let dir = if view.sort_ascending() { "asc" } else { "desc" };
    if view.has_filters() {
        format!("sort: {} {}, filtered", name(view.sort_key()), dir)
    } else {
        format!("sort: {} {}", name(view.sort_key()), dir)
    }
}

fn empty_kind<R, S: SortField<R>>(view: &TableView<R, S>) -> Empty {
    if view.row_count() == 0 {
        Empty::NoData
    } else {
        Empty::Filtered
    }
}

// ---------- stdin commands ----------

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Redraw,
    Refresh,
    Quit,
    Noop,
}

fn parse_verdict(s: &str) -> Option<Verdict> {
    match s.to_ascii_lowercase().as_str() {
        "buy" => Some(Verdict::Buy),
        "sell" => Some(Verdict::Sell),
        "hold" => Some(Verdict::Hold),
        _ => None,
    }
}

fn parse_action(s: &str) -> Option<Action> {
    match s.to_ascii_lowercase().as_str() {
        "buy" => Some(Action::Buy),
        "sell" => Some(Action::Sell),
        _ => None,
    }
}

fn apply_command(dash: &mut Dashboard, input: &str) -> Outcome {
    let mut parts = input.split_whitespace();
    match parts.next() {
        Some("quit") | Some("q") | Some("exit") => Outcome::Quit,
        Some("refresh") | Some("r") => Outcome::Refresh,
        Some("sort") => {
            let (Some(table), Some(field)) = (parts.next(), parts.next()) else {
                warn!(%input, "usage: sort <table> <field>");
                return Outcome::Noop;
            };
            apply_sort(dash, table, field, input)
        }
        Some("filter") => {
            let (Some(table), Some(name), Some(value)) =
                (parts.next(), parts.next(), parts.next())
            else {
                warn!(%input, "usage: filter <table> <name> <value|off>");
                return Outcome::Noop;
            };
            apply_filter(dash, table, name, value, input)
        }
        _ => {
            warn!(%input, "unknown command");
            Outcome::Noop
        }
    }
}

fn apply_sort(dash: &mut Dashboard, table: &str, field: &str, input: &str) -> Outcome {
    match table {
        "positions" => match PositionField::parse_one(field) {
            Some(f) => {
                dash.positions.toggle_sort(f);
                Outcome::Redraw
            }
            None => unknown_field(input),
        },
        "scanner" => match ScannerField::parse_one(field) {
            Some(f) => {
                dash.scanner.toggle_sort(f);
                Outcome::Redraw
            }
            None => unknown_field(input),
        },
        "signals" => match SignalField::parse_one(field) {
            Some(f) => {
                dash.signals.toggle_sort(f);
                Outcome::Redraw
            }
            None => unknown_field(input),
        },
        "trades" => match TradeField::parse_one(field) {
            Some(f) => {
                dash.trades.toggle_sort(f);
                Outcome::Redraw
            }
            None => unknown_field(input),
        },
        _ => {
            warn!(%input, "unknown table");
            Outcome::Noop
        }
    }
}

fn unknown_field(input: &str) -> Outcome {
    warn!(%input, "unknown sort field");
    Outcome::Noop
}

fn apply_filter(dash: &mut Dashboard, table: &str, name: &str, value: &str, input: &str) -> Outcome {
    let off = value.eq_ignore_ascii_case("off");
    match (table, name) {
        ("scanner", "signal") => {
            if off {
                dash.scanner.clear_filter("signal");
                return Outcome::Redraw;
            }
            let Some(want) = parse_verdict(value) else {
                warn!(%input, "expected buy|sell|hold|off");
                return Outcome::Noop;
            };
            dash.scanner
                .set_filter("signal", Box::new(move |r: &ScannerRow| r.signal.as_ref() == Some(&want)));
            Outcome::Redraw
        }
        ("scanner", "held") => {
            if off {
                dash.scanner.clear_filter("held");
                return Outcome::Redraw;
            }
            let want = matches!(value.to_ascii_lowercase().as_str(), "yes" | "on" | "true");
            dash.scanner
                .set_filter("held", Box::new(move |r: &ScannerRow| r.held == want));
            Outcome::Redraw
        }
        ("positions", "strategy") => {
            if off {
                dash.positions.clear_filter("strategy");
                return Outcome::Redraw;
            }
            let want = value.to_string();
            dash.positions.set_filter(
                "strategy",
                Box::new(move |r: &PositionRow| r.strategy.as_deref() == Some(want.as_str())),
            );
            Outcome::Redraw
        }
        ("signals", "type") => {
            if off {
                dash.signals.clear_filter("type");
                return Outcome::Redraw;
            }
            let Some(want) = parse_action(value) else {
                warn!(%input, "expected buy|sell|off");
                return Outcome::Noop;
            };
            dash.signals.set_filter(
                "type",
                Box::new(move |r: &SignalRow| r.signal_type.as_ref() == Some(&want)),
            );
            Outcome::Redraw
        }
        ("trades", "action") => {
            if off {
                dash.trades.clear_filter("action");
                return Outcome::Redraw;
            }
            let Some(want) = parse_action(value) else {
                warn!(%input, "expected buy|sell|off");
                return Outcome::Noop;
            };
            dash.trades.set_filter(
                "action",
                Box::new(move |r: &TradeRow| r.action.as_ref() == Some(&want)),
            );
            Outcome::Redraw
        }
        ("trades", "symbol") => {
            if off {
                dash.trades.clear_filter("symbol");
                return Outcome::Redraw;
            }
            let want = value.to_ascii_uppercase();
            dash.trades.set_filter(
                "symbol",
                Box::new(move |r: &TradeRow| r.symbol == want),
            );
            Outcome::Redraw
        }
        _ => {
            warn!(%input, "unknown filter");
            Outcome::Noop
        }
    }
}

fn print_dashboard(dash: &mut Dashboard, args: &Args) {
    let body = dash.draw();
    if args.once {
        print!("{body}");
    } else {
        // redraw in place
        print!("\x1b[2J\x1b[H{body}");
    }
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() {
    // Panels own stdout; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = match config::load() {
        Ok(a) => a,
        Err(e) => {
            error!(error = %e, "bad configuration");
            std::process::exit(2);
        }
    };

    let client = match FeedClient::new(&args.base_url, Duration::from_secs(args.timeout_secs.max(1)))
    {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to build http client");
            std::process::exit(2);
        }
    };

    info!(
        base_url = %args.base_url,
        mode = ?args.feed_mode,
        refresh_secs = args.refresh_secs,
        once = args.once,
        "startup config"
    );

    let mut dash = Dashboard::new(&args);
    dash.refresh(&client, &args).await;
    print_dashboard(&mut dash, &args);

    if args.once {
        return;
    }

    let mut tick = interval(Duration::from_secs(args.refresh_secs.max(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tick.tick().await; // the first tick fires immediately; we already polled

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                dash.refresh(&client, &args).await;
                print_dashboard(&mut dash, &args);
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(input)) => match apply_command(&mut dash, input.trim()) {
                        Outcome::Quit => break,
                        Outcome::Refresh => {
                            dash.refresh(&client, &args).await;
                            print_dashboard(&mut dash, &args);
                        }
                        Outcome::Redraw => print_dashboard(&mut dash, &args),
                        Outcome::Noop => {}
                    },
                    Ok(None) => {
                        info!("stdin closed, continuing on the poll timer");
                        stdin_open = false;
                    }
                    Err(e) => {
                        warn!(error = %e, "stdin read error");
                        stdin_open = false;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_args() -> Args {
        Args {
            base_url: "http://127.0.0.1:8000".into(),
            refresh_secs: 30,
            history_limit: 90,
            trades_limit: 50,
            timeout_secs: 10,
            feed_mode: FeedMode::Mock,
            chart_width: 40,
            chart_height: 8,
            once: true,
            color: false,
        }
    }

    fn loaded_dashboard() -> Dashboard {
        let args = test_args();
        let mut dash = Dashboard::new(&args);
        dash.account = mock::account();
        dash.metrics = mock::metrics();
        dash.equity = mock::equity_curve(10);
        let scan = mock::scanner();
        dash.scan_date = scan.scan_date;
        dash.scanner.replace(scan.rows);
        dash.positions.replace(mock::positions());
        dash.signals.replace(mock::signals());
        dash.trades.replace(mock::trades(10));
        dash
    }

    #[test]
    fn test_sort_command_toggles_direction_on_repeat() {
        let mut dash = loaded_dashboard();
        assert!(!dash.positions.sort_ascending()); // market_value default desc
        assert_eq!(apply_command(&mut dash, "sort positions value"), Outcome::Redraw);
        assert!(dash.positions.sort_ascending());
        assert_eq!(apply_command(&mut dash, "sort positions value"), Outcome::Redraw);
        assert!(!dash.positions.sort_ascending());
    }

    #[test]
    fn test_sort_command_switches_key_with_default_direction() {
        let mut dash = loaded_dashboard();
        apply_command(&mut dash, "sort positions symbol");
        assert_eq!(dash.positions.sort_key(), PositionField::Symbol);
        assert!(dash.positions.sort_ascending());
    }

    #[test]
    fn test_filter_command_narrows_and_off_restores() {
        let mut dash = loaded_dashboard();
        let all = dash.scanner.derive().len();
        assert_eq!(apply_command(&mut dash, "filter scanner signal buy"), Outcome::Redraw);
        let buys = dash.scanner.derive().len();
        assert!(buys < all);
        assert!(dash
            .scanner
            .derive()
            .iter()
            .all(|r| r.signal == Some(Verdict::Buy)));
        assert_eq!(apply_command(&mut dash, "filter scanner signal off"), Outcome::Redraw);
        assert_eq!(dash.scanner.derive().len(), all);
    }

    #[test]
    fn test_unknown_command_is_a_noop() {
        let mut dash = loaded_dashboard();
        let before_key = dash.positions.sort_key();
        assert_eq!(apply_command(&mut dash, "explode everything"), Outcome::Noop);
        assert_eq!(apply_command(&mut dash, "sort positions nonsense"), Outcome::Noop);
        assert_eq!(apply_command(&mut dash, "filter scanner signal sideways"), Outcome::Noop);
        assert_eq!(dash.positions.sort_key(), before_key);
    }

    #[test]
    fn test_metrics_failure_leaves_cards_at_placeholder_while_positions_render() {
        let args = test_args();
        let mut dash = Dashboard::new(&args);
        // metrics feed failed: never routed. positions landed fine.
        dash.positions.replace(mock::positions());
        let out = dash.draw();
        assert!(out.contains("Sharpe"));
        assert!(out.contains(crate::format::PLACEHOLDER));
        assert!(out.contains("AAPL")); // positions table still rendered
    }

    #[test]
    fn test_empty_positions_render_single_placeholder_row() {
        let args = test_args();
        let mut dash = Dashboard::new(&args);
        let out = dash.draw();
        let positions_section: Vec<&str> = out
            .lines()
            .skip_while(|l| !l.starts_with("== Open Positions"))
            .take(4)
            .collect();
        assert_eq!(positions_section.len(), 4);
        assert!(positions_section[3].contains("no data yet"));
    }

    #[test]
    fn test_filtered_out_positions_render_filtered_placeholder() {
        let mut dash = loaded_dashboard();
        apply_command(&mut dash, "filter positions strategy nonexistent");
        let out = dash.draw();
        assert!(out.contains("no rows match the active filters"));
    }

    #[test]
    fn test_draw_is_deterministic_for_same_state() {
        let mut dash = loaded_dashboard();
        let a = dash.draw();
        let b = dash.draw();
        assert_eq!(a, b);
    }
}
