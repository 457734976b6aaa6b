// ===============================
// src/render.rs
// ===============================
//
// Rendering in two layers. Row shapers turn derived domain rows into
// structured RenderedRow records (text + tone per cell) using format.rs for
// every numeric/date field; any output technology could consume those.
// Panel/EquityChart are the concrete text surfaces this binary ships:
// deterministic, re-render safe, with an explicit placeholder row for empty
// views.

use crate::domain::{
    AccountSnapshot, EquityPoint, MetricsSnapshot, PositionRow, ScannerRow, SignalRow, TradeRow,
};
use crate::format::{
    action_cell, band_signal_cell, fmt_date, fmt_datetime, fmt_pct, fmt_pct_points, fmt_qty,
    fmt_ratio, fmt_usd, market_regime_cell, momentum_cell, rsi_bucket, signed_prefix, verdict_cell,
    vol_regime_cell, Tone, PLACEHOLDER,
};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub tone: Tone,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), tone: Tone::Neutral }
    }

    pub fn toned(text: impl Into<String>, tone: Tone) -> Self {
        Self { text: text.into(), tone }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRow {
    pub cells: Vec<Cell>,
}

/// Why a table has zero visual rows. Both states render one explicit
/// placeholder row; the message tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Empty {
    /// Never fetched, fetch failed, or the snapshot itself had zero rows.
    NoData,
    /// The snapshot has rows but the active filters excluded all of them.
    Filtered,
}

impl Empty {
    pub fn message(&self) -> &'static str {
        match self {
            Empty::NoData => "no data yet",
            Empty::Filtered => "no rows match the active filters",
        }
    }
}

fn paint(text: &str, tone: Tone, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    match tone {
        Tone::Positive => format!("{GREEN}{text}{RESET}"),
        Tone::Negative => format!("{RED}{text}{RESET}"),
        Tone::Neutral => text.to_string(),
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    let mut out = String::with_capacity(width.max(len));
    out.push_str(text);
    for _ in len..width {
        out.push(' ');
    }
    out
}

/// One titled text table. Rendering the same input twice yields identical
/// output; the panel holds no state between renders.
pub struct Panel {
    title: &'static str,
    headers: &'static [&'static str],
    color: bool,
}

impl Panel {
    pub fn new(title: &'static str, headers: &'static [&'static str], color: bool) -> Self {
        Self { title, headers, color }
    }

    /// `note` carries view-state context (current sort, active filters) and
    /// may be empty.
    pub fn render(&self, note: &str, rows: &[RenderedRow], empty: Empty) -> String {
        let mut widths: Vec<usize> =
            self.headers.iter().map(|h| h.chars().count()).collect();
        for row in rows {
            for (i, cell) in row.cells.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.text.chars().count());
                }
            }
        }
        let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);

        let mut out = String::new();
        if note.is_empty() {
            out.push_str(&format!("== {} ==\n", self.title));
        } else {
            out.push_str(&format!("== {} [{}] ==\n", self.title, note));
        }

        let header: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| pad(h, *w))
            .collect();
        out.push_str(header.join("  ").trim_end());
        out.push('\n');
        out.push_str(&"-".repeat(total));
        out.push('\n');

        if rows.is_empty() {
            // exactly one placeholder row spanning the table width
            out.push_str(&pad(&format!("({})", empty.message()), total));
            out.push('\n');
            return out;
        }

        for row in rows {
            let line: Vec<String> = row
                .cells
                .iter()
                .zip(&widths)
                .map(|(cell, w)| paint(&pad(&cell.text, *w), cell.tone, self.color))
                .collect();
            out.push_str(line.join("  ").trim_end());
            out.push('\n');
        }
        out
    }
}

// ---------- row shapers ----------

pub const POSITION_HEADERS: &[&str] = &[
    "SYMBOL", "QTY", "AVG COST", "PRICE", "MKT VALUE", "UNREAL P&L", "P&L %", "REAL P&L",
    "STRATEGY", "ENTRY",
];

pub fn position_rows(rows: &[&PositionRow]) -> Vec<RenderedRow> {
    rows.iter()
        .map(|p| {
            let pnl_pct = match (p.current_price, p.avg_cost) {
                (Some(px), Some(cost)) if cost != 0.0 => Some((px - cost) / cost),
                _ => None,
            };
            RenderedRow {
                cells: vec![
                    Cell::plain(p.symbol.clone()),
                    Cell::plain(fmt_qty(p.qty)),
                    Cell::plain(fmt_usd(p.avg_cost)),
                    Cell::plain(fmt_usd(p.current_price)),
                    Cell::plain(fmt_usd(p.market_value)),
                    signed_usd_cell(p.unrealized_pnl),
                    signed_pct_cell(pnl_pct),
                    signed_usd_cell(p.realized_pnl),
                    Cell::plain(p.strategy.clone().unwrap_or_else(|| PLACEHOLDER.into())),
                    Cell::plain(fmt_date(p.entry_date)),
                ],
            }
        })
        .collect()
}

pub const SCANNER_HEADERS: &[&str] = &[
    "SYMBOL", "CLOSE", "SMA 20", "RSI 14", "RSI", "VOL", "MOMENTUM", "BANDS", "REGIME", "HELD",
    "SIGNAL", "REASON",
];

pub fn scanner_rows(rows: &[&ScannerRow]) -> Vec<RenderedRow> {
    rows.iter()
        .map(|s| {
            let bucket = rsi_bucket(s.rsi_14);
            let (vol_text, vol_tone) = vol_regime_cell(s.vol_regime.as_ref());
            let (mom_text, mom_tone) = momentum_cell(s.momentum.as_ref());
            let (band_text, band_tone) = band_signal_cell(s.bb_signal.as_ref());
            let (reg_text, reg_tone) = market_regime_cell(s.regime.as_ref());
            let (sig_text, sig_tone) = verdict_cell(s.signal.as_ref());
            RenderedRow {
                cells: vec![
                    Cell::plain(s.symbol.clone()),
                    Cell::plain(fmt_usd(s.close)),
                    Cell::plain(fmt_usd(s.sma_20)),
                    Cell::plain(fmt_ratio(s.rsi_14)),
                    Cell::toned(bucket.label(), bucket.tone()),
                    Cell::toned(vol_text, vol_tone),
                    Cell::toned(mom_text, mom_tone),
                    Cell::toned(band_text, band_tone),
                    Cell::toned(reg_text, reg_tone),
                    Cell::plain(if s.held { "yes" } else { "no" }),
                    Cell::toned(sig_text, sig_tone),
                    Cell::plain(s.reject_reason.clone().unwrap_or_else(|| PLACEHOLDER.into())),
                ],
            }
        })
        .collect()
}

pub const SIGNAL_HEADERS: &[&str] =
    &["SYMBOL", "TYPE", "QTY", "TARGET", "STRATEGY", "REASON", "GENERATED"];

pub fn signal_rows(rows: &[&SignalRow]) -> Vec<RenderedRow> {
    rows.iter()
        .map(|s| {
            let (type_text, type_tone) = action_cell(s.signal_type.as_ref());
            RenderedRow {
                cells: vec![
                    Cell::plain(s.symbol.clone()),
                    Cell::toned(type_text, type_tone),
                    Cell::plain(fmt_qty(s.qty)),
                    Cell::plain(fmt_usd(s.target_price)),
                    Cell::plain(s.strategy.clone().unwrap_or_else(|| PLACEHOLDER.into())),
                    Cell::plain(s.reason.clone().unwrap_or_else(|| PLACEHOLDER.into())),
                    Cell::plain(fmt_datetime(s.generated_at)),
                ],
            }
        })
        .collect()
}

pub const TRADE_HEADERS: &[&str] =
    &["DATE", "SYMBOL", "ACTION", "QTY", "PRICE", "REAL P&L", "STRATEGY"];

pub fn trade_rows(rows: &[&TradeRow]) -> Vec<RenderedRow> {
    rows.iter()
        .map(|t| {
            let (action_text, action_tone) = action_cell(t.action.as_ref());
            RenderedRow {
                cells: vec![
                    Cell::plain(fmt_date(t.date)),
                    Cell::plain(t.symbol.clone()),
                    Cell::toned(action_text, action_tone),
                    Cell::plain(fmt_qty(t.qty)),
                    Cell::plain(fmt_usd(t.price)),
                    signed_usd_cell(t.realized_pnl),
                    Cell::plain(t.strategy.clone().unwrap_or_else(|| PLACEHOLDER.into())),
                ],
            }
        })
        .collect()
}

fn signed_usd_cell(v: Option<f64>) -> Cell {
    let text = match v {
        Some(x) if x.is_finite() => format!("{}{}", signed_prefix(x), fmt_usd(Some(x))),
        _ => PLACEHOLDER.to_string(),
    };
    Cell::toned(text, Tone::of(v))
}

fn signed_pct_cell(v: Option<f64>) -> Cell {
    let text = match v {
        Some(x) if x.is_finite() => format!("{}{}", signed_prefix(x), fmt_pct(Some(x))),
        _ => PLACEHOLDER.to_string(),
    };
    Cell::toned(text, Tone::of(v))
}

// ---------- cards ----------

fn card_line(out: &mut String, label: &str, value: &str, tone: Tone, color: bool) {
    out.push_str(&format!("{}  {}\n", pad(label, 17), paint(value, tone, color)));
}

/// Account summary card. A missing snapshot renders placeholders, not an
/// absent panel.
pub fn account_card(snap: Option<&AccountSnapshot>, color: bool) -> String {
    let mut out = String::from("== Account ==\n");
    let s = snap;
    let upnl = s.and_then(|s| s.unrealized_pnl);
    let rpnl = s.and_then(|s| s.realized_pnl);
    card_line(&mut out, "Net Liquidation", &fmt_usd(s.and_then(|s| s.net_liquidation)), Tone::Neutral, color);
    card_line(&mut out, "Cash", &fmt_usd(s.and_then(|s| s.cash)), Tone::Neutral, color);
    card_line(&mut out, "Position Value", &fmt_usd(s.and_then(|s| s.position_value)), Tone::Neutral, color);
    card_line(&mut out, "Unrealized P&L", &signed_usd_cell(upnl).text, Tone::of(upnl), color);
    card_line(&mut out, "Realized P&L", &signed_usd_cell(rpnl).text, Tone::of(rpnl), color);
    let count = s
        .and_then(|s| s.position_count)
        .map(|c| c.to_string())
        .unwrap_or_else(|| PLACEHOLDER.into());
    card_line(&mut out, "Open Positions", &count, Tone::Neutral, color);
    card_line(&mut out, "As Of", &fmt_date(s.and_then(|s| s.as_of)), Tone::Neutral, color);
    out
}

pub fn metrics_card(snap: Option<&MetricsSnapshot>, color: bool) -> String {
    let mut out = String::from("== Performance ==\n");
    let s = snap;
    let total_return = s.and_then(|s| s.total_return);
    let ret_text = match total_return {
        Some(x) if x.is_finite() => format!("{}{}", signed_prefix(x), fmt_pct(Some(x))),
        _ => PLACEHOLDER.to_string(),
    };
    card_line(&mut out, "Sharpe", &fmt_ratio(s.and_then(|s| s.sharpe)), Tone::Neutral, color);
    card_line(&mut out, "Max Drawdown", &fmt_pct(s.and_then(|s| s.max_drawdown)), Tone::Neutral, color);
    card_line(&mut out, "Total Return", &ret_text, Tone::of(total_return), color);
    card_line(&mut out, "Win Rate", &fmt_pct_points(s.and_then(|s| s.win_rate)), Tone::Neutral, color);
    out
}

// ---------- equity chart ----------

/// ASCII line chart over an equity series. The chart exclusively owns its
/// surface: every draw clears the previous series before plotting, so
/// repeated draws never accumulate.
pub struct EquityChart {
    width: usize,
    height: usize,
    surface: String,
}

impl EquityChart {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width: width.max(8), height: height.max(2), surface: String::new() }
    }

    pub fn draw(&mut self, points: &[EquityPoint]) -> &str {
        self.surface.clear();

        if points.is_empty() {
            self.surface.push_str(&format!("({})\n", Empty::NoData.message()));
            return &self.surface;
        }

        // sample down to at most `width` columns, keeping original order
        let cols: Vec<&EquityPoint> = if points.len() <= self.width {
            points.iter().collect()
        } else {
            (0..self.width)
                .map(|c| &points[c * (points.len() - 1) / (self.width - 1)])
                .collect()
        };

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for p in &cols {
            min = min.min(p.value);
            max = max.max(p.value);
        }
        let span = (max - min).max(f64::EPSILON);

        let levels: Vec<usize> = cols
            .iter()
            .map(|p| (((p.value - min) / span) * (self.height - 1) as f64).round() as usize)
            .collect();

        let top_label = fmt_usd(Some(max));
        let bottom_label = fmt_usd(Some(min));
        let label_w = top_label.chars().count().max(bottom_label.chars().count());

        for row in (0..self.height).rev() {
            let label = if row == self.height - 1 {
                top_label.as_str()
            } else if row == 0 {
                bottom_label.as_str()
            } else {
                ""
            };
            self.surface.push_str(&format!("{:>label_w$} |", label));
            for level in &levels {
                self.surface.push(if *level == row { '*' } else { ' ' });
            }
            while self.surface.ends_with(' ') {
                self.surface.pop();
            }
            self.surface.push('\n');
        }
        self.surface.push_str(&format!(
            "{:>label_w$} +{}\n",
            "",
            "-".repeat(cols.len())
        ));
        self.surface.push_str(&format!(
            "{:>label_w$}  {} .. {}  ({} points)\n",
            "",
            fmt_date(cols.first().map(|p| p.date)),
            fmt_date(cols.last().map(|p| p.date)),
            points.len()
        ));
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn position(symbol: &str, value: Option<f64>) -> PositionRow {
        PositionRow {
            symbol: symbol.to_string(),
            qty: Some(10.0),
            avg_cost: Some(100.0),
            current_price: Some(123.45),
            market_value: value,
            unrealized_pnl: Some(234.5),
            realized_pnl: Some(-12.0),
            strategy: Some("trend".into()),
            entry_date: NaiveDate::from_ymd_opt(2025, 5, 1),
        }
    }

    #[test]
    fn test_empty_table_renders_exactly_one_placeholder_row() {
        let panel = Panel::new("Open Positions", POSITION_HEADERS, false);
        let out = panel.render("", &[], Empty::NoData);
        let lines: Vec<&str> = out.lines().collect();
        // title + header + rule + one placeholder row
        assert_eq!(lines.len(), 4);
        assert!(lines[3].contains("no data yet"));
    }

    #[test]
    fn test_filtered_empty_is_distinguishable_from_no_data() {
        let panel = Panel::new("Open Positions", POSITION_HEADERS, false);
        let no_data = panel.render("", &[], Empty::NoData);
        let filtered = panel.render("", &[], Empty::Filtered);
        assert_ne!(no_data, filtered);
        assert!(filtered.contains("no rows match the active filters"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let rows_src = [position("AAPL", Some(1234.5)), position("KO", None)];
        let refs: Vec<&PositionRow> = rows_src.iter().collect();
        let shaped = position_rows(&refs);
        let panel = Panel::new("Open Positions", POSITION_HEADERS, true);
        let once = panel.render("value desc", &shaped, Empty::NoData);
        let twice = panel.render("value desc", &shaped, Empty::NoData);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_position_rows_format_through_formatter() {
        let row = position("AAPL", Some(1234.5));
        let shaped = position_rows(&[&row]);
        let cells = &shaped[0].cells;
        assert_eq!(cells[4].text, "$1,234.50");
        assert_eq!(cells[5].text, "+$234.50");
        assert_eq!(cells[5].tone, Tone::Positive);
        assert_eq!(cells[6].text, "+23.45%"); // (123.45-100)/100
        assert_eq!(cells[7].tone, Tone::Negative);
        assert_eq!(cells[9].text, "2025-05-01");
    }

    #[test]
    fn test_one_visual_row_per_data_row_in_derived_order() {
        let a = position("AAPL", Some(2.0));
        let b = position("KO", Some(1.0));
        let shaped = position_rows(&[&b, &a]);
        assert_eq!(shaped.len(), 2);
        assert_eq!(shaped[0].cells[0].text, "KO");
        assert_eq!(shaped[1].cells[0].text, "AAPL");
    }

    #[test]
    fn test_account_card_placeholder_until_data_lands() {
        let empty = account_card(None, false);
        assert!(empty.contains(PLACEHOLDER));
        let snap = AccountSnapshot {
            net_liquidation: Some(103_250.75),
            cash: Some(41_830.20),
            position_value: Some(61_420.55),
            unrealized_pnl: Some(1_284.30),
            realized_pnl: Some(-120.0),
            position_count: Some(4),
            as_of: NaiveDate::from_ymd_opt(2025, 8, 7),
        };
        let full = account_card(Some(&snap), false);
        assert!(full.contains("$103,250.75"));
        assert!(full.contains("+$1,284.30"));
        assert!(full.contains("-$120.00"));
    }

    #[test]
    fn test_metrics_card_formats_fractions_and_points() {
        let snap = MetricsSnapshot {
            sharpe: Some(1.42),
            max_drawdown: Some(0.087),
            total_return: Some(0.234),
            win_rate: Some(57.5),
        };
        let out = metrics_card(Some(&snap), false);
        assert!(out.contains("1.42"));
        assert!(out.contains("8.70%"));
        assert!(out.contains("+23.40%"));
        assert!(out.contains("57.50%"));
    }

    fn curve(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| EquityPoint {
                date: NaiveDate::from_ymd_opt(2025, 7, 1 + i as u32).unwrap(),
                value: *v,
            })
            .collect()
    }

    #[test]
    fn test_chart_redraw_replaces_prior_series() {
        let mut chart = EquityChart::new(20, 5);
        let first = chart.draw(&curve(&[100.0, 110.0, 105.0])).to_string();
        // an unrelated draw in between must not leak into the next one
        chart.draw(&curve(&[5.0, 4.0, 3.0, 2.0, 1.0]));
        let again = chart.draw(&curve(&[100.0, 110.0, 105.0])).to_string();
        assert_eq!(first, again);
    }

    #[test]
    fn test_chart_empty_series_renders_placeholder() {
        let mut chart = EquityChart::new(20, 5);
        assert!(chart.draw(&[]).contains("no data yet"));
    }

    #[test]
    fn test_chart_labels_min_and_max() {
        let mut chart = EquityChart::new(20, 5);
        let out = chart.draw(&curve(&[98_102.0, 101_000.0, 104_512.0])).to_string();
        assert!(out.contains("$104,512.00"));
        assert!(out.contains("$98,102.00"));
        assert!(out.contains("2025-07-01 .. 2025-07-03"));
    }
}
