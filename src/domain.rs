// ===============================
// src/domain.rs
// ===============================
//
// Wire types for the dashboard feeds. Every payload is a wholesale snapshot:
// a poll replaces the previous dataset, nothing is merged. Presentation
// state (sort/filter) lives in view.rs, never on these types.
//
// Categorical indicator labels are a fixed vocabulary validated here at the
// decode boundary. An unrecognized label decodes to Unknown(..) and is
// flagged in the logs once per distinct label, instead of being silently
// coerced to a known value.

use std::sync::Mutex;

use ahash::AHashSet;
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::warn;

/// Response envelope shared by every feed: `{ data, count?, scan_date? }`.
/// A missing `data` field is a valid "no data" state, not a decode error.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub scan_date: Option<NaiveDate>,
}

// ---------- singular snapshots ----------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountSnapshot {
    pub net_liquidation: Option<f64>,
    pub cash: Option<f64>,
    pub position_value: Option<f64>,
    pub unrealized_pnl: Option<f64>,
    pub realized_pnl: Option<f64>,
    pub position_count: Option<u32>,
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetricsSnapshot {
    pub sharpe: Option<f64>,
    /// Fraction, e.g. 0.12 = 12% drawdown.
    pub max_drawdown: Option<f64>,
    /// Fraction.
    pub total_return: Option<f64>,
    /// Already in percent points on the wire.
    pub win_rate: Option<f64>,
}

// ---------- equity curve ----------

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// `/account/history` row: net_liquidation series (primary).
#[derive(Debug, Clone, Deserialize)]
pub struct AccountHistoryRow {
    pub date: NaiveDate,
    pub net_liquidation: f64,
}

/// `/portfolio/history` row: total_equity series (fallback).
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioHistoryRow {
    pub date: NaiveDate,
    pub total_equity: f64,
}

impl From<AccountHistoryRow> for EquityPoint {
    fn from(r: AccountHistoryRow) -> Self {
        Self { date: r.date, value: r.net_liquidation }
    }
}

impl From<PortfolioHistoryRow> for EquityPoint {
    fn from(r: PortfolioHistoryRow) -> Self {
        Self { date: r.date, value: r.total_equity }
    }
}

// ---------- table rows ----------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScannerRow {
    pub symbol: String,
    pub close: Option<f64>,
    pub sma_20: Option<f64>,
    pub rsi_14: Option<f64>,
    #[serde(default)]
    pub vol_regime: Option<VolRegime>,
    #[serde(default)]
    pub momentum: Option<Momentum>,
    #[serde(default)]
    pub bb_signal: Option<BandSignal>,
    #[serde(default)]
    pub regime: Option<MarketRegime>,
    #[serde(default)]
    pub held: bool,
    #[serde(default)]
    pub signal: Option<Verdict>,
    #[serde(default)]
    pub reject_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PositionRow {
    pub symbol: String,
    pub qty: Option<f64>,
    pub avg_cost: Option<f64>,
    pub current_price: Option<f64>,
    pub market_value: Option<f64>,
    pub unrealized_pnl: Option<f64>,
    pub realized_pnl: Option<f64>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
}

/// Pending signal. Not uniquely keyed: several pending signals for the same
/// symbol are legal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignalRow {
    pub symbol: String,
    pub signal_type: Option<Action>,
    pub qty: Option<f64>,
    pub target_price: Option<f64>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TradeRow {
    pub date: Option<NaiveDate>,
    pub symbol: String,
    pub action: Option<Action>,
    pub qty: Option<f64>,
    pub price: Option<f64>,
    pub realized_pnl: Option<f64>,
    #[serde(default)]
    pub strategy: Option<String>,
}

// ---------- categorical vocabularies ----------

// Warn once per distinct unrecognized label so a bad upstream batch does not
// flood the logs on every poll.
static FLAGGED_LABELS: Lazy<Mutex<AHashSet<String>>> =
    Lazy::new(|| Mutex::new(AHashSet::new()));

fn flag_unknown(kind: &'static str, label: &str) {
    let key = format!("{kind}:{label}");
    let mut seen = match FLAGGED_LABELS.lock() {
        Ok(s) => s,
        Err(poisoned) => poisoned.into_inner(),
    };
    if seen.insert(key) {
        warn!(%kind, %label, "unrecognized indicator label");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Verdict {
    Buy,
    Sell,
    Hold,
    Unknown(String),
}

impl From<String> for Verdict {
    fn from(s: String) -> Self {
        match s.as_str() {
            "BUY" => Self::Buy,
            "SELL" => Self::Sell,
            "HOLD" => Self::Hold,
            _ => {
                flag_unknown("signal", &s);
                Self::Unknown(s)
            }
        }
    }
}

impl Verdict {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Buy => Some("BUY"),
            Self::Sell => Some("SELL"),
            Self::Hold => Some("HOLD"),
            Self::Unknown(_) => None,
        }
    }
}

/// BUY/SELL on pending signals and trade fills.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Action {
    Buy,
    Sell,
    Unknown(String),
}

impl From<String> for Action {
    fn from(s: String) -> Self {
        match s.as_str() {
            "BUY" => Self::Buy,
            "SELL" => Self::Sell,
            _ => {
                flag_unknown("action", &s);
                Self::Unknown(s)
            }
        }
    }
}

impl Action {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Buy => Some("BUY"),
            Self::Sell => Some("SELL"),
            Self::Unknown(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum VolRegime {
    High,
    Low,
    Normal,
    Unknown(String),
}

impl From<String> for VolRegime {
    fn from(s: String) -> Self {
        match s.as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            "normal" => Self::Normal,
            _ => {
                flag_unknown("vol_regime", &s);
                Self::Unknown(s)
            }
        }
    }
}

impl VolRegime {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::High => Some("high"),
            Self::Low => Some("low"),
            Self::Normal => Some("normal"),
            Self::Unknown(_) => None,
        }
    }
}

// Momentum arrives mixed-case from upstream; case is part of the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Momentum {
    Bullish,
    Bearish,
    Neutral,
    Unknown(String),
}

impl From<String> for Momentum {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Bullish" => Self::Bullish,
            "Bearish" => Self::Bearish,
            "Neutral" => Self::Neutral,
            _ => {
                flag_unknown("momentum", &s);
                Self::Unknown(s)
            }
        }
    }
}

impl Momentum {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Bullish => Some("Bullish"),
            Self::Bearish => Some("Bearish"),
            Self::Neutral => Some("Neutral"),
            Self::Unknown(_) => None,
        }
    }
}

// Bollinger band position, phrase labels as emitted upstream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum BandSignal {
    AboveUpper,
    BelowLower,
    Inside,
    Unknown(String),
}

impl From<String> for BandSignal {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Above Upper Band" => Self::AboveUpper,
            "Below Lower Band" => Self::BelowLower,
            "Inside Bands" => Self::Inside,
            _ => {
                flag_unknown("bb_signal", &s);
                Self::Unknown(s)
            }
        }
    }
}

impl BandSignal {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::AboveUpper => Some("Above Upper Band"),
            Self::BelowLower => Some("Below Lower Band"),
            Self::Inside => Some("Inside Bands"),
            Self::Unknown(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum MarketRegime {
    Bull,
    Bear,
    Sideways,
    Unknown(String),
}

impl From<String> for MarketRegime {
    fn from(s: String) -> Self {
        match s.as_str() {
            "bull" => Self::Bull,
            "bear" => Self::Bear,
            "sideways" => Self::Sideways,
            _ => {
                flag_unknown("regime", &s);
                Self::Unknown(s)
            }
        }
    }
}

impl MarketRegime {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Bull => Some("bull"),
            Self::Bear => Some("bear"),
            Self::Sideways => Some("sideways"),
            Self::Unknown(_) => None,
        }
    }
}
