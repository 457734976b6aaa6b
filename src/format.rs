// ===============================
// src/format.rs
// ===============================
//
// Display shaping: raw numbers/dates -> strings and tone classifications.
// Everything here is pure and total; missing values become the placeholder
// glyph, never an error. All numeric rendering in the dashboard goes through
// this module.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{Action, BandSignal, MarketRegime, Momentum, Verdict, VolRegime};

/// Shown wherever a value is missing or unrecognized.
pub const PLACEHOLDER: &str = "—";

/// Sign classification used for coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

impl Tone {
    /// Strictly positive -> Positive, strictly negative -> Negative,
    /// zero / missing / non-finite -> Neutral.
    pub fn of(v: Option<f64>) -> Tone {
        match v {
            Some(x) if x.is_finite() && x > 0.0 => Tone::Positive,
            Some(x) if x.is_finite() && x < 0.0 => Tone::Negative,
            _ => Tone::Neutral,
        }
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `$1,234.50`; negatives as `-$1,234.50`; missing -> placeholder.
pub fn fmt_usd(v: Option<f64>) -> String {
    let x = match v {
        Some(x) if x.is_finite() => x,
        _ => return PLACEHOLDER.to_string(),
    };
    let s = format!("{:.2}", x.abs());
    let (int, frac) = s.split_once('.').unwrap_or((s.as_str(), "00"));
    let sign = if x < 0.0 { "-" } else { "" };
    format!("{sign}${}.{frac}", group_thousands(int))
}

/// Input is a fraction (0.1234 -> `12.34%`); missing -> placeholder.
pub fn fmt_pct(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{:.2}%", x * 100.0),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Input is already in percent points (61.5 -> `61.50%`).
pub fn fmt_pct_points(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{x:.2}%"),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Plain two-decimal value (Sharpe, RSI, prices without a currency prefix).
pub fn fmt_ratio(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{x:.2}"),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Quantities: integral when whole, two decimals otherwise.
pub fn fmt_qty(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            if x.fract() == 0.0 {
                format!("{x:.0}")
            } else {
                format!("{x:.2}")
            }
        }
        _ => PLACEHOLDER.to_string(),
    }
}

pub fn fmt_date(v: Option<NaiveDate>) -> String {
    match v {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn fmt_datetime(v: Option<DateTime<Utc>>) -> String {
    match v {
        Some(t) => t.format("%Y-%m-%d %H:%M").to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

/// Leading "+" for strictly positive values only; zero and negative get
/// nothing added (the numeric minus sign already carries the negative).
pub fn signed_prefix(x: f64) -> &'static str {
    if x.is_finite() && x > 0.0 {
        "+"
    } else {
        ""
    }
}

// ---------- indicator buckets ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiBucket {
    Oversold,
    Overbought,
    Neutral,
    Unclassified,
}

/// RSI thresholds: < 40 oversold, > 70 overbought.
pub fn rsi_bucket(v: Option<f64>) -> RsiBucket {
    match v {
        Some(x) if x.is_finite() && x < 40.0 => RsiBucket::Oversold,
        Some(x) if x.is_finite() && x > 70.0 => RsiBucket::Overbought,
        Some(x) if x.is_finite() => RsiBucket::Neutral,
        _ => RsiBucket::Unclassified,
    }
}

impl RsiBucket {
    pub fn label(&self) -> &'static str {
        match self {
            RsiBucket::Oversold => "oversold",
            RsiBucket::Overbought => "overbought",
            RsiBucket::Neutral => "neutral",
            RsiBucket::Unclassified => PLACEHOLDER,
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            RsiBucket::Oversold => Tone::Positive,
            RsiBucket::Overbought => Tone::Negative,
            RsiBucket::Neutral | RsiBucket::Unclassified => Tone::Neutral,
        }
    }
}

// ---------- categorical display: text + tone per vocabulary ----------
//
// Unknown or missing labels uniformly get the placeholder glyph and the
// neutral tone; domain.rs already flagged them at decode time.

fn label_or_placeholder(label: Option<&'static str>) -> String {
    label.unwrap_or(PLACEHOLDER).to_string()
}

pub fn verdict_cell(v: Option<&Verdict>) -> (String, Tone) {
    let tone = match v {
        Some(Verdict::Buy) => Tone::Positive,
        Some(Verdict::Sell) => Tone::Negative,
        _ => Tone::Neutral,
    };
    (label_or_placeholder(v.and_then(|v| v.label())), tone)
}

pub fn action_cell(v: Option<&Action>) -> (String, Tone) {
    let tone = match v {
        Some(Action::Buy) => Tone::Positive,
        Some(Action::Sell) => Tone::Negative,
        _ => Tone::Neutral,
    };
    (label_or_placeholder(v.and_then(|v| v.label())), tone)
}

pub fn vol_regime_cell(v: Option<&VolRegime>) -> (String, Tone) {
    let tone = match v {
        Some(VolRegime::High) => Tone::Negative,
        Some(VolRegime::Low) => Tone::Positive,
        _ => Tone::Neutral,
    };
    (label_or_placeholder(v.and_then(|v| v.label())), tone)
}

pub fn momentum_cell(v: Option<&Momentum>) -> (String, Tone) {
    let tone = match v {
        Some(Momentum::Bullish) => Tone::Positive,
        Some(Momentum::Bearish) => Tone::Negative,
        _ => Tone::Neutral,
    };
    (label_or_placeholder(v.and_then(|v| v.label())), tone)
}

pub fn band_signal_cell(v: Option<&BandSignal>) -> (String, Tone) {
    let tone = match v {
        Some(BandSignal::AboveUpper) => Tone::Negative,
        Some(BandSignal::BelowLower) => Tone::Positive,
        _ => Tone::Neutral,
    };
    (label_or_placeholder(v.and_then(|v| v.label())), tone)
}

pub fn market_regime_cell(v: Option<&MarketRegime>) -> (String, Tone) {
    let tone = match v {
        Some(MarketRegime::Bull) => Tone::Positive,
        Some(MarketRegime::Bear) => Tone::Negative,
        _ => Tone::Neutral,
    };
    (label_or_placeholder(v.and_then(|v| v.label())), tone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_usd_groups_and_prefixes() {
        assert_eq!(fmt_usd(Some(1234.5)), "$1,234.50");
        assert_eq!(fmt_usd(Some(1_000_000.0)), "$1,000,000.00");
        assert_eq!(fmt_usd(Some(0.0)), "$0.00");
        assert_eq!(fmt_usd(Some(999.999)), "$1,000.00");
    }

    #[test]
    fn test_fmt_usd_negative_and_missing() {
        assert_eq!(fmt_usd(Some(-1234.5)), "-$1,234.50");
        assert_eq!(fmt_usd(None), PLACEHOLDER);
        assert_eq!(fmt_usd(Some(f64::NAN)), PLACEHOLDER);
    }

    #[test]
    fn test_fmt_pct_is_fraction_based() {
        assert_eq!(fmt_pct(Some(0.0)), "0.00%");
        assert_eq!(fmt_pct(Some(0.1234)), "12.34%");
        assert_eq!(fmt_pct(Some(-0.055)), "-5.50%");
        assert_eq!(fmt_pct(None), PLACEHOLDER);
    }

    #[test]
    fn test_fmt_pct_points_is_direct() {
        assert_eq!(fmt_pct_points(Some(61.5)), "61.50%");
        assert_eq!(fmt_pct_points(None), PLACEHOLDER);
    }

    #[test]
    fn test_fmt_qty_drops_trailing_zeroes_for_whole_numbers() {
        assert_eq!(fmt_qty(Some(100.0)), "100");
        assert_eq!(fmt_qty(Some(2.5)), "2.50");
        assert_eq!(fmt_qty(None), PLACEHOLDER);
    }

    #[test]
    fn test_signed_prefix_only_for_strictly_positive() {
        assert_eq!(signed_prefix(3.2), "+");
        assert_eq!(signed_prefix(0.0), "");
        assert_eq!(signed_prefix(-3.2), "");
    }

    #[test]
    fn test_tone_classification() {
        assert_eq!(Tone::of(Some(0.01)), Tone::Positive);
        assert_eq!(Tone::of(Some(-0.01)), Tone::Negative);
        assert_eq!(Tone::of(Some(0.0)), Tone::Neutral);
        assert_eq!(Tone::of(None), Tone::Neutral);
    }

    #[test]
    fn test_rsi_buckets() {
        assert_eq!(rsi_bucket(Some(35.0)), RsiBucket::Oversold);
        assert_eq!(rsi_bucket(Some(75.0)), RsiBucket::Overbought);
        assert_eq!(rsi_bucket(Some(50.0)), RsiBucket::Neutral);
        assert_eq!(rsi_bucket(None), RsiBucket::Unclassified);
        // boundaries are exclusive
        assert_eq!(rsi_bucket(Some(40.0)), RsiBucket::Neutral);
        assert_eq!(rsi_bucket(Some(70.0)), RsiBucket::Neutral);
    }

    #[test]
    fn test_unknown_labels_render_neutral_placeholder() {
        let unknown = Momentum::Unknown("bullish".to_string());
        let (text, tone) = momentum_cell(Some(&unknown));
        assert_eq!(text, PLACEHOLDER);
        assert_eq!(tone, Tone::Neutral);
        let (text, tone) = momentum_cell(None);
        assert_eq!(text, PLACEHOLDER);
        assert_eq!(tone, Tone::Neutral);
    }
}
