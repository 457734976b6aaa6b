// ===============================
// src/mock.rs
// ===============================
//
// Synthetic feed payloads for FEED_MODE=mock: a random-walk equity curve and
// a small fixed universe, so the dashboard can be driven end-to-end without
// a backend. Mock data enters through the same store/renderer path as live
// data; only the network call is bypassed.

use chrono::{Duration, Utc};
use rand::Rng;

use crate::client::ScannerLatest;
use crate::domain::{
    Action, AccountSnapshot, BandSignal, EquityPoint, MarketRegime, MetricsSnapshot, Momentum,
    PositionRow, ScannerRow, SignalRow, TradeRow, Verdict, VolRegime,
};

pub fn account() -> Option<AccountSnapshot> {
    Some(AccountSnapshot {
        net_liquidation: Some(103_250.75),
        cash: Some(41_830.20),
        position_value: Some(61_420.55),
        unrealized_pnl: Some(1_284.30),
        realized_pnl: Some(3_912.88),
        position_count: Some(4),
        as_of: Some(Utc::now().date_naive()),
    })
}

pub fn metrics() -> Option<MetricsSnapshot> {
    Some(MetricsSnapshot {
        sharpe: Some(1.42),
        max_drawdown: Some(0.087),
        total_return: Some(0.234),
        win_rate: Some(57.5),
    })
}

/// Random walk around $100k, one point per day ending today.
pub fn equity_curve(limit: u32) -> Vec<EquityPoint> {
    let mut rng = rand::thread_rng();
    let today = Utc::now().date_naive();
    let mut value = 100_000.0_f64;
    let mut out = Vec::with_capacity(limit as usize);
    for i in (0..i64::from(limit)).rev() {
        let step: f64 = rng.gen_range(-450.0..=500.0);
        value = (value + step).max(50_000.0);
        out.push(EquityPoint { date: today - Duration::days(i), value });
    }
    out
}

pub fn scanner() -> ScannerLatest {
    let rows = vec![
        ScannerRow {
            symbol: "AAPL".into(),
            close: Some(228.10),
            sma_20: Some(224.92),
            rsi_14: Some(61.3),
            vol_regime: Some(VolRegime::Normal),
            momentum: Some(Momentum::Bullish),
            bb_signal: Some(BandSignal::Inside),
            regime: Some(MarketRegime::Bull),
            held: true,
            signal: Some(Verdict::Hold),
            reject_reason: Some("already held".into()),
        },
        ScannerRow {
            symbol: "XOM".into(),
            close: Some(109.44),
            sma_20: Some(114.80),
            rsi_14: Some(33.9),
            vol_regime: Some(VolRegime::High),
            momentum: Some(Momentum::Bearish),
            bb_signal: Some(BandSignal::BelowLower),
            regime: Some(MarketRegime::Sideways),
            held: false,
            signal: Some(Verdict::Buy),
            reject_reason: None,
        },
        ScannerRow {
            symbol: "NVDA".into(),
            close: Some(131.26),
            sma_20: Some(120.17),
            rsi_14: Some(74.6),
            vol_regime: Some(VolRegime::High),
            momentum: Some(Momentum::Bullish),
            bb_signal: Some(BandSignal::AboveUpper),
            regime: Some(MarketRegime::Bull),
            held: true,
            signal: Some(Verdict::Sell),
            reject_reason: None,
        },
        ScannerRow {
            symbol: "KO".into(),
            close: Some(62.05),
            sma_20: Some(62.31),
            rsi_14: None,
            vol_regime: Some(VolRegime::Low),
            momentum: Some(Momentum::Neutral),
            bb_signal: Some(BandSignal::Inside),
            regime: Some(MarketRegime::Sideways),
            held: false,
            signal: Some(Verdict::Hold),
            reject_reason: Some("insufficient history".into()),
        },
    ];
    ScannerLatest { rows, scan_date: Some(Utc::now().date_naive()) }
}

pub fn positions() -> Vec<PositionRow> {
    let today = Utc::now().date_naive();
    vec![
        PositionRow {
            symbol: "AAPL".into(),
            qty: Some(80.0),
            avg_cost: Some(201.55),
            current_price: Some(228.10),
            market_value: Some(18_248.00),
            unrealized_pnl: Some(2_124.00),
            realized_pnl: Some(0.0),
            strategy: Some("trend".into()),
            entry_date: Some(today - Duration::days(41)),
        },
        PositionRow {
            symbol: "NVDA".into(),
            qty: Some(120.0),
            avg_cost: Some(118.02),
            current_price: Some(131.26),
            market_value: Some(15_751.20),
            unrealized_pnl: Some(1_588.80),
            realized_pnl: Some(640.10),
            strategy: Some("momentum".into()),
            entry_date: Some(today - Duration::days(12)),
        },
        PositionRow {
            symbol: "KO".into(),
            qty: Some(250.0),
            avg_cost: Some(63.48),
            current_price: Some(62.05),
            market_value: Some(15_512.50),
            unrealized_pnl: Some(-357.50),
            realized_pnl: Some(0.0),
            strategy: Some("mean_reversion".into()),
            entry_date: Some(today - Duration::days(87)),
        },
        PositionRow {
            symbol: "BRK.B".into(),
            qty: Some(25.0),
            avg_cost: Some(412.30),
            current_price: None,
            market_value: None,
            unrealized_pnl: None,
            realized_pnl: Some(0.0),
            strategy: None,
            entry_date: Some(today - Duration::days(203)),
        },
    ]
}

pub fn signals() -> Vec<SignalRow> {
    let now = Utc::now();
    vec![
        SignalRow {
            symbol: "XOM".into(),
            signal_type: Some(Action::Buy),
            qty: Some(90.0),
            target_price: Some(108.50),
            strategy: Some("mean_reversion".into()),
            reason: Some("RSI oversold, below lower band".into()),
            generated_at: Some(now - Duration::minutes(14)),
        },
        SignalRow {
            symbol: "NVDA".into(),
            signal_type: Some(Action::Sell),
            qty: Some(60.0),
            target_price: Some(133.00),
            strategy: Some("momentum".into()),
            reason: Some("RSI overbought, take profit".into()),
            generated_at: Some(now - Duration::minutes(14)),
        },
        // same symbol twice is legal: signals are not uniquely keyed
        SignalRow {
            symbol: "NVDA".into(),
            signal_type: Some(Action::Sell),
            qty: Some(60.0),
            target_price: Some(136.50),
            strategy: Some("trend".into()),
            reason: Some("trailing stop tightened".into()),
            generated_at: Some(now - Duration::hours(3)),
        },
    ]
}

pub fn trades(limit: u32) -> Vec<TradeRow> {
    let mut rng = rand::thread_rng();
    let today = Utc::now().date_naive();
    let symbols = ["AAPL", "NVDA", "KO", "XOM", "MSFT"];
    let strategies = ["trend", "momentum", "mean_reversion"];
    let n = limit.min(20) as usize;
    (0..n)
        .map(|i| {
            let sell = i % 2 == 0;
            let px: f64 = rng.gen_range(40.0..400.0);
            TradeRow {
                date: Some(today - Duration::days(i as i64 / 2)),
                symbol: symbols[i % symbols.len()].into(),
                action: Some(if sell { Action::Sell } else { Action::Buy }),
                qty: Some(f64::from(rng.gen_range(10..200))),
                price: Some((px * 100.0).round() / 100.0),
                realized_pnl: if sell {
                    Some((rng.gen_range(-600.0..900.0_f64) * 100.0).round() / 100.0)
                } else {
                    Some(0.0)
                },
                strategy: Some(strategies[i % strategies.len()].into()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equity_curve_is_date_ascending_with_requested_length() {
        let curve = equity_curve(30);
        assert_eq!(curve.len(), 30);
        assert!(curve.windows(2).all(|w| w[0].date < w[1].date));
        assert!(curve.last().map(|p| p.date) == Some(Utc::now().date_naive()));
    }

    #[test]
    fn test_trades_respects_limit() {
        assert_eq!(trades(5).len(), 5);
        assert_eq!(trades(500).len(), 20);
    }
}
