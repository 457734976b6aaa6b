// ===============================
// src/client.rs
// ===============================
//
// Read-only feed client for the dashboard backend. One method per feed,
// idempotent GETs against fixed paths, every failure converted into a
// FeedError result at this boundary. Timeouts come from the reqwest client
// itself; there is no retry or escalation layer on top.

use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use crate::domain::{
    AccountHistoryRow, AccountSnapshot, Envelope, EquityPoint, MetricsSnapshot,
    PortfolioHistoryRow, PositionRow, ScannerRow, SignalRow, TradeRow,
};

const ACCOUNT_CURRENT: &str = "/api/v1/account/current";
const ACCOUNT_HISTORY: &str = "/api/v1/account/history";
const PORTFOLIO_HISTORY: &str = "/api/v1/portfolio/history";
const METRICS_CURRENT: &str = "/api/v1/metrics/current";
const SCANNER_LATEST: &str = "/api/v1/scanner/latest";
const POSITIONS_CURRENT: &str = "/api/v1/positions/current";
const SIGNALS_PENDING: &str = "/api/v1/signals/pending";
const TRADES_RECENT: &str = "/api/v1/trades/recent";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("transport failure on {path}: {source}")]
    Transport {
        path: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} returned HTTP {status}")]
    Status {
        path: &'static str,
        status: reqwest::StatusCode,
    },
    #[error("invalid envelope from {path}: {source}")]
    Decode {
        path: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Scanner payload carries its scan date next to the rows.
#[derive(Debug, Clone)]
pub struct ScannerLatest {
    pub rows: Vec<ScannerRow>,
    pub scan_date: Option<chrono::NaiveDate>,
}

pub struct FeedClient {
    http: reqwest::Client,
    base: String,
}

impl FeedClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { http, base: base.trim_end_matches('/').to_string() })
    }

    async fn get_envelope<T: DeserializeOwned>(
        &self,
        path: &'static str,
        query: &[(&str, String)],
    ) -> Result<Envelope<T>, FeedError> {
        let url = format!("{}{}", self.base, path);
        let rsp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| FeedError::Transport { path, source: e })?;

        let status = rsp.status();
        if !status.is_success() {
            return Err(FeedError::Status { path, status });
        }

        let body = rsp
            .text()
            .await
            .map_err(|e| FeedError::Transport { path, source: e })?;
        parse_envelope(path, &body)
    }

    pub async fn account(&self) -> Result<Option<AccountSnapshot>, FeedError> {
        Ok(self.get_envelope(ACCOUNT_CURRENT, &[]).await?.data)
    }

    pub async fn metrics(&self) -> Result<Option<MetricsSnapshot>, FeedError> {
        Ok(self.get_envelope(METRICS_CURRENT, &[]).await?.data)
    }

    pub async fn account_history(&self, limit: u32) -> Result<Vec<EquityPoint>, FeedError> {
        let env: Envelope<Vec<AccountHistoryRow>> = self
            .get_envelope(ACCOUNT_HISTORY, &[("limit", limit.to_string())])
            .await?;
        Ok(env.data.unwrap_or_default().into_iter().map(EquityPoint::from).collect())
    }

    pub async fn portfolio_history(&self, limit: u32) -> Result<Vec<EquityPoint>, FeedError> {
        let env: Envelope<Vec<PortfolioHistoryRow>> = self
            .get_envelope(PORTFOLIO_HISTORY, &[("limit", limit.to_string())])
            .await?;
        Ok(env.data.unwrap_or_default().into_iter().map(EquityPoint::from).collect())
    }

    /// Equity curve with the fallback chain: the account history series wins
    /// when it has at least one point; otherwise the portfolio history
    /// series is fetched. A primary failure also falls through to the
    /// fallback rather than failing the panel outright.
    pub async fn equity_curve(&self, limit: u32) -> Result<Vec<EquityPoint>, FeedError> {
        let primary = match self.account_history(limit).await {
            Ok(points) => points,
            Err(e) => {
                warn!(error = %e, "primary equity feed failed, trying fallback");
                Vec::new()
            }
        };
        if !primary.is_empty() {
            return Ok(primary);
        }
        let fallback = self.portfolio_history(limit).await?;
        Ok(prefer_primary(primary, fallback))
    }

    pub async fn scanner(&self) -> Result<ScannerLatest, FeedError> {
        let env: Envelope<Vec<ScannerRow>> = self.get_envelope(SCANNER_LATEST, &[]).await?;
        Ok(ScannerLatest { rows: env.data.unwrap_or_default(), scan_date: env.scan_date })
    }

    pub async fn positions(&self) -> Result<Vec<PositionRow>, FeedError> {
        let env: Envelope<Vec<PositionRow>> = self.get_envelope(POSITIONS_CURRENT, &[]).await?;
        Ok(env.data.unwrap_or_default())
    }

    pub async fn signals(&self) -> Result<Vec<SignalRow>, FeedError> {
        let env: Envelope<Vec<SignalRow>> = self.get_envelope(SIGNALS_PENDING, &[]).await?;
        Ok(env.data.unwrap_or_default())
    }

    pub async fn trades(&self, limit: u32) -> Result<Vec<TradeRow>, FeedError> {
        let env: Envelope<Vec<TradeRow>> = self
            .get_envelope(TRADES_RECENT, &[("limit", limit.to_string())])
            .await?;
        Ok(env.data.unwrap_or_default())
    }
}

fn parse_envelope<T: DeserializeOwned>(
    path: &'static str,
    body: &str,
) -> Result<Envelope<T>, FeedError> {
    serde_json::from_str(body).map_err(|e| FeedError::Decode { path, source: e })
}

fn prefer_primary(primary: Vec<EquityPoint>, fallback: Vec<EquityPoint>) -> Vec<EquityPoint> {
    if primary.is_empty() {
        fallback
    } else {
        primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn pt(day: u32, value: f64) -> EquityPoint {
        EquityPoint { date: NaiveDate::from_ymd_opt(2025, 7, day).unwrap(), value }
    }

    #[test]
    fn test_empty_primary_selects_fallback_in_original_order() {
        let fallback = vec![pt(1, 100.0), pt(2, 101.0), pt(3, 99.5)];
        let chosen = prefer_primary(Vec::new(), fallback.clone());
        assert_eq!(chosen, fallback);
    }

    #[test]
    fn test_non_empty_primary_wins_over_fallback() {
        let primary = vec![pt(1, 100.0)];
        let chosen = prefer_primary(primary.clone(), vec![pt(1, 42.0), pt(2, 43.0)]);
        assert_eq!(chosen, primary);
    }

    #[test]
    fn test_parse_envelope_decodes_scan_date() {
        let body = r#"{"data":[{"symbol":"MSFT","close":430.0,"sma_20":425.0,"rsi_14":55.0}],"scan_date":"2025-07-03"}"#;
        let env: Envelope<Vec<ScannerRow>> = parse_envelope(SCANNER_LATEST, body).unwrap();
        assert_eq!(env.scan_date, NaiveDate::from_ymd_opt(2025, 7, 3));
        assert_eq!(env.data.unwrap()[0].symbol, "MSFT");
    }

    #[test]
    fn test_parse_envelope_reports_decode_error() {
        let res: Result<Envelope<Vec<TradeRow>>, _> =
            parse_envelope(TRADES_RECENT, "<html>backend down</html>");
        match res {
            Err(FeedError::Decode { path, .. }) => assert_eq!(path, TRADES_RECENT),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
