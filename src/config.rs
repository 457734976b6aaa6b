// ===============================
// src/config.rs
// ===============================
//
// Runtime configuration: CLI flags win over environment variables, which
// win over defaults. `.env` is loaded first so API_BASE_URL etc. can live
// next to the binary during development. The base origin is external
// configuration only; none of the core modules know about hosts.

use std::env;
use std::str::FromStr;

use clap::Parser;
use dotenvy::dotenv;
use thiserror::Error;
use url::Url;

/// Where feed payloads come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedMode {
    /// Poll the HTTP backend.
    Live,
    /// Generate synthetic payloads locally (no backend needed).
    Mock,
}

impl FeedMode {
    pub fn parse_one(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Some(FeedMode::Live),
            "mock" => Some(FeedMode::Mock),
            _ => None,
        }
    }

    pub fn from_env(key: &str, default_mode: FeedMode) -> FeedMode {
        env::var(key)
            .ok()
            .and_then(|s| Self::parse_one(&s))
            .unwrap_or(default_mode)
    }
}

#[derive(Parser, Debug)]
#[command(name = "tradedash", about = "Terminal dashboard for a trading account")]
struct Cli {
    /// Backend origin, e.g. http://127.0.0.1:8000
    #[arg(long)]
    base_url: Option<String>,
    /// Seconds between polls
    #[arg(long)]
    refresh_secs: Option<u64>,
    /// Equity curve points to request
    #[arg(long)]
    history_limit: Option<u32>,
    /// Recent trades to request
    #[arg(long)]
    trades_limit: Option<u32>,
    /// HTTP timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// live | mock
    #[arg(long)]
    feed_mode: Option<String>,
    #[arg(long)]
    chart_width: Option<usize>,
    #[arg(long)]
    chart_height: Option<usize>,
    /// Fetch and render once, then exit
    #[arg(long)]
    once: bool,
    /// Disable ANSI colors
    #[arg(long)]
    no_color: bool,
}

#[derive(Clone, Debug)]
pub struct Args {
    pub base_url: String,
    pub refresh_secs: u64,
    pub history_limit: u32,
    pub trades_limit: u32,
    pub timeout_secs: u64,
    pub feed_mode: FeedMode,
    pub chart_width: usize,
    pub chart_height: usize,
    pub once: bool,
    pub color: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url {url}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

pub fn load() -> Result<Args, ConfigError> {
    // Make sure .env is read before any env lookups.
    let _ = dotenv();
    let cli = Cli::parse();

    let base_url = cli
        .base_url
        .or_else(|| env::var("API_BASE_URL").ok())
        .unwrap_or_else(|| "http://127.0.0.1:8000".to_string());
    Url::parse(&base_url)
        .map_err(|e| ConfigError::InvalidBaseUrl { url: base_url.clone(), source: e })?;

    let feed_mode = cli
        .feed_mode
        .as_deref()
        .and_then(FeedMode::parse_one)
        .unwrap_or_else(|| FeedMode::from_env("FEED_MODE", FeedMode::Live));

    Ok(Args {
        base_url,
        refresh_secs: cli.refresh_secs.or_else(|| env_parse("REFRESH_SECS")).unwrap_or(30),
        history_limit: cli.history_limit.or_else(|| env_parse("HISTORY_LIMIT")).unwrap_or(90),
        trades_limit: cli.trades_limit.or_else(|| env_parse("TRADES_LIMIT")).unwrap_or(50),
        timeout_secs: cli.timeout_secs.or_else(|| env_parse("HTTP_TIMEOUT_SECS")).unwrap_or(10),
        feed_mode,
        chart_width: cli.chart_width.or_else(|| env_parse("CHART_WIDTH")).unwrap_or(72),
        chart_height: cli.chart_height.or_else(|| env_parse("CHART_HEIGHT")).unwrap_or(12),
        once: cli.once,
        color: !cli.no_color && env::var("NO_COLOR").is_err(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_mode_parsing() {
        assert_eq!(FeedMode::parse_one("live"), Some(FeedMode::Live));
        assert_eq!(FeedMode::parse_one(" MOCK "), Some(FeedMode::Mock));
        assert_eq!(FeedMode::parse_one("websocket"), None);
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let err = Url::parse("not a url").unwrap_err();
        let cfg_err = ConfigError::InvalidBaseUrl { url: "not a url".into(), source: err };
        assert!(cfg_err.to_string().contains("invalid base url"));
    }
}
