// src/exchange/eastmoney.rs
use crate::domain::errors::{MarketDataError, MarketDataResult};
use crate::domain::models::{Bar, PriceSeries};
use crate::exchange::client::{HistorySource, QuoteSource};
use crate::http::{HttpClient, HttpError};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

pub const KLINE_URL: &str = "https://push2his.eastmoney.com/api/qt/stock/kline/get";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36";

// Rows for the live-bar lookup; only the newest one is used
const LIVE_LOOKBACK: usize = 5;

const SHENZHEN_PREFIXES: [&str; 8] = ["00", "30", "301", "002", "15", "16", "18", "8"];
const SHANGHAI_PREFIXES: [&str; 6] = ["60", "688", "50", "51", "56", "58"];

#[derive(Debug, Deserialize)]
struct KlinePayload {
    data: Option<KlineData>,
}

#[derive(Debug, Deserialize)]
struct KlineData {
    #[serde(default)]
    klines: Vec<String>,
}

/// Normalize `159218`, `159218.SZ` or `sz159218` to the six-digit code
pub fn normalize_code(code: &str) -> MarketDataResult<String> {
    let digits: String = code.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 6 {
        return Err(MarketDataError::InvalidSymbol(code.to_string()));
    }
    Ok(digits[..6].to_string())
}

/// Market-prefixed security id: `0.` for Shenzhen, `1.` for Shanghai
pub fn secid(code: &str) -> MarketDataResult<String> {
    let code6 = normalize_code(code)?;
    if SHENZHEN_PREFIXES.iter().any(|p| code6.starts_with(p)) {
        return Ok(format!("0.{}", code6));
    }
    if SHANGHAI_PREFIXES.iter().any(|p| code6.starts_with(p)) {
        return Ok(format!("1.{}", code6));
    }
    Err(MarketDataError::InvalidSymbol(code.to_string()))
}

/// Unwrap a JSONP body and return the raw kline rows
pub fn parse_kline_body(body: &str) -> MarketDataResult<Vec<String>> {
    let json = match (body.find('('), body.rfind(')')) {
        (Some(start), Some(end)) if start < end => &body[start + 1..end],
        _ => body.trim(),
    };

    let payload: KlinePayload = serde_json::from_str(json)
        .map_err(|e| MarketDataError::InvalidFormat(format!("kline payload: {}", e)))?;

    payload
        .data
        .map(|d| d.klines)
        .ok_or_else(|| MarketDataError::NoData("kline payload has no data".to_string()))
}

/// Parse `date,open,close,high,low,volume,amount[,amplitude,pct_change,...]`
pub fn parse_kline_row(row: &str) -> MarketDataResult<Bar> {
    let fields: Vec<&str> = row.split(',').map(str::trim).collect();
    if fields.len() < 7 {
        return Err(MarketDataError::InvalidFormat(format!(
            "expected at least 7 kline fields, got {}: {}",
            fields.len(),
            row
        )));
    }

    let date = NaiveDate::parse_from_str(fields[0], "%Y-%m-%d")
        .map_err(|e| MarketDataError::InvalidFormat(format!("kline date '{}': {}", fields[0], e)))?;
    let number = |idx: usize, name: &str| -> MarketDataResult<f64> {
        fields[idx].parse::<f64>().map_err(|e| {
            MarketDataError::InvalidFormat(format!("kline {} '{}': {}", name, fields[idx], e))
        })
    };

    Ok(Bar {
        date,
        open: number(1, "open")?,
        close: number(2, "close")?,
        high: number(3, "high")?,
        low: number(4, "low")?,
        volume: number(5, "volume")?,
        amount: number(6, "amount")?,
        pct_change: fields.get(8).and_then(|v| v.parse::<f64>().ok()),
    })
}

fn map_http_error(err: HttpError) -> MarketDataError {
    match err {
        HttpError::Timeout(secs) => MarketDataError::Timeout(secs),
        other => MarketDataError::Http(other.to_string()),
    }
}

/// Daily kline client; serves both the live bar and provider history
pub struct EastMoneyClient {
    http: HttpClient,
    base_url: String,
    timeout: Duration,
}

impl EastMoneyClient {
    pub fn new(http: HttpClient, timeout: Duration) -> Self {
        Self::with_base_url(http, KLINE_URL, timeout)
    }

    pub fn with_base_url(http: HttpClient, base_url: &str, timeout: Duration) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            timeout,
        }
    }

    fn kline_url(&self, code: &str, limit: usize) -> MarketDataResult<String> {
        let secid = secid(code)?;
        let now_ms = chrono::Utc::now().timestamp_millis();
        Ok(format!(
            "{}?cb=jQuery3510_{ts}&secid={secid}&ut=fa5fd1943c7b386f172d6893dbfba10b\
             &fields1=f1,f2,f3,f4,f5,f6&fields2=f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61\
             &klt=101&fqt=1&end=20500101&lmt={limit}&_={ts}",
            self.base_url,
            ts = now_ms,
            secid = secid,
            limit = limit,
        ))
    }

    /// Fetch up to `limit` daily bars, oldest first
    pub async fn fetch_klines(&self, code: &str, limit: usize) -> MarketDataResult<Vec<Bar>> {
        let url = self.kline_url(code, limit)?;
        log::debug!("Fetching daily klines for {} (limit {})", code, limit);

        let response = self
            .http
            .get(&url, &[("User-Agent", USER_AGENT)], self.timeout)
            .await
            .map_err(map_http_error)?;
        if !response.is_success() {
            return Err(MarketDataError::Http(format!(
                "kline endpoint returned status {}",
                response.status
            )));
        }

        parse_kline_body(&response.body)?
            .iter()
            .map(|row| parse_kline_row(row))
            .collect()
    }
}

#[async_trait]
impl QuoteSource for EastMoneyClient {
    async fn fetch_live_bar(&self, instrument: &str) -> MarketDataResult<Bar> {
        self.fetch_klines(instrument, LIVE_LOOKBACK)
            .await?
            .pop()
            .ok_or_else(|| MarketDataError::NoData(instrument.to_string()))
    }
}

#[async_trait]
impl HistorySource for EastMoneyClient {
    async fn fetch_history(&self, instrument: &str, limit: usize) -> MarketDataResult<PriceSeries> {
        let code6 = normalize_code(instrument)?;
        let bars = self.fetch_klines(&code6, limit).await?;
        Ok(PriceSeries::new(&code6, bars))
    }
}
