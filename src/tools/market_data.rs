use crate::exceptions::ChatError;
use serde::Deserialize;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, PartialEq)]
pub struct DailyBar {
    pub date: Date,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

/// Daily price history from the Yahoo Finance v8 chart endpoint.
#[derive(Debug, Clone)]
pub struct MarketDataClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Deserialize, Default)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Deserialize, Default)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Deserialize, Default)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

impl MarketDataClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: crate::utils::setup_http_client(),
            base_url: crate::utils::normalize_base_url(base_url),
        }
    }

    /// Bars whose exchange-local trading date falls in `[start, end)`.
    pub async fn daily_bars(
        &self,
        symbol: &str,
        start: Date,
        end: Date,
    ) -> Result<Vec<DailyBar>, ChatError> {
        // Widen the window by a day on each side; filtering happens on exchange-local dates.
        let period1 = (start - Duration::days(1)).midnight().assume_utc().unix_timestamp();
        let period2 = (end + Duration::days(1)).midnight().assume_utc().unix_timestamp();

        let mut url = reqwest::Url::parse(&format!("{}/v8/finance/chart/", self.base_url))
            .map_err(|e| ChatError::Configuration(format!("Invalid market data URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ChatError::Configuration("Invalid market data URL".into()))?
            .pop_if_empty()
            .push(symbol);
        url.query_pairs_mut()
            .append_pair("period1", &period1.to_string())
            .append_pair("period2", &period2.to_string())
            .append_pair("interval", "1d")
            .append_pair("events", "history");

        tracing::debug!("Fetching daily bars for {} from {} to {}", symbol, start, end);

        let response = self
            .http
            .get(url)
            .header("User-Agent", concat!("stmtchat/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ChatError::Provider(format!(
                "Market data error (Status: {}): {}",
                status, text
            )));
        }

        let envelope: ChartEnvelope = response.json().await?;
        if let Some(err) = envelope.chart.error {
            return Err(ChatError::Provider(format!(
                "Market data error: {} {}",
                err.code, err.description
            )));
        }

        let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(Vec::new());
        };

        let offset = UtcOffset::from_whole_seconds(result.meta.gmtoffset).unwrap_or(UtcOffset::UTC);
        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

        let mut bars = Vec::with_capacity(result.timestamp.len());
        for (i, ts) in result.timestamp.iter().enumerate() {
            let Ok(moment) = OffsetDateTime::from_unix_timestamp(*ts) else {
                continue;
            };
            let date = moment.to_offset(offset).date();
            if date < start || date >= end {
                continue;
            }
            bars.push(DailyBar {
                date,
                open: quote.open.get(i).copied().flatten(),
                high: quote.high.get(i).copied().flatten(),
                low: quote.low.get(i).copied().flatten(),
                close: quote.close.get(i).copied().flatten(),
                volume: quote.volume.get(i).copied().flatten(),
            });
        }

        Ok(bars)
    }
}
