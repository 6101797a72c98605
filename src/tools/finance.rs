use super::market_data::{DailyBar, MarketDataClient};
use crate::exceptions::ChatError;
use serde_json::{Value, json};
use time::macros::format_description;
use time::{Date, Duration};

pub(crate) fn parse_date(raw: &str) -> Result<Date, ChatError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).map_err(|e| {
        ChatError::InvalidInput(format!(
            "'{}' is not a valid YYYY-MM-DD date: {}",
            raw, e
        ))
    })
}

fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

fn bar_json(symbol: &str, bar: &DailyBar) -> Value {
    json!({
        "date": format_date(bar.date),
        "ticker": symbol,
        "open": bar.open,
        "high": bar.high,
        "low": bar.low,
        "close": bar.close,
        "volume": bar.volume,
    })
}

/// Daily bar for `symbol` on exactly `date_str`. Used for both tickers and indices.
pub async fn price_on_date(
    market: &MarketDataClient,
    symbol: &str,
    date_str: &str,
) -> Result<Value, ChatError> {
    let day = parse_date(date_str)?;
    let bars = market.daily_bars(symbol, day, day + Duration::days(2)).await?;

    if bars.is_empty() {
        return Ok(json!({
            "error": format!("No data found for {} around {}.", symbol, date_str)
        }));
    }

    match bars.iter().find(|b| b.date == day) {
        Some(bar) => Ok(bar_json(symbol, bar)),
        None => Ok(json!({
            "error": format!("No trading data for {} on {}.", symbol, date_str)
        })),
    }
}

/// Closing prices over `[start_date, end_date)`.
pub async fn price_range(
    market: &MarketDataClient,
    symbol: &str,
    start_date: &str,
    end_date: &str,
) -> Result<Value, ChatError> {
    let start = parse_date(start_date)?;
    let end = parse_date(end_date)?;
    if end <= start {
        return Err(ChatError::InvalidInput(format!(
            "end date {} must be after start date {}",
            end_date, start_date
        )));
    }

    let bars = market.daily_bars(symbol, start, end).await?;
    if bars.is_empty() {
        return Ok(json!({
            "error": format!(
                "No data found for {} in the range {} to {}.",
                symbol, start_date, end_date
            )
        }));
    }

    let rows: Vec<Value> = bars
        .iter()
        .map(|b| json!({ "Date": format_date(b.date), "Close": b.close }))
        .collect();
    Ok(Value::Array(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_accepts_iso_and_rejects_other_forms() {
        assert_eq!(
            parse_date("2024-03-28").unwrap(),
            Date::from_calendar_date(2024, time::Month::March, 28).unwrap()
        );
        assert!(parse_date("28/03/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }
}
