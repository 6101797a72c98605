pub mod chart;
pub mod finance;
pub mod market_data;

use crate::models::ChartSpec;
use market_data::MarketDataClient;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

pub const STOCK_PRICE: &str = "get_historical_stock_price";
pub const INDEX_VALUE: &str = "get_historical_index_value";
pub const PRICE_RANGE: &str = "get_historical_price_range";
pub const COMPARISON_CHART: &str = "display_comparison_chart";

/// A function the models may call, with its JSON-schema parameters.
#[derive(Debug, Clone)]
pub struct ToolDeclaration {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

impl ToolDeclaration {
    /// Chat-completions / Assistants shape: `{"type": "function", "function": {...}}`.
    pub fn to_openai(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

fn string_param(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

pub fn declarations() -> Vec<ToolDeclaration> {
    vec![
        ToolDeclaration {
            name: STOCK_PRICE,
            description: "Fetches historical stock data for a stock ticker on a specific date.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "ticker_symbol": string_param("The stock ticker symbol (e.g., 'RELIANCE.NS')."),
                    "date_str": string_param("The date in YYYY-MM-DD format."),
                },
                "required": ["ticker_symbol", "date_str"],
            }),
        },
        ToolDeclaration {
            name: INDEX_VALUE,
            description: "Fetches historical data for a market index on a specific date.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "index_symbol": string_param("The market index symbol (e.g., '^NSEI')."),
                    "date_str": string_param("The date in YYYY-MM-DD format."),
                },
                "required": ["index_symbol", "date_str"],
            }),
        },
        ToolDeclaration {
            name: PRICE_RANGE,
            description: "Fetches daily closing stock prices for a ticker over a specified date range.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "ticker_symbol": string_param("The stock ticker symbol."),
                    "start_date": string_param("The start date in YYYY-MM-DD format."),
                    "end_date": string_param("The end date in YYYY-MM-DD format."),
                },
                "required": ["ticker_symbol", "start_date", "end_date"],
            }),
        },
        ToolDeclaration {
            name: COMPARISON_CHART,
            description: "Displays a bar, pie, or line chart to visually compare financial data, such as profits/losses across different stocks or segments.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "chart_type": {
                        "type": "string",
                        "enum": ["bar", "pie", "line"],
                        "description": "The type of chart to display.",
                    },
                    "title": string_param("The title for the chart."),
                    "data": {
                        "type": "array",
                        "description": "The data to plot. A list of objects, where each object is a data point.",
                        "items": {
                            "type": "object",
                            "properties": {
                                "item": string_param("The label for a data point (e.g., stock or segment name)."),
                                "value": { "type": "number", "description": "The numerical value for a data point (e.g., profit amount)." },
                                "date": string_param("The date for a data point (used for line charts)."),
                            },
                        },
                    },
                    "x_axis": string_param("The key from the data objects to use for the x-axis. Defaults to 'item'."),
                    "y_axis": string_param("The key from the data objects to use for the y-axis. Defaults to 'value'."),
                },
                "required": ["title", "data", "chart_type"],
            }),
        },
    ]
}

#[derive(Deserialize)]
struct PriceArgs {
    ticker_symbol: String,
    date_str: String,
}

#[derive(Deserialize)]
struct IndexArgs {
    index_symbol: String,
    date_str: String,
}

#[derive(Deserialize)]
struct RangeArgs {
    ticker_symbol: String,
    start_date: String,
    end_date: String,
}

/// Per-exchange scratch space. A successful chart call stages its chart here.
#[derive(Debug, Default)]
pub struct ToolContext {
    pub staged_chart: Option<ChartSpec>,
}

fn error_output(message: String) -> String {
    json!({ "error": message }).to_string()
}

pub fn unknown_tool_output(name: &str) -> String {
    error_output(format!("Unknown tool: {}", name))
}

/// Executes model-requested functions. Outputs are always strings; failures are
/// reported to the model as `{"error": ...}` rather than returned as errors.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    market: MarketDataClient,
}

impl ToolRegistry {
    pub fn new(market: MarketDataClient) -> Self {
        Self { market }
    }

    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        declarations()
    }

    pub fn contains(&self, name: &str) -> bool {
        matches!(name, STOCK_PRICE | INDEX_VALUE | PRICE_RANGE | COMPARISON_CHART)
    }

    /// Returns `None` for a function this registry does not know.
    pub async fn call(&self, name: &str, args: &Value, ctx: &mut ToolContext) -> Option<String> {
        if !self.contains(name) {
            return None;
        }
        tracing::info!("Executing tool {} with {}", name, args);

        let output = match name {
            STOCK_PRICE => match parse_args::<PriceArgs>(name, args) {
                Ok(a) => {
                    finance_output(finance::price_on_date(&self.market, &a.ticker_symbol, &a.date_str).await)
                }
                Err(e) => e,
            },
            INDEX_VALUE => match parse_args::<IndexArgs>(name, args) {
                Ok(a) => {
                    finance_output(finance::price_on_date(&self.market, &a.index_symbol, &a.date_str).await)
                }
                Err(e) => e,
            },
            PRICE_RANGE => match parse_args::<RangeArgs>(name, args) {
                Ok(a) => finance_output(
                    finance::price_range(&self.market, &a.ticker_symbol, &a.start_date, &a.end_date)
                        .await,
                ),
                Err(e) => e,
            },
            _ => match parse_args::<chart::ChartArgs>(name, args) {
                Ok(a) => match chart::build_chart(a) {
                    Some(spec) => {
                        let message = chart::success_message(&spec.title);
                        ctx.staged_chart = Some(spec);
                        message
                    }
                    None => error_output(chart::INCOMPLETE_DATA.to_string()),
                },
                Err(e) => e,
            },
        };

        tracing::debug!("Tool {} returned {}", name, output);
        Some(output)
    }
}

fn parse_args<T: DeserializeOwned>(name: &str, args: &Value) -> Result<T, String> {
    // Some providers send no arguments at all for parameterless calls.
    let empty = json!({});
    let args = if args.is_null() { &empty } else { args };
    T::deserialize(args).map_err(|e| error_output(format!("Failed to execute tool {}: {}", name, e)))
}

fn finance_output(result: Result<Value, crate::exceptions::ChatError>) -> String {
    match result {
        Ok(v) => v.to_string(),
        Err(e) => {
            tracing::warn!("Tool failed: {}", e);
            error_output(format!("An error occurred: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ToolRegistry {
        ToolRegistry::new(MarketDataClient::new("http://127.0.0.1:9"))
    }

    #[test]
    fn test_declarations_cover_every_callable_tool() {
        let reg = registry();
        let decls = reg.declarations();
        assert_eq!(decls.len(), 4);
        assert!(decls.iter().all(|d| reg.contains(d.name)));
        assert_eq!(decls[0].to_openai()["function"]["name"], STOCK_PRICE);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_executed() {
        let mut ctx = ToolContext::default();
        assert!(registry().call("rm_rf", &json!({}), &mut ctx).await.is_none());
    }

    #[tokio::test]
    async fn test_bad_arguments_are_reported_to_model() {
        let mut ctx = ToolContext::default();
        let out = registry()
            .call(STOCK_PRICE, &json!({"ticker_symbol": "TCS.NS"}), &mut ctx)
            .await
            .unwrap();
        let v: Value = serde_json::from_str(&out).unwrap();
        assert!(
            v["error"]
                .as_str()
                .unwrap()
                .starts_with("Failed to execute tool get_historical_stock_price:")
        );
    }

    #[tokio::test]
    async fn test_chart_call_stages_chart() {
        let mut ctx = ToolContext::default();
        let out = registry()
            .call(
                COMPARISON_CHART,
                &json!({"title": "P&L", "chart_type": "pie", "data": [{"item": "A", "value": 1}]}),
                &mut ctx,
            )
            .await
            .unwrap();
        assert_eq!(
            out,
            "Success: The chart titled 'P&L' has been generated and is ready for display."
        );
        assert_eq!(ctx.staged_chart.unwrap().points.len(), 1);
    }
}
