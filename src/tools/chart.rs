use super::finance::parse_date;
use crate::models::{ChartKind, ChartPoint, ChartSpec};
use serde::Deserialize;
use serde_json::Value;

pub const INCOMPLETE_DATA: &str = "Chart could not be generated due to incomplete data.";

fn default_chart_type() -> String {
    "bar".to_string()
}

fn default_x_axis() -> String {
    "item".to_string()
}

fn default_y_axis() -> String {
    "value".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ChartArgs {
    pub title: String,
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default = "default_chart_type")]
    pub chart_type: String,
    #[serde(default = "default_x_axis")]
    pub x_axis: String,
    #[serde(default = "default_y_axis")]
    pub y_axis: String,
}

fn label_of(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Finite numbers only; "NaN" and "inf" parse as f64 but cannot be stored as JSON.
fn number_of(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        // Models occasionally quote figures; accept "1,234.5" as well.
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

/// Validates the model-supplied rows and turns them into a chart ready for display.
///
/// Returns `None` when the data is empty or any row is missing its label or value.
pub fn build_chart(args: ChartArgs) -> Option<ChartSpec> {
    let kind = ChartKind::parse(&args.chart_type);
    let mut rows = args.data;
    if rows.is_empty() {
        return None;
    }

    if kind == ChartKind::Line && rows.iter().all(|r| r.get("date").is_some()) {
        rows.sort_by_cached_key(|r| {
            let raw = r.get("date").and_then(Value::as_str).unwrap_or_default();
            (parse_date(raw).ok(), raw.to_string())
        });
    }

    let mut points = Vec::with_capacity(rows.len());
    for row in &rows {
        let label = row.get(&args.x_axis).and_then(label_of)?;
        let value = row.get(&args.y_axis).and_then(number_of)?;
        points.push(ChartPoint { label, value });
    }

    Some(ChartSpec {
        title: args.title,
        kind,
        x_axis: args.x_axis,
        y_axis: args.y_axis,
        points,
    })
}

pub fn success_message(title: &str) -> String {
    format!(
        "Success: The chart titled '{}' has been generated and is ready for display.",
        title
    )
}
