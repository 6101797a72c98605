use crate::models::{ChartKind, ChartSpec, Message, Role};
use comfy_table::presets::NOTHING;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use crossterm::style::Stylize;
use std::io::{IsTerminal, Write};
use unicode_width::UnicodeWidthStr;

pub const ANSI_REGEX_PATTERN: &str = r"\x1b\[[0-9;?]*[a-zA-Z]|\x1b].*?(\x1b\\|[\x07])";

pub fn strip_ansi_codes(s: &str) -> String {
    static RE: std::sync::LazyLock<Option<regex::Regex>> =
        std::sync::LazyLock::new(|| regex::Regex::new(ANSI_REGEX_PATTERN).ok());
    match RE.as_ref() {
        Some(re) => re.replace_all(s, "").to_string(),
        None => s.to_string(),
    }
}

pub fn get_terminal_width() -> usize {
    static TERMINAL_WIDTH: std::sync::LazyLock<usize> = std::sync::LazyLock::new(|| {
        if let Ok(w) = std::env::var("STMTCHAT_COLUMNS").map(|s| s.parse().unwrap_or(0))
            && w > 0
        {
            return w;
        }

        if let Ok(w) = std::env::var("COLUMNS").map(|s| s.parse().unwrap_or(0))
            && w > 0
        {
            return w;
        }

        if is_stdout_terminal()
            && let Ok((w, _)) = crossterm::terminal::size()
        {
            return w as usize;
        }

        80
    });

    *TERMINAL_WIDTH
}

pub fn draw_panel(title: &str, lines: &[String], width: usize) {
    let inner_width = width.saturating_sub(2);
    let title_fmt = if !title.is_empty() {
        format!(" {} ", title)
    } else {
        "".to_string()
    };

    let title_width = UnicodeWidthStr::width(title_fmt.as_str());
    let total_dashes = inner_width.saturating_sub(title_width);
    let left_dashes = total_dashes / 2;
    let right_dashes = total_dashes - left_dashes;

    println!(
        "╭{}{}{}╮",
        "─".repeat(left_dashes),
        title_fmt,
        "─".repeat(right_dashes)
    );

    for line in lines {
        let stripped = strip_ansi_codes(line);
        let visible_len = UnicodeWidthStr::width(stripped.as_str());
        let total_padding = inner_width.saturating_sub(visible_len);
        let left_padding = total_padding / 2;
        let right_padding = total_padding - left_padding;

        println!(
            "│{}{}{}│",
            " ".repeat(left_padding),
            line,
            " ".repeat(right_padding)
        );
    }

    println!("╰{}╯", "─".repeat(inner_width));
}

pub fn is_stdout_terminal() -> bool {
    if std::env::var("STMTCHAT_FORCE_TTY").is_ok() {
        return true;
    }
    std::io::stdout().is_terminal()
}

pub fn is_stdin_terminal() -> bool {
    std::io::stdin().is_terminal()
}

/// "Thinking..." on stderr while an exchange runs; erased when dropped.
pub struct ThinkingStatus {
    shown: bool,
}

impl ThinkingStatus {
    pub fn start() -> Self {
        let shown = std::io::stderr().is_terminal();
        if shown {
            let mut err = std::io::stderr();
            let _ = write!(err, "{}", "Thinking...".dim());
            let _ = err.flush();
        }
        Self { shown }
    }
}

impl Drop for ThinkingStatus {
    fn drop(&mut self) {
        if self.shown {
            let mut err = std::io::stderr();
            let _ = write!(err, "\r\x1b[2K");
            let _ = err.flush();
        }
    }
}

/// Two decimals with thousands separators, e.g. `-1,234,567.80`.
pub fn format_amount(n: f64) -> String {
    let fixed = format!("{:.2}", n.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let len = int_part.len();
    let mut grouped = String::with_capacity(len + len / 3 + 4);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if n < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || width == 0 {
        return String::new();
    }
    let filled = ((value.abs() / max) * width as f64).round() as usize;
    "█".repeat(filled.clamp(usize::from(value != 0.0), width))
}

/// Terminal rendering of a chart: one row per point with a proportional bar.
pub fn render_chart(spec: &ChartSpec, width: usize) -> String {
    let max = spec
        .points
        .iter()
        .map(|p| p.value.abs())
        .fold(0.0_f64, f64::max);
    let total: f64 = spec.points.iter().map(|p| p.value.abs()).sum();
    let bar_width = width.saturating_sub(40).clamp(10, 50);

    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_width(width as u16)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![
        Cell::new(&spec.x_axis).add_attribute(Attribute::Bold),
        Cell::new(&spec.y_axis)
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right),
    ];
    if spec.kind == ChartKind::Pie {
        header.push(
            Cell::new("share")
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Right),
        );
    }
    header.push(Cell::new(""));
    table.set_header(header);

    for point in &spec.points {
        let color = if point.value < 0.0 {
            Color::Red
        } else {
            Color::Green
        };
        let mut row = vec![
            Cell::new(&point.label),
            Cell::new(format_amount(point.value)).set_alignment(CellAlignment::Right),
        ];
        if spec.kind == ChartKind::Pie {
            let share = if total > 0.0 {
                point.value.abs() / total * 100.0
            } else {
                0.0
            };
            row.push(Cell::new(format!("{:.1}%", share)).set_alignment(CellAlignment::Right));
        }
        row.push(Cell::new(bar(point.value, max, bar_width)).fg(color));
        table.add_row(row);
    }

    let kind = match spec.kind {
        ChartKind::Bar => "bar",
        ChartKind::Pie => "pie",
        ChartKind::Line => "line",
    };
    format!("{} ({} chart)\n{}", spec.title, kind, table)
}

pub fn render_message(msg: &Message) {
    let width = get_terminal_width();
    let label = match msg.role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    };
    if is_stdout_terminal() {
        let styled = match msg.role {
            Role::User => label.bold().cyan(),
            Role::Assistant => label.bold().green(),
        };
        println!("{}", styled);
    } else {
        println!("{}:", label);
    }

    match msg.chart_spec() {
        Some(spec) => println!("{}", render_chart(&spec, width)),
        None => println!("{}", msg.content.trim_end()),
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChartPoint;

    #[test]
    fn test_format_amount_groups_thousands() {
        assert_eq!(format_amount(1234567.8), "1,234,567.80");
        assert_eq!(format_amount(-950.0), "-950.00");
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(100.0), "100.00");
    }

    #[test]
    fn test_render_chart_lists_every_point() {
        let spec = ChartSpec {
            title: "Holdings".into(),
            kind: ChartKind::Pie,
            x_axis: "item".into(),
            y_axis: "value".into(),
            points: vec![
                ChartPoint {
                    label: "Equity".into(),
                    value: 75.0,
                },
                ChartPoint {
                    label: "Debt".into(),
                    value: 25.0,
                },
            ],
        };
        let out = strip_ansi_codes(&render_chart(&spec, 80));
        assert!(out.starts_with("Holdings (pie chart)"));
        assert!(out.contains("Equity"));
        assert!(out.contains("75.0%"));
        assert!(out.contains("25.0%"));
    }
}
