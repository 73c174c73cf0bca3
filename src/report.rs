//! Plain-text rendering of summary tables for `--print`.

use polars::prelude::*;

use crate::cli::PrintView;
use crate::dashboard::Dashboard;
use crate::error::{Result, SalesError};
use crate::views::{float_values, string_values, Dimension};

/// Text for one `--print` view.
pub fn print_view(dashboard: &Dashboard, view: PrintView) -> Result<String> {
    let dimension = match view {
        PrintView::DeliveryType => Dimension::DeliveryType,
        PrintView::Segment => Dimension::Segment,
        PrintView::Region => Dimension::Region,
        PrintView::Category => Dimension::Category,
        PrintView::Geography => {
            if dashboard.is_empty() {
                return Err(SalesError::EmptyInput);
            }
            return format_table(dashboard.geography());
        }
        PrintView::Insights => {
            let insights = dashboard.insights().ok_or(SalesError::EmptyInput)?;
            return Ok(insights.lines().join("\n") + "\n");
        }
    };
    format_table(&dashboard.dimension(dimension)?)
}

/// Aligned text table: text columns left-aligned, numbers right-aligned with 2 decimals.
pub fn format_table(df: &DataFrame) -> Result<String> {
    let mut columns: Vec<(String, Vec<String>, bool)> = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let name = column.name().to_string();
        let numeric = column.dtype().is_float() || column.dtype().is_integer();
        let cells = if numeric {
            let integer = column.dtype().is_integer();
            float_values(df, &name)?
                .into_iter()
                .map(|v| match v {
                    Some(v) if integer => format!("{:.0}", v),
                    Some(v) if v.is_nan() => "NaN".to_string(),
                    Some(v) => format!("{:.2}", v),
                    None => "null".to_string(),
                })
                .collect()
        } else {
            string_values(df, &name)?
                .into_iter()
                .map(|v| v.unwrap_or_else(|| "null".to_string()))
                .collect()
        };
        columns.push((name, cells, numeric));
    }

    let widths: Vec<usize> = columns
        .iter()
        .map(|(name, cells, _)| {
            cells
                .iter()
                .map(|c| c.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let pad = |text: &str, width: usize, right: bool| {
        if right {
            format!("{:>width$}", text, width = width)
        } else {
            format!("{:<width$}", text, width = width)
        }
    };

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|((name, _, numeric), w)| pad(name, *w, *numeric))
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');

    for row in 0..df.height() {
        let line: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|((_, cells, numeric), w)| pad(&cells[row], *w, *numeric))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    Ok(out)
}
