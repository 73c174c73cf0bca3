//! Table panels for the summary frames.

use polars::prelude::DataFrame;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    text::Text,
    widgets::{Cell, Row, Table, Widget},
};

use super::panel;
use crate::chart_data::format_value;
use crate::error::Result;
use crate::schema::{
    CATEGORY, PROFIT, PROFIT_MARGIN, QUANTITY, REGION, SALE, STATE, STATE_CODE, SUB_CATEGORY,
};
use crate::views::{float_values, string_values, DiscountBand, QUANTITY_SHARE};

/// Text or number column of a rendered table.
enum Column {
    Text(Vec<String>),
    Number(Vec<f64>),
    /// Margin in percent, colored by sign.
    Margin(Vec<f64>),
}

impl Column {
    fn text(df: &DataFrame, name: &str) -> Result<Self> {
        Ok(Self::Text(
            string_values(df, name)?
                .into_iter()
                .map(Option::unwrap_or_default)
                .collect(),
        ))
    }

    fn number(df: &DataFrame, name: &str) -> Result<Self> {
        Ok(Self::Number(nan_filled(float_values(df, name)?)))
    }

    fn margin(df: &DataFrame, name: &str) -> Result<Self> {
        Ok(Self::Margin(nan_filled(float_values(df, name)?)))
    }
}

fn nan_filled(values: Vec<Option<f64>>) -> Vec<f64> {
    values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect()
}

/// Column-oriented table ready to render.
pub struct SummaryTable {
    title: String,
    headers: Vec<&'static str>,
    widths: Vec<u16>,
    columns: Vec<Column>,
    rows: usize,
    border: Color,
    header: Color,
    positive: Color,
    negative: Color,
}

impl SummaryTable {
    fn new(title: &str, spec: Vec<(&'static str, u16, Column)>, rows: usize) -> Self {
        let mut headers = Vec::with_capacity(spec.len());
        let mut widths = Vec::with_capacity(spec.len());
        let mut columns = Vec::with_capacity(spec.len());
        for (header, width, column) in spec {
            headers.push(header);
            widths.push(width);
            columns.push(column);
        }
        Self {
            title: format!(" {} ", title),
            headers,
            widths,
            columns,
            rows,
            border: Color::Cyan,
            header: Color::White,
            positive: Color::Green,
            negative: Color::Red,
        }
    }

    /// States ordered by total sale, with their margin.
    pub fn geography(df: &DataFrame) -> Result<Self> {
        Ok(Self::new(
            "Margin by state",
            vec![
                ("State", 18, Column::text(df, STATE)?),
                ("Code", 5, Column::text(df, STATE_CODE)?),
                ("Region", 10, Column::text(df, REGION)?),
                ("Sales", 10, Column::number(df, SALE)?),
                ("Profit", 10, Column::number(df, PROFIT)?),
                ("Margin %", 9, Column::margin(df, PROFIT_MARGIN)?),
            ],
            df.height(),
        ))
    }

    pub fn categories(df: &DataFrame) -> Result<Self> {
        Ok(Self::new(
            "Category breakdown",
            vec![
                ("Category", 16, Column::text(df, CATEGORY)?),
                ("Sub-category", 14, Column::text(df, SUB_CATEGORY)?),
                ("Qty", 7, Column::number(df, QUANTITY)?),
                ("Qty %", 7, Column::number(df, QUANTITY_SHARE)?),
                ("Sales", 10, Column::number(df, SALE)?),
                ("Profit", 10, Column::number(df, PROFIT)?),
                ("Margin %", 9, Column::margin(df, PROFIT_MARGIN)?),
            ],
            df.height(),
        ))
    }

    /// Five-number margin summary per discount level.
    pub fn margin_bands(bands: &[DiscountBand]) -> Self {
        let pick = |f: fn(&DiscountBand) -> f64| bands.iter().map(f).collect::<Vec<_>>();
        Self::new(
            "Margin % by discount",
            vec![
                (
                    "Discount",
                    9,
                    Column::Text(
                        bands
                            .iter()
                            .map(|b| format!("{:.0}%", b.discount * 100.0))
                            .collect(),
                    ),
                ),
                ("Rows", 6, Column::Number(pick(|b| b.count as f64))),
                ("Min", 8, Column::Margin(pick(|b| b.min))),
                ("Q1", 8, Column::Margin(pick(|b| b.q1))),
                ("Median", 8, Column::Margin(pick(|b| b.median))),
                ("Q3", 8, Column::Margin(pick(|b| b.q3))),
                ("Max", 8, Column::Margin(pick(|b| b.max))),
            ],
            bands.len(),
        )
    }

    pub fn with_colors(
        mut self,
        border: Color,
        header: Color,
        positive: Color,
        negative: Color,
    ) -> Self {
        self.border = border;
        self.header = header;
        self.positive = positive;
        self.negative = negative;
        self
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    fn cell(&self, column: &Column, row: usize) -> Cell<'static> {
        match column {
            Column::Text(values) => Cell::from(values[row].clone()),
            Column::Number(values) => {
                Cell::from(Text::from(format_value(values[row])).alignment(Alignment::Right))
            }
            Column::Margin(values) => {
                let v = values[row];
                let color = if v < 0.0 { self.negative } else { self.positive };
                Cell::from(Text::from(format_value(v)).alignment(Alignment::Right))
                    .style(Style::default().fg(color))
            }
        }
    }
}

impl Widget for &SummaryTable {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let header = Row::new(self.headers.iter().copied())
            .style(Style::default().fg(self.header).add_modifier(Modifier::BOLD));
        let rows = (0..self.rows)
            .map(|row| Row::new(self.columns.iter().map(|column| self.cell(column, row))));
        Table::new(rows, self.widths.iter().map(|w| Constraint::Length(*w)))
            .header(header)
            .block(panel(&self.title, self.border))
            .render(area, buf);
    }
}
