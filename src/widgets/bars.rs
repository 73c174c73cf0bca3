use ratatui::{
    buffer::Buffer,
    layout::{Direction, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Widget},
};

use super::panel;
use crate::chart_data::{format_value, BarSeries};

/// Resolution of the scaled bar lengths; ratatui bars take unsigned integers.
const SCALE: f64 = 1000.0;

/// Terminal bar chart of a [`BarSeries`]. Negative values are drawn by magnitude in
/// the negative color; NaN values show as empty bars labelled "n/a".
pub struct BarsWidget<'a> {
    series: &'a BarSeries,
    direction: Direction,
    border: Color,
    positive: Color,
    negative: Color,
}

impl<'a> BarsWidget<'a> {
    pub fn new(series: &'a BarSeries) -> Self {
        Self {
            series,
            direction: Direction::Vertical,
            border: Color::Cyan,
            positive: Color::Blue,
            negative: Color::Red,
        }
    }

    /// Bars grow left to right with labels on the left (long category lists).
    pub fn horizontal(mut self) -> Self {
        self.direction = Direction::Horizontal;
        self
    }

    pub fn with_colors(mut self, border: Color, positive: Color, negative: Color) -> Self {
        self.border = border;
        self.positive = positive;
        self.negative = negative;
        self
    }

    fn bars(&self) -> Vec<Bar<'a>> {
        let max_abs = self
            .series
            .finite()
            .map(|(_, _, v)| v.abs())
            .fold(0.0_f64, f64::max);
        self.series
            .bars
            .iter()
            .map(|(label, value)| {
                let scaled = if value.is_finite() && max_abs > 0.0 {
                    (value.abs() / max_abs * SCALE).round() as u64
                } else {
                    0
                };
                let color = if *value < 0.0 {
                    self.negative
                } else {
                    self.positive
                };
                Bar::default()
                    .label(Line::from(label.clone()))
                    .value(scaled)
                    .text_value(format_value(*value))
                    .style(Style::default().fg(color))
                    .value_style(Style::default().fg(Color::Black).bg(color))
            })
            .collect()
    }

    fn bar_width(&self, area: Rect) -> u16 {
        let n = self.series.bars.len().max(1) as u16;
        match self.direction {
            Direction::Vertical => (area.width.saturating_sub(2) / n).saturating_sub(1).clamp(1, 12),
            Direction::Horizontal => 1,
        }
    }
}

impl Widget for BarsWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = format!(" {} ", self.series.title);
        let bars = self.bars();
        BarChart::default()
            .block(panel(&title, self.border))
            .direction(self.direction)
            .bar_width(self.bar_width(area))
            .bar_gap(if self.direction == Direction::Horizontal { 0 } else { 1 })
            .max(SCALE as u64)
            .data(BarGroup::default().bars(&bars))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_against_largest_magnitude() {
        let series = BarSeries::new(
            "Profit by region",
            "Profit",
            vec![
                ("East".to_string(), -50.0),
                ("West".to_string(), 100.0),
                ("North".to_string(), f64::NAN),
            ],
        );
        let widget = BarsWidget::new(&series);
        let bars = widget.bars();
        assert_eq!(bars.len(), 3);

        let area = Rect::new(0, 0, 40, 12);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Profit by region"));
    }
}
