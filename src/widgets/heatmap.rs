use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Cell, Row, Table, Widget},
};

use super::panel;
use crate::chart_data::format_value;
use crate::views::Heatmap;

const LABEL_WIDTH: u16 = 8;
const CELL_WIDTH: u16 = 8;

/// Discount-by-sub-category crosstab. Cells in the upper half of the magnitude range
/// are drawn bold; empty combinations show a dot.
pub struct HeatmapWidget<'a> {
    heatmap: &'a Heatmap,
    border: Color,
    header: Color,
    positive: Color,
    negative: Color,
}

impl<'a> HeatmapWidget<'a> {
    pub fn new(heatmap: &'a Heatmap) -> Self {
        Self {
            heatmap,
            border: Color::Cyan,
            header: Color::White,
            positive: Color::Green,
            negative: Color::Red,
        }
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

    fn cell_style(&self, value: f64, max_abs: f64) -> Style {
        let color = if value < 0.0 {
            self.negative
        } else {
            self.positive
        };
        let style = Style::default().fg(color);
        if max_abs > 0.0 && value.abs() >= max_abs / 2.0 {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }
}

/// Sub-category names cut to the cell width.
fn short(label: &str) -> String {
    label.chars().take(CELL_WIDTH as usize - 1).collect()
}

impl Widget for HeatmapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let max_abs = self
            .heatmap
            .range()
            .map(|(lo, hi)| lo.abs().max(hi.abs()))
            .unwrap_or(0.0);

        let header = Row::new(
            std::iter::once(Cell::from("Disc."))
                .chain(self.heatmap.sub_categories.iter().map(|s| Cell::from(short(s)))),
        )
        .style(Style::default().fg(self.header).add_modifier(Modifier::BOLD));

        let rows = self
            .heatmap
            .discounts
            .iter()
            .zip(&self.heatmap.cells)
            .map(|(discount, cells)| {
                let label = Cell::from(format!("{:.0}%", discount * 100.0));
                Row::new(std::iter::once(label).chain(cells.iter().map(|cell| match cell {
                    Some(v) => Cell::from(format_value(*v)).style(self.cell_style(*v, max_abs)),
                    None => Cell::from("·"),
                })))
            });

        let widths = std::iter::once(Constraint::Length(LABEL_WIDTH)).chain(
            self.heatmap
                .sub_categories
                .iter()
                .map(|_| Constraint::Length(CELL_WIDTH)),
        );
        let title = format!(" {} by discount and sub-category ", self.heatmap.value.label());

        Table::new(rows, widths)
            .header(header)
            .block(panel(&title, self.border))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::HeatValue;

    #[test]
    fn renders_labels_and_values() {
        let heatmap = Heatmap {
            value: HeatValue::Profit,
            discounts: vec![0.0, 0.2],
            sub_categories: vec!["Binders".to_string(), "Phones".to_string()],
            cells: vec![vec![Some(12.0), None], vec![Some(-3.5), Some(40.0)]],
        };
        let area = Rect::new(0, 0, 60, 6);
        let mut buf = Buffer::empty(area);
        HeatmapWidget::new(&heatmap).render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Binders"));
        assert!(text.contains("20%"));
        assert!(text.contains("-3.50"));
        assert!(text.contains("40"));
    }
}
