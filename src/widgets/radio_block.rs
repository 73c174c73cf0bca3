//! A bordered row of options (● selected, ○ unselected), used for the metric selector.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::panel;

pub struct RadioBlock<'a> {
    pub title: &'a str,
    pub options: &'a [&'a str],
    pub selected: usize,
    pub border_color: Color,
    pub active_color: Color,
}

impl<'a> RadioBlock<'a> {
    pub fn new(title: &'a str, options: &'a [&'a str], selected: usize) -> Self {
        Self {
            title,
            options,
            selected,
            border_color: Color::Cyan,
            active_color: Color::Yellow,
        }
    }

    pub fn with_colors(mut self, border_color: Color, active_color: Color) -> Self {
        self.border_color = border_color;
        self.active_color = active_color;
        self
    }
}

impl Widget for RadioBlock<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = panel(self.title, self.border_color);
        let inner = block.inner(area);
        block.render(area, buf);
        if self.options.is_empty() {
            return;
        }

        let cells = Layout::horizontal(self.options.iter().map(|_| Constraint::Fill(1))).split(inner);
        for (idx, label) in self.options.iter().enumerate() {
            let is_selected = idx == self.selected;
            let marker = if is_selected { "●" } else { "○" };
            let style = if is_selected {
                Style::default()
                    .fg(self.active_color)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.border_color)
            };
            Paragraph::new(Line::from(Span::styled(format!("{} {}", marker, label), style)))
                .render(cells[idx], buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_selected_option() {
        let area = Rect::new(0, 0, 40, 3);
        let mut buf = Buffer::empty(area);
        RadioBlock::new("Metric", &["Sales", "Profit"], 1).render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("○ Sales"));
        assert!(text.contains("● Profit"));
    }
}
