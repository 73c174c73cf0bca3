use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Widget, Wrap};

pub mod bars;
pub mod controls;
pub mod debug;
pub mod heatmap;
pub mod radio_block;
pub mod tables;

/// Rect of `percent_x` by `percent_y` of `area`, centered, never smaller than
/// `min_w` by `min_h` (clamped to `area`).
pub fn centered_rect(area: Rect, percent_x: u16, percent_y: u16, min_w: u16, min_h: u16) -> Rect {
    let w = (area.width * percent_x / 100).max(min_w).min(area.width);
    let h = (area.height * percent_y / 100).max(min_h).min(area.height);
    let [row] = Layout::vertical([Constraint::Length(h)])
        .flex(Flex::Center)
        .areas(area);
    let [rect] = Layout::horizontal([Constraint::Length(w)])
        .flex(Flex::Center)
        .areas(row);
    rect
}

/// Rounded, titled block used by every panel.
pub fn panel(title: &str, border: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title)
        .border_style(Style::default().fg(border))
}

/// Panel shown in place of a chart whose data could not be computed.
pub fn render_placeholder(
    area: Rect,
    buf: &mut Buffer,
    title: &str,
    message: &str,
    border: Color,
    text: Color,
) {
    let block = panel(title, border);
    let inner = block.inner(area);
    block.render(area, buf);
    Paragraph::new(message)
        .style(Style::default().fg(text))
        .wrap(Wrap { trim: true })
        .centered()
        .render(inner, buf);
}
