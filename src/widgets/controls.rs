use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Paragraph, Widget},
};

/// Key hint strip at the bottom of the screen.
pub struct Controls {
    pub keys: &'static [(&'static str, &'static str)],
    pub row_count: Option<usize>,
    pub bg: Color,
    pub fg: Color,
}

impl Controls {
    pub fn new(keys: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            keys,
            row_count: None,
            bg: Color::DarkGray,
            fg: Color::White,
        }
    }

    pub fn with_row_count(mut self, row_count: usize) -> Self {
        self.row_count = Some(row_count);
        self
    }

    pub fn with_colors(mut self, bg: Color, fg: Color) -> Self {
        self.bg = bg;
        self.fg = fg;
        self
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut constraints = self.keys.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });
        if self.row_count.is_some() {
            constraints.push(Constraint::Length(22)); // "Transactions: 123456"
        }
        constraints.push(Constraint::Fill(1));

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);
        let base_style = Style::default();

        for (i, (key, action)) in self.keys.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(base_style.add_modifier(Modifier::BOLD))
                .centered()
                .render(layout[j], buf);
            Paragraph::new(*action)
                .style(base_style.bg(self.bg).fg(self.fg))
                .render(layout[j + 1], buf);
        }

        let mut fill_start_idx = self.keys.len() * 2;
        if let Some(count) = self.row_count {
            Paragraph::new(format!("Transactions: {}", count))
                .style(base_style.bg(self.bg).fg(self.fg))
                .right_aligned()
                .render(layout[fill_start_idx], buf);
            fill_start_idx += 1;
        }

        Paragraph::new("")
            .style(base_style.bg(self.bg))
            .render(layout[fill_start_idx], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_keys_and_count() {
        const KEYS: [(&str, &str); 2] = [("q", "Quit"), ("?", "Help")];
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        (&Controls::new(&KEYS).with_row_count(42)).render(area, &mut buf);
        let line: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(line.contains("Quit"));
        assert!(line.contains("Help"));
        assert!(line.contains("Transactions: 42"));
        assert!(buf[(1, 0)].modifier.contains(Modifier::BOLD));
        assert_eq!(buf[(1, 0)].symbol(), "q");
    }
}
