use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::prelude::{Line, Modifier, Span, Style, Widget};
use ratatui::widgets::{Block, Paragraph, Wrap};

use crate::data::{Context, OnKeyEvent, Screen, ScreenChange};

/// Where a successful login ends up. Nothing leads back to the form.
#[derive(Debug)]
pub struct DashboardScreenData {
    pub url: String,
}

impl From<DashboardScreenData> for ScreenChange {
    fn from(data: DashboardScreenData) -> Self {
        ScreenChange::Switch(Screen::Dashboard(data))
    }
}

impl OnKeyEvent for DashboardScreenData {
    fn on_key_event(&mut self, key: KeyEvent, _context: &Context) -> color_eyre::Result<ScreenChange> {
        let change = match (key.kind, key.modifiers, key.code) {
            (KeyEventKind::Press, KeyModifiers::NONE, KeyCode::Esc)
            | (KeyEventKind::Press, KeyModifiers::CONTROL, KeyCode::Char('c')) => ScreenChange::Quit,
            _ => ScreenChange::None,
        };
        Ok(change)
    }
}

pub struct DashboardScreenWidget<'a> {
    pub data: &'a DashboardScreenData,
}

impl Widget for DashboardScreenWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(vec![
            Line::from("Signed in. Continue on your dashboard:"),
            Line::from(Span::styled(
                self.data.url.as_str(),
                Style::default().add_modifier(Modifier::UNDERLINED),
            )),
        ])
        .wrap(Wrap { trim: true })
        .centered()
        .block(
            Block::bordered()
                .title("Dashboard")
                .title_bottom(Line::from("Press Esc to quit").centered()),
        )
        .render(area, buf);
    }
}
