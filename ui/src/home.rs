use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::warn;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::prelude::{Line, Widget};
use ratatui::widgets::{Block, Paragraph};

use types::domain::User;

use crate::data::{Context, OnKeyEvent, Screen, ScreenChange};
use crate::form::Notify;
use crate::login::LoginScreenData;
use crate::notification::Notification;

/// Shown instead of the form when a session is already active.
#[derive(Debug)]
pub struct HomeScreenData {
    pub user: User,
}

impl From<HomeScreenData> for ScreenChange {
    fn from(data: HomeScreenData) -> Self {
        ScreenChange::Switch(Screen::Home(data))
    }
}

impl HomeScreenData {
    fn display_name(&self) -> &str {
        self.user.email.as_deref().unwrap_or(&self.user.id)
    }
}

impl OnKeyEvent for HomeScreenData {
    fn on_key_event(&mut self, key: KeyEvent, context: &Context) -> color_eyre::Result<ScreenChange> {
        let change = match (key.kind, key.modifiers, key.code) {
            (KeyEventKind::Press, KeyModifiers::NONE, KeyCode::Esc)
            | (KeyEventKind::Press, KeyModifiers::CONTROL, KeyCode::Char('c')) => ScreenChange::Quit,
            (KeyEventKind::Press, KeyModifiers::NONE, KeyCode::Char('s')) => {
                match context.session.sign_out(&self.user) {
                    Ok(()) => context
                        .events
                        .notify(Notification::success("Signed out", "See you soon")),
                    Err(e) => {
                        warn!("Sign out failed: {}", e);
                        context.events.notify(Notification::from(&e));
                    }
                }
                LoginScreenData::default().into()
            }
            _ => ScreenChange::None,
        };
        Ok(change)
    }
}

pub struct HomeScreenWidget<'a> {
    pub data: &'a HomeScreenData,
}

impl Widget for HomeScreenWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(vec![
            Line::from("You are already signed in."),
            Line::from(format!("Signed in as {}", self.data.display_name())),
        ])
        .centered()
        .block(
            Block::bordered()
                .title("Home")
                .title_bottom(Line::from("Press s to sign out, Esc to quit").centered()),
        )
        .render(area, buf);
    }
}
