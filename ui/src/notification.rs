use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget, Wrap};

use types::error::Error;

const MAX_VISIBLE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Default,
    Destructive,
}

/// A one-shot message about the outcome of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: Variant::Default,
        }
    }

    pub fn failure(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: Variant::Destructive,
        }
    }
}

impl From<&Error> for Notification {
    fn from(error: &Error) -> Self {
        Notification::failure(error.title(), error.to_string())
    }
}

struct Toast {
    notification: Notification,
    expiry_time: DateTime<Utc>,
}

impl Toast {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry_time
    }
}

/// Notifications currently on screen, newest last.
pub struct Toaster {
    toasts: Vec<Toast>,
    lifetime: TimeDelta,
}

impl Toaster {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            lifetime: TimeDelta::from_std(lifetime).unwrap_or(TimeDelta::seconds(4)),
        }
    }

    pub fn push(&mut self, notification: Notification) {
        self.push_at(notification, Utc::now());
    }

    fn push_at(&mut self, notification: Notification, now: DateTime<Utc>) {
        self.toasts.push(Toast {
            notification,
            expiry_time: now + self.lifetime,
        });
    }

    pub fn prune(&mut self) {
        self.prune_at(Utc::now());
    }

    fn prune_at(&mut self, now: DateTime<Utc>) {
        self.toasts.retain(|toast| !toast.is_expired(now));
    }

    pub fn visible(&self) -> impl Iterator<Item = &Notification> {
        let skip = self.toasts.len().saturating_sub(MAX_VISIBLE);
        self.toasts.iter().skip(skip).map(|toast| &toast.notification)
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

pub struct ToastWidget<'a> {
    pub toaster: &'a Toaster,
}

impl Widget for ToastWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let notifications: Vec<&Notification> = self.toaster.visible().collect();
        if notifications.is_empty() {
            return;
        }
        let [_, column] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Max(42)]).areas(area);
        let rows = Layout::vertical(
            notifications
                .iter()
                .map(|_| Constraint::Length(4))
                .chain(std::iter::once(Constraint::Fill(1))),
        )
        .split(column);

        for (notification, row) in notifications.into_iter().zip(rows.iter()) {
            let color = match notification.variant {
                Variant::Default => Color::Green,
                Variant::Destructive => Color::Red,
            };
            Clear.render(*row, buf);
            Paragraph::new(Line::from(Span::raw(notification.description.as_str())))
                .wrap(Wrap { trim: true })
                .block(
                    Block::bordered()
                        .border_style(Style::default().fg(color))
                        .title(Span::styled(
                            notification.title.as_str(),
                            Style::default().fg(color).add_modifier(Modifier::BOLD),
                        )),
                )
                .render(*row, buf);
        }
    }
}
