use std::borrow::Cow;
use std::sync::Arc;

use client::session::SessionManager;
use client::supabase::SupabaseAuth;
use color_eyre::Result;
use crossterm::event::KeyEvent;
use log::debug;
use ratatui::prelude::{Color, Span, Style};
use tokio::sync::mpsc::UnboundedSender;
use types::domain::Session;

use crate::dashboard::DashboardScreenData;
use crate::form::{LoginSignupForm, Navigate, Notify};
use crate::home::HomeScreenData;
use crate::login::LoginScreenData;
use crate::notification::Notification;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitKind {
    Login,
    Signup,
}

/// Messages from background tasks to the event loop.
#[derive(Debug)]
pub enum AppEvent {
    Notify(Notification),
    Navigate(String),
    /// A sign-up signed the user in; the session should be resolved again.
    SessionStarted,
    SessionResolved(Session),
    Submitted { kind: SubmitKind, succeeded: bool },
}

#[derive(Clone)]
pub struct EventSink(pub UnboundedSender<AppEvent>);

impl EventSink {
    pub fn send(&self, event: AppEvent) {
        if let Err(e) = self.0.send(event) {
            debug!("Event loop is gone, dropping {:?}", e.0);
        }
    }
}

impl Notify for EventSink {
    fn notify(&self, notification: Notification) {
        self.send(AppEvent::Notify(notification));
    }
}

impl Navigate for EventSink {
    fn navigate(&self, url: String) {
        self.send(AppEvent::Navigate(url));
    }
}

pub struct Context {
    pub form: LoginSignupForm,
    pub session: Arc<SessionManager<SupabaseAuth>>,
    pub events: EventSink,
}

pub enum ScreenChange {
    Quit,
    Switch(Screen),
    None,
}

pub enum Screen {
    Loading,
    Login(LoginScreenData),
    Home(HomeScreenData),
    Dashboard(DashboardScreenData),
}

pub trait OnKeyEvent {
    fn on_key_event(&mut self, key: KeyEvent, context: &Context) -> Result<ScreenChange>;
}

pub fn highlight<'a>(text: impl Into<Cow<'a, str>>, needed: bool) -> Span<'a> {
    if needed {
        Span::styled(text, Style::default().bg(Color::White).fg(Color::Black))
    } else {
        Span::styled(text, Style::default())
    }
}

pub fn spinner(tick: usize) -> &'static str {
    SPINNER[tick % SPINNER.len()]
}
