use std::sync::Arc;
use std::time::Duration;

use client::client::Client;
use client::config::Config;
use client::session::{open_token_store, SessionManager, KEYRING_SERVICE};
use client::supabase::SupabaseAuth;
use color_eyre::Result;
use crossterm::event::{self, Event};
use log::{debug, info, warn};
use ratatui::layout::{Constraint, Flex, Layout};
use ratatui::widgets::Paragraph;
use ratatui::{DefaultTerminal, Frame};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use crate::dashboard::{DashboardScreenData, DashboardScreenWidget};
use crate::data::{self, AppEvent, Context, EventSink, OnKeyEvent, Screen, ScreenChange};
use crate::form::{gate, Gate, LoginSignupForm};
use crate::home::{HomeScreenData, HomeScreenWidget};
use crate::login::{LoginScreenData, LoginScreenWidget};
use crate::notification::{Toaster, ToastWidget};

pub struct App {
    /// Is the application running?
    running: bool,
    screen: Screen,
    toaster: Toaster,
    context: Context,
    events: UnboundedReceiver<AppEvent>,
    tick: usize,
}

impl App {
    /// Construct a new instance of [`App`].
    pub fn new(config: Config) -> Result<Self> {
        let (sender, events) = unbounded_channel();
        let sink = EventSink(sender);

        let auth = SupabaseAuth::new(&config)?;
        if !auth.is_configured() {
            warn!("No sign-up provider configured, sign-up will fail");
        }
        let session = Arc::new(SessionManager::new(auth, open_token_store(KEYRING_SERVICE)?));
        let form = LoginSignupForm::new(
            Arc::new(Client::new(&config)?),
            session.clone(),
            Arc::new(sink.clone()),
            Arc::new(sink.clone()),
            config.redirect_delay,
        );

        let context = Context {
            form,
            session,
            events: sink,
        };
        Ok(Self::with_context(context, events, config.toast_duration))
    }

    fn with_context(
        context: Context,
        events: UnboundedReceiver<AppEvent>,
        toast_duration: Duration,
    ) -> Self {
        Self {
            running: true,
            screen: Screen::Loading,
            toaster: Toaster::new(toast_duration),
            context,
            events,
            tick: 0,
        }
    }

    /// Run the application's main loop.
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        self.refresh_session();
        while self.running {
            terminal.draw(|frame| self.draw(frame))?;
            self.handle_crossterm_events()?;
            self.drain_events();
            self.tick = self.tick.wrapping_add(1);
        }
        Ok(())
    }

    /// Asks the session collaborator who is signed in. At startup the
    /// spinner stays up until it answers.
    fn refresh_session(&self) {
        let session = self.context.session.clone();
        let events = self.context.events.clone();
        tokio::spawn(async move {
            let resolved = session.restore().await;
            events.send(AppEvent::SessionResolved(resolved));
        });
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        match &mut self.screen {
            Screen::Loading => {
                let [center] = Layout::vertical([Constraint::Length(1)])
                    .flex(Flex::Center)
                    .areas(area);
                frame.render_widget(
                    Paragraph::new(data::spinner(self.tick)).centered(),
                    center,
                );
            }
            Screen::Login(state) => {
                frame.render_stateful_widget(
                    LoginScreenWidget {
                        submitting: self.context.form.is_submitting(),
                        tick: self.tick,
                    },
                    area,
                    state,
                );
                if let Some(position) = state.cursor_position {
                    frame.set_cursor_position(position);
                }
            }
            Screen::Home(home) => frame.render_widget(HomeScreenWidget { data: home }, area),
            Screen::Dashboard(dashboard) => {
                frame.render_widget(DashboardScreenWidget { data: dashboard }, area)
            }
        }

        self.toaster.prune();
        if !self.toaster.is_empty() {
            frame.render_widget(
                ToastWidget {
                    toaster: &self.toaster,
                },
                area.inner(ratatui::layout::Margin::new(1, 1)),
            );
        }
    }

    /// Reads the crossterm events and updates the state of [`App`].
    fn handle_crossterm_events(&mut self) -> Result<()> {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                let change = match &mut self.screen {
                    Screen::Loading => {
                        if is_quit(&key) {
                            ScreenChange::Quit
                        } else {
                            ScreenChange::None
                        }
                    }
                    Screen::Login(state) => state.on_key_event(key, &self.context)?,
                    Screen::Home(state) => state.on_key_event(key, &self.context)?,
                    Screen::Dashboard(state) => state.on_key_event(key, &self.context)?,
                };
                self.apply(change);
            }
        }
        Ok(())
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: AppEvent) {
        debug!("App event: {:?}", event);
        let change = match event {
            AppEvent::Notify(notification) => {
                self.toaster.push(notification);
                ScreenChange::None
            }
            AppEvent::Navigate(url) => DashboardScreenData { url }.into(),
            AppEvent::SessionStarted => {
                self.refresh_session();
                ScreenChange::None
            }
            AppEvent::SessionResolved(session) => match gate(&session) {
                Gate::Spinner => ScreenChange::None,
                Gate::RedirectHome(user) => HomeScreenData { user }.into(),
                // Keep what was typed when a refresh finds nobody signed in.
                Gate::Form if matches!(self.screen, Screen::Login(_)) => ScreenChange::None,
                Gate::Form => LoginScreenData::default().into(),
            },
            AppEvent::Submitted { kind, succeeded } => {
                if let Screen::Login(state) = &mut self.screen {
                    state.on_submitted(kind, succeeded);
                }
                ScreenChange::None
            }
        };
        self.apply(change);
    }

    fn apply(&mut self, change: ScreenChange) {
        match change {
            ScreenChange::Quit => self.quit(),
            ScreenChange::Switch(screen) => self.screen = screen,
            ScreenChange::None => {}
        }
    }

    fn quit(&mut self) {
        info!("Quitting");
        self.running = false;
    }
}

fn is_quit(key: &crossterm::event::KeyEvent) -> bool {
    use crossterm::event::{KeyCode, KeyModifiers};
    matches!(
        (key.modifiers, key.code),
        (KeyModifiers::NONE, KeyCode::Esc) | (KeyModifiers::CONTROL, KeyCode::Char('c'))
    )
}
