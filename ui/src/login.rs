use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::debug;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Flex, Layout, Position, Rect};
use ratatui::prelude::{Color, Line, Masked, Modifier, Span, StatefulWidget, Style, Widget};
use ratatui::widgets::{Block, Paragraph};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use types::domain::{LoginRequest, Role, SignupRequest};

use crate::data::{self, AppEvent, Context, EventSink, OnKeyEvent, Screen, ScreenChange, SubmitKind};
use crate::extension::{centered_column, Splittable};
use crate::form::LoginSignupForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    SignIn,
    SignUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Role,
    FullName,
    Email,
    Password,
    ConfirmPassword,
    Submit,
}

const SIGN_IN_FIELDS: &[Field] = &[Field::Role, Field::Email, Field::Password, Field::Submit];
const SIGN_UP_FIELDS: &[Field] = &[
    Field::Role,
    Field::FullName,
    Field::Email,
    Field::Password,
    Field::ConfirmPassword,
    Field::Submit,
];

impl Field {
    fn title(&self) -> &'static str {
        match self {
            Field::Role => "Role",
            Field::FullName => "Full Name",
            Field::Email => "Email",
            Field::Password => "Password",
            Field::ConfirmPassword => "Confirm Password",
            Field::Submit => "",
        }
    }

    fn is_secret(&self) -> bool {
        matches!(self, Field::Password | Field::ConfirmPassword)
    }
}

/// Editable state of both tabs. The request records are kept in step with
/// the text inputs through their setters.
#[derive(Debug, Default)]
pub struct LoginScreenData {
    tab: Tab,
    login: LoginRequest,
    signup: SignupRequest,
    login_email: Input,
    login_password: Input,
    full_name: Input,
    signup_email: Input,
    signup_password: Input,
    confirm_password: Input,
    focus: usize,
    pub(crate) cursor_position: Option<Position>,
}

impl From<LoginScreenData> for ScreenChange {
    fn from(data: LoginScreenData) -> Self {
        ScreenChange::Switch(Screen::Login(data))
    }
}

impl LoginScreenData {
    #[cfg(test)]
    pub(crate) fn tab(&self) -> Tab {
        self.tab
    }

    #[cfg(test)]
    pub(crate) fn login_request(&self) -> &LoginRequest {
        &self.login
    }

    #[cfg(test)]
    pub(crate) fn signup_request(&self) -> &SignupRequest {
        &self.signup
    }

    fn fields(&self) -> &'static [Field] {
        match self.tab {
            Tab::SignIn => SIGN_IN_FIELDS,
            Tab::SignUp => SIGN_UP_FIELDS,
        }
    }

    pub fn focused(&self) -> Field {
        let fields = self.fields();
        fields[self.focus.min(fields.len() - 1)]
    }

    fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields().len();
    }

    fn previous_field(&mut self) {
        let len = self.fields().len();
        self.focus = (self.focus + len - 1) % len;
    }

    pub fn switch_tab(&mut self) {
        self.tab = match self.tab {
            Tab::SignIn => Tab::SignUp,
            Tab::SignUp => Tab::SignIn,
        };
        self.focus = 0;
    }

    fn role(&self) -> Role {
        match self.tab {
            Tab::SignIn => self.login.role,
            Tab::SignUp => self.signup.role,
        }
    }

    fn cycle_role(&mut self, forward: bool) {
        let role = if forward {
            self.role().next()
        } else {
            self.role().previous()
        };
        match self.tab {
            Tab::SignIn => self.login.set_role(role),
            Tab::SignUp => self.signup.set_role(role),
        }
    }

    fn input(&self, field: Field) -> Option<&Input> {
        match (self.tab, field) {
            (Tab::SignIn, Field::Email) => Some(&self.login_email),
            (Tab::SignIn, Field::Password) => Some(&self.login_password),
            (Tab::SignUp, Field::FullName) => Some(&self.full_name),
            (Tab::SignUp, Field::Email) => Some(&self.signup_email),
            (Tab::SignUp, Field::Password) => Some(&self.signup_password),
            (Tab::SignUp, Field::ConfirmPassword) => Some(&self.confirm_password),
            _ => None,
        }
    }

    fn input_mut(&mut self, field: Field) -> Option<&mut Input> {
        match (self.tab, field) {
            (Tab::SignIn, Field::Email) => Some(&mut self.login_email),
            (Tab::SignIn, Field::Password) => Some(&mut self.login_password),
            (Tab::SignUp, Field::FullName) => Some(&mut self.full_name),
            (Tab::SignUp, Field::Email) => Some(&mut self.signup_email),
            (Tab::SignUp, Field::Password) => Some(&mut self.signup_password),
            (Tab::SignUp, Field::ConfirmPassword) => Some(&mut self.confirm_password),
            _ => None,
        }
    }

    fn sync(&mut self, field: Field) {
        let Some(value) = self.input(field).map(|input| input.value().to_string()) else {
            return;
        };
        match (self.tab, field) {
            (Tab::SignIn, Field::Email) => self.login.set_email(value),
            (Tab::SignIn, Field::Password) => self.login.set_password(value),
            (Tab::SignUp, Field::FullName) => self.signup.set_full_name(value),
            (Tab::SignUp, Field::Email) => self.signup.set_email(value),
            (Tab::SignUp, Field::Password) => self.signup.set_password(value),
            (Tab::SignUp, Field::ConfirmPassword) => self.signup.set_confirm_password(value),
            _ => {}
        }
    }

    fn handle_input_event(&mut self, key: KeyEvent) {
        let field = self.focused();
        if let Some(input) = self.input_mut(field) {
            input.handle_event(&Event::Key(key));
            self.sync(field);
        }
    }

    /// Starts a submission in the background. Refused while one is running.
    fn submit(&self, form: &LoginSignupForm, events: &EventSink) -> bool {
        let Some(claim) = form.claim() else {
            debug!("Submit ignored, a request is already in flight");
            return false;
        };
        let form = form.clone();
        let events = events.clone();
        match self.tab {
            Tab::SignIn => {
                let data = self.login.clone();
                tokio::spawn(async move {
                    let succeeded = form.submit_login(claim, data).await.is_ok();
                    events.send(AppEvent::Submitted {
                        kind: SubmitKind::Login,
                        succeeded,
                    });
                });
            }
            Tab::SignUp => {
                let data = self.signup.clone();
                tokio::spawn(async move {
                    let outcome = form.submit_signup(claim, data).await;
                    if let Ok(Some(_)) = outcome {
                        events.send(AppEvent::SessionStarted);
                    }
                    events.send(AppEvent::Submitted {
                        kind: SubmitKind::Signup,
                        succeeded: outcome.is_ok(),
                    });
                });
            }
        }
        true
    }

    /// A successful sign-up discards what was typed, keeping the role.
    pub fn on_submitted(&mut self, kind: SubmitKind, succeeded: bool) {
        if kind == SubmitKind::Signup && succeeded {
            let role = self.signup.role;
            self.signup = SignupRequest::default();
            self.signup.set_role(role);
            self.full_name.reset();
            self.signup_email.reset();
            self.signup_password.reset();
            self.confirm_password.reset();
        }
    }

    pub(crate) fn handle_key(
        &mut self,
        key: KeyEvent,
        form: &LoginSignupForm,
        events: &EventSink,
    ) -> ScreenChange {
        if key.kind != KeyEventKind::Press {
            return ScreenChange::None;
        }
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Esc) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                return ScreenChange::Quit;
            }
            (KeyModifiers::CONTROL, KeyCode::Char('t')) => self.switch_tab(),
            (KeyModifiers::NONE, KeyCode::Tab) | (KeyModifiers::NONE, KeyCode::Down) => {
                self.next_field()
            }
            (_, KeyCode::BackTab) | (KeyModifiers::NONE, KeyCode::Up) => self.previous_field(),
            (KeyModifiers::NONE, KeyCode::Enter) => {
                self.submit(form, events);
            }
            (KeyModifiers::NONE, KeyCode::Left) if self.focused() == Field::Role => {
                self.cycle_role(false)
            }
            (KeyModifiers::NONE, KeyCode::Right) if self.focused() == Field::Role => {
                self.cycle_role(true)
            }
            _ => self.handle_input_event(key),
        }
        ScreenChange::None
    }

    fn update_cursor_position(&mut self, field: Field, area: Rect) {
        if self.focused() != field {
            return;
        }
        if let Some(input) = self.input(field) {
            self.cursor_position =
                Some((area.x + input.visual_cursor() as u16 + 1, area.y + 1).into());
        }
    }
}

impl OnKeyEvent for LoginScreenData {
    fn on_key_event(&mut self, key: KeyEvent, context: &Context) -> color_eyre::Result<ScreenChange> {
        Ok(self.handle_key(key, &context.form, &context.events))
    }
}

pub struct LoginScreenWidget {
    pub submitting: bool,
    pub tick: usize,
}

impl LoginScreenWidget {
    fn submit_label(&self, tab: Tab) -> String {
        match (tab, self.submitting) {
            (Tab::SignIn, false) => "Sign In".to_string(),
            (Tab::SignUp, false) => "Create Account".to_string(),
            (Tab::SignIn, true) => format!("{} Signing In...", data::spinner(self.tick)),
            (Tab::SignUp, true) => format!("{} Creating Account...", data::spinner(self.tick)),
        }
    }
}

impl StatefulWidget for LoginScreenWidget {
    type State = LoginScreenData;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        state.cursor_position = None;
        let fields = state.fields();
        let text_fields: Vec<Field> = fields
            .iter()
            .copied()
            .filter(|field| !matches!(field, Field::Role | Field::Submit))
            .collect();

        let mut constraints = vec![Constraint::Length(2), Constraint::Length(3), Constraint::Length(3)];
        constraints.extend(text_fields.iter().map(|_| Constraint::Length(3)));
        constraints.extend([Constraint::Length(3), Constraint::Length(1)]);
        let height: u16 = constraints
            .iter()
            .map(|c| match c {
                Constraint::Length(n) => *n,
                _ => 0,
            })
            .sum();

        let [all] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);
        let column = centered_column(all, 50);
        let rows = Layout::vertical(constraints).split(column);

        Paragraph::new(vec![
            Line::from(Span::styled("Optima", Style::default().add_modifier(Modifier::BOLD))),
            Line::from("Smart Internship Allocation System"),
        ])
        .centered()
        .render(rows[0], buf);

        let [sign_in, sign_up] = Layout::split_equal(rows[1], Direction::Horizontal);
        Paragraph::new(data::highlight("Sign In", state.tab == Tab::SignIn))
            .centered()
            .block(Block::bordered())
            .render(sign_in, buf);
        Paragraph::new(data::highlight("Sign Up", state.tab == Tab::SignUp))
            .centered()
            .block(Block::bordered())
            .render(sign_up, buf);

        let role_block = if state.focused() == Field::Role {
            Block::bordered()
                .title(Field::Role.title())
                .border_style(Style::default().fg(Color::Yellow))
        } else {
            Block::bordered().title(Field::Role.title())
        };
        let role_inner = role_block.inner(rows[2]);
        role_block.render(rows[2], buf);
        let role_areas: [Rect; 3] = Layout::split_equal(role_inner, Direction::Horizontal);
        for (role, role_area) in types::domain::ROLES.iter().zip(role_areas) {
            Paragraph::new(data::highlight(role.label(), state.role() == *role))
                .centered()
                .render(role_area, buf);
        }

        for (field, row) in text_fields.iter().zip(rows[3..].iter()) {
            let value = state.input(*field).map(Input::value).unwrap_or_default();
            let content = if field.is_secret() {
                Span::styled(Masked::new(value, '*'), Color::White)
            } else {
                Span::raw(value)
            };
            let mut block = Block::bordered().title(field.title());
            if state.focused() == *field {
                block = block.border_style(Style::default().fg(Color::Yellow));
            }
            Paragraph::new(content).block(block).render(*row, buf);
            state.update_cursor_position(*field, *row);
        }

        let submit_row = rows[rows.len() - 2];
        Paragraph::new(data::highlight(
            self.submit_label(state.tab),
            state.focused() == Field::Submit && !self.submitting,
        ))
        .centered()
        .block(Block::bordered())
        .render(submit_row, buf);

        Paragraph::new("Tab: next field  Left/Right: role  Ctrl+T: switch tab  Enter: submit")
            .style(Style::default().add_modifier(Modifier::ITALIC))
            .centered()
            .render(rows[rows.len() - 1], buf);
    }
}
