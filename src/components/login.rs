//! Sign-in screen.

use super::{
    button, edit, input, paint_background, theme, Component, Confirm, Context, Notice, BANNER,
};
use crate::app::SelectedApp;
use crate::models::Credentials;
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::Paragraph};
use tracing::warn;

const EMAIL: usize = 0;
const PASSWORD: usize = 1;
const SIGN_IN: usize = 2;
const REGISTER: usize = 3;
const BROWSE: usize = 4;
const EXIT: usize = 5;
const FOCUS_COUNT: usize = 6;

#[derive(Debug, Default)]
pub struct Login {
    email: String,
    password: String,
    focus: usize,
    notice: Notice,
    exit_dialog: Option<Confirm>,
}

impl Login {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows `message` the next time the screen is drawn.
    pub fn set_success_message(&mut self, message: &str) {
        self.notice.success(message);
    }

    fn sign_in(&mut self, ctx: &mut Context<'_>) -> Option<SelectedApp> {
        let credentials = Credentials {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        };
        match ctx.session.authenticate(ctx.gateway, &credentials) {
            Ok(_) => {
                self.password.clear();
                self.notice.clear();
                Some(SelectedApp::Home)
            }
            Err(e) => {
                warn!(error = %e, "sign-in failed");
                self.notice.error(e.to_string());
                None
            }
        }
    }
}

impl Component for Login {
    fn handle_input(
        &mut self,
        key: KeyEvent,
        ctx: &mut Context<'_>,
    ) -> Result<Option<SelectedApp>> {
        if let Some(dialog) = &mut self.exit_dialog {
            match dialog.handle_input(key) {
                Some(true) => return Ok(Some(SelectedApp::Quit)),
                Some(false) => self.exit_dialog = None,
                None => {}
            }
            return Ok(None);
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % FOCUS_COUNT,
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + FOCUS_COUNT - 1) % FOCUS_COUNT
            }
            KeyCode::Enter => match self.focus {
                EMAIL | PASSWORD | SIGN_IN => return Ok(self.sign_in(ctx)),
                REGISTER => return Ok(Some(SelectedApp::Register)),
                BROWSE => return Ok(Some(SelectedApp::Doctors)),
                _ => self.exit_dialog = Some(Confirm::default()),
            },
            KeyCode::Esc => self.exit_dialog = Some(Confirm::default()),
            _ => {
                let field = match self.focus {
                    EMAIL => &mut self.email,
                    PASSWORD => &mut self.password,
                    _ => return Ok(None),
                };
                if edit(field, key) {
                    self.notice.clear();
                }
            }
        }
        Ok(None)
    }

    fn tick(&mut self) {
        self.notice.expire();
    }

    fn render(&self, frame: &mut Frame) {
        paint_background(frame);

        let area = super::centered_rect(60, 100, frame.area());
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(3), // banner
                Constraint::Length(1),
                Constraint::Length(2), // subtitle
                Constraint::Length(3), // email
                Constraint::Length(3), // password
                Constraint::Length(2), // notice
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Length(1), // help
                Constraint::Min(0),
            ])
            .margin(1)
            .split(area);

        let banner: Vec<Line> = BANNER.iter().map(|l| Line::from(*l)).collect();
        frame.render_widget(
            Paragraph::new(banner)
                .style(Style::default().fg(theme::ACCENT))
                .alignment(Alignment::Center),
            layout[1],
        );

        frame.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled(
                    "Book and manage clinic appointments",
                    Style::default()
                        .fg(theme::TITLE)
                        .add_modifier(Modifier::ITALIC),
                )),
                Line::from(Span::styled(
                    "Sign in to continue",
                    Style::default().fg(theme::HELP),
                )),
            ])
            .alignment(Alignment::Center),
            layout[3],
        );

        frame.render_widget(input("Email", &self.email, self.focus == EMAIL), layout[4]);
        let masked = "•".repeat(self.password.chars().count());
        frame.render_widget(
            input("Password", &masked, self.focus == PASSWORD),
            layout[5],
        );

        self.notice.render(frame, layout[6]);

        frame.render_widget(button("Sign In", self.focus == SIGN_IN), layout[7]);
        frame.render_widget(
            button("Create an Account", self.focus == REGISTER),
            layout[8],
        );
        frame.render_widget(button("Browse Doctors", self.focus == BROWSE), layout[9]);
        frame.render_widget(button("Exit", self.focus == EXIT), layout[10]);

        frame.render_widget(
            super::help("Tab/↑↓: Move | Enter: Select | Esc: Exit | Ctrl+Q: Quit"),
            layout[12],
        );

        if let Some(dialog) = &self.exit_dialog {
            dialog.render(frame, "Confirm Exit", "Are you sure you want to quit?");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{user, MockGateway};
    use crate::models::Role;
    use crate::session::Session;
    use crate::storage::Storage;
    use crossterm::event::KeyModifiers;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(login: &mut Login, text: &str, ctx: &mut Context<'_>) {
        for c in text.chars() {
            login.handle_input(key(KeyCode::Char(c)), ctx).unwrap();
        }
    }

    #[test]
    fn signing_in_moves_to_home() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(Storage::in_dir(dir.path()).unwrap());
        let gateway = MockGateway::new().with_users(vec![user(5, "Ada", Role::Patient)]);
        let mut ctx = Context {
            gateway: &gateway,
            session: &mut session,
        };

        let mut login = Login::new();
        type_text(&mut login, "ada@clinic.test", &mut ctx);
        login.handle_input(key(KeyCode::Tab), &mut ctx).unwrap();
        type_text(&mut login, "secret1", &mut ctx);

        let next = login.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();
        assert_eq!(next, Some(SelectedApp::Home));
        assert_eq!(session.identity().map(|i| i.id), Some(5));
    }

    #[test]
    fn rejected_sign_in_stays_with_a_message() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(Storage::in_dir(dir.path()).unwrap());
        let gateway = MockGateway::new();
        let mut ctx = Context {
            gateway: &gateway,
            session: &mut session,
        };

        let mut login = Login::new();
        let next = login.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();
        assert_eq!(next, None);
        assert_eq!(login.notice.text(), Some("Email is required"));
        assert_eq!(gateway.total_calls(), 0);
    }

    #[test]
    fn exit_needs_confirmation() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(Storage::in_dir(dir.path()).unwrap());
        let gateway = MockGateway::new();
        let mut ctx = Context {
            gateway: &gateway,
            session: &mut session,
        };

        let mut login = Login::new();
        assert_eq!(login.handle_input(key(KeyCode::Esc), &mut ctx).unwrap(), None);
        assert_eq!(
            login.handle_input(key(KeyCode::Enter), &mut ctx).unwrap(),
            Some(SelectedApp::Quit)
        );
    }
}
