//! Account creation screen.

use super::{
    button, edit, help, input, paint_background, theme, Component, Context, Notice, BANNER,
};
use crate::app::SelectedApp;
use crate::auth::MIN_PASSWORD_LEN;
use crate::models::{Registration, Role};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Paragraph},
};
use tracing::warn;

/// Roles offered on the sign-up form.
const ROLES: [Role; 3] = [Role::Patient, Role::Doctor, Role::Admin];

const NAME: usize = 0;
const EMAIL: usize = 1;
const PASSWORD: usize = 2;
const ROLE: usize = 3;
const SUBMIT: usize = 4;
const BACK: usize = 5;
const FOCUS_COUNT: usize = 6;

#[derive(Debug, Default)]
pub struct Register {
    name: String,
    email: String,
    password: String,
    role_index: usize,
    focus: usize,
    notice: Notice,
}

impl Register {
    pub fn new() -> Self {
        Self::default()
    }

    fn role(&self) -> Role {
        ROLES[self.role_index % ROLES.len()]
    }

    fn submit(&mut self, ctx: &mut Context<'_>) -> Option<SelectedApp> {
        let registration = Registration {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            role: self.role(),
        };
        match ctx.session.register(ctx.gateway, &registration) {
            Ok(_) => {
                *self = Self::new();
                Some(SelectedApp::Home)
            }
            Err(e) => {
                warn!(error = %e, "registration failed");
                self.notice.error(e.to_string());
                None
            }
        }
    }
}

impl Component for Register {
    fn handle_input(
        &mut self,
        key: KeyEvent,
        ctx: &mut Context<'_>,
    ) -> Result<Option<SelectedApp>> {
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % FOCUS_COUNT,
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + FOCUS_COUNT - 1) % FOCUS_COUNT
            }
            KeyCode::Left if self.focus == ROLE => {
                self.role_index = (self.role_index + ROLES.len() - 1) % ROLES.len()
            }
            KeyCode::Right if self.focus == ROLE => {
                self.role_index = (self.role_index + 1) % ROLES.len()
            }
            KeyCode::Enter => match self.focus {
                BACK => return Ok(Some(SelectedApp::Login)),
                ROLE => self.role_index = (self.role_index + 1) % ROLES.len(),
                _ => return Ok(self.submit(ctx)),
            },
            KeyCode::Esc => return Ok(Some(SelectedApp::Login)),
            _ => {
                let field = match self.focus {
                    NAME => &mut self.name,
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
                Constraint::Length(1),
                Constraint::Length(3), // banner
                Constraint::Length(2), // subtitle
                Constraint::Length(3), // name
                Constraint::Length(3), // email
                Constraint::Length(3), // password
                Constraint::Length(3), // role
                Constraint::Length(2), // notice
                Constraint::Length(1), // submit
                Constraint::Length(1), // back
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
            Paragraph::new(Span::styled(
                "Create your account",
                Style::default()
                    .fg(theme::TITLE)
                    .add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
            layout[2],
        );

        frame.render_widget(input("Full Name", &self.name, self.focus == NAME), layout[3]);
        frame.render_widget(input("Email", &self.email, self.focus == EMAIL), layout[4]);
        let masked = "•".repeat(self.password.chars().count());
        let password_label = format!("Password (min {MIN_PASSWORD_LEN} chars)");
        frame.render_widget(
            input(&password_label, &masked, self.focus == PASSWORD),
            layout[5],
        );

        let role_focused = self.focus == ROLE;
        let roles: Vec<Span> = ROLES
            .iter()
            .enumerate()
            .flat_map(|(i, role)| {
                let style = if i == self.role_index {
                    Style::default()
                        .fg(if role_focused { theme::FOCUS } else { theme::ACCENT })
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(theme::HELP)
                };
                let marker = if i == self.role_index { "●" } else { "○" };
                [
                    Span::styled(format!("{marker} {}", role.label()), style),
                    Span::raw("   "),
                ]
            })
            .collect();
        frame.render_widget(
            Paragraph::new(Line::from(roles))
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .title(" Role (←→ to change) ")
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(if role_focused {
                            theme::FOCUS
                        } else {
                            theme::BORDER
                        }))
                        .style(Style::default().bg(theme::INPUT)),
                ),
            layout[6],
        );

        self.notice.render(frame, layout[7]);

        frame.render_widget(button("Register", self.focus == SUBMIT), layout[8]);
        frame.render_widget(button("Back to Login", self.focus == BACK), layout[9]);
        frame.render_widget(
            help("Tab/↑↓: Move | ←→: Role | Enter: Submit | Esc: Back"),
            layout[11],
        );
    }
}
