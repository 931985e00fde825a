//! User directory: patients for doctors, every account for admins.

use super::{
    button, clamp, header, help, paint_background, panel, step, theme, Component, Confirm,
    Context, Notice,
};
use crate::app::SelectedApp;
use crate::error::ClientError;
use crate::models::{Role, User};
use crate::tui::Frame;
use crate::views::users::UserDirectory;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use tracing::warn;

const TABLE: usize = 0;
const BACK: usize = 1;

pub struct Users {
    directory: Option<UserDirectory>,
    denied: Option<String>,
    state: TableState,
    focus: usize,
    notice: Notice,
    delete_dialog: Option<(i64, String, Confirm)>,
}

impl Users {
    pub fn open(ctx: &Context<'_>) -> Self {
        let mut screen = Self {
            directory: None,
            denied: None,
            state: TableState::default(),
            focus: TABLE,
            notice: Notice::default(),
            delete_dialog: None,
        };

        match UserDirectory::load(ctx.gateway, ctx.session.identity()) {
            Ok(directory) => screen.directory = Some(directory),
            Err(e @ ClientError::Forbidden(_)) => screen.denied = Some(e.to_string()),
            Err(e) => {
                warn!(error = %e, "user list unavailable");
                screen.notice.error(format!("Failed to load users: {e}"));
            }
        }
        screen.sync_selection();
        screen
    }

    fn rows(&self) -> &[User] {
        match &self.directory {
            Some(directory) => directory.users(),
            None => &[],
        }
    }

    fn sync_selection(&mut self) {
        let len = self.rows().len();
        clamp(&mut self.state, len);
    }

    fn selected(&self) -> Option<&User> {
        self.state.selected().and_then(|i| self.rows().get(i))
    }

    fn can_manage(&self) -> bool {
        self.directory.as_ref().is_some_and(|d| d.can_manage())
    }

    fn cycle_role(&mut self, ctx: &Context<'_>) {
        let Some((id, role)) = self.selected().map(|u| (u.id, u.role)) else {
            return;
        };
        let Some(directory) = &mut self.directory else {
            return;
        };
        let position = Role::ALL.iter().position(|r| *r == role).unwrap_or(0);
        let next = Role::ALL[(position + 1) % Role::ALL.len()];

        match directory.change_role(ctx.gateway, id, next) {
            Ok(()) => self.notice.success(format!("Role changed to {}", next.label())),
            Err(e) => self.notice.error(e.to_string()),
        }
        self.sync_selection();
    }

    fn delete(&mut self, ctx: &Context<'_>, id: i64) {
        let Some(directory) = &mut self.directory else {
            return;
        };
        match directory.delete(ctx.gateway, id) {
            Ok(()) => self.notice.success("User deleted"),
            Err(e) => {
                warn!(user_id = id, error = %e, "delete failed");
                self.notice.error(e.to_string());
            }
        }
        self.sync_selection();
    }
}

impl Component for Users {
    fn handle_input(
        &mut self,
        key: KeyEvent,
        ctx: &mut Context<'_>,
    ) -> Result<Option<SelectedApp>> {
        if let Some((id, _, dialog)) = &mut self.delete_dialog {
            let id = *id;
            match dialog.handle_input(key) {
                Some(true) => {
                    self.delete_dialog = None;
                    self.delete(ctx, id);
                }
                Some(false) => self.delete_dialog = None,
                None => {}
            }
            return Ok(None);
        }

        let len = self.rows().len();
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => self.focus = 1 - self.focus,
            KeyCode::Down if self.focus == TABLE => step(&mut self.state, len, true),
            KeyCode::Up if self.focus == TABLE => step(&mut self.state, len, false),
            KeyCode::Char('d') | KeyCode::Char('D') if self.can_manage() => {
                if let Some((id, name)) = self.selected().map(|u| (u.id, u.name.clone())) {
                    self.delete_dialog = Some((id, name, Confirm::default()));
                }
            }
            KeyCode::Char('p') | KeyCode::Char('P') if self.can_manage() => self.cycle_role(ctx),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if let Some(directory) = &mut self.directory {
                    if let Err(e) = directory.refresh(ctx.gateway) {
                        self.notice.error(format!("Failed to refresh: {e}"));
                    }
                }
                self.sync_selection();
            }
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('B') => {
                return Ok(Some(SelectedApp::Home))
            }
            KeyCode::Enter if self.focus == BACK || self.denied.is_some() => {
                return Ok(Some(SelectedApp::Home))
            }
            _ => {}
        }
        Ok(None)
    }

    fn tick(&mut self) {
        self.notice.expire();
    }

    fn render(&self, frame: &mut Frame) {
        paint_background(frame);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // header
                Constraint::Min(8),    // table
                Constraint::Length(1), // notice
                Constraint::Length(1), // help
                Constraint::Length(2), // back
            ])
            .margin(1)
            .split(frame.area());

        let patients_only = self
            .directory
            .as_ref()
            .is_some_and(|d| !d.can_manage());
        header(
            frame,
            layout[0],
            if patients_only { "PATIENTS" } else { "USERS" },
        );

        if let Some(reason) = &self.denied {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::from(Span::styled(
                        "Access Denied",
                        Style::default()
                            .fg(theme::ERROR)
                            .add_modifier(Modifier::BOLD),
                    )),
                    Line::from(""),
                    Line::from(Span::styled(
                        reason.as_str(),
                        Style::default().fg(theme::TEXT),
                    )),
                ])
                .alignment(Alignment::Center)
                .block(panel(" Users ").padding(Padding::top(2))),
                layout[1],
            );
        } else if self.rows().is_empty() {
            frame.render_widget(
                Paragraph::new("No users found.")
                    .style(Style::default().fg(theme::HELP))
                    .alignment(Alignment::Center)
                    .block(panel(" Users ").padding(Padding::top(2))),
                layout[1],
            );
        } else {
            let header = Row::new(["ID", "Name", "Email", "Role"])
                .style(Style::default().fg(theme::TITLE).bg(theme::INPUT))
                .bottom_margin(1);
            let rows = self.rows().iter().map(|u| {
                Row::new(vec![
                    Cell::from(u.id.to_string()),
                    Cell::from(u.name.clone()),
                    Cell::from(u.email.clone()),
                    Cell::from(u.role.label()),
                ])
                .style(Style::default().fg(theme::TEXT))
            });
            let highlight = if self.focus == TABLE {
                theme::HIGHLIGHT
            } else {
                theme::INPUT
            };
            let table = Table::new(
                rows,
                [
                    Constraint::Length(6),
                    Constraint::Percentage(30),
                    Constraint::Percentage(40),
                    Constraint::Percentage(20),
                ],
            )
            .header(header)
            .block(panel(" Users "))
            .row_highlight_style(
                Style::default()
                    .bg(highlight)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(if self.focus == TABLE { "► " } else { "  " });
            frame.render_stateful_widget(table, layout[1], &mut self.state.clone());
        }

        self.notice.render(frame, layout[2]);
        let hint = if self.can_manage() {
            "↑↓: Navigate | P: Change Role | D: Delete | R: Refresh | Esc: Back"
        } else {
            "↑↓: Navigate | R: Refresh | Esc: Back"
        };
        frame.render_widget(help(hint), layout[3]);
        frame.render_widget(button("Back", self.focus == BACK), layout[4]);

        if let Some((_, name, dialog)) = &self.delete_dialog {
            dialog.render(frame, "Delete User", &format!("Delete {name}?"));
        }
    }
}
