//! The dashboard a signed-in user lands on.

use super::appointments::status_style;
use super::{header, help, paint_background, panel, theme, Component, Confirm, Context, Notice};
use crate::app::SelectedApp;
use crate::models::Identity;
use crate::schedule;
use crate::tui::Frame;
use crate::views::dashboard::Dashboard;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use tracing::warn;

pub struct Home {
    viewer: Option<Identity>,
    dashboard: Option<Dashboard>,
    selected: usize,
    notice: Notice,
    logout_dialog: Option<Confirm>,
}

impl Home {
    pub fn new() -> Self {
        Self {
            viewer: None,
            dashboard: None,
            selected: 0,
            notice: Notice::default(),
            logout_dialog: None,
        }
    }

    /// Fetches the dashboard for whoever is signed in.
    pub fn load(&mut self, ctx: &Context<'_>) {
        self.viewer = ctx.session.identity().cloned();
        self.dashboard = None;
        let Some(viewer) = &self.viewer else {
            return;
        };

        match Dashboard::load(ctx.gateway, viewer) {
            Ok(dashboard) => {
                self.dashboard = Some(dashboard);
                self.notice.clear();
            }
            Err(e) => {
                warn!(error = %e, "dashboard unavailable");
                self.notice.error(format!("Failed to load dashboard: {e}"));
            }
        }
        self.selected = self.selected.min(self.menu_len().saturating_sub(1));
    }

    // role menu plus Logout
    fn menu_len(&self) -> usize {
        self.viewer.as_ref().map_or(0, |v| v.role.menu().len()) + 1
    }

    fn logout_index(&self) -> usize {
        self.menu_len() - 1
    }

    fn render_stats(&self, frame: &mut Frame, area: Rect) {
        let Some(dashboard) = &self.dashboard else {
            return;
        };
        let stats = &dashboard.stats;

        let mut cards = vec![
            ("Total Appointments", stats.total_appointments, theme::ACCENT),
            ("Pending", stats.pending_appointments, theme::FOCUS),
        ];
        if let Some(patients) = stats.total_patients {
            cards.push(("Patients", patients, theme::SUCCESS));
        }
        if let Some(doctors) = stats.total_doctors {
            cards.push(("Doctors", doctors, theme::TITLE));
        }

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, cards.len() as u32); cards.len()])
            .spacing(1)
            .split(area);

        for ((label, value, color), column) in cards.into_iter().zip(columns.iter()) {
            let card = Paragraph::new(vec![
                Line::from(Span::styled(
                    value.to_string(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(label, Style::default().fg(theme::HELP))),
            ])
            .alignment(Alignment::Center)
            .block(panel(""));
            frame.render_widget(card, *column);
        }
    }

    fn render_recent(&self, frame: &mut Frame, area: Rect) {
        let block = panel(" Recent Appointments ");
        let (Some(viewer), Some(dashboard)) = (&self.viewer, &self.dashboard) else {
            frame.render_widget(block, area);
            return;
        };

        if dashboard.recent.is_empty() {
            frame.render_widget(
                Paragraph::new(viewer.role.empty_appointments_hint())
                    .style(Style::default().fg(theme::HELP))
                    .alignment(Alignment::Center)
                    .block(block.padding(Padding::top(2))),
                area,
            );
            return;
        }

        let header = Row::new(["Date", "Time", "With", "Clinic", "Status"])
            .style(Style::default().fg(theme::TITLE).bg(theme::INPUT))
            .bottom_margin(1);
        let rows = dashboard.recent.iter().map(|a| {
            Row::new(vec![
                Cell::from(schedule::short_date(&a.date)),
                Cell::from(schedule::clock_time(&a.time)),
                Cell::from(viewer.role.counterpart(a)),
                Cell::from(a.clinic_name.clone().unwrap_or_default()),
                Cell::from(Span::styled(a.status.as_str(), status_style(a.status))),
            ])
            .style(Style::default().fg(theme::TEXT))
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(8),
                Constraint::Length(9),
                Constraint::Percentage(40),
                Constraint::Percentage(30),
                Constraint::Length(10),
            ],
        )
        .header(header)
        .block(block);
        frame.render_widget(table, area);
    }
}

impl Default for Home {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Home {
    fn handle_input(
        &mut self,
        key: KeyEvent,
        ctx: &mut Context<'_>,
    ) -> Result<Option<SelectedApp>> {
        if let Some(dialog) = &mut self.logout_dialog {
            match dialog.handle_input(key) {
                Some(true) => {
                    self.logout_dialog = None;
                    if let Err(e) = ctx.session.logout() {
                        warn!(error = %e, "could not clear the stored session");
                        self.notice.error(format!("Logout failed: {e}"));
                        return Ok(None);
                    }
                    return Ok(Some(SelectedApp::Login));
                }
                Some(false) => self.logout_dialog = None,
                None => {}
            }
            return Ok(None);
        }

        let len = self.menu_len();
        match key.code {
            KeyCode::Down | KeyCode::Tab => self.selected = (self.selected + 1) % len,
            KeyCode::Up | KeyCode::BackTab => self.selected = (self.selected + len - 1) % len,
            KeyCode::Char('r') | KeyCode::Char('R') => self.load(ctx),
            KeyCode::Esc => self.logout_dialog = Some(Confirm::default()),
            KeyCode::Enter => {
                if self.selected == self.logout_index() {
                    self.logout_dialog = Some(Confirm::default());
                } else if let Some(entry) = self
                    .viewer
                    .as_ref()
                    .and_then(|v| v.role.menu().get(self.selected))
                {
                    return Ok(Some(entry.target));
                }
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
                Constraint::Length(1), // subtitle
                Constraint::Length(1),
                Constraint::Min(10),   // body
                Constraint::Length(1), // notice
                Constraint::Length(1), // help
            ])
            .margin(1)
            .split(frame.area());

        let name = self.viewer.as_ref().map_or("User", |v| v.name.as_str());
        header(frame, layout[0], &format!("Welcome back, {name}"));
        if let Some(viewer) = &self.viewer {
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled(
                        viewer.role.dashboard_subtitle(),
                        Style::default().fg(theme::ACCENT),
                    ),
                    Span::styled(
                        format!("  ·  {}", viewer.role.label()),
                        Style::default().fg(theme::HELP),
                    ),
                ]))
                .alignment(Alignment::Center),
                layout[1],
            );
        }

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .spacing(2)
            .split(layout[3]);

        let mut labels: Vec<&str> = self
            .viewer
            .as_ref()
            .map(|v| v.role.menu().iter().map(|e| e.label).collect())
            .unwrap_or_default();
        labels.push("Logout");

        let items: Vec<ListItem> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let focused = i == self.selected;
                let color = match (focused, i == self.logout_index()) {
                    (true, true) => theme::ERROR,
                    (true, false) => theme::FOCUS,
                    (false, _) => theme::TEXT,
                };
                let prefix = if focused { " ► " } else { "   " };
                let mut style = Style::default().fg(color);
                if focused {
                    style = style.add_modifier(Modifier::BOLD);
                }
                ListItem::new(format!("{prefix}{label}")).style(style)
            })
            .collect();
        frame.render_widget(
            List::new(items).block(panel(" Menu ").padding(Padding::top(1))),
            body[0],
        );

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(5)])
            .spacing(1)
            .split(body[1]);
        self.render_stats(frame, right[0]);
        self.render_recent(frame, right[1]);

        self.notice.render(frame, layout[4]);
        frame.render_widget(
            help("↑↓: Navigate | Enter: Open | R: Refresh | Esc: Logout | Ctrl+Q: Quit"),
            layout[5],
        );

        if let Some(dialog) = &self.logout_dialog {
            dialog.render(frame, "Confirm Logout", "Are you sure you want to log out?");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{appointment, user, MockGateway};
    use crate::models::{AppointmentStatus, Role};
    use crate::session::Session;
    use crate::storage::Storage;
    use crossterm::event::KeyModifiers;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn signed_in(dir: &TempDir, role: Role) -> Session {
        let mut session = Session::new(Storage::in_dir(dir.path()).unwrap());
        session.login(user(5, "Ada", role), "tok".into()).unwrap();
        session
    }

    #[test]
    fn menu_follows_the_role_and_ends_with_logout() {
        let dir = TempDir::new().unwrap();
        let mut session = signed_in(&dir, Role::Patient);
        let gateway = MockGateway::new()
            .with_appointments(vec![appointment(1, 5, 7, AppointmentStatus::Scheduled)]);
        let mut ctx = Context {
            gateway: &gateway,
            session: &mut session,
        };

        let mut home = Home::new();
        home.load(&ctx);
        assert_eq!(home.dashboard.as_ref().map(|d| d.recent.len()), Some(1));

        assert_eq!(
            home.handle_input(key(KeyCode::Enter), &mut ctx).unwrap(),
            Some(SelectedApp::Doctors)
        );

        home.handle_input(key(KeyCode::Up), &mut ctx).unwrap();
        assert_eq!(home.handle_input(key(KeyCode::Enter), &mut ctx).unwrap(), None);
        assert_eq!(
            home.handle_input(key(KeyCode::Enter), &mut ctx).unwrap(),
            Some(SelectedApp::Login)
        );
        assert!(session.identity().is_none());
    }

    #[test]
    fn failed_load_leaves_a_message() {
        let dir = TempDir::new().unwrap();
        let mut session = signed_in(&dir, Role::Doctor);
        let gateway = MockGateway::new();
        gateway.fail_with(500, "Database offline");
        let ctx = Context {
            gateway: &gateway,
            session: &mut session,
        };

        let mut home = Home::new();
        home.load(&ctx);
        assert!(home.dashboard.is_none());
        assert_eq!(
            home.notice.text(),
            Some("Failed to load dashboard: Database offline")
        );
    }

    #[test]
    fn failed_load_after_switching_user_drops_the_previous_dashboard() {
        let dir = TempDir::new().unwrap();
        let mut session = signed_in(&dir, Role::Admin);
        let gateway = MockGateway::new()
            .with_users(vec![user(5, "Ada", Role::Patient), user(7, "Grace", Role::Doctor)])
            .with_appointments(vec![
                appointment(1, 5, 7, AppointmentStatus::Scheduled),
                appointment(2, 9, 7, AppointmentStatus::Scheduled),
            ]);
        let mut ctx = Context {
            gateway: &gateway,
            session: &mut session,
        };

        let mut home = Home::new();
        home.load(&ctx);
        assert_eq!(home.dashboard.as_ref().map(|d| d.recent.len()), Some(2));

        ctx.session.logout().unwrap();
        ctx.session
            .login(user(5, "Ada", Role::Patient), "tok2".into())
            .unwrap();
        gateway.fail_with(500, "down");
        home.load(&ctx);

        assert_eq!(home.viewer.as_ref().map(|v| v.role), Some(Role::Patient));
        assert!(home.dashboard.is_none());
    }
}
