//! Appointment list with the status actions the viewer is offered.

use super::{
    button, clamp, header, help, paint_background, panel, step, theme, Component, Confirm,
    Context, Notice,
};
use crate::app::SelectedApp;
use crate::models::{Appointment, AppointmentStatus};
use crate::policy::action_label;
use crate::schedule;
use crate::tui::Frame;
use crate::views::appointments::AppointmentView;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use tracing::warn;

const TABLE: usize = 0;
const BACK: usize = 1;

pub fn status_style(status: AppointmentStatus) -> Style {
    let color = match status {
        AppointmentStatus::Scheduled => theme::FOCUS,
        AppointmentStatus::Completed => theme::SUCCESS,
        AppointmentStatus::Cancelled => theme::ERROR,
    };
    Style::default().fg(color)
}

fn shortcut(target: AppointmentStatus) -> char {
    match target {
        AppointmentStatus::Completed => 'c',
        AppointmentStatus::Cancelled => 'x',
        AppointmentStatus::Scheduled => 's',
    }
}

/// A status change waiting for confirmation.
struct PendingChange {
    appointment_id: i64,
    target: AppointmentStatus,
    dialog: Confirm,
}

pub struct Appointments {
    view: Option<AppointmentView>,
    state: TableState,
    focus: usize,
    notice: Notice,
    pending: Option<PendingChange>,
}

impl Appointments {
    pub fn open(ctx: &Context<'_>) -> Self {
        let mut screen = Self {
            view: None,
            state: TableState::default(),
            focus: TABLE,
            notice: Notice::default(),
            pending: None,
        };

        match ctx.session.identity() {
            Some(viewer) => match AppointmentView::load(ctx.gateway, viewer) {
                Ok(view) => screen.view = Some(view),
                Err(e) => {
                    warn!(error = %e, "appointments unavailable");
                    screen
                        .notice
                        .error(format!("Failed to load appointments: {e}"));
                }
            },
            None => screen.notice.error("Please login to view appointments"),
        }
        screen.sync_selection();
        screen
    }

    fn rows(&self) -> &[Appointment] {
        match &self.view {
            Some(view) => view.appointments(),
            None => &[],
        }
    }

    fn sync_selection(&mut self) {
        let len = self.rows().len();
        clamp(&mut self.state, len);
    }

    fn selected(&self) -> Option<&Appointment> {
        self.state.selected().and_then(|i| self.rows().get(i))
    }

    fn refresh(&mut self, ctx: &Context<'_>) {
        if let Some(view) = &mut self.view {
            match view.refresh(ctx.gateway) {
                Ok(()) => self.notice.success("Appointments refreshed"),
                Err(e) => self.notice.error(format!("Failed to refresh: {e}")),
            }
        }
        self.sync_selection();
    }

    /// Opens the confirm dialog, but only for a change the viewer is offered.
    fn request(&mut self, target: AppointmentStatus) {
        let (Some(view), Some(appointment)) = (&self.view, self.selected()) else {
            return;
        };
        let appointment_id = appointment.id;
        if !view.actions_for(appointment).contains(&target) {
            self.notice.error(format!(
                "Appointment #{appointment_id} cannot be marked {target}"
            ));
            return;
        }
        self.pending = Some(PendingChange {
            appointment_id,
            target,
            dialog: Confirm::default(),
        });
    }

    fn apply(&mut self, ctx: &Context<'_>, id: i64, target: AppointmentStatus) {
        let Some(view) = &mut self.view else {
            return;
        };
        match view.update_status(ctx.gateway, id, target) {
            Ok(()) => self
                .notice
                .success(format!("Appointment #{id} marked {target}")),
            Err(e) => {
                warn!(appointment_id = id, error = %e, "status update failed");
                self.notice.error(e.to_string());
            }
        }
        self.sync_selection();
    }

    fn render_details(&self, frame: &mut Frame, area: Rect) {
        let (Some(view), Some(appointment)) = (&self.view, self.selected()) else {
            frame.render_widget(panel(" Details "), area);
            return;
        };

        let label = |text: &'static str| Span::styled(text, Style::default().fg(theme::HELP));
        let value = |text: String| Span::styled(text, Style::default().fg(theme::TEXT));

        let mut lines = vec![
            Line::from(vec![
                label("When: "),
                value(format!(
                    "{} at {}",
                    schedule::long_date(&appointment.date),
                    schedule::clock_time(&appointment.time)
                )),
            ]),
            Line::from(vec![
                label("Clinic: "),
                value(appointment.clinic_name.clone().unwrap_or_else(|| "-".into())),
            ]),
            Line::from(vec![
                label("Notes: "),
                value(appointment.notes.clone().unwrap_or_else(|| "-".into())),
            ]),
        ];

        let actions = view.actions_for(appointment);
        if !actions.is_empty() {
            let role = view.viewer().role;
            let offered: Vec<String> = actions
                .iter()
                .map(|a| {
                    let key = shortcut(*a).to_ascii_uppercase();
                    format!("{key}: {}", action_label(role, *a))
                })
                .collect();
            lines.push(Line::from(Span::styled(
                offered.join("  |  "),
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            )));
        }

        frame.render_widget(
            Paragraph::new(lines)
                .block(panel(" Details "))
                .wrap(Wrap { trim: true }),
            area,
        );
    }
}

impl Component for Appointments {
    fn handle_input(
        &mut self,
        key: KeyEvent,
        ctx: &mut Context<'_>,
    ) -> Result<Option<SelectedApp>> {
        if let Some(pending) = &mut self.pending {
            match pending.dialog.handle_input(key) {
                Some(true) => {
                    let (id, target) = (pending.appointment_id, pending.target);
                    self.pending = None;
                    self.apply(ctx, id, target);
                }
                Some(false) => self.pending = None,
                None => {}
            }
            return Ok(None);
        }

        let len = self.rows().len();
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => self.focus = 1 - self.focus,
            KeyCode::Down if self.focus == TABLE => step(&mut self.state, len, true),
            KeyCode::Up if self.focus == TABLE => step(&mut self.state, len, false),
            KeyCode::Char('c') | KeyCode::Char('C') => self.request(AppointmentStatus::Completed),
            KeyCode::Char('x') | KeyCode::Char('X') => self.request(AppointmentStatus::Cancelled),
            KeyCode::Char('r') | KeyCode::Char('R') => self.refresh(ctx),
            KeyCode::Char('b') | KeyCode::Char('B') | KeyCode::Esc => {
                return Ok(Some(SelectedApp::Home))
            }
            KeyCode::Enter if self.focus == BACK => return Ok(Some(SelectedApp::Home)),
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
                Constraint::Length(1), // counts
                Constraint::Min(8),    // table
                Constraint::Length(6), // details
                Constraint::Length(1), // notice
                Constraint::Length(1), // help
                Constraint::Length(2), // back
            ])
            .margin(1)
            .split(frame.area());

        let title = self
            .view
            .as_ref()
            .map_or("APPOINTMENTS", |v| v.viewer().role.appointments_title());
        header(frame, layout[0], title);

        if let Some(view) = &self.view {
            let stats = view.stats();
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled(
                        format!("Total: {}", stats.total_appointments),
                        Style::default().fg(theme::ACCENT),
                    ),
                    Span::raw("    "),
                    Span::styled(
                        format!("Pending: {}", stats.pending_appointments),
                        Style::default().fg(theme::FOCUS),
                    ),
                ]))
                .alignment(Alignment::Center),
                layout[1],
            );
        }

        match &self.view {
            Some(view) if view.appointments().is_empty() => {
                frame.render_widget(
                    Paragraph::new(view.viewer().role.empty_appointments_hint())
                        .style(Style::default().fg(theme::HELP))
                        .alignment(Alignment::Center)
                        .block(panel(" Appointments ").padding(Padding::top(2))),
                    layout[2],
                );
            }
            Some(view) => {
                let role = view.viewer().role;
                let header = Row::new(["#", "Date", "Time", "With", "Clinic", "Status"])
                    .style(Style::default().fg(theme::TITLE).bg(theme::INPUT))
                    .bottom_margin(1);
                let rows = view.appointments().iter().map(|a| {
                    Row::new(vec![
                        Cell::from(a.id.to_string()),
                        Cell::from(schedule::short_date(&a.date)),
                        Cell::from(schedule::clock_time(&a.time)),
                        Cell::from(role.counterpart(a)),
                        Cell::from(a.clinic_name.clone().unwrap_or_default()),
                        Cell::from(Span::styled(a.status.as_str(), status_style(a.status))),
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
                        Constraint::Length(5),
                        Constraint::Length(8),
                        Constraint::Length(9),
                        Constraint::Percentage(35),
                        Constraint::Percentage(30),
                        Constraint::Length(10),
                    ],
                )
                .header(header)
                .block(panel(" Appointments "))
                .row_highlight_style(
                    Style::default()
                        .bg(highlight)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol(if self.focus == TABLE { "► " } else { "  " });
                frame.render_stateful_widget(table, layout[2], &mut self.state.clone());
            }
            None => frame.render_widget(panel(" Appointments "), layout[2]),
        }

        self.render_details(frame, layout[3]);
        self.notice.render(frame, layout[4]);
        frame.render_widget(
            help("↑↓: Navigate | C/X: Change Status | R: Refresh | Tab: Focus | Esc: Back"),
            layout[5],
        );
        frame.render_widget(button("Back", self.focus == BACK), layout[6]);

        if let Some(pending) = &self.pending {
            let question = format!(
                "Mark appointment #{} as {}?",
                pending.appointment_id, pending.target
            );
            pending.dialog.render(frame, "Confirm", &question);
        }
    }
}
