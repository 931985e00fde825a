//! Doctor directory and the booking form.

use super::{
    button, centered_rect, clamp, edit, header, help, input, paint_background, panel, step,
    theme, Component, Context, Notice,
};
use crate::app::SelectedApp;
use crate::error::ClientError;
use crate::tui::Frame;
use crate::views::directory::{BookingForm, Directory};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use tracing::warn;

const DATE: usize = 0;
const TIME: usize = 1;
const NOTES: usize = 2;
const SUBMIT: usize = 3;
const CANCEL: usize = 4;
const FORM_FIELDS: usize = 5;

#[derive(Debug, Default)]
struct Booking {
    form: BookingForm,
    focus: usize,
}

pub struct Doctors {
    directory: Option<Directory>,
    state: TableState,
    booking: Option<Booking>,
    notice: Notice,
    back: SelectedApp,
}

impl Doctors {
    pub fn open(ctx: &Context<'_>) -> Self {
        let back = if ctx.session.identity().is_some() {
            SelectedApp::Home
        } else {
            SelectedApp::Login
        };
        let mut screen = Self {
            directory: None,
            state: TableState::default(),
            booking: None,
            notice: Notice::default(),
            back,
        };

        match Directory::load(ctx.gateway) {
            Ok(directory) => screen.directory = Some(directory),
            Err(e) => {
                warn!(error = %e, "doctor directory unavailable");
                screen.notice.error(format!("Failed to load doctors: {e}"));
            }
        }
        screen.sync_selection();
        screen
    }

    fn visible_len(&self) -> usize {
        self.directory.as_ref().map_or(0, |d| d.visible().len())
    }

    fn sync_selection(&mut self) {
        let len = self.visible_len();
        clamp(&mut self.state, len);
    }

    fn open_booking(&mut self, ctx: &Context<'_>) {
        let Some(directory) = &self.directory else {
            return;
        };
        let Some(entry) = self
            .state
            .selected()
            .and_then(|i| directory.visible().get(i).map(|e| (*e).clone()))
        else {
            return;
        };

        match directory.open_booking(ctx.session.identity(), &entry) {
            Ok(form) => {
                self.notice.clear();
                self.booking = Some(Booking { form, focus: DATE });
            }
            Err(e) => self.notice.error(e.to_string()),
        }
    }

    fn submit(&mut self, ctx: &Context<'_>) {
        let Some(booking) = &self.booking else {
            return;
        };
        match booking.form.submit(ctx.gateway, ctx.session.identity()) {
            Ok(()) => {
                self.booking = None;
                self.notice.success("Appointment booked successfully!");
            }
            Err(e @ ClientError::Api(_)) => {
                warn!(error = %e, "booking rejected");
                self.notice.error(format!("Failed to book appointment: {e}"));
            }
            Err(e) => self.notice.error(e.to_string()),
        }
    }

    fn handle_booking_input(&mut self, key: KeyEvent, ctx: &Context<'_>) {
        let Some(booking) = &mut self.booking else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.booking = None,
            KeyCode::Tab | KeyCode::Down => booking.focus = (booking.focus + 1) % FORM_FIELDS,
            KeyCode::BackTab | KeyCode::Up => {
                booking.focus = (booking.focus + FORM_FIELDS - 1) % FORM_FIELDS
            }
            KeyCode::Enter if booking.focus == CANCEL => self.booking = None,
            KeyCode::Enter => self.submit(ctx),
            _ => {
                let field = match booking.focus {
                    DATE => &mut booking.form.date,
                    TIME => &mut booking.form.time,
                    NOTES => &mut booking.form.notes,
                    _ => return,
                };
                if edit(field, key) {
                    self.notice.clear();
                }
            }
        }
    }

    fn render_booking(&self, frame: &mut Frame, booking: &Booking) {
        let area = centered_rect(60, 70, frame.area());
        frame.render_widget(Clear, area);
        let block = panel(" Book Appointment ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // who and where
                Constraint::Length(3), // date
                Constraint::Length(3), // time
                Constraint::Length(3), // notes
                Constraint::Length(2), // notice
                Constraint::Length(1), // submit
                Constraint::Length(1), // cancel
                Constraint::Min(0),
            ])
            .margin(1)
            .split(inner);

        let form = &booking.form;
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled(
                    format!("Dr. {}", form.doctor_name),
                    Style::default()
                        .fg(theme::TITLE)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    form.clinic_name.as_str(),
                    Style::default().fg(theme::ACCENT),
                )),
            ])
            .alignment(Alignment::Center),
            layout[0],
        );

        frame.render_widget(
            input("Date (YYYY-MM-DD)", &form.date, booking.focus == DATE),
            layout[1],
        );
        frame.render_widget(
            input("Time (HH:MM)", &form.time, booking.focus == TIME),
            layout[2],
        );
        frame.render_widget(
            input("Notes (optional)", &form.notes, booking.focus == NOTES),
            layout[3],
        );
        self.notice.render(frame, layout[4]);
        frame.render_widget(button("Book", booking.focus == SUBMIT), layout[5]);
        frame.render_widget(button("Cancel", booking.focus == CANCEL), layout[6]);
    }
}

impl Component for Doctors {
    fn handle_input(
        &mut self,
        key: KeyEvent,
        ctx: &mut Context<'_>,
    ) -> Result<Option<SelectedApp>> {
        if self.booking.is_some() {
            self.handle_booking_input(key, ctx);
            return Ok(None);
        }

        let len = self.visible_len();
        match key.code {
            KeyCode::Down => step(&mut self.state, len, true),
            KeyCode::Up => step(&mut self.state, len, false),
            KeyCode::Enter => self.open_booking(ctx),
            KeyCode::Char('f') | KeyCode::Char('F') => {
                if let Some(directory) = &mut self.directory {
                    directory.cycle_clinic_filter();
                }
                self.state.select(None);
                self.sync_selection();
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if let Some(directory) = &mut self.directory {
                    if let Err(e) = directory.refresh(ctx.gateway) {
                        self.notice.error(format!("Failed to refresh: {e}"));
                    }
                } else {
                    *self = Self::open(ctx);
                }
                self.sync_selection();
            }
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('B') => {
                return Ok(Some(self.back))
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
                Constraint::Length(1), // filter
                Constraint::Min(8),    // table
                Constraint::Length(1), // notice
                Constraint::Length(1), // help
            ])
            .margin(1)
            .split(frame.area());

        header(frame, layout[0], "FIND A DOCTOR");

        let filter = self
            .directory
            .as_ref()
            .and_then(|d| d.clinic_filter())
            .map_or_else(|| "All clinics".to_string(), |c| c.name.clone());
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("Clinic: ", Style::default().fg(theme::HELP)),
                Span::styled(
                    filter,
                    Style::default()
                        .fg(theme::ACCENT)
                        .add_modifier(Modifier::BOLD),
                ),
            ]))
            .alignment(Alignment::Center),
            layout[1],
        );

        let entries = self
            .directory
            .as_ref()
            .map(|d| d.visible())
            .unwrap_or_default();
        if entries.is_empty() {
            frame.render_widget(
                Paragraph::new("No doctors available.")
                    .style(Style::default().fg(theme::HELP))
                    .alignment(Alignment::Center)
                    .block(panel(" Doctors ").padding(Padding::top(2))),
                layout[2],
            );
        } else {
            let header = Row::new(["Doctor", "Clinic", "Location"])
                .style(Style::default().fg(theme::TITLE).bg(theme::INPUT))
                .bottom_margin(1);
            let location = |clinic_id: i64| {
                self.directory
                    .as_ref()
                    .and_then(|d| d.clinics().iter().find(|c| c.id == clinic_id))
                    .and_then(|c| c.location.clone())
                    .unwrap_or_default()
            };
            let rows = entries.iter().map(|e| {
                Row::new(vec![
                    Cell::from(format!("Dr. {}", e.doctor.name)),
                    Cell::from(e.clinic_name.clone()),
                    Cell::from(location(e.clinic_id)),
                ])
                .style(Style::default().fg(theme::TEXT))
            });
            let table = Table::new(
                rows,
                [
                    Constraint::Percentage(35),
                    Constraint::Percentage(30),
                    Constraint::Percentage(35),
                ],
            )
            .header(header)
            .block(panel(" Doctors "))
            .row_highlight_style(
                Style::default()
                    .bg(theme::HIGHLIGHT)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("► ");
            frame.render_stateful_widget(table, layout[2], &mut self.state.clone());
        }

        if self.booking.is_none() {
            self.notice.render(frame, layout[3]);
        }
        frame.render_widget(
            help("↑↓: Navigate | Enter: Book | F: Filter by Clinic | R: Refresh | Esc: Back"),
            layout[4],
        );

        if let Some(booking) = &self.booking {
            self.render_booking(frame, booking);
        }
    }
}
