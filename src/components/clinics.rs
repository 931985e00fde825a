//! Clinic administration: clinics, their locations and doctor rosters.

use super::{
    button, centered_rect, clamp, edit, header, help, input, paint_background, panel, step,
    theme, Component, Confirm, Context, Notice,
};
use crate::app::SelectedApp;
use crate::error::ClientError;
use crate::models::{Clinic, ClinicForm, Doctor};
use crate::tui::Frame;
use crate::views::clinics::ClinicAdmin;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use tracing::warn;

const CLINICS: usize = 0;
const DOCTORS: usize = 1;
const BACK: usize = 2;

const FORM_NAME: usize = 0;
const FORM_LOCATION: usize = 1;
const FORM_SAVE: usize = 2;
const FORM_CANCEL: usize = 3;
const FORM_FIELDS: usize = 4;

enum Removal {
    Clinic(i64),
    Doctor { clinic_id: i64, doctor_id: i64 },
}

enum Mode {
    Browse,
    Form {
        editing: Option<i64>,
        name: String,
        location: String,
        focus: usize,
    },
    Attach {
        clinic_id: i64,
        state: TableState,
    },
    Remove {
        removal: Removal,
        question: String,
        dialog: Confirm,
    },
}

pub struct Clinics {
    admin: Option<ClinicAdmin>,
    denied: Option<String>,
    clinic_state: TableState,
    doctor_state: TableState,
    focus: usize,
    mode: Mode,
    notice: Notice,
}

impl Clinics {
    pub fn open(ctx: &Context<'_>) -> Self {
        let mut screen = Self {
            admin: None,
            denied: None,
            clinic_state: TableState::default(),
            doctor_state: TableState::default(),
            focus: CLINICS,
            mode: Mode::Browse,
            notice: Notice::default(),
        };

        match ClinicAdmin::load(ctx.gateway, ctx.session.identity()) {
            Ok(admin) => screen.admin = Some(admin),
            Err(e @ ClientError::Forbidden(_)) => screen.denied = Some(e.to_string()),
            Err(e) => {
                warn!(error = %e, "clinic list unavailable");
                screen.notice.error(format!("Failed to load clinics: {e}"));
            }
        }
        screen.sync_selection();
        screen
    }

    fn clinics(&self) -> &[Clinic] {
        match &self.admin {
            Some(admin) => admin.clinics(),
            None => &[],
        }
    }

    fn selected_clinic(&self) -> Option<&Clinic> {
        self.clinic_state
            .selected()
            .and_then(|i| self.clinics().get(i))
    }

    fn selected_doctor(&self) -> Option<&Doctor> {
        let clinic = self.selected_clinic()?;
        self.doctor_state
            .selected()
            .and_then(|i| clinic.doctors.get(i))
    }

    fn sync_selection(&mut self) {
        let clinics = self.clinics().len();
        clamp(&mut self.clinic_state, clinics);
        let doctors = self.selected_clinic().map_or(0, |c| c.doctors.len());
        clamp(&mut self.doctor_state, doctors);
    }

    /// Runs a mutation against the loaded clinics and reports the outcome.
    fn mutate(
        &mut self,
        ctx: &Context<'_>,
        done: &str,
        action: impl FnOnce(&mut ClinicAdmin, &Context<'_>) -> Result<(), ClientError>,
    ) -> bool {
        let Some(admin) = &mut self.admin else {
            return false;
        };
        let ok = match action(admin, ctx) {
            Ok(()) => {
                self.notice.success(done);
                true
            }
            Err(e) => {
                warn!(error = %e, "clinic change failed");
                self.notice.error(e.to_string());
                false
            }
        };
        self.sync_selection();
        ok
    }

    fn open_form(&mut self, editing: bool) {
        let (editing, name, location) = match (editing, self.selected_clinic()) {
            (true, Some(clinic)) => (
                Some(clinic.id),
                clinic.name.clone(),
                clinic.location.clone().unwrap_or_default(),
            ),
            (true, None) => return,
            (false, _) => (None, String::new(), String::new()),
        };
        self.mode = Mode::Form {
            editing,
            name,
            location,
            focus: FORM_NAME,
        };
    }

    fn handle_form_input(&mut self, key: KeyEvent, ctx: &Context<'_>) {
        let Mode::Form {
            editing,
            name,
            location,
            focus,
        } = &mut self.mode
        else {
            return;
        };

        match key.code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Tab | KeyCode::Down => *focus = (*focus + 1) % FORM_FIELDS,
            KeyCode::BackTab | KeyCode::Up => *focus = (*focus + FORM_FIELDS - 1) % FORM_FIELDS,
            KeyCode::Enter if *focus == FORM_CANCEL => self.mode = Mode::Browse,
            KeyCode::Enter => {
                let form = ClinicForm {
                    name: name.clone(),
                    location: Some(location.clone()),
                };
                let editing = *editing;
                let saved = match editing {
                    Some(id) => self.mutate(ctx, "Clinic updated", |admin, ctx| {
                        admin.update(ctx.gateway, id, &form)
                    }),
                    None => self.mutate(ctx, "Clinic created", |admin, ctx| {
                        admin.create(ctx.gateway, &form)
                    }),
                };
                if saved {
                    self.mode = Mode::Browse;
                }
            }
            _ => {
                let field = match *focus {
                    FORM_NAME => name,
                    FORM_LOCATION => location,
                    _ => return,
                };
                edit(field, key);
            }
        }
    }

    fn handle_attach_input(&mut self, key: KeyEvent, ctx: &Context<'_>) {
        let Mode::Attach { clinic_id, state } = &mut self.mode else {
            return;
        };
        let clinic_id = *clinic_id;
        let candidates: Vec<i64> = self
            .admin
            .as_ref()
            .map(|a| a.attachable(clinic_id).iter().map(|d| d.id).collect())
            .unwrap_or_default();

        match key.code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Down => step(state, candidates.len(), true),
            KeyCode::Up => step(state, candidates.len(), false),
            KeyCode::Enter => {
                let Some(doctor_id) = state.selected().and_then(|i| candidates.get(i)).copied()
                else {
                    return;
                };
                if self.mutate(ctx, "Doctor added to clinic", |admin, ctx| {
                    admin.attach(ctx.gateway, clinic_id, doctor_id)
                }) {
                    self.mode = Mode::Browse;
                }
            }
            _ => {}
        }
    }

    fn confirm_removal(&mut self) {
        let removal = match self.focus {
            CLINICS => self.selected_clinic().map(|c| {
                (
                    Removal::Clinic(c.id),
                    format!("Delete clinic {}?", c.name),
                )
            }),
            DOCTORS => match (self.selected_clinic(), self.selected_doctor()) {
                (Some(c), Some(d)) => Some((
                    Removal::Doctor {
                        clinic_id: c.id,
                        doctor_id: d.id,
                    },
                    format!("Remove Dr. {} from {}?", d.name, c.name),
                )),
                _ => None,
            },
            _ => None,
        };
        if let Some((removal, question)) = removal {
            self.mode = Mode::Remove {
                removal,
                question,
                dialog: Confirm::default(),
            };
        }
    }

    fn handle_remove_input(&mut self, key: KeyEvent, ctx: &Context<'_>) {
        let Mode::Remove { removal, dialog, .. } = &mut self.mode else {
            return;
        };
        let answer = dialog.handle_input(key);
        let target = match removal {
            Removal::Clinic(id) => Removal::Clinic(*id),
            Removal::Doctor {
                clinic_id,
                doctor_id,
            } => Removal::Doctor {
                clinic_id: *clinic_id,
                doctor_id: *doctor_id,
            },
        };

        match answer {
            Some(true) => {
                self.mode = Mode::Browse;
                match target {
                    Removal::Clinic(id) => {
                        self.mutate(ctx, "Clinic deleted", |admin, ctx| {
                            admin.delete(ctx.gateway, id)
                        });
                    }
                    Removal::Doctor {
                        clinic_id,
                        doctor_id,
                    } => {
                        self.mutate(ctx, "Doctor removed from clinic", |admin, ctx| {
                            admin.detach(ctx.gateway, clinic_id, doctor_id)
                        });
                    }
                }
            }
            Some(false) => self.mode = Mode::Browse,
            None => {}
        }
    }

    fn render_form(&self, frame: &mut Frame) {
        let Mode::Form {
            editing,
            name,
            location,
            focus,
        } = &self.mode
        else {
            return;
        };
        let area = centered_rect(50, 50, frame.area());
        frame.render_widget(Clear, area);
        let title = if editing.is_some() {
            " Edit Clinic "
        } else {
            " New Clinic "
        };
        let block = panel(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(2), // notice
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .margin(1)
            .split(inner);
        frame.render_widget(input("Name", name, *focus == FORM_NAME), layout[0]);
        frame.render_widget(
            input("Location", location, *focus == FORM_LOCATION),
            layout[1],
        );
        self.notice.render(frame, layout[2]);
        frame.render_widget(button("Save", *focus == FORM_SAVE), layout[3]);
        frame.render_widget(button("Cancel", *focus == FORM_CANCEL), layout[4]);
    }

    fn render_attach(&self, frame: &mut Frame) {
        let Mode::Attach { clinic_id, state } = &self.mode else {
            return;
        };
        let area = centered_rect(50, 60, frame.area());
        frame.render_widget(Clear, area);

        let candidates = self
            .admin
            .as_ref()
            .map(|a| a.attachable(*clinic_id))
            .unwrap_or_default();
        if candidates.is_empty() {
            frame.render_widget(
                Paragraph::new("Every doctor already works here.")
                    .style(Style::default().fg(theme::HELP))
                    .alignment(Alignment::Center)
                    .block(panel(" Add Doctor ").padding(Padding::top(2))),
                area,
            );
            return;
        }

        let rows = candidates.iter().map(|d| {
            Row::new(vec![Cell::from(format!("Dr. {}", d.name))])
                .style(Style::default().fg(theme::TEXT))
        });
        let table = Table::new(rows, [Constraint::Percentage(100)])
            .block(panel(" Add Doctor (Enter to add, Esc to close) "))
            .row_highlight_style(
                Style::default()
                    .bg(theme::HIGHLIGHT)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("► ");
        frame.render_stateful_widget(table, area, &mut state.clone());
    }

    fn render_clinics(&self, frame: &mut Frame, area: Rect) {
        let rows = self.clinics().iter().map(|c| {
            Row::new(vec![
                Cell::from(c.name.clone()),
                Cell::from(c.location.clone().unwrap_or_default()),
                Cell::from(c.doctors.len().to_string()),
            ])
            .style(Style::default().fg(theme::TEXT))
        });
        let border = if self.focus == CLINICS {
            theme::FOCUS
        } else {
            theme::BORDER
        };
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(45),
                Constraint::Percentage(40),
                Constraint::Length(7),
            ],
        )
        .header(
            Row::new(["Clinic", "Location", "Doctors"])
                .style(Style::default().fg(theme::TITLE).bg(theme::INPUT))
                .bottom_margin(1),
        )
        .block(panel(" Clinics ").border_style(Style::default().fg(border)))
        .row_highlight_style(
            Style::default()
                .bg(theme::HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("► ");
        frame.render_stateful_widget(table, area, &mut self.clinic_state.clone());
    }

    fn render_roster(&self, frame: &mut Frame, area: Rect) {
        let border = if self.focus == DOCTORS {
            theme::FOCUS
        } else {
            theme::BORDER
        };
        let block = panel(" Doctors ").border_style(Style::default().fg(border));
        let doctors = self
            .selected_clinic()
            .map(|c| c.doctors.as_slice())
            .unwrap_or_default();

        if doctors.is_empty() {
            frame.render_widget(
                Paragraph::new("No doctors at this clinic.")
                    .style(Style::default().fg(theme::HELP))
                    .alignment(Alignment::Center)
                    .block(block.padding(Padding::top(2))),
                area,
            );
            return;
        }

        let rows = doctors.iter().map(|d| {
            Row::new(vec![Cell::from(format!("Dr. {}", d.name))])
                .style(Style::default().fg(theme::TEXT))
        });
        let table = Table::new(rows, [Constraint::Percentage(100)])
            .block(block)
            .row_highlight_style(
                Style::default()
                    .bg(theme::HIGHLIGHT)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(if self.focus == DOCTORS { "► " } else { "  " });
        frame.render_stateful_widget(table, area, &mut self.doctor_state.clone());
    }
}

impl Component for Clinics {
    fn handle_input(
        &mut self,
        key: KeyEvent,
        ctx: &mut Context<'_>,
    ) -> Result<Option<SelectedApp>> {
        match self.mode {
            Mode::Form { .. } => {
                self.handle_form_input(key, ctx);
                return Ok(None);
            }
            Mode::Attach { .. } => {
                self.handle_attach_input(key, ctx);
                return Ok(None);
            }
            Mode::Remove { .. } => {
                self.handle_remove_input(key, ctx);
                return Ok(None);
            }
            Mode::Browse => {}
        }

        if self.denied.is_some() {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('b') => Some(SelectedApp::Home),
                _ => None,
            });
        }

        match key.code {
            KeyCode::Tab => self.focus = (self.focus + 1) % 3,
            KeyCode::BackTab => self.focus = (self.focus + 2) % 3,
            KeyCode::Down | KeyCode::Up => {
                let forward = key.code == KeyCode::Down;
                if self.focus == CLINICS {
                    let len = self.clinics().len();
                    step(&mut self.clinic_state, len, forward);
                    self.doctor_state.select(None);
                } else if self.focus == DOCTORS {
                    let len = self.selected_clinic().map_or(0, |c| c.doctors.len());
                    step(&mut self.doctor_state, len, forward);
                }
                self.sync_selection();
            }
            KeyCode::Char('n') | KeyCode::Char('N') if self.admin.is_some() => {
                self.open_form(false)
            }
            KeyCode::Char('e') | KeyCode::Char('E') => self.open_form(true),
            KeyCode::Char('a') | KeyCode::Char('A') => {
                if let Some(clinic_id) = self.selected_clinic().map(|c| c.id) {
                    let mut state = TableState::default();
                    state.select(Some(0));
                    self.mode = Mode::Attach { clinic_id, state };
                }
            }
            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Delete => self.confirm_removal(),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.mutate(ctx, "Clinics refreshed", |admin, ctx| admin.refresh(ctx.gateway));
            }
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('B') => {
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
                Constraint::Min(8),    // body
                Constraint::Length(1), // notice
                Constraint::Length(1), // help
                Constraint::Length(2), // back
            ])
            .margin(1)
            .split(frame.area());

        header(frame, layout[0], "MANAGE CLINICS");

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
                    Line::from(Span::styled(reason.as_str(), Style::default().fg(theme::TEXT))),
                ])
                .alignment(Alignment::Center)
                .block(panel(" Clinics ").padding(Padding::top(2))),
                layout[1],
            );
        } else {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .spacing(2)
                .split(layout[1]);
            self.render_clinics(frame, body[0]);
            self.render_roster(frame, body[1]);
        }

        if matches!(self.mode, Mode::Browse | Mode::Attach { .. } | Mode::Remove { .. }) {
            self.notice.render(frame, layout[2]);
        }
        frame.render_widget(
            help("Tab: Switch Panel | N: New | E: Edit | A: Add Doctor | D: Delete/Remove | Esc: Back"),
            layout[3],
        );
        frame.render_widget(button("Back", self.focus == BACK), layout[4]);

        match &self.mode {
            Mode::Form { .. } => self.render_form(frame),
            Mode::Attach { .. } => self.render_attach(frame),
            Mode::Remove {
                question, dialog, ..
            } => dialog.render(frame, "Confirm", question),
            Mode::Browse => {}
        }
    }
}
