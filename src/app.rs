//! Application state and the main loop.
//!
//! [`App`] owns the session and the gateway, decides which screen is active
//! and hands each screen an explicit [`Context`] while it handles a key.

use crate::api::Gateway;
use crate::components::appointments::Appointments;
use crate::components::clinics::Clinics;
use crate::components::doctors::Doctors;
use crate::components::users::Users;
use crate::components::{home::Home, login::Login, register::Register, Component, Context};
use crate::components::{paint_background, theme};
use crate::session::Session;
use crate::tui::{self, Frame, Tui};
use anyhow::{Context as _, Result};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{prelude::*, widgets::Paragraph};
use tracing::{debug, info, warn};

/// Where a screen asks to go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectedApp {
    Home,
    Login,
    Register,
    Appointments,
    Doctors,
    Users,
    Clinics,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Local storage has not been read yet.
    Loading,
    Login,
    Register,
    Home,
    Running(SelectedApp),
}

pub struct App {
    pub state: AppState,
    pub should_quit: bool,
    gateway: Box<dyn Gateway>,
    session: Session,
    login: Login,
    register: Register,
    home: Home,
    /// The screen behind `AppState::Running`.
    screen: Option<Box<dyn Component>>,
}

impl App {
    pub fn new(gateway: Box<dyn Gateway>, session: Session) -> Self {
        Self {
            state: AppState::Loading,
            should_quit: false,
            gateway,
            session,
            login: Login::new(),
            register: Register::new(),
            home: Home::new(),
            screen: None,
        }
    }

    pub fn run(&mut self, tui: &mut Tui) -> Result<()> {
        tui.draw(|frame| self.render_ui(frame))?;
        self.start()?;

        while !self.should_quit {
            tui.draw(|frame| self.render_ui(frame))?;
            self.handle_event(tui.next_event()?)?;
        }
        info!("shutting down");
        Ok(())
    }

    /// Leaves the loading state once the stored session has been read.
    fn start(&mut self) -> Result<()> {
        let restored = self
            .session
            .rehydrate()
            .context("Failed to read the stored session")?
            .is_some();
        let next = if restored {
            SelectedApp::Home
        } else {
            SelectedApp::Login
        };
        self.navigate(next);
        Ok(())
    }

    fn handle_event(&mut self, event: tui::Event) -> Result<()> {
        match event {
            tui::Event::Input(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    self.should_quit = true;
                    return Ok(());
                }
                if let Some(next) = self.dispatch(key)? {
                    self.navigate(next);
                }
            }
            tui::Event::Input(_) => {}
            tui::Event::Tick => {
                if let Some(component) = self.active_mut() {
                    component.tick();
                }
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, key: KeyEvent) -> Result<Option<SelectedApp>> {
        let mut ctx = Context {
            gateway: self.gateway.as_ref(),
            session: &mut self.session,
        };
        let component: &mut dyn Component = match self.state {
            AppState::Loading => return Ok(None),
            AppState::Login => &mut self.login,
            AppState::Register => &mut self.register,
            AppState::Home => &mut self.home,
            AppState::Running(_) => match self.screen.as_deref_mut() {
                Some(screen) => screen,
                None => return Ok(Some(SelectedApp::Home)),
            },
        };
        component.handle_input(key, &mut ctx)
    }

    fn active_mut(&mut self) -> Option<&mut dyn Component> {
        match self.state {
            AppState::Loading => None,
            AppState::Login => Some(&mut self.login),
            AppState::Register => Some(&mut self.register),
            AppState::Home => Some(&mut self.home),
            AppState::Running(_) => match self.screen.as_deref_mut() {
                Some(screen) => Some(screen),
                None => None,
            },
        }
    }

    fn active(&self) -> Option<&dyn Component> {
        match self.state {
            AppState::Loading => None,
            AppState::Login => Some(&self.login),
            AppState::Register => Some(&self.register),
            AppState::Home => Some(&self.home),
            AppState::Running(_) => self.screen.as_deref(),
        }
    }

    fn navigate(&mut self, next: SelectedApp) {
        debug!(from = ?self.state, to = ?next, role = ?self.session.role(), "navigate");
        // Screens that need a signed-in user fall back to the login screen.
        let signed_in = self.session.identity().is_some();
        let next = match next {
            SelectedApp::Home | SelectedApp::Appointments | SelectedApp::Users
            | SelectedApp::Clinics
                if !signed_in =>
            {
                warn!(target = ?next, "not signed in, showing login");
                SelectedApp::Login
            }
            other => other,
        };

        let ctx = Context {
            gateway: self.gateway.as_ref(),
            session: &mut self.session,
        };
        self.screen = None;
        self.state = match next {
            SelectedApp::Quit => {
                self.should_quit = true;
                return;
            }
            SelectedApp::Login => {
                if self.state == AppState::Home {
                    self.login.set_success_message("You have been logged out.");
                }
                AppState::Login
            }
            SelectedApp::Register => {
                self.register = Register::new();
                AppState::Register
            }
            SelectedApp::Home => {
                self.home.load(&ctx);
                AppState::Home
            }
            SelectedApp::Appointments => {
                self.screen = Some(Box::new(Appointments::open(&ctx)));
                AppState::Running(next)
            }
            SelectedApp::Doctors => {
                self.screen = Some(Box::new(Doctors::open(&ctx)));
                AppState::Running(next)
            }
            SelectedApp::Users => {
                self.screen = Some(Box::new(Users::open(&ctx)));
                AppState::Running(next)
            }
            SelectedApp::Clinics => {
                self.screen = Some(Box::new(Clinics::open(&ctx)));
                AppState::Running(next)
            }
        };
    }

    fn render_ui(&self, frame: &mut Frame) {
        if self.session.is_loading() {
            render_loading(frame);
            return;
        }
        match self.active() {
            Some(component) => component.render(frame),
            None => render_loading(frame),
        }
    }
}

fn render_loading(frame: &mut Frame) {
    paint_background(frame);
    let area = crate::components::centered_rect(40, 10, frame.area());
    frame.render_widget(
        Paragraph::new("Loading...")
            .style(
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center),
        area,
    );
}
