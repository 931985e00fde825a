//! Screens of the client and the widgets they share.

use crate::api::Gateway;
use crate::app::SelectedApp;
use crate::session::Session;
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Clear, Paragraph, TableState},
};
use std::time::{Duration, Instant};

pub mod appointments;
pub mod clinics;
pub mod doctors;
pub mod home;
pub mod login;
pub mod register;
pub mod users;

/// What a screen may touch while handling a key.
pub struct Context<'a> {
    pub gateway: &'a dyn Gateway,
    pub session: &'a mut Session,
}

pub trait Component {
    fn handle_input(
        &mut self,
        event: KeyEvent,
        ctx: &mut Context<'_>,
    ) -> Result<Option<SelectedApp>>;
    fn render(&self, frame: &mut Frame);
    /// Called on every tick.
    fn tick(&mut self) {}
}

/// Colors shared by every screen.
pub mod theme {
    use ratatui::style::Color;

    pub const BACKGROUND: Color = Color::Rgb(16, 16, 28);
    pub const PANEL: Color = Color::Rgb(22, 22, 35);
    pub const INPUT: Color = Color::Rgb(26, 26, 36);
    pub const BORDER: Color = Color::Rgb(75, 75, 120);
    pub const HIGHLIGHT: Color = Color::Rgb(40, 40, 65);
    pub const TITLE: Color = Color::Rgb(230, 230, 250);
    pub const TEXT: Color = Color::Rgb(200, 200, 220);
    pub const IDLE: Color = Color::Rgb(180, 180, 200);
    pub const HELP: Color = Color::Rgb(140, 140, 170);
    pub const FOCUS: Color = Color::Rgb(250, 250, 110);
    pub const ACCENT: Color = Color::Rgb(129, 199, 245);
    pub const SUCCESS: Color = Color::Rgb(140, 219, 140);
    pub const ERROR: Color = Color::Rgb(255, 100, 100);
}

pub const BANNER: [&str; 3] = [
    "╔═╗╦  ╦╔╗╔╦╔═╗╔═╗",
    "║  ║  ║║║║║║  ╠═╣",
    "╚═╝╩═╝╩╝╚╝╩╚═╝╩ ╩",
];

const NOTICE_TIMEOUT: Duration = Duration::from_secs(5);

/// A one-line message that disappears after five seconds.
#[derive(Debug, Default)]
pub struct Notice {
    message: Option<(String, bool, Instant)>,
}

impl Notice {
    pub fn error(&mut self, message: impl Into<String>) {
        self.message = Some((message.into(), true, Instant::now()));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.message = Some((message.into(), false, Instant::now()));
    }

    pub fn clear(&mut self) {
        self.message = None;
    }

    pub fn expire(&mut self) {
        if let Some((_, _, shown)) = &self.message {
            if shown.elapsed() >= NOTICE_TIMEOUT {
                self.message = None;
            }
        }
    }

    #[cfg(test)]
    pub fn text(&self) -> Option<&str> {
        self.message.as_ref().map(|(text, _, _)| text.as_str())
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if let Some((text, is_error, _)) = &self.message {
            let color = if *is_error { theme::ERROR } else { theme::SUCCESS };
            let paragraph = Paragraph::new(text.as_str())
                .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
                .alignment(Alignment::Center);
            frame.render_widget(paragraph, area);
        }
    }
}

/// A Yes/No dialog.
#[derive(Debug, Default)]
pub struct Confirm {
    selected: usize,
}

impl Confirm {
    /// `Some(true)` on Yes, `Some(false)` when dismissed, `None` while open.
    pub fn handle_input(&mut self, key: KeyEvent) -> Option<bool> {
        match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                self.selected = 1 - self.selected;
                None
            }
            KeyCode::Enter => Some(self.selected == 0),
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(true),
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => Some(false),
            _ => None,
        }
    }

    pub fn render(&self, frame: &mut Frame, title: &str, question: &str) {
        let area = centered_rect(50, 20, frame.area());
        let block = Block::default()
            .title(format!(" {title} "))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::BORDER))
            .style(Style::default().bg(theme::PANEL));

        let choice = |label: &'static str, index: usize, color: Color| {
            let style = if self.selected == index {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme::HELP)
            };
            Span::styled(label, style)
        };

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(question, Style::default().fg(theme::TITLE))),
            Line::from(""),
            Line::from(vec![
                choice(" Yes ", 0, theme::SUCCESS),
                Span::raw("    "),
                choice(" No ", 1, theme::ERROR),
            ]),
        ];

        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(text)
                .block(block)
                .alignment(Alignment::Center),
            area,
        );
    }
}

/// Applies a typing key to `field`. Returns whether it was consumed.
///
/// Ctrl and Alt chords are shortcuts, not text.
pub fn edit(field: &mut String, key: KeyEvent) -> bool {
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return false;
    }
    match key.code {
        KeyCode::Char(c) => {
            field.push(c);
            true
        }
        KeyCode::Backspace => {
            field.pop();
            true
        }
        _ => false,
    }
}

/// Moves a table selection one row, wrapping at either end.
pub fn step(state: &mut TableState, len: usize, forward: bool) {
    if len == 0 {
        state.select(None);
        return;
    }
    let next = match state.selected() {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None => 0,
    };
    state.select(Some(next));
}

/// Keeps a selection inside a list that may have shrunk.
pub fn clamp(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
    } else {
        state.select(Some(state.selected().unwrap_or(0).min(len - 1)));
    }
}

pub fn paint_background(frame: &mut Frame) {
    frame.render_widget(
        Block::default().style(Style::default().bg(theme::BACKGROUND)),
        frame.area(),
    );
}

/// Screen title over a bottom rule.
pub fn header(frame: &mut Frame, area: Rect, title: &str) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(theme::BORDER))
        .style(Style::default().bg(theme::BACKGROUND));
    frame.render_widget(block, area);

    let title = Paragraph::new(title)
        .style(
            Style::default()
                .fg(theme::TITLE)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    frame.render_widget(title, area);
}

pub fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::BORDER))
        .style(Style::default().bg(theme::PANEL))
}

pub fn input<'a>(label: &'a str, value: &'a str, focused: bool) -> Paragraph<'a> {
    let border = if focused { theme::FOCUS } else { theme::BORDER };
    let text = if focused {
        format!("{value}▏")
    } else {
        value.to_string()
    };
    Paragraph::new(text)
        .style(Style::default().fg(theme::TEXT).bg(theme::INPUT))
        .block(
            Block::default()
                .title(format!(" {label} "))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(border)),
        )
}

pub fn button(label: &str, focused: bool) -> Paragraph<'static> {
    let (text, style) = if focused {
        (
            format!("► {label} ◄"),
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (format!("  {label}  "), Style::default().fg(theme::IDLE))
    };
    Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Center)
}

pub fn help(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(Style::default().fg(theme::HELP))
        .alignment(Alignment::Center)
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn step_wraps_both_ways() {
        let mut state = TableState::default();
        step(&mut state, 3, true);
        assert_eq!(state.selected(), Some(0));
        step(&mut state, 3, false);
        assert_eq!(state.selected(), Some(2));
        step(&mut state, 3, true);
        assert_eq!(state.selected(), Some(0));

        step(&mut state, 0, true);
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn clamp_follows_a_shrinking_list() {
        let mut state = TableState::default();
        state.select(Some(4));
        clamp(&mut state, 2);
        assert_eq!(state.selected(), Some(1));
        clamp(&mut state, 0);
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn confirm_defaults_to_yes_and_toggles() {
        let mut dialog = Confirm::default();
        assert_eq!(dialog.handle_input(key(KeyCode::Right)), None);
        assert_eq!(dialog.handle_input(key(KeyCode::Enter)), Some(false));

        let mut dialog = Confirm::default();
        assert_eq!(dialog.handle_input(key(KeyCode::Enter)), Some(true));
        assert_eq!(dialog.handle_input(key(KeyCode::Esc)), Some(false));
    }

    #[test]
    fn edit_handles_typing_and_backspace() {
        let mut field = String::new();
        assert!(edit(&mut field, key(KeyCode::Char('a'))));
        assert!(edit(&mut field, key(KeyCode::Char('b'))));
        assert!(edit(&mut field, key(KeyCode::Backspace)));
        assert!(!edit(&mut field, key(KeyCode::Enter)));
        assert_eq!(field, "a");
    }

    #[test]
    fn edit_ignores_ctrl_and_alt_chords() {
        let mut field = String::from("ab");
        let ctrl_w = KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL);
        let alt_x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT);
        assert!(!edit(&mut field, ctrl_w));
        assert!(!edit(&mut field, alt_x));

        let shifted = KeyEvent::new(KeyCode::Char('C'), KeyModifiers::SHIFT);
        assert!(edit(&mut field, shifted));
        assert_eq!(field, "abC");
    }

    #[test]
    fn notice_keeps_fresh_messages() {
        let mut notice = Notice::default();
        notice.error("Invalid credentials");
        notice.expire();
        assert_eq!(notice.text(), Some("Invalid credentials"));
        notice.clear();
        assert_eq!(notice.text(), None);
    }

    #[test]
    fn centered_rect_stays_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 20, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 10);
        assert_eq!(inner.x, 20);
    }
}
