use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use ratatui::Frame;

use crate::error::Result;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const ERROR_STYLE: Style = Style::new().fg(Color::Red).add_modifier(Modifier::BOLD);

pub const ACTIVE_TAB_STYLE: Style = Style::new()
    .fg(Color::White)
    .bg(Color::Rgb(30, 64, 175))
    .add_modifier(Modifier::BOLD);

pub const INACTIVE_TAB_STYLE: Style = Style::new().fg(Color::Gray);

pub const MUTED_ROW_STYLE: Style = Style::new().fg(Color::DarkGray);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

// ---------------------------------------------------------------------------
// Report view infrastructure
// ---------------------------------------------------------------------------

pub enum ReportViewAction {
    Continue,
    Close,
}

pub trait ReportView {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ReportViewAction;
    /// Called between input polls so background work can be picked up.
    fn tick(&mut self) {}
}

/// Run an interactive ratatui report view. Sets up the terminal, event loop,
/// and panic hook, then restores the terminal on exit.
pub fn run_report_view(view: &mut dyn ReportView) -> Result<()> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();

    let result: Result<()> = loop {
        view.tick();
        if let Err(e) = terminal.draw(|frame| view.draw(frame)) {
            break Err(e.into());
        }

        match event::poll(POLL_INTERVAL) {
            Err(e) => break Err(e.into()),
            Ok(false) => continue,
            Ok(true) => {}
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    break Ok(());
                }
                match view.handle_key(key.code) {
                    ReportViewAction::Close => break Ok(()),
                    ReportViewAction::Continue => {}
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text() {
        let (wrapped, lines) = wrap_text("alpha beta gamma", 6);
        assert_eq!(lines, 3);
        assert_eq!(wrapped, "alpha\nbeta\ngamma");
        assert_eq!(wrap_text("x", 0), ("x".to_string(), 1));
    }
}
