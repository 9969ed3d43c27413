//! TUI module for grand
//!
//! Draws the keyboard, recording status and meters. Pure rendering: all
//! state lives in the app and arrives here as a `ViewState`.

mod history;
pub mod keyboard;
mod state;
mod status;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub use state::{AudioStatus, MeterUpdate, ViewState};

use history::render_history;
use keyboard::KeyboardWidget;
use status::render_status;

/// Draw the whole screen. Returns the area the keyboard was drawn in, for
/// mouse hit testing.
pub fn render(frame: &mut Frame, view: &ViewState) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status bar
            Constraint::Min(8),    // Keyboard
            Constraint::Length(3), // Played notes
            Constraint::Length(1), // Help bar
        ])
        .split(frame.area());

    render_status(frame, chunks[0], view);

    let keyboard_block = Block::default().title(" Piano ").borders(Borders::ALL);
    let keyboard_area = keyboard_block.inner(chunks[1]);
    frame.render_widget(keyboard_block, chunks[1]);
    frame.render_widget(KeyboardWidget::new(view.layout), keyboard_area);

    render_history(frame, chunks[2], view);

    let release_hint = if view.key_releases {
        ""
    } else {
        "  (keys auto-release)"
    };
    let help = Paragraph::new(format!(
        " [z..m q..u] Play  [Mouse] Play/drag  [Double-click] All off  [Tab] Record  [Esc] Quit{release_hint}"
    ))
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[3]);

    keyboard_area
}
