//! Played notes strip

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::ViewState;

pub fn render_history(frame: &mut Frame, area: Rect, view: &ViewState) {
    let block = Block::default()
        .title(" Played (newest first) ")
        .borders(Borders::ALL);

    let spans: Vec<Span> = view
        .played_notes
        .iter()
        .enumerate()
        .map(|(i, name)| {
            // Fade older entries
            let color = if i == 0 { Color::White } else { Color::Gray };
            Span::styled(format!("{name} "), Style::default().fg(color))
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
