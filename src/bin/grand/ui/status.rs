//! Status bar widget - recording state, audio stats and held notes

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use grand_dsp::pitch;

use super::{AudioStatus, ViewState};

/// Render the status bar
pub fn render_status(frame: &mut Frame, area: Rect, view: &ViewState) {
    let block = Block::default().title(" grand ").borders(Borders::ALL);

    let record = if view.recording {
        Span::styled(
            format!(" ● REC {} notes  ", view.notes_recorded),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        let summary = match view.last_melody {
            Some(melody) => format!(" ■ {} notes kept  ", melody.notes.len()),
            None => " ■ idle  ".to_string(),
        };
        Span::styled(summary, Style::default().fg(Color::Yellow))
    };

    let audio = match view.audio {
        AudioStatus::Running(sr) => Span::styled(
            format!("{:.1}kHz  ", sr / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
        AudioStatus::Pending => Span::styled(
            "audio starts on first note  ",
            Style::default().fg(Color::DarkGray),
        ),
        AudioStatus::Silent => Span::styled(
            "no audio device (silent)  ",
            Style::default().fg(Color::Red),
        ),
    };

    let held: Vec<String> = view.held.iter().map(|&p| pitch::name(p)).collect();

    let line = Line::from(vec![
        record,
        audio,
        Span::styled(
            format!("Voices: {}  ", view.meter.voices),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!(
                "Peak: {:.2}  GR: {:.1}dB  ",
                view.meter.peak, view.meter.reduction_db
            ),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(held.join(" "), Style::default().fg(Color::Green)),
    ]);

    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}
