//! On-screen piano keyboard widget and mouse hit testing
//!
//! White keys sit side by side; each black key straddles the boundary
//! between its two white neighbours over the top three fifths:
//!
//! ```text
//!  ┌───┬█┬─┬█┬───┬───┬█┬─
//!  │   │█│ │█│   │   │█│
//!  │   └┬┘ └┬┘   │   └┬┘
//!  │ z  │ x  │ c  │ v  │
//!  └────┴────┴────┴────┴─
//! ```

use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Color, Style},
    widgets::Widget,
};

use grand_dsp::input::{KeyboardLayout, PianoKey};
use grand_dsp::pitch::Pitch;

const MAX_WHITE_WIDTH: u16 = 6;
const MIN_WHITE_WIDTH: u16 = 3;

struct Geometry {
    white_width: u16,
    black_height: u16,
}

impl Geometry {
    fn new(area: Rect, layout: &KeyboardLayout) -> Self {
        let whites = layout.white_keys().count().max(1) as u16;
        Self {
            white_width: (area.width / whites).clamp(MIN_WHITE_WIDTH, MAX_WHITE_WIDTH),
            black_height: area.height * 3 / 5,
        }
    }

    /// Column span (relative to the area) of the white key at `index`
    fn white_span(&self, index: usize) -> (u16, u16) {
        let start = index as u16 * self.white_width;
        (start, start + self.white_width)
    }

    /// Column span of a black key whose left white neighbour is at `index`
    fn black_span(&self, index: usize) -> (u16, u16) {
        let boundary = (index as u16 + 1) * self.white_width;
        let half = (self.white_width / 3).max(1);
        (boundary.saturating_sub(half), boundary + half)
    }
}

/// Index among white keys of the white key just left of black key `key`
fn left_white_index(layout: &KeyboardLayout, key: &PianoKey) -> Option<usize> {
    let left = key.pitch.checked_sub(1)?;
    layout.white_keys().position(|k| k.pitch == left)
}

/// Pitch under a terminal cell, if any.
pub fn pitch_at(area: Rect, layout: &KeyboardLayout, column: u16, row: u16) -> Option<Pitch> {
    if !area.contains(Position::new(column, row)) {
        return None;
    }
    let geom = Geometry::new(area, layout);
    let x = column - area.x;
    let y = row - area.y;

    if y < geom.black_height {
        let black = layout.black_keys().find(|key| {
            left_white_index(layout, key).is_some_and(|i| {
                let (start, end) = geom.black_span(i);
                x >= start && x < end
            })
        });
        if let Some(key) = black {
            return Some(key.pitch);
        }
    }

    let index = (x / geom.white_width) as usize;
    layout.white_keys().nth(index).map(|k| k.pitch)
}

pub struct KeyboardWidget<'a> {
    layout: &'a KeyboardLayout,
}

impl<'a> KeyboardWidget<'a> {
    pub fn new(layout: &'a KeyboardLayout) -> Self {
        Self { layout }
    }
}

impl Widget for KeyboardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height < 2 {
            return;
        }
        let geom = Geometry::new(area, self.layout);
        let right = area.x + area.width;
        let bottom = area.y + area.height;

        for (i, key) in self.layout.white_keys().enumerate() {
            let (start, end) = geom.white_span(i);
            let x0 = area.x + start;
            if x0 >= right {
                break;
            }
            let width = (end - start).min(right - x0);
            let bg = if key.pressed { Color::LightBlue } else { Color::White };
            buf.set_style(
                Rect::new(x0, area.y, width.saturating_sub(1), area.height),
                Style::default().bg(bg),
            );
            // Gap between keys
            for y in area.y..bottom {
                buf.set_string(x0 + width - 1, y, "│", Style::default().fg(Color::DarkGray));
            }

            let label_style = Style::default().fg(Color::Black).bg(bg);
            if let Some(binding) = key.binding {
                buf.set_string(x0 + 1, bottom - 1, binding.to_string(), label_style);
            }
            if key.pitch % 12 == 0 && area.height > 2 {
                buf.set_string(x0 + 1, bottom - 2, &key.name, label_style);
            }
        }

        for key in self.layout.black_keys() {
            let Some(index) = left_white_index(self.layout, key) else {
                continue;
            };
            let (start, end) = geom.black_span(index);
            let x0 = area.x + start;
            if x0 >= right {
                continue;
            }
            let width = (end - start).min(right - x0);
            let bg = if key.pressed { Color::Blue } else { Color::Black };
            buf.set_style(
                Rect::new(x0, area.y, width, geom.black_height),
                Style::default().bg(bg),
            );
            if let (Some(binding), true) = (key.binding, geom.black_height > 0) {
                buf.set_string(
                    x0 + width / 2,
                    area.y + geom.black_height - 1,
                    binding.to_string(),
                    Style::default().fg(Color::Gray).bg(bg),
                );
            }
        }
    }
}
