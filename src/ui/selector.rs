//! Slot-based column picker.
//!
//! Up to nine column names sit in numbered slots. Stepping moves focus along
//! the slots and rotates the window once focus runs off either end; `[` / `]`
//! rotate the window directly while the focused slot stays put.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::theme::Theme;

/// Maximum number of slots displayed
pub const MAX_SLOTS: usize = 9;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotPicker {
    /// Focused slot, 0-based
    pub slot: usize,
    /// Column index shown in slot 0
    pub window_start: usize,
}

impl SlotPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the picked column among `len` candidates
    pub fn picked(&self, len: usize) -> Option<usize> {
        (len > 0).then(|| (self.window_start + self.slot) % len)
    }

    pub fn visible_slots(&self, len: usize) -> usize {
        len.min(MAX_SLOTS)
    }

    /// Rotate the window by one column; a no-op when everything fits
    pub fn rotate(&mut self, len: usize, forward: bool) {
        if len <= MAX_SLOTS {
            return;
        }
        self.window_start = if forward {
            (self.window_start + 1) % len
        } else {
            (self.window_start + len - 1) % len
        };
    }

    /// Move focus to the next or previous column, rotating when focus leaves the window
    pub fn step(&mut self, len: usize, forward: bool) {
        let visible = self.visible_slots(len);
        if visible == 0 {
            return;
        }
        if forward {
            if self.slot + 1 < visible {
                self.slot += 1;
            } else if len > MAX_SLOTS {
                self.rotate(len, true);
            } else {
                self.slot = 0;
            }
        } else if self.slot > 0 {
            self.slot -= 1;
        } else if len > MAX_SLOTS {
            self.rotate(len, false);
        } else {
            self.slot = visible - 1;
        }
    }

    /// Keep the state valid after the candidate list changes
    pub fn clamp(&mut self, len: usize) {
        if len == 0 {
            *self = Self::default();
            return;
        }
        self.window_start %= len;
        let visible = self.visible_slots(len);
        if self.slot >= visible {
            self.slot = visible - 1;
        }
    }

    pub fn can_rotate(&self, len: usize) -> bool {
        len > MAX_SLOTS
    }
}

/// One-line bar listing the slots, with the picked one highlighted
pub struct SlotBar<'a> {
    label: &'a str,
    names: &'a [String],
    picker: &'a SlotPicker,
    theme: &'a Theme,
}

impl<'a> SlotBar<'a> {
    pub fn new(label: &'a str, names: &'a [String], picker: &'a SlotPicker, theme: &'a Theme) -> Self {
        SlotBar {
            label,
            names,
            picker,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let len = self.names.len();
        let label_style = if focused {
            self.theme.focused_border_style()
        } else {
            self.theme.title_style()
        };
        let mut spans = vec![Span::styled(format!("{}: ", self.label), label_style)];

        if self.picker.can_rotate(len) {
            spans.push(Span::styled("< ", self.theme.dimmed_style()));
        }

        for slot in 0..self.picker.visible_slots(len) {
            let idx = (self.picker.window_start + slot) % len;
            let style = if slot == self.picker.slot {
                self.theme.highlight_style()
            } else {
                self.theme.normal_style()
            };
            spans.push(Span::styled(format!("[{}] ", slot + 1), self.theme.dimmed_style()));
            spans.push(Span::styled(self.names[idx].clone(), style));
            spans.push(Span::styled("  ", Style::default()));
        }

        if self.picker.can_rotate(len) {
            spans.push(Span::styled(">", self.theme.dimmed_style()));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picked_wraps_around_window() {
        let picker = SlotPicker {
            slot: 4,
            window_start: 10,
        };
        assert_eq!(picker.picked(12), Some(2));
        assert_eq!(SlotPicker::new().picked(0), None);
    }

    #[test]
    fn test_rotate_only_when_overflowing() {
        let mut picker = SlotPicker::new();
        picker.rotate(9, true);
        assert_eq!(picker.window_start, 0);

        picker.rotate(12, false);
        assert_eq!(picker.window_start, 11);
        picker.rotate(12, true);
        picker.rotate(12, true);
        assert_eq!(picker.window_start, 1);
    }

    #[test]
    fn test_step_moves_slot_then_rotates() {
        let mut picker = SlotPicker::new();
        // three columns: cycle within the slots
        picker.step(3, false);
        assert_eq!(picker.picked(3), Some(2));
        picker.step(3, true);
        assert_eq!(picker.picked(3), Some(0));

        // twelve columns: leaving slot 9 rotates the window
        let mut picker = SlotPicker { slot: 8, window_start: 0 };
        picker.step(12, true);
        assert_eq!(picker.slot, 8);
        assert_eq!(picker.picked(12), Some(9));
    }

    #[test]
    fn test_clamp() {
        let mut picker = SlotPicker { slot: 7, window_start: 15 };
        picker.clamp(6);
        assert_eq!(picker, SlotPicker { slot: 5, window_start: 3 });

        picker.clamp(0);
        assert_eq!(picker, SlotPicker::default());
    }
}
