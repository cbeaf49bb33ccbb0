//! Query bar — search input plus the active type and category filters, at the
//! bottom of the screen.
//!
//! The app shell pushes the search text into the aggregator on every edit, so
//! the list narrows as you type.

use super::text_input::TextInput;
use crate::event::AppEvent;
use crate::theme::Theme;
use cf_core::FeedFilters;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction as LayoutDir, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct QueryBarState {
    pub input: TextInput,
}

impl QueryBarState {
    /// Apply an editing event. Returns `true` if the search text changed.
    pub fn handle(&mut self, event: &AppEvent) -> bool {
        let changed = self.input.handle(event);
        if changed {
            tracing::debug!(search = %self.input.value, "query: edited");
        }
        changed
    }

    pub fn text(&self) -> &str {
        &self.input.value
    }
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

pub struct QueryBar<'a> {
    state: &'a QueryBarState,
    filters: &'a FeedFilters,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> QueryBar<'a> {
    pub fn new(
        state: &'a QueryBarState,
        filters: &'a FeedFilters,
        focused: bool,
        theme: &'a Theme,
    ) -> Self {
        Self { state, filters, focused, theme }
    }

    /// Absolute terminal position of the text cursor. Pass to
    /// `frame.set_cursor_position()` after rendering.
    pub fn cursor_position(&self, area: Rect) -> (u16, u16) {
        let x = (area.x + 1 + self.state.input.cursor_col()).min(area.right().saturating_sub(1));
        (x, area.y + 1)
    }
}

impl Widget for QueryBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            self.theme.border_focused
        } else {
            self.theme.border_unfocused
        };

        let block = Block::bordered().title("Search").border_style(border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(LayoutDir::Horizontal)
            .constraints([Constraint::Fill(1), Constraint::Length(36)])
            .split(inner);

        let query_line = if self.state.input.is_empty() && !self.focused {
            Line::from(Span::styled(
                "press / to search",
                Style::default().add_modifier(Modifier::DIM),
            ))
        } else {
            Line::from(self.state.input.value.as_str())
        };
        Paragraph::new(query_line).render(chunks[0], buf);

        let dim = Style::default().add_modifier(Modifier::DIM);
        let filters = Line::from(vec![
            Span::styled("type:", dim),
            Span::raw(format!("{} ", self.filters.kind)),
            Span::styled("category:", dim),
            Span::raw(self.filters.category.to_string()),
        ]);
        Paragraph::new(filters).render(chunks[1], buf);
    }
}
