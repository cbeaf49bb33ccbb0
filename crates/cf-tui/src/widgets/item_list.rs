//! The scrollable feed pane on the left.
//!
//! # Navigation (when pane is focused)
//!
//! | Key | Action |
//! |-----|--------|
//! | `↑` / `k` | Select the previous (newer) report |
//! | `↓` / `j` | Select the next (older) report |
//! | `PageUp` / `Ctrl+u` | Up one page |
//! | `PageDown` / `Ctrl+d` | Down one page |
//! | `g` / `Home` | Jump to the newest report |
//!
//! # Scroll semantics
//!
//! The feed is newest first, so row 0 is the top of the list. `offset` is the
//! index of the first visible row and `cursor` the index of the selected
//! report; the cursor is always kept inside the visible window.

use std::cell::Cell;

use crate::event::{AppEvent, Direction};
use crate::theme::Theme;
use cf_core::{EmptyState, ItemReport};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Widget,
    },
};

const PAGE_STEP: usize = 10;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ItemListState {
    /// Index of the first visible row.
    pub offset: usize,
    /// Index of the selected report.
    pub cursor: usize,
    /// Whether the date column is shown.
    pub show_dates: bool,
    /// Cached from the last render so `handle()` can scroll by viewport.
    last_height: Cell<usize>,
}

impl Default for ItemListState {
    fn default() -> Self {
        Self {
            offset: 0,
            cursor: 0,
            show_dates: true,
            last_height: Cell::new(20),
        }
    }
}

impl ItemListState {
    pub fn new(show_dates: bool) -> Self {
        Self { show_dates, ..Self::default() }
    }

    fn height(&self) -> usize {
        self.last_height.get().max(1)
    }

    pub fn scroll_to_top(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    /// Keep the selection valid after the feed changed length.
    pub fn clamp(&mut self, total: usize) {
        if total == 0 {
            self.scroll_to_top();
            return;
        }
        self.cursor = self.cursor.min(total - 1);
        self.follow_cursor();
    }

    fn follow_cursor(&mut self) {
        let height = self.height();
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }
    }

    /// Handle a navigation event for a feed of `total` reports.
    pub fn handle(&mut self, event: &AppEvent, total: usize) {
        if total == 0 {
            return;
        }
        let last = total - 1;

        match event {
            AppEvent::Nav(Direction::Up) => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            AppEvent::Nav(Direction::Down) => {
                self.cursor = (self.cursor + 1).min(last);
            }
            AppEvent::ScrollUp => {
                self.cursor = self.cursor.saturating_sub(PAGE_STEP);
            }
            AppEvent::ScrollDown => {
                self.cursor = (self.cursor + PAGE_STEP).min(last);
            }
            AppEvent::ScrollToTop => {
                self.scroll_to_top();
            }
            _ => return,
        }
        self.follow_cursor();
        tracing::debug!(cursor = self.cursor, offset = self.offset, "list: moved");
    }
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

pub struct ItemList<'a> {
    state: &'a ItemListState,
    items: &'a [ItemReport],
    loading: bool,
    empty: Option<EmptyState>,
    search: &'a str,
    date_format: &'a str,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> ItemList<'a> {
    pub fn new(
        state: &'a ItemListState,
        items: &'a [ItemReport],
        focused: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            state,
            items,
            loading: false,
            empty: None,
            search: "",
            date_format: "%Y-%m-%d",
            focused,
            theme,
        }
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn empty_state(mut self, empty: Option<EmptyState>) -> Self {
        self.empty = empty;
        self
    }

    /// Highlight occurrences of `term` in item names.
    pub fn search(mut self, term: &'a str) -> Self {
        self.search = term;
        self
    }

    pub fn date_format(mut self, fmt: &'a str) -> Self {
        self.date_format = fmt;
        self
    }
}

impl Widget for ItemList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            self.theme.border_focused
        } else {
            self.theme.border_unfocused
        };

        let title = format!("Reports ({})", self.items.len());
        let block = Block::bordered().title(title).border_style(border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        let height = inner.height as usize;
        self.state.last_height.set(height);

        let dim = Style::default().add_modifier(Modifier::DIM);
        if self.loading {
            Paragraph::new(Line::from(Span::styled("Loading reports…", dim))).render(inner, buf);
            return;
        }
        if self.items.is_empty() {
            let msg = self.empty.map(EmptyState::message).unwrap_or_default();
            Paragraph::new(Line::from(Span::styled(msg, dim))).render(inner, buf);
            return;
        }

        let total = self.items.len();
        let start = self.state.offset.min(total.saturating_sub(1));
        let end = (start + height).min(total);

        let lines: Vec<Line<'static>> = self.items[start..end]
            .iter()
            .enumerate()
            .map(|(row, item)| {
                let line = render_item(item, self.state.show_dates, self.date_format, self.search, self.theme);
                if start + row == self.state.cursor {
                    let style = if self.focused {
                        Style::default().add_modifier(Modifier::REVERSED)
                    } else {
                        Style::default().add_modifier(Modifier::BOLD)
                    };
                    line.patch_style(style)
                } else {
                    line
                }
            })
            .collect();

        let text_area = Rect { width: inner.width.saturating_sub(1), ..inner };
        let sb_area = Rect {
            x: inner.right().saturating_sub(1),
            width: 1,
            ..inner
        };

        Paragraph::new(lines).render(text_area, buf);

        let mut sb_state = ScrollbarState::new(total)
            .position(start)
            .viewport_content_length(height);
        StatefulWidget::render(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(None)
                .end_symbol(None),
            sb_area,
            buf,
            &mut sb_state,
        );
    }
}

// ---------------------------------------------------------------------------
// Row rendering
// ---------------------------------------------------------------------------

fn render_item(
    item: &ItemReport,
    show_dates: bool,
    date_format: &str,
    search: &str,
    theme: &Theme,
) -> Line<'static> {
    let dim = Style::default().add_modifier(Modifier::DIM);
    let mut spans: Vec<Span<'static>> = Vec::new();

    let badge = match item.kind {
        cf_core::ItemType::Lost => "LOST ",
        cf_core::ItemType::Found => "FOUND",
    };
    spans.push(Span::styled(format!("{badge} "), theme.type_style(item.kind)));

    if show_dates {
        spans.push(Span::styled(format!("{} ", item.date.format(date_format)), dim));
    }

    spans.extend(highlight(&item.item_name, search, theme.search_highlight));
    spans.push(Span::styled(" │ ".to_string(), dim));
    spans.push(Span::styled(item.category.to_string(), theme.category_style(item.category)));
    spans.push(Span::styled(format!(" @ {}", item.location), dim));

    Line::from(spans)
}

/// Split `text` into spans, styling every case-insensitive match of `term`.
fn highlight(text: &str, term: &str, style: Style) -> Vec<Span<'static>> {
    if term.is_empty() {
        return vec![Span::raw(text.to_string())];
    }
    let needle = term.to_lowercase();

    // Lowercasing may change a char's byte width, so keep the (lowered,
    // original) offset of every char boundary and only highlight matches that
    // start and end on one.
    let mut lower = String::with_capacity(text.len());
    let mut bounds = Vec::with_capacity(text.len() + 1);
    for (i, c) in text.char_indices() {
        bounds.push((lower.len(), i));
        lower.extend(c.to_lowercase());
    }
    bounds.push((lower.len(), text.len()));
    let original = |at: usize| {
        bounds.binary_search_by_key(&at, |&(l, _)| l).ok().map(|k| bounds[k].1)
    };

    let mut spans = Vec::new();
    let mut pos = 0;
    let mut from = 0;
    while let Some(found) = lower[from..].find(&needle) {
        let at = from + found;
        let end = at + needle.len();
        match (original(at), original(end)) {
            (Some(start), Some(stop)) => {
                if start > pos {
                    spans.push(Span::raw(text[pos..start].to_string()));
                }
                spans.push(Span::styled(text[start..stop].to_string(), style));
                pos = stop;
                from = end;
            }
            _ => from = at + lower[at..].chars().next().map_or(1, char::len_utf8),
        }
    }
    if pos < text.len() {
        spans.push(Span::raw(text[pos..].to_string()));
    }
    spans
}
