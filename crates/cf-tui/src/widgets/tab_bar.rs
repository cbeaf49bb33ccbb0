//! Tab bar: "All Items" and, with an identity, "My Reports".

use crate::theme::Theme;
use cf_core::Scope;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Tabs, Widget},
};

pub fn tab_label(scope: Scope) -> &'static str {
    match scope {
        Scope::All => "All Items",
        Scope::Mine => "My Reports",
    }
}

/// Renders the 1-line strip of tabs at the top of the screen. The active tab
/// is highlighted and a loading marker follows the tabs until both
/// collections have arrived. Keybinding hints are right-aligned in the same row.
pub struct TabBar<'a> {
    tabs: &'a [Scope],
    active: Scope,
    loading: bool,
    _theme: &'a Theme,
}

impl<'a> TabBar<'a> {
    pub fn new(tabs: &'a [Scope], active: Scope, loading: bool, theme: &'a Theme) -> Self {
        Self { tabs, active, loading, _theme: theme }
    }
}

impl Widget for TabBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let labels: Vec<Line> = self
            .tabs
            .iter()
            .enumerate()
            .map(|(i, scope)| Line::from(format!(" {}:{} ", i + 1, tab_label(*scope))))
            .collect();
        let selected = self.tabs.iter().position(|s| *s == self.active).unwrap_or(0);

        Tabs::new(labels)
            .select(selected)
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .divider("")
            .render(area, buf);

        if self.loading {
            let used: u16 = self
                .tabs
                .iter()
                .map(|s| tab_label(*s).len() as u16 + 4)
                .sum();
            buf.set_string(
                area.x + used + 1,
                area.y,
                "● loading",
                Style::default().add_modifier(Modifier::DIM),
            );
        }

        let hint = " n:new  ?:help  q:quit ";
        let hint_x = area.right().saturating_sub(hint.len() as u16);
        buf.set_string(
            hint_x,
            area.y,
            hint,
            Style::default().add_modifier(Modifier::DIM),
        );
    }
}
