//! Detail pane showing every field of the selected report.

use crate::theme::Theme;
use cf_core::{Identity, ItemReport};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};

pub struct ItemDetail<'a> {
    item: Option<&'a ItemReport>,
    identity: Option<&'a Identity>,
    date_format: &'a str,
    theme: &'a Theme,
}

impl<'a> ItemDetail<'a> {
    pub fn new(
        item: Option<&'a ItemReport>,
        identity: Option<&'a Identity>,
        date_format: &'a str,
        theme: &'a Theme,
    ) -> Self {
        Self { item, identity, date_format, theme }
    }
}

impl Widget for ItemDetail<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title("Details")
            .border_style(self.theme.border_unfocused);
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(item) = self.item else {
            return;
        };

        let label = Style::default().add_modifier(Modifier::BOLD);
        let field = |name: &'static str, value: String| {
            Line::from(vec![Span::styled(format!("{name:<10}"), label), Span::raw(value)])
        };

        let mut lines = vec![
            Line::from(Span::styled(
                item.item_name.clone(),
                self.theme.type_style(item.kind).add_modifier(Modifier::UNDERLINED),
            )),
            Line::default(),
            field("Type", item.kind.to_string()),
            field("Category", item.category.to_string()),
            field("Location", item.location.clone()),
            field("Date", item.date.format(self.date_format).to_string()),
            field(
                "Reported",
                item.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            ),
            field(
                "By",
                item.user_email
                    .clone()
                    .or_else(|| item.user_id.clone())
                    .unwrap_or_else(|| "anonymous".to_string()),
            ),
        ];
        if let Some(url) = &item.image_url {
            lines.push(field("Image", url.clone()));
        }
        lines.push(Line::default());
        lines.push(Line::from(item.description.clone()));

        if self.identity.is_some_and(|me| item.is_owned_by(me)) {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "Your report (d to delete)",
                Style::default().add_modifier(Modifier::DIM),
            )));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}
