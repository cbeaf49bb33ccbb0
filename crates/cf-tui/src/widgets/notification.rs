//! Notification banner and the delete confirmation popup.

use super::centered_rect;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Widget, Wrap},
};

pub const SUBMITTED: &str = "Your report has been submitted.";
pub const SUBMIT_FAILED: &str = "Submission failed. Something went wrong. Please try again.";
pub const DELETED: &str = "Your report has been deleted.";
pub const DELETE_FAILED: &str = "Failed to delete the report. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

/// Outcome message shown until dismissed with `Esc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, message: message.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Failure, message: message.into() }
    }
}

/// One-row banner; the caller passes the row to draw on.
pub struct Banner<'a> {
    notification: &'a Notification,
    theme: &'a Theme,
}

impl<'a> Banner<'a> {
    pub fn new(notification: &'a Notification, theme: &'a Theme) -> Self {
        Self { notification, theme }
    }
}

impl Widget for Banner<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let style = match self.notification.kind {
            NoticeKind::Success => self.theme.notice_success,
            NoticeKind::Failure => self.theme.notice_failure,
        };
        buf.set_style(area, style);
        let line = Line::from(vec![
            Span::styled(format!(" {} ", self.notification.message), style),
            Span::styled("(Esc to dismiss)", style.add_modifier(Modifier::DIM)),
        ]);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}

/// "Delete this report?" popup.
pub struct ConfirmPopup<'a> {
    item_name: &'a str,
    theme: &'a Theme,
}

impl<'a> ConfirmPopup<'a> {
    pub fn new(item_name: &'a str, theme: &'a Theme) -> Self {
        Self { item_name, theme }
    }
}

impl Widget for ConfirmPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = centered_rect(50, 6, area);
        Clear.render(popup, buf);

        let block = Block::bordered()
            .title(" Delete report ")
            .border_style(self.theme.notice_failure);
        let inner = block.inner(popup);
        block.render(popup, buf);

        let lines = vec![
            Line::from(format!("Delete \"{}\"?", self.item_name)),
            Line::from("This cannot be undone."),
            Line::from(Span::styled(
                "y / Enter: delete    n / Esc: cancel",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ];
        Paragraph::new(lines).wrap(Wrap { trim: true }).render(inner, buf);
    }
}
