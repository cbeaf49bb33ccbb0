//! Ratatui widgets for the CampusFind TUI.

pub mod command_bar;
pub mod help;
pub mod item_detail;
pub mod item_list;
pub mod notification;
pub mod query_bar;
pub mod report_form;
pub mod tab_bar;
pub mod text_input;

use ratatui::layout::Rect;

/// A `width` × `height` rect centred in `area`, clipped to fit.
pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}
