//! Report form popup — the fields of a new lost/found report with inline
//! validation messages under each field.
//!
//! | Key | Action |
//! |-----|--------|
//! | `Tab` / `↓` | Next field |
//! | `↑` | Previous field |
//! | `←` / `→` / `Space` | Change type or category (on those fields) |
//! | `Enter` | Submit |
//! | `Esc` | Cancel |
//!
//! The image field takes a path to a file on disk; it is read when the form
//! is submitted.

use super::{centered_rect, text_input::TextInput};
use crate::event::{AppEvent, Direction};
use crate::theme::Theme;
use cf_core::validation::Field;
use cf_core::{Category, ImageUpload, ItemType, NewReport, ReportDraft, ValidationErrors};
use chrono::NaiveDate;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Widget},
};
use std::path::Path;

const LABEL_WIDTH: u16 = 20;
const POPUP_WIDTH: u16 = 76;
const POPUP_HEIGHT: u16 = Field::ALL.len() as u16 * 2 + 4;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ReportFormState {
    pub focus: Field,
    pub kind: Option<ItemType>,
    pub item_name: TextInput,
    pub description: TextInput,
    pub category: Option<Category>,
    pub location: TextInput,
    pub date: TextInput,
    pub image_path: TextInput,
    pub errors: ValidationErrors,
    /// Set when the image path could not be read.
    pub image_error: Option<String>,
    /// A submission is in flight; further submits are ignored.
    pub submitting: bool,
}

impl ReportFormState {
    /// A blank form with the date pre-filled to `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            focus: Field::Kind,
            kind: None,
            item_name: TextInput::default(),
            description: TextInput::default(),
            category: None,
            location: TextInput::default(),
            date: TextInput::with_value(today.format("%Y-%m-%d").to_string()),
            image_path: TextInput::default(),
            errors: ValidationErrors::default(),
            image_error: None,
            submitting: false,
        }
    }

    fn focus_index(&self) -> usize {
        Field::ALL.iter().position(|f| *f == self.focus).unwrap_or(0)
    }

    fn move_focus(&mut self, forward: bool) {
        let len = Field::ALL.len();
        let i = self.focus_index();
        let next = if forward { (i + 1) % len } else { (i + len - 1) % len };
        self.focus = Field::ALL[next];
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut TextInput> {
        match field {
            Field::ItemName => Some(&mut self.item_name),
            Field::Description => Some(&mut self.description),
            Field::Location => Some(&mut self.location),
            Field::Date => Some(&mut self.date),
            Field::Image => Some(&mut self.image_path),
            Field::Kind | Field::Category => None,
        }
    }

    fn text(&self, field: Field) -> Option<&TextInput> {
        match field {
            Field::ItemName => Some(&self.item_name),
            Field::Description => Some(&self.description),
            Field::Location => Some(&self.location),
            Field::Date => Some(&self.date),
            Field::Image => Some(&self.image_path),
            Field::Kind | Field::Category => None,
        }
    }

    /// Handle an editing or navigation key. `Enter` and `Escape` belong to
    /// the app shell.
    pub fn handle(&mut self, event: &AppEvent) {
        match event {
            AppEvent::FocusNext | AppEvent::Nav(Direction::Down) => self.move_focus(true),
            AppEvent::Nav(Direction::Up) => self.move_focus(false),
            _ => match self.focus {
                Field::Kind => {
                    if let Some(forward) = choice_step(event) {
                        self.kind = cycle_option(self.kind, &ItemType::ALL, forward);
                    }
                }
                Field::Category => {
                    if let Some(forward) = choice_step(event) {
                        self.category = cycle_option(self.category, &Category::ALL, forward);
                    }
                }
                field => {
                    if let Some(input) = self.text_mut(field) {
                        input.handle(event);
                    }
                }
            },
        }
    }

    /// The raw input as a draft, without the image.
    pub fn draft(&self) -> ReportDraft {
        ReportDraft {
            kind: self.kind,
            item_name: self.item_name.value.clone(),
            description: self.description.value.clone(),
            category: self.category,
            location: self.location.value.clone(),
            date: self.date.value.clone(),
            image: None,
        }
    }

    /// Validate the form against `today`, reading the image file if one was
    /// given. On failure the messages are stored for display and focus moves
    /// to the first offending field.
    pub fn submit(&mut self, today: NaiveDate) -> Option<NewReport> {
        let mut draft = self.draft();
        self.image_error = None;

        let path = self.image_path.value.trim();
        if !path.is_empty() {
            match load_image(Path::new(path)) {
                Ok(image) => draft.image = Some(image),
                Err(e) => {
                    tracing::debug!(path, error = %e, "image unreadable");
                    self.image_error = Some("Could not read the image file.".to_string());
                }
            }
        }

        let result = draft.validate(today);
        self.errors = match &result {
            Ok(_) => ValidationErrors::default(),
            Err(errors) => errors.clone(),
        };

        match result {
            Ok(report) if self.image_error.is_none() => Some(report),
            _ => {
                if let Some(first) = Field::ALL.iter().copied().find(|f| self.error(*f).is_some()) {
                    self.focus = first;
                }
                None
            }
        }
    }

    /// Message shown under `field`, if any.
    pub fn error(&self, field: Field) -> Option<&str> {
        if field == Field::Image {
            if let Some(e) = self.image_error.as_deref() {
                return Some(e);
            }
        }
        self.errors.get(field)
    }

    /// Terminal cursor position when a text field has focus.
    pub fn cursor_position(&self, area: Rect) -> Option<(u16, u16)> {
        let input = self.text(self.focus)?;
        let inner = inner_area(area);
        let y = inner.y + self.focus_index() as u16 * 2;
        let x = (inner.x + LABEL_WIDTH + input.cursor_col()).min(inner.right().saturating_sub(1));
        Some((x, y))
    }
}

fn load_image(path: &Path) -> std::io::Result<ImageUpload> {
    let data = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ImageUpload::new(file_name, data))
}

/// `Some(true)` to step forward, `Some(false)` back, `None` if not a choice key.
fn choice_step(event: &AppEvent) -> Option<bool> {
    match event {
        AppEvent::Nav(Direction::Right) | AppEvent::Char(' ') => Some(true),
        AppEvent::Nav(Direction::Left) => Some(false),
        _ => None,
    }
}

fn cycle_option<T: Copy + PartialEq>(current: Option<T>, order: &[T], forward: bool) -> Option<T> {
    let len = order.len();
    if len == 0 {
        return None;
    }
    let next = match current.and_then(|c| order.iter().position(|v| *v == c)) {
        None if forward => 0,
        None => len - 1,
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
    };
    Some(order[next])
}

fn inner_area(area: Rect) -> Rect {
    let popup = centered_rect(POPUP_WIDTH, POPUP_HEIGHT, area);
    Block::bordered().inner(popup)
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

pub struct ReportForm<'a> {
    state: &'a ReportFormState,
    theme: &'a Theme,
}

impl<'a> ReportForm<'a> {
    pub fn new(state: &'a ReportFormState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl Widget for ReportForm<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = centered_rect(POPUP_WIDTH, POPUP_HEIGHT, area);
        Clear.render(popup, buf);

        let title = if self.state.submitting {
            " Report an item — submitting… "
        } else {
            " Report an item "
        };
        let block = Block::bordered().title(title).border_style(self.theme.border_focused);
        let inner = block.inner(popup);
        block.render(popup, buf);

        let s = self.state;
        for (i, field) in Field::ALL.iter().copied().enumerate() {
            let y = inner.y + i as u16 * 2;
            if y >= inner.bottom() {
                break;
            }
            let focused = field == s.focus;
            let label_style = if focused {
                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };

            let value: Span = match field {
                Field::Kind => choice_span(s.kind.map(|k| match k {
                    ItemType::Lost => "Lost".to_string(),
                    ItemType::Found => "Found".to_string(),
                })),
                Field::Category => choice_span(s.category.map(|c| c.to_string())),
                other => Span::raw(s.text(other).map(|t| t.value.clone()).unwrap_or_default()),
            };

            let line = Line::from(vec![
                Span::styled(format!("{:<w$}", field.label(), w = LABEL_WIDTH as usize), label_style),
                value,
            ]);
            buf.set_line(inner.x, y, &line, inner.width);

            if let Some(err) = s.error(field) {
                if y + 1 < inner.bottom() {
                    let line = Line::from(Span::styled(err.to_string(), self.theme.field_error));
                    buf.set_line(inner.x + LABEL_WIDTH, y + 1, &line, inner.width.saturating_sub(LABEL_WIDTH));
                }
            }
        }

        let hint = "Tab/↑↓ move  ←→ choose  Enter submit  Esc cancel";
        if inner.height > 0 {
            buf.set_string(
                inner.x,
                inner.bottom() - 1,
                hint,
                Style::default().add_modifier(Modifier::DIM),
            );
        }
    }
}

fn choice_span(value: Option<String>) -> Span<'static> {
    match value {
        Some(v) => Span::raw(format!("‹ {v} ›")),
        None => Span::styled("‹ select ›", Style::default().add_modifier(Modifier::DIM)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn type_text(form: &mut ReportFormState, text: &str) {
        for c in text.chars() {
            form.handle(&AppEvent::Char(c));
        }
    }

    fn fill_valid(form: &mut ReportFormState) {
        form.handle(&AppEvent::Nav(Direction::Right)); // Lost
        form.handle(&AppEvent::FocusNext);
        type_text(form, "Blue Backpack");
        form.handle(&AppEvent::FocusNext);
        type_text(form, "Navy with a broken zip");
        form.handle(&AppEvent::FocusNext);
        form.handle(&AppEvent::Nav(Direction::Left)); // Other
        form.handle(&AppEvent::FocusNext);
        type_text(form, "Library");
    }

    #[test]
    fn new_form_prefills_today() {
        let form = ReportFormState::new(today());
        assert_eq!(form.date.value, "2026-10-18");
        assert_eq!(form.focus, Field::Kind);
    }

    #[test]
    fn focus_wraps_both_ways() {
        let mut form = ReportFormState::new(today());
        form.handle(&AppEvent::Nav(Direction::Up));
        assert_eq!(form.focus, Field::Image);
        form.handle(&AppEvent::FocusNext);
        assert_eq!(form.focus, Field::Kind);
    }

    #[test]
    fn choice_fields_cycle() {
        assert_eq!(cycle_option(None, &ItemType::ALL, true), Some(ItemType::Lost));
        assert_eq!(cycle_option(Some(ItemType::Found), &ItemType::ALL, true), Some(ItemType::Lost));
        assert_eq!(cycle_option(None, &Category::ALL, false), Some(Category::Other));
    }

    #[test]
    fn valid_form_submits() {
        let mut form = ReportFormState::new(today());
        fill_valid(&mut form);
        let report = form.submit(today()).expect("form should validate");
        assert_eq!(report.kind, ItemType::Lost);
        assert_eq!(report.category, Category::Other);
        assert_eq!(report.item_name, "Blue Backpack");
        assert!(form.errors.is_empty());
    }

    #[test]
    fn invalid_form_keeps_messages_and_focuses_first_error() {
        let mut form = ReportFormState::new(today());
        fill_valid(&mut form);
        form.description.clear();
        form.focus = Field::Image;
        assert!(form.submit(today()).is_none());
        assert_eq!(form.focus, Field::Description);
        assert!(form.error(Field::Description).is_some());
        assert!(form.error(Field::ItemName).is_none());
    }

    #[test]
    fn unreadable_image_blocks_submit() {
        let mut form = ReportFormState::new(today());
        fill_valid(&mut form);
        form.image_path = TextInput::with_value("/definitely/not/here.png");
        assert!(form.submit(today()).is_none());
        assert_eq!(form.error(Field::Image), Some("Could not read the image file."));
    }

    #[test]
    fn image_is_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bag.jpg");
        std::fs::write(&path, [0xffu8, 0xd8, 0xff]).unwrap();

        let mut form = ReportFormState::new(today());
        fill_valid(&mut form);
        form.image_path = TextInput::with_value(path.display().to_string());
        let report = form.submit(today()).unwrap();
        let image = report.image.unwrap();
        assert_eq!(image.file_name, "bag.jpg");
        assert_eq!(image.content_type, "image/jpeg");
        assert_eq!(image.data.len(), 3);
    }
}
