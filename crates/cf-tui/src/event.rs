//! Semantic application events: crossterm key events mapped to a
//! widget-agnostic vocabulary so widgets never touch crossterm directly.
//!
//! # Keybindings
//!
//! The keys marked *configurable* come from the `[keybindings]` section of
//! `config.toml` via [`Keymap`]; the rest are fixed.
//!
//! | Key(s)                  | Event                      |
//! |-------------------------|----------------------------|
//! | `q`, `Ctrl+c`           | `Quit`                     |
//! | `Tab` *(configurable)*  | `FocusNext`                |
//! | `/` *(configurable)*    | `SearchFocus`              |
//! | `t` *(configurable)*    | `CycleType`                |
//! | `c` *(configurable)*    | `CycleCategory`            |
//! | `n` *(configurable)*    | `NewReport`                |
//! | `d` *(configurable)*    | `DeleteSelected`           |
//! | `g` *(configurable)*    | `ScrollToTop`              |
//! | `1` / `2`               | `ScopeAll` / `ScopeMine`   |
//! | `PageUp`, `Ctrl+u`      | `ScrollUp`                 |
//! | `PageDown`, `Ctrl+d`    | `ScrollDown`               |
//! | `↑` / `k`, `↓` / `j`    | `Nav(Up)`, `Nav(Down)`     |
//! | `←` / `h`, `→` / `l`    | `Nav(Left)`, `Nav(Right)`  |
//! | printable char          | `Char(c)`                  |
//! | `Backspace`             | `Backspace`                |
//! | `Enter`                 | `Enter`                    |
//! | terminal resize         | `Resize(w, h)`             |
//!
//! ## Insert mode
//!
//! When a text input (search, command bar, report form) is focused the event
//! loop calls [`to_app_event_insert`] instead: every printable character is
//! forwarded as `Char`, arrows still navigate, and only `Ctrl+c`, `Escape`,
//! `Enter`, `Tab` and `Backspace` keep their special meaning.

use cf_core::config::KeybindingsConfig;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

/// Cardinal direction for list navigation and text-cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// A semantic application event derived from a raw crossterm [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Exit the application.
    Quit,
    /// Move keyboard focus to the next pane, or the next form field.
    FocusNext,
    /// Transfer focus to the search input.
    SearchFocus,
    /// Page the item list up.
    ScrollUp,
    /// Page the item list down.
    ScrollDown,
    /// Jump to the newest report.
    ScrollToTop,
    /// All → Lost → Found → All.
    CycleType,
    /// All → Electronics → ID Card → Book → Other → All.
    CycleCategory,
    /// Switch to the "All Items" tab.
    ScopeAll,
    /// Switch to the "My Reports" tab.
    ScopeMine,
    /// Open the report form.
    NewReport,
    /// Ask to delete the selected report.
    DeleteSelected,
    Nav(Direction),
    /// A printable character forwarded to the active text input.
    Char(char),
    Backspace,
    Enter,
    Resize(u16, u16),
    /// Dismiss the active modal (search focus, popup, notification).
    Escape,
}

// ---------------------------------------------------------------------------
// Keymap
// ---------------------------------------------------------------------------

/// The configurable part of the key mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    pub toggle_focus: KeyCode,
    pub search_focus: KeyCode,
    pub cycle_type: KeyCode,
    pub cycle_category: KeyCode,
    pub new_report: KeyCode,
    pub delete_report: KeyCode,
    pub scroll_to_top: KeyCode,
}

impl Default for Keymap {
    fn default() -> Self {
        Self::from_config(&KeybindingsConfig::default())
    }
}

impl Keymap {
    /// Resolve `[keybindings]`; unparseable entries keep their default key.
    pub fn from_config(cfg: &KeybindingsConfig) -> Self {
        let key = |name: &str, value: &str, fallback: KeyCode| {
            parse_key(value).unwrap_or_else(|| {
                tracing::warn!(binding = name, value, "unrecognised key binding; using default");
                fallback
            })
        };
        Self {
            toggle_focus: key("toggle_focus", &cfg.toggle_focus, KeyCode::Tab),
            search_focus: key("search_focus", &cfg.search_focus, KeyCode::Char('/')),
            cycle_type: key("cycle_type", &cfg.cycle_type, KeyCode::Char('t')),
            cycle_category: key("cycle_category", &cfg.cycle_category, KeyCode::Char('c')),
            new_report: key("new_report", &cfg.new_report, KeyCode::Char('n')),
            delete_report: key("delete_report", &cfg.delete_report, KeyCode::Char('d')),
            scroll_to_top: key("scroll_to_top", &cfg.scroll_to_top, KeyCode::Char('g')),
        }
    }

    fn lookup(&self, code: KeyCode) -> Option<AppEvent> {
        [
            (self.toggle_focus, AppEvent::FocusNext),
            (self.search_focus, AppEvent::SearchFocus),
            (self.cycle_type, AppEvent::CycleType),
            (self.cycle_category, AppEvent::CycleCategory),
            (self.new_report, AppEvent::NewReport),
            (self.delete_report, AppEvent::DeleteSelected),
            (self.scroll_to_top, AppEvent::ScrollToTop),
        ]
        .into_iter()
        .find(|(k, _)| *k == code)
        .map(|(_, ev)| ev)
    }
}

/// Parse a key name from config: a single character, or one of
/// `Tab`, `Enter`, `Space`, `Backspace`, `Home`, `End`, `F1`..`F12`.
pub fn parse_key(s: &str) -> Option<KeyCode> {
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c));
    }
    match s.to_ascii_lowercase().as_str() {
        "tab" => Some(KeyCode::Tab),
        "enter" => Some(KeyCode::Enter),
        "space" => Some(KeyCode::Char(' ')),
        "backspace" => Some(KeyCode::Backspace),
        "home" => Some(KeyCode::Home),
        "end" => Some(KeyCode::End),
        f if f.starts_with('f') => f[1..].parse::<u8>().ok().filter(|n| (1..=12).contains(n)).map(KeyCode::F),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Map a raw crossterm [`Event`] to an [`AppEvent`] (normal / navigation mode).
///
/// Returns `None` for events with no meaning to the application (mouse,
/// focus, paste, unbound keys).
pub fn to_app_event(event: Event, keymap: &Keymap) -> Option<AppEvent> {
    match event {
        Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        Event::Key(key) => map_key(key, keymap),
        _ => None,
    }
}

/// Map a raw crossterm [`Event`] to an [`AppEvent`] for text-input mode.
pub fn to_app_event_insert(event: Event) -> Option<AppEvent> {
    match event {
        Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        Event::Key(key) => map_key_insert(key),
        _ => None,
    }
}

fn map_key(key: KeyEvent, keymap: &Keymap) -> Option<AppEvent> {
    use KeyCode::*;
    use KeyModifiers as Mod;

    let plain = key.modifiers == Mod::NONE || key.modifiers == Mod::SHIFT;

    if plain {
        if let Some(ev) = keymap.lookup(key.code) {
            return Some(ev);
        }
    }

    match key.code {
        Char('q') if key.modifiers == Mod::NONE => Some(AppEvent::Quit),
        Char('c') if key.modifiers == Mod::CONTROL => Some(AppEvent::Quit),

        Char('1') if key.modifiers == Mod::NONE => Some(AppEvent::ScopeAll),
        Char('2') if key.modifiers == Mod::NONE => Some(AppEvent::ScopeMine),

        PageUp => Some(AppEvent::ScrollUp),
        PageDown => Some(AppEvent::ScrollDown),
        Char('u') if key.modifiers == Mod::CONTROL => Some(AppEvent::ScrollUp),
        Char('d') if key.modifiers == Mod::CONTROL => Some(AppEvent::ScrollDown),
        Home => Some(AppEvent::ScrollToTop),

        Up | Char('k') if key.modifiers == Mod::NONE => Some(AppEvent::Nav(Direction::Up)),
        Down | Char('j') if key.modifiers == Mod::NONE => Some(AppEvent::Nav(Direction::Down)),
        Left | Char('h') if key.modifiers == Mod::NONE => Some(AppEvent::Nav(Direction::Left)),
        Right | Char('l') if key.modifiers == Mod::NONE => Some(AppEvent::Nav(Direction::Right)),

        Char(c) if plain => Some(AppEvent::Char(c)),

        Backspace if key.modifiers == Mod::NONE => Some(AppEvent::Backspace),
        Enter if key.modifiers == Mod::NONE => Some(AppEvent::Enter),
        Esc => Some(AppEvent::Escape),

        _ => None,
    }
}

fn map_key_insert(key: KeyEvent) -> Option<AppEvent> {
    use KeyCode::*;
    use KeyModifiers as Mod;

    match key.code {
        Char('c') if key.modifiers == Mod::CONTROL => Some(AppEvent::Quit),

        Up => Some(AppEvent::Nav(Direction::Up)),
        Down => Some(AppEvent::Nav(Direction::Down)),
        Left => Some(AppEvent::Nav(Direction::Left)),
        Right => Some(AppEvent::Nav(Direction::Right)),

        Tab if key.modifiers == Mod::NONE => Some(AppEvent::FocusNext),

        Char(c) if key.modifiers == Mod::NONE || key.modifiers == Mod::SHIFT => {
            Some(AppEvent::Char(c))
        }

        Backspace if key.modifiers == Mod::NONE => Some(AppEvent::Backspace),
        Enter if key.modifiers == Mod::NONE => Some(AppEvent::Enter),
        Esc => Some(AppEvent::Escape),

        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
