// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

use crate::{app::AppState, theme::Theme};
use cf_core::{CategoryFilter, Scope, TypeFilter};

/// A parsed, validated command ready to be executed by the app shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Quit, unless a popup is open, in which case close it
    Quit,
    // Quit regardless
    Exit,
    Help,
    Theme(String),
    // Toggle the date column in the item list
    Dates,
    // Jump to the newest report
    Top,
    Type(TypeFilter),
    Category(CategoryFilter),
    Scope(Scope),
    // Replace the search term; an empty term clears it
    Search(String),
    New,
    Delete,
}

impl Command {
    /// Parse a raw command string (the text after the `:` prefix).
    ///
    /// An empty string returns `Err("")` as a sentinel meaning "close without
    /// acting".
    pub fn parse(input: &str) -> Result<Command, String> {
        let input = input.trim();
        if input.is_empty() {
            return Err(String::new());
        }

        let (word, rest) = input
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((input, ""));

        match word {
            "q" | "quit" => Ok(Command::Quit),
            "q!" | "quit!" => Ok(Command::Exit),
            "help" => Ok(Command::Help),
            "dates" => Ok(Command::Dates),
            "top" => Ok(Command::Top),
            "new" | "report" => Ok(Command::New),
            "delete" => Ok(Command::Delete),
            "search" => Ok(Command::Search(rest.to_string())),
            "theme" if rest.is_empty() => Err("usage: theme <default|gruvbox>".to_string()),
            "theme" => Ok(Command::Theme(rest.to_string())),
            "type" => parse_arg(rest, "usage: type <all|lost|found>").map(Command::Type),
            "category" | "cat" => parse_arg(rest, "usage: category <all|electronics|id|book|other>")
                .map(Command::Category),
            "scope" => parse_arg(rest, "usage: scope <all|mine>").map(Command::Scope),
            other => Err(format!("unknown command: {other}")),
        }
    }
}

fn parse_arg<T>(rest: &str, usage: &str) -> Result<T, String>
where
    T: std::str::FromStr<Err = cf_core::types::ParseFilterError>,
{
    if rest.is_empty() {
        return Err(usage.to_string());
    }
    rest.parse().map_err(|e: cf_core::types::ParseFilterError| e.to_string())
}

/// Execute a parsed [`Command`] against the application state.
pub fn execute_command(s: &mut AppState, cmd: Command) {
    match cmd {
        Command::Quit => {
            if s.form.is_some() {
                s.close_form();
            } else {
                s.quit = true;
            }
        }
        Command::Exit => {
            s.quit = true;
        }
        Command::Help => {
            s.show_help = !s.show_help;
        }
        Command::Theme(name) => {
            s.theme = Theme::by_name(&name);
        }
        Command::Dates => {
            s.list.show_dates = !s.list.show_dates;
        }
        Command::Top => s.list.scroll_to_top(),
        Command::Type(kind) => {
            s.feed.aggregator_mut().set_type_filter(kind);
            s.list.scroll_to_top();
        }
        Command::Category(category) => {
            s.feed.aggregator_mut().set_category_filter(category);
            s.list.scroll_to_top();
        }
        Command::Scope(scope) => s.select_scope(scope),
        Command::Search(term) => {
            s.query.input = crate::widgets::text_input::TextInput::with_value(term.clone());
            s.feed.aggregator_mut().set_search(term);
            s.list.scroll_to_top();
        }
        Command::New => s.open_form(),
        Command::Delete => s.request_delete(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
