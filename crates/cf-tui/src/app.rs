//! Top-level application state and the main event loop.
//!
//! [`App::run`] sets up the terminal, drives the crossterm event loop, and
//! tears everything down cleanly on exit or panic. Each frame drains pending
//! feed updates and finished store writes before drawing, so every change is
//! applied on this thread.

use crate::{
    commands::{execute_command, Command},
    event::{self, AppEvent, Keymap},
    theme::Theme,
    widgets::{
        command_bar::{CommandBar, CommandBarState},
        help::HelpPopup,
        item_detail::ItemDetail,
        item_list::{ItemList, ItemListState},
        notification::{self, Banner, ConfirmPopup, Notification},
        query_bar::{QueryBar, QueryBarState},
        report_form::{ReportForm, ReportFormState},
        tab_bar::TabBar,
    },
};
use cf_core::{
    config::Config, Category, Identity, ItemId, ItemReport, ItemType, Scope,
};
use cf_feeds::{Backend, LiveFeed};
use crossterm::{
    event::{self as ct_event, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction as LayoutDir, Layout, Rect},
    Frame, Terminal,
};
use std::{io, sync::Arc, time::Duration};
use tokio::{runtime::Handle, sync::mpsc};

// ---------------------------------------------------------------------------
// Focus + background results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Search,
    /// Vim-style `:` command line is active.
    Command,
    /// The report form popup is open.
    Form,
}

/// A report the user asked to delete, waiting for confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub kind: ItemType,
    pub id: ItemId,
    pub item_name: String,
}

/// Result of a store write, sent back from its background task.
#[derive(Debug)]
pub enum TaskOutcome {
    /// `form` is the generation of the form that was submitted.
    Submitted { form: u64, result: Result<ItemId, String> },
    Deleted(Result<(), String>),
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub feed: LiveFeed,
    pub backend: Arc<dyn Backend>,
    pub runtime: Handle,
    pub identity: Option<Identity>,
    /// Visible tabs; `Mine` only with an identity.
    pub tabs: Vec<Scope>,
    pub focus: Focus,
    /// Focus before entering command mode, restored on exit.
    pub prev_focus: Focus,
    pub list: ItemListState,
    pub query: QueryBarState,
    pub command_bar: CommandBarState,
    pub form: Option<ReportFormState>,
    pub confirm: Option<PendingDelete>,
    pub notification: Option<Notification>,
    pub theme: Theme,
    pub config: Config,
    pub keymap: Keymap,
    pub show_help: bool,
    pub quit: bool,
    /// Bumped each time a form opens, so late outcomes skip newer forms.
    form_generation: u64,
    outcomes_tx: mpsc::UnboundedSender<TaskOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<TaskOutcome>,
}

impl AppState {
    fn today(&self) -> chrono::NaiveDate {
        chrono::Local::now().date_naive()
    }

    pub fn selected(&self) -> Option<&ItemReport> {
        self.feed.aggregator().feed().get(self.list.cursor)
    }

    pub fn select_scope(&mut self, scope: Scope) {
        if !self.tabs.contains(&scope) {
            tracing::debug!(?scope, "scope unavailable without identity");
            self.notification = Some(Notification::failure(
                "Set an identity (--user-id) to see your reports.",
            ));
            return;
        }
        tracing::debug!(?scope, "scope selected");
        self.feed.aggregator_mut().set_scope(scope);
        self.list.scroll_to_top();
    }

    pub fn cycle_type(&mut self) {
        let next = self.feed.aggregator().filters().kind.cycle(&ItemType::ALL);
        tracing::debug!(filter = %next, "type filter");
        self.feed.aggregator_mut().set_type_filter(next);
        self.list.scroll_to_top();
    }

    pub fn cycle_category(&mut self) {
        let next = self.feed.aggregator().filters().category.cycle(&Category::ALL);
        tracing::debug!(filter = %next, "category filter");
        self.feed.aggregator_mut().set_category_filter(next);
        self.list.scroll_to_top();
    }

    pub fn open_form(&mut self) {
        tracing::debug!("report form opened");
        self.form_generation += 1;
        self.form = Some(ReportFormState::new(self.today()));
        self.focus = Focus::Form;
    }

    pub fn close_form(&mut self) {
        tracing::debug!("report form closed");
        self.form = None;
        self.focus = Focus::List;
    }

    /// Ask for confirmation to delete the selected report, if it is ours.
    pub fn request_delete(&mut self) {
        let Some(item) = self.selected() else {
            return;
        };
        let owned = self.identity.as_ref().is_some_and(|me| item.is_owned_by(me));
        let pending = PendingDelete {
            kind: item.kind,
            id: item.id.clone(),
            item_name: item.item_name.clone(),
        };
        if owned {
            self.confirm = Some(pending);
        } else {
            self.notification = Some(Notification::failure("You can only delete your own reports."));
        }
    }

    /// Validate the open form and, if it passes, create the report in the
    /// background.
    fn submit_form(&mut self) {
        let today = self.today();
        let Some(form) = self.form.as_mut() else {
            return;
        };
        if form.submitting {
            return;
        }
        let Some(report) = form.submit(today) else {
            tracing::debug!(errors = %form.errors, "report form invalid");
            return;
        };
        form.submitting = true;

        let backend = Arc::clone(&self.backend);
        let owner = self.identity.clone();
        let tx = self.outcomes_tx.clone();
        let form = self.form_generation;
        self.runtime.spawn(async move {
            let result = backend.create_report(report, owner).await.map_err(|e| e.to_string());
            let _ = tx.send(TaskOutcome::Submitted { form, result });
        });
    }

    fn confirm_delete(&mut self) {
        let Some(pending) = self.confirm.take() else {
            return;
        };
        let Some(requester) = self.identity.clone() else {
            return;
        };
        tracing::debug!(id = %pending.id, "deleting report");
        let backend = Arc::clone(&self.backend);
        let tx = self.outcomes_tx.clone();
        self.runtime.spawn(async move {
            let result = backend
                .delete_report(pending.kind, pending.id, requester)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(TaskOutcome::Deleted(result));
        });
    }

    /// Apply one finished store write.
    pub fn apply_outcome(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Submitted { form, result: Ok(id) } => {
                tracing::debug!(%id, "report submitted");
                if self.form.is_some() && form == self.form_generation {
                    self.close_form();
                }
                self.notification = Some(Notification::success(notification::SUBMITTED));
            }
            TaskOutcome::Submitted { form, result: Err(e) } => {
                tracing::warn!(error = %e, "report submission failed");
                if form == self.form_generation {
                    if let Some(open) = self.form.as_mut() {
                        open.submitting = false;
                    }
                }
                self.notification = Some(Notification::failure(notification::SUBMIT_FAILED));
            }
            TaskOutcome::Deleted(Ok(())) => {
                self.notification = Some(Notification::success(notification::DELETED));
            }
            TaskOutcome::Deleted(Err(e)) => {
                tracing::warn!(error = %e, "report deletion failed");
                self.notification = Some(Notification::failure(notification::DELETE_FAILED));
            }
        }
    }

    /// Apply feed updates and finished writes that have arrived since the last
    /// frame.
    pub fn pump(&mut self) {
        self.feed.drain();
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            self.apply_outcome(outcome);
        }
        let total = self.feed.aggregator().feed().len();
        self.list.clamp(total);
    }

    /// Wait for the next background write to finish and apply it.
    pub async fn next_outcome(&mut self) -> bool {
        match self.outcomes_rx.recv().await {
            Some(outcome) => {
                self.apply_outcome(outcome);
                true
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    state: AppState,
}

impl App {
    pub fn new(
        feed: LiveFeed,
        backend: Arc<dyn Backend>,
        runtime: Handle,
        config: Config,
        theme: Theme,
    ) -> Self {
        let identity = feed.aggregator().identity().cloned();
        let mut tabs = vec![Scope::All];
        if identity.is_some() {
            tabs.push(Scope::Mine);
        }
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();

        let state = AppState {
            feed,
            backend,
            runtime,
            identity,
            tabs,
            focus: Focus::List,
            prev_focus: Focus::List,
            list: ItemListState::new(config.ui.show_dates),
            query: QueryBarState::default(),
            command_bar: CommandBarState::default(),
            form: None,
            confirm: None,
            notification: None,
            theme,
            keymap: Keymap::from_config(&config.keybindings),
            config,
            show_help: false,
            quit: false,
            form_generation: 0,
            outcomes_tx,
            outcomes_rx,
        };

        App { state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    /// Set up the terminal, run the event loop, and restore the terminal on exit.
    pub fn run(mut self) -> anyhow::Result<()> {
        install_panic_hook();

        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);

        // Always restore terminal, even if the loop returned an error
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        loop {
            self.state.pump();
            {
                let s = &self.state;
                terminal.draw(|frame| draw(frame, s))?;
            }

            if self.state.quit {
                break;
            }

            if ct_event::poll(Duration::from_millis(16))? {
                match ct_event::read()? {
                    Event::Key(key) if key.kind == ct_event::KeyEventKind::Press => {
                        let raw = Event::Key(key);
                        let app_event = if is_insert_mode(self.state.focus) {
                            event::to_app_event_insert(raw)
                        } else {
                            event::to_app_event(raw, &self.state.keymap)
                        };
                        if let Some(ev) = app_event {
                            tracing::debug!(focus = ?self.state.focus, event = ?ev, "key event");
                            self.handle(ev);
                        }
                    }
                    other => {
                        if let Some(ev) = event::to_app_event(other, &self.state.keymap) {
                            self.handle(ev);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn handle(&mut self, event: AppEvent) {
        let s = &mut self.state;

        // Help popup intercepts all events; only close keys pass through.
        if s.show_help {
            if matches!(event, AppEvent::Char('?') | AppEvent::Escape | AppEvent::Quit) {
                tracing::debug!("help popup closed");
                s.show_help = false;
            }
            return;
        }

        // Delete confirmation intercepts all events.
        if s.confirm.is_some() {
            match event {
                AppEvent::Char('y') | AppEvent::Enter => s.confirm_delete(),
                AppEvent::Char('n') | AppEvent::Escape | AppEvent::Quit => {
                    tracing::debug!("delete cancelled");
                    s.confirm = None;
                }
                _ => {}
            }
            return;
        }

        if s.focus == Focus::Command {
            match event {
                AppEvent::Escape => {
                    tracing::debug!("command bar cancelled");
                    s.command_bar.clear();
                    s.focus = s.prev_focus;
                }
                AppEvent::Enter => {
                    let input = s.command_bar.input.value.clone();
                    match Command::parse(&input) {
                        Ok(cmd) => {
                            tracing::debug!(command = ?cmd, "executing command");
                            s.command_bar.clear();
                            s.focus = s.prev_focus;
                            execute_command(s, cmd);
                        }
                        Err(msg) if msg.is_empty() => {
                            s.command_bar.clear();
                            s.focus = s.prev_focus;
                        }
                        Err(msg) => {
                            s.command_bar.error = Some(msg);
                        }
                    }
                }
                AppEvent::Quit => s.quit = true,
                other => s.command_bar.handle(&other),
            }
            return;
        }

        if s.focus == Focus::Form {
            match event {
                AppEvent::Escape => s.close_form(),
                AppEvent::Enter => s.submit_form(),
                AppEvent::Quit => s.quit = true,
                other => {
                    if let Some(form) = s.form.as_mut() {
                        form.handle(&other);
                    }
                }
            }
            return;
        }

        if s.focus == Focus::Search {
            match event {
                AppEvent::Escape | AppEvent::Enter | AppEvent::FocusNext => {
                    tracing::debug!("focus: Search -> List");
                    s.focus = Focus::List;
                }
                AppEvent::Quit => s.quit = true,
                other => {
                    if s.query.handle(&other) {
                        let term = s.query.text().to_string();
                        s.feed.aggregator_mut().set_search(term);
                        s.list.scroll_to_top();
                    }
                }
            }
            return;
        }

        match event {
            AppEvent::Char('?') => {
                tracing::debug!("help popup opened");
                s.show_help = true;
            }
            AppEvent::Char(':') => {
                tracing::debug!(prev_focus = ?s.focus, "entering command mode");
                s.prev_focus = s.focus;
                s.command_bar.clear();
                s.focus = Focus::Command;
            }
            AppEvent::Quit => {
                tracing::debug!("quit");
                s.quit = true;
            }
            AppEvent::Escape => {
                s.notification = None;
            }
            AppEvent::FocusNext | AppEvent::SearchFocus => {
                tracing::debug!("focus: List -> Search");
                s.focus = Focus::Search;
            }
            AppEvent::CycleType => s.cycle_type(),
            AppEvent::CycleCategory => s.cycle_category(),
            AppEvent::ScopeAll => s.select_scope(Scope::All),
            AppEvent::ScopeMine => s.select_scope(Scope::Mine),
            AppEvent::NewReport => s.open_form(),
            AppEvent::DeleteSelected => s.request_delete(),
            AppEvent::Resize(_, _) => {}
            other => {
                let total = s.feed.aggregator().feed().len();
                s.list.handle(&other, total);
            }
        }
    }
}

/// True when a text input has focus and letters should type rather than
/// trigger shortcuts.
fn is_insert_mode(focus: Focus) -> bool {
    matches!(focus, Focus::Search | Focus::Command | Focus::Form)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn draw(frame: &mut Frame, state: &AppState) {
    let area = frame.area();
    let aggregator = state.feed.aggregator();

    // Vertical: 1-line tab bar | body | 3-line query bar
    let vert = Layout::default()
        .direction(LayoutDir::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(3),
        ])
        .split(area);

    let pct = state.config.ui.detail_pane_width_pct.min(90);
    let horiz = Layout::default()
        .direction(LayoutDir::Horizontal)
        .constraints([Constraint::Fill(1), Constraint::Percentage(pct)])
        .split(vert[1]);

    let date_format = state.config.ui.date_format.as_str();
    let filters = aggregator.filters();

    frame.render_widget(
        TabBar::new(&state.tabs, filters.scope, aggregator.is_loading(), &state.theme),
        vert[0],
    );
    frame.render_widget(
        ItemList::new(&state.list, aggregator.feed(), state.focus == Focus::List, &state.theme)
            .loading(aggregator.is_loading())
            .empty_state(aggregator.empty_state())
            .search(&filters.search)
            .date_format(date_format),
        horiz[0],
    );
    frame.render_widget(
        ItemDetail::new(state.selected(), state.identity.as_ref(), date_format, &state.theme),
        horiz[1],
    );
    frame.render_widget(
        QueryBar::new(&state.query, filters, state.focus == Focus::Search, &state.theme),
        vert[2],
    );

    if let Some(n) = &state.notification {
        let row = Rect { y: vert[1].y, height: 1, ..vert[1] };
        frame.render_widget(Banner::new(n, &state.theme), row);
    }

    if let Some(form) = &state.form {
        frame.render_widget(ReportForm::new(form, &state.theme), area);
        if state.focus == Focus::Form {
            if let Some(pos) = form.cursor_position(area) {
                frame.set_cursor_position(pos);
            }
        }
    }

    if let Some(pending) = &state.confirm {
        frame.render_widget(ConfirmPopup::new(&pending.item_name, &state.theme), area);
    }

    if state.show_help {
        frame.render_widget(HelpPopup::new(&state.theme), area);
    }

    // Command bar overlays the bottom row of the screen
    if state.focus == Focus::Command {
        let cmd_area = Rect { y: area.bottom().saturating_sub(1), height: 1, ..area };
        frame.render_widget(CommandBar::new(&state.command_bar, &state.theme), cmd_area);
        let col = state.command_bar.cursor_col(cmd_area);
        frame.set_cursor_position((col, cmd_area.y));
        return;
    }

    if state.focus == Focus::Search {
        let qb = QueryBar::new(&state.query, filters, true, &state.theme);
        frame.set_cursor_position(qb.cursor_position(vert[2]));
    }
}

// ---------------------------------------------------------------------------
// Terminal helpers
// ---------------------------------------------------------------------------

fn install_panic_hook() {
    let original = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original(info);
    }));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
