//! CampusFind TUI — ratatui dashboard over a live report feed.

pub mod app;
pub mod commands;
pub mod event;
pub mod theme;
pub mod widgets;

pub use app::App;

use cf_core::{config::Config, Identity};
use cf_feeds::{Backend, LiveFeed};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Subscribe to `backend` and run the dashboard until the user quits.
///
/// Call from outside the runtime: the event loop blocks this thread while
/// subscriptions and writes run on `runtime`.
pub fn run(
    runtime: Handle,
    backend: Arc<dyn Backend>,
    config: Config,
    identity: Option<Identity>,
) -> anyhow::Result<()> {
    let theme = theme::Theme::by_name(&config.ui.theme);
    let feed = LiveFeed::start(backend.as_ref(), &runtime, identity);
    tracing::info!(tabs = if feed.aggregator().identity().is_some() { 2 } else { 1 }, "dashboard starting");
    App::new(feed, backend, runtime, config, theme).run()
}
