//! campusfind — headless commands behind the `campusfind` binary.
//!
//! The dashboard itself lives in `cf-tui`; this crate adds the one-shot
//! `feed`, `report` and `delete` commands, which go through the same stores
//! and the same [`FeedAggregator`](cf_core::FeedAggregator) as the dashboard.

use anyhow::Context;
use cf_core::{
    FeedFilters, Identity, ImageUpload, ItemId, ItemReport, ItemType, ReportDraft,
};
use cf_feeds::{Backend, LiveFeed};
use chrono::NaiveDate;
use std::{io::Write, path::Path};
use tokio::runtime::Handle;

/// How `feed` prints reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One aligned line per report.
    #[default]
    Table,
    /// One JSON document per line.
    Jsonl,
}

/// Subscribe to both collections, wait for the first snapshots, and return
/// the derived feed for `filters`.
pub async fn load_feed(
    backend: &dyn Backend,
    identity: Option<Identity>,
    filters: FeedFilters,
) -> Vec<ItemReport> {
    let mut feed = LiveFeed::start(backend, &Handle::current(), identity);
    feed.aggregator_mut().set_filters(filters);
    feed.wait_loaded().await;
    feed.aggregator().feed().to_vec()
}

/// Print `items` in `format`.
pub fn write_feed(
    out: &mut impl Write,
    items: &[ItemReport],
    format: OutputFormat,
    date_format: &str,
) -> anyhow::Result<()> {
    for item in items {
        match format {
            OutputFormat::Jsonl => {
                serde_json::to_writer(&mut *out, item)?;
                writeln!(out)?;
            }
            OutputFormat::Table => writeln!(out, "{}", table_row(item, date_format))?,
        }
    }
    Ok(())
}

fn table_row(item: &ItemReport, date_format: &str) -> String {
    let badge = match item.kind {
        ItemType::Lost => "LOST",
        ItemType::Found => "FOUND",
    };
    format!(
        "{badge:<5}  {date}  {name:<30}  {category:<11}  {location:<24}  {id}",
        date = item.date.format(date_format),
        name = truncate(&item.item_name, 30),
        category = item.category.to_string(),
        location = truncate(&item.location, 24),
        id = item.id,
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

/// Read an image from disk for upload.
pub fn load_image(path: &Path) -> anyhow::Result<ImageUpload> {
    let data = std::fs::read(path)
        .with_context(|| format!("could not read image {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ImageUpload::new(file_name, data))
}

/// Validate `draft` against `today` and create the report.
pub async fn submit_report(
    backend: &dyn Backend,
    draft: ReportDraft,
    today: NaiveDate,
    owner: Option<Identity>,
) -> anyhow::Result<ItemId> {
    let report = draft.validate(today).context("report is invalid")?;
    let id = backend.create_report(report, owner).await?;
    Ok(id)
}

/// Delete a report owned by `requester`.
pub async fn delete_report(
    backend: &dyn Backend,
    kind: ItemType,
    id: ItemId,
    requester: Option<Identity>,
) -> anyhow::Result<()> {
    let requester = requester.context("deleting a report requires --user-id")?;
    backend.delete_report(kind, id, requester).await?;
    Ok(())
}
