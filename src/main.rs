use campusfind::OutputFormat;
use cf_core::{
    config::{Config, StoreBackend},
    Category, CategoryFilter, FeedFilters, Identity, ItemId, ItemType, ReportDraft, Scope,
    TypeFilter,
};
use cf_feeds::Backend;
use clap::{Parser, Subcommand, ValueEnum};
use std::{io, path::PathBuf, sync::Arc};

#[derive(Parser)]
#[command(name = "campusfind", about = "CampusFind — campus lost-and-found reports in your terminal")]
struct Cli {
    /// Write debug logs to /tmp/campusfind-debug.log (tail -f to inspect).
    #[arg(long)]
    debug: bool,

    /// Config file to use instead of ~/.config/campusfind/config.toml.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Store backend (overrides [store] backend).
    #[arg(long, value_enum)]
    store: Option<StoreArg>,

    /// Directory for the `dir` store (overrides [store] data_dir).
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Act as this user (overrides [identity] user_id).
    #[arg(long, value_name = "UID")]
    user_id: Option<String>,

    /// Contact email recorded on new reports (overrides [identity] email).
    #[arg(long)]
    email: Option<String>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Clone, Copy, ValueEnum)]
enum StoreArg {
    Memory,
    Dir,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the feed once both collections have loaded.
    Feed {
        #[arg(long, default_value = "all")]
        scope: Scope,
        #[arg(long = "type", default_value = "all")]
        kind: TypeFilter,
        #[arg(long, default_value = "all")]
        category: CategoryFilter,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Report a lost or found item.
    Report {
        #[arg(long = "type")]
        kind: ItemType,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: Category,
        #[arg(long)]
        location: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Photo to attach.
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
    },
    /// Delete one of your reports.
    Delete {
        #[arg(long = "type")]
        kind: ItemType,
        #[arg(long)]
        id: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("/tmp/campusfind-debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
        tracing::info!("campusfind debug log started; tail -f /tmp/campusfind-debug.log");
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "config unreadable; using defaults");
            Config::defaults()
        }),
    };
    if let Some(store) = cli.store {
        config.store.backend = match store {
            StoreArg::Memory => StoreBackend::Memory,
            StoreArg::Dir => StoreBackend::Dir,
        };
    }
    if let Some(dir) = cli.data_dir.clone() {
        config.store.data_dir = Some(dir);
    }
    if cli.user_id.is_some() {
        config.identity.user_id = cli.user_id.clone();
    }
    if cli.email.is_some() {
        config.identity.email = cli.email.clone();
    }
    let identity: Option<Identity> = config.identity.identity();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let backend = cf_feeds::open_backend(&config.store)?;

    let Some(command) = cli.command else {
        return cf_tui::run(runtime.handle().clone(), backend, config, identity);
    };

    runtime.block_on(run_command(command, backend, config, identity))
}

async fn run_command(
    command: Cmd,
    backend: Arc<dyn Backend>,
    config: Config,
    identity: Option<Identity>,
) -> anyhow::Result<()> {
    match command {
        Cmd::Feed { scope, kind, category, search, format } => {
            let filters = FeedFilters { scope, kind, category, search };
            let items = campusfind::load_feed(backend.as_ref(), identity, filters).await;
            let mut out = io::stdout().lock();
            campusfind::write_feed(&mut out, &items, format, &config.ui.date_format)
        }
        Cmd::Report { kind, name, description, category, location, date, image } => {
            let image = image.as_deref().map(campusfind::load_image).transpose()?;
            let draft = ReportDraft {
                kind: Some(kind),
                item_name: name,
                description,
                category: Some(category),
                location,
                date,
                image,
            };
            let today = chrono::Local::now().date_naive();
            let id = campusfind::submit_report(backend.as_ref(), draft, today, identity).await?;
            println!("{id}");
            Ok(())
        }
        Cmd::Delete { kind, id } => {
            campusfind::delete_report(backend.as_ref(), kind, ItemId(id), identity).await?;
            println!("deleted");
            Ok(())
        }
    }
}
