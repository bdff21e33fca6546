use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ghboard_collection::{CollectionConfig, OrderedCollection};
use ghboard_core::{weekday_name, Item, ItemId};
use ghboard_persist::{clear_order, load_order, KvStore, SqliteStore, WriteBehind};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ghboard", version, about = "GitHub dashboard: contribution stats and persisted collection order")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Peak day, longest streak and busiest weekday for a contribution calendar
    Stats {
        /// Calendar JSON: a day list or a GitHub `contributionCalendar`
        file: PathBuf,
    },
    /// Inspect or change the stored order of a collection
    Order {
        #[command(subcommand)]
        action: OrderCmd,
    },
    /// Show which items a viewport would materialize
    Window {
        /// Collection key (presets: stat-cards, pull-requests)
        #[arg(short = 'c', long = "collection", default_value = "pull-requests")]
        collection: String,
        /// Items JSON (ids or objects with `id`); generated ids when omitted
        #[arg(long = "items")]
        items: Option<PathBuf>,
        /// Number of generated items when --items is not given
        #[arg(long = "count", default_value_t = 200)]
        count: usize,
        /// Scroll offset in px
        #[arg(long = "offset", default_value_t = 0.0)]
        offset: f32,
        /// Viewport size in px
        #[arg(long = "viewport", default_value_t = 700.0)]
        viewport: f32,
    },
}

#[derive(Subcommand, Debug)]
enum OrderCmd {
    /// Print the stored order, or the merged order when --items is given
    Show {
        #[arg(short = 'c', long = "collection", default_value = "pull-requests")]
        collection: String,
        #[arg(long = "items")]
        items: Option<PathBuf>,
    },
    /// Move SOURCE to the position of TARGET and persist the result
    Move {
        #[arg(short = 'c', long = "collection", default_value = "pull-requests")]
        collection: String,
        #[arg(long = "items")]
        items: PathBuf,
        source: String,
        target: String,
    },
    /// Forget the stored order
    Reset {
        #[arg(short = 'c', long = "collection", default_value = "pull-requests")]
        collection: String,
    },
}

fn init_tracing() {
    let env = std::env::var("GHBOARD_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("GHBOARD_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid GHBOARD_METRICS_ADDR; expected host:port");
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ItemEntry {
    Id(String),
    Object {
        id: String,
        #[serde(default)]
        title: Option<String>,
    },
}

fn read_items(path: &Path) -> Result<Vec<Item<String>>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading items from {}", path.display()))?;
    let entries: Vec<ItemEntry> = serde_json::from_str(&raw).with_context(|| format!("parsing items in {}", path.display()))?;
    Ok(entries
        .into_iter()
        .map(|e| match e {
            ItemEntry::Id(id) => Item::new(id.clone(), id),
            ItemEntry::Object { id, title } => {
                let label = title.unwrap_or_else(|| id.clone());
                Item::new(id, label)
            }
        })
        .collect())
}

fn generated_items(count: usize) -> Vec<Item<String>> {
    (0..count).map(|i| Item::new(format!("item-{}", i), format!("Item {}", i))).collect()
}

fn open_store() -> Result<Arc<WriteBehind>> {
    let db = SqliteStore::open_default().context("opening ghboard store")?;
    Ok(Arc::new(WriteBehind::spawn(Arc::new(db), WriteBehind::interval_from_env())))
}

async fn close_store(store: Arc<WriteBehind>) {
    match Arc::try_unwrap(store) {
        Ok(wb) => wb.shutdown().await,
        Err(shared) => {
            let written = shared.flush();
            warn!(written, "store still shared at exit; flushed without stopping flusher");
        }
    }
}

fn mount(collection: &str, items: Vec<Item<String>>, store: &Arc<WriteBehind>) -> OrderedCollection<String> {
    let backing: Arc<dyn KvStore> = store.clone();
    let mut c = OrderedCollection::new(CollectionConfig::preset(collection), backing);
    c.set_items(items);
    c
}

fn print_ids(output: Output, ids: &[ItemId]) -> Result<()> {
    match output {
        Output::Human => {
            for (i, id) in ids.iter().enumerate() {
                println!("{:>4}  {}", i, id);
            }
        }
        Output::Json => println!("{}", serde_json::to_string_pretty(ids)?),
    }
    Ok(())
}

fn run_stats(output: Output, file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file).with_context(|| format!("reading calendar {}", file.display()))?;
    let days = ghboard_core::calendar::parse_days(&raw).with_context(|| format!("parsing calendar {}", file.display()))?;
    let summary = ghboard_stats::summarize(&days);
    counter!("cli_stats_total", 1u64);
    histogram!("cli_stats_days", days.len() as f64);
    info!(days = days.len(), total = summary.total_contributions, "stats computed");
    match output {
        Output::Human => {
            let s = &summary.stats;
            match s.peak_day {
                Some(p) => println!("peak day:        {} ({} contributions)", p.date, p.count),
                None => println!("peak day:        -"),
            }
            match s.longest_streak {
                Some(st) => println!("longest streak:  {} days", st.days),
                None => println!("longest streak:  -"),
            }
            match s.busiest_weekday {
                Some(b) => println!("busiest weekday: {} ({} contributions)", weekday_name(b.weekday), b.total_count),
                None => println!("busiest weekday: -"),
            }
            println!("current streak:  {} days", summary.current_streak);
            println!("total:           {} over {} active days", summary.total_contributions, summary.active_days);
        }
        Output::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}

async fn run_order(output: Output, action: OrderCmd) -> Result<()> {
    let store = open_store()?;
    let result = match action {
        OrderCmd::Show { collection, items } => match items {
            Some(path) => {
                let c = mount(&collection, read_items(&path)?, &store);
                print_ids(output, c.ids())
            }
            None => print_ids(output, &load_order(&*store, &collection)),
        },
        OrderCmd::Move { collection, items, source, target } => {
            let mut c = mount(&collection, read_items(&items)?, &store);
            if c.move_item(&source, &target) {
                counter!("cli_order_moves_total", 1u64);
            } else {
                warn!(collection = %collection, source = %source, target = %target, "move changed nothing");
            }
            print_ids(output, c.ids())
        }
        OrderCmd::Reset { collection } => {
            clear_order(&*store, &collection)?;
            counter!("cli_order_resets_total", 1u64);
            info!(collection = %collection, "stored order cleared");
            Ok(())
        }
    };
    close_store(store).await;
    result
}

#[derive(Serialize)]
struct WindowRow<'a> {
    index: usize,
    id: &'a str,
    label: &'a str,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

#[derive(Serialize)]
struct WindowReport<'a> {
    start_index: usize,
    end_index: usize,
    total_size: f32,
    items: Vec<WindowRow<'a>>,
}

async fn run_window(output: Output, collection: &str, items: Vec<Item<String>>, offset: f32, viewport: f32) -> Result<()> {
    let store = open_store()?;
    let mut c = mount(collection, items, &store);
    c.set_viewport(offset, viewport);
    let vis = c.visible();
    let report = WindowReport {
        start_index: vis.window.start_index,
        end_index: vis.window.end_index,
        total_size: vis.window.total_size,
        items: vis
            .items
            .iter()
            .map(|v| WindowRow { index: v.index, id: v.id, label: v.payload, x: v.rect.x, y: v.rect.y, width: v.rect.width, height: v.rect.height })
            .collect(),
    };
    match output {
        Output::Human => {
            println!("window {}..{} of {} (total {}px)", report.start_index, report.end_index, c.len(), report.total_size);
            println!("INDEX  ID                    Y        HEIGHT");
            for r in &report.items {
                println!("{:<6} {:<21} {:<8} {}", r.index, r.id, r.y, r.height);
            }
        }
        Output::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    drop(c);
    close_store(store).await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { file } => run_stats(cli.output, &file)?,
        Commands::Order { action } => run_order(cli.output, action).await?,
        Commands::Window { collection, items, count, offset, viewport } => {
            let items = match items {
                Some(path) => read_items(&path)?,
                None => generated_items(count),
            };
            info!(collection = %collection, items = items.len(), offset, viewport, "window invoked");
            run_window(cli.output, &collection, items, offset, viewport).await?
        }
    }

    Ok(())
}
