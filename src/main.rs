/// `VisitLog` - An access-log landing page explorer
///
/// Copyright (C) 2026 Daniel Freiermuth
///
/// This program is free software: you can redistribute it and/or modify
/// it under the terms of the GNU General Public License as published by
/// the Free Software Foundation, either version 3 of the License, or
/// (at your option) any later version.
///
/// This program is distributed in the hope that it will be useful,
/// but WITHOUT ANY WARRANTY; without even the implied warranty of
/// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
/// GNU General Public License for more details.
///
/// You should have received a copy of the GNU General Public License
/// along with this program.  If not, see <https://www.gnu.org/licenses/>.
use anyhow::{anyhow, Context};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use visitlog::parser::parse_timestamp;
use visitlog::{
    DateRange, FieldSchema, GlobalConfig, LogFileLoader, LogRecord, Session, SessionWorker,
    Snapshot,
};

#[cfg(feature = "ram-profiling")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[derive(Parser, Debug)]
#[command(name = "visitlog")]
#[command(author = "VisitLog Team")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
#[command(about = "Explore access logs: who visited, when, and where they landed from", long_about = None)]
struct Args {
    /// Access log files to load (.log or .txt)
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Only show entries whose email or client IP contains this text
    #[arg(short, long, value_name = "TEXT", default_value = "")]
    search: String,

    /// Start of the time range, "YYYY-MM-DD HH:MM:SS"
    #[arg(long, value_name = "TIME", requires = "to")]
    from: Option<String>,

    /// End of the time range, "YYYY-MM-DD HH:MM:SS" (inclusive)
    #[arg(long, value_name = "TIME", requires = "from")]
    to: Option<String>,

    /// Only show landing-page visits
    #[arg(short, long)]
    landing_only: bool,

    /// Use the strict 12-column layout instead of the configured one
    #[arg(long)]
    strict: bool,

    /// Origin of the site the logs belong to, e.g. `https://shop.example.com`
    #[arg(long, value_name = "URL")]
    origin: Option<String>,

    /// Config file to use instead of the one in the user config directory
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Print the visible entries as JSON
    #[arg(long)]
    json: bool,

    /// Path for the DHAT heap profiling output (only used when built with --features ram-profiling)
    #[cfg(feature = "ram-profiling")]
    #[arg(
        long = "profile-output",
        value_name = "PROFILE_FILE",
        default_value = "dhat-heap.json"
    )]
    profile_output: PathBuf,
}

impl Args {
    fn date_range(&self) -> anyhow::Result<Option<DateRange>> {
        let (Some(from), Some(to)) = (&self.from, &self.to) else {
            return Ok(None);
        };
        let start =
            parse_timestamp(from).ok_or_else(|| anyhow!("invalid --from time: {from:?}"))?;
        let end = parse_timestamp(to).ok_or_else(|| anyhow!("invalid --to time: {to:?}"))?;
        if end < start {
            return Err(anyhow!("--to is before --from"));
        }
        Ok(Some(DateRange::new(start, end)))
    }

    fn load_config(&self) -> anyhow::Result<GlobalConfig> {
        let mut config = match &self.config {
            Some(path) => GlobalConfig::load_from(path)
                .map_err(|e| anyhow!(e))
                .with_context(|| format!("loading {}", path.display()))?,
            None => GlobalConfig::load(),
        };
        if self.strict {
            config.schema = FieldSchema::strict();
        }
        if self.origin.is_some() {
            config.app_origin.clone_from(&self.origin);
        }
        Ok(config)
    }
}

fn shorten(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

fn print_table(records: &[LogRecord]) {
    println!(
        "{:<19}  {:<15}  {:<24}  {:<32}  LANDING PAGE",
        "TIMESTAMP", "IP ADDRESS", "EMAIL", "ACTION"
    );
    for record in records {
        let marker = if record.is_landing_page { "* " } else { "  " };
        println!(
            "{:<19}  {:<15}  {:<24}  {:<32}  {marker}{}",
            shorten(&record.timestamp, 19),
            shorten(&record.client_ip, 15),
            shorten(&record.email, 24),
            shorten(&record.action, 32),
            record.referrer
        );
    }
}

fn print_snapshot(snapshot: &Snapshot, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot.visible)?);
    } else {
        for file in &snapshot.files {
            eprintln!("  {}: {} entries", file.name, file.records);
        }
        print_table(&snapshot.visible);
    }
    eprintln!("{}", snapshot.summary());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set RUST_LOG environment variable to override (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        "VisitLog starting up (version {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let args = Args::parse();

    #[cfg(feature = "ram-profiling")]
    let _profiler = {
        tracing::info!("RAM profiling enabled, output: {:?}", args.profile_output);
        dhat::Profiler::builder()
            .file_name(args.profile_output.clone())
            .build()
    };

    #[cfg(feature = "cpu-profiling")]
    {
        tracing::info!("CPU profiling enabled with Tracy - run Tracy profiler to connect");
    }

    let config = args.load_config()?;
    let date_range = args.date_range()?;

    let (handle, mut status_rx, worker) = SessionWorker::spawn(
        Session::from_config(&config),
        LogFileLoader::from_config(&config),
    );

    handle.set_search_term(&args.search);
    handle.set_date_range(date_range);
    handle.set_landing_only(args.landing_only);
    for file in &args.files {
        handle.load(file.clone());
    }
    drop(handle);

    let mut failures = 0usize;
    while let Some(status) = status_rx.recv().await {
        if status.is_error() {
            failures += 1;
            eprintln!("error: {status}");
        } else {
            eprintln!("{status}");
        }
    }

    let session = worker.await.context("session worker panicked")?;
    print_snapshot(&session.snapshot(), args.json)?;

    if failures == args.files.len() {
        return Err(anyhow!("no file could be loaded"));
    }
    Ok(())
}
