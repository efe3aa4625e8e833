use anyhow::{Context, Result};
use clap::Parser;
use hn_comments::cache::CacheStore;
use hn_comments::config::Config;
use hn_comments::filter::{parse_keywords, KeywordFilter, MatchMode};
use hn_comments::output::{self, Destination, SortOrder};
use hn_comments::resolver::{ChildFailurePolicy, ThreadResolver};
use hn_comments::source::HackerNewsClient;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hn-comments")]
#[command(version)]
#[command(about = "Fetch and keyword-filter the comments of a Hacker News thread", long_about = None)]
struct Cli {
    /// ID of the thread whose direct comments are fetched
    #[arg(long, visible_alias = "threadID")]
    thread_id: u64,

    /// Write comments to this file; empty or '-' means stdout
    #[arg(long, visible_alias = "outFile")]
    out_file: Option<String>,

    /// Space-separated keywords, e.g. --keywords "rust remote"
    #[arg(long, default_value = "")]
    keywords: String,

    /// Keyword match mode: 'any' or 'all'
    #[arg(long, default_value = "any")]
    match_mode: MatchMode,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Override the number of comments fetched at once
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Keep going when individual comments fail to fetch
    #[arg(long)]
    skip_failed: bool,

    /// Drop any cached copy of the thread before resolving
    #[arg(long)]
    refresh: bool,

    /// Output order: 'id' or 'none'
    #[arg(long)]
    sort: Option<SortOrder>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Override log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Load the config file if given, then apply CLI overrides
    fn into_config(self) -> Result<(Config, RunArgs)> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(out_file) = self.out_file {
            config.output.destination = Some(out_file);
        }
        if let Some(dir) = self.cache_dir {
            config.cache.dir = Some(dir);
        }
        if let Some(max_concurrency) = self.max_concurrency {
            config.fetch.max_concurrency = max_concurrency;
        }
        if self.skip_failed {
            config.fetch.on_child_error = ChildFailurePolicy::Skip;
        }
        if let Some(sort) = self.sort {
            config.output.sort = sort;
        }
        if self.pretty {
            config.output.pretty = true;
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }

        config.validate()?;

        let args = RunArgs {
            thread_id: self.thread_id,
            keywords: parse_keywords(&self.keywords),
            match_mode: self.match_mode,
            refresh: self.refresh,
        };
        Ok((config, args))
    }
}

/// Long flag names that are also accepted with a single dash (`-threadID 1`,
/// `-keywords="rust remote"`), the spelling of the original flag-based CLI
const SINGLE_DASH_FLAGS: [&str; 16] = [
    "threadID",
    "thread-id",
    "outFile",
    "out-file",
    "keywords",
    "match-mode",
    "config",
    "cache-dir",
    "max-concurrency",
    "skip-failed",
    "refresh",
    "sort",
    "pretty",
    "log-level",
    "help",
    "version",
];

/// `--name[=value]` for a known long flag written with one dash
fn single_dash_long_flag(arg: &str) -> Option<String> {
    let rest = arg.strip_prefix('-')?;
    if rest.starts_with('-') {
        return None;
    }
    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
    SINGLE_DASH_FLAGS
        .contains(&name)
        .then(|| format!("-{}", arg))
}

/// Rewrite single-dash long flags, leaving everything after `--` untouched
fn normalize_single_dash_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut after_separator = false;

    args.into_iter()
        .map(|arg| {
            if after_separator {
                return arg;
            }
            let rewritten = match arg.to_str() {
                Some("--") => {
                    after_separator = true;
                    None
                }
                Some(text) => single_dash_long_flag(text),
                None => None,
            };
            rewritten.map(OsString::from).unwrap_or(arg)
        })
        .collect()
}

struct RunArgs {
    thread_id: u64,
    keywords: Vec<String>,
    match_mode: MatchMode,
    refresh: bool,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse_from(normalize_single_dash_flags(std::env::args_os()));

    let (config, args) = match cli.into_config() {
        Ok(parsed) => parsed,
        Err(e) => {
            init_logging("error");
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.log_level);

    if let Err(e) = run(config, args).await {
        error!(transport = is_transport_failure(&e), "{:#}", e);
        std::process::exit(1);
    }
}

/// Whether the failure came from the item API or the network
fn is_transport_failure(e: &anyhow::Error) -> bool {
    e.chain()
        .filter_map(|cause| cause.downcast_ref::<hn_comments::Error>())
        .any(hn_comments::Error::is_transport)
}

async fn run(config: Config, args: RunArgs) -> Result<()> {
    let cache_root = match config.cache.dir.clone() {
        Some(dir) => dir,
        None => CacheStore::default_root()?,
    };
    let cache = CacheStore::new(cache_root);

    if args.refresh && cache.remove(args.thread_id)? {
        info!(thread_id = args.thread_id, "removed cached comments");
    }

    let client = HackerNewsClient::http_client(&config.api)?;
    let source = HackerNewsClient::new(&config.api, client)?;

    let resolver = ThreadResolver::new(Arc::new(source), cache)
        .with_max_concurrency(config.fetch.max_concurrency)
        .with_failure_policy(config.fetch.on_child_error);

    let resolution = resolver
        .resolve(args.thread_id)
        .await
        .with_context(|| format!("Failed to resolve thread {}", args.thread_id))?;

    for failure in &resolution.failures {
        warn!(id = failure.id, error = %failure.error, "comment skipped");
    }
    info!(
        thread_id = args.thread_id,
        count = resolution.comments.len(),
        from_cache = resolution.from_cache,
        "resolved comments"
    );

    let filter = KeywordFilter::new(&args.keywords, args.match_mode);
    if filter.is_empty() {
        info!("no keywords supplied, keeping all comments");
    } else {
        info!(keywords = ?args.keywords, mode = ?args.match_mode, "filtering comments");
    }
    let mut comments = filter.apply(resolution.comments);
    output::sort_comments(&mut comments, config.output.sort);

    let destination = Destination::parse(config.output.destination.as_deref());
    if destination == Destination::Stdout {
        info!("no output file specified, writing to stdout");
    }

    if comments.is_empty() {
        info!(
            thread_id = args.thread_id,
            "{}",
            output::empty_result_notice(!filter.is_empty())
        );
    }

    let written = output::write_json(&comments, &destination, config.output.pretty)
        .context("Failed to write output")?;

    if written {
        info!(count = comments.len(), %destination, "output written");
    }

    Ok(())
}
