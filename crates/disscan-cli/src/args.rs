use std::path::PathBuf;
use std::time::Duration;

use anyhow::bail;
use clap::Parser;
use disscan_core::PoolConfig;

use crate::resolver::{DEFAULT_API_BASE, ResolverOptions};

pub const MIN_THREADS: usize = 1;
pub const MAX_THREADS: usize = 32;

/// A small asynchronous Discord invite scanner.
///
/// Examples:
///
///   disscan -i GeometryDash -f invites.txt
///
///   disscan -i discord.gg/invite_1 -i discord.gg/invite_2 -o found.jsonl
#[derive(Parser, Debug, Clone)]
#[command(name = "disscan", version, about, verbatim_doc_comment)]
pub struct CliArgs {
    /// Invite URL or bare code to scan. Repeatable.
    #[arg(short, long = "invites", value_name = "INVITE")]
    pub invites: Vec<String>,

    /// Text file with one invite per line. Repeatable.
    ///
    /// Invite URLs are reduced to their code; other lines are used as-is.
    #[arg(short = 'l', long = "lists", short_alias = 'f', value_name = "FILE")]
    pub lists: Vec<PathBuf>,

    /// Forward API requests through this proxy (http, https or socks5 URL).
    ///
    /// Environment variable: `DISSCAN_PROXY`
    #[arg(short, long, env = "DISSCAN_PROXY")]
    pub proxy: Option<String>,

    /// Append every resolved invite as one JSON line to this file.
    ///
    /// Environment variable: `DISSCAN_OUTPUT`
    #[arg(short, long, env = "DISSCAN_OUTPUT", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Number of concurrent lookups (clamped to 1..=32).
    ///
    /// Environment variable: `DISSCAN_THREADS`
    #[arg(short, long, env = "DISSCAN_THREADS", default_value_t = 2)]
    pub threads: usize,

    /// How many invites may wait in the queue before feeding pauses.
    /// 0 means no limit.
    ///
    /// Environment variable: `DISSCAN_QUEUE_LIMIT`
    #[arg(long, env = "DISSCAN_QUEUE_LIMIT", default_value_t = 100)]
    pub queue_limit: usize,

    /// Give up on a single lookup after this many seconds. 0 disables.
    ///
    /// Environment variable: `DISSCAN_TIMEOUT`
    #[arg(long, env = "DISSCAN_TIMEOUT", default_value_t = 300, value_name = "SECONDS")]
    pub timeout: u64,

    /// Base URL of the API.
    ///
    /// Environment variable: `DISSCAN_API_BASE`
    #[arg(long, env = "DISSCAN_API_BASE", default_value = DEFAULT_API_BASE, hide = true)]
    pub api_base: String,

    /// Print without colors.
    #[arg(long, env = "DISSCAN_NO_COLOR", default_value_t = false)]
    pub no_color: bool,

    /// Don't print a line per invite (output file and logs only).
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Skip the start-up banner.
    #[arg(long, default_value_t = false)]
    pub no_banner: bool,
}

/// Validated settings for one scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub invites: Vec<String>,
    pub lists: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub pool: PoolConfig,
    pub resolver: ResolverOptions,
    pub color: bool,
    pub print: bool,
    pub banner: bool,
}

impl TryFrom<CliArgs> for ScanConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.invites.is_empty() && args.lists.is_empty() {
            bail!("nothing to scan: pass --invites and/or --lists");
        }

        for list in &args.lists {
            if !list.is_file() {
                bail!("list {} does not exist or is not a file", list.display());
            }
        }

        if let Some(output) = &args.output
            && output.is_dir()
        {
            bail!("output {} is a directory", output.display());
        }

        let workers = args.threads.clamp(MIN_THREADS, MAX_THREADS);
        if workers != args.threads {
            tracing::warn!(requested = args.threads, using = workers, "thread count clamped");
        }

        let mut pool = PoolConfig::default()
            .with_workers(workers)
            .with_queue_capacity(args.queue_limit);
        if args.timeout > 0 {
            pool = pool.with_timeout(Duration::from_secs(args.timeout));
        }
        pool.validate()?;

        Ok(Self {
            invites: args.invites,
            lists: args.lists,
            output: args.output,
            pool,
            resolver: ResolverOptions {
                api_base: args.api_base,
                proxy: args.proxy,
                ..ResolverOptions::default()
            },
            color: !args.no_color,
            print: !args.quiet,
            banner: !args.no_banner,
        })
    }
}
