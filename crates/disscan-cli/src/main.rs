//! disscan - asynchronous Discord invite scanner.

mod agents;
mod args;
mod normalize;
mod report;
mod resolver;
mod telemetry;

use std::sync::Arc;

use anyhow::bail;
use args::{CliArgs, ScanConfig};
use clap::Parser;
use disscan_core::impls::FileSink;
use disscan_core::{ClientBuilder, CoreError};
use normalize::InviteNormalizer;
use report::ConsoleReporter;
use resolver::InviteResolver;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    telemetry::init_tracing();
    let config = ScanConfig::try_from(args)?;

    if !config.color {
        colored::control::set_override(false);
    }
    if config.banner {
        report::print_banner();
    }

    let resolver = InviteResolver::new(&config.resolver)?;
    let mut builder = ClientBuilder::new(resolver)
        .config(config.pool.clone())
        .normalizer(InviteNormalizer);
    if config.print {
        builder = builder.observer(ConsoleReporter);
    }
    if let Some(output) = &config.output {
        builder = builder.sink(Arc::new(FileSink::new(output)));
    }
    let client = builder.build()?;

    tracing::info!(
        invites = config.invites.len(),
        lists = config.lists.len(),
        workers = config.pool.workers,
        "scan started"
    );

    let feeding = async {
        let direct = client.feed(&config.invites).await?;
        let listed = client.feed_files(&config.lists).await?;
        Ok::<_, CoreError>(direct + listed)
    };
    let fed = tokio::select! {
        fed = feeding => fed,
        _ = signal::ctrl_c() => {
            client.abort();
            bail!("interrupted, pending lookups abandoned");
        }
    };
    // whatever was accepted before a feed error still gets drained and
    // reported; the error is returned afterwards
    let feed_error = match fed {
        Ok(accepted) => {
            tracing::info!(accepted, "all input queued");
            None
        }
        Err(err) => {
            tracing::error!(error = %err, "feeding stopped early, draining what was queued");
            Some(err)
        }
    };

    // dropping the unfinished `finish` future drops the pool, which aborts
    // whatever is still running
    let summary = tokio::select! {
        summary = client.finish() => summary?,
        _ = signal::ctrl_c() => bail!("interrupted, pending lookups abandoned"),
    };

    tracing::info!(
        submitted = summary.counts.submitted,
        succeeded = summary.counts.succeeded,
        failed = summary.counts.failed,
        timed_out = summary.counts.timed_out,
        sink_writes = summary.sink_writes,
        sink_failures = summary.sink_failures,
        "scan finished"
    );
    if config.print {
        report::print_summary(&summary);
    }
    if let Some(err) = feed_error {
        return Err(err.into());
    }
    Ok(())
}
