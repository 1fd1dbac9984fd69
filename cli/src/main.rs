//! Read sensor data from the public NetAtmo API, tag it with a price and
//! attach it as encrypted transactions to the Tangle.
//!
//! Meant to run as a recurring job (e.g. from cron) against one node and
//! one buffer directory. Each invocation fetches one reading; once the
//! configured number of readings has accumulated they are sent as a
//! single chunk.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tanglefeed_cli::{pipeline, Args, RunOutcome, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let settings = Settings::resolve(args)?;

    match pipeline::run(&settings).await? {
        RunOutcome::Buffered { pending, capacity } => {
            info!(pending, capacity, "nothing sent this run");
        }
        RunOutcome::Submitted {
            readings,
            transactions,
        } => {
            info!(readings, transactions, "done");
        }
    }
    Ok(())
}
