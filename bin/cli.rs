use crate::applet::Applet;
use anyhow::Error as Anyhow;
use clap::Parser;
use std::{cmp::min, io::stderr};
use tracing::{instrument, Level};
use tracing_subscriber::fmt::{format::FmtSpan, layer};
use tracing_subscriber::{filter::Targets, prelude::*, registry, util::SubscriberInitExt};

/// Play chess or validate the rules from the command line.
#[derive(Parser)]
#[clap(author, version, about)]
pub struct Cli {
    /// How much to log to the standard error.
    #[clap(short, long, default_value_t = Level::WARN)]
    verbosity: Level,

    #[clap(subcommand)]
    applet: Option<Applet>,
}

impl Cli {
    #[instrument(level = "trace", skip(self), err)]
    pub fn execute(self) -> Result<(), Anyhow> {
        subscribe(self.verbosity);
        self.applet.unwrap_or_default().execute()
    }
}

/// Logs this crate's events at `verbosity` and at most warnings from dependencies.
fn subscribe(verbosity: Level) {
    let targets = Targets::new()
        .with_targets([("cli", verbosity), ("lib", verbosity)])
        .with_default(min(Level::WARN, verbosity));

    let log = layer()
        .pretty()
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stderr);

    registry().with(log.with_filter(targets)).init();
}
