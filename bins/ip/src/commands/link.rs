//! ip link command implementation.

use std::io::{self, Write};
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use rtnl::netlink::{Session, Transport};
use rtnl::netlink::counters::CounterTracker;
use rtnl::output::{OutputFormat, OutputOptions};
use rtnl::{Error, Result};

use super::{matches_dev, names_from, print_list};

#[derive(Args)]
pub struct LinkCmd {
    #[command(subcommand)]
    action: Option<LinkAction>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LinkState {
    Up,
    Down,
}

#[derive(Subcommand)]
enum LinkAction {
    /// Show link information.
    Show {
        /// Interface name or index.
        dev: Option<String>,
    },

    /// Set link state.
    Set {
        /// Interface name.
        dev: String,

        /// New administrative state.
        #[arg(value_enum)]
        state: LinkState,
    },

    /// Print flag, state and counter changes at a fixed interval.
    Counters {
        /// Seconds between samples.
        #[arg(long, short, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,

        /// Stop after this many samples.
        #[arg(long, short)]
        total: Option<u64>,

        /// Text put in front of every line.
        #[arg(long, default_value = "")]
        prefix: String,
    },
}

impl LinkCmd {
    pub async fn run(self, format: OutputFormat, opts: &OutputOptions) -> Result<()> {
        match self.action.unwrap_or(LinkAction::Show { dev: None }) {
            LinkAction::Show { dev } => Self::show(dev.as_deref(), format, opts).await,
            LinkAction::Set { dev, state } => Self::set(&dev, state).await,
            LinkAction::Counters {
                interval,
                total,
                prefix,
            } => Self::counters(Duration::from_secs(interval), total, &prefix, format).await,
        }
    }

    async fn show(dev: Option<&str>, format: OutputFormat, opts: &OutputOptions) -> Result<()> {
        let mut session = Session::open()?;
        let all_links = session.get_links().await?;
        let names = names_from(&all_links);

        let links: Vec<_> = all_links
            .into_iter()
            .filter(|link| dev.is_none_or(|d| matches_dev(link, d)))
            .collect();

        if let Some(dev) = dev
            && links.is_empty()
        {
            return Err(Error::InterfaceNotFound { name: dev.into() });
        }

        print_list(&links, &names, format, opts)
    }

    async fn set(dev: &str, state: LinkState) -> Result<()> {
        let mut session = Session::open()?;
        let ifindex = session.resolve_ifindex(dev).await?;
        match state {
            LinkState::Up => session.set_link_up(ifindex).await,
            LinkState::Down => session.set_link_down(ifindex).await,
        }
    }

    async fn counters(
        every: Duration,
        total: Option<u64>,
        prefix: &str,
        format: OutputFormat,
    ) -> Result<()> {
        let mut session = Session::open()?;
        let samples =
            sample_counters(&mut session, every, total, prefix, format, &mut io::stdout()).await?;
        tracing::debug!(samples, "counters finished");
        session.close().await;
        Ok(())
    }
}

/// Sample links on one session until `total` samples have been taken.
///
/// A closed transport ends sampling without an error. Returns the number of
/// samples taken.
async fn sample_counters<T: Transport>(
    session: &mut Session<T>,
    every: Duration,
    total: Option<u64>,
    prefix: &str,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<u64> {
    let mut tracker = CounterTracker::new();
    let mut ticker = tokio::time::interval(every);
    let mut samples = 0u64;

    loop {
        ticker.tick().await;
        let links = match session.get_links().await {
            Ok(links) => links,
            Err(e) if e.is_closed() => {
                tracing::debug!("netlink transport closed, stopping counters");
                break;
            }
            Err(e) => return Err(e),
        };
        let changes = tracker.update(&links);
        tracing::debug!(links = links.len(), changes = changes.len(), "sampled counters");

        for change in &changes {
            match format {
                OutputFormat::Text => writeln!(out, "{}{}", prefix, change)?,
                OutputFormat::Json => {
                    serde_json::to_writer(&mut *out, change).map_err(io::Error::from)?;
                    writeln!(out)?;
                }
            }
        }
        out.flush()?;

        samples += 1;
        if total.is_some_and(|t| samples >= t) {
            break;
        }
    }

    Ok(samples)
}
