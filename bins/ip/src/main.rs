//! ip command - routing netlink inspection and monitoring.

mod commands;

use clap::{Parser, Subcommand};
use rtnl::netlink::types::family;
use rtnl::output::{OutputFormat, OutputOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ip", version, about = "Routing netlink configuration tool")]
struct Cli {
    /// Use IPv4 only.
    #[arg(short = '4', conflicts_with = "ipv6")]
    ipv4: bool,

    /// Use IPv6 only.
    #[arg(short = '6')]
    ipv6: bool,

    /// Output JSON.
    #[arg(short = 'j', long)]
    json: bool,

    /// Pretty print JSON.
    #[arg(short = 'p', long)]
    pretty: bool,

    /// Show statistics.
    #[arg(short = 's', long)]
    stats: bool,

    /// Show details.
    #[arg(short = 'd', long)]
    details: bool,

    /// Don't resolve names.
    #[arg(short = 'n', long)]
    numeric: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage network interfaces.
    #[command(visible_alias = "l")]
    Link(commands::link::LinkCmd),

    /// Manage IP addresses.
    #[command(visible_alias = "a", visible_alias = "addr")]
    Address(commands::address::AddressCmd),

    /// Show routing tables.
    #[command(visible_alias = "r")]
    Route(commands::route::RouteCmd),

    /// Show the ARP/NDP cache.
    #[command(visible_alias = "n", visible_alias = "neigh")]
    Neighbor(commands::neighbor::NeighborCmd),

    /// Show routing policy rules.
    #[command(visible_alias = "ru")]
    Rule(commands::rule::RuleCmd),

    /// Show IPv6 address labels.
    #[command(visible_alias = "addrl")]
    Addrlabel(commands::addrlabel::AddrlabelCmd),

    /// Show per-device network configuration.
    Netconf(commands::netconf::NetconfCmd),

    /// Show network namespace ids.
    #[command(visible_alias = "ns")]
    Netns(commands::netns::NetnsCmd),

    /// Monitor netlink events.
    #[command(visible_alias = "m", visible_alias = "mon")]
    Monitor(commands::monitor::MonitorCmd),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let opts = OutputOptions {
        stats: cli.stats,
        details: cli.details,
        numeric: cli.numeric,
        pretty: cli.pretty,
    };

    let family = match (cli.ipv4, cli.ipv6) {
        (true, false) => Some(family::AF_INET),
        (false, true) => Some(family::AF_INET6),
        _ => None,
    };

    let result = match cli.command {
        Command::Link(cmd) => cmd.run(format, &opts).await,
        Command::Address(cmd) => cmd.run(format, &opts, family).await,
        Command::Route(cmd) => cmd.run(format, &opts, family).await,
        Command::Neighbor(cmd) => cmd.run(format, &opts, family).await,
        Command::Rule(cmd) => cmd.run(format, &opts, family).await,
        Command::Addrlabel(cmd) => cmd.run(format, &opts).await,
        Command::Netconf(cmd) => cmd.run(format, &opts, family).await,
        Command::Netns(cmd) => cmd.run(format, &opts).await,
        Command::Monitor(cmd) => cmd.run(format, &opts, family).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
