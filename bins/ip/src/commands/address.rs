//! ip address command implementation.

use std::net::IpAddr;

use clap::{Args, Subcommand};
use rtnl::netlink::Session;
use rtnl::netlink::types::family;
use rtnl::output::{LinkAddresses, OutputFormat, OutputOptions};
use rtnl::{Error, Result};

use super::{matches_dev, names_from, print_list};

/// An `ADDR/LEN` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefix {
    pub addr: IpAddr,
    pub len: u8,
}

/// Parse `ADDR/LEN`, or a bare address as a host prefix.
pub fn parse_prefix(s: &str) -> std::result::Result<Prefix, String> {
    let (addr, len) = match s.split_once('/') {
        Some((addr, len)) => (addr, Some(len)),
        None => (s, None),
    };
    let addr: IpAddr = addr
        .parse()
        .map_err(|_| format!("invalid address \"{addr}\""))?;
    let max = if addr.is_ipv4() { 32 } else { 128 };
    let len = match len {
        Some(len) => len
            .parse::<u8>()
            .ok()
            .filter(|l| *l <= max)
            .ok_or_else(|| format!("invalid prefix length \"{len}\""))?,
        None => max,
    };
    Ok(Prefix { addr, len })
}

#[derive(Args)]
pub struct AddressCmd {
    #[command(subcommand)]
    action: Option<AddressAction>,
}

#[derive(Subcommand)]
enum AddressAction {
    /// Show addresses.
    Show {
        /// Interface name.
        dev: Option<String>,
    },

    /// Add an address.
    Add {
        /// Address with prefix (e.g., 192.168.1.1/24).
        #[arg(value_parser = parse_prefix)]
        address: Prefix,

        /// Device name.
        #[arg(long, short)]
        dev: String,
    },

    /// Delete an address.
    Del {
        /// Address with prefix.
        #[arg(value_parser = parse_prefix)]
        address: Prefix,

        /// Device name.
        #[arg(long, short)]
        dev: String,
    },
}

impl AddressCmd {
    pub async fn run(
        self,
        format: OutputFormat,
        opts: &OutputOptions,
        family: Option<u8>,
    ) -> Result<()> {
        match self.action.unwrap_or(AddressAction::Show { dev: None }) {
            AddressAction::Show { dev } => Self::show(dev.as_deref(), format, opts, family).await,
            AddressAction::Add { address, dev } => {
                let mut session = Session::open()?;
                let ifindex = session.resolve_ifindex(&dev).await?;
                session.add_address(ifindex, address.addr, address.len).await
            }
            AddressAction::Del { address, dev } => {
                let mut session = Session::open()?;
                let ifindex = session.resolve_ifindex(&dev).await?;
                session.del_address(ifindex, address.addr, address.len).await
            }
        }
    }

    async fn show(
        dev: Option<&str>,
        format: OutputFormat,
        opts: &OutputOptions,
        family: Option<u8>,
    ) -> Result<()> {
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

        let families = match family {
            Some(f) => vec![f],
            None => vec![family::AF_INET, family::AF_INET6],
        };
        let mut addrs = Vec::new();
        for f in families {
            addrs.extend(session.get_addresses(f).await?);
        }

        let groups = LinkAddresses::group(&links, &addrs);
        print_list(&groups, &names, format, opts)
    }
}
