//! IP command implementations.

pub mod address;
pub mod addrlabel;
pub mod link;
pub mod monitor;
pub mod neighbor;
pub mod netconf;
pub mod netns;
pub mod route;
pub mod rule;

use std::io::{self, Write};

use rtnl::Result;
use rtnl::netlink::messages::LinkMessage;
use rtnl::netlink::{NameCache, Session};
use rtnl::output::{OutputFormat, OutputOptions, Printable, print_all};

/// Link group names, as iproute2 keeps them.
pub const GROUP_FILE: &str = "/etc/iproute2/group";

/// Name cache seeded from `links` plus the group names file.
pub fn names_from(links: &[LinkMessage]) -> NameCache {
    let mut names = NameCache::from_links(links);
    if let Err(e) = names.load_groups(GROUP_FILE) {
        tracing::warn!(path = GROUP_FILE, error = %e, "cannot read group names");
    }
    names
}

/// Dump links once to resolve interface names.
pub async fn load_names(session: &mut Session) -> Result<NameCache> {
    let links = session.get_links().await?;
    Ok(names_from(&links))
}

/// Print `items` to stdout in the requested format.
pub fn print_list<P: Printable>(
    items: &[P],
    names: &NameCache,
    format: OutputFormat,
    opts: &OutputOptions,
) -> Result<()> {
    let mut stdout = io::stdout().lock();
    print_all(&mut stdout, items, names, format, opts)?;
    stdout.flush()?;
    Ok(())
}

/// Match a device argument against a link, by name or by index.
pub fn matches_dev(link: &LinkMessage, dev: &str) -> bool {
    link.name().as_deref() == Some(dev) || dev.parse::<u32>().ok() == Some(link.ifindex())
}

/// Resolve a device argument through the cache; numeric indices pass through.
pub fn dev_index(names: &NameCache, dev: &str) -> Result<u32> {
    names
        .ifindex(dev)
        .or_else(|| dev.parse().ok())
        .ok_or_else(|| rtnl::Error::InterfaceNotFound { name: dev.into() })
}
