//! ip neighbor command implementation.

use clap::{Args, Subcommand};
use rtnl::Result;
use rtnl::netlink::Session;
use rtnl::netlink::types::family;
use rtnl::output::{OutputFormat, OutputOptions};

use super::{dev_index, load_names, print_list};

#[derive(Args)]
pub struct NeighborCmd {
    #[command(subcommand)]
    action: Option<NeighborAction>,
}

#[derive(Subcommand)]
enum NeighborAction {
    /// Show neighbor entries.
    Show {
        /// Interface name.
        dev: Option<String>,
    },
}

impl NeighborCmd {
    pub async fn run(
        self,
        format: OutputFormat,
        opts: &OutputOptions,
        family: Option<u8>,
    ) -> Result<()> {
        let dev = match self.action {
            Some(NeighborAction::Show { dev }) => dev,
            None => None,
        };

        let mut session = Session::open()?;
        let names = load_names(&mut session).await?;
        let ifindex = dev.as_deref().map(|d| dev_index(&names, d)).transpose()?;

        let neighbors: Vec<_> = session
            .get_neighbors(family.unwrap_or(family::AF_UNSPEC))
            .await?
            .into_iter()
            .filter(|n| ifindex.is_none_or(|i| n.ifindex() == i))
            .collect();

        print_list(&neighbors, &names, format, opts)
    }
}
