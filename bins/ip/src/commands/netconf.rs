//! ip netconf command implementation.

use clap::{Args, Subcommand};
use rtnl::Result;
use rtnl::netlink::Session;
use rtnl::netlink::types::family;
use rtnl::output::{OutputFormat, OutputOptions};

use super::{dev_index, load_names, print_list};

#[derive(Args)]
pub struct NetconfCmd {
    #[command(subcommand)]
    action: Option<NetconfAction>,
}

#[derive(Subcommand)]
enum NetconfAction {
    /// Show configuration, optionally for one device.
    Show {
        /// Interface name.
        #[arg(long)]
        dev: Option<String>,
    },
}

impl NetconfCmd {
    pub async fn run(
        self,
        format: OutputFormat,
        opts: &OutputOptions,
        family: Option<u8>,
    ) -> Result<()> {
        let dev = match self.action {
            Some(NetconfAction::Show { dev }) => dev,
            None => None,
        };

        let mut session = Session::open()?;
        let names = load_names(&mut session).await?;
        let ifindex = dev.as_deref().map(|d| dev_index(&names, d)).transpose()?;

        let entries: Vec<_> = session
            .get_netconf(family.unwrap_or(family::AF_UNSPEC))
            .await?
            .into_iter()
            .filter(|c| ifindex.is_none_or(|i| c.ifindex() == Some(i as i32)))
            .collect();

        print_list(&entries, &names, format, opts)
    }
}
