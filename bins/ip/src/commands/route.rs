//! ip route command implementation.

use clap::{Args, Subcommand};
use rtnl::Result;
use rtnl::netlink::Session;
use rtnl::netlink::names::table_id;
use rtnl::netlink::types::family;
use rtnl::output::{OutputFormat, OutputOptions};

use super::{dev_index, load_names, print_list};

fn parse_table(s: &str) -> std::result::Result<u32, String> {
    table_id(s).ok_or_else(|| format!("invalid table \"{s}\""))
}

#[derive(Args)]
pub struct RouteCmd {
    #[command(subcommand)]
    action: Option<RouteAction>,
}

#[derive(Subcommand)]
enum RouteAction {
    /// Show routes.
    Show {
        /// Table name or id; `all` shows every table.
        #[arg(long, short, default_value = "main", value_parser = parse_table)]
        table: u32,

        /// Only routes leaving through this device.
        #[arg(long)]
        dev: Option<String>,
    },
}

impl RouteCmd {
    pub async fn run(
        self,
        format: OutputFormat,
        opts: &OutputOptions,
        family: Option<u8>,
    ) -> Result<()> {
        let (table, dev) = match self.action {
            Some(RouteAction::Show { table, dev }) => (table, dev),
            None => (254, None),
        };

        let mut session = Session::open()?;
        let names = load_names(&mut session).await?;
        let oif = dev.as_deref().map(|d| dev_index(&names, d)).transpose()?;

        let routes: Vec<_> = session
            .get_routes(family.unwrap_or(family::AF_INET))
            .await?
            .into_iter()
            .filter(|r| table == 0 || r.table() == table)
            .filter(|r| oif.is_none() || r.oif() == oif)
            .collect();

        print_list(&routes, &names, format, opts)
    }
}
