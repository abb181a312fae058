//! ip netns command implementation.

use clap::{Args, Subcommand};
use rtnl::Result;
use rtnl::netlink::{NameCache, Session};
use rtnl::output::{OutputFormat, OutputOptions};

use super::print_list;

#[derive(Args)]
pub struct NetnsCmd {
    #[command(subcommand)]
    action: NetnsAction,
}

#[derive(Subcommand)]
enum NetnsAction {
    /// List namespace ids assigned in this namespace.
    ListId,

    /// Show the namespace id of the namespace a process lives in.
    Identify {
        /// Process id.
        pid: u32,
    },
}

impl NetnsCmd {
    pub async fn run(self, format: OutputFormat, opts: &OutputOptions) -> Result<()> {
        let mut session = Session::open()?;
        match self.action {
            NetnsAction::ListId => {
                let ids = session.get_nsids().await?;
                print_list(&ids, &NameCache::new(), format, opts)
            }
            NetnsAction::Identify { pid } => {
                match session.get_nsid_for_pid(pid).await? {
                    Some(nsid) if nsid >= 0 => println!("{}", nsid),
                    _ => println!("unassigned"),
                }
                Ok(())
            }
        }
    }
}
