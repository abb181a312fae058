//! ip addrlabel command implementation.

use clap::{Args, Subcommand};
use rtnl::Result;
use rtnl::netlink::{NameCache, Session};
use rtnl::output::{OutputFormat, OutputOptions};

use super::print_list;

#[derive(Args)]
pub struct AddrlabelCmd {
    #[command(subcommand)]
    action: Option<AddrlabelAction>,
}

#[derive(Subcommand)]
enum AddrlabelAction {
    /// List address labels.
    #[command(visible_alias = "list")]
    Show,
}

impl AddrlabelCmd {
    pub async fn run(self, format: OutputFormat, opts: &OutputOptions) -> Result<()> {
        let AddrlabelAction::Show = self.action.unwrap_or(AddrlabelAction::Show);

        let mut session = Session::open()?;
        let labels = session.get_addrlabels().await?;
        print_list(&labels, &NameCache::new(), format, opts)
    }
}
