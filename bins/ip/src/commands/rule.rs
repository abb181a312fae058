//! ip rule command implementation.

use clap::{Args, Subcommand};
use rtnl::Result;
use rtnl::netlink::Session;
use rtnl::netlink::types::family;
use rtnl::output::{OutputFormat, OutputOptions};

use super::{load_names, print_list};

#[derive(Args)]
pub struct RuleCmd {
    #[command(subcommand)]
    action: Option<RuleAction>,
}

#[derive(Subcommand)]
enum RuleAction {
    /// Show routing policy rules.
    Show,
}

impl RuleCmd {
    pub async fn run(
        self,
        format: OutputFormat,
        opts: &OutputOptions,
        family: Option<u8>,
    ) -> Result<()> {
        let RuleAction::Show = self.action.unwrap_or(RuleAction::Show);

        let mut session = Session::open()?;
        let names = load_names(&mut session).await?;
        let rules = session.get_rules(family.unwrap_or(family::AF_INET)).await?;
        print_list(&rules, &names, format, opts)
    }
}
