//! `ip`-style text and JSON rendering of decoded records.
//!
//! Formatters resolve interface indices and group ids through a
//! [`NameCache`], falling back to the numeric id when a name is unknown.
//!
//! ```ignore
//! use rtnl::netlink::{NameCache, Session};
//! use rtnl::output::{OutputFormat, OutputOptions, print_all};
//!
//! let mut session = Session::open()?;
//! let links = session.get_links().await?;
//! let names = NameCache::from_links(&links);
//! print_all(&mut std::io::stdout(), &links, &names, OutputFormat::Text, &OutputOptions::default())?;
//! ```

pub mod formatting;
pub mod monitor;
mod printable;

pub use monitor::{MonitorConfig, TimestampMode, print_record};
pub use printable::LinkAddresses;

use std::io::{self, Write};

use crate::netlink::NameCache;

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Show link statistics.
    pub stats: bool,
    /// Show extra details (lifetimes, timers, kinds).
    pub details: bool,
    /// Don't resolve names (show numeric values).
    pub numeric: bool,
    /// Pretty print (for JSON).
    pub pretty: bool,
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

/// A record that renders as `ip` text or as a JSON object.
pub trait Printable {
    /// Print as plain text, one or more newline-terminated lines.
    fn print_text<W: Write>(
        &self,
        w: &mut W,
        names: &NameCache,
        opts: &OutputOptions,
    ) -> io::Result<()>;

    /// Convert to a JSON value.
    fn to_json(&self, names: &NameCache, opts: &OutputOptions) -> serde_json::Value;

    /// Print in the specified format.
    fn print<W: Write>(
        &self,
        w: &mut W,
        names: &NameCache,
        format: OutputFormat,
        opts: &OutputOptions,
    ) -> io::Result<()> {
        match format {
            OutputFormat::Text => self.print_text(w, names, opts),
            OutputFormat::Json => write_json(w, &self.to_json(names, opts), opts),
        }
    }

    /// Render the text form into a string.
    fn to_text(&self, names: &NameCache, opts: &OutputOptions) -> String {
        let mut buf = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.print_text(&mut buf, names, opts);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// Print a list: one entry after another as text, or a single JSON array.
pub fn print_all<W: Write, P: Printable>(
    w: &mut W,
    items: &[P],
    names: &NameCache,
    format: OutputFormat,
    opts: &OutputOptions,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => {
            for item in items {
                item.print_text(w, names, opts)?;
            }
            Ok(())
        }
        OutputFormat::Json => {
            let list = items.iter().map(|i| i.to_json(names, opts)).collect();
            write_json(w, &serde_json::Value::Array(list), opts)
        }
    }
}

pub(crate) fn write_json<W: Write>(
    w: &mut W,
    value: &serde_json::Value,
    opts: &OutputOptions,
) -> io::Result<()> {
    if opts.pretty {
        serde_json::to_writer_pretty(&mut *w, value)?;
    } else {
        serde_json::to_writer(&mut *w, value)?;
    }
    writeln!(w)
}

/// Interface name for display, honouring `numeric`.
pub(crate) fn ifname(names: &NameCache, ifindex: u32, opts: &OutputOptions) -> String {
    if opts.numeric {
        ifindex.to_string()
    } else {
        names.link_name(ifindex)
    }
}
