//! Link counter deltas for periodic polling.
//!
//! [`CounterTracker`] remembers the last record seen for each interface
//! index and reports only the values that changed since then. The first
//! sighting of an interface reports everything.

use std::collections::HashMap;
use std::fmt;

use super::messages::LinkMessage;
use super::types::link::{LinkStats64, OperState, iff};

/// One changed value, displayed as `{ifname}.{counter}: {value}`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct CounterChange {
    pub ifname: String,
    pub counter: &'static str,
    pub value: String,
}

impl fmt::Display for CounterChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.ifname, self.counter, self.value)
    }
}

#[derive(Debug, Clone)]
struct Seen {
    flags: u32,
    operstate: Option<OperState>,
    stats: Option<LinkStats64>,
}

/// Flag bits reported by the tracker: name, value when set, value when clear.
const FLAG_LINES: [(u32, &str, &str, &str); 3] = [
    (iff::UP, "admin", "up", "down"),
    (iff::LOWER_UP, "lower", "up", "down"),
    (iff::RUNNING, "running", "yes", "no"),
];

#[derive(Debug, Clone, Default)]
pub struct CounterTracker {
    last: HashMap<u32, Seen>,
}

impl CounterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of interfaces remembered.
    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }

    /// Compare a fresh link dump against the previous one.
    ///
    /// Links are reported in index order. Interfaces missing from `links`
    /// are forgotten, so a reappearing index reports everything again.
    pub fn update(&mut self, links: &[LinkMessage]) -> Vec<CounterChange> {
        let mut sorted: Vec<&LinkMessage> = links.iter().collect();
        sorted.sort_by_key(|l| l.ifindex());

        let mut changes = Vec::new();
        let mut next = HashMap::with_capacity(sorted.len());

        for link in sorted {
            let ifname = link.name_or(&link.ifindex().to_string());
            let seen = Seen {
                flags: link.flags(),
                operstate: link.operstate(),
                stats: link.stats64(),
            };
            let prev = self.last.get(&link.ifindex());
            diff(&ifname, prev, &seen, &mut changes);
            next.insert(link.ifindex(), seen);
        }

        self.last = next;
        changes
    }
}

fn diff(ifname: &str, prev: Option<&Seen>, cur: &Seen, out: &mut Vec<CounterChange>) {
    let mut push = |counter: &'static str, value: String| {
        out.push(CounterChange {
            ifname: ifname.to_string(),
            counter,
            value,
        })
    };

    for (bit, counter, set, clear) in FLAG_LINES {
        let now = cur.flags & bit;
        if prev.is_none_or(|p| p.flags & bit != now) {
            push(counter, if now != 0 { set } else { clear }.to_string());
        }
    }

    if let Some(oper) = cur.operstate
        && prev.is_none_or(|p| p.operstate != Some(oper))
    {
        push("state", oper.name().to_string());
    }

    if let Some(stats) = &cur.stats {
        let before = prev.and_then(|p| p.stats.as_ref());
        for (i, (counter, value)) in stats.iter().enumerate() {
            if before.is_none_or(|b| b.0[i] != value) {
                push(counter, value.to_string());
            }
        }
    }
}
