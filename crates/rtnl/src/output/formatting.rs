//! Shared formatting helpers for `ip`-style output.
//!
//! # Example
//!
//! ```
//! use rtnl::output::formatting::{format_flags, format_mac};
//!
//! assert_eq!(format_mac(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]), "00:11:22:33:44:55");
//! assert_eq!(format_flags(0x3, &[(0x1, "A"), (0x2, "B")]), "A,B");
//! ```

use std::net::IpAddr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Format a hardware address as colon-separated hex.
///
/// ```
/// use rtnl::output::formatting::format_mac;
///
/// assert_eq!(format_mac(&[0xde, 0xad]), "de:ad");
/// assert_eq!(format_mac(&[]), "");
/// ```
pub fn format_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Join the names of the bits set in `flags`, in table order.
pub fn format_flags<T>(flags: T, table: &[(T, &str)]) -> String
where
    T: Copy + std::ops::BitAnd<Output = T> + PartialEq + Default,
{
    table
        .iter()
        .filter(|(bit, _)| flags & *bit != T::default())
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(",")
}

/// `addr/len`, or `default` for a zero-length prefix with no address.
pub fn format_prefix(addr: Option<IpAddr>, len: u8) -> String {
    match addr {
        Some(a) => format!("{}/{}", a, len),
        None if len == 0 => "default".to_string(),
        None => format!("0/{}", len),
    }
}

/// Format an address lifetime in seconds; all-ones is `forever`.
pub fn format_lifetime(secs: u32) -> String {
    if secs == u32::MAX {
        "forever".to_string()
    } else {
        format!("{}sec", secs)
    }
}

/// Short timestamp prefix: `[secs.micros]`.
///
/// ```
/// use rtnl::output::formatting::format_timestamp_short;
/// use std::time::{Duration, UNIX_EPOCH};
///
/// let at = UNIX_EPOCH + Duration::from_micros(1_500_000_042);
/// assert_eq!(format_timestamp_short(at), "[1500.000042]");
/// ```
pub fn format_timestamp_short(at: SystemTime) -> String {
    let since = at.duration_since(UNIX_EPOCH).unwrap_or_default();
    format!("[{}.{:06}]", since.as_secs(), since.subsec_micros())
}

/// Long timestamp in local time, e.g. `Mon Oct 19 12:00:00 2026 123456usec`.
pub fn format_timestamp_long(at: SystemTime) -> String {
    let since = at.duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = since.as_secs() as libc::time_t;
    let date = local_time(secs, c"%a %b %e %H:%M:%S %Y")
        .unwrap_or_else(|| since.as_secs().to_string());
    format!("{} {:06}usec", date, since.subsec_micros())
}

fn local_time(secs: libc::time_t, fmt: &std::ffi::CStr) -> Option<String> {
    let mut tm: libc::tm = unsafe { std::mem::zeroed() };
    // SAFETY: both pointers reference live stack values of the right type.
    if unsafe { libc::localtime_r(&secs, &mut tm) }.is_null() {
        return None;
    }

    let mut buf = [0u8; 64];
    // SAFETY: buf is writable for its full length and fmt is NUL-terminated.
    let n = unsafe {
        libc::strftime(
            buf.as_mut_ptr() as *mut libc::c_char,
            buf.len(),
            fmt.as_ptr(),
            &tm,
        )
    };
    if n == 0 {
        return None;
    }
    Some(String::from_utf8_lossy(&buf[..n]).into_owned())
}
