//! Error types for routing netlink operations.

use std::io;

/// Result type for routing netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the kernel.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A frame's length field disagrees with the bytes it was delivered in.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// A frame arrived that does not belong to the outstanding request.
    #[error(
        "protocol mismatch: expected seq {expected_seq} pid {expected_pid}, \
         got seq {actual_seq} pid {actual_pid}"
    )]
    ProtocolMismatch {
        /// Sequence number of the outstanding request.
        expected_seq: u32,
        /// Sequence number carried by the frame.
        actual_seq: u32,
        /// Port id of the local socket.
        expected_pid: u32,
        /// Port id carried by the frame.
        actual_pid: u32,
    },

    /// Kernel answered with an ERROR frame carrying a nonzero errno.
    #[error("{}{message} (errno {errno})", operation.as_deref().map(|op| format!("{op}: ")).unwrap_or_default())]
    KernelRejected {
        /// The positive errno value.
        errno: i32,
        /// Human-readable error message.
        message: String,
        /// What the caller was doing when the kernel refused.
        operation: Option<String>,
    },

    /// Declared length exceeds the available bytes.
    #[error("truncated: declared {expected} bytes, only {actual} available")]
    Truncated {
        /// Declared length.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// The socket closed while a response was still pending.
    #[error("transport closed")]
    TransportClosed,

    /// Invalid message format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid attribute format.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Interface not found.
    #[error("interface not found: {name}")]
    InterfaceNotFound {
        /// The interface name that was not found.
        name: String,
    },
}

impl Error {
    /// Create a kernel rejection from the (negative) errno of an ERROR frame.
    pub fn from_errno(errno: i32) -> Self {
        let errno = errno.saturating_abs();
        Self::KernelRejected {
            errno,
            message: io::Error::from_raw_os_error(errno).to_string(),
            operation: None,
        }
    }

    /// Add context to this error.
    ///
    /// Only kernel rejections carry context. Other errors are returned unchanged.
    pub fn with_context(self, op: impl Into<String>) -> Self {
        match self {
            Self::KernelRejected { errno, message, .. } => Self::KernelRejected {
                errno,
                message,
                operation: Some(op.into()),
            },
            other => other,
        }
    }

    /// Get the errno value if this is a kernel rejection.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::KernelRejected { errno, .. } => Some(*errno),
            _ => None,
        }
    }

    /// Check if this is a "not found" error (ENOENT, ENODEV, ESRCH).
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::KernelRejected { errno, .. } => {
                matches!(*errno, libc::ENOENT | libc::ENODEV | libc::ESRCH)
            }
            Self::InterfaceNotFound { .. } => true,
            _ => false,
        }
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.errno(), Some(libc::EPERM | libc::EACCES))
    }

    /// Check if this is an "already exists" error (EEXIST).
    pub fn is_already_exists(&self) -> bool {
        self.errno() == Some(libc::EEXIST)
    }

    /// Protocol desync errors; the session cannot continue after one of these.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MalformedFrame(_) | Self::ProtocolMismatch { .. } | Self::Truncated { .. }
        )
    }

    /// The transport went away. Long-running loops end quietly on this.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::TransportClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_errno() {
        let err = Error::from_errno(-2);
        assert_eq!(err.errno(), Some(2));
        assert!(err.is_not_found());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_with_context() {
        let err = Error::from_errno(-13).with_context("setting link up on eth0");
        assert!(err.is_permission_denied());
        let msg = err.to_string();
        assert!(msg.starts_with("setting link up on eth0: "));
        assert!(msg.ends_with("(errno 13)"));
    }

    #[test]
    fn test_context_ignored_for_other_errors() {
        let err = Error::TransportClosed.with_context("dump");
        assert!(err.is_closed());
        assert_eq!(err.to_string(), "transport closed");
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::MalformedFrame("x".into()).is_fatal());
        assert!(
            Error::Truncated {
                expected: 8,
                actual: 4
            }
            .is_fatal()
        );
        assert!(
            Error::ProtocolMismatch {
                expected_seq: 1,
                actual_seq: 2,
                expected_pid: 10,
                actual_pid: 10,
            }
            .is_fatal()
        );
        assert!(!Error::TransportClosed.is_fatal());
    }

    #[test]
    fn test_already_exists() {
        assert!(Error::from_errno(-17).is_already_exists());
        assert!(!Error::from_errno(-1).is_already_exists());
    }
}
