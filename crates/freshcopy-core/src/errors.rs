//! Error categorization for failed backups.
//!
//! The engine never retries on its own. A failed backup carries a category
//! so whoever started it can decide whether running it again makes sense:
//! - Retryable: transient failures that may succeed on retry (interrupted I/O, timeouts)
//! - Fatal: permanent failures that will not go away by themselves (permissions, missing files)
//! - NoRetry: the source itself is in a state that makes the copy meaningless

use std::io;

/// Category of a backup failure for retry decision-making.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transient error - retry may succeed
    Retryable,
    /// Permanent error - retry will not succeed without intervention
    Fatal,
    /// Not a fault of the environment, retrying is pointless (e.g. source shrank mid-copy)
    NoRetry,
}

/// Categorize an IO error for retry decisions.
pub fn categorize_io_error(err: &io::Error) -> ErrorCategory {
    match err.kind() {
        io::ErrorKind::TimedOut
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock => ErrorCategory::Retryable,

        // A source that ends before its advertised size changed under us.
        io::ErrorKind::UnexpectedEof => ErrorCategory::NoRetry,

        io::ErrorKind::PermissionDenied
        | io::ErrorKind::NotFound
        | io::ErrorKind::InvalidData
        | io::ErrorKind::InvalidInput
        | io::ErrorKind::AlreadyExists
        | io::ErrorKind::WriteZero => ErrorCategory::Fatal,

        // Unknown errors - default to fatal to be safe
        _ => ErrorCategory::Fatal,
    }
}

/// Categorize a report by the first `io::Error` found in its cause chain.
///
/// Reports with no I/O cause are treated as fatal.
pub fn categorize_report(report: &eyre::Report) -> ErrorCategory {
    report
        .chain()
        .find_map(|cause| cause.downcast_ref::<io::Error>())
        .map(categorize_io_error)
        .unwrap_or(ErrorCategory::Fatal)
}
