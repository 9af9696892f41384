mod chunked;
mod guard;
mod metadata;
mod session;
mod stats;

pub use chunked::{copy_with_progress, CopyOutcome};
pub use session::TransferSession;
pub use stats::CopyStats;
