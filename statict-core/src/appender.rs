use crate::entry::Entry;
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppendError {
    #[error("append backend error: {0}")]
    Backend(String),
}

/// The external durable log this coordinator feeds. Implementations own
/// tiling, batching and Merkle-tree maintenance; `add` resolves only once
/// `entry` is durably assigned its index. The full entry is passed through,
/// not just the leaf bytes, so the issuer-chain fingerprints it carries
/// reach the data tile the appender writes.
pub trait Appender: Send + Sync {
    fn add(&self, entry: Entry) -> impl Future<Output = Result<u64, AppendError>> + Send;
}
