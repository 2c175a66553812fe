use std::future::Future;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssuerStoreError {
    #[error("issuer store backend error: {0}")]
    Backend(String),
}

/// Content-addressed, write-once storage for issuer certificates
/// encountered while building a chain, keyed by SHA-256 of the DER bytes.
pub trait IssuerStorage: Send + Sync {
    fn exists(
        &self,
        fingerprint: [u8; 32],
    ) -> impl Future<Output = Result<bool, IssuerStoreError>> + Send;

    /// Store `der` under its own SHA-256 fingerprint. Idempotent: storing the
    /// same bytes twice is not an error.
    fn put(
        &self,
        fingerprint: [u8; 32],
        der: Vec<u8>,
    ) -> impl Future<Output = Result<(), IssuerStoreError>> + Send;
}
