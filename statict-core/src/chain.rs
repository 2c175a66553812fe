use crate::cert::{Certificate, CertificateError};
use thiserror::Error;

/// The chain exactly as submitted by the client: leaf first, in whatever
/// order the client chose to include intermediates and (optionally) the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateChain(Vec<Certificate>);

impl CertificateChain {
    /// Parse a submission's `chain` array of DER blobs. The leaf is `ders[0]`.
    pub fn from_der_list(ders: &[Vec<u8>]) -> Result<Self, ChainError> {
        if ders.is_empty() {
            return Err(ChainError::Empty);
        }

        let certs = ders
            .iter()
            .map(|der| Certificate::from_der(der))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self(certs))
    }

    pub fn leaf(&self) -> &Certificate {
        &self.0[0]
    }

    pub fn certs(&self) -> &[Certificate] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("the submitted chain is empty")]
    Empty,

    #[error("failed to parse a certificate in the chain: {0}")]
    Parse(#[from] CertificateError),
}
