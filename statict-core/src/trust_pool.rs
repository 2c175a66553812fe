use crate::cert::{Certificate, CertificateError};
use std::collections::HashMap;
use thiserror::Error;

/// The set of root CAs this log trusts. Loaded once at startup and held
/// read-only for the process lifetime.
#[derive(Debug, Clone)]
pub struct TrustPool {
    roots: Vec<Certificate>,
    by_subject: HashMap<Vec<u8>, Vec<usize>>,
}

impl TrustPool {
    /// Load a trust pool from a PEM file's contents. Fails if no certificate
    /// can be parsed out of it.
    pub fn from_pem(pem: &str) -> Result<Self, TrustPoolError> {
        let roots = Certificate::chain_from_pem(pem)?;
        if roots.is_empty() {
            return Err(TrustPoolError::Empty);
        }

        let mut by_subject: HashMap<Vec<u8>, Vec<usize>> = HashMap::new();
        for (i, root) in roots.iter().enumerate() {
            by_subject.entry(root.subject_der()).or_default().push(i);
        }

        Ok(Self { roots, by_subject })
    }

    pub fn roots(&self) -> &[Certificate] {
        &self.roots
    }

    /// Roots whose raw `Subject` equals `subject_der`.
    pub fn by_subject(&self, subject_der: &[u8]) -> impl Iterator<Item = &Certificate> {
        self.by_subject
            .get(subject_der)
            .into_iter()
            .flatten()
            .map(|&i| &self.roots[i])
    }

    /// The root whose raw `Subject` matches `cert`'s raw `Issuer` and whose
    /// key verifies `cert`'s signature, if any.
    pub fn find_verifying_root(&self, cert: &Certificate) -> Option<Certificate> {
        self.by_subject(&cert.issuer_der())
            .find(|root| cert.verify_signed_by(root).is_ok())
            .cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrustPoolError {
    #[error("the trust anchor file contains no certificates")]
    Empty,

    #[error("failed to parse a trust anchor: {0}")]
    Parse(#[from] CertificateError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use statict_test::Fixture;

    #[test]
    fn loads_single_root() {
        let fixture = Fixture::new();
        let pool = TrustPool::from_pem(&fixture.root_pem()).unwrap();
        assert_eq!(pool.roots().len(), 1);
        assert_eq!(pool.roots()[0], fixture.root);
    }

    #[test]
    fn empty_pem_is_rejected() {
        assert!(matches!(
            TrustPool::from_pem(""),
            Err(TrustPoolError::Empty)
        ));
    }

    #[test]
    fn finds_root_verifying_intermediate() {
        let fixture = Fixture::new();
        let pool = TrustPool::from_pem(&fixture.root_pem()).unwrap();
        let root = pool.find_verifying_root(&fixture.intermediate);
        assert_eq!(root, Some(fixture.root.clone()));
    }
}
