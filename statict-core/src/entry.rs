use crate::{dedup::DedupKey, utils::codec::CodecError, validator::ValidatedChain};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use x509_cert::{
    TbsCertificate,
    der::{Encode as CertEncode, asn1::OctetString},
    ext::Extension,
    ext::pkix::AuthorityKeyIdentifier,
};

/// The deterministic, timestamp-independent part of an [`Entry`]: the
/// canonical leaf bytes and issuer metadata a chain produces regardless of
/// when it is submitted. See the determinism-of-entry-bytes invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalLeaf {
    pub is_precert: bool,
    pub leaf_certificate: Vec<u8>,
    pub issuer_key_hash: Option<[u8; 32]>,
    pub issuer_chain_hashes: Vec<[u8; 32]>,
}

impl CanonicalLeaf {
    pub fn build(validated: &ValidatedChain, is_precert: bool) -> Result<Self, EntryError> {
        let issuer_chain_hashes = validated
            .intermediates_and_root()
            .iter()
            .map(|cert| cert.fingerprint_sha256().0)
            .collect();

        if !is_precert {
            return Ok(Self {
                is_precert: false,
                leaf_certificate: validated.leaf().der(),
                issuer_key_hash: None,
                issuer_chain_hashes,
            });
        }

        let leaf = validated.leaf();
        let immediate_issuer = validated.issuer();
        let signer_is_precert_ca = immediate_issuer.is_precert_signing_ca();

        let issuing_ca = if signer_is_precert_ca {
            validated
                .certs()
                .get(2)
                .ok_or(EntryError::MissingIssuingCa)?
        } else {
            immediate_issuer
        };

        let mut tbs = leaf.tbs_certificate().clone();
        strip_poison_extension(&mut tbs);
        if signer_is_precert_ca {
            rewrite_issuer_and_aki(&mut tbs, issuing_ca)?;
        }

        let mut canonical_tbs = vec![];
        tbs.encode_to_vec(&mut canonical_tbs)
            .map_err(CodecError::DerError)?;

        Ok(Self {
            is_precert: true,
            leaf_certificate: canonical_tbs,
            issuer_key_hash: Some(Sha256::digest(issuing_ca.spki_der()).into()),
            issuer_chain_hashes,
        })
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::from_leaf_bytes(&self.leaf_certificate)
    }

    pub fn into_entry(self, timestamp: u64) -> Entry {
        Entry {
            is_precert: self.is_precert,
            timestamp,
            leaf_certificate: self.leaf_certificate,
            issuer_key_hash: self.issuer_key_hash,
            issuer_chain_hashes: self.issuer_chain_hashes,
        }
    }
}

/// A fully built entry (D output), ready for issuer persistence and append.
/// Carries the ordered issuer-chain fingerprints an `Appender` needs to
/// record alongside the leaf, per the data tile layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub is_precert: bool,
    pub timestamp: u64,
    pub leaf_certificate: Vec<u8>,
    pub issuer_key_hash: Option<[u8; 32]>,
    pub issuer_chain_hashes: Vec<[u8; 32]>,
}

fn strip_poison_extension(tbs: &mut TbsCertificate) {
    if let Some(extensions) = tbs.extensions.as_mut() {
        extensions.retain(|ext| ext.extn_id != crate::cert::CT_POISON);
    }
}

/// Rewrite `tbs`'s Issuer and AuthorityKeyIdentifier to those of the real
/// issuing CA, as required when the precert was signed by a precert-signing
/// CA rather than the issuing CA itself.
fn rewrite_issuer_and_aki(
    tbs: &mut TbsCertificate,
    issuing_ca: &crate::cert::Certificate,
) -> Result<(), EntryError> {
    tbs.issuer = issuing_ca.tbs_certificate().subject.clone();

    let Some(ski) = issuing_ca.get_subject_key_info() else {
        return Ok(());
    };

    let aki = AuthorityKeyIdentifier {
        key_identifier: Some(OctetString::new(ski).map_err(CodecError::DerError)?),
        authority_cert_issuer: None,
        authority_cert_serial_number: None,
    };
    let mut der = vec![];
    aki.encode_to_vec(&mut der).map_err(CodecError::DerError)?;
    let extn_value = OctetString::new(der).map_err(CodecError::DerError)?;

    if let Some(extensions) = tbs.extensions.as_mut() {
        if let Some(existing) = extensions
            .iter_mut()
            .find(|ext| ext.extn_id == crate::cert::AUTH_KEY_ID)
        {
            existing.extn_value = extn_value;
        } else {
            extensions.push(Extension {
                extn_id: crate::cert::AUTH_KEY_ID,
                critical: false,
                extn_value,
            });
        }
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("the precert-signing CA's issuing CA is missing from the validated chain")]
    MissingIssuingCa,

    #[error("failed to re-encode the canonical TBSCertificate: {0}")]
    CodecError(#[from] CodecError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{policy::ValidationOpts, trust_pool::TrustPool, validator};
    use statict_test::Fixture;

    #[test]
    fn regular_cert_entry_is_leaf_der() {
        let fixture = Fixture::new();
        let pool = TrustPool::from_pem(&fixture.root_pem()).unwrap();
        let opts = ValidationOpts::new(false, false, None, None, "Any", "").unwrap();
        let chain = validator::validate_chain(
            &[fixture.leaf.clone(), fixture.intermediate.clone()],
            &pool,
            &opts,
            false,
            fixture.now_ms,
        )
        .unwrap();

        let canonical = CanonicalLeaf::build(&chain, false).unwrap();
        assert_eq!(canonical.leaf_certificate, fixture.leaf.der());
        assert!(canonical.issuer_key_hash.is_none());
    }

    #[test]
    fn precert_signed_directly_by_issuing_ca() {
        let fixture = Fixture::new();
        let pool = TrustPool::from_pem(&fixture.root_pem()).unwrap();
        let opts = ValidationOpts::new(false, false, None, None, "Any", "").unwrap();
        let chain = validator::validate_chain(
            &[
                fixture.precert_leaf_signed_by_intermediate.clone(),
                fixture.intermediate.clone(),
            ],
            &pool,
            &opts,
            true,
            fixture.now_ms,
        )
        .unwrap();

        let canonical = CanonicalLeaf::build(&chain, true).unwrap();
        assert_eq!(
            canonical.issuer_key_hash,
            Some(Sha256::digest(fixture.intermediate.spki_der()).into())
        );

        let reparsed = x509_cert::TbsCertificate::from_der(&canonical.leaf_certificate);
        assert!(reparsed.is_ok());
    }

    #[test]
    fn precert_signed_by_precert_signing_ca_rewrites_issuer() {
        let fixture = Fixture::new();
        let pool = TrustPool::from_pem(&fixture.root_pem()).unwrap();
        let opts = ValidationOpts::new(false, false, None, None, "Any", "").unwrap();
        let chain = validator::validate_chain(
            &[
                fixture.precert_leaf.clone(),
                fixture.precert_signing_ca.clone(),
                fixture.intermediate.clone(),
            ],
            &pool,
            &opts,
            true,
            fixture.now_ms,
        )
        .unwrap();

        let canonical = CanonicalLeaf::build(&chain, true).unwrap();
        assert_eq!(
            canonical.issuer_key_hash,
            Some(Sha256::digest(fixture.intermediate.spki_der()).into())
        );

        let tbs = x509_cert::TbsCertificate::from_der(&canonical.leaf_certificate).unwrap();
        assert_eq!(tbs.issuer, fixture.intermediate.tbs_certificate().subject);
        assert!(
            !tbs.extensions
                .unwrap_or_default()
                .iter()
                .any(|ext| ext.extn_id == crate::cert::CT_POISON)
        );
    }

    #[test]
    fn entry_bytes_are_independent_of_timestamp() {
        let fixture = Fixture::new();
        let pool = TrustPool::from_pem(&fixture.root_pem()).unwrap();
        let opts = ValidationOpts::new(false, false, None, None, "Any", "").unwrap();
        let chain = validator::validate_chain(
            &[fixture.leaf.clone(), fixture.intermediate.clone()],
            &pool,
            &opts,
            false,
            fixture.now_ms,
        )
        .unwrap();

        let a = CanonicalLeaf::build(&chain, false).unwrap().into_entry(1);
        let b = CanonicalLeaf::build(&chain, false).unwrap().into_entry(2);
        assert_eq!(a.leaf_certificate, b.leaf_certificate);
        assert_eq!(a.issuer_key_hash, b.issuer_key_hash);
    }
}
