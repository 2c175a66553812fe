use crate::utils::{
    codec::{CodecError, Decode},
    hex_with_colons,
};
use p256::pkcs8::ObjectIdentifier;
use sha2::{Digest, Sha256};
use std::{
    fmt::{self, Display},
    io::Cursor,
};
use thiserror::Error;
use x509_cert::{
    Certificate as Cert, TbsCertificate,
    der::{Decode as CertDecode, DecodePem, Encode as CertEncode, asn1::OctetString},
    ext::pkix::{
        AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage,
        SubjectKeyIdentifier,
    },
};

use crate::v1;

pub(crate) const SCT_V1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.11129.2.4.2");
pub(crate) const CT_POISON: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.11129.2.4.3");
pub(crate) const CT_PRECERT_SIGNING_EKU: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.11129.2.4.4");

pub(crate) const SUBJECT_KEY_ID: ObjectIdentifier =
    const_oid::db::rfc5280::ID_CE_SUBJECT_KEY_IDENTIFIER;
pub(crate) const AUTH_KEY_ID: ObjectIdentifier =
    const_oid::db::rfc5280::ID_CE_AUTHORITY_KEY_IDENTIFIER;
pub(crate) const BASIC_CONSTRAINTS: ObjectIdentifier =
    const_oid::db::rfc5280::ID_CE_BASIC_CONSTRAINTS;
pub(crate) const KEY_USAGE: ObjectIdentifier = const_oid::db::rfc5280::ID_CE_KEY_USAGE;
pub(crate) const EXT_KEY_USAGE: ObjectIdentifier = const_oid::db::rfc5280::ID_CE_EXT_KEY_USAGE;

/// A parsed X.509 certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate(pub(crate) Cert);

impl Certificate {
    /// Parse a PEM encoded certificate.
    pub fn from_pem(input: &str) -> Result<Self, CertificateError> {
        Ok(Self(
            Cert::from_pem(input.as_bytes()).map_err(CodecError::DerError)?,
        ))
    }

    /// Parse a DER encoded certificate.
    pub fn from_der(input: &[u8]) -> Result<Self, CertificateError> {
        Ok(Self(Cert::from_der(input).map_err(CodecError::DerError)?))
    }

    /// Parse every `-----BEGIN CERTIFICATE-----` block found in `pem`, in order.
    pub fn chain_from_pem(pem: &str) -> Result<Vec<Self>, CertificateError> {
        const BEGIN: &str = "-----BEGIN CERTIFICATE-----";
        const END: &str = "-----END CERTIFICATE-----";

        let mut certs = vec![];
        let mut rest = pem;
        while let Some(start) = rest.find(BEGIN) {
            let from_start = &rest[start..];
            let Some(end) = from_start.find(END) else {
                return Err(CertificateError::InvalidChain);
            };
            let block_end = end + END.len();
            certs.push(Self::from_pem(&from_start[..block_end])?);
            rest = &from_start[block_end..];
        }
        Ok(certs)
    }

    /// The DER encoding of the whole certificate.
    pub fn der(&self) -> Vec<u8> {
        let mut buf = vec![];
        self.0.encode_to_vec(&mut buf).unwrap();
        buf
    }

    /// The DER encoding of just the `TBSCertificate`.
    pub fn tbs_der(&self) -> Vec<u8> {
        let mut buf = vec![];
        self.0.tbs_certificate.encode_to_vec(&mut buf).unwrap();
        buf
    }

    pub fn tbs_certificate(&self) -> &TbsCertificate {
        &self.0.tbs_certificate
    }

    /// Raw DER encoding of the `Subject` name, used for raw-subject equality.
    pub fn subject_der(&self) -> Vec<u8> {
        let mut buf = vec![];
        self.0
            .tbs_certificate
            .subject
            .encode_to_vec(&mut buf)
            .unwrap();
        buf
    }

    /// Raw DER encoding of the `Issuer` name, used for raw-issuer lookups.
    pub fn issuer_der(&self) -> Vec<u8> {
        let mut buf = vec![];
        self.0
            .tbs_certificate
            .issuer
            .encode_to_vec(&mut buf)
            .unwrap();
        buf
    }

    /// DER encoding of the `SubjectPublicKeyInfo`.
    pub fn spki_der(&self) -> Vec<u8> {
        let mut buf = vec![];
        self.0
            .tbs_certificate
            .subject_public_key_info
            .encode_to_vec(&mut buf)
            .unwrap();
        buf
    }

    /// `NotAfter`, in milliseconds since the Unix epoch.
    pub fn not_after_ms(&self) -> u64 {
        self.0
            .tbs_certificate
            .validity
            .not_after
            .to_date_time()
            .unix_duration()
            .as_millis() as u64
    }

    /// `NotBefore`, in milliseconds since the Unix epoch.
    pub fn not_before_ms(&self) -> u64 {
        self.0
            .tbs_certificate
            .validity
            .not_before
            .to_date_time()
            .unix_duration()
            .as_millis() as u64
    }

    fn find_ext(&self, oid: ObjectIdentifier) -> Option<&x509_cert::ext::Extension> {
        self.0
            .tbs_certificate
            .extensions
            .as_ref()?
            .iter()
            .find(|ext| ext.extn_id == oid)
    }

    pub fn has_extension(&self, oid: ObjectIdentifier) -> bool {
        self.find_ext(oid).is_some()
    }

    /// Whether this certificate carries the CT poison extension, critical, with the
    /// ASN.1 NULL value mandated by RFC 6962 §3.1.
    pub fn has_poison_extension(&self) -> bool {
        self.find_ext(CT_POISON)
            .filter(|ext| ext.critical)
            .is_some_and(|ext| ext.extn_value.as_bytes() == [0x05, 0x00])
    }

    pub fn basic_constraints(&self) -> Option<BasicConstraints> {
        self.find_ext(BASIC_CONSTRAINTS)
            .and_then(|ext| BasicConstraints::from_der(ext.extn_value.as_bytes()).ok())
    }

    pub fn key_usage(&self) -> Option<KeyUsage> {
        self.find_ext(KEY_USAGE)
            .and_then(|ext| KeyUsage::from_der(ext.extn_value.as_bytes()).ok())
    }

    pub fn extended_key_usages(&self) -> Vec<ObjectIdentifier> {
        self.find_ext(EXT_KEY_USAGE)
            .and_then(|ext| ExtendedKeyUsage::from_der(ext.extn_value.as_bytes()).ok())
            .map(|eku| eku.0)
            .unwrap_or_default()
    }

    pub fn has_extended_key_usage(&self, oid: ObjectIdentifier) -> bool {
        self.extended_key_usages().contains(&oid)
    }

    /// Whether this certificate is a CT precertificate-signing CA, i.e. an
    /// intermediate entitled to sign precertificates on behalf of its issuer.
    pub fn is_precert_signing_ca(&self) -> bool {
        self.has_extended_key_usage(CT_PRECERT_SIGNING_EKU)
    }

    /// Verify that `self` was signed by `parent`'s key.
    pub fn verify_signed_by(&self, parent: &Certificate) -> Result<(), CertificateError> {
        let key = x509_verify::VerifyingKey::try_from(&parent.0)?;
        key.verify(&self.0)?;
        Ok(())
    }

    /// Extract the [SCTs](v1::SignedCertificateTimestamp) embedded into this certificate.
    pub fn extract_scts_v1(&self) -> Result<Vec<v1::SignedCertificateTimestamp>, CertificateError> {
        let Some(extensions) = &self.0.tbs_certificate.extensions else {
            return Ok(vec![]);
        };

        let sct_lists = extensions
            .iter()
            .filter(|extension| extension.extn_id == SCT_V1)
            .map(|sct| &sct.extn_value)
            .map(|sct| {
                let sct = OctetString::from_der(sct.as_bytes()).unwrap();
                let mut reader = Cursor::new(sct.as_bytes());
                v1::sct::SctList::decode(&mut reader)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let scts = sct_lists
            .into_iter()
            .flat_map(|list| list.into_inner())
            .collect();

        Ok(scts)
    }

    /// Whether this certificate is a precertificate, per the poison-extension /
    /// embedded-SCT exclusivity rule of RFC 6962 §3.1.
    pub fn is_precert(&self) -> Result<bool, CertificateError> {
        let Some(extensions) = &self.0.tbs_certificate.extensions else {
            return Ok(false);
        };

        let scts = extensions
            .iter()
            .filter(|extension| extension.extn_id == SCT_V1)
            .count();

        let poisons = extensions
            .iter()
            .filter(|extension| extension.extn_id == CT_POISON && extension.critical)
            .filter(|extension| extension.extn_value.as_bytes() == [0x05, 0x00])
            .count();

        match (poisons, scts) {
            (1, 0) => Ok(true),
            (0, _) => Ok(false),
            _ => Err(CertificateError::InvalidPreCert),
        }
    }

    pub fn fingerprint_sha256(&self) -> Fingerprint {
        let hash: [u8; 32] = Sha256::digest(self.der()).into();
        Fingerprint(hash)
    }

    pub fn get_subject_key_info(&self) -> Option<Vec<u8>> {
        self.find_ext(SUBJECT_KEY_ID)
            .and_then(|extension| {
                SubjectKeyIdentifier::from_der(extension.extn_value.as_bytes()).ok()
            })
            .map(|key_id| key_id.0.as_bytes().to_vec())
    }

    pub fn get_authority_key_info(&self) -> Option<Vec<u8>> {
        self.find_ext(AUTH_KEY_ID)
            .and_then(|extension| {
                AuthorityKeyIdentifier::from_der(extension.extn_value.as_bytes()).ok()
            })
            .and_then(|key_id| key_id.key_identifier)
            .map(|key_id| key_id.as_bytes().to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fingerprint(pub [u8; 32]);

impl Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex_with_colons(&self.0))
    }
}

/// Error returned when parsing or inspecting a [`Certificate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CertificateError {
    #[error("A precert can't have SCTs or more than one poison value")]
    InvalidPreCert,

    #[error("The certificate chain is malformed")]
    InvalidChain,

    #[error("Failed to decode a value: {0}")]
    CodecError(#[from] CodecError),

    #[error("Failed to verify certificate: {0}")]
    VerificationError(x509_verify::Error),
}

impl From<x509_verify::Error> for CertificateError {
    fn from(value: x509_verify::Error) -> Self {
        Self::VerificationError(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statict_test::Fixture;

    #[test]
    fn regular_leaf_is_not_a_precert() {
        let fixture = Fixture::new();
        assert!(!fixture.leaf.is_precert().unwrap());
    }

    #[test]
    fn precert_leaf_carries_poison() {
        let fixture = Fixture::new();
        assert!(fixture.precert_leaf.is_precert().unwrap());
        assert!(fixture.precert_leaf.has_poison_extension());
    }

    #[test]
    fn precert_signing_ca_carries_eku() {
        let fixture = Fixture::new();
        assert!(fixture.precert_signing_ca.is_precert_signing_ca());
        assert!(!fixture.intermediate.is_precert_signing_ca());
    }

    #[test]
    fn fingerprint_is_stable() {
        let fixture = Fixture::new();
        let a = fixture.leaf.fingerprint_sha256();
        let b = fixture.leaf.fingerprint_sha256();
        assert_eq!(a, b);
    }

    #[test]
    fn chain_from_pem_splits_concatenated_blocks() {
        let fixture = Fixture::new();
        let pem = format!(
            "{}\n{}\n",
            fixture.intermediate_pem(),
            fixture.root_pem()
        );
        let certs = Certificate::chain_from_pem(&pem).unwrap();
        assert_eq!(certs.len(), 2);
    }
}
