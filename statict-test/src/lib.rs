//! Certificate fixtures for `statict-core`'s test suites: a small CA
//! hierarchy generated fresh on every call, covering the regular-cert and
//! precert shapes the validator and entry builder need to exercise.

use p256::{
    ecdsa::SigningKey,
    pkcs8::{EncodePublicKey, ObjectIdentifier},
};
use rand::rngs::OsRng;
use statict_core::Certificate;
use std::{
    str::FromStr,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use x509_cert::{
    builder::{Builder, CertificateBuilder, Profile},
    der::{DecodePem, Encode as DerEncode, Result as DerResult, asn1::OctetString, pem::LineEnding},
    ext::{AsExtension, Extension, pkix::ExtendedKeyUsage},
    name::Name,
    serial_number::SerialNumber,
    spki::SubjectPublicKeyInfoOwned,
    time::Validity,
};

const CT_POISON: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.11129.2.4.3");
const CT_PRECERT_SIGNING_EKU: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.11129.2.4.4");

/// A small CA hierarchy: `root -> intermediate -> leaf`, plus a precert
/// signing CA under `intermediate` and the precert shapes it and
/// `intermediate` can each issue directly.
pub struct Fixture {
    pub root: Certificate,
    pub intermediate: Certificate,
    pub precert_signing_ca: Certificate,
    pub leaf: Certificate,
    pub leaf_signed_by_root: Certificate,
    pub precert_leaf: Certificate,
    pub precert_leaf_signed_by_intermediate: Certificate,
    pub now_ms: u64,
}

impl Fixture {
    pub fn new() -> Self {
        let root_key = SigningKey::random(&mut OsRng);
        let intermediate_key = SigningKey::random(&mut OsRng);
        let precert_signing_ca_key = SigningKey::random(&mut OsRng);
        let leaf_key = SigningKey::random(&mut OsRng);
        let leaf_signed_by_root_key = SigningKey::random(&mut OsRng);
        let precert_leaf_key = SigningKey::random(&mut OsRng);
        let precert_leaf_direct_key = SigningKey::random(&mut OsRng);

        let root = build_ca(Profile::Root, "CN=Test Root CA", &root_key, &root_key, &[]);

        let intermediate = build_ca(
            Profile::SubCA {
                issuer: subject_of(&root),
                path_len_constraint: None,
            },
            "CN=Test Intermediate CA",
            &intermediate_key,
            &root_key,
            &[],
        );

        let precert_signing_ca = build_ca(
            Profile::SubCA {
                issuer: subject_of(&intermediate),
                path_len_constraint: Some(0),
            },
            "CN=Test Precert Signing CA",
            &precert_signing_ca_key,
            &intermediate_key,
            &[&ExtendedKeyUsage(vec![CT_PRECERT_SIGNING_EKU])],
        );

        let leaf = build_leaf(
            subject_of(&intermediate),
            "CN=leaf.example.test",
            &leaf_key,
            &intermediate_key,
            &[],
        );

        let leaf_signed_by_root = build_leaf(
            subject_of(&root),
            "CN=root-signed.example.test",
            &leaf_signed_by_root_key,
            &root_key,
            &[],
        );

        let precert_leaf = build_leaf(
            subject_of(&precert_signing_ca),
            "CN=precert.example.test",
            &precert_leaf_key,
            &precert_signing_ca_key,
            &[&PoisonExtension],
        );

        let precert_leaf_signed_by_intermediate = build_leaf(
            subject_of(&intermediate),
            "CN=precert-direct.example.test",
            &precert_leaf_direct_key,
            &intermediate_key,
            &[&PoisonExtension],
        );

        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the Unix epoch")
            .as_millis() as u64;

        Self {
            root,
            intermediate,
            precert_signing_ca,
            leaf,
            leaf_signed_by_root,
            precert_leaf,
            precert_leaf_signed_by_intermediate,
            now_ms,
        }
    }

    pub fn root_pem(&self) -> String {
        to_pem(&self.root)
    }

    pub fn intermediate_pem(&self) -> String {
        to_pem(&self.intermediate)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

fn subject_of(cert: &Certificate) -> Name {
    cert.tbs_certificate().subject.clone()
}

fn spki_of(key: &SigningKey) -> SubjectPublicKeyInfoOwned {
    let pem = key
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .expect("a P-256 verifying key always encodes to a valid public key PEM");
    SubjectPublicKeyInfoOwned::from_pem(pem.as_bytes())
        .expect("a freshly encoded SubjectPublicKeyInfo PEM always parses back")
}

fn build_ca(
    profile: Profile,
    subject: &str,
    subject_key: &SigningKey,
    signer: &SigningKey,
    extensions: &[&dyn AsExtension],
) -> Certificate {
    build(profile, subject, subject_key, signer, extensions)
}

fn build_leaf(
    issuer: Name,
    subject: &str,
    subject_key: &SigningKey,
    signer: &SigningKey,
    extensions: &[&dyn AsExtension],
) -> Certificate {
    build(
        Profile::Leaf {
            issuer,
            enable_key_agreement: false,
            enable_key_encipherment: true,
        },
        subject,
        subject_key,
        signer,
        extensions,
    )
}

fn build(
    profile: Profile,
    subject: &str,
    subject_key: &SigningKey,
    signer: &SigningKey,
    extensions: &[&dyn AsExtension],
) -> Certificate {
    let serial_number = SerialNumber::from(rand::random::<u64>());
    let validity =
        Validity::from_now(Duration::from_secs(365 * 24 * 3600)).expect("a 1-year validity window always encodes");
    let subject = Name::from_str(subject).expect("fixture subjects are always valid RFC 4514 names");
    let spki = spki_of(subject_key);

    let mut builder = CertificateBuilder::new(profile, serial_number, validity, subject, spki, signer)
        .expect("fixture certificate parameters always build");

    for extension in extensions {
        builder
            .add_extension(*extension)
            .expect("fixture extensions always encode");
    }

    let built = builder.build().expect("fixture certificates always sign");

    let mut der = vec![];
    built
        .encode_to_vec(&mut der)
        .expect("a freshly built certificate always re-encodes to DER");
    Certificate::from_der(&der).expect("a freshly built certificate always re-parses")
}

fn to_pem(cert: &Certificate) -> String {
    use base64::{Engine, prelude::BASE64_STANDARD};
    let der = cert.der();
    let body = BASE64_STANDARD.encode(&der);
    let mut pem = String::from("-----BEGIN CERTIFICATE-----\n");
    for chunk in body.as_bytes().chunks(64) {
        pem.push_str(std::str::from_utf8(chunk).unwrap());
        pem.push('\n');
    }
    pem.push_str("-----END CERTIFICATE-----\n");
    pem
}

struct PoisonExtension;

impl AsExtension for PoisonExtension {
    fn critical(&self, _subject: &Name, _extensions: &[Extension]) -> bool {
        true
    }

    fn to_extension(&self, _subject: &Name, _extensions: &[Extension]) -> DerResult<Extension> {
        Ok(Extension {
            extn_id: CT_POISON,
            critical: true,
            extn_value: OctetString::new(vec![0x05, 0x00])?,
        })
    }
}
