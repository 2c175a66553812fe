use crate::{
    appender::{AppendError, Appender},
    chain::{CertificateChain, ChainError},
    dedup::{DedupError, DedupStorage, DedupValue},
    entry::{CanonicalLeaf, Entry, EntryError},
    issuer::{IssuerStorage, IssuerStoreError},
    policy::ValidationOpts,
    signer::{SctSigner, SignerError},
    time_source::TimeSource,
    trust_pool::TrustPool,
    v1::{CtExtensions, LogEntry, SignedCertificateTimestamp},
    validator::{self, ValidatorError},
};
use std::time::Duration;
use thiserror::Error;

/// Drives a single `add-chain` / `add-pre-chain` submission through validation,
/// dedup, issuer persistence, append and signing, per the request state
/// machine `Received -> Parsed -> Validated -> (DedupHit|DedupMiss) ->
/// (IssuersPersisted -> Appended -> DedupRecorded) -> Signed -> Responded`.
pub struct SubmissionCoordinator<D, I, A> {
    pub trust_pool: TrustPool,
    pub policy: ValidationOpts,
    pub signer: SctSigner,
    pub dedup: D,
    pub issuers: I,
    pub appender: A,
    pub time_source: Box<dyn TimeSource>,
    pub deadline: Duration,
}

impl<D: DedupStorage, I: IssuerStorage, A: Appender> SubmissionCoordinator<D, I, A> {
    pub async fn submit(
        &self,
        der_chain: &[Vec<u8>],
        is_precert: bool,
    ) -> Result<SignedCertificateTimestamp, CoordinatorError> {
        match tokio::time::timeout(self.deadline, self.submit_inner(der_chain, is_precert)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("submission exceeded the {:?} deadline", self.deadline);
                Err(CoordinatorError::DeadlineExceeded)
            }
        }
    }

    async fn submit_inner(
        &self,
        der_chain: &[Vec<u8>],
        is_precert: bool,
    ) -> Result<SignedCertificateTimestamp, CoordinatorError> {
        tracing::debug!("received submission of {} certificates, precert={is_precert}", der_chain.len());

        let submitted = CertificateChain::from_der_list(der_chain)?;
        tracing::debug!("parsed chain into {} certificates", submitted.certs().len());

        let now_ms = self.time_source.now_ms();
        let validated = validator::validate_chain(
            submitted.certs(),
            &self.trust_pool,
            &self.policy,
            is_precert,
            now_ms,
        )?;
        tracing::debug!("validated chain against the trust pool");

        let canonical = CanonicalLeaf::build(&validated, is_precert)?;
        let dedup_key = canonical.dedup_key();

        if let Some(cached) = self
            .dedup
            .get(dedup_key)
            .await
            .map_err(CoordinatorError::from_dedup_lookup)?
        {
            tracing::debug!(
                "dedup hit for {}, reusing index {}",
                dedup_key.to_hex(),
                cached.index
            );
            return self.sign(&canonical, cached.timestamp, cached.index);
        }
        tracing::debug!("dedup miss for {}", dedup_key.to_hex());

        let timestamp = now_ms;

        for cert in validated.intermediates_and_root() {
            self.issuers
                .put(cert.fingerprint_sha256().0, cert.der())
                .await
                .map_err(CoordinatorError::IssuerPersistFailed)?;
        }
        tracing::debug!(
            "persisted {} issuer certificates for {}",
            validated.intermediates_and_root().len(),
            dedup_key.to_hex()
        );

        let entry = canonical.clone().into_entry(timestamp);
        let index = self
            .appender
            .add(entry)
            .await
            .map_err(CoordinatorError::AppendFailed)?;
        tracing::debug!("appended entry {} at index {}", dedup_key.to_hex(), index);

        match self
            .dedup
            .put(dedup_key, DedupValue { timestamp, index })
            .await
        {
            Ok(()) => {
                tracing::debug!("recorded dedup entry for {} at index {}", dedup_key.to_hex(), index);
            }
            Err(DedupError::Conflict) => {
                tracing::debug!(
                    "dedup record for {} lost a race; entry remains durably logged at index {}",
                    dedup_key.to_hex(),
                    index
                );
            }
            Err(DedupError::Backend(cause)) => {
                tracing::warn!(
                    "failed to record dedup entry for {} at index {}: {cause}; the entry is already durably logged, a future duplicate submission will simply be assigned a new index",
                    dedup_key.to_hex(),
                    index
                );
            }
        }

        let sct = self.sign(&canonical, timestamp, index)?;
        tracing::debug!("signed entry {} at index {}", dedup_key.to_hex(), index);
        Ok(sct)
    }

    fn sign(
        &self,
        canonical: &CanonicalLeaf,
        timestamp: u64,
        index: u64,
    ) -> Result<SignedCertificateTimestamp, CoordinatorError> {
        let log_entry = if canonical.is_precert {
            LogEntry::precert(
                canonical
                    .issuer_key_hash
                    .expect("a precert's canonical leaf always carries an issuer key hash"),
                canonical.leaf_certificate.clone(),
            )
        } else {
            LogEntry::x509(canonical.leaf_certificate.clone())
        };

        let extensions = CtExtensions::from_leaf_index(index);
        let mut extensions_bytes = vec![];
        crate::utils::codec::Encode::encode(&extensions, &mut extensions_bytes)
            .map_err(|_| CoordinatorError::SignFailed)?;

        let payload = crate::v1::sct::CertificateTimeStamp::new(
            timestamp,
            log_entry,
            extensions_bytes.clone().into(),
        );

        let signature = crate::signer::Signature::sign(&payload, self.signer.signing_key())
            .map_err(|_: SignerError| CoordinatorError::SignFailed)?;

        Ok(SignedCertificateTimestamp::new(
            self.signer.log_id(),
            timestamp,
            extensions_bytes.into(),
            signature,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    #[error("the submitted chain is malformed")]
    MalformedChain,

    #[error("the chain does not terminate at a trusted root")]
    UnknownIssuer,

    #[error("a candidate parent certificate fails to verify the child's signature")]
    BadSignature,

    #[error("the leaf certificate does not carry an allowed extended key usage")]
    DisallowedEku,

    #[error("the leaf certificate carries a disallowed extension")]
    DisallowedExtension,

    #[error("the leaf certificate has expired")]
    Expired,

    #[error("the leaf certificate has not yet expired")]
    Unexpired,

    #[error("the leaf certificate's NotAfter is outside the configured window")]
    OutOfWindow,

    #[error("add-pre-chain was used with a certificate that does not carry the CT poison extension")]
    NotAPrecert,

    #[error("add-chain was used with a certificate that carries the CT poison extension")]
    IsAPrecert,

    #[error("failed to persist an issuer certificate: {0}")]
    IssuerPersistFailed(IssuerStoreError),

    #[error("failed to append the entry to the log: {0}")]
    AppendFailed(AppendError),

    #[error("failed to sign the certificate timestamp")]
    SignFailed,

    #[error("a different entry is already recorded under this dedup key")]
    DedupConflict,

    #[error("failed to look up the dedup cache: {0}")]
    DedupLookupFailed(String),

    #[error("the request deadline was exceeded")]
    DeadlineExceeded,
}

impl CoordinatorError {
    fn from_dedup_lookup(err: DedupError) -> Self {
        match err {
            DedupError::Conflict => CoordinatorError::DedupConflict,
            DedupError::Backend(msg) => CoordinatorError::DedupLookupFailed(msg),
        }
    }

    /// The HTTP status this error should surface as, per the error handling design.
    pub fn status_code(&self) -> u16 {
        match self {
            CoordinatorError::MalformedChain
            | CoordinatorError::UnknownIssuer
            | CoordinatorError::BadSignature
            | CoordinatorError::DisallowedEku
            | CoordinatorError::DisallowedExtension
            | CoordinatorError::Expired
            | CoordinatorError::Unexpired
            | CoordinatorError::OutOfWindow
            | CoordinatorError::NotAPrecert
            | CoordinatorError::IsAPrecert => 400,

            CoordinatorError::IssuerPersistFailed(_)
            | CoordinatorError::AppendFailed(_)
            | CoordinatorError::SignFailed
            | CoordinatorError::DedupConflict
            | CoordinatorError::DedupLookupFailed(_) => 500,

            CoordinatorError::DeadlineExceeded => 504,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status_code() == 500
    }

    /// The HTTP response body text, collapsed to a generic string for
    /// internal errors when `mask_internal_errors` is set.
    pub fn response_body(&self, mask_internal_errors: bool) -> String {
        if self.is_internal() && mask_internal_errors {
            "internal error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<ChainError> for CoordinatorError {
    fn from(_: ChainError) -> Self {
        CoordinatorError::MalformedChain
    }
}

impl From<ValidatorError> for CoordinatorError {
    fn from(value: ValidatorError) -> Self {
        match value {
            ValidatorError::MalformedChain => CoordinatorError::MalformedChain,
            ValidatorError::UnknownIssuer => CoordinatorError::UnknownIssuer,
            ValidatorError::BadSignature => CoordinatorError::BadSignature,
            ValidatorError::Expired => CoordinatorError::Expired,
            ValidatorError::Unexpired => CoordinatorError::Unexpired,
            ValidatorError::OutOfWindow => CoordinatorError::OutOfWindow,
            ValidatorError::DisallowedEku => CoordinatorError::DisallowedEku,
            ValidatorError::DisallowedExtension => CoordinatorError::DisallowedExtension,
            ValidatorError::NotAPrecert => CoordinatorError::NotAPrecert,
            ValidatorError::IsAPrecert => CoordinatorError::IsAPrecert,
        }
    }
}

impl From<EntryError> for CoordinatorError {
    fn from(_: EntryError) -> Self {
        CoordinatorError::MalformedChain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SctSigner, SystemTimeSource, TrustPool};
    use p256::{ecdsa::SigningKey, pkcs8::EncodePrivateKey};
    use rand::rngs::OsRng;
    use statict_test::Fixture;
    use std::{
        collections::{BTreeMap, HashMap, HashSet},
        sync::Mutex,
    };

    #[derive(Default)]
    struct TestDedup(Mutex<HashMap<DedupKey, DedupValue>>);

    impl DedupStorage for TestDedup {
        async fn get(&self, key: DedupKey) -> Result<Option<DedupValue>, DedupError> {
            Ok(self.0.lock().unwrap().get(&key).copied())
        }

        async fn put(&self, key: DedupKey, value: DedupValue) -> Result<(), DedupError> {
            let mut map = self.0.lock().unwrap();
            match map.get(&key) {
                Some(existing) if *existing == value => Ok(()),
                Some(_) => Err(DedupError::Conflict),
                None => {
                    map.insert(key, value);
                    Ok(())
                }
            }
        }
    }

    #[derive(Default)]
    struct TestIssuers(Mutex<HashSet<[u8; 32]>>);

    impl IssuerStorage for TestIssuers {
        async fn exists(&self, fingerprint: [u8; 32]) -> Result<bool, IssuerStoreError> {
            Ok(self.0.lock().unwrap().contains(&fingerprint))
        }

        async fn put(&self, fingerprint: [u8; 32], _der: Vec<u8>) -> Result<(), IssuerStoreError> {
            self.0.lock().unwrap().insert(fingerprint);
            Ok(())
        }
    }

    #[derive(Default)]
    struct TestAppender(Mutex<BTreeMap<u64, Entry>>);

    impl Appender for TestAppender {
        async fn add(&self, entry: Entry) -> Result<u64, AppendError> {
            let mut log = self.0.lock().unwrap();
            let index = log.len() as u64;
            log.insert(index, entry);
            Ok(index)
        }
    }

    fn test_coordinator(fixture: &Fixture) -> SubmissionCoordinator<TestDedup, TestIssuers, TestAppender> {
        let trust_pool = TrustPool::from_pem(&fixture.root_pem()).unwrap();
        let policy = ValidationOpts::new(false, false, None, None, "Any", "").unwrap();

        let key = SigningKey::random(&mut OsRng);
        let pem = key.to_pkcs8_pem(Default::default()).unwrap().to_string();
        let signer = SctSigner::from_pkcs8_pem(&pem).unwrap();

        SubmissionCoordinator {
            trust_pool,
            policy,
            signer,
            dedup: TestDedup::default(),
            issuers: TestIssuers::default(),
            appender: TestAppender::default(),
            time_source: Box::new(SystemTimeSource),
            deadline: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn submit_accepts_a_leaf_chained_to_a_pool_intermediate() {
        let fixture = Fixture::new();
        let coordinator = test_coordinator(&fixture);

        let chain = vec![fixture.leaf.der(), fixture.intermediate.der()];
        let sct = coordinator.submit(&chain, false).await.unwrap();
        assert_eq!(sct.id(), coordinator.signer.log_id());
    }

    #[tokio::test]
    async fn submit_rejects_a_chain_with_no_trusted_root() {
        let fixture = Fixture::new();
        let coordinator = test_coordinator(&fixture);

        let chain = vec![fixture.leaf.der()];
        let err = coordinator.submit(&chain, false).await.unwrap_err();
        assert_eq!(err, CoordinatorError::UnknownIssuer);
    }

    #[tokio::test]
    async fn submit_rejects_add_chain_for_a_precert() {
        let fixture = Fixture::new();
        let coordinator = test_coordinator(&fixture);

        let chain = vec![
            fixture.precert_leaf_signed_by_intermediate.der(),
            fixture.intermediate.der(),
        ];
        let err = coordinator.submit(&chain, false).await.unwrap_err();
        assert_eq!(err, CoordinatorError::IsAPrecert);
    }

    #[tokio::test]
    async fn resubmitting_the_same_chain_returns_the_same_timestamp_and_index() {
        let fixture = Fixture::new();
        let coordinator = test_coordinator(&fixture);

        let chain = vec![fixture.leaf.der(), fixture.intermediate.der()];
        let first = coordinator.submit(&chain, false).await.unwrap();
        let second = coordinator.submit(&chain, false).await.unwrap();

        assert_eq!(first.timestamp(), second.timestamp());
        assert_eq!(
            first.extensions_bytes(),
            second.extensions_bytes(),
            "a dedup hit must reuse the original leaf index"
        );
    }

    #[tokio::test]
    async fn submitting_two_distinct_chains_assigns_distinct_indices() {
        let fixture = Fixture::new();
        let coordinator = test_coordinator(&fixture);

        let first_chain = vec![fixture.leaf.der(), fixture.intermediate.der()];
        let second_chain = vec![fixture.leaf_signed_by_root.der(), fixture.root.der()];

        let first = coordinator.submit(&first_chain, false).await.unwrap();
        let second = coordinator.submit(&second_chain, false).await.unwrap();

        assert_ne!(first.extensions_bytes(), second.extensions_bytes());
    }
}
