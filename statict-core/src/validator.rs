use crate::{
    cert::Certificate,
    policy::{EkuPolicy, ValidationOpts},
    trust_pool::TrustPool,
};
use thiserror::Error;

/// An ordered, verified chain `[leaf, int_0, …, int_{k-1}, root]`, `k >= 0`,
/// produced by [`validate_chain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedChain(Vec<Certificate>);

impl ValidatedChain {
    pub fn leaf(&self) -> &Certificate {
        &self.0[0]
    }

    /// The immediate issuer of the leaf — an intermediate, or the root itself
    /// in the minimal two-certificate chain.
    pub fn issuer(&self) -> &Certificate {
        &self.0[1]
    }

    pub fn root(&self) -> &Certificate {
        self.0.last().expect("a validated chain always has a root")
    }

    /// Every certificate above the leaf, from the immediate issuer upward to
    /// and including the root.
    pub fn intermediates_and_root(&self) -> &[Certificate] {
        &self.0[1..]
    }

    pub fn certs(&self) -> &[Certificate] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidatorError {
    #[error("the submitted chain is malformed")]
    MalformedChain,

    #[error("the chain does not terminate at a trusted root")]
    UnknownIssuer,

    #[error("a candidate parent certificate fails to verify the child's signature")]
    BadSignature,

    #[error("the leaf certificate has expired")]
    Expired,

    #[error("the leaf certificate has not yet expired")]
    Unexpired,

    #[error("the leaf certificate's NotAfter is outside the configured window")]
    OutOfWindow,

    #[error("the leaf certificate does not carry an allowed extended key usage")]
    DisallowedEku,

    #[error("the leaf certificate carries a disallowed extension")]
    DisallowedExtension,

    #[error("add-pre-chain was used with a certificate that does not carry the CT poison extension")]
    NotAPrecert,

    #[error("add-chain was used with a certificate that carries the CT poison extension")]
    IsAPrecert,
}

/// Validate a submitted chain (leaf first) against `pool` and `opts`, per §4.C.
pub fn validate_chain(
    submitted: &[Certificate],
    pool: &TrustPool,
    opts: &ValidationOpts,
    is_precert: bool,
    now_ms: u64,
) -> Result<ValidatedChain, ValidatorError> {
    let leaf = submitted.first().ok_or(ValidatorError::MalformedChain)?;

    let mut chain = vec![leaf.clone()];
    let mut submitted_idx = 1usize;

    loop {
        let current = chain.last().expect("chain always has at least the leaf");

        if let Some(root) = pool.find_verifying_root(current) {
            if current.subject_der() != root.subject_der() {
                chain.push(root);
            }
            break;
        }

        let Some(parent) = submitted.get(submitted_idx) else {
            return Err(ValidatorError::UnknownIssuer);
        };

        if parent.subject_der() != current.issuer_der() {
            return Err(ValidatorError::UnknownIssuer);
        }

        current
            .verify_signed_by(parent)
            .map_err(|_| ValidatorError::BadSignature)?;

        enforce_intermediate_constraints(parent)?;

        chain.push(parent.clone());
        submitted_idx += 1;

        if submitted_idx > submitted.len() + 1 {
            return Err(ValidatorError::MalformedChain);
        }
    }

    enforce_path_length(&chain)?;
    enforce_leaf_policy(leaf, opts, now_ms)?;
    enforce_precert_marker(leaf, is_precert)?;

    Ok(ValidatedChain(chain))
}

fn enforce_intermediate_constraints(cert: &Certificate) -> Result<(), ValidatorError> {
    let Some(bc) = cert.basic_constraints() else {
        return Err(ValidatorError::MalformedChain);
    };
    if !bc.ca {
        return Err(ValidatorError::MalformedChain);
    }
    if let Some(ku) = cert.key_usage() {
        if !ku.key_cert_sign() {
            return Err(ValidatorError::MalformedChain);
        }
    }
    Ok(())
}

fn enforce_path_length(chain: &[Certificate]) -> Result<(), ValidatorError> {
    let root_idx = chain.len() - 1;
    for (i, cert) in chain.iter().enumerate().skip(1) {
        if i == root_idx {
            continue;
        }
        if let Some(bc) = cert.basic_constraints() {
            if let Some(path_len) = bc.path_len_constraint {
                let certs_below = (i - 1) as u32;
                if certs_below > path_len as u32 {
                    return Err(ValidatorError::MalformedChain);
                }
            }
        }
    }
    Ok(())
}

fn enforce_leaf_policy(
    leaf: &Certificate,
    opts: &ValidationOpts,
    now_ms: u64,
) -> Result<(), ValidatorError> {
    let not_after = leaf.not_after_ms();

    if opts.reject_expired && not_after <= now_ms {
        return Err(ValidatorError::Expired);
    }
    if opts.reject_unexpired && not_after > now_ms {
        return Err(ValidatorError::Unexpired);
    }
    if let Some(start) = opts.not_after_start {
        if not_after < start {
            return Err(ValidatorError::OutOfWindow);
        }
    }
    if let Some(limit) = opts.not_after_limit {
        if not_after >= limit {
            return Err(ValidatorError::OutOfWindow);
        }
    }

    if let EkuPolicy::Allowlist(allowed) = &opts.ext_key_usages {
        let ekus = leaf.extended_key_usages();
        if !ekus.iter().any(|eku| allowed.contains(eku)) {
            return Err(ValidatorError::DisallowedEku);
        }
    }

    for oid in &opts.reject_extension_oids {
        if leaf.has_extension(*oid) {
            return Err(ValidatorError::DisallowedExtension);
        }
    }

    Ok(())
}

fn enforce_precert_marker(leaf: &Certificate, is_precert: bool) -> Result<(), ValidatorError> {
    let carries_poison = leaf.has_poison_extension();
    match (is_precert, carries_poison) {
        (true, false) => Err(ValidatorError::NotAPrecert),
        (false, true) => Err(ValidatorError::IsAPrecert),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statict_test::Fixture;

    fn opts() -> ValidationOpts {
        ValidationOpts::new(false, false, None, None, "Any", "").unwrap()
    }

    #[test]
    fn minimal_chain_signed_directly_by_root() {
        let fixture = Fixture::new();
        let pool = TrustPool::from_pem(&fixture.root_pem()).unwrap();
        let chain = validate_chain(
            &[fixture.leaf_signed_by_root.clone()],
            &pool,
            &opts(),
            false,
            fixture.now_ms,
        )
        .unwrap();
        assert_eq!(chain.certs().len(), 2);
        assert_eq!(chain.root(), &fixture.root);
    }

    #[test]
    fn chain_through_intermediate() {
        let fixture = Fixture::new();
        let pool = TrustPool::from_pem(&fixture.root_pem()).unwrap();
        let chain = validate_chain(
            &[fixture.leaf.clone(), fixture.intermediate.clone()],
            &pool,
            &opts(),
            false,
            fixture.now_ms,
        )
        .unwrap();
        assert_eq!(chain.certs().len(), 3);
    }

    #[test]
    fn unknown_issuer_without_trust_pool_match() {
        let fixture = Fixture::new();
        let pool = TrustPool::from_pem(&fixture.root_pem()).unwrap();
        let err = validate_chain(&[fixture.leaf.clone()], &pool, &opts(), false, fixture.now_ms)
            .unwrap_err();
        assert_eq!(err, ValidatorError::UnknownIssuer);
    }

    #[test]
    fn add_chain_rejects_precert_leaf() {
        let fixture = Fixture::new();
        let pool = TrustPool::from_pem(&fixture.root_pem()).unwrap();
        let err = validate_chain(
            &[
                fixture.precert_leaf.clone(),
                fixture.precert_signing_ca.clone(),
                fixture.intermediate.clone(),
            ],
            &pool,
            &opts(),
            false,
            fixture.now_ms,
        )
        .unwrap_err();
        assert_eq!(err, ValidatorError::IsAPrecert);
    }

    #[test]
    fn add_pre_chain_rejects_regular_leaf() {
        let fixture = Fixture::new();
        let pool = TrustPool::from_pem(&fixture.root_pem()).unwrap();
        let err = validate_chain(
            &[fixture.leaf.clone(), fixture.intermediate.clone()],
            &pool,
            &opts(),
            true,
            fixture.now_ms,
        )
        .unwrap_err();
        assert_eq!(err, ValidatorError::NotAPrecert);
    }

    #[test]
    fn expired_leaf_rejected_when_configured() {
        let fixture = Fixture::new();
        let pool = TrustPool::from_pem(&fixture.root_pem()).unwrap();
        let strict = ValidationOpts::new(true, false, None, None, "Any", "").unwrap();
        let not_after = fixture.leaf.not_after_ms();
        let err = validate_chain(
            &[fixture.leaf.clone(), fixture.intermediate.clone()],
            &pool,
            &strict,
            false,
            not_after,
        )
        .unwrap_err();
        assert_eq!(err, ValidatorError::Expired);
    }
}
