use p256::pkcs8::ObjectIdentifier;
use thiserror::Error;

/// Immutable validation policy, parsed once from configuration at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOpts {
    pub reject_expired: bool,
    pub reject_unexpired: bool,
    pub not_after_start: Option<u64>,
    pub not_after_limit: Option<u64>,
    pub ext_key_usages: EkuPolicy,
    pub reject_extension_oids: Vec<ObjectIdentifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EkuPolicy {
    /// EKU enforcement disabled (the `Any` name was present).
    Any,
    Allowlist(Vec<ObjectIdentifier>),
}

impl ValidationOpts {
    /// Build a policy from the raw configuration strings of §6.
    ///
    /// `ext_key_usages` is a comma-separated list of EKU names (`Any` disables
    /// enforcement); `reject_extensions` is a comma-separated list of dotted OIDs.
    pub fn new(
        reject_expired: bool,
        reject_unexpired: bool,
        not_after_start: Option<u64>,
        not_after_limit: Option<u64>,
        ext_key_usages: &str,
        reject_extensions: &str,
    ) -> Result<Self, PolicyError> {
        if reject_expired && reject_unexpired {
            return Err(PolicyError::ConflictingExpiryPolicy);
        }

        if let (Some(start), Some(limit)) = (not_after_start, not_after_limit) {
            if start >= limit {
                return Err(PolicyError::InvalidNotAfterWindow);
            }
        }

        let ext_key_usages = parse_ekus(ext_key_usages)?;
        let reject_extension_oids = parse_oids(reject_extensions)?;

        Ok(Self {
            reject_expired,
            reject_unexpired,
            not_after_start,
            not_after_limit,
            ext_key_usages,
            reject_extension_oids,
        })
    }
}

fn parse_ekus(raw: &str) -> Result<EkuPolicy, PolicyError> {
    let names: Vec<&str> = raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();

    if names.iter().any(|name| name.eq_ignore_ascii_case("any")) {
        return Ok(EkuPolicy::Any);
    }

    let oids = names
        .into_iter()
        .map(|name| eku_oid_for_name(name).ok_or_else(|| PolicyError::UnknownEku(name.to_string())))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EkuPolicy::Allowlist(oids))
}

fn parse_oids(raw: &str) -> Result<Vec<ObjectIdentifier>, PolicyError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|oid| {
            oid.parse::<ObjectIdentifier>()
                .map_err(|_| PolicyError::MalformedOid(oid.to_string()))
        })
        .collect()
}

fn eku_oid_for_name(name: &str) -> Option<ObjectIdentifier> {
    use const_oid::db::rfc5280::{
        ID_KP_CLIENT_AUTH, ID_KP_CODE_SIGNING, ID_KP_EMAIL_PROTECTION, ID_KP_OCSP_SIGNING,
        ID_KP_SERVER_AUTH, ID_KP_TIME_STAMPING,
    };

    Some(match name {
        "ServerAuth" => ID_KP_SERVER_AUTH,
        "ClientAuth" => ID_KP_CLIENT_AUTH,
        "CodeSigning" => ID_KP_CODE_SIGNING,
        "EmailProtection" => ID_KP_EMAIL_PROTECTION,
        "TimeStamping" => ID_KP_TIME_STAMPING,
        "OcspSigning" => ID_KP_OCSP_SIGNING,
        "CertificateTransparency" => crate::cert::CT_PRECERT_SIGNING_EKU,
        _ => return None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("rejectExpired and rejectUnexpired are mutually exclusive")]
    ConflictingExpiryPolicy,

    #[error("notAfterStart must be strictly before notAfterLimit")]
    InvalidNotAfterWindow,

    #[error("unknown extended key usage name: {0}")]
    UnknownEku(String),

    #[error("malformed OID: {0}")]
    MalformedOid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_disables_eku_enforcement() {
        let opts = ValidationOpts::new(false, false, None, None, "ServerAuth,Any", "").unwrap();
        assert_eq!(opts.ext_key_usages, EkuPolicy::Any);
    }

    #[test]
    fn parses_eku_allowlist() {
        let opts = ValidationOpts::new(false, false, None, None, "ServerAuth, ClientAuth", "").unwrap();
        assert_eq!(
            opts.ext_key_usages,
            EkuPolicy::Allowlist(vec![
                const_oid::db::rfc5280::ID_KP_SERVER_AUTH,
                const_oid::db::rfc5280::ID_KP_CLIENT_AUTH,
            ])
        );
    }

    #[test]
    fn unknown_eku_name_is_rejected() {
        assert_eq!(
            ValidationOpts::new(false, false, None, None, "NotAnEku", ""),
            Err(PolicyError::UnknownEku("NotAnEku".to_string()))
        );
    }

    #[test]
    fn conflicting_expiry_flags_are_rejected() {
        assert_eq!(
            ValidationOpts::new(true, true, None, None, "Any", ""),
            Err(PolicyError::ConflictingExpiryPolicy)
        );
    }

    #[test]
    fn reversed_notafter_window_is_rejected() {
        assert_eq!(
            ValidationOpts::new(false, false, Some(100), Some(50), "Any", ""),
            Err(PolicyError::InvalidNotAfterWindow)
        );
    }

    #[test]
    fn parses_dotted_reject_oids() {
        let opts = ValidationOpts::new(false, false, None, None, "Any", "1.3.6.1.4.1.11129.2.4.3").unwrap();
        assert_eq!(opts.reject_extension_oids.len(), 1);
    }
}
