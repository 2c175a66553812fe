//! The request/response structures of a v1 log's submission endpoints.
//!
//! These structures correspond to the ones described in RFC 6962 Section 4.1,
//! 4.2 and 4.8, and are parsed/produced with `serde_json`.

use crate::{
    CodecError, trust_pool::TrustPool, utils::base64::Base64, v1::sct::SignedCertificateTimestamp,
};
use serde::{Deserialize, Serialize};

/// Request body of `/ct/v1/add-chain` and `/ct/v1/add-pre-chain`.
///
/// See RFC 6962 4.1 / 4.2
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddChainRequest {
    pub chain: Vec<Base64<Vec<u8>>>,
}

impl AddChainRequest {
    /// The raw DER bytes of each certificate in submission order, leaf first.
    pub fn der_chain(&self) -> Vec<Vec<u8>> {
        self.chain.iter().map(|cert| cert.0.clone()).collect()
    }
}

/// Response returned by `/ct/v1/add-chain` and `/ct/v1/add-pre-chain`.
///
/// See RFC 6962 4.1 / 4.2
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddChainResponse {
    pub sct_version: u8,
    pub id: Base64<Vec<u8>>,
    pub timestamp: u64,
    pub extensions: Base64<Vec<u8>>,
    pub signature: Base64<Vec<u8>>,
}

impl AddChainResponse {
    pub fn from_sct(sct: &SignedCertificateTimestamp) -> Result<Self, CodecError> {
        Ok(Self {
            sct_version: 0,
            id: Base64(sct.id().0.to_vec()),
            timestamp: sct.timestamp(),
            extensions: Base64(sct.extensions_bytes().to_vec()),
            signature: Base64(sct.signature_tls_bytes()?),
        })
    }
}

/// Response returned by `/ct/v1/get-roots`.
///
/// See RFC 6962 4.8
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRootsResponse {
    pub certificates: Vec<Base64<Vec<u8>>>,
}

impl GetRootsResponse {
    pub fn from_trust_pool(pool: &TrustPool) -> Self {
        Self {
            certificates: pool.roots().iter().map(|root| Base64(root.der())).collect(),
        }
    }
}
