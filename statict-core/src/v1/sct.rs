use crate::{
    Version,
    signer::Signature,
    utils::{
        append_vec::AppendVec,
        codec::{CodecError, Decode, Encode},
        codec_vec::CodecVec,
    },
    v1::{LogEntry, SignatureType},
};
use std::io::{Read, Write};

/// The log ID: SHA-256 of the log's public key, per RFC 6962 3.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogId(pub [u8; 32]);

impl Encode for LogId {
    fn encode(&self, mut writer: impl Write) -> Result<(), CodecError> {
        self.0.encode(&mut writer)
    }
}

impl Decode for LogId {
    fn decode(mut reader: impl Read) -> Result<Self, CodecError> {
        Ok(Self(<[u8; 32]>::decode(&mut reader)?))
    }
}

/// See RFC 6962 3.3
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SctList(AppendVec<SignedCertificateTimestamp>);

impl SctList {
    #[allow(dead_code)]
    pub fn new(scts: Vec<SignedCertificateTimestamp>) -> Self {
        Self(AppendVec::from(scts))
    }

    pub fn into_inner(self) -> Vec<SignedCertificateTimestamp> {
        self.0.into()
    }
}

impl Encode for SctList {
    fn encode(&self, writer: impl Write) -> Result<(), CodecError> {
        self.0.encode(writer)
    }
}

impl Decode for SctList {
    fn decode(reader: impl Read) -> Result<Self, CodecError> {
        Ok(Self(AppendVec::decode(reader)?))
    }
}

/// A signed certificate timestamp of version 1.
///
/// See RFC 6962 3.2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCertificateTimestamp {
    pub(crate) sct_version: Version,
    pub(crate) id: LogId,
    pub(crate) timestamp: u64,
    pub(crate) extensions: CodecVec<u16>,
    pub(crate) signature: Signature<CertificateTimeStamp>,
}

impl SignedCertificateTimestamp {
    pub(crate) fn new(
        id: LogId,
        timestamp: u64,
        extensions: CodecVec<u16>,
        signature: Signature<CertificateTimeStamp>,
    ) -> Self {
        Self {
            sct_version: Version::V1,
            id,
            timestamp,
            extensions,
            signature,
        }
    }

    pub fn id(&self) -> LogId {
        self.id
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn extensions_bytes(&self) -> &[u8] {
        self.extensions.as_ref()
    }

    pub fn signature_tls_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = vec![];
        self.signature.encode(&mut buf)?;
        Ok(buf)
    }
}

impl Encode for SignedCertificateTimestamp {
    fn encode(&self, mut writer: impl Write) -> Result<(), CodecError> {
        self.sct_version.encode(&mut writer)?;
        self.id.encode(&mut writer)?;
        self.timestamp.encode(&mut writer)?;
        self.extensions.encode(&mut writer)?;
        self.signature.encode(&mut writer)?;
        Ok(())
    }
}

impl Decode for SignedCertificateTimestamp {
    fn decode(mut reader: impl Read) -> Result<Self, CodecError> {
        Ok(Self {
            sct_version: Version::decode(&mut reader)?,
            id: LogId::decode(&mut reader)?,
            timestamp: u64::decode(&mut reader)?,
            extensions: CodecVec::decode(&mut reader)?,
            signature: Signature::decode(&mut reader)?,
        })
    }
}

/// The value a [`SignedCertificateTimestamp`]'s signature is computed over.
///
/// See RFC 6962 3.2
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CertificateTimeStamp {
    sct_version: Version,
    timestamp: u64,
    entry: LogEntry,
    extensions: CodecVec<u16>,
}

impl CertificateTimeStamp {
    pub(crate) fn new(timestamp: u64, entry: LogEntry, extensions: CodecVec<u16>) -> Self {
        Self {
            sct_version: Version::V1,
            timestamp,
            entry,
            extensions,
        }
    }
}

impl Encode for CertificateTimeStamp {
    fn encode(&self, mut writer: impl Write) -> Result<(), CodecError> {
        self.sct_version.encode(&mut writer)?;
        SignatureType::CertificateTimeStamp.encode(&mut writer)?;
        self.timestamp.encode(&mut writer)?;
        self.entry.encode(&mut writer)?;
        self.extensions.encode(&mut writer)?;
        Ok(())
    }
}

impl Decode for CertificateTimeStamp {
    fn decode(mut reader: impl Read) -> Result<Self, CodecError> {
        let sct_version = Version::decode(&mut reader)?;
        let signature_type = SignatureType::decode(&mut reader)?;
        match signature_type {
            SignatureType::TreeHash => return Err(CodecError::UnexpectedVariant),
            SignatureType::CertificateTimeStamp => (),
        }
        let timestamp = u64::decode(&mut reader)?;
        let entry = LogEntry::decode(&mut reader)?;
        let extensions = CodecVec::decode(&mut reader)?;

        Ok(Self {
            sct_version,
            timestamp,
            entry,
            extensions,
        })
    }
}

