use crate::{
    Version,
    utils::{
        codec::{CodecError, Decode, Encode},
        codec_vec::CodecVec,
        u24::U24,
    },
};
use base64::{Engine, prelude::BASE64_STANDARD};
use sha2::{Digest, Sha256};
use std::io::{Cursor, Read, Write};

/// See RFC 6962 3.4
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LogEntryType {
    X509Entry,
    PrecertEntry,
}

impl Encode for LogEntryType {
    fn encode(&self, mut writer: impl Write) -> Result<(), CodecError> {
        let discriminant: u16 = match self {
            LogEntryType::X509Entry => 0,
            LogEntryType::PrecertEntry => 1,
        };
        discriminant.encode(&mut writer)
    }
}

impl Decode for LogEntryType {
    fn decode(mut reader: impl Read) -> Result<Self, CodecError> {
        match u16::decode(&mut reader)? {
            0 => Ok(LogEntryType::X509Entry),
            1 => Ok(LogEntryType::PrecertEntry),
            x => Err(CodecError::UnknownVariant("LogEntryType", x as u64)),
        }
    }
}

/// See RFC 6962 3.2 / 3.4. The `entry_type`-tagged payload a [`CertificateTimeStamp`]
/// signs over: either the leaf certificate DER itself, or a [`PreCert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LogEntry {
    X509Entry(CodecVec<U24>),
    PrecertEntry(PreCert),
}

impl LogEntry {
    pub(crate) fn x509(der: Vec<u8>) -> Self {
        Self::X509Entry(der.into())
    }

    pub(crate) fn precert(issuer_key_hash: [u8; 32], tbs_certificate: Vec<u8>) -> Self {
        Self::PrecertEntry(PreCert {
            issuer_key_hash,
            tbs_certificate: tbs_certificate.into(),
        })
    }
}

impl Encode for LogEntry {
    fn encode(&self, mut writer: impl Write) -> Result<(), CodecError> {
        match self {
            LogEntry::X509Entry(cert) => {
                LogEntryType::X509Entry.encode(&mut writer)?;
                cert.encode(&mut writer)?;
            }
            LogEntry::PrecertEntry(precert) => {
                LogEntryType::PrecertEntry.encode(&mut writer)?;
                precert.encode(&mut writer)?;
            }
        }
        Ok(())
    }
}

impl Decode for LogEntry {
    fn decode(mut reader: impl Read) -> Result<Self, CodecError> {
        match LogEntryType::decode(&mut reader)? {
            LogEntryType::X509Entry => Ok(LogEntry::X509Entry(CodecVec::decode(&mut reader)?)),
            LogEntryType::PrecertEntry => Ok(LogEntry::PrecertEntry(PreCert::decode(&mut reader)?)),
        }
    }
}

/// See RFC 6962 3.2
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PreCert {
    issuer_key_hash: [u8; 32],
    tbs_certificate: CodecVec<U24>,
}

impl Encode for PreCert {
    fn encode(&self, mut writer: impl Write) -> Result<(), CodecError> {
        self.issuer_key_hash.encode(&mut writer)?;
        self.tbs_certificate.encode(&mut writer)?;
        Ok(())
    }
}

impl Decode for PreCert {
    fn decode(mut reader: impl Read) -> Result<Self, CodecError> {
        Ok(Self {
            issuer_key_hash: <[u8; 32]>::decode(&mut reader)?,
            tbs_certificate: CodecVec::decode(&mut reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafHash([u8; 32]);

impl LeafHash {
    pub fn base64(&self) -> String {
        BASE64_STANDARD.encode(self.0)
    }

    pub fn bytes(&self) -> [u8; 32] {
        self.0
    }
}

/// See RFC 6962 3.4
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTreeLeaf {
    version: Version,
    leaf: Leaf,
}

impl MerkleTreeLeaf {
    pub(crate) fn new(version: Version, timestamp: u64, entry: LogEntry, extensions: CodecVec<u16>) -> Self {
        Self {
            version,
            leaf: Leaf::TimestampedEntry(TimestampedEntry {
                timestamp,
                log_entry: entry,
                extensions,
            }),
        }
    }

    /// The RFC 6962 leaf hash: SHA-256 of a `0x00` prefix followed by the
    /// TLS-encoded leaf.
    pub fn hash(&self) -> Result<LeafHash, CodecError> {
        let mut bytes = Cursor::new(vec![0u8]);
        bytes.set_position(1);
        self.encode(&mut bytes)?;

        let hash: [u8; 32] = Sha256::digest(bytes.into_inner()).into();
        Ok(LeafHash(hash))
    }
}

impl Encode for MerkleTreeLeaf {
    fn encode(&self, mut writer: impl Write) -> Result<(), CodecError> {
        self.version.encode(&mut writer)?;
        self.leaf.encode(&mut writer)?;
        Ok(())
    }
}

impl Decode for MerkleTreeLeaf {
    fn decode(mut reader: impl Read) -> Result<Self, CodecError> {
        Ok(Self {
            version: Version::decode(&mut reader)?,
            leaf: Leaf::decode(&mut reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Leaf {
    TimestampedEntry(TimestampedEntry),
}

impl Encode for Leaf {
    fn encode(&self, mut writer: impl Write) -> Result<(), CodecError> {
        match self {
            Leaf::TimestampedEntry(entry) => {
                writer.write_all(&[0])?;
                entry.encode(&mut writer)?;
            }
        };
        Ok(())
    }
}

impl Decode for Leaf {
    fn decode(mut reader: impl Read) -> Result<Self, CodecError> {
        let mut buf = vec![0u8];
        reader.read_exact(&mut buf)?;

        match buf[0] {
            0 => Ok(Leaf::TimestampedEntry(TimestampedEntry::decode(
                &mut reader,
            )?)),
            val => Err(CodecError::UnknownVariant("MerkleLeafType", val as u64)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TimestampedEntry {
    timestamp: u64,
    log_entry: LogEntry,
    extensions: CodecVec<u16>,
}

impl Encode for TimestampedEntry {
    fn encode(&self, mut writer: impl Write) -> Result<(), CodecError> {
        self.timestamp.encode(&mut writer)?;
        self.log_entry.encode(&mut writer)?;
        self.extensions.encode(&mut writer)?;
        Ok(())
    }
}

impl Decode for TimestampedEntry {
    fn decode(mut reader: impl Read) -> Result<Self, CodecError> {
        Ok(Self {
            timestamp: u64::decode(&mut reader)?,
            log_entry: LogEntry::decode(&mut reader)?,
            extensions: CodecVec::decode(&mut reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x509_leaf_hash_is_deterministic() {
        let entry = LogEntry::x509(vec![1, 2, 3, 4]);
        let leaf = MerkleTreeLeaf::new(Version::V1, 1_000, entry, vec![].into());
        let a = leaf.hash().unwrap();
        let b = leaf.hash().unwrap();
        assert_eq!(a.bytes(), b.bytes());
    }

    #[test]
    fn precert_and_x509_leaves_hash_differently() {
        let x509 = MerkleTreeLeaf::new(
            Version::V1,
            1_000,
            LogEntry::x509(vec![1, 2, 3, 4]),
            vec![].into(),
        );
        let precert = MerkleTreeLeaf::new(
            Version::V1,
            1_000,
            LogEntry::precert([7u8; 32], vec![1, 2, 3, 4]),
            vec![].into(),
        );
        assert_ne!(x509.hash().unwrap().bytes(), precert.hash().unwrap().bytes());
    }

    #[test]
    fn log_entry_round_trips() {
        let entry = LogEntry::precert([3u8; 32], vec![9, 9, 9]);
        let mut buf = vec![];
        entry.encode(&mut buf).unwrap();
        let decoded = LogEntry::decode(Cursor::new(buf)).unwrap();
        assert_eq!(entry, decoded);
    }
}
