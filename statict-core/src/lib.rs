pub mod appender;
mod cert;
pub mod checkpoint;
pub mod chain;
pub mod coordinator;
pub mod dedup;
mod entry;
pub mod issuer;
pub mod policy;
pub mod signer;
pub mod time_source;
pub mod trust_pool;
pub(crate) mod utils;
pub mod v1;
pub mod validator;
mod version;

pub use appender::{AppendError, Appender};
pub use cert::{Certificate, CertificateError, Fingerprint};
pub use utils::codec::CodecError;
pub use checkpoint::{Checkpoint, CheckpointSigner};
pub use chain::{CertificateChain, ChainError};
pub use coordinator::{CoordinatorError, SubmissionCoordinator};
pub use dedup::{DedupError, DedupKey, DedupStorage, DedupValue};
pub use entry::{CanonicalLeaf, Entry, EntryError};
pub use issuer::{IssuerStorage, IssuerStoreError};
pub use policy::{EkuPolicy, PolicyError, ValidationOpts};
pub use signer::{HashAlgorithm, SctSigner, SignatureAlgorithm, SignatureValidationError, SignerError};
pub use time_source::{FixedTimeSource, SystemTimeSource, TimeSource};
pub use trust_pool::{TrustPool, TrustPoolError};
pub use validator::{ValidatedChain, ValidatorError};
pub use version::Version;
