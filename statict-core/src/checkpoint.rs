use crate::signer::SctSigner;
use base64::{Engine, prelude::BASE64_STANDARD};
use p256::ecdsa::{SigningKey, signature::Signer as _};

/// A checkpoint: a signed statement of the current tree size and root hash,
/// in the note format used by C2SP-style transparency logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub origin: String,
    pub tree_size: u64,
    pub root_hash: [u8; 32],
}

impl Checkpoint {
    pub fn new(origin: impl Into<String>, tree_size: u64, root_hash: [u8; 32]) -> Self {
        Self {
            origin: origin.into(),
            tree_size,
            root_hash,
        }
    }

    /// The unsigned note body: origin, tree size and base64 root hash, one
    /// per line, each newline-terminated.
    pub fn body(&self) -> String {
        format!(
            "{}\n{}\n{}\n",
            self.origin,
            self.tree_size,
            BASE64_STANDARD.encode(self.root_hash)
        )
    }

    /// Sign this checkpoint, producing the full note text: the body, a blank
    /// line, then one `— <name> <signature>` line per signer.
    pub fn sign(&self, signer: &CheckpointSigner) -> String {
        let body = self.body();
        let signature = signer.sign(body.as_bytes());

        format!(
            "{body}\n\u{2014} {} {}\n",
            signer.name,
            BASE64_STANDARD.encode(signature)
        )
    }
}

/// Signs checkpoints on behalf of this log, using the same key that signs SCTs.
#[derive(Debug, Clone)]
pub struct CheckpointSigner {
    name: String,
    key: SigningKey,
}

impl CheckpointSigner {
    pub fn new(name: impl Into<String>, sct_signer: &SctSigner) -> Self {
        Self {
            name: name.into(),
            key: sct_signer.signing_key().clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn sign(&self, msg: &[u8]) -> Vec<u8> {
        let signature: p256::ecdsa::Signature = self.key.sign(msg);
        signature.to_der().as_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::pkcs8::EncodePrivateKey;
    use rand::rngs::OsRng;

    fn test_signer() -> (SctSigner, CheckpointSigner) {
        let key = SigningKey::random(&mut OsRng);
        let pem = key
            .to_pkcs8_pem(Default::default())
            .unwrap()
            .to_string();
        let sct_signer = SctSigner::from_pkcs8_pem(&pem).unwrap();
        let checkpoint_signer = CheckpointSigner::new("example.com/testlog", &sct_signer);
        (sct_signer, checkpoint_signer)
    }

    #[test]
    fn body_has_three_lines() {
        let checkpoint = Checkpoint::new("example.com/testlog", 42, [9u8; 32]);
        assert_eq!(checkpoint.body().lines().count(), 3);
    }

    #[test]
    fn signed_text_contains_the_body_and_signature_line() {
        let (_sct_signer, checkpoint_signer) = test_signer();
        let checkpoint = Checkpoint::new("example.com/testlog", 42, [9u8; 32]);
        let text = checkpoint.sign(&checkpoint_signer);

        assert!(text.starts_with(&checkpoint.body()));
        assert!(text.contains("\u{2014} example.com/testlog "));
    }
}
