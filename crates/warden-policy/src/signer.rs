//! Response signing
//!
//! The resolver signs every evaluation response so downstream consumers can
//! attribute a decision to the engine that produced it. In high-assurance
//! deployments the signer is a vault collaborator; the in-process Ed25519
//! implementation covers single-node deployments and tests.

use async_trait::async_trait;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use warden_core::{SignatureAlg, SignatureEnvelope};

use crate::error::EvalResult;

/// Signs evaluation responses on behalf of an engine node
#[async_trait]
pub trait ResponseSigner: Send + Sync {
    /// Sign a payload
    async fn sign(&self, payload: &[u8]) -> EvalResult<SignatureEnvelope>;

    /// Verify a signature over a payload
    async fn verify(&self, payload: &[u8], signature: &SignatureEnvelope) -> bool;
}

/// In-process Ed25519 signer
#[derive(Debug, Clone)]
pub struct Ed25519ResponseSigner {
    signing_key: SigningKey,
}

impl Ed25519ResponseSigner {
    /// Generate a fresh signing key
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Construct from existing key bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    /// The verifying key for this signer
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

#[async_trait]
impl ResponseSigner for Ed25519ResponseSigner {
    async fn sign(&self, payload: &[u8]) -> EvalResult<SignatureEnvelope> {
        let signature = self.signing_key.sign(payload);
        Ok(SignatureEnvelope::new(
            &signature.to_bytes(),
            self.signing_key.verifying_key().as_bytes(),
            SignatureAlg::Ed25519,
        ))
    }

    async fn verify(&self, payload: &[u8], envelope: &SignatureEnvelope) -> bool {
        if envelope.alg != SignatureAlg::Ed25519 {
            return false;
        }
        let Ok(sig_bytes) = hex::decode(&envelope.sig) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&sig_bytes) else {
            return false;
        };
        let Ok(key_bytes) = hex::decode(&envelope.pub_key) else {
            return false;
        };
        let Ok(key_array) = <[u8; 32]>::try_from(key_bytes.as_slice()) else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(&key_array) else {
            return false;
        };
        verifying_key.verify(payload, &signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_verify_round_trip() {
        let signer = Ed25519ResponseSigner::generate();
        let envelope = signer.sign(b"decision").await.unwrap();
        assert!(signer.verify(b"decision", &envelope).await);
        assert!(!signer.verify(b"tampered", &envelope).await);
    }

    #[tokio::test]
    async fn wrong_algorithm_fails_verification() {
        let signer = Ed25519ResponseSigner::generate();
        let mut envelope = signer.sign(b"decision").await.unwrap();
        envelope.alg = SignatureAlg::Rs256;
        assert!(!signer.verify(b"decision", &envelope).await);
    }
}
