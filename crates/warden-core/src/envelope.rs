//! Signature envelopes and signed data feeds

use serde::{Deserialize, Serialize};

/// Signature algorithm tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureAlg {
    /// secp256k1 over an EIP-191 personal-message digest
    Eip191,
    /// secp256k1 ECDSA
    Es256k,
    /// RSA PKCS#1 v1.5 with SHA-256
    Rs256,
    /// Ed25519
    Ed25519,
}

/// A detached signature with the key and algorithm that produced it
///
/// Owned by the request or response that references it; never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEnvelope {
    /// Hex-encoded signature bytes
    pub sig: String,
    /// Hex-encoded public key of the signer
    pub pub_key: String,
    /// Algorithm that produced `sig`
    pub alg: SignatureAlg,
}

impl SignatureEnvelope {
    /// Create an envelope from raw signature and key bytes
    pub fn new(sig: &[u8], pub_key: &[u8], alg: SignatureAlg) -> Self {
        Self {
            sig: hex::encode(sig),
            pub_key: hex::encode(pub_key),
            alg,
        }
    }
}

/// A signed envelope wrapping externally supplied context data
///
/// The signature binds `source` to `data` so every fact considered during a
/// decision can be attributed to an accountable origin. Feeds arrive already
/// validated; the engine checks only that `source` is recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed<T> {
    /// Identifier of the feed producer
    pub source: String,
    /// Hex-encoded signature over `data`, produced by the feed
    pub sig: String,
    /// The wrapped payload
    pub data: T,
}

impl<T> Feed<T> {
    /// Wrap data in a feed envelope
    pub fn new(source: impl Into<String>, sig: impl Into<String>, data: T) -> Self {
        Self {
            source: source.into(),
            sig: sig.into(),
            data,
        }
    }
}
