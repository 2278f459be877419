//! Cryptographic primitives for the DGC backbone (spec §4.A).
//!
//! Pure functions only: canonical JSON (RFC 8785 via the JSON Canonicalization
//! Scheme), SHA-256 hex digests, and Ed25519 sign/verify/derive over raw
//! 32-byte keys. No I/O, no process-global state.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("value could not be canonicalized: {0}")]
    Canonicalize(String),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("invalid signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),
    #[error("signature does not verify")]
    VerificationFailed,
}

/// Serializes `value` to RFC 8785 canonical JSON bytes.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>, CryptoError> {
    serde_jcs::to_vec(value).map_err(|e| CryptoError::Canonicalize(e.to_string()))
}

/// Serializes `value` to a canonical JSON string.
pub fn canonical_json_string<T: Serialize>(value: &T) -> Result<String, CryptoError> {
    serde_jcs::to_string(value).map_err(|e| CryptoError::Canonicalize(e.to_string()))
}

/// Lowercase hex SHA-256 digest of the UTF-8 bytes of `s`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}

/// `sha256Hex(canonicalJSON(value))`, the hash used for `payloadHash`/`proofHash`/`eventHash`.
pub fn hash_canonical<T: Serialize>(value: &T) -> Result<String, CryptoError> {
    let bytes = canonical_json(value)?;
    Ok(sha256_hex(&bytes))
}

/// Keccak-256 of the UTF-8 bytes of `s`, used by the chain sink to collapse
/// non-hex identifiers to 32 bytes (spec §4.C, §9 Open Question ii).
pub fn keccak256(bytes: &[u8]) -> [u8; 32] {
    let digest = Keccak256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

fn decode_32(hex_str: &str) -> Result<[u8; 32], CryptoError> {
    let bytes = hex::decode(hex_str).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(CryptoError::InvalidKeyLength(bytes.len()));
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

/// Signs a hex-encoded hash with a hex-encoded Ed25519 secret key, returning
/// a hex-encoded signature.
pub fn sign(hash_hex: &str, sk_hex: &str) -> Result<String, CryptoError> {
    let sk_bytes = decode_32(sk_hex)?;
    let signing_key = SigningKey::from_bytes(&sk_bytes);
    let msg = hex::decode(hash_hex).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
    let sig: Signature = signing_key.sign(&msg);
    Ok(hex::encode(sig.to_bytes()))
}

/// Verifies a hex-encoded signature over a hex-encoded hash with a hex-encoded
/// Ed25519 public key. Returns `false` (never an error) on any malformed input
/// or verification failure, per spec §4.D: "on any exception it is false".
pub fn verify(hash_hex: &str, sig_hex: &str, pk_hex: &str) -> bool {
    (|| -> Result<bool, CryptoError> {
        let pk_bytes = decode_32(pk_hex)?;
        let verifying_key =
            VerifyingKey::from_bytes(&pk_bytes).map_err(|_| CryptoError::VerificationFailed)?;
        let msg = hex::decode(hash_hex).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        let sig_bytes = hex::decode(sig_hex).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        if sig_bytes.len() != 64 {
            return Err(CryptoError::InvalidSignatureLength(sig_bytes.len()));
        }
        let mut sig_arr = [0u8; 64];
        sig_arr.copy_from_slice(&sig_bytes);
        let signature = Signature::from_bytes(&sig_arr);
        Ok(verifying_key.verify(&msg, &signature).is_ok())
    })()
    .unwrap_or(false)
}

/// Derives the hex-encoded Ed25519 public key for a hex-encoded secret key.
pub fn derive_pk(sk_hex: &str) -> Result<String, CryptoError> {
    let sk_bytes = decode_32(sk_hex)?;
    let signing_key = SigningKey::from_bytes(&sk_bytes);
    Ok(hex::encode(signing_key.verifying_key().to_bytes()))
}

/// Generates a fresh random Ed25519 secret key, hex-encoded. Used by tests
/// and local bootstrapping; production issuer keys come from
/// `ISSUER_PRIVATE_KEY_HEX`.
pub fn generate_sk_hex() -> String {
    let mut rng = rand::rngs::OsRng;
    let signing_key = SigningKey::generate(&mut rng);
    hex::encode(signing_key.to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_json_is_idempotent() {
        let value = json!({"b": 2, "a": 1, "nested": {"z": true, "y": null}});
        let once = canonical_json_string(&value).unwrap();
        let reparsed: serde_json::Value = serde_json::from_str(&once).unwrap();
        let twice = canonical_json_string(&reparsed).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn canonical_json_sorts_keys() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(
            canonical_json_string(&a).unwrap(),
            canonical_json_string(&b).unwrap()
        );
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let sk_hex = generate_sk_hex();
        let pk_hex = derive_pk(&sk_hex).unwrap();
        let hash_hex = sha256_hex(b"hello world");
        let sig_hex = sign(&hash_hex, &sk_hex).unwrap();
        assert!(verify(&hash_hex, &sig_hex, &pk_hex));
    }

    #[test]
    fn tampered_hash_fails_verification() {
        let sk_hex = generate_sk_hex();
        let pk_hex = derive_pk(&sk_hex).unwrap();
        let hash_hex = sha256_hex(b"hello world");
        let sig_hex = sign(&hash_hex, &sk_hex).unwrap();
        let tampered_hash = sha256_hex(b"hello world!");
        assert!(!verify(&tampered_hash, &sig_hex, &pk_hex));
    }

    #[test]
    fn malformed_signature_is_false_not_panic() {
        let pk_hex = derive_pk(&generate_sk_hex()).unwrap();
        assert!(!verify("deadbeef", "not-hex", &pk_hex));
        assert!(!verify("deadbeef", "aa", &pk_hex));
    }

    #[test]
    fn keccak256_is_deterministic() {
        assert_eq!(keccak256(b"dgc"), keccak256(b"dgc"));
        assert_ne!(keccak256(b"dgc"), keccak256(b"dgx"));
    }
}
