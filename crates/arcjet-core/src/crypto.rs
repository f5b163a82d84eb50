//! Cryptographic primitives for Arcjet.
//!
//! Wraps SHA-512 hashing and ECDSA over NIST P-521 with strong types. The
//! signature primitive hashes its input with SHA-512 internally, so callers
//! hand it the raw message and never pre-hash.

use p521::ecdsa::signature::{RandomizedSigner, Verifier};
use p521::ecdsa::{SigningKey, VerifyingKey};
use p521::elliptic_curve::sec1::ToEncodedPoint;
use p521::elliptic_curve::zeroize::Zeroizing;
use rand::rngs::OsRng;
use serde_json::Value;
use sha2::{Digest, Sha512};
use std::fmt;
use subtle::ConstantTimeEq;

use crate::error::CryptoError;

/// Length in bytes of a raw `r || s` P-521 signature.
pub const SIGNATURE_LEN: usize = 132;

/// A 64-byte SHA-512 hash.
///
/// Equality is byte-wise and constant-time.
#[derive(Clone, Copy, Eq, Hash)]
pub struct Sha512Hash(pub [u8; 64]);

impl Sha512Hash {
    /// Compute the SHA-512 hash of the given data.
    pub fn hash(data: &[u8]) -> Self {
        Self::hash_parts(&[data])
    }

    /// Hash the concatenation of several byte slices.
    pub fn hash_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha512::new();
        for part in parts {
            hasher.update(part);
        }
        let mut out = [0u8; 64];
        out.copy_from_slice(&hasher.finalize());
        Self(out)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut arr = [0u8; 64];
        hex::decode_to_slice(s, &mut arr)?;
        Ok(Self(arr))
    }
}

impl PartialEq for Sha512Hash {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl fmt::Debug for Sha512Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha512({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Sha512Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Sha512Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 64]> for Sha512Hash {
    fn from(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }
}

/// An ECDSA P-521 signature in fixed-width `r || s` form.
///
/// Held as a byte vector: bytes read back from the wire or an index are not
/// trusted to be well-formed until verification parses them.
#[derive(Clone, Eq)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self(hex::decode(s)?))
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "P521Sig({}...)", &hex[..hex.len().min(16)])
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A P-521 public key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(p521::PublicKey);

impl PublicKey {
    /// Parse an uncompressed or compressed SEC1 point.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        p521::PublicKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// Encode as an uncompressed SEC1 point.
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(false).as_bytes().to_vec()
    }

    /// Parse a JWK (`{"kty":"EC","crv":"P-521",...}`).
    pub fn from_jwk_str(jwk: &str) -> Result<Self, CryptoError> {
        p521::PublicKey::from_jwk_str(jwk)
            .map(Self)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// Encode as a JWK string.
    pub fn to_jwk_string(&self) -> String {
        self.0.to_jwk_string()
    }

    /// Parse a JWK held as a JSON value, as embedded in record metadata.
    pub fn from_jwk_value(jwk: &Value) -> Result<Self, CryptoError> {
        if !jwk.is_object() {
            return Err(CryptoError::InvalidKey("JWK must be a JSON object".into()));
        }
        Self::from_jwk_str(&jwk.to_string())
    }

    /// Encode as a JWK JSON value.
    pub fn to_jwk_value(&self) -> Result<Value, CryptoError> {
        serde_json::from_str(&self.to_jwk_string())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// Verify a signature over a message.
    ///
    /// Fails closed: malformed signature bytes are reported as
    /// `InvalidSignature`, never as a panic.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        let sig = p521::ecdsa::Signature::from_slice(signature.as_bytes())
            .map_err(|_| CryptoError::InvalidSignature)?;
        let verifying_key = VerifyingKey::from_affine(*self.0.as_affine())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

        verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::InvalidSignature)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sec1 = hex::encode(self.to_sec1_bytes());
        write!(f, "P521Pub({})", &sec1[..16])
    }
}

/// A keypair for signing records.
#[derive(Clone)]
pub struct SigningKeyPair {
    signing_key: SigningKey,
}

impl SigningKeyPair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Create from a big-endian secret scalar (at most 66 bytes).
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let secret = p521::SecretKey::from_slice(bytes)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Self::from_secret(&secret)
    }

    /// Parse a private JWK (must carry `d`).
    pub fn from_jwk_str(jwk: &str) -> Result<Self, CryptoError> {
        let secret = p521::SecretKey::from_jwk_str(jwk)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Self::from_secret(&secret)
    }

    /// Encode the private key as a JWK string.
    pub fn to_jwk_string(&self) -> Zeroizing<String> {
        self.secret_key().to_jwk_string()
    }

    fn from_secret(secret: &p521::SecretKey) -> Result<Self, CryptoError> {
        let signing_key = SigningKey::from_bytes(&secret.to_bytes())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self { signing_key })
    }

    fn secret_key(&self) -> p521::SecretKey {
        p521::SecretKey::from(self.signing_key.as_nonzero_scalar())
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.secret_key().public_key())
    }

    /// Sign a message with a fresh random nonce.
    ///
    /// Signing the same message twice yields different signatures.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let sig: p521::ecdsa::Signature = self.signing_key.sign_with_rng(&mut OsRng, message);
        Signature(sig.to_bytes().to_vec())
    }
}

impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKeyPair({:?})", self.public_key())
    }
}
