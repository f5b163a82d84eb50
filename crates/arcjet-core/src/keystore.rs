//! Key stores: where a signer's P-521 key pair lives between sessions.
//!
//! Keys are persisted as JWK under two fixed names, `public-key` and
//! `secret-key`. There is no rotation or deletion.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::crypto::{PublicKey, SigningKeyPair};
use crate::error::CryptoError;

/// File name of the public key inside a [`DirKeyStore`].
pub const PUBLIC_KEY_FILE: &str = "public-key.jwk";

/// File name of the secret key inside a [`DirKeyStore`].
pub const SECRET_KEY_FILE: &str = "secret-key.jwk";

/// Storage for a single signing key pair.
pub trait KeyStore: Send + Sync {
    /// Persist a key pair, replacing any stored one.
    fn save(&self, keypair: &SigningKeyPair) -> Result<(), CryptoError>;

    /// Load the key pair. `KeyUnavailable` if none is stored.
    fn load_keypair(&self) -> Result<SigningKeyPair, CryptoError>;

    /// Load only the public key. `KeyUnavailable` if none is stored.
    fn load_public_key(&self) -> Result<PublicKey, CryptoError>;

    /// Generate a fresh key pair and persist it.
    fn generate(&self) -> Result<SigningKeyPair, CryptoError> {
        let keypair = SigningKeyPair::generate();
        self.save(&keypair)?;
        Ok(keypair)
    }
}

/// In-memory key store.
#[derive(Default)]
pub struct MemoryKeyStore {
    /// (public JWK, secret JWK)
    keys: RwLock<Option<(String, String)>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `keypair`.
    pub fn with_keypair(keypair: &SigningKeyPair) -> Self {
        let store = Self::new();
        *store.keys.write().unwrap_or_else(PoisonError::into_inner) = Some((
            keypair.public_key().to_jwk_string(),
            keypair.to_jwk_string().to_string(),
        ));
        store
    }
}

impl KeyStore for MemoryKeyStore {
    fn save(&self, keypair: &SigningKeyPair) -> Result<(), CryptoError> {
        let mut keys = self.keys.write().unwrap_or_else(PoisonError::into_inner);
        *keys = Some((
            keypair.public_key().to_jwk_string(),
            keypair.to_jwk_string().to_string(),
        ));
        Ok(())
    }

    fn load_keypair(&self) -> Result<SigningKeyPair, CryptoError> {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        let (_, secret) = keys.as_ref().ok_or(CryptoError::KeyUnavailable)?;
        SigningKeyPair::from_jwk_str(secret)
    }

    fn load_public_key(&self) -> Result<PublicKey, CryptoError> {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        let (public, _) = keys.as_ref().ok_or(CryptoError::KeyUnavailable)?;
        PublicKey::from_jwk_str(public)
    }
}

/// Key store backed by a directory on disk.
///
/// The secret key file is created with mode `0600` on Unix.
#[derive(Debug, Clone)]
pub struct DirKeyStore {
    dir: PathBuf,
}

impl DirKeyStore {
    /// Use `dir` for key files. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the key files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self, name: &str) -> Result<String, CryptoError> {
        match fs::read_to_string(self.dir.join(name)) {
            Ok(s) => Ok(s),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(CryptoError::KeyUnavailable),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeyStore for DirKeyStore {
    fn save(&self, keypair: &SigningKeyPair) -> Result<(), CryptoError> {
        fs::create_dir_all(&self.dir)?;
        write_secret(&self.dir.join(SECRET_KEY_FILE), keypair.to_jwk_string().as_bytes())?;
        fs::write(
            self.dir.join(PUBLIC_KEY_FILE),
            keypair.public_key().to_jwk_string(),
        )?;
        Ok(())
    }

    fn load_keypair(&self) -> Result<SigningKeyPair, CryptoError> {
        SigningKeyPair::from_jwk_str(&self.read(SECRET_KEY_FILE)?)
    }

    fn load_public_key(&self) -> Result<PublicKey, CryptoError> {
        PublicKey::from_jwk_str(&self.read(PUBLIC_KEY_FILE)?)
    }
}

#[cfg(unix)]
fn write_secret(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_secret(path: &Path, contents: &[u8]) -> io::Result<()> {
    fs::write(path, contents)
}
