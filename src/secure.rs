//! Database key management.
//!
//! The SQLCipher key is generated once, kept in a platform credential store,
//! and never written to the data directory.

use std::collections::HashMap;
use std::sync::Mutex;

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Result, SpendError};

pub const KEY_NAME: &str = "db_key";
pub const KEY_LEN: usize = 32;

/// A secret/credential area with get and set semantics.
pub trait KeyStore: Send + Sync {
    fn get_secret(&self, name: &str) -> Result<Option<String>>;
    fn set_secret(&self, name: &str, value: &str) -> Result<()>;
}

/// Raw key bytes for the encrypted store, wiped on drop.
pub struct Passphrase {
    bytes: Vec<u8>,
}

impl Passphrase {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// SQLCipher raw-key literal: `x'<hex>'`.
    pub(crate) fn sql_literal(&self) -> Zeroizing<String> {
        let mut encoded = hex::encode(&self.bytes);
        let literal = Zeroizing::new(format!("\"x'{encoded}'\""));
        encoded.zeroize();
        literal
    }
}

impl Drop for Passphrase {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Passphrase(..)")
    }
}

/// Returns the stored database key, generating and storing a fresh random one
/// on first use.
pub fn get_or_create_passphrase(store: &dyn KeyStore) -> Result<Passphrase> {
    if let Some(existing) = store.get_secret(KEY_NAME)? {
        let existing = Zeroizing::new(existing);
        let bytes = hex::decode(existing.trim()).map_err(|e| SpendError::InvalidKey(e.to_string()))?;
        if bytes.len() != KEY_LEN {
            return Err(SpendError::InvalidKey(format!(
                "expected {KEY_LEN} bytes, found {}",
                bytes.len()
            )));
        }
        return Ok(Passphrase::from_bytes(bytes));
    }

    let mut bytes = vec![0u8; KEY_LEN];
    OsRng.fill_bytes(&mut bytes);
    let encoded = Zeroizing::new(hex::encode(&bytes));
    store.set_secret(KEY_NAME, &encoded)?;
    tracing::info!("generated new database key");
    Ok(Passphrase::from_bytes(bytes))
}

/// OS credential store (Keychain, Credential Manager, kernel keyutils).
#[cfg(feature = "os-keyring")]
pub struct KeyringStore {
    service: String,
}

#[cfg(feature = "os-keyring")]
impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self { service: service.into() }
    }

    fn entry(&self, name: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, name).map_err(|e| SpendError::Keyring(e.to_string()))
    }
}

#[cfg(feature = "os-keyring")]
impl KeyStore for KeyringStore {
    fn get_secret(&self, name: &str) -> Result<Option<String>> {
        match self.entry(name)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SpendError::Keyring(e.to_string())),
        }
    }

    fn set_secret(&self, name: &str, value: &str) -> Result<()> {
        self.entry(name)?
            .set_password(value)
            .map_err(|e| SpendError::Keyring(e.to_string()))
    }
}

/// Process-local secret store for tests and headless runs.
#[derive(Default)]
pub struct MemoryKeyStore {
    secrets: Mutex<HashMap<String, String>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn get_secret(&self, name: &str) -> Result<Option<String>> {
        let secrets = self.secrets.lock().map_err(|_| SpendError::LockPoisoned)?;
        Ok(secrets.get(name).cloned())
    }

    fn set_secret(&self, name: &str, value: &str) -> Result<()> {
        let mut secrets = self.secrets.lock().map_err(|_| SpendError::LockPoisoned)?;
        secrets.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

impl Drop for MemoryKeyStore {
    fn drop(&mut self) {
        if let Ok(secrets) = self.secrets.get_mut() {
            for value in secrets.values_mut() {
                value.zeroize();
            }
        }
    }
}
