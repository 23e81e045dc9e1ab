//! Self-issued per-device student key.
//!
//! The key lives in durable storage under `student_key`.  A missing or short
//! value is replaced on first read and persisted, after which every read
//! returns the same string until the browser's storage is cleared.

use std::rc::Rc;

use wasm_bindgen::JsCast;

use crate::constants::{MIN_STUDENT_KEY_LEN, STUDENT_KEY_STORAGE_KEY};
use crate::storage::KeyValueStore;

/// Capability handed to the request dispatcher.
pub trait IdentitySource {
    fn identity(&self) -> String;
}

/// Source of random UUID strings.  `None` means no cryptographic source is
/// available and the caller must fall back.
pub trait RandomTokenSource {
    fn random_uuid(&self) -> Option<String>;
}

/// UUID v4 built from `getrandom` bytes (`crypto.getRandomValues` in the
/// browser).  `None` when the OS/browser refuses to hand out entropy.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidTokenSource;

impl RandomTokenSource for UuidTokenSource {
    fn random_uuid(&self) -> Option<String> {
        let mut bytes = [0u8; 16];
        getrandom::getrandom(&mut bytes).ok()?;
        Some(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
    }
}

/// `crypto.randomUUID()` of the current global scope.  It only exists in
/// secure contexts, so plain-http pages drop to [`UuidTokenSource`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserCryptoSource;

impl RandomTokenSource for BrowserCryptoSource {
    fn random_uuid(&self) -> Option<String> {
        crypto_random_uuid().or_else(|| UuidTokenSource.random_uuid())
    }
}

fn crypto_random_uuid() -> Option<String> {
    let global = js_sys::global();
    let crypto = js_sys::Reflect::get(&global, &"crypto".into()).ok()?;
    if crypto.is_undefined() || crypto.is_null() {
        return None;
    }
    let random_uuid = js_sys::Reflect::get(&crypto, &"randomUUID".into()).ok()?;
    let func = random_uuid.dyn_into::<js_sys::Function>().ok()?;
    func.call0(&crypto).ok()?.as_string()
}

/// Timestamp + random composite used when no UUID source is available.
pub fn fallback_token() -> String {
    format!(
        "{}{}",
        chrono::Utc::now().timestamp_millis(),
        rand::random::<f64>()
    )
}

pub fn is_valid_key(key: &str) -> bool {
    key.chars().count() > MIN_STUDENT_KEY_LEN
}

pub struct IdentityProvider {
    store: Rc<dyn KeyValueStore>,
    source: Box<dyn RandomTokenSource>,
}

impl IdentityProvider {
    pub fn new(store: Rc<dyn KeyValueStore>, source: Box<dyn RandomTokenSource>) -> Self {
        Self { store, source }
    }

    /// Return the stored key, generating and persisting a new one when the
    /// stored value is absent or too short.
    pub fn student_key(&self) -> String {
        if let Some(key) = self.store.get(STUDENT_KEY_STORAGE_KEY) {
            if is_valid_key(&key) {
                return key;
            }
            log::debug!("stored student key too short, regenerating");
        }

        let key = self.generate();
        if let Err(e) = self.store.set(STUDENT_KEY_STORAGE_KEY, &key) {
            // Still usable for this page load, just not durable.
            log::warn!("failed to persist student key: {}", e);
        }
        log::info!("issued new student key");
        key
    }

    fn generate(&self) -> String {
        match self.source.random_uuid() {
            Some(uuid) if is_valid_key(&uuid) => uuid,
            _ => fallback_token(),
        }
    }
}

impl IdentitySource for IdentityProvider {
    fn identity(&self) -> String {
        self.student_key()
    }
}
