//! Scoped environment and configuration file helpers for integration tests.

use atelier::config::{DATABASE_URL_ENV, SANDBOX_API_TOKEN_ENV, SANDBOX_GATEWAY_URL_ENV};
use std::env;
use std::ffi::OsString;
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tempfile::NamedTempFile;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Every variable that overrides file configuration.
pub const OVERRIDE_VARS: [&str; 3] = [
    DATABASE_URL_ENV,
    SANDBOX_GATEWAY_URL_ENV,
    SANDBOX_API_TOKEN_ENV,
];

/// Holds the environment lock and restores overridden variables on drop.
pub struct ScopedEnv {
    saved: Vec<(&'static str, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedEnv {
    /// Clears every override variable, then applies `values`.
    pub fn with_overrides(values: &[(&'static str, &str)]) -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let saved = OVERRIDE_VARS
            .iter()
            .map(|key| (*key, env::var_os(key)))
            .collect();
        for key in OVERRIDE_VARS {
            // SAFETY: `ENV_LOCK` serializes every environment mutation in this binary.
            unsafe { env::remove_var(key) };
        }
        for (key, value) in values {
            // SAFETY: `ENV_LOCK` serializes every environment mutation in this binary.
            unsafe { env::set_var(key, value) };
        }
        Self { saved, _lock: lock }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..) {
            // SAFETY: the lock is still held until `_lock` drops after this body.
            unsafe {
                match value {
                    Some(previous) => env::set_var(key, previous),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

/// Writes `document` to a temporary TOML file that lives as long as the
/// returned handle.
pub fn config_file(document: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temporary config file should be created");
    file.write_all(document.as_bytes())
        .expect("temporary config file should be writable");
    file
}
