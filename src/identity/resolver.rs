//! Memoized device identity resolution.

use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::probe::FingerprintProbe;
use super::store::IdStore;

/// Prefix marking an identifier that did not come from the fingerprint.
pub const FALLBACK_PREFIX: &str = "fallback_";

const FALLBACK_SUFFIX_LEN: usize = 13;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// How an identity was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    Fingerprint,
    Fallback,
}

/// Anonymous identifier for this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub id: String,
    pub source: IdentitySource,
}

impl DeviceIdentity {
    pub fn is_fallback(&self) -> bool {
        self.source == IdentitySource::Fallback
    }
}

/// Resolves the device identity once per session.
///
/// Resolution never fails: if the probe cannot produce an identifier, a
/// random token is read from (or written to) the store. Whichever value is
/// produced first is kept for the lifetime of the resolver.
pub struct DeviceIdResolver {
    probe: Box<dyn FingerprintProbe>,
    store: Box<dyn IdStore>,
    cached: OnceLock<DeviceIdentity>,
}

impl DeviceIdResolver {
    pub fn new(probe: Box<dyn FingerprintProbe>, store: Box<dyn IdStore>) -> Self {
        Self {
            probe,
            store,
            cached: OnceLock::new(),
        }
    }

    /// Return the session's identity, computing it on first use.
    ///
    /// Concurrent first callers wait for a single resolution.
    pub fn resolve(&self) -> &DeviceIdentity {
        self.cached.get_or_init(|| self.compute())
    }

    fn compute(&self) -> DeviceIdentity {
        match self.probe.visitor_id() {
            Ok(id) if !id.is_empty() => {
                debug!("device identity resolved from fingerprint");
                DeviceIdentity {
                    id,
                    source: IdentitySource::Fingerprint,
                }
            }
            Ok(_) => {
                warn!("fingerprint probe returned an empty id, using fallback identity");
                self.fallback()
            }
            Err(e) => {
                warn!(error = %e, "fingerprint probe failed, using fallback identity");
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> DeviceIdentity {
        let stored = self.store.load().unwrap_or_else(|e| {
            warn!(error = %e, "could not read stored device id");
            None
        });

        let id = match stored {
            Some(id) => id,
            None => {
                let id = generate_fallback_id();
                if let Err(e) = self.store.save(&id) {
                    warn!(error = %e, "could not persist fallback device id");
                }
                id
            }
        };

        DeviceIdentity {
            id,
            source: IdentitySource::Fallback,
        }
    }
}

/// Generate a new `fallback_` identifier with a random base-36 suffix.
pub fn generate_fallback_id() -> String {
    let mut bytes = [0u8; FALLBACK_SUFFIX_LEN];
    if let Err(e) = getrandom::fill(&mut bytes) {
        warn!(error = %e, "system randomness unavailable, seeding from clock");
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default()
            ^ u128::from(std::process::id());
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = (nanos >> ((i % 16) * 8)) as u8;
        }
    }

    let suffix: String = bytes
        .iter()
        .map(|b| BASE36[usize::from(*b) % BASE36.len()] as char)
        .collect();

    format!("{FALLBACK_PREFIX}{suffix}")
}
