//! Host fingerprint probes.

use std::path::PathBuf;

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors that can occur while probing host characteristics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("Fingerprinting is blocked")]
    Blocked,

    #[error("Fingerprinting unsupported: {0}")]
    Unsupported(String),
}

/// Source of a fingerprint-derived visitor identifier.
#[cfg_attr(test, mockall::automock)]
pub trait FingerprintProbe: Send + Sync {
    /// Compute the visitor identifier for this host.
    fn visitor_id(&self) -> Result<String, ProbeError>;
}

/// Fingerprints the host from its machine id, hostname, user and platform.
///
/// The identifier is the first 16 bytes of a SHA-256 over the collected
/// characteristics, hex encoded (32 characters).
pub struct HostProbe {
    machine_id_paths: Vec<PathBuf>,
    hostname_path: PathBuf,
}

impl HostProbe {
    /// Create a probe reading the standard system locations.
    pub fn new() -> Self {
        Self {
            machine_id_paths: vec![
                PathBuf::from("/etc/machine-id"),
                PathBuf::from("/var/lib/dbus/machine-id"),
            ],
            hostname_path: PathBuf::from("/etc/hostname"),
        }
    }

    /// Create a probe reading custom locations.
    pub fn with_paths(machine_id_paths: Vec<PathBuf>, hostname_path: PathBuf) -> Self {
        Self {
            machine_id_paths,
            hostname_path,
        }
    }

    fn machine_id(&self) -> Option<String> {
        self.machine_id_paths
            .iter()
            .filter_map(|path| std::fs::read_to_string(path).ok())
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
    }

    /// The hostname file wins over `HOSTNAME`, which only some launchers export.
    fn hostname(&self) -> Option<String> {
        std::fs::read_to_string(&self.hostname_path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                std::env::var("HOSTNAME")
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            })
    }

    fn user() -> String {
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_default()
    }
}

impl Default for HostProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintProbe for HostProbe {
    fn visitor_id(&self) -> Result<String, ProbeError> {
        let machine_id = self.machine_id();
        let hostname = self.hostname();

        if machine_id.is_none() && hostname.is_none() {
            return Err(ProbeError::Unsupported(
                "no machine id or hostname available".to_string(),
            ));
        }

        let home = dirs::home_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let components = [
            machine_id.unwrap_or_default(),
            hostname.unwrap_or_default(),
            Self::user(),
            home,
            std::env::consts::OS.to_string(),
            std::env::consts::ARCH.to_string(),
        ];

        let mut hasher = Sha256::new();
        for component in &components {
            hasher.update(component.as_bytes());
            hasher.update([0u8]);
        }
        let digest = hasher.finalize();

        Ok(hex::encode(&digest[..16]))
    }
}

/// A probe that always refuses, forcing the fallback identity.
pub struct BlockedProbe;

impl FingerprintProbe for BlockedProbe {
    fn visitor_id(&self) -> Result<String, ProbeError> {
        Err(ProbeError::Blocked)
    }
}
