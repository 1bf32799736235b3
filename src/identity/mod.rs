//! Anonymous device identity.
//!
//! Free and paid usage is metered per device without an account. The
//! identifier comes from a host fingerprint when one can be computed and
//! from a persisted random token otherwise. This is a best-effort
//! anti-abuse heuristic, not a security boundary.

mod probe;
mod resolver;
mod store;

pub use probe::{BlockedProbe, FingerprintProbe, HostProbe, ProbeError};
pub use resolver::{
    DeviceIdResolver, DeviceIdentity, FALLBACK_PREFIX, IdentitySource, generate_fallback_id,
};
pub use store::{DEVICE_ID_KEY, FileIdStore, IdStore, StorageError};

#[cfg(test)]
pub use probe::MockFingerprintProbe;
#[cfg(test)]
pub use store::MockIdStore;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn file_store(dir: &TempDir) -> Box<FileIdStore> {
        Box::new(FileIdStore::with_dir(dir.path().to_path_buf()))
    }

    // ===========================================
    // Resolution and memoization
    // ===========================================

    #[test]
    fn test_resolve_uses_fingerprint() {
        let mut probe = MockFingerprintProbe::new();
        probe
            .expect_visitor_id()
            .times(1)
            .returning(|| Ok("0123456789abcdef0123456789abcdef".to_string()));
        let store = MockIdStore::new();

        let resolver = DeviceIdResolver::new(Box::new(probe), Box::new(store));
        let identity = resolver.resolve();

        assert_eq!(identity.id, "0123456789abcdef0123456789abcdef");
        assert_eq!(identity.source, IdentitySource::Fingerprint);
    }

    #[test]
    fn test_resolve_is_memoized() {
        let mut probe = MockFingerprintProbe::new();
        probe
            .expect_visitor_id()
            .times(1)
            .returning(|| Ok("visitor-1".to_string()));

        let resolver = DeviceIdResolver::new(Box::new(probe), Box::new(MockIdStore::new()));

        let first = resolver.resolve().clone();
        let second = resolver.resolve().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_concurrent_first_calls_resolve_once() {
        let mut probe = MockFingerprintProbe::new();
        probe
            .expect_visitor_id()
            .times(1)
            .returning(|| Ok("visitor-shared".to_string()));

        let resolver = DeviceIdResolver::new(Box::new(probe), Box::new(MockIdStore::new()));

        let ids: Vec<String> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| resolver.resolve().id.clone()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(ids.iter().all(|id| id == "visitor-shared"));
    }

    // ===========================================
    // Fallback path
    // ===========================================

    #[test]
    fn test_fallback_generates_and_persists() {
        let temp_dir = TempDir::new().unwrap();
        let resolver = DeviceIdResolver::new(Box::new(BlockedProbe), file_store(&temp_dir));

        let identity = resolver.resolve().clone();

        assert!(identity.id.starts_with(FALLBACK_PREFIX));
        assert!(identity.is_fallback());

        let stored = FileIdStore::with_dir(temp_dir.path().to_path_buf())
            .load()
            .unwrap();
        assert_eq!(stored.as_deref(), Some(identity.id.as_str()));
    }

    #[test]
    fn test_fallback_survives_new_session() {
        let temp_dir = TempDir::new().unwrap();

        let first = DeviceIdResolver::new(Box::new(BlockedProbe), file_store(&temp_dir))
            .resolve()
            .clone();
        let second = DeviceIdResolver::new(Box::new(BlockedProbe), file_store(&temp_dir))
            .resolve()
            .clone();

        assert_eq!(first.id, second.id);
        assert!(second.id.starts_with(FALLBACK_PREFIX));
    }

    #[test]
    fn test_fallback_reuses_stored_id_without_saving() {
        let mut probe = MockFingerprintProbe::new();
        probe
            .expect_visitor_id()
            .returning(|| Err(ProbeError::Unsupported("headless".to_string())));

        let mut store = MockIdStore::new();
        store
            .expect_load()
            .times(1)
            .returning(|| Ok(Some("fallback_existing123".to_string())));
        store.expect_save().never();

        let resolver = DeviceIdResolver::new(Box::new(probe), Box::new(store));
        assert_eq!(resolver.resolve().id, "fallback_existing123");
    }

    #[test]
    fn test_fallback_when_storage_unavailable() {
        let mut store = MockIdStore::new();
        store.expect_load().returning(|| {
            Err(StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "denied",
            )))
        });
        store.expect_save().returning(|_| {
            Err(StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "denied",
            )))
        });

        let resolver = DeviceIdResolver::new(Box::new(BlockedProbe), Box::new(store));

        let first = resolver.resolve().clone();
        assert!(first.id.starts_with(FALLBACK_PREFIX));
        // Still stable within the session even though nothing was persisted.
        assert_eq!(resolver.resolve(), &first);
    }

    #[test]
    fn test_empty_fingerprint_uses_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let mut probe = MockFingerprintProbe::new();
        probe.expect_visitor_id().returning(|| Ok(String::new()));

        let resolver = DeviceIdResolver::new(Box::new(probe), file_store(&temp_dir));
        assert!(resolver.resolve().is_fallback());
    }

    #[test]
    fn test_generate_fallback_id_format() {
        let id = generate_fallback_id();
        let suffix = id.strip_prefix(FALLBACK_PREFIX).unwrap();

        assert_eq!(suffix.len(), 13);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_ne!(generate_fallback_id(), id);
    }

    // ===========================================
    // Probes and storage
    // ===========================================

    #[test]
    fn test_host_probe_hashes_machine_id() {
        let temp_dir = TempDir::new().unwrap();
        let machine_id = temp_dir.path().join("machine-id");
        std::fs::write(&machine_id, "abc123\n").unwrap();

        let probe = HostProbe::with_paths(vec![machine_id], temp_dir.path().join("hostname"));
        let first = probe.visitor_id().unwrap();
        let second = probe.visitor_id().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_host_probe_differs_per_machine() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        std::fs::write(&a, "machine-a").unwrap();
        std::fs::write(&b, "machine-b").unwrap();
        let hostname = temp_dir.path().join("hostname");

        let id_a = HostProbe::with_paths(vec![a], hostname.clone()).visitor_id().unwrap();
        let id_b = HostProbe::with_paths(vec![b], hostname).visitor_id().unwrap();

        assert_ne!(id_a, id_b);
    }

    #[test]
    fn test_host_fingerprint_prefers_hostname_file() {
        // Without a machine id only the hostname separates these hosts;
        // if the environment took priority they would collide.
        let temp_dir = TempDir::new().unwrap();
        let host_a = temp_dir.path().join("hostname-a");
        let host_b = temp_dir.path().join("hostname-b");
        std::fs::write(&host_a, "studio-a\n").unwrap();
        std::fs::write(&host_b, "studio-b\n").unwrap();
        let no_machine_id = vec![temp_dir.path().join("missing")];

        let id_a = HostProbe::with_paths(no_machine_id.clone(), host_a.clone())
            .visitor_id()
            .unwrap();
        let id_a_again = HostProbe::with_paths(no_machine_id.clone(), host_a)
            .visitor_id()
            .unwrap();
        let id_b = HostProbe::with_paths(no_machine_id, host_b).visitor_id().unwrap();

        assert_eq!(id_a, id_a_again);
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn test_blocked_probe_fails() {
        assert_eq!(BlockedProbe.visitor_id(), Err(ProbeError::Blocked));
    }

    #[test]
    fn test_file_store_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileIdStore::with_dir(temp_dir.path().join("nested"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_round_trip_creates_dir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested");
        let store = FileIdStore::with_dir(dir.clone());

        store.save("fallback_abc").unwrap();

        assert!(dir.join(DEVICE_ID_KEY).exists());
        assert_eq!(store.load().unwrap().as_deref(), Some("fallback_abc"));
    }

    #[test]
    fn test_file_store_custom_directory() {
        let custom = PathBuf::from("/tmp/voicestore-custom");
        let store = FileIdStore::with_dir(custom.clone());
        assert_eq!(store.data_dir(), custom);
    }
}
