//! Owning shell — holds the single authoritative snapshot and the
//! collaborator seams (clock, persistence).

use std::sync::{Arc, Mutex};

use crate::otp::core;
use crate::otp::state::{self, Intent};
use crate::otp::types::{GeneratedCode, InvalidParameter, Snapshot};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Collaborators
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Wall-clock collaborator supplying the timestamp for code generation.
///
/// Must be non-decreasing in wall-clock terms for windows to roll forward;
/// a clock that jumps backward across a boundary regenerates a stale code,
/// which is acceptable since the standard itself is tied to wall time.
pub trait Clock: Send + Sync {
    /// Current Unix timestamp in whole seconds.
    fn now(&self) -> i64;
}

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Persistence collaborator, notified (push model) after every transition
/// that replaced the key handle or vault contents. Display-only settings
/// changes are not pushed.
pub trait PersistenceHook: Send + Sync {
    fn vault_changed(&self, snapshot: &Snapshot);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Vault store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Thread-safe owner of the current [`Snapshot`].
///
/// Intent application is serialized under the lock: old snapshot in, new
/// snapshot out, swap. Readers get an `Arc` to a fully-formed snapshot and
/// can never observe a partially-applied one.
pub struct VaultStore {
    current: Mutex<Arc<Snapshot>>,
    persistence: Option<Box<dyn PersistenceHook>>,
}

impl Default for VaultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VaultStore {
    /// Create a store holding the default (empty-vault) snapshot.
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Arc::new(Snapshot::default())),
            persistence: None,
        }
    }

    /// Create a store that pushes vault changes to a persistence hook.
    pub fn with_persistence(hook: Box<dyn PersistenceHook>) -> Self {
        Self {
            current: Mutex::new(Arc::new(Snapshot::default())),
            persistence: Some(hook),
        }
    }

    /// The current snapshot. Readers share one immutable allocation; the
    /// handle stays valid even after later dispatches supersede it.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.lock().expect("snapshot lock poisoned").clone()
    }

    /// Apply one intent and return the successor snapshot.
    ///
    /// Only the apply-and-swap runs under the lock; the persistence hook
    /// is notified after the guard is dropped, so a hook may perform I/O
    /// or read the store back without stalling readers or deadlocking.
    /// Each notification carries the full successor snapshot.
    pub fn dispatch(&self, intent: Intent) -> Arc<Snapshot> {
        let name = intent.name();
        let notify = intent.touches_vault();
        let next = {
            let mut guard = self.current.lock().expect("snapshot lock poisoned");
            let next = Arc::new(state::apply(&guard, intent));
            *guard = next.clone();
            next
        };
        if notify {
            if let Some(hook) = &self.persistence {
                hook.vault_changed(&next);
            }
        }
        log::debug!("applied {name}: vault holds {} entries", next.vault.len());
        next
    }

    /// Generate a code for every entry in the current vault at `now`.
    ///
    /// Results are positionally aligned with the vault. A malformed entry
    /// yields its error (and a warning) without poisoning the pass — the
    /// worst outcome is that one entry's code is skipped for this window.
    pub fn generate_all(&self, now: i64) -> Vec<Result<GeneratedCode, InvalidParameter>> {
        let snapshot = self.current();
        snapshot
            .vault
            .iter()
            .map(|entry| {
                let code = core::generate(entry, now);
                if let Err(err) = &code {
                    log::warn!("skipping code for {}: {err}", entry.display_name());
                }
                code
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otp::types::{MasterKeyHandle, Secret, VaultEntry};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn entry(issuer: &str) -> VaultEntry {
        VaultEntry::new(
            issuer,
            "me",
            Secret::from_base32("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ").unwrap(),
        )
    }

    #[test]
    fn starts_with_default_snapshot() {
        let store = VaultStore::new();
        let snapshot = store.current();
        assert!(snapshot.vault.is_empty());
        assert!(snapshot.key.is_empty());
    }

    #[test]
    fn dispatch_swaps_current() {
        let store = VaultStore::new();
        let stale = store.current();
        let next = store.dispatch(Intent::AddVaultEntry {
            entry: entry("GitHub"),
        });
        assert_eq!(next.vault.len(), 1);
        assert_eq!(store.current(), next);
        // old handle still reads the old state
        assert!(stale.vault.is_empty());
    }

    #[test]
    fn concurrent_dispatch_serializes() {
        let store = Arc::new(VaultStore::new());
        let mut handles = Vec::new();
        for t in 0..8 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for _ in 0..5 {
                    store.dispatch(Intent::AddVaultEntry {
                        entry: entry(&format!("issuer-{t}")),
                    });
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        // every append survived: no interleaved read-modify-write lost one
        assert_eq!(store.current().vault.len(), 40);
    }

    struct CountingHook(AtomicUsize);

    impl PersistenceHook for CountingHook {
        fn vault_changed(&self, _snapshot: &Snapshot) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn persistence_pushed_for_vault_mutations_only() {
        let hook = Arc::new(CountingHook(AtomicUsize::new(0)));

        struct Forward(Arc<CountingHook>);
        impl PersistenceHook for Forward {
            fn vault_changed(&self, snapshot: &Snapshot) {
                self.0.vault_changed(snapshot);
            }
        }

        let store = VaultStore::with_persistence(Box::new(Forward(Arc::clone(&hook))));
        store.dispatch(Intent::InitializeVault {
            key: MasterKeyHandle::new("k"),
            vault: vec![entry("GitHub")],
        });
        store.dispatch(Intent::AddVaultEntry {
            entry: entry("AWS"),
        });
        store.dispatch(Intent::SetVault { vault: Vec::new() });
        store.dispatch(Intent::ClearVault);
        assert_eq!(hook.0.load(Ordering::SeqCst), 4);

        // settings-only change: no push
        store.dispatch(Intent::ToggleConcealTokens);
        assert_eq!(hook.0.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn hook_may_read_store_back_during_dispatch() {
        use std::sync::mpsc;
        use std::time::Duration;

        struct ReentrantHook {
            store: Mutex<Option<Arc<VaultStore>>>,
            seen_len: AtomicUsize,
        }

        impl PersistenceHook for ReentrantHook {
            fn vault_changed(&self, snapshot: &Snapshot) {
                if let Some(store) = self.store.lock().unwrap().as_ref() {
                    // reading back must not deadlock on the snapshot lock
                    assert_eq!(store.current().vault.len(), snapshot.vault.len());
                    self.seen_len.store(snapshot.vault.len(), Ordering::SeqCst);
                }
            }
        }

        struct Forward(Arc<ReentrantHook>);
        impl PersistenceHook for Forward {
            fn vault_changed(&self, snapshot: &Snapshot) {
                self.0.vault_changed(snapshot);
            }
        }

        let hook = Arc::new(ReentrantHook {
            store: Mutex::new(None),
            seen_len: AtomicUsize::new(0),
        });
        let store = Arc::new(VaultStore::with_persistence(Box::new(Forward(Arc::clone(
            &hook,
        )))));
        *hook.store.lock().unwrap() = Some(Arc::clone(&store));

        let (tx, rx) = mpsc::channel();
        let worker = Arc::clone(&store);
        thread::spawn(move || {
            worker.dispatch(Intent::AddVaultEntry {
                entry: entry("GitHub"),
            });
            tx.send(()).unwrap();
        });
        rx.recv_timeout(Duration::from_secs(5))
            .expect("dispatch completed without deadlocking");
        assert_eq!(hook.seen_len.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn generate_all_isolates_bad_entries() {
        let store = VaultStore::new();
        store.dispatch(Intent::AddVaultEntry {
            entry: entry("GitHub"),
        });
        store.dispatch(Intent::AddVaultEntry {
            entry: entry("Broken").with_digits(9),
        });
        store.dispatch(Intent::AddVaultEntry {
            entry: entry("AWS"),
        });

        let codes = store.generate_all(59);
        assert_eq!(codes.len(), 3);
        assert!(codes[0].is_ok());
        assert_eq!(codes[1], Err(InvalidParameter::Digits(9)));
        assert!(codes[2].is_ok());
    }

    #[test]
    fn system_clock_is_sane() {
        // 2020-01-01 as a floor; catches a clock returning 0 or millis.
        let now = SystemClock.now();
        assert!(now > 1_577_836_800);
        assert!(now < 100_000_000_000);
    }
}
