//! Authenticator core: sub-modules.

pub mod core;
pub mod schedule;
pub mod service;
pub mod state;
pub mod types;

// Re-export top-level items for convenience.
pub use service::{Clock, PersistenceHook, SystemClock, VaultStore};
pub use state::{apply, Intent};
pub use types::*;
