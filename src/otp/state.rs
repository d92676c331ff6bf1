//! Vault state machine — intents and the pure transition function.
//!
//! The intent set is a closed enum matched exhaustively, so every variant
//! is provably handled and an unrecognised shape is unrepresentable.

use serde::{Deserialize, Serialize};

use crate::otp::types::{MasterKeyHandle, Snapshot, VaultEntry};

/// A discrete, named request to transition the vault state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    /// Replace the master key handle and vault (startup load from
    /// persistence). Settings are untouched.
    InitializeVault {
        key: MasterKeyHandle,
        vault: Vec<VaultEntry>,
    },
    /// Replace the vault only (persistence pushed new contents).
    SetVault { vault: Vec<VaultEntry> },
    /// Append one entry to the end of the vault. Not idempotent:
    /// duplicates are allowed and insertion order is preserved.
    AddVaultEntry { entry: VaultEntry },
    /// Replace the vault with an empty sequence.
    ClearVault,
    /// Flip the conceal-tokens display flag.
    ToggleConcealTokens,
}

impl Intent {
    /// Stable name for log lines.
    pub const fn name(&self) -> &'static str {
        match self {
            Intent::InitializeVault { .. } => "initialize_vault",
            Intent::SetVault { .. } => "set_vault",
            Intent::AddVaultEntry { .. } => "add_vault_entry",
            Intent::ClearVault => "clear_vault",
            Intent::ToggleConcealTokens => "toggle_conceal_tokens",
        }
    }

    /// Whether this intent can change what persistence owns (key handle or
    /// vault contents), as opposed to display-only settings.
    pub const fn touches_vault(&self) -> bool {
        !matches!(self, Intent::ToggleConcealTokens)
    }
}

/// Apply one intent to a snapshot, producing the successor snapshot.
///
/// Total: every variant succeeds for well-typed input. The input snapshot
/// is never mutated; fields the intent does not name are carried over
/// unchanged.
pub fn apply(snapshot: &Snapshot, intent: Intent) -> Snapshot {
    match intent {
        Intent::InitializeVault { key, vault } => Snapshot {
            key,
            vault,
            settings: snapshot.settings,
        },
        Intent::SetVault { vault } => Snapshot {
            key: snapshot.key.clone(),
            vault,
            settings: snapshot.settings,
        },
        Intent::AddVaultEntry { entry } => {
            let mut vault = snapshot.vault.clone();
            vault.push(entry);
            Snapshot {
                key: snapshot.key.clone(),
                vault,
                settings: snapshot.settings,
            }
        }
        Intent::ClearVault => Snapshot {
            key: snapshot.key.clone(),
            vault: Vec::new(),
            settings: snapshot.settings,
        },
        Intent::ToggleConcealTokens => {
            let mut settings = snapshot.settings;
            settings.conceal_tokens = !settings.conceal_tokens;
            Snapshot {
                key: snapshot.key.clone(),
                vault: snapshot.vault.clone(),
                settings,
            }
        }
    }
}
