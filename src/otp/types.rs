//! Core types for the authenticator vault.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Algorithm
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Hash algorithm used for HMAC-based code derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Sha1
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "SHA1"),
            Self::Sha256 => write!(f, "SHA256"),
            Self::Sha512 => write!(f, "SHA512"),
        }
    }
}

impl Algorithm {
    /// Parse from a case-insensitive string.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SHA1" | "SHA-1" | "HMACSHA1" | "HMAC-SHA1" => Some(Self::Sha1),
            "SHA256" | "SHA-256" | "HMACSHA256" | "HMAC-SHA256" => Some(Self::Sha256),
            "SHA512" | "SHA-512" | "HMACSHA512" | "HMAC-SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Rejected entry field, surfaced synchronously by code generation.
///
/// Never retried internally — the same malformed input cannot succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidParameter {
    #[error("secret must not be empty")]
    EmptySecret,
    #[error("secret is not valid base32")]
    MalformedSecret,
    #[error("digits must be between 6 and 8, got {0}")]
    Digits(u8),
    #[error("period must be greater than zero")]
    Period,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Secret
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Opaque key material for one vault entry. Zeroized on drop.
#[derive(Clone)]
pub struct Secret(Zeroizing<Vec<u8>>);

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice() == other.0.as_slice()
    }
}

impl Eq for Secret {}

impl Secret {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Decode from base32 (spaces and dashes stripped, case-insensitive,
    /// padding optional).
    pub fn from_base32(encoded: &str) -> Result<Self, InvalidParameter> {
        crate::otp::core::decode_secret(encoded).map(Self::new)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<u8>> for Secret {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for Secret {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({} bytes)", self.0.len())
    }
}

impl Serialize for Secret {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&crate::otp::core::encode_secret(&self.0))
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        if encoded.is_empty() {
            // empty key material serializes to ""; round-trip it rather
            // than reject — generation refuses empty secrets at use time
            return Ok(Self::new(Vec::new()));
        }
        Self::from_base32(&encoded).map_err(serde::de::Error::custom)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Master key handle
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Opaque credential associated with the vault's persisted representation.
///
/// Stored and forwarded untouched — its concrete meaning belongs to the
/// persistence collaborator.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterKeyHandle(String);

impl MasterKeyHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for MasterKeyHandle {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MasterKeyHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for MasterKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterKeyHandle(<redacted>)")
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Vault entry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A single TOTP entry held in the vault.
///
/// Identified for display purposes by `(issuer, account)`; the state
/// machine does not enforce uniqueness of the pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEntry {
    /// Issuer (e.g. "GitHub", "Google").
    pub issuer: String,
    /// Account label (e.g. "user@example.com").
    pub account: String,
    /// Key material.
    pub secret: Secret,
    /// Hash algorithm.
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Number of digits in the generated code (6–8).
    #[serde(default = "default_digits")]
    pub digits: u8,
    /// Time window length in seconds (typically 30).
    #[serde(default = "default_period")]
    pub period: u32,
}

fn default_digits() -> u8 {
    6
}

fn default_period() -> u32 {
    30
}

impl VaultEntry {
    /// Create a minimal entry with defaults (SHA-1, 6 digits, 30 s).
    pub fn new(issuer: impl Into<String>, account: impl Into<String>, secret: Secret) -> Self {
        Self {
            issuer: issuer.into(),
            account: account.into(),
            secret,
            algorithm: Algorithm::default(),
            digits: default_digits(),
            period: default_period(),
        }
    }

    /// Builder: set algorithm.
    pub fn with_algorithm(mut self, algo: Algorithm) -> Self {
        self.algorithm = algo;
        self
    }

    /// Builder: set digit count.
    pub fn with_digits(mut self, digits: u8) -> Self {
        self.digits = digits;
        self
    }

    /// Builder: set time period.
    pub fn with_period(mut self, period: u32) -> Self {
        self.period = period;
        self
    }

    /// Display name: "Issuer (account)" or just "account".
    pub fn display_name(&self) -> String {
        if self.issuer.is_empty() {
            self.account.clone()
        } else {
            format!("{} ({})", self.issuer, self.account)
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Settings
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generation-adjacent settings. The state machine only flips the flag;
/// interpreting it (masking rendered codes) is the display layer's job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub conceal_tokens: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Snapshot
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One immutable version of the full application state.
///
/// Every transition produces a new snapshot; the prior one is never
/// mutated. The default snapshot (empty key, empty vault) is the initial
/// state at process start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub key: MasterKeyHandle,
    pub vault: Vec<VaultEntry>,
    pub settings: Settings,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generated code result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A derived verification code with its window timing.
///
/// Never persisted — always recomputable from a [`VaultEntry`] and a
/// timestamp, which is what makes codes safe to discard on rollover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCode {
    /// Zero-padded digit string of exactly `digits` characters.
    pub value: String,
    /// Unix timestamp at which the current window opened.
    pub window_start: i64,
    /// Window length in seconds (the entry's period).
    pub window_length: u32,
    /// Seconds until the code expires.
    pub remaining_seconds: u32,
    /// How far into the window the generation instant sits, in `[0, 1)`.
    pub progress: f64,
}
