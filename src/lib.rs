//! # Tokenvault – TOTP Authenticator Core
//!
//! In-memory authenticator: a vault of shared secrets and the machinery to
//! turn each one into a short-lived verification code.
//!
//! - **RFC 4226 / 6238** – HOTP & TOTP derivation with SHA-1, SHA-256, SHA-512
//! - **Vault state machine** – a closed set of intents applied by a pure,
//!   total transition function over immutable snapshots
//! - **Window scheduler** – epoch-aligned rollover boundaries, per-entry
//!   periods, and an async refresh loop
//! - **Owning shell** – a thread-safe store holding the single authoritative
//!   snapshot, with clock and persistence collaborators at the seams

pub mod otp;
