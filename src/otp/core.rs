//! Code generation — RFC 4226 (HOTP) layered under RFC 6238 (TOTP).
//!
//! Pure functions only: no state, no I/O. Safe to call from any number of
//! concurrent callers.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::otp::types::{Algorithm, GeneratedCode, InvalidParameter, VaultEntry};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Raw HMAC-OTP (RFC 4226 §5.3)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute an HOTP code for the given raw key bytes and counter.
pub fn hotp_raw(key: &[u8], counter: u64, digits: u8, algo: Algorithm) -> String {
    let hmac_result = compute_hmac(key, &counter.to_be_bytes(), algo);
    truncate(&hmac_result, digits)
}

/// Compute HMAC(key, message) using the specified algorithm.
fn compute_hmac(key: &[u8], data: &[u8], algo: Algorithm) -> Vec<u8> {
    match algo {
        Algorithm::Sha1 => {
            let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("HMAC accepts any key length");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key length");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(key).expect("HMAC accepts any key length");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

/// Dynamic truncation per RFC 4226 §5.3: low 4 bits of the last digest
/// byte select a 4-byte window, top bit masked off, reduced mod 10^digits.
fn truncate(hmac_result: &[u8], digits: u8) -> String {
    let offset = (hmac_result[hmac_result.len() - 1] & 0x0f) as usize;
    let binary = ((hmac_result[offset] as u32 & 0x7f) << 24)
        | ((hmac_result[offset + 1] as u32) << 16)
        | ((hmac_result[offset + 2] as u32) << 8)
        | (hmac_result[offset + 3] as u32);
    let modulus = 10u32.pow(digits as u32);
    let code = binary % modulus;
    format!("{:0>width$}", code, width = digits as usize)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Time-step math (RFC 6238, T0 = 0)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Time-step counter for a unix timestamp. Floor division, so pre-epoch
/// timestamps yield negative counters rather than errors.
pub fn time_step(now: i64, period: u32) -> i64 {
    now.div_euclid(period as i64)
}

/// Unix timestamp at which the window containing `now` opened.
pub fn window_start(now: i64, period: u32) -> i64 {
    time_step(now, period) * period as i64
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Entry-level generation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Derive the current code for a vault entry at `now` (unix seconds,
/// sub-second precision already truncated by the integer type).
///
/// Fails only on malformed entry fields; any `now` is a valid input,
/// including timestamps before the epoch.
pub fn generate(entry: &VaultEntry, now: i64) -> Result<GeneratedCode, InvalidParameter> {
    if entry.secret.is_empty() {
        return Err(InvalidParameter::EmptySecret);
    }
    if !(6..=8).contains(&entry.digits) {
        return Err(InvalidParameter::Digits(entry.digits));
    }
    if entry.period == 0 {
        return Err(InvalidParameter::Period);
    }

    let step = time_step(now, entry.period);
    // Negative steps serialize as their two's-complement big-endian bytes.
    let value = hotp_raw(entry.secret.as_bytes(), step as u64, entry.digits, entry.algorithm);
    let window_start = step * entry.period as i64;
    let elapsed = (now - window_start) as u32;
    Ok(GeneratedCode {
        value,
        window_start,
        window_length: entry.period,
        remaining_seconds: entry.period - elapsed,
        progress: f64::from(elapsed) / f64::from(entry.period),
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Secret helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Decode a base-32 secret (with or without spaces/dashes, case-insensitive).
pub fn decode_secret(b32: &str) -> Result<Vec<u8>, InvalidParameter> {
    let cleaned = b32.replace(' ', "").replace('-', "").to_uppercase();
    if cleaned.is_empty() {
        return Err(InvalidParameter::EmptySecret);
    }
    let padded = pad_base32(&cleaned);
    base32::decode(base32::Alphabet::Rfc4648 { padding: true }, &padded)
        .or_else(|| base32::decode(base32::Alphabet::Rfc4648 { padding: false }, &cleaned))
        .ok_or(InvalidParameter::MalformedSecret)
}

/// Encode raw bytes to base-32 (no padding, uppercase).
pub fn encode_secret(bytes: &[u8]) -> String {
    base32::encode(base32::Alphabet::Rfc4648 { padding: false }, bytes)
}

/// Generate a cryptographically-random base-32 secret.
pub fn generate_secret(byte_length: usize) -> String {
    let mut buf = vec![0u8; byte_length];
    use rand::RngCore;
    rand::thread_rng().fill_bytes(&mut buf);
    encode_secret(&buf)
}

/// Pad a base-32 string to a multiple of 8 with '='.
fn pad_base32(s: &str) -> String {
    let remainder = s.len() % 8;
    if remainder == 0 {
        s.to_string()
    } else {
        let pad_count = 8 - remainder;
        format!("{}{}", s, "=".repeat(pad_count))
    }
}
