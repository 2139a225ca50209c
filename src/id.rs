//! ID generation utilities for themr
//!
//! Provides functions for generating unique identifiers for runs, themes,
//! and identities.

use rand::Rng;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

/// Generate a unique run ID
///
/// Format: `run-{timestamp_ms}-{random_hex}`
/// Example: `run-1738300800123-a1b2`
pub fn generate_run_id() -> String {
    let timestamp = now_ms();
    let random: u16 = rand::rng().random();
    format!("run-{}-{:04x}", timestamp, random)
}

/// Generate a unique theme ID
///
/// Format: `thm-{timestamp_ms}-{random_hex}`
pub fn generate_theme_id() -> String {
    let timestamp = now_ms();
    let random: u16 = rand::rng().random();
    format!("thm-{}-{:04x}", timestamp, random)
}

/// Generate a unique identity ID
///
/// Format: `usr-{timestamp_ms}-{random_hex}`
pub fn generate_identity_id() -> String {
    let timestamp = now_ms();
    let random: u16 = rand::rng().random();
    format!("usr-{}-{:04x}", timestamp, random)
}
