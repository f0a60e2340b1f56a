//! Application configuration constants
//!
//! Central location for all configuration constants, resource limits,
//! and validation boundaries used throughout the application.

// ===== Settings =====

/// Fixed key of the singleton settings row
pub const SETTINGS_KEY: &str = "app";

/// Floor for the configurable daily limit.
/// A limit of zero would make every quick-add trip the alert.
pub const MIN_DAILY_LIMIT: i64 = 1;

/// Daily limit seeded on first run
pub const DEFAULT_DAILY_LIMIT: i64 = 3;

// ===== Seed Drink =====

/// Identifier of the drink seeded on first run.
/// Stable so re-seeding an emptied store yields the same catalog.
pub const SEED_DRINK_ID: &str = "drink-beer-default";
pub const SEED_DRINK_NAME: &str = "Cerveza";
pub const SEED_DRINK_EMOJI: &str = "\u{1F37A}";
pub const SEED_DRINK_ML: i64 = 330;
pub const SEED_DRINK_ABV: f64 = 5.0;

// ===== PIN =====

/// Minimum PIN length in decimal digits
pub const PIN_MIN_DIGITS: usize = 4;

/// Maximum PIN length in decimal digits
pub const PIN_MAX_DIGITS: usize = 6;

/// PBKDF2-HMAC-SHA256 iteration count.
/// Matches the original WebCrypto deployment; high enough to slow brute
/// force over a 4-6 digit space, low enough for interactive unlock.
pub const PIN_KDF_ITERATIONS: u32 = 120_000;

/// Salt length in bytes (128 bits)
pub const PIN_SALT_BYTES: usize = 16;

/// Derived hash length in bytes (256 bits)
pub const PIN_HASH_BYTES: usize = 32;

// ===== Export / Import =====

/// Current export document version. Import accepts exactly this value.
pub const EXPORT_VERSION: u32 = 1;

/// Prefix for suggested backup file names
/// (`sipcontrol-backup-<YYYY-MM-DD>.json`)
pub const EXPORT_FILE_PREFIX: &str = "sipcontrol-backup";
