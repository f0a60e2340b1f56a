//! Database models
//!
//! Rust structs representing database entities. Serde renames follow the
//! original export document field names (camelCase, `tsISO`), so a
//! serialized record is byte-compatible with existing backups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Drink catalog category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum DrinkCategory {
    Alcohol,
    NoAlcohol,
}

/// UI theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ThemeMode {
    Dark,
    Light,
    Auto,
}

/// A catalog entry the user can log consumption of
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Drink {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub category: DrinkCategory,
    pub default_ml: i64,
    /// Alcohol by volume, percent. Absent for non-alcoholic drinks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abv: Option<f64>,
    pub favorite: bool,
    /// Display position, dense 0..N-1 by convention
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
}

/// One consumption record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DrinkEvent {
    pub id: String,
    /// References a Drink. Not enforced; a dangling reference is rendered
    /// with a fallback label by the shell.
    pub drink_id: String,
    /// Full-precision consumption timestamp
    #[serde(rename = "tsISO")]
    pub ts: DateTime<Utc>,
    /// Redundant local-date key, always equal to `day_key(ts)`
    pub day_key: String,
    /// Always 1; the field is reserved for future multi-quantity events
    pub quantity: i64,
    /// Volume snapshot taken when the event was created or last edited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml_override: Option<i64>,
    /// ABV snapshot taken when the event was created or last edited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abv_override: Option<f64>,
}

/// Singleton configuration row, keyed by [`crate::config::SETTINGS_KEY`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub id: String,
    pub default_drink_id: String,
    pub daily_limit_count: i64,
    pub theme_mode: ThemeMode,
    /// Both PIN fields are set when a PIN is configured, both absent when
    /// it is not. No other combination is ever written.
    pub pin_hash: Option<String>,
    pub pin_salt: Option<String>,
    pub lock_enabled: bool,
    pub alert_sound_enabled: bool,
}

/// Fields a user supplies when creating or editing a drink
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrinkInput {
    pub name: String,
    pub emoji: String,
    pub category: DrinkCategory,
    pub default_ml: i64,
    pub abv: Option<f64>,
    pub favorite: bool,
}

/// Partial settings update; absent fields are left unchanged.
/// PIN fields are managed only through the dedicated PIN operations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub default_drink_id: Option<String>,
    pub daily_limit_count: Option<i64>,
    pub theme_mode: Option<ThemeMode>,
    pub lock_enabled: Option<bool>,
    pub alert_sound_enabled: Option<bool>,
}

/// Per-day event total from the month aggregation query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DayCount {
    pub day_key: String,
    pub count: i64,
}
