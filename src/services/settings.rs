//! Settings service
//!
//! The singleton settings row behind get-or-seed semantics: partial
//! patches for the plain fields, and the PIN lifecycle (enable, change,
//! disable, unlock). Every patch is a fresh read-merge-write against the
//! stored row, never against whatever the UI last saw.

use crate::changes::{ChangeBus, StoreChange};
use crate::config;
use crate::crypto;
use crate::database::{Repository, Settings, SettingsPatch};
use crate::error::{AppError, Result};

/// Service for the singleton settings record
#[derive(Clone)]
pub struct SettingsService {
    repo: Repository,
    changes: ChangeBus,
}

impl SettingsService {
    pub fn new(repo: Repository, changes: ChangeBus) -> Self {
        Self { repo, changes }
    }

    pub async fn get(&self) -> Result<Settings> {
        self.repo
            .get_settings()
            .await?
            .ok_or_else(|| AppError::Precondition("Settings not initialized".to_string()))
    }

    /// Merge the supplied fields into the stored settings. The daily limit
    /// is floor-clamped to 1; a zero limit would make every day an alert.
    pub async fn patch(&self, patch: SettingsPatch) -> Result<Settings> {
        let mut settings = self.get().await?;

        if let Some(default_drink_id) = patch.default_drink_id {
            if self.repo.get_drink(&default_drink_id).await?.is_none() {
                return Err(AppError::DrinkNotFound(default_drink_id));
            }
            settings.default_drink_id = default_drink_id;
        }
        if let Some(limit) = patch.daily_limit_count {
            settings.daily_limit_count = limit.max(config::MIN_DAILY_LIMIT);
        }
        if let Some(theme_mode) = patch.theme_mode {
            settings.theme_mode = theme_mode;
        }
        if let Some(lock_enabled) = patch.lock_enabled {
            settings.lock_enabled = lock_enabled;
        }
        if let Some(alert_sound_enabled) = patch.alert_sound_enabled {
            settings.alert_sound_enabled = alert_sound_enabled;
        }

        self.repo.put_settings(&settings).await?;
        self.changes.publish(StoreChange::Settings);

        Ok(settings)
    }

    /// The drink quick-add logs against, or None when the reference
    /// dangles.
    pub async fn default_drink(&self) -> Result<Option<crate::database::Drink>> {
        let settings = self.get().await?;
        self.repo.get_drink(&settings.default_drink_id).await
    }

    /// Whether a PIN is currently configured.
    pub async fn pin_enabled(&self) -> Result<bool> {
        Ok(self.get().await?.pin_hash.is_some())
    }

    /// Configure a PIN: 4-6 digits, confirmed. Stores a fresh salt and the
    /// derived hash together.
    pub async fn enable_pin(&self, pin: &str, confirm: &str) -> Result<()> {
        if !crypto::is_valid_pin(pin) {
            return Err(AppError::Validation(
                "PIN must be 4 to 6 digits".to_string(),
            ));
        }
        if pin != confirm {
            return Err(AppError::Validation("PINs do not match".to_string()));
        }

        let salt = crypto::create_salt();
        let hash = crypto::derive_pin_hash(pin, &salt)?;

        let mut settings = self.get().await?;
        settings.pin_hash = Some(hash);
        settings.pin_salt = Some(salt);
        self.repo.put_settings(&settings).await?;
        self.changes.publish(StoreChange::Settings);

        tracing::info!("PIN configured");
        Ok(())
    }

    /// Replace the PIN after verifying the current one.
    pub async fn change_pin(&self, current: &str, new_pin: &str, confirm: &str) -> Result<()> {
        self.verify_current_pin(current).await?;
        self.enable_pin(new_pin, confirm).await
    }

    /// Remove the PIN after verifying the current one. Clears both stored
    /// values together.
    pub async fn disable_pin(&self, current: &str) -> Result<()> {
        self.verify_current_pin(current).await?;

        let mut settings = self.get().await?;
        settings.pin_hash = None;
        settings.pin_salt = None;
        self.repo.put_settings(&settings).await?;
        self.changes.publish(StoreChange::Settings);

        tracing::info!("PIN disabled");
        Ok(())
    }

    /// Check a PIN against the stored hash, for the lock screen. Unlimited
    /// retries; each wrong attempt is just `PinMismatch`.
    pub async fn unlock(&self, pin: &str) -> Result<()> {
        self.verify_current_pin(pin).await
    }

    async fn verify_current_pin(&self, pin: &str) -> Result<()> {
        let settings = self.get().await?;

        let (Some(hash), Some(salt)) = (&settings.pin_hash, &settings.pin_salt) else {
            return Err(AppError::Precondition("No PIN is configured".to_string()));
        };

        if !crypto::verify_pin(pin, Some(hash.as_str()), Some(salt.as_str())) {
            return Err(AppError::PinMismatch);
        }

        Ok(())
    }
}
