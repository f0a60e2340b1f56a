//! Backup service
//!
//! Serializes the whole store to one versioned JSON document and restores
//! from it. Import is destructive replace, never merge: the document is
//! fully validated up front, then all three tables are cleared and
//! repopulated in a single transaction. A rejected document leaves the
//! store untouched.

use crate::changes::{ChangeBus, StoreChange};
use crate::config;
use crate::database::{Drink, DrinkCategory, DrinkEvent, Repository, Settings, ThemeMode};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The versioned export document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub drinks: Vec<Drink>,
    pub events: Vec<DrinkEvent>,
    pub settings: Settings,
}

impl ExportPayload {
    /// Suggested backup file name: `sipcontrol-backup-<YYYY-MM-DD>.json`,
    /// date taken from the export timestamp.
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}.json",
            config::EXPORT_FILE_PREFIX,
            self.exported_at.format("%Y-%m-%d")
        )
    }
}

/// What a successful import wrote, for the shell's confirmation notice.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ImportSummary {
    pub drinks: usize,
    pub events: usize,
}

// Import-side document shapes. Looser than the live models: `sortOrder`
// may be absent (pre-v2 exports) and is normalized by document position,
// and the two settings toggles default to on as the original app did.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrinkDoc {
    id: String,
    name: String,
    emoji: String,
    category: DrinkCategory,
    default_ml: i64,
    abv: Option<f64>,
    #[serde(default)]
    favorite: bool,
    sort_order: Option<i64>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDoc {
    id: String,
    drink_id: String,
    #[serde(rename = "tsISO")]
    ts: DateTime<Utc>,
    day_key: String,
    quantity: i64,
    ml_override: Option<i64>,
    abv_override: Option<f64>,
}

fn default_toggle() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsDoc {
    id: String,
    default_drink_id: String,
    daily_limit_count: i64,
    theme_mode: ThemeMode,
    pin_hash: Option<String>,
    pin_salt: Option<String>,
    #[serde(default = "default_toggle")]
    lock_enabled: bool,
    #[serde(default = "default_toggle")]
    alert_sound_enabled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportDocument {
    #[serde(default)]
    drinks: Vec<DrinkDoc>,
    #[serde(default)]
    events: Vec<EventDoc>,
    settings: Option<SettingsDoc>,
}

/// Backup service
#[derive(Clone)]
pub struct BackupService {
    repo: Repository,
    changes: ChangeBus,
}

impl BackupService {
    pub fn new(repo: Repository, changes: ChangeBus) -> Self {
        Self { repo, changes }
    }

    /// Snapshot the whole store into one document.
    pub async fn export(&self) -> Result<ExportPayload> {
        let settings = self
            .repo
            .get_settings()
            .await?
            .ok_or_else(|| AppError::Precondition("Settings not initialized".to_string()))?;

        Ok(ExportPayload {
            version: config::EXPORT_VERSION,
            exported_at: Utc::now(),
            drinks: self.repo.list_drinks().await?,
            events: self.repo.list_events().await?,
            settings,
        })
    }

    /// Export as pretty-printed JSON plus the suggested file name.
    pub async fn export_json(&self) -> Result<(String, String)> {
        let payload = self.export().await?;
        let file_name = payload.file_name();
        let json = serde_json::to_string_pretty(&payload)?;

        tracing::info!(
            "Exported {} drinks, {} events to {}",
            payload.drinks.len(),
            payload.events.len(),
            file_name
        );
        Ok((json, file_name))
    }

    /// Validate and restore a backup document. Any failure aborts with the
    /// store untouched; success clears and repopulates everything.
    pub async fn import_json(&self, raw: &str) -> Result<ImportSummary> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| AppError::Import(format!("Invalid JSON: {}", e)))?;

        // Version gate first, before any shape checks: a future-version
        // document must be rejected for its version, not its shape. A
        // missing version is treated as 1, as the original importer did.
        let version = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(config::EXPORT_VERSION as u64);
        if version != config::EXPORT_VERSION as u64 {
            return Err(AppError::Import(format!(
                "Unsupported backup version: {}",
                version
            )));
        }

        let doc: ImportDocument = serde_json::from_value(value)
            .map_err(|e| AppError::Import(format!("Invalid or corrupt backup file: {}", e)))?;

        let settings_doc = doc
            .settings
            .ok_or_else(|| AppError::Import("Missing settings object".to_string()))?;

        for drink in &doc.drinks {
            validate_drink(drink)?;
        }
        for event in &doc.events {
            validate_event(event)?;
        }
        validate_settings(&settings_doc)?;

        if doc.drinks.is_empty() {
            return Err(AppError::Import(
                "Backup must contain at least one drink".to_string(),
            ));
        }

        // Normalize missing sort orders by document position.
        let drinks: Vec<Drink> = doc
            .drinks
            .into_iter()
            .enumerate()
            .map(|(index, d)| Drink {
                id: d.id,
                name: d.name,
                emoji: d.emoji,
                category: d.category,
                default_ml: d.default_ml,
                abv: d.abv,
                favorite: d.favorite,
                sort_order: d.sort_order.unwrap_or(index as i64),
                created_at: d.created_at,
            })
            .collect();

        let events: Vec<DrinkEvent> = doc
            .events
            .into_iter()
            .map(|e| DrinkEvent {
                id: e.id,
                drink_id: e.drink_id,
                ts: e.ts,
                day_key: e.day_key,
                quantity: e.quantity,
                ml_override: e.ml_override,
                abv_override: e.abv_override,
            })
            .collect();

        let settings = Settings {
            id: settings_doc.id,
            default_drink_id: settings_doc.default_drink_id,
            daily_limit_count: settings_doc.daily_limit_count,
            theme_mode: settings_doc.theme_mode,
            pin_hash: settings_doc.pin_hash,
            pin_salt: settings_doc.pin_salt,
            lock_enabled: settings_doc.lock_enabled,
            alert_sound_enabled: settings_doc.alert_sound_enabled,
        };

        let summary = ImportSummary {
            drinks: drinks.len(),
            events: events.len(),
        };

        self.repo.replace_all(&drinks, &events, &settings).await?;

        self.changes.publish(StoreChange::Drinks);
        self.changes.publish(StoreChange::Events);
        self.changes.publish(StoreChange::Settings);

        tracing::info!(
            "Imported backup: {} drinks, {} events",
            summary.drinks,
            summary.events
        );
        Ok(summary)
    }
}

fn validate_drink(drink: &DrinkDoc) -> Result<()> {
    if drink.id.trim().is_empty() {
        return Err(AppError::Import("Drink with empty id".to_string()));
    }
    if drink.name.trim().is_empty() || drink.emoji.trim().is_empty() {
        return Err(AppError::Import(format!(
            "Drink {} has an empty name or emoji",
            drink.id
        )));
    }
    if drink.default_ml <= 0 {
        return Err(AppError::Import(format!(
            "Drink {} has a non-positive volume",
            drink.id
        )));
    }
    if drink.abv.is_some_and(|abv| abv < 0.0) {
        return Err(AppError::Import(format!(
            "Drink {} has a negative ABV",
            drink.id
        )));
    }
    Ok(())
}

fn validate_event(event: &EventDoc) -> Result<()> {
    if event.id.trim().is_empty() || event.drink_id.trim().is_empty() {
        return Err(AppError::Import("Event with empty id".to_string()));
    }
    if event.day_key.trim().is_empty() {
        return Err(AppError::Import(format!(
            "Event {} has an empty day key",
            event.id
        )));
    }
    if event.quantity != 1 {
        return Err(AppError::Import(format!(
            "Event {} has quantity {}, expected 1",
            event.id, event.quantity
        )));
    }
    Ok(())
}

fn validate_settings(settings: &SettingsDoc) -> Result<()> {
    if settings.id != config::SETTINGS_KEY {
        return Err(AppError::Import(format!(
            "Settings key must be \"{}\"",
            config::SETTINGS_KEY
        )));
    }
    if settings.daily_limit_count < config::MIN_DAILY_LIMIT {
        return Err(AppError::Import(
            "Daily limit must be at least 1".to_string(),
        ));
    }
    if settings.pin_hash.is_some() != settings.pin_salt.is_some() {
        return Err(AppError::Import(
            "PIN hash and salt must both be present or both absent".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::initialize_database;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_service() -> BackupService {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        let repo = Repository::new(pool);
        repo.seed_defaults().await.unwrap();

        BackupService::new(repo, ChangeBus::new())
    }

    #[tokio::test]
    async fn test_export_shape_and_file_name() {
        let service = create_test_service().await;

        let (json, file_name) = service.export_json().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["version"], 1);
        assert!(value["exportedAt"].is_string());
        assert_eq!(value["drinks"].as_array().unwrap().len(), 1);
        assert_eq!(value["drinks"][0]["defaultMl"], 330);
        assert_eq!(value["settings"]["id"], "app");
        assert!(value["settings"]["pinHash"].is_null());

        let expected_date = Utc::now().format("%Y-%m-%d").to_string();
        assert_eq!(
            file_name,
            format!("sipcontrol-backup-{}.json", expected_date)
        );
    }

    #[tokio::test]
    async fn test_round_trip_reproduces_store() {
        let service = create_test_service().await;

        // Add some state beyond the seed.
        let event = DrinkEvent {
            id: "event-1".to_string(),
            drink_id: config::SEED_DRINK_ID.to_string(),
            ts: Utc::now(),
            day_key: crate::date::today_key(),
            quantity: 1,
            ml_override: Some(330),
            abv_override: Some(5.0),
        };
        service.repo.insert_event(&event).await.unwrap();

        let before = service.export().await.unwrap();
        let json = serde_json::to_string(&before).unwrap();

        service.import_json(&json).await.unwrap();

        let after = service.export().await.unwrap();
        assert_eq!(before.drinks, after.drinks);
        assert_eq!(before.events, after.events);
        assert_eq!(before.settings, after.settings);
    }

    #[tokio::test]
    async fn test_unsupported_version_rejected_without_changes() {
        let service = create_test_service().await;

        let mut payload =
            serde_json::to_value(service.export().await.unwrap()).unwrap();
        payload["version"] = serde_json::json!(2);

        let result = service.import_json(&payload.to_string()).await;
        assert!(matches!(result, Err(AppError::Import(_))));

        // Store untouched.
        assert_eq!(service.repo.count_drinks().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_version_defaults_to_one() {
        let service = create_test_service().await;

        let mut payload =
            serde_json::to_value(service.export().await.unwrap()).unwrap();
        payload.as_object_mut().unwrap().remove("version");

        service.import_json(&payload.to_string()).await.unwrap();
    }

    #[tokio::test]
    async fn test_bad_quantity_rejects_whole_import() {
        let service = create_test_service().await;

        let event = DrinkEvent {
            id: "event-1".to_string(),
            drink_id: config::SEED_DRINK_ID.to_string(),
            ts: Utc::now(),
            day_key: crate::date::today_key(),
            quantity: 1,
            ml_override: None,
            abv_override: None,
        };
        service.repo.insert_event(&event).await.unwrap();

        let mut payload =
            serde_json::to_value(service.export().await.unwrap()).unwrap();
        payload["events"][0]["quantity"] = serde_json::json!(2);

        let result = service.import_json(&payload.to_string()).await;
        assert!(matches!(result, Err(AppError::Import(_))));

        // The pre-existing event survives untouched.
        let kept = service.repo.get_event("event-1").await.unwrap().unwrap();
        assert_eq!(kept.quantity, 1);
    }

    #[tokio::test]
    async fn test_corrupt_json_rejected() {
        let service = create_test_service().await;

        let result = service.import_json("{not json").await;
        assert!(matches!(result, Err(AppError::Import(_))));
    }

    #[tokio::test]
    async fn test_invalid_theme_rejected() {
        let service = create_test_service().await;

        let mut payload =
            serde_json::to_value(service.export().await.unwrap()).unwrap();
        payload["settings"]["themeMode"] = serde_json::json!("sepia");

        let result = service.import_json(&payload.to_string()).await;
        assert!(matches!(result, Err(AppError::Import(_))));
    }

    #[tokio::test]
    async fn test_missing_sort_order_normalized_by_position() {
        let service = create_test_service().await;

        let mut payload =
            serde_json::to_value(service.export().await.unwrap()).unwrap();

        // Two drinks without sortOrder, in document order.
        let template = payload["drinks"][0].clone();
        let mut second = template.clone();
        second["id"] = serde_json::json!("drink-second");
        payload["drinks"] = serde_json::json!([template, second]);
        for drink in payload["drinks"].as_array_mut().unwrap() {
            drink.as_object_mut().unwrap().remove("sortOrder");
        }

        service.import_json(&payload.to_string()).await.unwrap();

        let drinks = service.repo.list_drinks().await.unwrap();
        assert_eq!(drinks[0].sort_order, 0);
        assert_eq!(drinks[1].id, "drink-second");
        assert_eq!(drinks[1].sort_order, 1);
    }

    #[tokio::test]
    async fn test_empty_drink_list_rejected() {
        let service = create_test_service().await;

        let mut payload =
            serde_json::to_value(service.export().await.unwrap()).unwrap();
        payload["drinks"] = serde_json::json!([]);

        let result = service.import_json(&payload.to_string()).await;
        assert!(matches!(result, Err(AppError::Import(_))));
    }

    #[tokio::test]
    async fn test_mismatched_pin_fields_rejected() {
        let service = create_test_service().await;

        let mut payload =
            serde_json::to_value(service.export().await.unwrap()).unwrap();
        payload["settings"]["pinHash"] = serde_json::json!("abc");
        payload["settings"]["pinSalt"] = serde_json::Value::Null;

        let result = service.import_json(&payload.to_string()).await;
        assert!(matches!(result, Err(AppError::Import(_))));
    }
}
