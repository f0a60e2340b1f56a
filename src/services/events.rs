//! Consumption event service
//!
//! Quick-add, undo-last-today, the day-detail editor operations, and the
//! derived counts (today, per-day over a month). Settings and the default
//! drink are re-read on every call so a stale UI can never log against a
//! drink that no longer exists.

use crate::changes::{ChangeBus, StoreChange};
use crate::database::{DayCount, Drink, DrinkEvent, Repository};
use crate::date;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Outcome of a quick-add, driving the shell's confirmation or alert.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum QuickAdd {
    /// Normal confirmation: "+1 <emoji> <name>"
    #[serde(rename_all = "camelCase")]
    Added {
        event: DrinkEvent,
        today_count: i64,
    },
    /// The daily limit was reached with this event. The shell shows the
    /// alert, pulses haptics, and plays the tone when `play_sound` is set.
    #[serde(rename_all = "camelCase")]
    LimitReached {
        event: DrinkEvent,
        today_count: i64,
        limit: i64,
        play_sound: bool,
    },
}

/// Service for consumption events
#[derive(Clone)]
pub struct EventsService {
    repo: Repository,
    changes: ChangeBus,
}

impl EventsService {
    pub fn new(repo: Repository, changes: ChangeBus) -> Self {
        Self { repo, changes }
    }

    fn build_event(drink: &Drink, ts: DateTime<Utc>) -> DrinkEvent {
        DrinkEvent {
            id: format!("event-{}", Uuid::new_v4()),
            drink_id: drink.id.clone(),
            ts,
            day_key: date::day_key(ts),
            quantity: 1,
            ml_override: Some(drink.default_ml),
            abv_override: drink.abv,
        }
    }

    /// Log one consumption of the current default drink at "now".
    ///
    /// After the insert the day is recounted; reaching the configured limit
    /// turns the confirmation into a limit-reached signal.
    pub async fn quick_add(&self) -> Result<QuickAdd> {
        let settings = self
            .repo
            .get_settings()
            .await?
            .ok_or_else(|| AppError::Precondition("Settings not initialized".to_string()))?;

        let drink = self
            .repo
            .get_drink(&settings.default_drink_id)
            .await?
            .ok_or_else(|| AppError::Precondition("Select a default drink".to_string()))?;

        let event = Self::build_event(&drink, Utc::now());
        self.repo.insert_event(&event).await?;
        self.changes.publish(StoreChange::Events);

        let today_count = self.repo.count_events_for_day(&event.day_key).await?;

        if today_count >= settings.daily_limit_count {
            tracing::info!(
                "Daily limit reached: {}/{}",
                today_count,
                settings.daily_limit_count
            );
            Ok(QuickAdd::LimitReached {
                event,
                today_count,
                limit: settings.daily_limit_count,
                play_sound: settings.alert_sound_enabled,
            })
        } else {
            tracing::debug!("Quick-added {} ({}/today)", drink.name, today_count);
            Ok(QuickAdd::Added { event, today_count })
        }
    }

    /// Delete the chronologically last event of today, returning it.
    pub async fn undo_last_today(&self) -> Result<DrinkEvent> {
        let today = date::today_key();

        let last = self
            .repo
            .last_event_for_day(&today)
            .await?
            .ok_or_else(|| AppError::Precondition("No events today to undo".to_string()))?;

        self.repo.delete_event(&last.id).await?;
        self.changes.publish(StoreChange::Events);

        tracing::info!("Undid event {}", last.id);
        Ok(last)
    }

    /// Log a consumption of a chosen drink at a chosen time (day-detail
    /// creation).
    pub async fn add(&self, drink_id: &str, ts: DateTime<Utc>) -> Result<DrinkEvent> {
        let drink = self
            .repo
            .get_drink(drink_id)
            .await?
            .ok_or_else(|| AppError::DrinkNotFound(drink_id.to_string()))?;

        let event = Self::build_event(&drink, ts);
        self.repo.insert_event(&event).await?;
        self.changes.publish(StoreChange::Events);

        Ok(event)
    }

    /// Edit an event's drink and/or timestamp. The day key is recomputed
    /// from the final timestamp, and the volume/ABV snapshots are refreshed
    /// from the referenced drink when it still exists. A dangling drink
    /// reference keeps the prior snapshots.
    pub async fn update(
        &self,
        id: &str,
        drink_id: Option<String>,
        ts: Option<DateTime<Utc>>,
    ) -> Result<DrinkEvent> {
        let mut event = self
            .repo
            .get_event(id)
            .await?
            .ok_or_else(|| AppError::EventNotFound(id.to_string()))?;

        if let Some(drink_id) = drink_id {
            event.drink_id = drink_id;
        }
        if let Some(ts) = ts {
            event.ts = ts;
        }
        event.day_key = date::day_key(event.ts);

        if let Some(drink) = self.repo.get_drink(&event.drink_id).await? {
            event.ml_override = Some(drink.default_ml);
            event.abv_override = drink.abv;
        }

        self.repo.update_event(&event).await?;
        self.changes.publish(StoreChange::Events);

        tracing::info!("Updated event {}", event.id);
        Ok(event)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.repo.delete_event(id).await?;
        self.changes.publish(StoreChange::Events);

        tracing::info!("Deleted event {}", id);
        Ok(())
    }

    /// Number of events logged today.
    pub async fn today_count(&self) -> Result<i64> {
        self.repo.count_events_for_day(&date::today_key()).await
    }

    /// Events of one day in chronological order.
    pub async fn for_day(&self, day_key: &str) -> Result<Vec<DrinkEvent>> {
        self.repo.events_for_day(day_key).await
    }

    /// Per-day totals for a calendar month, inclusive.
    pub async fn month_counts(&self, year: i32, month: u32) -> Result<Vec<DayCount>> {
        let (start, end) = date::month_bounds(year, month)
            .ok_or_else(|| AppError::Validation(format!("Invalid month: {}-{}", year, month)))?;

        self.repo.day_counts_between(&start, &end).await
    }
}
