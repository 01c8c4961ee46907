//! Completed-days ledger.
//!
//! One growing set of calendar-day strings per user, owned by the cloud
//! document. Days are only ever appended; marking is idempotent per
//! device-local calendar day.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;
use crate::remote::{DocStoreClient, UserDocument};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Result of a mark call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkOutcome {
    /// First completion of the day; the date was appended.
    MarkedNew,
    /// The day was already on record; nothing written.
    AlreadyMarked,
}

/// Calendar-cell classification for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStatus {
    Completed,
    Missed,
    Upcoming,
}

/// Records which calendar days have a completed exercise.
///
/// Writes are read-modify-write against the remote document with no
/// optimistic-concurrency check: two devices completing on the same day
/// can race and the last write wins on the whole field. Accepted
/// limitation, not a guarantee.
#[derive(Debug, Clone)]
pub struct CompletionLedger {
    docs: DocStoreClient,
}

impl CompletionLedger {
    pub fn new(docs: DocStoreClient) -> Self {
        Self { docs }
    }

    /// Mark the device-local calendar day as completed. Idempotent:
    /// re-invoking on the same day is a no-op.
    pub async fn mark_today(&self, user_id: &str, id_token: &str) -> Result<MarkOutcome, RemoteError> {
        self.mark_day(user_id, id_token, chrono::Local::now().date_naive())
            .await
    }

    pub async fn mark_day(
        &self,
        user_id: &str,
        id_token: &str,
        day: NaiveDate,
    ) -> Result<MarkOutcome, RemoteError> {
        let date = day.format(DAY_FORMAT).to_string();
        let doc = self.docs.fetch_user(user_id, id_token).await?;
        let mut days = doc.completed_days.unwrap_or_default();
        if days.iter().any(|d| d.trim() == date) {
            return Ok(MarkOutcome::AlreadyMarked);
        }
        days.push(date.clone());
        self.docs
            .merge_user(
                user_id,
                id_token,
                &UserDocument {
                    completed_days: Some(days),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(%date, %user_id, "marked day completed");
        Ok(MarkOutcome::MarkedNew)
    }

    /// Fetch the full completed-days set.
    pub async fn fetch(&self, user_id: &str, id_token: &str) -> Result<BTreeSet<String>, RemoteError> {
        let doc = self.docs.fetch_user(user_id, id_token).await?;
        Ok(doc
            .completed_days
            .unwrap_or_default()
            .into_iter()
            .map(|d| d.trim().to_string())
            .collect())
    }
}

/// Classify a calendar day for rendering. A past day with no completion
/// is missed; today stays upcoming until it is marked.
pub fn day_status(date: NaiveDate, today: NaiveDate, completed: &BTreeSet<String>) -> DayStatus {
    let key = date.format(DAY_FORMAT).to_string();
    if completed.contains(&key) {
        DayStatus::Completed
    } else if date < today {
        DayStatus::Missed
    } else {
        DayStatus::Upcoming
    }
}
