// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Persisting the terminal state of a per-calendar sync pass.

use jiff::Timestamp;

use crate::localdb::{Calendar, Calendars};
use crate::notify::NotificationSink;

/// Records exactly one terminal outcome per calendar per sync pass.
///
/// The three outcomes are mutually exclusive: success stores the new cache
/// validators, not-modified only moves the sync time, and error clears the
/// validators and raises a user-visible notification. All three update the
/// last-sync instant.
pub struct OutcomeRecorder<'a> {
    calendars: &'a Calendars,
    notifier: &'a dyn NotificationSink,
}

impl<'a> OutcomeRecorder<'a> {
    pub fn new(calendars: &'a Calendars, notifier: &'a dyn NotificationSink) -> Self {
        Self {
            calendars,
            notifier,
        }
    }

    pub async fn success(
        &self,
        calendar: &Calendar,
        etag: Option<&str>,
        last_modified: Option<Timestamp>,
    ) -> Result<(), sqlx::Error> {
        tracing::info!(
            calendar = %calendar.name,
            etag,
            ?last_modified,
            "calendar sync successful, saving sync state"
        );
        self.calendars
            .update_status_success(calendar.id, etag, last_modified, Timestamp::now())
            .await?;
        self.notifier.dismiss(&calendar.name);
        Ok(())
    }

    pub async fn not_modified(&self, calendar: &Calendar) -> Result<(), sqlx::Error> {
        tracing::info!(
            calendar = %calendar.name,
            "calendar has not been modified since last sync"
        );
        self.calendars
            .update_status_not_modified(calendar.id, Timestamp::now())
            .await?;
        self.notifier.dismiss(&calendar.name);
        Ok(())
    }

    pub async fn error(&self, calendar: &Calendar, message: &str) -> Result<(), sqlx::Error> {
        tracing::warn!(calendar = %calendar.name, message, "calendar sync failed");
        self.calendars
            .update_status_error(calendar.id, message, Timestamp::now())
            .await?;
        self.notifier.notify_error(&calendar.name, message);
        Ok(())
    }
}
