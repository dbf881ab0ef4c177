// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

/// Receiver of user-visible sync failure notifications.
///
/// One notification exists per calendar at most: raising a new one replaces
/// the previous, and a successful sync dismisses it. UI layers plug in their
/// own sink; the default just logs.
pub trait NotificationSink: Send + Sync {
    /// Raises (or replaces) the failure notification for a calendar.
    fn notify_error(&self, calendar_name: &str, message: &str);

    /// Clears the failure notification for a calendar, if any.
    fn dismiss(&self, calendar_name: &str);
}

/// Notification sink that emits tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify_error(&self, calendar_name: &str, message: &str) {
        tracing::warn!(calendar = calendar_name, message, "calendar sync failed");
    }

    fn dismiss(&self, calendar_name: &str) {
        tracing::debug!(calendar = calendar_name, "clearing sync failure state");
    }
}
