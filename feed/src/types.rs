// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use jiff::Timestamp;

/// An event read from a remote feed.
///
/// Remote events are transient: they exist only for the duration of one sync
/// pass. The `uid` is the sole join key against local storage; `sequence` and
/// `last_modified` decide whether a remote version is newer than the stored
/// one. The remaining fields are carried as raw iCalendar property values;
/// the sync engine never interprets them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteEvent {
    /// Globally unique identifier within the feed (`UID`).
    pub uid: String,
    /// `SUMMARY` property value.
    pub summary: Option<String>,
    /// `DESCRIPTION` property value.
    pub description: Option<String>,
    /// `LOCATION` property value.
    pub location: Option<String>,
    /// Raw `DTSTART` property value.
    pub dtstart: Option<String>,
    /// Raw `DTEND` property value.
    pub dtend: Option<String>,
    /// `SEQUENCE` revision number, monotonically non-decreasing per UID.
    pub sequence: Option<i64>,
    /// `LAST-MODIFIED` instant. Absent when the feed omits the property or
    /// carries a value that is not a UTC date-time.
    pub last_modified: Option<Timestamp>,
}

impl RemoteEvent {
    /// Creates an event carrying only a UID.
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Self::default()
        }
    }
}

/// Username and password for HTTP Basic authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}
