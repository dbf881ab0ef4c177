// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

mod config;
mod error;
mod localdb;
mod notify;
mod outcome;
mod reconcile;
mod sync;

pub use icsync_feed::{Credentials, FeedError, FetchConfig, RemoteEvent};

pub use crate::config::Config;
pub use crate::error::SyncError;
pub use crate::localdb::{Calendar, Calendars, Events, LocalDb, LocalEvent, NewCalendar};
pub use crate::notify::{LogNotifier, NotificationSink};
pub use crate::outcome::OutcomeRecorder;
pub use crate::reconcile::{ReconcileCounts, reconcile};
pub use crate::sync::{SyncStats, Syncer};

/// Application name, used for default directories.
pub const APP_NAME: &str = "icsync";
