// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Reconciliation of a remote event set against the local store.

use std::collections::HashSet;
use std::ops::AddAssign;

use icsync_feed::RemoteEvent;

use crate::localdb::{Events, LocalEvent};

/// Row counts of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileCounts {
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
    pub deleted: u64,
}

impl AddAssign for ReconcileCounts {
    fn add_assign(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.deleted += other.deleted;
    }
}

/// Brings the stored events of one calendar in line with `remote_events`.
///
/// Single pass in parser order: unknown UIDs are inserted, known UIDs are
/// replaced when the remote version is strictly newer (always, with
/// `ignore_recency`), and everything whose UID was not seen is deleted at
/// the end. This is the sole deletion path for synced events.
///
/// A storage failure aborts the pass; operations already applied stay in
/// place and the caller records the failure for this calendar.
pub async fn reconcile(
    events: &Events,
    calendar_id: i64,
    remote_events: &[RemoteEvent],
    ignore_recency: bool,
) -> Result<ReconcileCounts, sqlx::Error> {
    tracing::info!(
        calendar_id,
        events = remote_events.len(),
        ignore_recency,
        "processing remote events"
    );

    let mut counts = ReconcileCounts::default();
    let mut seen = HashSet::with_capacity(remote_events.len());

    for remote in remote_events {
        seen.insert(remote.uid.clone());

        match events.find_by_uid(calendar_id, &remote.uid).await? {
            None => {
                tracing::debug!(uid = %remote.uid, "not in local calendar, adding");
                events.insert(calendar_id, remote).await?;
                counts.inserted += 1;
            }
            Some(local) => {
                if ignore_recency || remote_is_newer(remote, &local) {
                    tracing::debug!(uid = %remote.uid, "updating in local calendar");
                    events.replace(local.id, remote).await?;
                    counts.updated += 1;
                } else {
                    tracing::debug!(uid = %remote.uid, "not modified since last sync");
                    counts.skipped += 1;
                }
            }
        }
    }

    counts.deleted = events.retain_uids(calendar_id, &seen).await?;
    tracing::info!(
        calendar_id,
        retained = seen.len(),
        deleted = counts.deleted,
        "deleted stale events"
    );

    Ok(counts)
}

/// Whether the remote version strictly advances past the stored one.
///
/// `LAST-MODIFIED` is authoritative when the remote carries it; `SEQUENCE`
/// is consulted otherwise. Equal values are not newer; the local copy holds
/// until the remote strictly advances. An event carrying neither field is
/// always considered newer.
fn remote_is_newer(remote: &RemoteEvent, local: &LocalEvent) -> bool {
    if let Some(remote_modified) = remote.last_modified {
        return match local.last_modified() {
            Some(local_modified) => remote_modified > local_modified,
            None => true,
        };
    }
    if let Some(remote_sequence) = remote.sequence {
        return match local.sequence {
            Some(local_sequence) => remote_sequence > local_sequence,
            None => true,
        };
    }
    true
}
