// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;

use icsync_feed::RemoteEvent;
use jiff::Timestamp;
use sqlx::SqlitePool;

/// Store for locally persisted feed events.
#[derive(Debug, Clone)]
pub struct Events {
    pool: SqlitePool,
}

impl Events {
    pub(crate) async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        const SQL: &str = "\
CREATE TABLE IF NOT EXISTS events (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    calendar_id   INTEGER NOT NULL REFERENCES calendars(id) ON DELETE CASCADE,
    uid           TEXT NOT NULL,
    summary       TEXT NOT NULL DEFAULT '',
    description   TEXT NOT NULL DEFAULT '',
    location      TEXT NOT NULL DEFAULT '',
    dtstart       TEXT NOT NULL DEFAULT '',
    dtend         TEXT NOT NULL DEFAULT '',
    sequence      INTEGER,
    last_modified INTEGER
);
";
        const SQL_INDEX: &str =
            "CREATE INDEX IF NOT EXISTS idx_events_calendar_uid ON events (calendar_id, uid);";

        sqlx::query(SQL).execute(&pool).await?;
        sqlx::query(SQL_INDEX).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Point lookup by UID. The UID is not unique at the storage layer;
    /// the first match by row id wins.
    pub async fn find_by_uid(
        &self,
        calendar_id: i64,
        uid: &str,
    ) -> Result<Option<LocalEvent>, sqlx::Error> {
        const SQL: &str = "\
SELECT id, calendar_id, uid, summary, description, location, dtstart, dtend, sequence, last_modified
FROM events
WHERE calendar_id = ? AND uid = ?
ORDER BY id ASC
LIMIT 1;
";

        sqlx::query_as(SQL)
            .bind(calendar_id)
            .bind(uid)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn insert(&self, calendar_id: i64, event: &RemoteEvent) -> Result<(), sqlx::Error> {
        const SQL: &str = "\
INSERT INTO events (calendar_id, uid, summary, description, location, dtstart, dtend, sequence, last_modified)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?);
";

        sqlx::query(SQL)
            .bind(calendar_id)
            .bind(&event.uid)
            .bind(event.summary.as_deref().unwrap_or_default())
            .bind(event.description.as_deref().unwrap_or_default())
            .bind(event.location.as_deref().unwrap_or_default())
            .bind(event.dtstart.as_deref().unwrap_or_default())
            .bind(event.dtend.as_deref().unwrap_or_default())
            .bind(event.sequence)
            .bind(event.last_modified.map(|t| t.as_millisecond()))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Replaces all fields of a stored event with the remote version.
    pub async fn replace(&self, id: i64, event: &RemoteEvent) -> Result<(), sqlx::Error> {
        const SQL: &str = "\
UPDATE events
SET summary = ?, description = ?, location = ?, dtstart = ?, dtend = ?, sequence = ?, last_modified = ?
WHERE id = ?;
";

        sqlx::query(SQL)
            .bind(event.summary.as_deref().unwrap_or_default())
            .bind(event.description.as_deref().unwrap_or_default())
            .bind(event.location.as_deref().unwrap_or_default())
            .bind(event.dtstart.as_deref().unwrap_or_default())
            .bind(event.dtend.as_deref().unwrap_or_default())
            .bind(event.sequence)
            .bind(event.last_modified.map(|t| t.as_millisecond()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Deletes every event of the calendar whose UID is not in `uids`,
    /// returning the number of deleted rows.
    pub async fn retain_uids(
        &self,
        calendar_id: i64,
        uids: &HashSet<String>,
    ) -> Result<u64, sqlx::Error> {
        let mut sql = "DELETE FROM events WHERE calendar_id = ?".to_string();
        if !uids.is_empty() {
            let placeholders = vec!["?"; uids.len()].join(", ");
            sql += &format!(" AND uid NOT IN ({placeholders})");
        }
        sql += ";";

        let mut query = sqlx::query(&sql).bind(calendar_id);
        for uid in uids {
            query = query.bind(uid);
        }

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn list(&self, calendar_id: i64) -> Result<Vec<LocalEvent>, sqlx::Error> {
        const SQL: &str = "\
SELECT id, calendar_id, uid, summary, description, location, dtstart, dtend, sequence, last_modified
FROM events
WHERE calendar_id = ?
ORDER BY id ASC;
";

        sqlx::query_as(SQL)
            .bind(calendar_id)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn count(&self, calendar_id: i64) -> Result<i64, sqlx::Error> {
        const SQL: &str = "SELECT COUNT(*) FROM events WHERE calendar_id = ?;";

        let row: (i64,) = sqlx::query_as(SQL)
            .bind(calendar_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}

/// A feed event as stored locally.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LocalEvent {
    pub id: i64,
    pub calendar_id: i64,
    pub uid: String,
    pub summary: String,
    pub description: String,
    pub location: String,
    pub dtstart: String,
    pub dtend: String,
    pub sequence: Option<i64>,
    last_modified: Option<i64>,
}

impl LocalEvent {
    /// `LAST-MODIFIED` of the stored version, if the feed carried one.
    pub fn last_modified(&self) -> Option<Timestamp> {
        self.last_modified
            .and_then(|ms| Timestamp::from_millisecond(ms).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localdb::LocalDb;

    async fn setup_test_db() -> (LocalDb, i64) {
        let db = LocalDb::open(None)
            .await
            .expect("Failed to create test database");
        let calendar = db
            .calendars
            .insert(&crate::localdb::NewCalendar {
                name: "Test".to_string(),
                url: "https://example.com/feed.ics".to_string(),
                username: None,
                password: None,
                sync_enabled: true,
            })
            .await
            .expect("Failed to insert calendar");
        (db, calendar.id)
    }

    fn test_event(uid: &str, summary: &str) -> RemoteEvent {
        RemoteEvent {
            summary: Some(summary.to_string()),
            ..RemoteEvent::new(uid)
        }
    }

    #[tokio::test]
    async fn events_insert_and_find_by_uid() {
        // Arrange
        let (db, calendar_id) = setup_test_db().await;
        let event = test_event("event-1", "Test Event");

        // Act
        db.events
            .insert(calendar_id, &event)
            .await
            .expect("Failed to insert event");

        // Assert
        let found = db
            .events
            .find_by_uid(calendar_id, "event-1")
            .await
            .expect("Failed to query event")
            .expect("Event not found");
        assert_eq!(found.uid, "event-1");
        assert_eq!(found.summary, "Test Event");
        assert_eq!(found.last_modified(), None);
    }

    #[tokio::test]
    async fn events_find_by_uid_returns_none_for_missing() {
        // Arrange
        let (db, calendar_id) = setup_test_db().await;

        // Act
        let found = db
            .events
            .find_by_uid(calendar_id, "nonexistent")
            .await
            .expect("Failed to query event");

        // Assert
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn events_find_by_uid_first_match_wins() {
        // Arrange
        let (db, calendar_id) = setup_test_db().await;
        db.events
            .insert(calendar_id, &test_event("dup", "First"))
            .await
            .unwrap();
        db.events
            .insert(calendar_id, &test_event("dup", "Second"))
            .await
            .unwrap();

        // Act
        let found = db
            .events
            .find_by_uid(calendar_id, "dup")
            .await
            .unwrap()
            .unwrap();

        // Assert
        assert_eq!(found.summary, "First");
    }

    #[tokio::test]
    async fn events_replace_overwrites_all_fields() {
        // Arrange
        let (db, calendar_id) = setup_test_db().await;
        let original = RemoteEvent {
            description: Some("Old description".to_string()),
            sequence: Some(1),
            last_modified: Some("2025-01-01T00:00:00Z".parse().unwrap()),
            ..test_event("event-1", "Old")
        };
        db.events.insert(calendar_id, &original).await.unwrap();
        let stored = db
            .events
            .find_by_uid(calendar_id, "event-1")
            .await
            .unwrap()
            .unwrap();

        // Act
        let newer = RemoteEvent {
            sequence: Some(2),
            last_modified: Some("2025-02-01T00:00:00Z".parse().unwrap()),
            ..test_event("event-1", "New")
        };
        db.events
            .replace(stored.id, &newer)
            .await
            .expect("Failed to replace event");

        // Assert
        let reloaded = db
            .events
            .find_by_uid(calendar_id, "event-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.id, stored.id);
        assert_eq!(reloaded.summary, "New");
        assert_eq!(reloaded.description, "");
        assert_eq!(reloaded.sequence, Some(2));
        assert_eq!(
            reloaded.last_modified(),
            Some("2025-02-01T00:00:00Z".parse().unwrap())
        );
    }

    #[tokio::test]
    async fn events_retain_uids_deletes_everything_else() {
        // Arrange
        let (db, calendar_id) = setup_test_db().await;
        for uid in ["keep-1", "keep-2", "drop-1", "drop-2"] {
            db.events
                .insert(calendar_id, &test_event(uid, uid))
                .await
                .unwrap();
        }

        // Act
        let uids: HashSet<String> = ["keep-1", "keep-2"].iter().map(ToString::to_string).collect();
        let deleted = db
            .events
            .retain_uids(calendar_id, &uids)
            .await
            .expect("Failed to retain events");

        // Assert
        assert_eq!(deleted, 2);
        let remaining = db.events.list(calendar_id).await.unwrap();
        let remaining: Vec<&str> = remaining.iter().map(|e| e.uid.as_str()).collect();
        assert_eq!(remaining, vec!["keep-1", "keep-2"]);
    }

    #[tokio::test]
    async fn events_retain_uids_with_empty_set_deletes_all() {
        // Arrange
        let (db, calendar_id) = setup_test_db().await;
        db.events
            .insert(calendar_id, &test_event("event-1", "Event"))
            .await
            .unwrap();

        // Act
        let deleted = db
            .events
            .retain_uids(calendar_id, &HashSet::new())
            .await
            .unwrap();

        // Assert
        assert_eq!(deleted, 1);
        assert_eq!(db.events.count(calendar_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn events_retain_uids_is_scoped_to_the_calendar() {
        // Arrange
        let (db, calendar_id) = setup_test_db().await;
        let other = db
            .calendars
            .insert(&crate::localdb::NewCalendar {
                name: "Other".to_string(),
                url: "https://example.com/other.ics".to_string(),
                username: None,
                password: None,
                sync_enabled: true,
            })
            .await
            .unwrap();
        db.events
            .insert(calendar_id, &test_event("shared-uid", "Mine"))
            .await
            .unwrap();
        db.events
            .insert(other.id, &test_event("shared-uid", "Theirs"))
            .await
            .unwrap();

        // Act
        let deleted = db
            .events
            .retain_uids(calendar_id, &HashSet::new())
            .await
            .unwrap();

        // Assert
        assert_eq!(deleted, 1);
        assert_eq!(db.events.count(other.id).await.unwrap(), 1);
    }
}
