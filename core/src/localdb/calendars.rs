// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use icsync_feed::Credentials;
use jiff::Timestamp;
use sqlx::SqlitePool;

/// Store for subscribed feed calendars.
#[derive(Debug, Clone)]
pub struct Calendars {
    pool: SqlitePool,
}

impl Calendars {
    pub(crate) async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        const SQL: &str = "\
CREATE TABLE IF NOT EXISTS calendars (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    url           TEXT NOT NULL,
    etag          TEXT,
    last_modified INTEGER,
    last_sync     INTEGER,
    error_message TEXT,
    username      TEXT,
    password      TEXT,
    sync_enabled  INTEGER NOT NULL DEFAULT 1
);
";

        sqlx::query(SQL).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn insert(&self, calendar: &NewCalendar) -> Result<Calendar, sqlx::Error> {
        const SQL: &str = "\
INSERT INTO calendars (name, url, username, password, sync_enabled)
VALUES (?, ?, ?, ?, ?);
";

        let result = sqlx::query(SQL)
            .bind(&calendar.name)
            .bind(&calendar.url)
            .bind(&calendar.username)
            .bind(&calendar.password)
            .bind(calendar.sync_enabled)
            .execute(&self.pool)
            .await?;

        self.get(result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Calendar>, sqlx::Error> {
        const SQL: &str = "SELECT * FROM calendars WHERE id = ?;";

        sqlx::query_as(SQL).bind(id).fetch_optional(&self.pool).await
    }

    pub async fn list(&self) -> Result<Vec<Calendar>, sqlx::Error> {
        const SQL: &str = "SELECT * FROM calendars ORDER BY id ASC;";

        sqlx::query_as(SQL).fetch_all(&self.pool).await
    }

    /// Lists the calendars that take part in synchronization.
    pub async fn list_enabled(&self) -> Result<Vec<Calendar>, sqlx::Error> {
        const SQL: &str = "SELECT * FROM calendars WHERE sync_enabled = 1 ORDER BY id ASC;";

        sqlx::query_as(SQL).fetch_all(&self.pool).await
    }

    /// Rewrites the feed location, used when the server permanently moved it.
    pub async fn update_url(&self, id: i64, url: &str) -> Result<(), sqlx::Error> {
        const SQL: &str = "UPDATE calendars SET url = ? WHERE id = ?;";

        sqlx::query(SQL).bind(url).bind(id).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn set_enabled(&self, id: i64, enabled: bool) -> Result<(), sqlx::Error> {
        const SQL: &str = "UPDATE calendars SET sync_enabled = ? WHERE id = ?;";

        sqlx::query(SQL)
            .bind(enabled)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), sqlx::Error> {
        const SQL: &str = "DELETE FROM calendars WHERE id = ?;";

        sqlx::query(SQL).bind(id).execute(&self.pool).await?;
        Ok(())
    }

    /// Records a successful sync: both cache validators are stored together
    /// and any previous error is cleared.
    pub async fn update_status_success(
        &self,
        id: i64,
        etag: Option<&str>,
        last_modified: Option<Timestamp>,
        synced_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        const SQL: &str = "\
UPDATE calendars
SET etag = ?, last_modified = ?, last_sync = ?, error_message = NULL
WHERE id = ?;
";

        sqlx::query(SQL)
            .bind(etag)
            .bind(last_modified.map(|t| t.as_millisecond()))
            .bind(synced_at.as_millisecond())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records a not-modified sync: only the sync time moves, the validators
    /// and any error message stay untouched.
    pub async fn update_status_not_modified(
        &self,
        id: i64,
        synced_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        const SQL: &str = "UPDATE calendars SET last_sync = ? WHERE id = ?;";

        sqlx::query(SQL)
            .bind(synced_at.as_millisecond())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records a failed sync: both cache validators are cleared together so
    /// the next attempt fetches unconditionally.
    pub async fn update_status_error(
        &self,
        id: i64,
        message: &str,
        synced_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        const SQL: &str = "\
UPDATE calendars
SET etag = NULL, last_modified = NULL, last_sync = ?, error_message = ?
WHERE id = ?;
";

        sqlx::query(SQL)
            .bind(synced_at.as_millisecond())
            .bind(message)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// A feed calendar as stored locally.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Calendar {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub etag: Option<String>,
    last_modified: Option<i64>,
    last_sync: Option<i64>,
    pub error_message: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub sync_enabled: bool,
}

impl Calendar {
    /// `Last-Modified` validator of the last successfully fetched body.
    pub fn last_modified(&self) -> Option<Timestamp> {
        self.last_modified
            .and_then(|ms| Timestamp::from_millisecond(ms).ok())
    }

    /// Instant of the last completed sync attempt, whatever its outcome.
    pub fn last_sync(&self) -> Option<Timestamp> {
        self.last_sync
            .and_then(|ms| Timestamp::from_millisecond(ms).ok())
    }

    /// Basic auth credentials, present only when both parts are set.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

/// Fields needed to subscribe to a new feed calendar.
#[derive(Debug, Clone)]
pub struct NewCalendar {
    pub name: String,
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub sync_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localdb::LocalDb;

    async fn setup_test_db() -> LocalDb {
        LocalDb::open(None)
            .await
            .expect("Failed to create test database")
    }

    fn test_calendar(name: &str, url: &str) -> NewCalendar {
        NewCalendar {
            name: name.to_string(),
            url: url.to_string(),
            username: None,
            password: None,
            sync_enabled: true,
        }
    }

    #[tokio::test]
    async fn calendars_insert_assigns_id_and_defaults() {
        // Arrange
        let db = setup_test_db().await;

        // Act
        let calendar = db
            .calendars
            .insert(&test_calendar("Work", "https://example.com/work.ics"))
            .await
            .expect("Failed to insert calendar");

        // Assert
        assert_eq!(calendar.name, "Work");
        assert_eq!(calendar.url, "https://example.com/work.ics");
        assert_eq!(calendar.etag, None);
        assert_eq!(calendar.last_modified(), None);
        assert_eq!(calendar.last_sync(), None);
        assert_eq!(calendar.error_message, None);
        assert!(calendar.sync_enabled);
    }

    #[tokio::test]
    async fn calendars_list_enabled_skips_disabled() {
        // Arrange
        let db = setup_test_db().await;
        let enabled = db
            .calendars
            .insert(&test_calendar("On", "https://example.com/a.ics"))
            .await
            .unwrap();
        let disabled = db
            .calendars
            .insert(&NewCalendar {
                sync_enabled: false,
                ..test_calendar("Off", "https://example.com/b.ics")
            })
            .await
            .unwrap();

        // Act
        let listed = db.calendars.list_enabled().await.unwrap();

        // Assert
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, enabled.id);
        assert_ne!(listed[0].id, disabled.id);
    }

    #[tokio::test]
    async fn calendars_update_url_rewrites_location() {
        // Arrange
        let db = setup_test_db().await;
        let calendar = db
            .calendars
            .insert(&test_calendar("Work", "https://old.example.com/feed.ics"))
            .await
            .unwrap();

        // Act
        db.calendars
            .update_url(calendar.id, "https://new.example.com/feed.ics")
            .await
            .expect("Failed to update url");

        // Assert
        let reloaded = db.calendars.get(calendar.id).await.unwrap().unwrap();
        assert_eq!(reloaded.url, "https://new.example.com/feed.ics");
    }

    #[tokio::test]
    async fn calendars_status_success_stores_validators_and_clears_error() {
        // Arrange
        let db = setup_test_db().await;
        let calendar = db
            .calendars
            .insert(&test_calendar("Work", "https://example.com/feed.ics"))
            .await
            .unwrap();
        let now = Timestamp::now();
        db.calendars
            .update_status_error(calendar.id, "boom", now)
            .await
            .unwrap();

        // Act
        let modified: Timestamp = "2025-05-30T12:00:00Z".parse().unwrap();
        db.calendars
            .update_status_success(calendar.id, Some("\"v2\""), Some(modified), now)
            .await
            .expect("Failed to record success");

        // Assert
        let reloaded = db.calendars.get(calendar.id).await.unwrap().unwrap();
        assert_eq!(reloaded.etag.as_deref(), Some("\"v2\""));
        assert_eq!(reloaded.last_modified(), Some(modified));
        assert_eq!(reloaded.error_message, None);
        assert!(reloaded.last_sync().is_some());
    }

    #[tokio::test]
    async fn calendars_status_error_clears_both_validators() {
        // Arrange
        let db = setup_test_db().await;
        let calendar = db
            .calendars
            .insert(&test_calendar("Work", "https://example.com/feed.ics"))
            .await
            .unwrap();
        let now = Timestamp::now();
        db.calendars
            .update_status_success(calendar.id, Some("\"v1\""), Some(now), now)
            .await
            .unwrap();

        // Act
        db.calendars
            .update_status_error(calendar.id, "404 Not Found", now)
            .await
            .expect("Failed to record error");

        // Assert
        let reloaded = db.calendars.get(calendar.id).await.unwrap().unwrap();
        assert_eq!(reloaded.etag, None);
        assert_eq!(reloaded.last_modified(), None);
        assert_eq!(reloaded.error_message.as_deref(), Some("404 Not Found"));
    }

    #[tokio::test]
    async fn calendars_status_not_modified_touches_only_last_sync() {
        // Arrange
        let db = setup_test_db().await;
        let calendar = db
            .calendars
            .insert(&test_calendar("Work", "https://example.com/feed.ics"))
            .await
            .unwrap();
        let earlier: Timestamp = "2025-01-01T00:00:00Z".parse().unwrap();
        db.calendars
            .update_status_success(calendar.id, Some("\"v1\""), Some(earlier), earlier)
            .await
            .unwrap();

        // Act
        let now = Timestamp::now();
        db.calendars
            .update_status_not_modified(calendar.id, now)
            .await
            .expect("Failed to record not-modified");

        // Assert
        let reloaded = db.calendars.get(calendar.id).await.unwrap().unwrap();
        assert_eq!(reloaded.etag.as_deref(), Some("\"v1\""));
        assert_eq!(reloaded.last_modified(), Some(earlier));
        let stored = Timestamp::from_millisecond(now.as_millisecond()).unwrap();
        assert_eq!(reloaded.last_sync(), Some(stored));
    }

    #[tokio::test]
    async fn calendars_credentials_require_both_parts() {
        // Arrange
        let db = setup_test_db().await;
        let calendar = db
            .calendars
            .insert(&NewCalendar {
                username: Some("user".to_string()),
                password: None,
                ..test_calendar("Half", "https://example.com/feed.ics")
            })
            .await
            .unwrap();

        // Act & Assert
        assert_eq!(calendar.credentials(), None);
    }
}
