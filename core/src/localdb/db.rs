// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use super::calendars::Calendars;
use super::events::Events;

const DB_NAME: &str = "icsync.db";

/// Handle to the local calendar database.
#[derive(Debug, Clone)]
pub struct LocalDb {
    pool: SqlitePool,

    pub calendars: Calendars,
    pub events: Events,
}

impl LocalDb {
    /// Opens a sqlite database connection and prepares the schema.
    /// If `state_dir` is `None`, it opens an in-memory database.
    pub async fn open(state_dir: Option<&Path>) -> Result<Self, sqlx::Error> {
        let pool = match state_dir {
            Some(dir) => {
                tracing::info!(path = %dir.display(), "connecting to SQLite database");
                let options = SqliteConnectOptions::new()
                    .filename(dir.join(DB_NAME))
                    .foreign_keys(true)
                    .create_if_missing(true);
                SqlitePoolOptions::new().connect_with(options).await?
            }
            None => {
                tracing::info!("connecting to in-memory SQLite database");
                let options = SqliteConnectOptions::new().in_memory(true).foreign_keys(true);
                // a second pool connection would see a different empty
                // in-memory database, so stick to one
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .connect_with(options)
                    .await?
            }
        };

        tracing::debug!("creating tables in the database");
        let calendars = Calendars::new(pool.clone()).await?;
        let events = Events::new(pool.clone()).await?;
        Ok(LocalDb {
            pool,
            calendars,
            events,
        })
    }

    /// Closes the database connection.
    pub async fn close(self) {
        tracing::debug!("closing database connection");
        self.pool.close().await;
    }
}
