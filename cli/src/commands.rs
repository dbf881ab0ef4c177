// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use colored::Colorize;
use icsync_core::{Config, LocalDb, NewCalendar, Syncer};
use tokio::fs;
use url::Url;

pub async fn add(
    config: &Config,
    url: &str,
    name: Option<String>,
    username: Option<String>,
    password: Option<String>,
    disabled: bool,
) -> Result<(), Box<dyn Error>> {
    let parsed = Url::parse(url).map_err(|e| format!("Invalid feed URL {url}: {e}"))?;
    let name = name
        .or_else(|| parsed.host_str().map(ToString::to_string))
        .unwrap_or_else(|| url.to_string());

    let db = open_db(config).await?;
    let calendar = db
        .calendars
        .insert(&NewCalendar {
            name,
            url: url.to_string(),
            username,
            password,
            sync_enabled: !disabled,
        })
        .await?;

    println!(
        "Subscribed to {} as {} (#{})",
        calendar.url,
        calendar.name.bold(),
        calendar.id
    );
    db.close().await;
    Ok(())
}

pub async fn list(config: &Config) -> Result<(), Box<dyn Error>> {
    let db = open_db(config).await?;
    let calendars = db.calendars.list().await?;

    if calendars.is_empty() {
        println!("No calendars. Subscribe with `icsync add <url>`.");
    }
    for calendar in calendars {
        let state = match calendar.sync_enabled {
            true => "enabled".to_string(),
            false => "disabled".dimmed().to_string(),
        };
        println!(
            "#{} {} [{state}]\n    {}",
            calendar.id,
            calendar.name.bold(),
            calendar.url
        );
        match calendar.last_sync() {
            Some(at) => println!("    last sync: {at}"),
            None => println!("    never synced"),
        }
        if let Some(message) = &calendar.error_message {
            println!("    {} {message}", "sync error:".red());
        }
    }

    db.close().await;
    Ok(())
}

pub async fn remove(config: &Config, id: i64) -> Result<(), Box<dyn Error>> {
    let db = open_db(config).await?;
    let calendar = get_calendar(&db, id).await?;

    db.calendars.delete(calendar.id).await?;
    println!("Removed {} (#{})", calendar.name.bold(), calendar.id);

    db.close().await;
    Ok(())
}

pub async fn set_enabled(config: &Config, id: i64, enabled: bool) -> Result<(), Box<dyn Error>> {
    let db = open_db(config).await?;
    let calendar = get_calendar(&db, id).await?;

    db.calendars.set_enabled(calendar.id, enabled).await?;
    let state = match enabled {
        true => "enabled",
        false => "disabled",
    };
    println!("Synchronization {state} for {} (#{})", calendar.name.bold(), calendar.id);

    db.close().await;
    Ok(())
}

pub async fn sync(config: &Config, force: bool) -> Result<(), Box<dyn Error>> {
    let db = open_db(config).await?;
    let syncer = Syncer::new(db.clone(), config)?;

    let stats = syncer.sync_all(force).await?;
    println!("Sync finished: {stats}");
    db.close().await;

    if stats.has_errors() {
        return Err(format!(
            "{} calendar(s) failed to sync, see `icsync list`",
            stats.errors
        )
        .into());
    }
    Ok(())
}

async fn open_db(config: &Config) -> Result<LocalDb, Box<dyn Error>> {
    if let Some(dir) = &config.state_dir {
        tracing::debug!(path = %dir.display(), "ensuring state directory exists");
        fs::create_dir_all(dir)
            .await
            .map_err(|e| format!("Failed to create state directory: {e}"))?;
    }

    LocalDb::open(config.state_dir.as_deref())
        .await
        .map_err(|e| format!("Failed to open database: {e}").into())
}

async fn get_calendar(db: &LocalDb, id: i64) -> Result<icsync_core::Calendar, Box<dyn Error>> {
    db.calendars
        .get(id)
        .await?
        .ok_or_else(|| format!("No calendar #{id}, see `icsync list`").into())
}
