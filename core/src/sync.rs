// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Orchestration of one sync pass over all enabled calendars.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use icsync_feed::{FeedError, FeedFetcher, FetchOutcome, FetchRequest, parse_events};
use tokio::sync::{Mutex, Semaphore};
use url::Url;

use crate::config::Config;
use crate::error::SyncError;
use crate::localdb::{Calendar, LocalDb};
use crate::notify::{LogNotifier, NotificationSink};
use crate::outcome::OutcomeRecorder;
use crate::reconcile::{ReconcileCounts, reconcile};

/// Upper bound on one whole sync invocation; calendars still running when it
/// expires are left to finish on their own.
const SYNC_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Aggregated statistics of one sync invocation across all calendars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
    pub deleted: u64,
    /// Calendars that failed with a transport-level I/O error.
    pub io_errors: u64,
    /// Calendars that failed with invalid calendar data.
    pub parse_errors: u64,
    /// Calendars that recorded any error.
    pub errors: u64,
}

impl SyncStats {
    /// Whether any calendar recorded an error.
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    fn absorb(&mut self, counts: ReconcileCounts) {
        self.inserted += counts.inserted;
        self.updated += counts.updated;
        self.skipped += counts.skipped;
        self.deleted += counts.deleted;
    }
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} updated, {} skipped, {} deleted, {} errors",
            self.inserted, self.updated, self.skipped, self.deleted, self.errors
        )
    }
}

/// Runs the fetch, parse, reconcile and record pipeline for every enabled
/// calendar, fanning out one task per calendar.
#[derive(Clone)]
pub struct Syncer {
    db: LocalDb,
    fetcher: FeedFetcher,
    notifier: Arc<dyn NotificationSink>,
    parallelism: usize,
}

impl Syncer {
    /// Creates a syncer over an open database.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(db: LocalDb, config: &Config) -> Result<Self, SyncError> {
        let fetcher = FeedFetcher::new(&config.fetch)?;
        let parallelism = config.parallelism.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
        });
        Ok(Self {
            db,
            fetcher,
            notifier: Arc::new(LogNotifier),
            parallelism,
        })
    }

    /// Replaces the notification sink, e.g. with a UI-backed one.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Synchronizes all enabled calendars, in no particular order.
    ///
    /// With `force_resync`, cache validators are not sent and every remote
    /// event is re-applied regardless of its recency fields.
    ///
    /// # Errors
    ///
    /// Only a failure to enumerate the calendars is fatal; everything that
    /// goes wrong inside one calendar is recorded on that calendar and does
    /// not stop the others.
    #[tracing::instrument(skip(self))]
    pub async fn sync_all(&self, force_resync: bool) -> Result<SyncStats, SyncError> {
        let calendars = self.db.calendars.list_enabled().await?;
        tracing::info!(calendars = calendars.len(), "starting sync");

        let stats = Arc::new(Mutex::new(SyncStats::default()));
        let semaphore = Arc::new(Semaphore::new(self.parallelism.max(1)));

        let mut handles = Vec::with_capacity(calendars.len());
        for calendar in calendars {
            let that = self.clone();
            let stats = Arc::clone(&stats);
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };
                that.sync_calendar(&calendar, force_resync, &stats).await;
            }));
        }

        // wait for every in-flight calendar; there is no mid-calendar
        // cancellation
        let deadline = tokio::time::Instant::now() + SYNC_TIMEOUT;
        for handle in handles {
            match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::error!(%err, "calendar sync task failed"),
                Err(_) => {
                    tracing::warn!("timed out waiting for calendar sync tasks");
                    break;
                }
            }
        }

        let stats = *stats.lock().await;
        tracing::info!(%stats, "sync finished");
        Ok(stats)
    }

    /// One calendar's pass: fetch, parse, reconcile, record, strictly in
    /// that order.
    ///
    /// Every failure kind ends in exactly one recorded error for this
    /// calendar; nothing propagates out.
    #[tracing::instrument(skip_all, fields(calendar = %calendar.name))]
    async fn sync_calendar(
        &self,
        calendar: &Calendar,
        force_resync: bool,
        stats: &Mutex<SyncStats>,
    ) {
        let recorder = OutcomeRecorder::new(&self.db.calendars, self.notifier.as_ref());

        let url = match Url::parse(&calendar.url) {
            Ok(url) => url,
            Err(e) => {
                stats.lock().await.errors += 1;
                let message = FeedError::MalformedSource(e.to_string()).to_string();
                record_error(&recorder, calendar, &message).await;
                return;
            }
        };

        let mut request = FetchRequest::new(url);
        if !force_resync {
            request.etag = calendar.etag.clone();
            request.last_modified = calendar.last_modified();
        }
        request.credentials = calendar.credentials();

        let outcome = self.fetcher.fetch(&mut request).await;

        // A permanent redirect rewrites the stored location on every exit
        // path, even when this attempt subsequently failed.
        if let Some(new_url) = &request.permanent_url {
            tracing::info!(%new_url, "permanent redirect, saving new location");
            if let Err(e) = self
                .db
                .calendars
                .update_url(calendar.id, new_url.as_str())
                .await
            {
                stats.lock().await.errors += 1;
                record_error(&recorder, calendar, &format!("storage error: {e}")).await;
                return;
            }
        }

        match outcome {
            Ok(FetchOutcome::NotModified) => {
                if let Err(e) = recorder.not_modified(calendar).await {
                    tracing::error!(%e, "failed to record sync outcome");
                }
            }
            Ok(FetchOutcome::Feed(feed)) => match parse_events(&feed.text) {
                Ok(events) => {
                    match reconcile(&self.db.events, calendar.id, &events, force_resync).await {
                        Ok(counts) => {
                            stats.lock().await.absorb(counts);
                            if let Err(e) = recorder
                                .success(calendar, feed.etag.as_deref(), feed.last_modified)
                                .await
                            {
                                tracing::error!(%e, "failed to record sync outcome");
                            }
                        }
                        Err(e) => {
                            stats.lock().await.errors += 1;
                            record_error(&recorder, calendar, &format!("storage error: {e}"))
                                .await;
                        }
                    }
                }
                Err(e) => {
                    let mut stats = stats.lock().await;
                    stats.parse_errors += 1;
                    stats.errors += 1;
                    drop(stats);
                    record_error(&recorder, calendar, &e.to_string()).await;
                }
            },
            Err(e) => {
                let mut stats = stats.lock().await;
                match &e {
                    FeedError::Transport(_) => stats.io_errors += 1,
                    FeedError::Parse(_) => stats.parse_errors += 1,
                    _ => {}
                }
                stats.errors += 1;
                drop(stats);
                record_error(&recorder, calendar, &e.to_string()).await;
            }
        }
    }
}

async fn record_error(recorder: &OutcomeRecorder<'_>, calendar: &Calendar, message: &str) {
    if let Err(e) = recorder.error(calendar, message).await {
        tracing::error!(%e, "failed to record sync outcome");
    }
}
