// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use icsync_feed::FeedError;

/// Errors surfaced by the synchronization core.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Feed retrieval or parsing failed.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// A local store operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}
