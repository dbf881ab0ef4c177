// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

/// Errors raised while retrieving or parsing a calendar feed.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The configured feed location is not a valid URL. No network attempt
    /// is made for these.
    #[error("invalid feed URL: {0}")]
    MalformedSource(String),

    /// I/O failure while connecting, reading or following redirects.
    #[error("{0}")]
    Transport(String),

    /// The server answered with a status the engine cannot act on
    /// (anything but 200, 304 or a redirect carrying a `Location`).
    #[error("{code} {reason}")]
    HttpStatus {
        /// HTTP status code.
        code: u16,
        /// Canonical reason phrase, possibly empty.
        reason: String,
    },

    /// The feed content is not valid iCalendar data.
    #[error("invalid calendar data: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<url::ParseError> for FeedError {
    fn from(e: url::ParseError) -> Self {
        Self::MalformedSource(e.to_string())
    }
}

impl From<std::io::Error> for FeedError {
    fn from(e: std::io::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
