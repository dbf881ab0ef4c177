// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Fetching and parsing of remote iCalendar (ICS) feeds over HTTP(S) or the
//! local filesystem, with conditional requests and explicit redirect handling.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
// Allow certain clippy lints that are too restrictive for this crate
#![allow(clippy::similar_names, clippy::single_match_else, clippy::match_bool)]

mod charset;
mod config;
mod error;
mod fetch;
mod parser;
mod types;

pub use crate::charset::charset_from_content_type;
pub use crate::config::FetchConfig;
pub use crate::error::FeedError;
pub use crate::fetch::{FeedFetcher, FetchOutcome, FetchRequest, FetchedFeed, MAX_REDIRECTS};
pub use crate::parser::parse_events;
pub use crate::types::{Credentials, RemoteEvent};
