// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use icsync_feed::FetchConfig;

/// Core configuration.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Config {
    /// Directory holding the local calendar database. `None` opens an
    /// in-memory database that lives only for the process.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Upper bound on concurrently synchronized calendars. Defaults to the
    /// number of available processing units.
    #[serde(default)]
    pub parallelism: Option<usize>,

    /// Feed fetcher settings.
    #[serde(default)]
    pub fetch: FetchConfig,
}
