// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Command-line interface.
#[derive(Debug, clap::Parser)]
#[command(name = "icsync", version)]
#[command(about = "Keep local calendars in agreement with remote iCalendar feeds")]
pub struct Cli {
    /// Path to the configuration file. Defaults to
    /// <config_dir>/icsync/config.toml.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Subscribe to a feed calendar
    Add {
        /// Feed location (http://, https:// or file://)
        url: String,

        /// Display name, defaults to the feed's host
        #[arg(long)]
        name: Option<String>,

        /// Username for HTTP Basic authentication
        #[arg(long)]
        username: Option<String>,

        /// Password for HTTP Basic authentication
        #[arg(long, requires = "username")]
        password: Option<String>,

        /// Subscribe without enabling synchronization
        #[arg(long)]
        disabled: bool,
    },

    /// List subscribed calendars
    List,

    /// Remove a calendar and its stored events
    Remove {
        /// Calendar id, as shown by `icsync list`
        id: i64,
    },

    /// Enable synchronization for a calendar
    Enable {
        /// Calendar id, as shown by `icsync list`
        id: i64,
    },

    /// Disable synchronization for a calendar
    Disable {
        /// Calendar id, as shown by `icsync list`
        id: i64,
    },

    /// Synchronize all enabled calendars
    Sync {
        /// Ignore cached validators and re-apply every remote event
        #[arg(long)]
        force: bool,
    },
}
