// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

mod cli;
mod commands;
mod config;

use std::error::Error;

use clap::Parser;

pub use crate::cli::{Cli, Commands};

/// Run the icsync command-line interface.
pub async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = config::parse_config(cli.config).await?;

    match cli.command {
        Commands::Add {
            url,
            name,
            username,
            password,
            disabled,
        } => commands::add(&config, &url, name, username, password, disabled).await,
        Commands::List => commands::list(&config).await,
        Commands::Remove { id } => commands::remove(&config, id).await,
        Commands::Enable { id } => commands::set_enabled(&config, id, true).await,
        Commands::Disable { id } => commands::set_enabled(&config, id, false).await,
        Commands::Sync { force } => commands::sync(&config, force).await,
    }
}
