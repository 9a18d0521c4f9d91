// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Prodline CLI - product lines and their relationship graphs

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use prodline::commands::{self, Session};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "prodline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "PRODLINE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Data directory override
    #[arg(long, env = "PRODLINE_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(
        long,
        env = "NO_COLOR",
        global = true,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List product lines in display order
    Lines,

    /// List all products
    Products,

    /// Render one line's graph
    Line {
        /// Line id
        id: i64,

        /// Output format (dot, json)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a product's upstream/downstream graph across all lines
    Product {
        /// Product code
        code: String,

        /// Output format (dot, json)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show effective configuration
    Config {
        /// Dotted key (e.g. layout.x_gap); omit to show everything
        key: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 if cli.quiet => tracing::Level::ERROR,
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Completions { shell } = cli.command {
        return commands::completions::run(shell, &mut Cli::command());
    }

    let mut settings = prodline::config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }

    if let Commands::Config { key } = &cli.command {
        return commands::config::run(&settings, key.as_deref());
    }

    let session = Session::open(settings, !cli.no_color)?;

    match cli.command {
        Commands::Lines => commands::lines::run(&session),
        Commands::Products => commands::products::run(&session),
        Commands::Line { id, format, output } => {
            commands::line::run(&session, id, &format, output.as_deref())
        }
        Commands::Product { code, format, output } => {
            commands::product::run(&session, &code, &format, output.as_deref())
        }
        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}
