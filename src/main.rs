// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use streamhop::Config;

mod cli;
use cli::{
    CacheCommand, CommandContext, LinksCommand, OutputFormat, PlayCommand, ProvidersCommand,
    StreamsCommand,
};

fn cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
}

#[derive(Parser)]
#[command(name = "streamhop")]
#[command(about = "Resolve streaming site catalog links into directly playable streams")]
#[command(version)]
#[command(styles = cargo_style())]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging to file (streamhop_debug.log)
    #[arg(long, global = true)]
    debug_log: bool,

    /// Use this config file instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a catalog link (`<title>` or `<title>::<episode>`) into streams
    Streams {
        /// Provider key (altadefinizionez, streamingunity, animeunity)
        provider: String,
        /// Catalog link
        link: String,
        /// Output format (text, json, m3u)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List the seasons and episodes of a title
    Links {
        /// Provider key
        provider: String,
        /// Title page URL or path
        title_ref: String,
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Resolve a catalog link and open it in the configured player
    Play {
        /// Provider key
        provider: String,
        /// Catalog link
        link: String,
    },

    /// Show configured providers and their live domains
    Providers {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Manage cache
    #[command(subcommand)]
    Cache(CacheSubCommand),
}

#[derive(Subcommand)]
enum CacheSubCommand {
    /// Clear cache
    Clear,
}

fn init_logging(cli: &Cli) -> Result<()> {
    if cli.debug_log {
        let file = File::create("streamhop_debug.log")?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_level(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(
                EnvFilter::from_default_env()
                    .add_directive("streamhop=debug".parse()?)
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::from_default_env()
                    .add_directive(tracing::Level::DEBUG.into())
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("hyper_util=error".parse()?),
            )
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config_path = cli
        .config
        .clone()
        .or_else(Config::default_path)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        tracing::debug!("No config at {}, using defaults", config_path.display());
        Config::default()
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, cancelling");
                cancel.cancel();
            }
        });
    }

    match cli.command {
        Commands::Streams {
            provider,
            link,
            format,
        } => {
            let cmd = StreamsCommand {
                provider,
                link,
                format: format.parse::<OutputFormat>()?,
            };
            cmd.execute(CommandContext::new(config, cancel)?).await?;
        }

        Commands::Links {
            provider,
            title_ref,
            format,
        } => {
            let cmd = LinksCommand {
                provider,
                title_ref,
                format: format.parse::<OutputFormat>()?,
            };
            cmd.execute(CommandContext::new(config, cancel)?).await?;
        }

        Commands::Play { provider, link } => {
            let cmd = PlayCommand { provider, link };
            cmd.execute(CommandContext::new(config, cancel)?).await?;
        }

        Commands::Providers { format } => {
            let cmd = ProvidersCommand {
                format: format.parse::<OutputFormat>()?,
            };
            cmd.execute(CommandContext::new(config, cancel)?).await?;
        }

        Commands::Cache(cache_cmd) => {
            let cmd = match cache_cmd {
                CacheSubCommand::Clear => CacheCommand::Clear,
            };
            cmd.execute().await?;
        }
    }

    Ok(())
}
