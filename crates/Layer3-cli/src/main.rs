//! Prana CLI - Main entry point
//!
//! 디스크에서 확장 선언과 아이템 파일을 읽어서 의존성 체인을 확인하거나
//! 카테고리를 수집한다. 디스크에서 읽은 확장은 훅 구현이 없는 데이터 확장이다.

use anyhow::Context;
use clap::{Parser, Subcommand};
use prana_core::{HookCatalog, Runtime};
use prana_foundation::RuntimeConfig;
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Prana - extension runtime with dependency-ordered hooks
#[derive(Parser, Debug)]
#[command(name = "prana")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Runtime config file (default: global + project runtime.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Additional extension search path
    #[arg(short, long = "extensions", value_name = "DIR")]
    extension_paths: Vec<PathBuf>,

    /// Additional item search path
    #[arg(short, long = "items", value_name = "DIR")]
    item_paths: Vec<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List discovered extensions in load order
    Extensions,
    /// Show the resolved dependency chain of an extension
    Chain {
        /// Extension id
        id: String,
    },
    /// Validate dependencies of every discovered extension
    Check,
    /// Collect a category and print it as JSON
    Collect {
        /// Category name
        category: String,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging (stderr, stdout은 JSON 출력용)
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = load_config(&args)?;
    debug!("Using runtime config: {:?}", config);

    let runtime = Runtime::with_config(config).context("invalid runtime config")?;
    runtime
        .load_extensions(HookCatalog::new())
        .await
        .context("failed to load extensions")?;

    match args.command {
        Command::Extensions => {
            // 해결에 실패해도 목록은 보여준다
            if let Err(e) = runtime.resolve().await {
                warn!("Dependency chains unavailable: {}", e);
            }
            for info in runtime.extensions().await {
                let chain = info
                    .chain
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "?".to_string());
                println!(
                    "{:<24} {:<32} chain: {}",
                    info.manifest.id,
                    info.manifest.display_name(),
                    chain
                );
            }
        }
        Command::Chain { id } => {
            let chain = runtime
                .chain(&id)
                .await
                .with_context(|| format!("cannot resolve chain for '{}'", id))?;
            println!("{} {}", id, chain);
        }
        Command::Check => {
            runtime.resolve().await.context("dependency check failed")?;
            println!("{} extensions OK", runtime.extensions().await.len());
        }
        Command::Collect { category, pretty } => {
            let items = runtime
                .collect(&category)
                .await
                .with_context(|| format!("failed to collect '{}'", category))?;
            let output = if pretty {
                serde_json::to_string_pretty(items.as_ref())?
            } else {
                serde_json::to_string(items.as_ref())?
            };
            println!("{}", output);
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<RuntimeConfig> {
    let mut config = match &args.config {
        Some(path) => RuntimeConfig::load_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RuntimeConfig::load().context("failed to load runtime config")?,
    };

    config.extension_paths.extend(args.extension_paths.iter().cloned());
    config.item_paths.extend(args.item_paths.iter().cloned());
    Ok(config)
}
