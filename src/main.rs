use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use stock_matcher::config::Command;
use stock_matcher::utils::error::{ErrorSeverity, MatcherError};
use stock_matcher::utils::{logger, validation::Validate};
use stock_matcher::{CliConfig, LocalStorage, MatcherEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 配置決定日誌格式，所以先載入配置
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e));
        }
    };

    let verbose = cli.verbose || config.verbose_logging();
    if cli.log_json || config.json_logging() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("Starting stock-matcher (data dir: {})", cli.data_dir);
    if verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(exit_code(&e));
    }

    let storage = LocalStorage::new(cli.data_dir.clone());
    let engine = MatcherEngine::new(storage, &config).context("failed to initialise matcher")?;

    match cli.command {
        Command::Search { query, limit } => {
            engine.load_catalog().await;
            let results = engine.search(&query.join(" "), limit);
            print_json(&results)?;
        }
        Command::Tasks => {
            let work = engine.pending_work().await;
            tracing::info!("📋 {} listings awaiting a decision", work.len());
            print_json(&work)?;
        }
        Command::Map { pk_key, ez_code } => {
            let status = engine.record_mapping(&pk_key, &ez_code).await;
            print_json(&status)?;
            if !status.is_success() {
                std::process::exit(1);
            }
        }
        Command::Stats => {
            engine.load_catalog().await;
            print_json(&engine.stats())?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let output = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", output);
    Ok(())
}

fn exit_code(e: &MatcherError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    }
}
