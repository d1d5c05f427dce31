mod cli;

use heirloom::{archive, config, server};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    // Load config
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting Heirloom server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );
    tracing::info!("Storing photos in {:?}", config.storage.images_dir());

    let workflow = archive::open_workflow(&config.storage)?;

    server::start_server(config, workflow).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "heirloom=trace,heirloom_db=debug,heirloom_iptc=debug,tower_http=debug".to_string()
        } else {
            "heirloom=info,heirloom_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            // Create tokio runtime
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("heirloom {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Inspect { file } => inspect_file(&file),
        Commands::Reclaim => reclaim(cli.config.as_deref()),
        Commands::Retag => retag(cli.config.as_deref()),
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_config(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            print_config(&config::Config::default());
        }
    }

    Ok(())
}

fn print_config(config: &config::Config) {
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Upload limit: {} MB", config.server.max_upload_mb);
    if let Some(ref dir) = config.server.static_dir {
        println!("  Static files: {}", dir.display());
    }
    println!("  Images: {}", config.storage.images_dir().display());
    println!("  Database: {}", config.storage.database_path().display());
}

fn inspect_file(file: &Path) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let tags = heirloom_iptc::read_tags(file)?;

    println!("File: {}", file.display());
    if tags.is_empty() {
        println!("No IPTC tags");
        return Ok(());
    }
    for (tag, value) in tags.iter() {
        println!("  {:<18} {}", tag.name(), value);
    }

    Ok(())
}

fn reclaim(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let workflow = archive::open_workflow(&config.storage)?;

    let report = workflow.reclaim_superseded()?;
    println!("Removed: {}", report.reclaimed);
    println!("Already missing: {}", report.already_missing);
    println!("Still referenced: {}", report.still_referenced);
    println!("Failed: {}", report.failed);

    Ok(())
}

fn retag(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let workflow = archive::open_workflow(&config.storage)?;

    let report = workflow.retag_all()?;
    println!("Updated: {}", report.updated);
    println!("Unchanged: {}", report.unchanged);
    println!("Missing files: {}", report.missing);
    println!("Skipped (format): {}", report.skipped);
    println!("Failed: {}", report.failed);

    Ok(())
}
