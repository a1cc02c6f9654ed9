use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use magpie::config::Config;
use magpie::connectivity;
use magpie::engine::OrchestrationEngine;
use magpie::models::{AliasCheck, ShortenRequest, ShortenedUrlRecord};
use magpie::providers::{self, Provider};
use magpie::qr::NullQrEncoder;
use magpie::service::ShortenService;
use magpie::storage::{MemoryStorage, SqliteStorage, Storage};
use magpie::transport::{CachingTransport, HttpTransport, ReqwestTransport};

#[derive(Parser)]
#[command(name = "magpie")]
#[command(about = "Shorten URLs through public short-link services", long_about = None)]
struct Cli {
    /// Configuration file, extension optional
    #[arg(long, global = true)]
    config: Option<String>,
    /// Keep history in memory only
    #[arg(long, global = true)]
    ephemeral: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List known services and what they support
    Providers {
        /// Include disabled services
        #[arg(long)]
        all: bool,
    },
    /// Shorten a URL
    Shorten {
        url: String,
        /// Service name, e.g. da.gd
        #[arg(short, long, default_value = "da.gd")]
        provider: String,
        #[arg(short, long)]
        alias: Option<String>,
        #[arg(long)]
        favorite: bool,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Ask a service whether an alias is taken
    Check {
        alias: String,
        #[arg(short, long, default_value = "da.gd")]
        provider: String,
    },
    /// Fetch the click count of a stored short URL
    Clicks { short_url: String },
    /// Show stored short URLs, newest first
    List {
        #[arg(long, default_value_t = 20)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
        #[arg(long)]
        favorites: bool,
    },
    /// Search stored short URLs
    Search {
        query: String,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Mark or unmark a stored short URL as favorite
    Favorite {
        short_url: String,
        #[arg(long)]
        off: bool,
    },
    /// Remove a stored short URL
    Delete { short_url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("magpie=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    if let Commands::Providers { all } = cli.command {
        print_providers(all);
        return Ok(());
    }

    let storage: Arc<dyn Storage> = if cli.ephemeral {
        Arc::new(MemoryStorage::new())
    } else {
        info!("Using SQLite storage: {}", config.database.url);
        Arc::new(SqliteStorage::new(&config.database.url, config.database.max_connections).await?)
    };
    storage.init().await.context("failed to initialize storage")?;

    let http: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::from_config(&config.http)?);
    let transport = Arc::new(CachingTransport::new(
        http,
        config.http.cache_capacity,
        Duration::from_secs(config.http.cache_ttl_secs),
    ));
    let connectivity = Arc::from(connectivity::from_config(&config.connectivity));
    let engine =
        OrchestrationEngine::new(transport, connectivity).with_storage(Arc::clone(&storage));
    let mut service = ShortenService::new(engine, storage, Arc::new(NullQrEncoder));
    if let Some(path) = &config.qr.icon_path {
        let icon = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read QR icon {path}"))?;
        service = service.with_icon(icon);
    }

    match cli.command {
        Commands::Providers { .. } => {}
        Commands::Shorten {
            url,
            provider,
            alias,
            favorite,
            title,
            description,
        } => {
            let mut request = ShortenRequest::new(lookup(&provider)?, url);
            request.alias = alias;
            request.favorite = favorite;
            request.title = title;
            request.description = description;
            let record = service.shorten(&request).await?;
            println!("{}", record.short_url);
        }
        Commands::Check { alias, provider } => {
            match service.engine().check_alias(lookup(&provider)?, &alias).await {
                AliasCheck::Available => println!("'{alias}' is available"),
                AliasCheck::Taken {
                    short_url,
                    long_url,
                } => println!("'{alias}' is taken: {short_url} -> {long_url}"),
                AliasCheck::Inconclusive(failure) => bail!("could not check '{alias}': {failure}"),
            }
        }
        Commands::Clicks { short_url } => {
            let clicks = service.refresh_clicks(&short_url).await?;
            println!("{clicks}");
        }
        Commands::List {
            limit,
            offset,
            favorites,
        } => print_records(&service.history(limit, offset, favorites).await?),
        Commands::Search { query, limit } => {
            print_records(&service.search(&query, limit).await?)
        }
        Commands::Favorite { short_url, off } => {
            service.set_favorite(&short_url, !off).await?;
            println!("✓ {short_url}");
        }
        Commands::Delete { short_url } => {
            service.delete(&short_url).await?;
            println!("✓ Deleted {short_url}");
        }
    }

    Ok(())
}

fn lookup(name: &str) -> Result<&'static Provider> {
    match providers::find(name) {
        Some(provider) => Ok(provider),
        None => bail!("unknown provider '{name}', see `magpie providers --all`"),
    }
}

fn print_providers(all: bool) {
    println!("{:<20} {:<8} {:<24} {}", "Provider", "Enabled", "Capabilities", "Alias");
    println!("{}", "-".repeat(80));
    let listed: Vec<&Provider> = if all {
        providers::all().iter().collect()
    } else {
        providers::enabled().collect()
    };
    for provider in listed {
        let alias = match provider.alias {
            Some(constraint) => match constraint.max_length {
                Some(max) => format!("{}..={} {}", constraint.min_length, max, constraint.allowed),
                None => format!("{}.. {}", constraint.min_length, constraint.allowed),
            },
            None => "-".to_string(),
        };
        println!(
            "{:<20} {:<8} {:<24} {}",
            provider.name,
            if provider.enabled { "yes" } else { "no" },
            provider.capabilities().join(", "),
            alias
        );
    }
}

fn print_records(records: &[ShortenedUrlRecord]) {
    if records.is_empty() {
        println!("No short URLs stored.");
        return;
    }
    for record in records {
        let created = Utc
            .timestamp_opt(record.created_at, 0)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let star = if record.favorite { "★" } else { " " };
        println!(
            "{star} {:<32} {:<12} {created}  {}",
            record.short_url, record.provider, record.long_url
        );
        if let Some(title) = &record.title {
            println!("    {title}");
        }
    }
}
