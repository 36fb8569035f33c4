mod cli;
mod command;
mod error;
mod paths;
mod render;
mod repl;

use std::fs;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use simplelog::Config;
use simplelog::WriteLogger;

use artsel_lib::SessionConfig;
use artsel_lib::cache::CacheConfig;
use artsel_lib::cache::InMemoryCache;
use artsel_lib::model::Artwork;
use artsel_lib::source::ArticSource;
use artsel_lib::source::CachedSource;
use artsel_lib::source::InMemorySource;

use crate::cli::Cli;
use crate::error::CliError;
use crate::repl::Repl;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match init_logging(&cli) {
        Ok(path) => eprintln!("logging to {}", path.display()),
        Err(e) => eprintln!("warning: {e}"),
    }

    if let Err(e) = run(cli).await {
        log::error!("{e}");
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut session = SessionConfig::new().with_page_size(cli.page_size);
    if let Some(ceiling) = cli.page_ceiling {
        session = session.with_page_ceiling(ceiling);
    }

    if let Some(items) = cli.demo {
        log::info!("demo collection of {items} artworks");
        return Repl::new(demo_source(items), session).run().await;
    }

    let cache = match (cli.cache_ttl_secs, cli.cache_pages) {
        (0, _) | (_, 0) => CacheConfig::no_cache(),
        (secs, pages) => CacheConfig::new()
            .with_page_ttl(Duration::from_secs(secs))
            .with_max_pages(pages),
    };
    let source = ArticSource::builder()
        .base_url(&cli.base_url)
        .timeout(Duration::from_secs(cli.timeout_secs))
        .build()?;
    log::info!("browsing {}", source.base_url());

    Repl::new(CachedSource::new(source, InMemoryCache::new(), cache), session)
        .run()
        .await
}

/// Installs the file logger and returns the log path.
fn init_logging(cli: &Cli) -> Result<PathBuf, CliError> {
    let path = match &cli.log_file {
        Some(path) => path.clone(),
        None => {
            let path = paths::log_file().ok_or(CliError::NoLogDir)?;
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir).map_err(|source| CliError::LogFile {
                    path: dir.to_path_buf(),
                    source,
                })?;
                paths::rotate_logs(dir);
            }
            path
        }
    };

    let file = File::create(&path).map_err(|source| CliError::LogFile {
        path: path.clone(),
        source,
    })?;
    WriteLogger::init(cli.log_level, Config::default(), file)?;
    Ok(path)
}

fn demo_source(items: u64) -> InMemorySource<Artwork> {
    const ORIGINS: [&str; 4] = ["France", "Japan", "United States", "Netherlands"];

    let artworks = (1..=items)
        .map(|id| {
            let mut artwork = Artwork::new(id, format!("Study No. {id}"));
            let year = 1800 + (id % 200) as i64;
            artwork.place_of_origin = Some(ORIGINS[(id % 4) as usize].to_string());
            artwork.artist_display = Some(format!("Artist {}", id % 37));
            artwork.date_start = Some(year);
            artwork.date_end = Some(year + (id % 3) as i64);
            artwork
        })
        .collect();
    InMemorySource::new(artworks)
}
