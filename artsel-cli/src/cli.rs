use std::path::PathBuf;

use clap::Parser;
use simplelog::LevelFilter;

use artsel_lib::DEFAULT_PAGE_SIZE;
use artsel_lib::source::DEFAULT_BASE_URL;

#[derive(Parser, Debug)]
#[command(name = "artsel")]
#[command(about = "Browse the Art Institute of Chicago collection and select artworks across pages")]
pub struct Cli {
    /// API base URL
    #[arg(long, env = "ARTSEL_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Rows per page
    #[arg(long, env = "ARTSEL_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Highest page bulk operations and navigation may reach
    #[arg(long, env = "ARTSEL_PAGE_CEILING")]
    pub page_ceiling: Option<u32>,

    /// Seconds a fetched page is reused by bulk operations (0 disables)
    #[arg(long, env = "ARTSEL_CACHE_TTL_SECS", default_value_t = 120)]
    pub cache_ttl_secs: u64,

    /// Most pages kept in the response cache at once (0 disables)
    #[arg(long, env = "ARTSEL_CACHE_PAGES", default_value_t = 32)]
    pub cache_pages: usize,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Serve a generated in-memory collection of this many artworks instead
    /// of calling the API
    #[arg(long, value_name = "ITEMS")]
    pub demo: Option<u64>,

    /// Log file (defaults to latest.log in the platform cache directory)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["artsel", "--base-url", "http://localhost:1/api"]).unwrap();
        assert_eq!(cli.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(cli.cache_ttl_secs, 120);
        assert_eq!(cli.cache_pages, 32);
        assert!(cli.demo.is_none());
        assert_eq!(cli.log_level, LevelFilter::Info);
    }

    #[test]
    fn test_demo_and_level() {
        let cli = Cli::try_parse_from([
            "artsel",
            "--demo",
            "250",
            "--page-ceiling",
            "5",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.demo, Some(250));
        assert_eq!(cli.page_ceiling, Some(5));
        assert_eq!(cli.log_level, LevelFilter::Debug);
    }
}
