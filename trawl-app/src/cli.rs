use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use trawl_search::SearchParameters;

/// Search the Trawling Web social archive and print posts as JSON lines.
#[derive(Debug, Parser)]
#[command(name = "trawl", version)]
pub struct Cli {
    /// Config file (defaults to `<config dir>/trawl/trawl.yaml` when present).
    #[arg(long, short = 'c', global = true, env = "TRAWL_CONFIG")]
    pub config: Option<PathBuf>,

    /// API token; overrides `auth_token` from the config file.
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Accept invalid or self-signed TLS certificates.
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Mirror logs to stderr.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a search and follow `next` cursors.
    Search(SearchArgs),
    /// Fetch a single page from a `next` cursor URL.
    Next {
        /// Cursor URL exactly as returned in a page's `next` field.
        url: String,
    },
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Free-text query; omit to filter by timestamps alone.
    #[arg(long, short = 'q')]
    pub query: Option<String>,
    /// Published-after timestamp (epoch milliseconds).
    #[arg(long)]
    pub ts: Option<String>,
    /// Crawled-after timestamp (epoch milliseconds).
    #[arg(long)]
    pub tsi: Option<String>,
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long)]
    pub order: Option<String>,
    /// Maximum pages to fetch (default: `max_pages` from config, else 1).
    #[arg(long, short = 'p')]
    pub pages: Option<usize>,
}

impl SearchArgs {
    pub fn to_params(&self, token: &str) -> SearchParameters {
        SearchParameters {
            token: token.to_string(),
            query: self.query.clone().unwrap_or_default(),
            ts: self.ts.clone().unwrap_or_default(),
            tsi: self.tsi.clone().unwrap_or_default(),
            sort: self.sort.clone().unwrap_or_default(),
            order: self.order.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_with_filters() {
        let cli = Cli::try_parse_from([
            "trawl", "--token", "t0k", "search", "-q", "climate change", "--sort", "date",
            "--order", "desc", "--pages", "3",
        ])
        .unwrap();

        assert_eq!(cli.token.as_deref(), Some("t0k"));
        let Command::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.pages, Some(3));

        let params = args.to_params("t0k");
        assert_eq!(
            params.query_string(),
            "token=t0k&q=climate%20change&sort=date&order=desc"
        );
    }

    #[test]
    fn parses_next_with_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "trawl",
            "next",
            "https://twitter.trawlingweb.com/posts_full/?cursor=x",
            "--insecure",
        ])
        .unwrap();
        assert!(cli.insecure);
        assert!(matches!(cli.command, Command::Next { ref url } if url.ends_with("cursor=x")));
    }

    #[test]
    fn search_without_query_uses_filters_only() {
        let cli = Cli::try_parse_from([
            "trawl", "search", "--tsi", "1700000000000", "--sort", "crawled",
        ])
        .unwrap();
        let Command::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.query, None);
        assert_eq!(
            args.to_params("").query_string(),
            "tsi=1700000000000&sort=crawled"
        );
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
