use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use futures::{StreamExt, pin_mut};
use trawl_common::observability::{LogConfig, init_logging};
use trawl_config::{TlsMode, TrawlConfig, TrawlConfigLoader, default_config_path};
use trawl_search::{ResultPage, TlsPolicy, TrawlingApi};

use cli::{Cli, Command};
mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins over file, CLI wins over both)
    let cfg = load_config(&cli)?;

    let log_path = init_logging(LogConfig {
        app_name: "trawl",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.stderr || cli.verbose,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;
    tracing::debug!(log = %log_path.display(), "logging initialised");

    let tls = if cli.insecure || cfg.tls == TlsMode::AcceptAny {
        TlsPolicy::AcceptAny
    } else {
        TlsPolicy::VerifyStrict
    };
    let mut api = TrawlingApi::with_tls_policy(tls)?;
    if let Some(endpoint) = &cfg.endpoint {
        api = api.with_endpoint(endpoint.clone());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Command::Search(args) => {
            let token = cli.token.as_deref().unwrap_or(&cfg.auth_token);
            if token.is_empty() {
                tracing::warn!("no API token configured; the service will likely reject the query");
            }
            let params = args.to_params(token);
            let max_pages = args.pages.or(cfg.max_pages).unwrap_or(1);

            let pages = api.pages(&params, Some(max_pages));
            pin_mut!(pages);
            let mut fetched = 0usize;
            let mut last_next = String::new();
            while let Some(page) = pages.next().await {
                let page = page.context("search request failed")?;
                fetched += 1;
                write_page(&mut out, &page)?;
                last_next = page.next;
            }
            tracing::info!(pages = fetched, "search finished");
            if !last_next.is_empty() {
                // Page cap reached with more results left; leave the cursor for `trawl next`.
                tracing::info!(next = %last_next, "more results available");
            }
        }
        Command::Next { url } => {
            let page = api.fetch(url).await.context("cursor request failed")?;
            write_page(&mut out, &page)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn load_config(cli: &Cli) -> Result<TrawlConfig> {
    let loader = match (&cli.config, default_config_path()) {
        (Some(path), _) => TrawlConfigLoader::new().with_file(path),
        (None, Some(default)) => TrawlConfigLoader::new().with_optional_file(default),
        (None, None) => TrawlConfigLoader::new(),
    };
    loader.load().context("failed to load configuration")
}

fn write_page(out: &mut impl Write, page: &ResultPage) -> Result<()> {
    tracing::info!(
        posts = page.data.len(),
        request_left = page.request_left,
        total_results = page.total_results,
        rest_results = page.rest_results,
        "page received"
    );
    for post in &page.data {
        serde_json::to_writer(&mut *out, post)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
