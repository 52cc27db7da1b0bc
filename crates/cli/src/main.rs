//! go2web command line entry point.
//!
//! Page text and result lists go to stdout; logs, prompts and errors go to
//! stderr.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use dialoguer::Input;
use go2web_client::{FetchClient, FetchConfig, SearchExtractor, page_title, search};
use go2web_core::{AppConfig, CacheStore};
use tracing_subscriber::EnvFilter;

mod cli;
mod output;

use cli::{Cli, Mode};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            for cause in e.chain().skip(1) {
                eprintln!("  caused by: {cause}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn run(cli: &Cli) -> Result<()> {
    let Some(mode) = cli.mode() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = AppConfig::load().context("failed to load configuration")?;
    let cache = config.cache_enabled.then(|| CacheStore::from_config(&config));

    match mode {
        Mode::Fetch(url) => {
            let client = build_client(&config, cache, cli.no_cache)?;
            fetch_and_print(&client, url, cli.raw)
        }
        Mode::Search(terms) => {
            let client = build_client(&config, cache, cli.no_cache)?;
            search_and_prompt(&client, &config, terms, cli.raw)
        }
        Mode::PurgeCache => {
            let store = CacheStore::from_config(&config);
            let removed = store.purge_stale().context("failed to purge cache")?;
            println!("Removed {removed} stale cache entries from {}", store.root().display());
            Ok(())
        }
        Mode::ClearCache => {
            let store = CacheStore::from_config(&config);
            let removed = store.clear().context("failed to clear cache")?;
            println!("Removed {removed} cache entries from {}", store.root().display());
            Ok(())
        }
    }
}

fn build_client(config: &AppConfig, cache: Option<CacheStore>, no_cache: bool) -> Result<FetchClient> {
    let fetch_config = FetchConfig { bypass_cache: no_cache, ..FetchConfig::from(config) };
    FetchClient::new(fetch_config, cache).context("failed to initialize HTTP client")
}

fn fetch_and_print(client: &FetchClient, url: &str, raw: bool) -> Result<()> {
    let page = client.fetch(url).with_context(|| format!("failed to fetch `{url}`"))?;

    tracing::info!(
        url = %page.final_url,
        status = page.response.status().map(|s| s.code).unwrap_or_default(),
        title = %page_title(&page.response.body).unwrap_or_default(),
        from_cache = page.from_cache,
        "fetched page"
    );

    if let Some(notice) = output::cache_notice(&page) {
        eprintln!("{notice}");
    }

    let mut stdout = io::stdout().lock();
    stdout.write_all(&output::render_page(&page, raw))?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;
    Ok(())
}

fn search_and_prompt(client: &FetchClient, config: &AppConfig, terms: &[String], raw: bool) -> Result<()> {
    let extractor = SearchExtractor::new(config.search_domain.as_str())?;
    let mut results = search(client, &extractor, &config.search_url, terms).context("search failed")?;
    results.truncate(config.max_results);

    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    print!("{}", output::render_results(&results));

    let answer: String = Input::new()
        .with_prompt("Open result number (Enter to quit)")
        .allow_empty(true)
        .interact_text()
        .context("failed to read selection")?;

    match output::select(&results, &answer)? {
        Some(choice) => fetch_and_print(client, &choice.url, raw),
        None => Ok(()),
    }
}
