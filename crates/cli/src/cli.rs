use clap::Parser;

/// Fetch web pages and search the web from the terminal.
#[derive(Parser, Debug)]
#[command(name = "go2web", version, about, long_about = None)]
pub struct Cli {
    /// Make an HTTP request to URL and print the response as text
    #[arg(short, long, value_name = "URL", conflicts_with_all = ["search", "purge_cache", "clear_cache"])]
    pub url: Option<String>,

    /// Search the web for TERMS and print the top results
    #[arg(short, long, value_name = "TERMS", num_args = 1.., conflicts_with_all = ["purge_cache", "clear_cache"])]
    pub search: Option<Vec<String>>,

    /// Ignore cached responses (fresh responses are still stored)
    #[arg(long)]
    pub no_cache: bool,

    /// Delete expired cache entries and exit
    #[arg(long, conflicts_with = "clear_cache")]
    pub purge_cache: bool,

    /// Delete every cache entry and exit
    #[arg(long)]
    pub clear_cache: bool,

    /// Print the status line, headers and raw body instead of cleaned text
    #[arg(long)]
    pub raw: bool,

    /// Log requests, redirects and cache activity to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// What a single invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode<'a> {
    Fetch(&'a str),
    Search(&'a [String]),
    PurgeCache,
    ClearCache,
}

impl Cli {
    /// Selected mode, or `None` when no action flag was given.
    pub fn mode(&self) -> Option<Mode<'_>> {
        if let Some(url) = &self.url {
            Some(Mode::Fetch(url))
        } else if let Some(terms) = &self.search {
            Some(Mode::Search(terms))
        } else if self.purge_cache {
            Some(Mode::PurgeCache)
        } else if self.clear_cache {
            Some(Mode::ClearCache)
        } else {
            None
        }
    }
}
