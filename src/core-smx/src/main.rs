use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use core_smx::{
    CancellationToken, TraversalOptions, TraversalRequest, TraversalResult, Traverser, get_max_concurrency,
    get_request_timeout, get_run_budget, setup_logging,
};

#[derive(Parser)]
#[command(name = "smx")]
#[command(about = "Lists the URLs a sitemap index publishes within a lastmod date range", long_about = None)]
struct SmxCli {
    /// URL of the sitemap index to start from.
    sitemap_url: String,

    /// First lastmod day to include (YYYY-MM-DD).
    #[arg(short, long)]
    start: String,

    /// Last lastmod day to include (YYYY-MM-DD).
    #[arg(short, long)]
    end: String,

    /// Only keep sitemaps and URLs containing this word, e.g. "post" or "page".
    #[arg(short, long)]
    content_filter: Option<String>,

    /// Only follow nested sitemaps on this host [default: host of SITEMAP_URL]
    #[arg(short, long)]
    domain: Option<String>,

    /// Maximum number of sitemaps fetched at once [env: SMX_MAX_CONCURRENCY, default: 5]
    #[arg(long, value_parser = validate_positive)]
    concurrency: Option<usize>,

    /// Timeout for each sitemap request in seconds [env: SMX_REQUEST_TIMEOUT_SECS, default: 10]
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Stop after this many seconds and print what was found so far [env: SMX_RUN_BUDGET_SECS]
    #[arg(long)]
    budget_secs: Option<u64>,

    /// Do not follow nested sitemap indexes deeper than this.
    #[arg(long)]
    max_depth: Option<usize>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn validate_positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(v) => Ok(v),
        Err(e) => Err(format!("Invalid number: {}", e)),
    }
}

impl SmxCli {
    fn options(&self) -> TraversalOptions {
        let mut builder = TraversalOptions::builder()
            .concurrency(self.concurrency.unwrap_or_else(|| get_max_concurrency(None)))
            .request_timeout(
                self.timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or_else(get_request_timeout),
            )
            .maybe_run_budget(self.budget_secs.map(Duration::from_secs).or_else(get_run_budget));
        if let Some(depth) = self.max_depth {
            builder = builder.max_depth(depth);
        }
        builder.build()
    }

    fn request(&self) -> TraversalRequest {
        TraversalRequest {
            sitemap_url: Some(self.sitemap_url.clone()),
            start_date: Some(self.start.clone()),
            end_date: Some(self.end.clone()),
            content_filter: self.content_filter.clone(),
            domain: self.domain.clone(),
        }
    }
}

#[tokio::main]
async fn main() {
    setup_logging("core_smx=info,smx=info");

    let cli = SmxCli::parse();
    if let Err(e) = run(&cli).await {
        eprintln!("ERROR: {e:#}");
        std::process::exit(1)
    }
}

async fn run(cli: &SmxCli) -> anyhow::Result<()> {
    let validated = cli.request().validate()?;
    let traverser = Traverser::http(cli.options()).context("Cannot set up the HTTP client")?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted: finishing with the sitemaps already resolved");
                cancel.cancel();
            }
        }
    });

    let result = traverser
        .traverse_until(validated.entry.as_str(), &validated.criteria, cancel)
        .await?;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print!("{}", render_text(&result)),
    }
    Ok(())
}

fn render_text(result: &TraversalResult) -> String {
    let mut output = String::new();

    if result.metadata.is_empty() {
        output.push_str("No URLs found for the given criteria.\n");
    }

    for (sitemap, urls) in &result.urls {
        let declared = result.metadata.get(sitemap).copied().unwrap_or_default();
        output.push_str(&format!("Sitemap: {} ({} of {} URLs", sitemap, urls.len(), declared));
        if let Some(lastmod) = result.lastmod.get(sitemap) {
            output.push_str(&format!(", lastmod {}", lastmod));
        }
        output.push_str(")\n");
        for url in urls {
            output.push_str(&format!("  {}\n", url));
        }
    }

    if !result.skipped.is_empty() {
        output.push_str(&format!("\nSkipped {} sitemap(s):\n", result.skipped.len()));
        for skipped in &result.skipped {
            output.push_str(&format!("  {}: {}\n", skipped.url, skipped.reason));
        }
    }

    if !result.complete {
        output.push_str("\nPartial result: the traversal was stopped before every sitemap was visited.\n");
    }
    output
}
