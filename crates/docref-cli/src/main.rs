//! Docref CLI - crawl documentation sites into token-budgeted references

use clap::{Parser, Subcommand, ValueEnum};
use docref::{
    infer_library_name, CacheStore, CrawlConfig, CrawlOutcome, Crawler, DomExtractor,
    HttpTransport, JsonCache, MarkdownNormalizer, MemoryCache,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Output format for the crawl subcommand
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// One markdown document assembled from all pages
    #[default]
    Md,
    /// Pages and token report as JSON
    Json,
}

/// Docref - token-budgeted documentation crawler
#[derive(Parser, Debug)]
#[command(name = "docref")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl documentation starting from one or more seed URLs
    Crawl {
        /// Seed URLs; the first one anchors the crawl scope
        #[arg(required = true)]
        urls: Vec<String>,

        /// Library name (inferred from the first URL when omitted)
        #[arg(long)]
        library: Option<String>,

        /// Maximum number of pages to visit
        #[arg(long, default_value_t = 10)]
        max_pages: usize,

        /// Pages fetched in parallel
        #[arg(long, default_value_t = 3)]
        concurrency: usize,

        /// Per-page token ceiling
        #[arg(long, default_value_t = 50_000)]
        max_tokens_per_page: usize,

        /// Global token ceiling
        #[arg(long, default_value_t = 200_000)]
        max_total_tokens: usize,

        /// Do not follow links found on crawled pages
        #[arg(long)]
        no_follow_links: bool,

        /// Ignore cached pages for this run
        #[arg(long)]
        skip_cache: bool,

        /// Crawl every language and version variant
        #[arg(long)]
        all_variants: bool,

        /// Cache file path (in-memory cache when omitted)
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Output format
        #[arg(long, short, default_value = "md")]
        output: OutputFormat,

        /// Custom User-Agent
        #[arg(long)]
        user_agent: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Crawl {
            urls,
            library,
            max_pages,
            concurrency,
            max_tokens_per_page,
            max_total_tokens,
            no_follow_links,
            skip_cache,
            all_variants,
            cache,
            output,
            user_agent,
        } => {
            let library_name = library.unwrap_or_else(|| {
                Url::parse(&urls[0])
                    .map(|u| infer_library_name(&u))
                    .unwrap_or_default()
            });

            let config = CrawlConfig {
                library_name: library_name.clone(),
                max_pages,
                concurrency,
                max_tokens_per_page,
                max_total_tokens,
                crawl_links: !no_follow_links,
                skip_cache,
                single_variant: !all_variants,
            };

            let mut transport = HttpTransport::builder();
            if let Some(ua) = user_agent {
                transport = transport.user_agent(ua);
            }
            let transport = transport.build().unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(1);
            });

            let cache: Arc<dyn CacheStore> = match cache {
                Some(path) => Arc::new(JsonCache::open(path)),
                None => Arc::new(MemoryCache::new()),
            };

            let crawler = Crawler::new(
                config,
                Arc::new(transport),
                Arc::new(MarkdownNormalizer::new()),
                Arc::new(DomExtractor::new()),
                cache,
            );

            match crawler.run(&urls).await {
                Ok(outcome) => match output {
                    OutputFormat::Md => print_markdown(&library_name, &outcome),
                    OutputFormat::Json => print_json(&outcome),
                },
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}

/// Assemble all pages into one markdown reference document
fn print_markdown(library_name: &str, outcome: &CrawlOutcome) {
    let mut doc = String::new();
    doc.push_str(&format!("# {library_name} documentation reference\n"));
    for page in &outcome.pages {
        doc.push_str(&format!(
            "\n---\n\n## {}\n\nSource: {}\n\n{}\n",
            page.title,
            page.url,
            page.content()
        ));
    }
    doc.push_str(&format!(
        "\n---\n\nPages: {} | Tokens: {} | Average: {}\n",
        outcome.report.pages_processed,
        outcome.report.total_tokens,
        outcome.report.average_tokens_per_page,
    ));
    write_safe(&doc);
}

fn print_json(outcome: &CrawlOutcome) {
    let value = serde_json::json!({
        "pages": outcome.pages,
        "report": outcome.report,
    });
    match serde_json::to_string_pretty(&value) {
        Ok(json) => write_safe(&json),
        Err(e) => {
            eprintln!("Error serializing output: {e}");
            std::process::exit(1);
        }
    }
}

/// Write to stdout, ignoring broken pipes
fn write_safe(s: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{s}");
}
