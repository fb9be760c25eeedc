use clap::Parser;
use std::process::ExitCode;
use yield_catalog::{Catalog, LogProgress, RunResult, RunStatus, ScraperConfig, SourceKind};

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let catalog = match build_catalog(&args) {
        Ok(catalog) => catalog,
        Err(e) => {
            ::log::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    ::log::info!("Starting scrape of {}", catalog.config().listing_url);
    if catalog.config().source == SourceKind::Browser {
        println!("Note: browser mode requires a WebDriver server (e.g., ChromeDriver).");
        println!(
            "Set WEBDRIVER_URL environment variable if not using {}",
            catalog.config().webdriver_url
        );
    }

    // Ctrl-C stops dispatching new work; collected records are still written
    let cancel = catalog.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ::log::warn!("Interrupt received, finishing in-flight work");
            cancel.cancel();
        }
    });

    let start_time = std::time::Instant::now();

    if args.links_only {
        return match catalog.collect_links(&LogProgress).await {
            Ok(link_set) => {
                for link in &link_set.links {
                    println!("URL: {}", link);
                }
                for error in &link_set.errors {
                    eprintln!("{}", error);
                }
                ::log::info!(
                    "Found {} product links in {:.2} seconds",
                    link_set.links.len(),
                    start_time.elapsed().as_secs_f64()
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                ::log::error!("Failed to collect links: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    match catalog.run(&LogProgress).await {
        Ok(result) => {
            print_summary(&result);
            ::log::info!(
                "Scrape finished in {:.2} seconds",
                start_time.elapsed().as_secs_f64()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            ::log::error!("Scrape failed: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Config file first, then command-line overrides
fn build_catalog(args: &Args) -> Result<Catalog, yield_catalog::ConfigError> {
    let config = match &args.config {
        Some(path) => ScraperConfig::from_file(path)?,
        None => ScraperConfig::default(),
    };

    let mut catalog = Catalog::new(config);
    if let Some(url) = &args.listing_url {
        catalog = catalog.with_listing_url(url);
    }
    if let Some(source) = args.source {
        catalog = catalog.with_source(source.into());
    }
    if let Some(concurrency) = args.concurrency {
        catalog = catalog.with_max_concurrency(concurrency);
    }
    if let Some(delay_ms) = args.delay_ms {
        catalog = catalog.with_request_delay_ms(delay_ms);
    }
    if let Some(dir) = &args.output_dir {
        catalog = catalog.with_output_dir(dir);
    }
    if let Some(format) = args.format {
        catalog = catalog.with_export_format(format.into());
    }
    if let Some(url) = &args.webdriver_url {
        catalog = catalog.with_webdriver_url(url);
    }

    catalog.config().validate()?;
    Ok(catalog)
}

fn print_summary(result: &RunResult) {
    println!("{}", result.summary());

    if result.status != RunStatus::NoProductsFound {
        println!(
            "Listing pages read: {}, product links: {}",
            result.pages_visited, result.links_found
        );
    }
    if let Some(path) = &result.output {
        println!("Saved to {}", path.display());
    }
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!("  {}", error);
        }
    }
}
