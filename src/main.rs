//! Pinterest Downloader - CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use pinterest_downloader::{
    api::{ApiClient, UrlResolver},
    cancel::CancelToken,
    cli::Args,
    config::{validate_config, Config},
    download::{Downloader, HttpMediaFetcher},
    error::{exit_codes, Error, Result},
    fs::ProfilePaths,
    model::{user_from_raw, ProfileGraph},
    output::{
        create_spinner, print_banner, print_error, print_info, print_report,
        print_scrape_summary, print_success, print_warning,
    },
    persist,
    scrape::BoardAggregator,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_) | Error::ConfigValidation { .. } | Error::MissingConfig(_) => {
                    ExitCode::from(exit_codes::CONFIG_ERROR as u8)
                }
                Error::UserNotFound(_)
                | Error::Api(_)
                | Error::RateLimited(_)
                | Error::Payload(_)
                | Error::UnresolvedTarget(_) => ExitCode::from(exit_codes::API_ERROR as u8),
                Error::Download(_) | Error::Remux(_) | Error::RemuxNotFound => {
                    ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8)
                }
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    // Print banner
    print_banner();

    // Load configuration
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        Config::default()
    };

    // Merge CLI arguments into config and validate
    args.merge_into_config(&mut config);
    validate_config(&config)?;

    // Arm the interrupt token: crawls hand back partial results, the board
    // loop stops dispatching, in-flight download batches drain.
    let cancel = CancelToken::new();
    {
        let token = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                print_warning("Interrupt received, finishing the current step...");
                token.cancel();
            }
        });
    }

    let client = Arc::new(ApiClient::new(&config.network)?);

    // Download-only re-run from a previously saved graph.
    if let Some(json_path) = &args.from_json {
        let graph = persist::load_graph(json_path)?;
        print_info(&format!(
            "Loaded graph for {} from {}",
            graph.user.username,
            json_path.display()
        ));
        let paths = ProfilePaths::new(&config.download_directory(), &graph.user.username);
        return run_downloads(client, &config, paths, &graph, cancel).await;
    }

    let target = args
        .target
        .as_deref()
        .ok_or_else(|| Error::Config("a profile URL or username is required".to_string()))?;

    // Resolve the operator input to a username
    let resolver = UrlResolver::new();
    let resolved = resolver.resolve(target, &client).await?;
    if let Some(board) = &resolved.board {
        print_info(&format!(
            "Board link '{}' detected; scraping the whole profile",
            board
        ));
    }

    // Fetch the profile root
    let spinner = create_spinner(&format!("Fetching user {}...", resolved.username));
    let raw_user = client.get_user(&resolved.username).await;
    spinner.finish_and_clear();
    let user = user_from_raw(raw_user?)?;

    print_info(&format!(
        "Found {} ({} pins, {} boards)",
        user.username, user.pin_count, user.board_count
    ));

    // Crawl the content graph
    let aggregator = BoardAggregator::new(client.as_ref(), cancel.clone())
        .page_delay(config.page_delay())
        .max_page_retries(config.options.page_retries);
    let result = aggregator.aggregate(&user).await?;

    // Persist the normalized graph before any download
    let graph = ProfileGraph::new(user, result.created, result.boards);
    let paths = ProfilePaths::new(&config.download_directory(), &graph.user.username);
    persist::save_graph(&graph, &paths.graph_file())?;
    print_success(&format!(
        "Profile graph saved to {}",
        paths.graph_file().display()
    ));
    print_scrape_summary(&graph);

    if config.options.scrape_only {
        return Ok(());
    }
    if cancel.is_cancelled() {
        print_warning("Interrupted; skipping downloads");
        return Ok(());
    }

    run_downloads(client, &config, paths, &graph, cancel).await
}

async fn run_downloads(
    client: Arc<ApiClient>,
    config: &Config,
    paths: ProfilePaths,
    graph: &ProfileGraph,
    cancel: CancelToken,
) -> Result<()> {
    let fetcher = HttpMediaFetcher::new(client);
    let downloader = Downloader::new(fetcher, paths, cancel)
        .max_concurrent(config.options.max_concurrent_downloads)
        .phase_pause(config.phase_pause());

    let report = downloader.download(graph).await?;
    print_report(&report);

    Ok(())
}
