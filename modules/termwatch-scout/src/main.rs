use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reddit_client::RedditClient;
use termwatch_common::Config;
use termwatch_scout::reddit_source::RedditSource;
use termwatch_scout::report::ReportWriter;
use termwatch_scout::run_log::RunLog;
use termwatch_scout::scanner::SourceScanner;
use termwatch_scout::scheduler::{PollConfig, Poller};
use termwatch_scout::splitter::WordSplitter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("termwatch_scout=info".parse()?)
                .add_directive("reddit_client=info".parse()?),
        )
        .init();

    info!("Termwatch scout starting...");

    // Load config
    let config = Config::load();
    config.log_redacted();

    let client = RedditClient::new(
        config.client_id.clone(),
        config.client_secret.clone(),
        config.user_agent.clone(),
    );
    let scanner = SourceScanner::new(
        Arc::new(RedditSource::new(client)),
        Arc::new(WordSplitter),
    );
    let writer = ReportWriter::new(config.output_path.clone());
    let run_log = RunLog::new(uuid::Uuid::new_v4().to_string());

    let poller = Poller::new(PollConfig::from(&config), scanner, writer).with_run_log(run_log);
    let stats = poller.run().await?;
    info!("Poll run complete. {stats}");

    Ok(())
}
