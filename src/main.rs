use std::future;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::{info, warn};

use translation_review::console::{self, Reply};
use translation_review::{Config, HttpTranslationApi, ReviewSession};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_review=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting translation review console");

    let config = Config::from_env()?;
    let api = HttpTranslationApi::new(&config).context("Failed to build HTTP client")?;
    let session = ReviewSession::new(api, &config);

    info!("Loading translations from {}", config.api_url);
    if !session.load().await {
        warn!("Initial load failed; use 'notes' and 'act N' to retry");
    }
    println!("{}", console::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_shown = None;
    loop {
        let deadline = session.next_deadline();
        let timer = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = timer => {
                session.tick(Instant::now()).await;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match console::parse(&line) {
                    Ok(command) => match console::execute(&session, command).await {
                        Reply::Output(out) => println!("{}", out),
                        Reply::Quit => break,
                    },
                    Err(e) => println!("{}", e),
                }
                for note in session.notifications() {
                    if Some(note.id) > last_shown {
                        println!("  {}", console::render_notification(&note));
                        last_shown = Some(note.id);
                    }
                }
            }
        }
    }

    session.teardown();
    info!("Review console closed");
    Ok(())
}
