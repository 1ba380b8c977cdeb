//! # causerie
//!
//! Headless terminal front end for the Causerie sync core.
//!
//! Prints the reconciled conversation as it changes and sends every line
//! typed on stdin.  Commands:
//! - `/older` loads the page before the oldest loaded message
//! - `/all` reloads the whole history
//! - `/who <query>` lists mention candidates
//! - `/quit` exits (as does Ctrl+C)

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};

use causerie_client::{logging, ClientConfig, ClientError, PageOutcome, Session, SyncState};
use causerie_net::HttpGateway;
use causerie_shared::constants::APP_NAME;
use causerie_shared::types::Message;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    logging::init();
    info!("Starting {} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ClientConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Bootstrap the session (starts polling on success)
    // -----------------------------------------------------------------------
    let gateway = Arc::new(HttpGateway::new(&config.api_base_url, config.request_timeout)?);
    let session = Session::new(gateway, &config)?;
    session.initialize().await?;

    // -----------------------------------------------------------------------
    // 4. Render state changes in the background
    // -----------------------------------------------------------------------
    let printer = tokio::spawn(print_updates(session.subscribe()));

    // -----------------------------------------------------------------------
    // 5. Read commands / messages until EOF, /quit or Ctrl+C
    // -----------------------------------------------------------------------
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !handle_line(&session, line.as_str()).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = &mut shutdown => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    session.dispose();
    printer.abort();
    Ok(())
}

/// Handle one input line.  Returns `false` when the user asked to quit.
async fn handle_line(session: &Session, line: &str) -> bool {
    match line.trim() {
        "/quit" => return false,
        "/older" => match session.fetch_older_than_oldest().await {
            Ok(PageOutcome::Loaded { received, inserted }) => {
                println!("-- loaded {received} older messages ({inserted} new)");
            }
            Ok(PageOutcome::Exhausted) => println!("-- beginning of the conversation"),
            Ok(PageOutcome::Skipped) => println!("-- nothing to load"),
            Err(e) => println!("-- could not load older messages: {e}"),
        },
        "/all" => match session.reload_all_messages().await {
            Ok(inserted) => println!("-- history reloaded ({inserted} new)"),
            Err(e) => println!("-- could not reload history: {e}"),
        },
        cmd if cmd.starts_with("/who") => {
            let draft = format!("@{}", cmd.trim_start_matches("/who").trim());
            let state = session.state();
            let names: Vec<&str> = state
                .mention_suggestions(&draft)
                .iter()
                .map(|p| p.name.as_str())
                .collect();
            println!("-- {}", names.join(", "));
        }
        _ => match session.send_message(line).await {
            Ok(()) | Err(ClientError::EmptyMessage) => {}
            Err(e) => {
                warn!(error = %e, "Send failed");
                println!("-- not sent: {e}");
                session.clear_error();
            }
        },
    }
    true
}

/// Print every message the first time it appears and again whenever its
/// `updated_at` moves.
async fn print_updates(mut rx: watch::Receiver<SyncState>) {
    let mut seen: HashMap<String, i64> = HashMap::new();

    loop {
        {
            let state = rx.borrow_and_update();
            for message in state.messages.messages() {
                let previous = seen.insert(message.uuid.clone(), message.updated_at);
                if previous == Some(message.updated_at) {
                    continue;
                }
                let author = state.participants.display_name(&message.author_uuid);
                println!("{}", render(message, author));
            }
        }

        if rx.changed().await.is_err() {
            return;
        }
    }
}

fn render(message: &Message, author: &str) -> String {
    let time = DateTime::<Utc>::from_timestamp_millis(message.sent_at)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    let mut line = format!("[{time}] {author}: {}", message.text);

    if let Some(reply) = &message.reply_to_message {
        line = format!("{line}  (re: {})", reply.text);
    }
    for image in message.image_attachments() {
        line = format!("{line}  [image {}]", image.url);
    }
    let reactions: Vec<String> = message
        .reaction_summary()
        .into_iter()
        .map(|(value, count)| format!("{value}×{count}"))
        .collect();
    if !reactions.is_empty() {
        line = format!("{line}  {}", reactions.join(" "));
    }
    if message.is_edited() {
        line.push_str(" (edited)");
    }
    line
}
