//! Lull - line-driven front end for the request collection engine
//!
//! Architecture:
//! - Input loop - reads commands from stdin and turns them into UI events
//! - App Layer - central state machine processing events
//! - Network Layer (Tokio) - async HTTP execution
//! - Render task - prints every render state to stdout

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use lull::constants::{APP_VERSION, HEADER_VALUE_SEPARATOR, LOG_FILE_NAME};
use lull::messages::ui_events::line_to_ui_event;
use lull::messages::render::ResponseView;
use lull::network::client::create_client;
use lull::{AppActor, Config, RenderState, StateStore, UiEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    config
        .ensure_dirs()
        .with_context(|| format!("creating {}", config.config_dir.display()))?;

    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(&config.log_dir, LOG_FILE_NAME);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    tracing::info!(version = APP_VERSION, state = %config.state_path.display(), "Starting");

    let store = StateStore::load(&config.state_path);

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn app actor
    let app_actor = AppActor::new(store, create_client(config.request_timeout), render_tx);
    let app = tokio::spawn(app_actor.run(ui_rx));

    // Spawn render task
    let renderer = tokio::spawn(async move {
        while let Some(state) = render_rx.recv().await {
            print_state(&state);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line_to_ui_event(&line) {
            Some(UiEvent::Quit) => break,
            Some(event) => {
                if ui_tx.send(event).is_err() {
                    break;
                }
            }
            None => eprintln!("unknown command: {}", line.trim()),
        }
    }
    let _ = ui_tx.send(UiEvent::Quit);

    let saved = app.await.context("app actor panicked")?;
    let _ = renderer.await;
    if let Err(e) = saved {
        tracing::error!(error = %e, "Failed to save state");
        eprintln!("failed to save state: {}", e);
    }

    Ok(())
}

fn print_state(state: &RenderState) {
    println!();
    for row in &state.tree {
        let cursor = if row.selected { ">" } else { " " };
        let marker = if row.active { "*" } else { " " };
        let label = match row.method {
            Some(method) => format!("{:<7} {}", method.as_str(), row.name),
            None => format!("[{}]", row.name),
        };
        println!("{}{} {}{}", cursor, marker, "  ".repeat(row.depth), label);
    }

    if let Some(active) = &state.active {
        println!("-- {}", active.path);
        println!("{} {}", active.method.as_str(), active.url);
        for (key, values) in &active.headers {
            println!("{}: {}", key, values.join(HEADER_VALUE_SEPARATOR));
        }
        if !active.authentication.is_none() {
            println!("auth: {}", active.authentication.type_name());
        }
        if let Some(body) = &active.body {
            println!("[{}]", body.content_type);
            println!("{}", body.payload);
        }
    }

    if state.is_loading {
        println!("... sending");
    }
    if let Some(response) = &state.response {
        print_response(response);
    }
    if let Some(notice) = &state.notice {
        println!("! {}", notice);
    }
    if let Some(error) = &state.error {
        println!("error: {}", error);
    }
}

fn print_response(response: &ResponseView) {
    match &response.status {
        Some(status) => println!("== {} ({})", status, response.elapsed),
        None => println!("== no response ({})", response.elapsed),
    }
    for (key, value) in &response.headers {
        println!("{}: {}", key, value);
    }
    if !response.body.is_empty() {
        println!("{}", response.body);
    }
    if let Some(e) = &response.payload_error {
        println!("body error: {}", e);
    }
}
