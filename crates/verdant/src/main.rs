//! Terminal UI for the plant identification & care chat.

#[macro_use]
extern crate tracing;

mod render;

use std::env;
use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::sleep;
use verdant_core::{App, AppEvent, ConversationClient, Screen};
use verdant_gemini_model::{GeminiConfigBuilder, GeminiProvider};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Ok(api_key) = env::var("GEMINI_API_KEY") else {
        eprintln!("GEMINI_API_KEY environment variable is not set");
        return;
    };
    let mut config = GeminiConfigBuilder::with_api_key(api_key);
    if let Ok(model) = env::var("VERDANT_MODEL") {
        config = config.with_model(model);
    }
    if let Ok(base_url) = env::var("GEMINI_BASE_URL") {
        config = config.with_base_url(base_url);
    }
    let provider = GeminiProvider::new(config.build());

    let (mut app, mut event_rx) = App::new(ConversationClient::new(provider));

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    println!("{}\n", render::banner());

    loop {
        let keep_going = match app.screen() {
            Screen::Welcome => {
                welcome_screen(&mut app, &mut event_rx, &progress_style).await
            }
            Screen::Chatting => {
                chat_screen(&mut app, &mut event_rx, &progress_style).await
            }
        };
        if !keep_going {
            break;
        }
    }

    println!("Goodbye!");
}

/// One round of the welcome screen. Returns `false` to quit.
async fn welcome_screen(
    app: &mut App,
    event_rx: &mut UnboundedReceiver<AppEvent>,
    progress_style: &ProgressStyle,
) -> bool {
    if let Some(error) = app.error() {
        println!("{}", error.bright_red());
    }
    match app.selected_image() {
        Some(path) => println!(
            "Selected photo: {} (type {} to continue)",
            path.display().bright_white(),
            "identify".bright_green()
        ),
        None => println!(
            "Upload a photo of your plant to get started! Enter its path, \
             or {} to quit.",
            "exit".bright_white()
        ),
    }

    print!("verdant> ");
    std::io::stdout().flush().ok();
    let Some(line) = read_line().await else {
        return false;
    };
    let input = line.trim();

    match input {
        "" => {}
        "exit" | "quit" => return false,
        "identify" => {
            app.identify();
            wait_for_idle(
                app,
                event_rx,
                progress_style,
                "🔍 Identifying your plant...",
            )
            .await;
        }
        path => app.select_image(PathBuf::from(path)),
    }
    println!();
    true
}

/// The chat screen loop. Returns `false` to quit.
async fn chat_screen(
    app: &mut App,
    event_rx: &mut UnboundedReceiver<AppEvent>,
    progress_style: &ProgressStyle,
) -> bool {
    // On entry the identification reply is the sole transcript entry.
    for turn in app.transcript() {
        println!("{}\n", render::render_turn(turn));
    }
    println!(
        "Ask a follow-up question, or {} to start over with another photo.",
        "/new".bright_white()
    );

    loop {
        print!("> ");
        std::io::stdout().flush().ok();
        let Some(line) = read_line().await else {
            return false;
        };
        let input = line.trim();

        match input {
            "" => continue,
            "exit" | "quit" => return false,
            "/new" => {
                app.start_over();
                return true;
            }
            _ => {}
        }

        app.send_followup(input);
        if app.is_composing() {
            wait_for_idle(app, event_rx, progress_style, "🤔 Thinking...")
                .await;
        }

        if let Some(error) = app.error() {
            println!("{}", error.bright_red());
        } else if let Some(turn) = app.transcript().last() {
            println!("\n{}\n", render::render_turn(turn));
        }
    }
}

/// Pumps completion events with a spinner until the controller goes
/// idle.
async fn wait_for_idle(
    app: &mut App,
    event_rx: &mut UnboundedReceiver<AppEvent>,
    progress_style: &ProgressStyle,
    message: &str,
) {
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(progress_style.clone());
    progress_bar.set_message(message.to_owned());

    while app.is_busy() {
        progress_bar.inc(1);

        let sleep = sleep(Duration::from_millis(100));
        select! {
            event = event_rx.recv() => {
                let Some(event) = event else {
                    break;
                };
                app.handle_event(event);
            },
            _ = sleep => {}
        }
    }

    progress_bar.finish_and_clear();
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
