//! Soli - terminal front end for the chat widget controller
//!
//! Plays the presentation layer: prints each new entry as it lands and turns
//! input lines into controller calls.

use soli_chat::{
    ConversationController, ConversationEntry, GatewayConfig, HttpGateway, LoggingGateway,
    Snapshot,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Open,
    Close,
    Toggle,
    Reply { entry: usize, choice: usize },
    Quit,
    Say(String),
}

fn parse_command(line: &str) -> Result<Command, String> {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(Command::Say(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    match parts.next() {
        Some("open") => Ok(Command::Open),
        Some("close") => Ok(Command::Close),
        Some("toggle") => Ok(Command::Toggle),
        Some("quit") => Ok(Command::Quit),
        Some("reply") => {
            let entry = parts.next().and_then(|p| p.parse().ok());
            let choice = parts.next().and_then(|p| p.parse().ok());
            match (entry, choice) {
                (Some(entry), Some(choice)) if choice > 0 => Ok(Command::Reply { entry, choice }),
                _ => Err("usage: /reply <entry> <n>".to_string()),
            }
        }
        _ => Err(format!("unknown command: {trimmed}")),
    }
}

fn print_entry(index: usize, entry: &ConversationEntry) {
    match entry {
        ConversationEntry::User { text } => println!("[{index}] you: {text}"),
        ConversationEntry::Bot(bot) => {
            println!("[{index}] soli: {}", bot.summary_text);
            for (n, reply) in bot.quick_replies.iter().enumerate() {
                println!("      {}) {reply}", n + 1);
            }
        }
    }
}

async fn render(mut rx: watch::Receiver<Snapshot>) {
    let mut shown = 0;
    let mut was_pending = false;

    loop {
        let snapshot = rx.borrow_and_update().clone();

        // History was replaced by the greeting
        if snapshot.entries.len() < shown {
            shown = 0;
        }
        for (index, entry) in snapshot.entries.iter().enumerate().skip(shown) {
            print_entry(index, entry);
        }
        shown = snapshot.entries.len();

        if snapshot.is_pending && !was_pending {
            println!("      …");
        }
        was_pending = snapshot.is_pending;

        if rx.changed().await.is_err() {
            break;
        }
    }
}

fn handle_command(controller: &ConversationController, command: Command) -> Result<(), String> {
    let result = match command {
        Command::Open => controller.open(),
        Command::Close => controller.close(),
        Command::Toggle => controller.toggle(),
        Command::Say(text) => {
            if controller.snapshot().is_pending {
                return Err("still waiting for the last answer".to_string());
            }
            controller.send_user_message(text)
        }
        Command::Reply { entry, choice } => {
            let snapshot = controller.snapshot();
            let text = snapshot
                .entries
                .get(entry)
                .and_then(|e| e.quick_replies().get(choice - 1))
                .cloned()
                .ok_or_else(|| format!("no quick reply {choice} on entry {entry}"))?;
            controller.select_quick_reply(text, entry)
        }
        Command::Quit => return Ok(()),
    };
    result.map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they don't interleave with the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soli_chat=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = GatewayConfig::from_env();
    tracing::info!(
        endpoint = %config.endpoint,
        timeout_secs = config.timeout.as_secs(),
        "Using chat backend"
    );

    let gateway = LoggingGateway::new(HttpGateway::new(&config)?);
    let controller = ConversationController::spawn(gateway);
    let renderer = tokio::spawn(render(controller.subscribe()));

    controller.open()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => {
                if let Err(message) = handle_command(&controller, command) {
                    println!("! {message}");
                }
            }
            Err(message) => println!("! {message}"),
        }
    }

    controller.shutdown();
    renderer.abort();
    Ok(())
}
