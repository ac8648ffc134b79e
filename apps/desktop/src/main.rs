use std::io::Write as _;

use anyhow::Result;
use clap::Parser;
use client_core::{ChatClient, ChatEvent};
use shared::domain::{SessionView, Speaker};
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::broadcast,
};
use tracing::warn;

mod config;

#[derive(Parser, Debug)]
struct Args {
    /// Chat server base URL; overrides client.toml and environment settings.
    #[arg(long)]
    server_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    let settings = config::load_settings(args.server_url);

    let client = ChatClient::new(&settings.server_url)?;
    let mut events = client.subscribe_events();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "Connected to {}. Sign in to start chatting; /logout and /quit are available.",
        settings.server_url
    );

    loop {
        match client.session_view().await {
            SessionView::LoggedOut => {
                let Some(username) = prompt(&mut lines, "username: ").await? else {
                    break;
                };
                let Some(password) = prompt(&mut lines, "password: ").await? else {
                    break;
                };
                if let Err(err) = client.login(&username, &password).await {
                    println!("sign-in failed: {err}");
                }
            }
            SessionView::LoggedIn => {
                let Some(line) = prompt(&mut lines, "> ").await? else {
                    break;
                };
                match line.trim() {
                    "" => {}
                    "/quit" | "/exit" => break,
                    "/logout" => client.log_out().await,
                    message => {
                        if let Err(err) = client.send(message).await {
                            warn!("send failed: {err}");
                        }
                    }
                }
            }
        }
        render_drained(&mut events);
    }

    Ok(())
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> Result<Option<String>> {
    print!("{label}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?)
}

fn render_drained(events: &mut broadcast::Receiver<ChatEvent>) {
    while let Ok(event) = events.try_recv() {
        render_event(event);
    }
}

fn render_event(event: ChatEvent) {
    match event {
        ChatEvent::TypingStarted => println!("assistant is typing..."),
        ChatEvent::EntryAppended(entry) if entry.speaker == Speaker::Bot => {
            println!("assistant: {}", entry.content);
        }
        ChatEvent::SessionChanged(SessionView::LoggedOut) => {
            println!("(signed out; sign in to continue)");
        }
        _ => {}
    }
}
