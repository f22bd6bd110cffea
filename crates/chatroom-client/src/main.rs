//! chatroom-client: terminal chat client.
//!
//! # Usage
//!
//! ```text
//! chatroom-client --username <NAME> [--email <EMAIL>] [--server <URL>]
//! ```
//!
//! Type a line and press Enter to send it.  `/quit` or end of input leaves.
//! Received messages are printed to stdout; logs go to stderr.

use anyhow::Context;
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use chatroom_client::{
    compose, decode_frame, parse_input, render, validate_server_url, Identity, Input,
};
use chatroom_core::encode_message;

/// Terminal client for the chatroom broadcast hub.
#[derive(Debug, Parser)]
#[command(name = "chatroom-client", about = "Join a chatroom from the terminal", version)]
struct Cli {
    /// WebSocket URL of the chatroom server.
    #[arg(long, env = "CHATROOM_SERVER", default_value = "ws://127.0.0.1:8000/ws")]
    server: String,

    /// Email address sent with every message.
    #[arg(long, env = "CHATROOM_EMAIL", default_value = "")]
    email: String,

    /// Name shown next to your messages.
    #[arg(long, env = "CHATROOM_USERNAME")]
    username: String,
}

impl Cli {
    fn into_identity(self) -> anyhow::Result<(String, Identity)> {
        validate_server_url(&self.server)?;
        let identity = Identity::new(self.email, self.username)?;
        Ok((self.server, identity))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (server, identity) = Cli::parse().into_identity()?;

    let (ws, _) = connect_async(server.as_str())
        .await
        .with_context(|| format!("failed to connect to {server}"))?;
    info!("connected to {server} as {}", identity.username);

    let (mut outgoing, mut incoming) = ws.split();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    debug!("stdin closed");
                    break;
                };
                match parse_input(&line) {
                    Input::Skip => {}
                    Input::Quit => break,
                    Input::Send(body) => {
                        let text = encode_message(&compose(&identity, body))?;
                        outgoing
                            .send(Message::Text(text))
                            .await
                            .context("failed to send message")?;
                    }
                }
            }
            frame = incoming.next() => match frame {
                None | Some(Ok(Message::Close(_))) => {
                    info!("server closed the connection");
                    break;
                }
                Some(Err(e)) => return Err(e).context("connection error"),
                Some(Ok(frame)) => match decode_frame(&frame) {
                    Some(Ok(msg)) => println!("{}", render(&msg)),
                    Some(Err(e)) => {
                        eprintln!("skipping undecodable message: {e}");
                        warn!("undecodable frame from server: {e}");
                    }
                    None => {}
                },
            },
        }
    }

    if let Err(e) = outgoing.close().await {
        debug!("close after leaving failed: {e}");
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["chatroom-client", "--username", "alice"]);
        assert_eq!(cli.server, "ws://127.0.0.1:8000/ws");
        assert_eq!(cli.email, "");
        assert_eq!(cli.username, "alice");
    }

    #[test]
    fn test_cli_into_identity() {
        let cli = Cli::parse_from([
            "chatroom-client",
            "--server",
            "ws://chat.example:9000/ws",
            "--email",
            "a@x.com",
            "--username",
            "alice",
        ]);

        let (server, identity) = cli.into_identity().unwrap();

        assert_eq!(server, "ws://chat.example:9000/ws");
        assert_eq!(identity, Identity::new("a@x.com", "alice").unwrap());
    }

    #[test]
    fn test_cli_rejects_http_url() {
        let cli = Cli::parse_from([
            "chatroom-client",
            "--server",
            "http://chat.example/ws",
            "--username",
            "alice",
        ]);
        assert!(cli.into_identity().is_err());
    }

    #[test]
    fn test_cli_rejects_blank_username() {
        let cli = Cli::parse_from(["chatroom-client", "--username", " "]);
        assert!(cli.into_identity().is_err());
    }
}
