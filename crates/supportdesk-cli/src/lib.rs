use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use supportdesk_context::Turn;
use thiserror::Error;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:3001";

// Replies may include the provider's full retry budget.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Parser)]
#[command(
    name = "supportdesk",
    version,
    about = "SupportDesk command line client",
    long_about = "SupportDesk command line client for chatting with the support assistant and reading conversation history"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "SUPPORTDESK_SERVER",
        default_value = DEFAULT_SERVER,
        help = "Gateway base HTTP URL"
    )]
    pub server: String,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Send one message and print the reply")]
    Send {
        #[arg(help = "Message text")]
        message: String,
        #[arg(long, help = "Continue an existing session")]
        session: Option<String>,
    },
    #[command(about = "Print the stored turns of a session")]
    History {
        #[arg(help = "Session ID")]
        session_id: String,
    },
    #[command(about = "Start an interactive chat")]
    Chat {
        #[arg(long, help = "Continue an existing session")]
        session: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("http transport error: {0}")]
    HttpTransport(String),
    #[error("http status {status}: {message}")]
    HttpStatus { status: u16, message: String },
    #[error("json decode error: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatMessageRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageResponse {
    pub reply: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<Turn>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct CliClient {
    base_url: String,
    http: reqwest::Client,
}

impl CliClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CliError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| CliError::HttpTransport(err.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub async fn send_message(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<ChatMessageResponse, CliError> {
        if message.trim().is_empty() {
            return Err(CliError::InvalidArgument(
                "message cannot be empty".to_string(),
            ));
        }

        let payload = ChatMessageRequest {
            message,
            session_id,
        };
        let response = self
            .http
            .post(self.endpoint("/chat/message"))
            .json(&payload)
            .send()
            .await
            .map_err(|err| CliError::HttpTransport(err.to_string()))?;
        decode(response).await
    }

    /// `{base}/chat/history/{id}` with the id percent-encoded as one segment.
    fn history_url(&self, session_id: &str) -> Result<reqwest::Url, CliError> {
        let invalid = || CliError::InvalidArgument(format!("invalid server url: {}", self.base_url));
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .extend(["chat", "history", session_id]);
        Ok(url)
    }

    pub async fn fetch_history(&self, session_id: &str) -> Result<Vec<Turn>, CliError> {
        if session_id.trim().is_empty() {
            return Err(CliError::InvalidArgument(
                "session id cannot be empty".to_string(),
            ));
        }

        let response = self
            .http
            .get(self.history_url(session_id)?)
            .send()
            .await
            .map_err(|err| CliError::HttpTransport(err.to_string()))?;
        decode::<HistoryResponse>(response)
            .await
            .map(|body| body.history)
    }
}

/// Decode a 200 body, or turn the gateway's `{"error": ...}` body into
/// [`CliError::HttpStatus`].
async fn decode<TRes>(response: reqwest::Response) -> Result<TRes, CliError>
where
    TRes: for<'de> Deserialize<'de>,
{
    if response.status() != StatusCode::OK {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read body>".to_string());
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|parsed| parsed.error)
            .unwrap_or(body);
        return Err(CliError::HttpStatus { status, message });
    }

    response
        .json::<TRes>()
        .await
        .map_err(|err| CliError::Decode(err.to_string()))
}

/// A conversation that remembers its session id between messages.
#[derive(Debug, Clone)]
pub struct ChatSession {
    client: CliClient,
    session_id: Option<String>,
}

impl ChatSession {
    pub fn new(client: CliClient, session_id: Option<String>) -> Self {
        Self { client, session_id }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub async fn send(&mut self, message: &str) -> Result<String, CliError> {
        let response = self
            .client
            .send_message(message, self.session_id.as_deref())
            .await?;
        self.session_id = Some(response.session_id);
        Ok(response.reply)
    }

    /// Stored turns of the current session; empty before the first message.
    pub async fn history(&self) -> Result<Vec<Turn>, CliError> {
        match &self.session_id {
            Some(id) => self.client.fetch_history(id).await,
            None => Ok(Vec::new()),
        }
    }
}

pub fn format_history(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "No messages in this session.".to_string();
    }
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role(), turn.content()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run a one-shot command. `chat` is interactive and handled by the binary.
pub async fn run(cli: Cli) -> Result<String, CliError> {
    let client = CliClient::new(cli.server)?;
    match cli.command {
        Commands::Send { message, session } => {
            let response = client.send_message(&message, session.as_deref()).await?;
            Ok(format!(
                "{}\n(session: {})",
                response.reply, response.session_id
            ))
        }
        Commands::History { session_id } => {
            let turns = client.fetch_history(&session_id).await?;
            Ok(format_history(&turns))
        }
        Commands::Chat { .. } => Err(CliError::InvalidArgument(
            "chat is interactive; run it from a terminal".to_string(),
        )),
    }
}
