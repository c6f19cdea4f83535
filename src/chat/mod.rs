use chrono::{ DateTime, Utc };
use clap::Parser;
use reqwest::Client as HttpClient;
use reqwest::multipart::{ Form, Part };
use std::error::Error as StdError;
use std::io::{ self, Write };
use std::path::{ Path, PathBuf };
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::llm::{ GENERATION_TIMEOUT_SECS, SupportedModel };
use crate::models::api::{ TextGenerationRequest, TextGenerationResponse, UploadReceipt };
use crate::models::chat::{ ChatMessage, Role };

const HEALTH_TIMEOUT_SECS: u64 = 5;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ChatArgs {
    /// Base URL of the generation server.
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:8000")]
    pub api_base_url: String,

    /// Model the conversation runs against.
    #[arg(long, default_value = "gpt-3.5-turbo")]
    pub model: SupportedModel,

    /// Sampling temperature sent with every message.
    #[arg(long, default_value = "0.7")]
    pub temperature: f32,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Cannot connect to the API server. Make sure the server is running.")]
    Connect,
    #[error("Request timed out. The API is taking too long to respond.")]
    Timeout,
    #[error("API Error: {status} - {body}")]
    Api {
        status: u16,
        body: String,
    },
    #[error("An error occurred: {0}")]
    Transport(reqwest::Error),
    #[error("Could not read file: {0}")]
    File(#[from] io::Error),
}

fn classify(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout
    } else if err.is_connect() {
        ClientError::Connect
    } else {
        ClientError::Transport(err)
    }
}

/// Typed wrapper over the server's HTTP API.
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(GENERATION_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Calls `GET /health` with a short timeout so startup never hangs on
    /// a dead server.
    pub async fn health(&self) -> Result<(), ClientError> {
        let response = self.http
            .get(format!("{}/health", self.base_url))
            .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS))
            .send().await
            .map_err(classify)?;

        if !response.status().is_success() {
            return Err(ClientError::Api {
                status: response.status().as_u16(),
                body: String::new(),
            });
        }
        Ok(())
    }

    pub async fn generate(
        &self,
        model: SupportedModel,
        prompt: &str,
        temperature: f32
    ) -> Result<TextGenerationResponse, ClientError> {
        let body = TextGenerationRequest {
            prompt: prompt.to_string(),
            model,
            temperature,
        };

        let response = self.http
            .post(format!("{}/generate/text", self.base_url))
            .json(&body)
            .send().await
            .map_err(classify)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.map_err(classify)?;
            return Err(ClientError::Api { status, body });
        }

        response.json::<TextGenerationResponse>().await.map_err(classify)
    }

    pub async fn upload(&self, path: &Path) -> Result<UploadReceipt, ClientError> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| {
                ClientError::File(io::Error::new(io::ErrorKind::InvalidInput, "path has no filename"))
            })?;

        let part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str("application/pdf")
            .map_err(classify)?;
        let form = Form::new().part("file", part);

        let response = self.http
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send().await
            .map_err(classify)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.map_err(classify)?;
            return Err(ClientError::Api { status, body });
        }

        response.json::<UploadReceipt>().await.map_err(classify)
    }
}

/// Local transcript of one REPL run. The server is stateless, so the
/// history only exists on this side.
pub struct ChatSession {
    pub id: String,
    pub started_at: DateTime<Utc>,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    pub fn push_user(&mut self, content: &str) {
        self.messages.push(ChatMessage::new(Role::User, content));
    }

    pub fn push_assistant(&mut self, content: &str) {
        self.messages.push(ChatMessage::new(Role::Assistant, content));
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Upload(PathBuf),
    History,
    Clear,
    Help,
    Quit,
    Empty,
}

/// Splits REPL input into commands. Anything not starting with `:` is a
/// message for the model; unknown `:` commands fall back to help.
pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    if !trimmed.starts_with(':') {
        return Command::Say(trimmed.to_string());
    }
    if let Some(rest) = trimmed.strip_prefix(":upload ") {
        return Command::Upload(PathBuf::from(rest.trim()));
    }
    match trimmed {
        ":quit" | ":exit" => Command::Quit,
        ":clear" => Command::Clear,
        ":history" => Command::History,
        _ => Command::Help,
    }
}

fn print_help() {
    println!("Commands:");
    println!("  :upload <path>   upload a PDF into the knowledge base");
    println!("  :history         replay the conversation so far");
    println!("  :clear           clear the conversation history");
    println!("  :quit            exit");
}

pub async fn run(args: ChatArgs) -> Result<(), Box<dyn StdError + Send + Sync>> {
    let client = ApiClient::new(&args.api_base_url)?;

    println!("AI Text Generator");
    println!("Server: {}", args.api_base_url);
    println!("Model: {} (temperature {})", args.model, args.temperature);
    match client.health().await {
        Ok(()) => println!("API Server is running"),
        Err(ClientError::Api { .. }) => println!("API Server responded with an error"),
        Err(_) => println!("Cannot connect to API Server"),
    }
    print_help();

    let mut session = ChatSession::new();
    println!("Session: {} (started {})", session.id, session.started_at.format("%H:%M:%S"));
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        match parse_command(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Help => print_help(),
            Command::History => {
                for message in session.messages() {
                    println!("{}: {}", message.role, message.content);
                }
            }
            Command::Clear => {
                session.clear();
                println!("Chat history cleared");
            }
            Command::Upload(path) => {
                match client.upload(&path).await {
                    Ok(receipt) => println!("{}: {}", receipt.filename, receipt.message),
                    Err(err) => println!("{}", err),
                }
            }
            Command::Say(text) => {
                session.push_user(&text);
                println!("Thinking...");
                match client.generate(args.model, &text, args.temperature).await {
                    Ok(response) => {
                        println!("assistant: {}", response.content);
                        session.push_assistant(&response.content);
                    }
                    Err(err) => println!("{}", err),
                }
            }
        }
    }

    println!("Goodbye");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_becomes_a_message() {
        assert_eq!(parse_command("hello world"), Command::Say("hello world".to_string()));
        assert_eq!(parse_command("  padded  "), Command::Say("padded".to_string()));
    }

    #[test]
    fn blank_input_is_skipped() {
        assert_eq!(parse_command(""), Command::Empty);
        assert_eq!(parse_command("   \n"), Command::Empty);
    }

    #[test]
    fn colon_commands_are_recognised() {
        assert_eq!(parse_command(":quit"), Command::Quit);
        assert_eq!(parse_command(":exit"), Command::Quit);
        assert_eq!(parse_command(":clear"), Command::Clear);
        assert_eq!(parse_command(":history"), Command::History);
        assert_eq!(
            parse_command(":upload ./docs/report.pdf"),
            Command::Upload(PathBuf::from("./docs/report.pdf"))
        );
    }

    #[test]
    fn upload_without_a_path_shows_help() {
        assert_eq!(parse_command(":upload"), Command::Help);
    }

    #[test]
    fn unknown_colon_command_shows_help() {
        assert_eq!(parse_command(":frobnicate"), Command::Help);
    }

    #[test]
    fn session_keeps_messages_in_order_until_cleared() {
        let mut session = ChatSession::new();
        session.push_user("hi");
        session.push_assistant("hello");
        session.push_user("how are you?");

        let roles: Vec<Role> = session
            .messages()
            .iter()
            .map(|message| message.role)
            .collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(session.messages()[1].content, "hello");

        session.clear();
        assert!(session.messages().is_empty());
    }

    #[test]
    fn every_session_gets_its_own_id() {
        let a = ChatSession::new();
        let b = ChatSession::new();
        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn api_errors_render_with_status_and_body() {
        let err = ClientError::Api {
            status: 422,
            body: "prompt must not be empty".to_string(),
        };
        assert_eq!(err.to_string(), "API Error: 422 - prompt must not be empty");
    }
}
