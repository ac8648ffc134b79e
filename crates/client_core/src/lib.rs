use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, StatusCode};
use shared::{
    domain::{SessionView, Speaker, TranscriptEntry},
    protocol::{ChatReply, ChatRequest, LoginReply, LoginRequest},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

mod session;
mod transcript;

pub use session::Session;
pub use transcript::Transcript;

const LOGIN_REJECTED_FALLBACK: &str = "Login failed. Check your credentials and try again.";
const SESSION_EXPIRED_NOTICE: &str = "Session expired. Please sign in again.";
const NO_REPLY_FALLBACK: &str = "No reply arrived from the assistant.";
const EXCHANGE_FAILED_NOTICE: &str = "Sorry, something went wrong while contacting the assistant.";
const CONNECTION_FAILED_NOTICE: &str =
    "Could not reach the chat server. Check your connection and try again.";

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("{0}")]
    Rejected(String),
    #[error("server unreachable; check your connection or try again later")]
    Unreachable,
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("no active session; sign in before sending")]
    NotAuthenticated,
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("chat token rejected; sign-in required")]
    AuthRejected,
    #[error("chat request failed with status {0}")]
    Status(StatusCode),
    #[error("chat server unreachable")]
    Transport,
}

/// View-layer notifications. A terminal front end renders these as printed
/// lines; a GUI can map them onto its widgets one-to-one.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    LoginPending(bool),
    SessionChanged(SessionView),
    EntryAppended(TranscriptEntry),
    TypingStarted,
    TypingCleared,
    ComposerEnabled(bool),
    TranscriptScrolled,
}

#[derive(Debug, Default)]
struct ClientInner {
    session: Session,
    transcript: Transcript,
}

pub struct ChatClient {
    http: Client,
    base_url: String,
    inner: Mutex<ClientInner>,
    // Held across each network request: at most one exchange in flight.
    exchange_gate: Mutex<()>,
    events: broadcast::Sender<ChatEvent>,
}

impl ChatClient {
    pub fn new(server_url: impl AsRef<str>) -> Result<Arc<Self>> {
        let base_url = normalize_server_url(server_url.as_ref())?;
        let (events, _) = broadcast::channel(1024);
        Ok(Arc::new(Self {
            http: Client::new(),
            base_url,
            inner: Mutex::new(ClientInner::default()),
            exchange_gate: Mutex::new(()),
            events,
        }))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    pub async fn session_view(&self) -> SessionView {
        self.inner.lock().await.session.view()
    }

    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        self.inner.lock().await.transcript.entries().to_vec()
    }

    pub async fn is_awaiting_reply(&self) -> bool {
        self.inner.lock().await.transcript.is_awaiting_reply()
    }

    /// Exchanges credentials for a bearer token. Empty fields are rejected
    /// before any request is issued.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), LoginError> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() {
            return Err(LoginError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(LoginError::EmptyPassword);
        }

        let _serial = self.exchange_gate.lock().await;
        self.emit(ChatEvent::LoginPending(true));
        let outcome = self.login_request(username, password).await;
        self.emit(ChatEvent::LoginPending(false));

        let token = outcome?;
        self.inner.lock().await.session.authenticate(token);
        info!("session: login accepted view=logged_in");
        self.emit(ChatEvent::SessionChanged(SessionView::LoggedIn));
        Ok(())
    }

    /// Posts one chat message with the session token and appends the reply
    /// (or an error notice) to the transcript. Whitespace-only input is a
    /// no-op.
    pub async fn send(&self, message: &str) -> Result<(), SendError> {
        let message = message.trim();
        if message.is_empty() {
            return Ok(());
        }
        let token = {
            let inner = self.inner.lock().await;
            inner.session.token().map(str::to_string)
        }
        .ok_or(SendError::NotAuthenticated)?;

        let _serial = self.exchange_gate.lock().await;
        self.append_entry(Speaker::User, message).await;
        self.emit(ChatEvent::ComposerEnabled(false));
        if self.inner.lock().await.transcript.begin_awaiting_reply() {
            self.emit(ChatEvent::TypingStarted);
        }

        let outcome = self.chat_request(message, &token).await;

        if self.inner.lock().await.transcript.end_awaiting_reply() {
            self.emit(ChatEvent::TypingCleared);
        }
        let result = match outcome {
            Ok(reply) => {
                self.append_entry(Speaker::Bot, &reply).await;
                Ok(())
            }
            Err(err) => {
                self.append_entry(Speaker::Bot, notice_for(&err)).await;
                if matches!(err, ExchangeError::AuthRejected) {
                    self.inner.lock().await.session.invalidate();
                    info!("session: token rejected view=logged_out");
                    self.emit(ChatEvent::SessionChanged(SessionView::LoggedOut));
                }
                Err(SendError::Exchange(err))
            }
        };
        self.emit(ChatEvent::ComposerEnabled(true));
        result
    }

    /// User-initiated counterpart of the 401 reset.
    pub async fn log_out(&self) {
        let had_token = self.inner.lock().await.session.invalidate();
        if had_token {
            info!("session: signed out view=logged_out");
            self.emit(ChatEvent::SessionChanged(SessionView::LoggedOut));
        }
    }

    async fn login_request(&self, username: &str, password: &str) -> Result<String, LoginError> {
        let res = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(|err| {
                warn!("login: transport failure: {err}");
                LoginError::Unreachable
            })?;

        let status = res.status();
        let body: LoginReply = res.json().await.map_err(|err| {
            warn!("login: unreadable response body status={status}: {err}");
            LoginError::Unreachable
        })?;

        if status.is_success() {
            if let Some(token) = body.token {
                return Ok(token);
            }
        }
        warn!("login: rejected status={status}");
        Err(LoginError::Rejected(
            body.error
                .unwrap_or_else(|| LOGIN_REJECTED_FALLBACK.to_string()),
        ))
    }

    async fn chat_request(&self, message: &str, token: &str) -> Result<String, ExchangeError> {
        let res = self
            .http
            .post(format!("{}/sa1", self.base_url))
            .bearer_auth(token)
            .json(&ChatRequest {
                message: message.to_string(),
            })
            .send()
            .await
            .map_err(|err| {
                warn!("chat: transport failure: {err}");
                ExchangeError::Transport
            })?;

        let status = res.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                return Err(ExchangeError::AuthRejected);
            }
            warn!("chat: exchange failed status={status}");
            return Err(ExchangeError::Status(status));
        }

        let body: ChatReply = res.json().await.map_err(|err| {
            warn!("chat: unreadable response body: {err}");
            ExchangeError::Transport
        })?;
        Ok(body.reply.unwrap_or_else(|| NO_REPLY_FALLBACK.to_string()))
    }

    async fn append_entry(&self, speaker: Speaker, content: &str) {
        let entry = self.inner.lock().await.transcript.push(speaker, content);
        self.emit(ChatEvent::EntryAppended(entry));
        self.emit(ChatEvent::TranscriptScrolled);
    }

    fn emit(&self, event: ChatEvent) {
        let _ = self.events.send(event);
    }
}

fn notice_for(err: &ExchangeError) -> &'static str {
    match err {
        ExchangeError::AuthRejected => SESSION_EXPIRED_NOTICE,
        ExchangeError::Status(_) => EXCHANGE_FAILED_NOTICE,
        ExchangeError::Transport => CONNECTION_FAILED_NOTICE,
    }
}

/// Validates and canonicalizes the chat server base URL.
pub fn normalize_server_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed =
        url::Url::parse(trimmed).with_context(|| format!("invalid server url: {trimmed}"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(anyhow!(
            "server url must start with http:// or https://: {trimmed}"
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
