use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Certificate,
    Listen,
    BrowserLaunch,
    TimedOut,
    CodeAbsent,
    Network,
    EmptyResponse,
    Decode,
    Other,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("certificate error: {message}")]
    Certificate { message: String },

    #[error("failed to listen on {addr}: {source}")]
    Listen {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open the browser for {url}: {source}")]
    BrowserLaunch {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {timeout:?} waiting for the authorization redirect")]
    TimedOut { timeout: Duration },

    #[error("authorization redirect carried no code{}", provider_error_suffix(.error))]
    CodeAbsent { error: Option<String> },

    #[error("state mismatch (expected={expected}, received={received})")]
    StateMismatch { expected: String, received: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("auth response from the server is empty")]
    EmptyResponse,

    #[error("failed to decode token response: {message}")]
    Decode { message: String, body: String },

    #[error("token request rejected by provider: {error}")]
    TokenRejected { error: String },

    #[error("http status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("capture server failed: {message}")]
    ServerFailed { message: String },

    #[error("config file {path}: {message}")]
    ConfigFile { path: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("os rng error: {message}")]
    OsRng { message: String },

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Certificate { .. } | Self::OsRng { .. } => ErrorKind::Certificate,
            Self::Listen { .. } => ErrorKind::Listen,
            Self::BrowserLaunch { .. } => ErrorKind::BrowserLaunch,
            Self::TimedOut { .. } => ErrorKind::TimedOut,
            Self::CodeAbsent { .. } | Self::StateMismatch { .. } => ErrorKind::CodeAbsent,
            Self::Network(_) => ErrorKind::Network,
            Self::EmptyResponse => ErrorKind::EmptyResponse,
            // a token endpoint that answered but handed back no usable token
            Self::Decode { .. } | Self::TokenRejected { .. } | Self::HttpStatus { .. } => {
                ErrorKind::Decode
            }
            _ => ErrorKind::Other,
        }
    }

    pub(crate) fn certificate(err: impl std::fmt::Display) -> Self {
        Self::Certificate {
            message: err.to_string(),
        }
    }
}

fn provider_error_suffix(error: &Option<String>) -> String {
    match error {
        Some(error) => format!(" (error={error})"),
        None => String::new(),
    }
}
