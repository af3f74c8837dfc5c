//! Slack OAuth 2.0 authorization-code capture over a self-signed HTTPS loopback listener.
//!
//! A session provisions a throwaway certificate, listens on a local port for the provider's
//! browser redirect, captures the one-time code under a deadline and exchanges it for an
//! access token. Persisting the token is left to the caller (see [`config::Config`]).

mod browser;
mod certificate;
mod client;
pub mod config;
mod error;
mod exchange;
mod local_server;
mod providers;
mod types;

pub use browser::open_browser;
pub use certificate::KeyMaterial;
pub use client::{AuthClient, AuthClientConfig};
pub use error::{AuthError, ErrorKind};
pub use exchange::TokenExchangeClient;
pub use local_server::{CaptureHandle, LocalServer, LocalServerConfig, render_page};
pub use providers::{OAuthProvider, SlackProvider};
pub use types::{AccessToken, AuthorizationRequest, CaptureResult, TokenResponse};
