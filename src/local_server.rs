//! Single-purpose HTTPS listener that captures the provider's loopback redirect.

mod config;
mod http;
mod server;

pub use config::LocalServerConfig;
pub(crate) use config::{DEFAULT_CODE_PARAM, DEFAULT_HOST};
pub use http::render_page;
pub use server::{CaptureHandle, LocalServer};
