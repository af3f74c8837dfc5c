use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub authorization_url: String,
    pub redirect_uri: String,
    pub scope: String,
    pub state: Option<String>,
}

/// Outcome of the loopback redirect: the first request wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureResult {
    Code {
        code: String,
        state: Option<String>,
    },
    Absent {
        error: Option<String>,
    },
}

impl CaptureResult {
    /// An empty code counts as absent.
    pub fn from_query(query: &str, code_param: &str) -> Self {
        let mut code = None;
        let mut state = None;
        let mut error = None;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if key == code_param {
                code.get_or_insert_with(|| value.to_string());
            } else if key == "state" {
                state.get_or_insert_with(|| value.to_string());
            } else if key == "error" {
                error.get_or_insert_with(|| value.to_string());
            }
        }

        match code {
            Some(code) if !code.is_empty() => Self::Code { code, state },
            _ => Self::Absent { error },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Code { .. })
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }

    pub fn into_secret(self) -> String {
        self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}
