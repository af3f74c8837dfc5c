use crate::OAuthProvider;

const AUTHORIZE_URL: &str = "https://slack.com/oauth/authorize";
const TOKEN_URL: &str = "https://slack.com/api/oauth.access";
const APPS_URL: &str = "https://api.slack.com/apps";

const DEFAULT_SCOPE: &str = "chat:write:bot channels:read";
const DEFAULT_PORT: u16 = 7878;

#[derive(Debug, Clone)]
pub struct SlackProvider {
    authorize_url: String,
    token_url: String,
}

impl Default for SlackProvider {
    fn default() -> Self {
        Self {
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
        }
    }
}

impl OAuthProvider for SlackProvider {
    fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    fn token_url(&self) -> &str {
        &self.token_url
    }

    fn default_scope(&self) -> &'static str {
        DEFAULT_SCOPE
    }
}

impl SlackProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = url.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn default_port() -> u16 {
        DEFAULT_PORT
    }

    pub fn apps_url() -> &'static str {
        APPS_URL
    }
}
