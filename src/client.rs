use std::time::Duration;

use tracing::{debug, info};
use url::Url;

use crate::local_server::{DEFAULT_CODE_PARAM, DEFAULT_HOST};
use crate::{
    AccessToken, AuthError, AuthorizationRequest, CaptureResult, KeyMaterial, LocalServer,
    LocalServerConfig, OAuthProvider, SlackProvider, TokenExchangeClient,
};

#[derive(Clone)]
pub struct AuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub code_param: String,
    pub timeout: Option<Duration>,
    pub team: Option<String>,
    pub state: Option<String>,
}

impl AuthClientConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            host: DEFAULT_HOST.to_string(),
            port: SlackProvider::default_port(),
            path: "/".to_string(),
            code_param: DEFAULT_CODE_PARAM.to_string(),
            timeout: None,
            team: None,
            state: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    // Non-positive values wait forever.
    pub fn with_timeout_secs(self, secs: i64) -> Self {
        let timeout = u64::try_from(secs)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        self.with_timeout(timeout)
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_code_param(mut self, code_param: impl Into<String>) -> Self {
        self.code_param = code_param.into();
        self
    }

    fn local_server_config(&self) -> LocalServerConfig {
        LocalServerConfig::new(self.host.clone(), self.port, self.path.clone())
            .with_code_param(self.code_param.clone())
    }
}

impl std::fmt::Debug for AuthClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .field("team", &self.team)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct AuthClient<P: OAuthProvider> {
    provider: P,
    config: AuthClientConfig,
    exchange: TokenExchangeClient,
}

impl<P: OAuthProvider> AuthClient<P> {
    pub fn new(provider: P, config: AuthClientConfig) -> Result<Self, AuthError> {
        let exchange = TokenExchangeClient::new(provider.token_url(), None)?;
        Ok(Self {
            provider,
            config,
            exchange,
        })
    }

    pub fn config(&self) -> &AuthClientConfig {
        &self.config
    }

    pub fn authorization_url(&self, redirect_uri: &str) -> Result<AuthorizationRequest, AuthError> {
        let scope = self.provider.default_scope();
        let mut url = Url::parse(self.provider.authorize_url())?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("client_id", &self.config.client_id);
            pairs.append_pair("scope", scope);
            pairs.append_pair("redirect_uri", redirect_uri);
            if let Some(team) = &self.config.team {
                pairs.append_pair("team", team);
            }
            if let Some(state) = &self.config.state {
                pairs.append_pair("state", state);
            }
        }

        Ok(AuthorizationRequest {
            authorization_url: url.to_string(),
            redirect_uri: redirect_uri.to_string(),
            scope: scope.to_string(),
            state: self.config.state.clone(),
        })
    }

    /// Listens, lets `on_authorize` send the user to the provider, captures the redirect,
    /// tears the listener down, then exchanges the code.
    pub async fn run_local_flow<F>(&self, on_authorize: F) -> Result<AccessToken, AuthError>
    where
        F: FnOnce(&AuthorizationRequest) -> Result<(), AuthError>,
    {
        let key_material = KeyMaterial::provision(&self.config.host)?;

        let server = LocalServer::from_config(self.config.local_server_config());
        let listener = server.bind()?;
        let bound = LocalServerConfig {
            port: listener.local_addr()?.port(),
            ..server.config().clone()
        };
        let redirect_uri = bound.redirect_uri();

        let auth = self.authorization_url(&redirect_uri)?;
        debug!(url = %auth.authorization_url, "authorization url");

        let mut handle = server.start(listener, key_material).await?;

        let captured = match on_authorize(&auth) {
            Ok(()) => handle.wait(self.config.timeout).await,
            Err(err) => Err(err),
        };
        handle.stop().await;

        match captured? {
            CaptureResult::Code { code, state } => {
                self.check_state(state)?;
                info!("authorization code received");
                self.exchange
                    .exchange(
                        &self.config.client_id,
                        &self.config.client_secret,
                        &code,
                        &redirect_uri,
                    )
                    .await
            }
            CaptureResult::Absent { error } => Err(AuthError::CodeAbsent { error }),
        }
    }

    fn check_state(&self, received: Option<String>) -> Result<(), AuthError> {
        match &self.config.state {
            Some(expected) if received.as_deref() != Some(expected.as_str()) => {
                Err(AuthError::StateMismatch {
                    expected: expected.clone(),
                    received: received.unwrap_or_default(),
                })
            }
            _ => Ok(()),
        }
    }
}
