use std::time::Duration;

use reqwest::{Client, header};
use tracing::{debug, info};

use crate::{AccessToken, AuthError, TokenResponse};

#[derive(Debug, Clone)]
pub struct TokenExchangeClient {
    token_url: String,
    http: Client,
}

impl TokenExchangeClient {
    pub fn new(token_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, AuthError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_http_client(token_url, builder.build()?))
    }

    pub fn with_http_client(token_url: impl Into<String>, http: Client) -> Self {
        Self {
            token_url: token_url.into(),
            http,
        }
    }

    pub async fn exchange(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<AccessToken, AuthError> {
        let form = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        debug!(url = %self.token_url, "requesting access token");
        let response = self
            .http
            .post(&self.token_url)
            .header(header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // an empty body is reported as such whatever the status
        let token = match parse_token_body(&body) {
            Err(err @ (AuthError::EmptyResponse | AuthError::TokenRejected { .. })) => {
                return Err(err);
            }
            _ if !status.is_success() => {
                return Err(AuthError::HttpStatus {
                    status: status.as_u16(),
                    body,
                });
            }
            result => result?,
        };
        info!("obtained access token");
        Ok(token)
    }
}

fn parse_token_body(body: &str) -> Result<AccessToken, AuthError> {
    if body.trim().is_empty() {
        return Err(AuthError::EmptyResponse);
    }

    let response: TokenResponse =
        serde_json::from_str(body).map_err(|err| AuthError::Decode {
            message: err.to_string(),
            body: body.to_string(),
        })?;

    match response.access_token {
        Some(token) if !token.is_empty() => Ok(AccessToken::new(token)),
        _ => match response.error {
            Some(error) => Err(AuthError::TokenRejected { error }),
            None => Err(AuthError::Decode {
                message: "response has no access_token".to_string(),
                body: body.to_string(),
            }),
        },
    }
}
