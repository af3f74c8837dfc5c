//! On-disk TOML configuration and client credential resolution.
//!
//! The file keeps a single `[Slack]` table:
//!
//! ```toml
//! [Slack]
//! ClientID = "..."
//! ClientSecret = "..."
//! AccessToken = "..."
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::certificate::write_owner_only;
use crate::{AccessToken, AuthError};

pub const CONFIG_FILE_NAME: &str = "slack-file.conf";
pub const CLIENT_ID_ENV: &str = "SLACK_OAUTH2_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "SLACK_OAUTH2_CLIENT_SECRET";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "Slack", default)]
    pub slack: SlackSection,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackSection {
    #[serde(rename = "ClientID", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(rename = "ClientSecret", default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(rename = "AccessToken", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl std::fmt::Debug for SlackSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackSection")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

pub fn determine_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    let wd_path = Path::new(".").join(CONFIG_FILE_NAME);
    if wd_path.exists() {
        return wd_path;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let exe_path = dir.join(CONFIG_FILE_NAME);
            if exe_path.exists() {
                return exe_path;
            }
        }
    }

    wd_path
}

impl Config {
    /// A missing file reads as an empty config; nothing is written until `save`.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).map_err(|err| config_error(path, err)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "config missing, starting empty");
                Ok(Self::default())
            }
            Err(err) => Err(config_error(path, err)),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), AuthError> {
        let contents = toml::to_string_pretty(self).map_err(|err| config_error(path, err))?;
        write_owner_only(path, contents.as_bytes()).map_err(|err| config_error(path, err))?;
        debug!(path = %path.display(), "saved config");
        Ok(())
    }

    pub fn store_token(&mut self, token: AccessToken) {
        self.slack.access_token = Some(token.into_secret());
    }
}

pub fn resolve_credentials<E>(
    arg_client_id: Option<&str>,
    arg_client_secret: Option<&str>,
    config: &Config,
    env: E,
) -> Result<Credentials, AuthError>
where
    E: Fn(&str) -> Option<String>,
{
    let client_id = first_non_empty([
        arg_client_id.map(str::to_string),
        config.slack.client_id.clone(),
        env(CLIENT_ID_ENV),
    ]);
    let client_secret = first_non_empty([
        arg_client_secret.map(str::to_string),
        config.slack.client_secret.clone(),
        env(CLIENT_SECRET_ENV),
    ]);

    match (client_id, client_secret) {
        (Some(client_id), Some(client_secret)) => Ok(Credentials {
            client_id,
            client_secret,
        }),
        _ => Err(AuthError::Configuration {
            message: format!("both {CLIENT_ID_ENV} and {CLIENT_SECRET_ENV} must be given"),
        }),
    }
}

fn first_non_empty<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
}

fn config_error(path: &Path, err: impl std::fmt::Display) -> AuthError {
    AuthError::ConfigFile {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind as AuthErrorKind;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn load_leaves_missing_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(!path.exists());
    }

    #[test]
    fn save_and_load_keep_go_style_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut config = Config::default();
        config.slack.client_id = Some("id".to_string());
        config.store_token(AccessToken::new("xoxp-1"));
        config.save(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[Slack]"));
        assert!(contents.contains("ClientID = \"id\""));
        assert!(contents.contains("AccessToken = \"xoxp-1\""));

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn storing_a_token_leaves_credentials_untouched() {
        let mut config = Config::default();
        let credentials = resolve_credentials(
            Some("arg-id"),
            Some("arg-secret"),
            &config,
            no_env,
        )
        .unwrap();
        assert_eq!(credentials.client_id, "arg-id");

        config.store_token(AccessToken::new("xoxp-2"));
        assert_eq!(config.slack.client_id, None);
        assert_eq!(config.slack.client_secret, None);
        assert_eq!(config.slack.access_token.as_deref(), Some("xoxp-2"));

        let contents = toml::to_string_pretty(&config).unwrap();
        assert!(!contents.contains("arg-secret"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[Slack\nClientID = ").unwrap();

        assert!(matches!(
            Config::load(&path),
            Err(AuthError::ConfigFile { .. })
        ));
    }

    #[test]
    fn explicit_path_wins() {
        let path = determine_config_path(Some(Path::new("/tmp/custom.conf")));
        assert_eq!(path, PathBuf::from("/tmp/custom.conf"));
    }

    #[test]
    fn arguments_take_precedence() {
        let mut config = Config::default();
        config.slack.client_id = Some("from-config".to_string());
        config.slack.client_secret = Some("config-secret".to_string());

        let credentials =
            resolve_credentials(Some("from-arg"), Some("arg-secret"), &config, no_env).unwrap();
        assert_eq!(credentials.client_id, "from-arg");
        assert_eq!(credentials.client_secret, "arg-secret");
    }

    #[test]
    fn falls_back_to_config_then_env() {
        let mut config = Config::default();
        config.slack.client_id = Some("from-config".to_string());
        config.slack.client_secret = Some(String::new());

        let env = |key: &str| (key == CLIENT_SECRET_ENV).then(|| "env-secret".to_string());
        let credentials = resolve_credentials(None, None, &config, env).unwrap();
        assert_eq!(credentials.client_id, "from-config");
        assert_eq!(credentials.client_secret, "env-secret");
    }

    #[test]
    fn missing_secret_is_configuration_error() {
        let err = resolve_credentials(Some("id"), None, &Config::default(), no_env).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::Configuration);
    }
}
