use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use slack_auth::config::{Config, determine_config_path, resolve_credentials};
use slack_auth::{AuthClient, AuthClientConfig, AuthError, SlackProvider, open_browser};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const AUTH_USAGE: &str = "\
1. go to https://api.slack.com/apps
2. make a new app
     Redirect URLs: https://localhost:7878
     Scopes: chat:write:bot, channels:read
3. slack-auth auth CLIENT_ID CLIENT_SECRET";

#[derive(Debug, Parser)]
#[command(
    name = "slack-auth",
    about = "Authenticate against Slack and store the access token in a TOML config file."
)]
struct Cli {
    /// Config file (defaults to ./slack-file.conf or the one next to the executable).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Authenticate through the browser and store the access token.
    #[command(after_help = AUTH_USAGE)]
    Auth(AuthArgs),
}

#[derive(Debug, Args)]
struct AuthArgs {
    client_id: Option<String>,
    client_secret: Option<String>,

    /// Temporary local port for the OAuth redirect.
    #[arg(long, default_value_t = SlackProvider::default_port())]
    port: u16,

    /// Seconds to wait for the redirect; zero or negative waits forever.
    #[arg(long, default_value_t = 60, allow_negative_numbers = true)]
    timeout: i64,
}

#[tokio::main]
async fn main() -> Result<(), AuthError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Auth(args) => run_auth(cli.config.as_deref(), args).await,
    }
}

async fn run_auth(config_path: Option<&Path>, args: AuthArgs) -> Result<(), AuthError> {
    let path = determine_config_path(config_path);
    let mut config = Config::load(&path)?;

    let (arg_client_id, arg_client_secret) = match (&args.client_id, &args.client_secret) {
        (Some(id), Some(secret)) => (Some(id.as_str()), Some(secret.as_str())),
        _ => (None, None),
    };

    let credentials = match resolve_credentials(
        arg_client_id,
        arg_client_secret,
        &config,
        |key| std::env::var(key).ok(),
    ) {
        Ok(credentials) => credentials,
        Err(err) => {
            eprintln!("access {} to register an app", SlackProvider::apps_url());
            if let Err(open_err) = open_browser(SlackProvider::apps_url()) {
                warn!(error = %open_err, "failed to open the apps page");
            }
            return Err(err);
        }
    };

    let client_config =
        AuthClientConfig::new(&credentials.client_id, &credentials.client_secret)
            .with_port(args.port)
            .with_timeout_secs(args.timeout);
    let client = AuthClient::new(SlackProvider::new(), client_config)?;

    let token = client
        .run_local_flow(|auth| {
            eprintln!("Authorization URL:\n{}", auth.authorization_url);
            open_browser(&auth.authorization_url)
        })
        .await?;

    config.store_token(token);
    config.save(&path)?;
    info!(path = %path.display(), "stored access token");
    Ok(())
}
