use tracing::info;

use crate::AuthError;

pub fn open_browser(url: &str) -> Result<(), AuthError> {
    info!("opening browser for authorization");
    webbrowser::open(url).map_err(|source| AuthError::BrowserLaunch {
        url: url.to_string(),
        source,
    })
}
