mod provider;
mod slack;

pub use provider::OAuthProvider;
pub use slack::SlackProvider;
