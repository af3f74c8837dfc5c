pub trait OAuthProvider: Send + Sync {
    fn authorize_url(&self) -> &str;
    fn token_url(&self) -> &str;
    fn default_scope(&self) -> &'static str;
}
