use std::net::{IpAddr, Ipv4Addr};

use url::{Host, Url};

pub(crate) const DEFAULT_HOST: &str = "localhost";
pub(crate) const DEFAULT_CODE_PARAM: &str = "code";

#[derive(Debug, Clone)]
pub struct LocalServerConfig {
    // comma separated; the first entry names the redirect host
    pub host: String,
    pub bind_addr: IpAddr,
    pub port: u16,
    pub path: String,
    pub code_param: String,
}

impl LocalServerConfig {
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            bind_addr: bind_addr_for(&host),
            host,
            port,
            path: normalize_path(path.into()),
            code_param: DEFAULT_CODE_PARAM.to_string(),
        }
    }

    pub fn redirect_uri(&self) -> String {
        redirect_uri_for(&self.host, self.port, &self.path)
    }

    pub fn with_code_param(mut self, code_param: impl Into<String>) -> Self {
        self.code_param = code_param.into();
        self
    }
}

impl Default for LocalServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, 0, "/")
    }
}

fn primary_host(host: &str) -> &str {
    host.split(',').next().unwrap_or(host).trim()
}

/// IP literals are listened on directly; names listen on IPv4 loopback.
fn bind_addr_for(host: &str) -> IpAddr {
    primary_host(host)
        .parse()
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn redirect_uri_for(host: &str, port: u16, path: &str) -> String {
    let host = primary_host(host);
    let host = match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => Host::<String>::Ipv4(ip),
        Ok(IpAddr::V6(ip)) => Host::Ipv6(ip),
        Err(_) => Host::Domain(host.to_string()),
    };
    let uri = format!("https://{host}:{port}{path}");
    match Url::parse(&uri) {
        Ok(url) => url.to_string(),
        Err(_) => uri,
    }
}

fn normalize_path(path: String) -> String {
    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    }
}
