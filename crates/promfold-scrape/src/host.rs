//! Host strings → scrape URLs, filling in module defaults.
//!
//! Accepts `host:port`, `scheme://host:port` and `scheme://host:port/path`.
//! A missing scheme or path comes from the module; a missing port is 80.

use std::fmt;

use crate::error::HostError;

const DEFAULT_PORT: u16 = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostUrl {
    pub scheme: String,
    /// Host name or address without the port; IPv6 keeps its brackets.
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl HostUrl {
    /// `host:port`, suitable for a TCP connect.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for HostUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
    }
}

#[derive(Debug, Clone)]
pub struct HostParser {
    pub default_scheme: String,
    pub default_path: String,
}

impl HostParser {
    pub fn new(default_scheme: &str, default_path: &str) -> Self {
        Self {
            default_scheme: default_scheme.to_string(),
            default_path: default_path.to_string(),
        }
    }

    pub fn parse(&self, host: &str) -> Result<HostUrl, HostError> {
        let host = host.trim();
        let (scheme, rest) = match host.split_once("://") {
            Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
            None => (self.default_scheme.clone(), host),
        };
        if scheme != "http" {
            return Err(HostError::UnsupportedScheme(scheme));
        }

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], rest[idx..].to_string()),
            None => (rest, self.default_path.clone()),
        };
        if authority.is_empty() {
            return Err(HostError::EmptyHost);
        }

        let (name, port) = split_port(authority)?;
        if name.is_empty() {
            return Err(HostError::EmptyHost);
        }

        Ok(HostUrl {
            scheme,
            host: name.to_string(),
            port: port.unwrap_or(DEFAULT_PORT),
            path,
        })
    }
}

/// Split `name[:port]`, keeping IPv6 literals such as `[::1]:9090` intact.
fn split_port(authority: &str) -> Result<(&str, Option<u16>), HostError> {
    let port_sep = if authority.starts_with('[') {
        authority
            .find(']')
            .and_then(|end| authority[end..].find(':').map(|i| end + i))
    } else {
        authority.rfind(':')
    };

    match port_sep {
        Some(idx) => {
            let port = authority[idx + 1..]
                .parse::<u16>()
                .map_err(|_| HostError::InvalidPort(authority.to_string()))?;
            Ok((&authority[..idx], Some(port)))
        }
        None => Ok((authority, None)),
    }
}
