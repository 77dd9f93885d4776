//! Parser for `tools:validation testUrl` values
//!
//! Accepts the URL forms the platform's own URL class accepts for the
//! handful of protocols it knows, and reports failures with the same
//! wording so messages stay familiar.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const KNOWN_PROTOCOLS: &[&str] = &["http", "https", "ftp", "file", "jar", "mailto"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlParseError {
    #[error("no protocol: {0}")]
    NoProtocol(String),

    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),

    #[error("Invalid host: {0}")]
    InvalidHost(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// A parsed test URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUrl {
    /// Lower-cased protocol
    pub scheme: String,

    /// Host as written, possibly empty
    pub host: String,

    /// Explicit port
    pub port: Option<u16>,

    /// Path without query or fragment, possibly empty
    pub path: String,

    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl TestUrl {
    pub fn parse(input: &str) -> Result<Self, UrlParseError> {
        let trimmed = input.trim();
        let spec = match trimmed.get(..4) {
            Some(prefix) if prefix.eq_ignore_ascii_case("url:") => &trimmed[4..],
            _ => trimmed,
        };

        let (scheme, rest) =
            split_protocol(spec).ok_or_else(|| UrlParseError::NoProtocol(input.to_string()))?;
        if !KNOWN_PROTOCOLS.contains(&scheme.as_str()) {
            return Err(UrlParseError::UnknownProtocol(scheme));
        }

        let (rest, fragment) = match rest.split_once('#') {
            Some((before, fragment)) => (before, Some(fragment.to_string())),
            None => (rest, None),
        };

        let (host, port, rest) = match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find(['/', '?']).unwrap_or(after.len());
                let (host, port) = parse_authority(&after[..end])?;
                (host, port, &after[end..])
            }
            None => (String::new(), None, rest),
        };

        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (rest.to_string(), None),
        };

        Ok(TestUrl {
            scheme,
            host,
            port,
            path,
            query,
            fragment,
        })
    }

    /// The explicit port, or the protocol's well-known port
    pub fn effective_port(&self) -> Option<u16> {
        self.port.or_else(|| default_port(&self.scheme))
    }
}

impl FromStr for TestUrl {
    type Err = UrlParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TestUrl::parse(s)
    }
}

impl fmt::Display for TestUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        write!(f, "{}", self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{}", query)?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", fragment)?;
        }
        Ok(())
    }
}

/// Well-known port of a scheme
pub fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        "ftp" => Some(21),
        _ => None,
    }
}

/// Split `scheme:rest`; the scheme must come before any '/'
fn split_protocol(spec: &str) -> Option<(String, &str)> {
    let colon = spec.find(':')?;
    if let Some(slash) = spec.find('/') {
        if slash < colon {
            return None;
        }
    }
    let scheme = &spec[..colon];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic()
        || !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return None;
    }
    Some((scheme.to_ascii_lowercase(), &spec[colon + 1..]))
}

fn parse_authority(authority: &str) -> Result<(String, Option<u16>), UrlParseError> {
    let host_port = match authority.rsplit_once('@') {
        Some((_, host_port)) => host_port,
        None => authority,
    };

    let (host, port) = if host_port.starts_with('[') {
        let close = host_port
            .find(']')
            .ok_or_else(|| UrlParseError::InvalidHost(host_port.to_string()))?;
        let host = &host_port[..=close];
        if url::Host::parse(host).is_err() {
            return Err(UrlParseError::InvalidHost(host.to_string()));
        }
        let after = &host_port[close + 1..];
        let port = match after.strip_prefix(':') {
            Some(port) => Some(port),
            None if after.is_empty() => None,
            None => return Err(UrlParseError::InvalidHost(host_port.to_string())),
        };
        (host, port)
    } else {
        match host_port.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (host_port, None),
        }
    };

    let port = match port {
        None | Some("") => None,
        Some(port) => Some(
            port.parse::<u16>()
                .map_err(|_| UrlParseError::InvalidPort(port.to_string()))?,
        ),
    };

    Ok((host.to_string(), port))
}
