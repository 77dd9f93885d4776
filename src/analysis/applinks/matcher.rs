//! Matches test URLs against the [`UriInfo`] of an activity
//!
//! A URL is accepted when any intent filter accepts it. Otherwise every
//! filter contributes the first dimension it rejected the URL on, checked
//! in the order scheme, host and port, path.

use super::pattern::PathMatcher;
use super::test_url::TestUrl;
use super::uri_info::{HostPort, UriInfo};
use super::values::is_substituted;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a filter that declares hosts or paths but no scheme takes part in matching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptySchemePolicy {
    /// The filter is already reported as missing a scheme and matches nothing
    #[default]
    Reject,

    /// The missing scheme accepts any scheme
    MatchAny,
}

impl EmptySchemePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmptySchemePolicy::Reject => "reject",
            EmptySchemePolicy::MatchAny => "match-any",
        }
    }
}

/// Why one intent filter rejected a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The URL scheme is none of these
    SchemeMismatch(Vec<String>),

    /// No host, or host and port pair, accepted the URL
    HostMismatch(Vec<HostPort>),

    /// No path matcher accepted the URL path
    PathMismatch {
        matchers: Vec<PathMatcher>,
        case_sensitive_note: bool,
    },

    /// None of the filters declares a URI at all
    NoUriFilter,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::SchemeMismatch(schemes) => {
                write!(f, "did not match scheme {}", schemes.join(", "))
            }
            FailureReason::HostMismatch(pairs) => {
                let any_of = if pairs.len() > 1 { " any of" } else { "" };
                let pairs: Vec<String> = pairs.iter().map(HostPort::to_string).collect();
                write!(f, "did not match{} {}", any_of, pairs.join(", "))
            }
            FailureReason::PathMismatch {
                matchers,
                case_sensitive_note,
            } => {
                let matchers: Vec<String> = matchers.iter().map(PathMatcher::to_string).collect();
                write!(f, "did not match {}", matchers.join(", "))?;
                if *case_sensitive_note {
                    write!(f, " Note that matching is case sensitive.")?;
                }
                Ok(())
            }
            FailureReason::NoUriFilter => {
                write!(f, "did not match any intent filter declaring a URI")
            }
        }
    }
}

/// The combined rejection of a URL by every filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFailure {
    reasons: Vec<FailureReason>,
}

impl fmt::Display for MatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reasons: Vec<String> = self.reasons.iter().map(FailureReason::to_string).collect();
        write!(f, "Test URL {}", reasons.join(" or "))
    }
}

/// Outcome of matching a URL against one filter
#[derive(Debug, PartialEq)]
enum FilterMatch {
    /// The filter declares no URI to match against
    Skipped,
    Accepted,
    Rejected(FailureReason),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    empty_scheme: EmptySchemePolicy,
}

impl Matcher {
    pub fn new(empty_scheme: EmptySchemePolicy) -> Self {
        Self { empty_scheme }
    }

    /// `Ok` when any filter accepts `url`
    pub fn check(&self, url: &TestUrl, infos: &[UriInfo]) -> Result<(), MatchFailure> {
        let mut reasons: Vec<FailureReason> = Vec::new();
        let mut rendered: Vec<String> = Vec::new();

        for info in infos {
            match self.match_info(url, info) {
                FilterMatch::Skipped => {}
                FilterMatch::Accepted => return Ok(()),
                FilterMatch::Rejected(reason) => {
                    let text = reason.to_string();
                    if !rendered.contains(&text) {
                        rendered.push(text);
                        reasons.push(reason);
                    }
                }
            }
        }

        if reasons.is_empty() {
            reasons.push(FailureReason::NoUriFilter);
        }
        Err(MatchFailure { reasons })
    }

    fn match_info(&self, url: &TestUrl, info: &UriInfo) -> FilterMatch {
        if !info.has_data {
            return FilterMatch::Skipped;
        }

        let constrained = !info.host_ports.is_empty() || !info.paths.is_empty();
        let schemes = info.effective_schemes();
        if schemes.is_empty() && constrained && self.empty_scheme == EmptySchemePolicy::Reject {
            return FilterMatch::Skipped;
        }

        match self.match_dimensions(url, info, &schemes) {
            Ok(()) => FilterMatch::Accepted,
            Err(reason) => FilterMatch::Rejected(reason),
        }
    }

    fn match_dimensions(
        &self,
        url: &TestUrl,
        info: &UriInfo,
        schemes: &[String],
    ) -> Result<(), FailureReason> {
        if !schemes.is_empty()
            && !schemes
                .iter()
                .any(|scheme| *scheme == url.scheme || is_substituted(scheme))
        {
            return Err(FailureReason::SchemeMismatch(schemes.to_vec()));
        }

        if !info.host_ports.is_empty()
            && !info
                .host_ports
                .iter()
                .any(|pair| host_port_matches(url, pair))
        {
            return Err(FailureReason::HostMismatch(info.host_ports.clone()));
        }

        if !info.paths.is_empty()
            && !info
                .paths
                .iter()
                .any(|matcher| is_substituted(&matcher.pattern) || matcher.matches(&url.path))
        {
            let declared_upper = info
                .paths
                .iter()
                .any(|m| !is_substituted(&m.pattern) && m.pattern.chars().any(char::is_uppercase));
            let url_upper = url.path.chars().any(char::is_uppercase);
            return Err(FailureReason::PathMismatch {
                matchers: info.paths.clone(),
                case_sensitive_note: declared_upper || url_upper,
            });
        }

        Ok(())
    }
}

fn host_port_matches(url: &TestUrl, pair: &HostPort) -> bool {
    let host_ok = is_substituted(&pair.host) || host_matches(&url.host, &pair.host);
    let port_ok = match &pair.port {
        None => true,
        Some(port) if is_substituted(port) => true,
        Some(port) => match (port.parse::<u16>(), url.effective_port()) {
            (Ok(declared), Some(actual)) => declared == actual,
            _ => false,
        },
    };
    host_ok && port_ok
}

/// Exact match, or suffix match for a pattern starting with `*`
pub fn host_matches(host: &str, pattern: &str) -> bool {
    match pattern.strip_prefix('*') {
        Some(suffix) => host.ends_with(suffix),
        None => host == pattern,
    }
}
