//! Turns an aggregated intent filter into a matchable [`UriInfo`]
//!
//! Building also validates every URI attribute and the filter structure,
//! reporting each problem at the attribute or element it concerns. All
//! problems of a filter are reported; none of them stops the build.

use super::data_tags::{
    DataAttribute, DataValue, IntentFilterData, ACTION_VIEW, CATEGORY_BROWSABLE, CATEGORY_DEFAULT,
};
use super::pattern::{PathKind, PathMatcher};
use super::values::is_substituted;
use super::CheckContext;
use crate::analysis::{Diagnostic, DiagnosticSink, Issue};
use crate::parser::xml::{Element, Span, ANDROID_URI};
use serde::Serialize;
use std::fmt;
use tracing::trace;

/// Schemes assumed when a filter declares a mime type but no scheme
pub const IMPLICIT_SCHEMES: [&str; 2] = ["file", "content"];

const VALUE_TRUE: &str = "true";
const VALUE_FALSE: &str = "false";

pub fn is_web_scheme(scheme: &str) -> bool {
    scheme == "http" || scheme == "https"
}

/// A host with the port declared on the same `<data>` tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HostPort {
    pub host: String,
    pub port: Option<String>,
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.port {
            Some(port) => write!(f, "host+port {}:{}", self.host, port),
            None => write!(f, "host {}", self.host),
        }
    }
}

/// The URI constraints of one intent filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UriInfo {
    pub schemes: Vec<String>,
    pub host_ports: Vec<HostPort>,
    pub paths: Vec<PathMatcher>,
    pub mime_types: Vec<String>,
    pub actions: Vec<String>,
    pub categories: Vec<String>,
    pub auto_verify: Option<String>,

    /// Whether the filter has any `<data>` tag
    pub has_data: bool,

    /// Span of the `<intent-filter>` element
    pub span: Span,
}

impl UriInfo {
    pub fn has_action(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }

    /// Declared schemes, or the implicit ones of a mime-type-only filter
    pub fn effective_schemes(&self) -> Vec<String> {
        if self.schemes.is_empty() && !self.mime_types.is_empty() {
            IMPLICIT_SCHEMES.iter().map(|s| s.to_string()).collect()
        } else {
            self.schemes.clone()
        }
    }
}

/// Builds [`UriInfo`] values, reporting attribute and structure problems
pub struct UriInfoBuilder<'c> {
    context: &'c CheckContext<'c>,
    explicit_validation: bool,
}

impl<'c> UriInfoBuilder<'c> {
    pub fn new(context: &'c CheckContext<'c>) -> Self {
        Self {
            context,
            explicit_validation: false,
        }
    }

    /// Run the under-specification checks even without ACTION_VIEW, as is
    /// done for activities carrying `tools:validation` elements
    pub fn explicit_validation(mut self, enabled: bool) -> Self {
        self.explicit_validation = enabled;
        self
    }

    pub fn build(&self, data: &IntentFilterData<'_>, sink: &mut dyn DiagnosticSink) -> UriInfo {
        let info = UriInfo {
            schemes: data.schemes(),
            host_ports: data
                .host_ports()
                .into_iter()
                .map(|(host, port)| HostPort { host, port })
                .collect(),
            paths: data
                .paths()
                .into_iter()
                .filter_map(|(kind, pattern)| path_kind(kind).map(|k| PathMatcher::new(k, pattern)))
                .collect(),
            mime_types: data.mime_types(),
            actions: data.actions.clone(),
            categories: data.categories.clone(),
            auto_verify: data.auto_verify.clone(),
            has_data: !data.data_tags.is_empty(),
            span: data.element.span,
        };

        let has_view = data.has_action(ACTION_VIEW);
        let has_browsable = data.has_category(CATEGORY_BROWSABLE);

        if data.data_tags.is_empty() {
            if has_view {
                self.report(sink, data.element.span, "Missing data element");
            }
            return info;
        }

        self.check_mime_types(data, sink);
        self.check_schemes(data, sink);
        self.check_hosts(data, sink);
        self.check_ports(data, sink);
        self.check_paths(data, sink);
        self.check_app_link(data, &info, sink);
        self.check_missing_parts(data, &info, sink);

        if has_view && info.schemes.iter().any(|s| is_web_scheme(s)) && !has_browsable {
            self.report(
                sink,
                data.element.span,
                "Activity supporting ACTION_VIEW is not set as BROWSABLE",
            );
        }

        trace!(
            "Built uri info at line {}: {} schemes, {} hosts, {} paths",
            info.span.start.line,
            info.schemes.len(),
            info.host_ports.len(),
            info.paths.len()
        );
        info
    }

    fn check_mime_types(&self, data: &IntentFilterData<'_>, sink: &mut dyn DiagnosticSink) {
        for mime in data.values(DataAttribute::MimeType) {
            if is_substituted(&mime.value) {
                continue;
            }
            if has_upper_case(&mime.value) {
                self.report(
                    sink,
                    mime.attribute.value_span,
                    format!(
                        "Mime-type matching is case sensitive and should only use lower-case characters{}",
                        resolved_note(mime)
                    ),
                );
            }
        }
    }

    fn check_schemes(&self, data: &IntentFilterData<'_>, sink: &mut dyn DiagnosticSink) {
        for scheme in data.values(DataAttribute::Scheme) {
            if is_substituted(&scheme.value) {
                continue;
            }
            if scheme.value.trim().is_empty() {
                self.report_empty(sink, scheme);
                continue;
            }
            if scheme.value.ends_with(':') {
                self.report(
                    sink,
                    scheme.attribute.value_span,
                    "Don't include trailing colon in the scheme declaration",
                );
            } else if has_upper_case(&scheme.value) {
                self.report(
                    sink,
                    scheme.attribute.value_span,
                    format!(
                        "Scheme matching is case sensitive and should only use lower-case characters{}",
                        resolved_note(scheme)
                    ),
                );
            }
        }
    }

    fn check_hosts(&self, data: &IntentFilterData<'_>, sink: &mut dyn DiagnosticSink) {
        for host in data.values(DataAttribute::Host) {
            if is_substituted(&host.value) {
                continue;
            }
            if host.value.trim().is_empty() {
                self.report_empty(sink, host);
                continue;
            }
            if host.value.rfind('*').is_some_and(|index| index > 0) {
                self.report(
                    sink,
                    host.attribute.value_span,
                    "The host wildcard (*) can only be the first character",
                );
            } else if has_upper_case(&host.value) {
                self.report(
                    sink,
                    host.attribute.value_span,
                    format!(
                        "Host matching is case sensitive and should only use lower-case characters{}",
                        resolved_note(host)
                    ),
                );
            }
        }
    }

    fn check_ports(&self, data: &IntentFilterData<'_>, sink: &mut dyn DiagnosticSink) {
        for port in data.values(DataAttribute::Port) {
            if is_substituted(&port.value) {
                continue;
            }
            if port.value.trim().is_empty() {
                self.report_empty(sink, port);
                continue;
            }
            if !is_valid_port(&port.value) {
                self.report(sink, port.attribute.value_span, "not a valid port number");
            }
        }

        // A port only applies to the host on its own tag
        for tag in &data.data_tags {
            if let Some(port) = tag.attribute(DataAttribute::Port) {
                if tag.attribute(DataAttribute::Host).is_none() {
                    self.report(
                        sink,
                        port.attribute.value_span,
                        "The port must be specified in the same <data> element as the host",
                    );
                }
            }
        }
    }

    fn check_paths(&self, data: &IntentFilterData<'_>, sink: &mut dyn DiagnosticSink) {
        let auto_verify = data.auto_verify_is(VALUE_TRUE);

        for tag in &data.data_tags {
            for (kind, path) in tag.paths() {
                let qualified = &path.attribute.qualified_name;
                let value = path.value.as_str();
                if path.raw.trim().is_empty() || value.trim().is_empty() {
                    self.report_empty(sink, path);
                    continue;
                }
                if is_substituted(value) {
                    continue;
                }

                let starts_with_slash = value.starts_with('/');
                if matches!(kind, DataAttribute::Path | DataAttribute::PathPrefix)
                    && !starts_with_slash
                {
                    self.report(
                        sink,
                        path.attribute.value_span,
                        format!("{} attribute should start with /, but it is {}", qualified, value),
                    );
                }
                if kind == DataAttribute::PathPattern && !starts_with_slash && !value.starts_with(".*")
                {
                    self.report(
                        sink,
                        path.attribute.value_span,
                        format!(
                            "{} attribute should start with / or .*, but it is {}",
                            qualified, value
                        ),
                    );
                }

                if auto_verify && has_query_or_fragment(value) {
                    self.report(
                        sink,
                        tag.element.span,
                        "App link matching does not support query parameters or fragments, \
                         unless using <uri-relative-filter-group> (introduced in Android 15)",
                    );
                }

                if value.contains('?')
                    && matches!(kind, DataAttribute::PathPattern | DataAttribute::PathAdvancedPattern)
                {
                    self.report(
                        sink,
                        path.attribute.value_span,
                        format!("{} does not support ? as a Regex character", kind.local_name()),
                    );
                }
            }
        }
    }

    /// autoVerify suggestion and App Link requirements
    fn check_app_link(&self, data: &IntentFilterData<'_>, info: &UriInfo, sink: &mut dyn DiagnosticSink) {
        let looks_like_app_link = !info.schemes.is_empty()
            && info.schemes.iter().all(|s| is_web_scheme(s))
            && !info.host_ports.is_empty()
            && data.has_action(ACTION_VIEW)
            && data.has_category(CATEGORY_BROWSABLE)
            && data.has_category(CATEGORY_DEFAULT)
            && !data.auto_verify_is(VALUE_TRUE)
            && !data.auto_verify_is(VALUE_FALSE);

        if looks_like_app_link {
            // Name the attribute with the prefix the manifest binds
            let prefix = data.element.lookup_prefix(ANDROID_URI).unwrap_or("android");
            sink.report(Diagnostic::new(
                Issue::AppLinkWarning,
                self.context.location(data.element.name_span),
                format!(
                    "This intent filter has the format of an Android App Link but is missing the \
                     autoVerify attribute; add {prefix}:autoVerify=\"true\" to ensure your domain \
                     will be validated and enable App Link-related warnings. If you do not want \
                     clicked URLs to bring the user to your app, remove the \
                     android.intent.category.BROWSABLE category, or set \
                     {prefix}:autoVerify=\"false\" to make it clear this is not intended to be an \
                     Android App Link."
                ),
            ));
        }

        if has_auto_verify_but_invalid_app_link(data, info)
            && !has_elements_required_for_app_links(data, info)
        {
            self.report(
                sink,
                data.element.span,
                "Missing required elements/attributes for Android App Links",
            );
        }
    }

    /// Missing scheme, URI or host
    fn check_missing_parts(&self, data: &IntentFilterData<'_>, info: &UriInfo, sink: &mut dyn DiagnosticSink) {
        let has_view = data.has_action(ACTION_VIEW);
        if !(has_view || self.explicit_validation) {
            return;
        }
        let Some(first_data) = data.data_tags.first().map(|tag| tag.element) else {
            return;
        };

        let missing_scheme = info.schemes.is_empty()
            && (!info.paths.is_empty() || !info.host_ports.is_empty());
        if missing_scheme {
            self.report_at(sink, first_data, "At least one scheme must be specified");
        }

        if !missing_scheme && has_view && info.schemes.is_empty() && info.mime_types.is_empty() {
            self.report_at(sink, first_data, "VIEW actions require a URI");
        }

        if !info.paths.is_empty() && info.host_ports.is_empty() {
            self.report_at(sink, first_data, "At least one host must be specified");
        }
    }

    fn report(&self, sink: &mut dyn DiagnosticSink, span: Span, message: impl Into<String>) {
        sink.report(Diagnostic::new(
            Issue::AppLinkUrlError,
            self.context.location(span),
            message,
        ));
    }

    fn report_at(&self, sink: &mut dyn DiagnosticSink, element: &Element, message: &str) {
        self.report(sink, element.span, message);
    }

    fn report_empty(&self, sink: &mut dyn DiagnosticSink, value: &DataValue<'_>) {
        self.report(
            sink,
            value.attribute.span,
            format!("{} cannot be empty", value.attribute.qualified_name),
        );
    }
}

/// `autoVerify="true"` on a filter that cannot be a valid App Link
pub fn has_auto_verify_but_invalid_app_link(data: &IntentFilterData<'_>, info: &UriInfo) -> bool {
    data.auto_verify_is(VALUE_TRUE)
        && (!has_elements_required_for_app_links(data, info)
            || info
                .schemes
                .iter()
                .any(|s| !is_substituted(s) && !is_web_scheme(s)))
}

fn has_elements_required_for_app_links(data: &IntentFilterData<'_>, info: &UriInfo) -> bool {
    let complete = data.has_action(ACTION_VIEW)
        && data.has_category(CATEGORY_DEFAULT)
        && data.has_category(CATEGORY_BROWSABLE)
        && info
            .schemes
            .iter()
            .any(|s| is_substituted(s) || is_web_scheme(s))
        && !info.host_ports.is_empty();
    // hosts without any scheme are reported as a missing scheme instead
    complete || (info.schemes.is_empty() && !info.host_ports.is_empty())
}

fn path_kind(attribute: DataAttribute) -> Option<PathKind> {
    match attribute {
        DataAttribute::Path => Some(PathKind::Literal),
        DataAttribute::PathPrefix => Some(PathKind::Prefix),
        DataAttribute::PathPattern => Some(PathKind::Glob),
        DataAttribute::PathSuffix => Some(PathKind::Suffix),
        DataAttribute::PathAdvancedPattern => Some(PathKind::Advanced),
        _ => None,
    }
}

fn has_upper_case(value: &str) -> bool {
    value.chars().any(char::is_uppercase)
}

fn is_valid_port(value: &str) -> bool {
    value.parse::<u32>().is_ok_and(|port| port <= u16::MAX as u32)
}

/// Note appended when substitution changed the reported value
fn resolved_note(value: &DataValue<'_>) -> String {
    if value.raw != value.value {
        format!(" (without placeholders, value is {})", value.value)
    } else {
        String::new()
    }
}

/// Whether a declared path carries `?query` parameters or a `#fragment`
fn has_query_or_fragment(path: &str) -> bool {
    let query_parts: Vec<&str> = path.split('?').collect();
    let has_query = query_parts.len() == 2
        && query_parts[1]
            .split('#')
            .next()
            .unwrap_or_default()
            .split('&')
            .any(|param| !param.trim().is_empty());

    let fragment_parts: Vec<&str> = path.split('#').collect();
    let has_fragment = fragment_parts.len() == 2
        && !fragment_parts[1]
            .split('?')
            .next()
            .unwrap_or_default()
            .trim()
            .is_empty();

    has_query || has_fragment
}
