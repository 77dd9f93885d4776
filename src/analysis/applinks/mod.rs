//! Intent filter URI validation and `tools:validation` test URL matching
//!
//! The pipeline for one activity is: collect each intent filter
//! ([`IntentFilterData`]), validate it while turning it into a [`UriInfo`],
//! then match every test URL against all of the activity's infos.

mod data_tags;
mod matcher;
mod pattern;
mod test_url;
mod uri_info;
mod values;

pub use data_tags::{DataAttribute, DataTag, DataValue, IntentFilterData};
pub use matcher::{host_matches, EmptySchemePolicy, FailureReason, MatchFailure, Matcher};
pub use pattern::{match_glob, PathKind, PathMatcher};
pub use test_url::{default_port, TestUrl, UrlParseError};
pub use uri_info::{is_web_scheme, HostPort, UriInfo, UriInfoBuilder};
pub use values::{is_substituted, ValueResolver};

use crate::analysis::{Diagnostic, DiagnosticSink, Issue, Location};
use crate::parser::xml::{Element, Manifest, Span, ANDROID_URI, TOOLS_URI};
use data_tags::ACTION_VIEW;
use std::path::Path;
use tracing::{debug, trace};

const TAG_ACTIVITY: &str = "activity";
const TAG_ACTIVITY_ALIAS: &str = "activity-alias";
const TAG_INTENT_FILTER: &str = "intent-filter";
const TAG_VALIDATION: &str = "validation";
const ATTR_TEST_URL: &str = "testUrl";

/// What the checks of one file need besides the element being checked
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub file: &'a Path,
    pub resolver: ValueResolver<'a>,
}

impl<'a> CheckContext<'a> {
    pub fn new(file: &'a Path, resolver: ValueResolver<'a>) -> Self {
        Self { file, resolver }
    }

    pub fn for_manifest(manifest: &'a Manifest, resolver: ValueResolver<'a>) -> Self {
        Self::new(&manifest.path, resolver)
    }

    pub fn location(&self, span: Span) -> Location {
        Location::new(self.file, span)
    }
}

/// Validates intent filters and checks `tools:validation` test URLs
#[derive(Debug, Clone, Default)]
pub struct AppLinksValidDetector {
    matcher: Matcher,
}

impl AppLinksValidDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_empty_scheme(mut self, policy: EmptySchemePolicy) -> Self {
        self.matcher = Matcher::new(policy);
        self
    }

    /// Check every activity, activity alias and intent filter of a manifest
    pub fn check_manifest(
        &self,
        manifest: &Manifest,
        resolver: &ValueResolver<'_>,
        sink: &mut dyn DiagnosticSink,
    ) {
        let context = CheckContext::for_manifest(manifest, *resolver);
        for element in manifest.root().descendants() {
            match element.local_name.as_str() {
                TAG_INTENT_FILTER => self.check_intent_filter(element, &context, sink),
                TAG_ACTIVITY | TAG_ACTIVITY_ALIAS => {
                    if let Some(name) = element.attribute_ns(ANDROID_URI, "name") {
                        debug!("Checking {}", manifest.resolve_class_name(&name.value));
                    }
                    self.check_activity(element, &context, sink)
                }
                _ => {}
            }
        }
    }

    /// Checks that apply to intent filters of any component
    pub fn check_intent_filter(
        &self,
        intent_filter: &Element,
        context: &CheckContext<'_>,
        sink: &mut dyn DiagnosticSink,
    ) {
        let data = IntentFilterData::aggregate(intent_filter, &context.resolver);
        if data.data_tags.len() <= 1 {
            return;
        }

        for tag in &data.data_tags {
            let parts = usize::from(tag.attribute(DataAttribute::Scheme).is_some())
                + usize::from(tag.attribute(DataAttribute::Host).is_some())
                + tag.paths().count();
            if parts > 1 {
                sink.report(Diagnostic::new(
                    Issue::IntentFilterUniqueDataAttributes,
                    context.location(tag.element.span),
                    "Consider splitting data tag into multiple tags with individual attributes \
                     to avoid confusion",
                ));
            }
        }
    }

    /// Activity level checks, including test URL validation
    pub fn check_activity(
        &self,
        activity: &Element,
        context: &CheckContext<'_>,
        sink: &mut dyn DiagnosticSink,
    ) {
        let infos = self.check_activity_intent_filters_and_get_uri_infos(activity, context, sink);

        let exported = activity
            .attribute_ns(ANDROID_URI, "exported")
            .map(|attr| attr.value.trim().is_empty() || attr.value == "true")
            .unwrap_or(true);
        if !exported && infos.iter().any(|info| info.has_action(ACTION_VIEW)) {
            sink.report(Diagnostic::new(
                Issue::AppLinkUrlError,
                context.location(activity.span),
                "Activity supporting ACTION_VIEW is not exported",
            ));
        }

        for validation in activity.children_named(TAG_VALIDATION) {
            if validation.namespace.as_deref() != Some(TOOLS_URI) {
                sink.report(Diagnostic::new(
                    Issue::TestAppLink,
                    context.location(validation.name_span),
                    "Validation nodes should be in the tools: namespace to ensure they are \
                     removed from the manifest at build time",
                ));
                continue;
            }

            let Some(test_url) = validation.attribute(ATTR_TEST_URL) else {
                sink.report(Diagnostic::new(
                    Issue::AppLinkUrlError,
                    context.location(validation.span),
                    "Expected testUrl attribute",
                ));
                continue;
            };

            let message = match TestUrl::parse(&test_url.value) {
                Ok(url) => {
                    trace!("Matching test URL {}", url);
                    self.check_test_url_matches_at_least_one_info(&url, &infos)
                }
                Err(e) => Some(format!("Invalid test URL: {}", e)),
            };
            if let Some(message) = message {
                sink.report(Diagnostic::new(
                    Issue::TestAppLink,
                    context.location(test_url.value_span),
                    message,
                ));
            }
        }
    }

    /// Validate the activity's intent filters and return one [`UriInfo`] per filter
    pub fn check_activity_intent_filters_and_get_uri_infos(
        &self,
        activity: &Element,
        context: &CheckContext<'_>,
        sink: &mut dyn DiagnosticSink,
    ) -> Vec<UriInfo> {
        let explicit_validation = activity.children_named(TAG_VALIDATION).next().is_some();
        let builder = UriInfoBuilder::new(context).explicit_validation(explicit_validation);

        activity
            .children_named(TAG_INTENT_FILTER)
            .map(|intent_filter| {
                let data = IntentFilterData::aggregate(intent_filter, &context.resolver);
                builder.build(&data, sink)
            })
            .collect()
    }

    /// `None` when some info accepts `url`, otherwise the rejection message
    pub fn check_test_url_matches_at_least_one_info(
        &self,
        url: &TestUrl,
        infos: &[UriInfo],
    ) -> Option<String> {
        self.matcher
            .check(url, infos)
            .err()
            .map(|failure| failure.to_string())
    }
}
