//! Attribute value substitution
//!
//! Manifest values may refer to string resources (`@string/host`) or to
//! build placeholders (`${applicationId}`). Checks run on the substituted
//! value when it can be determined statically and fall back to the raw
//! text otherwise.

use crate::parser::xml::StringResources;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Clone, Copy, Default)]
pub struct ValueResolver<'a> {
    resources: Option<&'a StringResources>,
    placeholders: Option<&'a HashMap<String, String>>,
}

impl<'a> ValueResolver<'a> {
    /// A resolver that substitutes nothing
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resources(mut self, resources: &'a StringResources) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn with_placeholders(mut self, placeholders: &'a HashMap<String, String>) -> Self {
        self.placeholders = Some(placeholders);
        self
    }

    /// Substituted form of `raw`, or `raw` itself when it cannot be resolved
    pub fn resolve<'v>(&self, raw: &'v str) -> Cow<'v, str> {
        if raw.starts_with('@') || raw.starts_with('?') {
            return match self.resolve_resource(raw) {
                Some(value) => {
                    trace!("Resolved {} to {}", raw, value);
                    Cow::Owned(value.to_string())
                }
                None => Cow::Borrowed(raw),
            };
        }
        if raw.contains("${") {
            if let Some(value) = self.resolve_placeholders(raw) {
                trace!("Resolved {} to {}", raw, value);
                return Cow::Owned(value);
            }
        }
        Cow::Borrowed(raw)
    }

    /// `@string/name` and `@pkg:string/name`; framework references stay unresolved
    fn resolve_resource(&self, raw: &str) -> Option<&'a str> {
        let reference = raw.strip_prefix('@')?;
        let (package, rest) = match reference.split_once(':') {
            Some((package, rest)) => (Some(package), rest),
            None => (None, reference),
        };
        if package == Some("android") {
            return None;
        }
        let (kind, name) = rest.split_once('/')?;
        if kind != "string" || name.is_empty() {
            return None;
        }
        self.resources?.get(name)
    }

    /// Replace every `${name}`; `None` when any name is unknown
    fn resolve_placeholders(&self, raw: &str) -> Option<String> {
        let placeholders = self.placeholders?;
        let mut result = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}')?;
            let value = placeholders.get(&after[..end])?;
            result.push_str(value);
            rest = &after[end + 1..];
        }
        result.push_str(rest);
        Some(result)
    }
}

/// Data binding expression such as `@{viewModel.host}` or `@={...}`
pub fn is_data_binding_expression(value: &str) -> bool {
    value.starts_with("@{") || value.starts_with("@={")
}

/// Value still containing an unresolved `${...}` placeholder
pub fn is_manifest_placeholder(value: &str) -> bool {
    value.contains("${")
}

/// Whether the real value is only known after build or runtime substitution
pub fn is_substituted(value: &str) -> bool {
    is_data_binding_expression(value) || is_manifest_placeholder(value)
}
