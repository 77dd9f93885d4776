//! Collects the actions, categories and `<data>` tags of one intent filter
//!
//! Android lets the attributes of a URI be spread over several sibling
//! `<data>` tags which then combine. Each tag keeps its own attributes here
//! so that a port stays paired with the host declared beside it.

use super::values::ValueResolver;
use crate::parser::xml::{Attribute, Element, ANDROID_URI};

pub const TAG_ACTION: &str = "action";
pub const TAG_CATEGORY: &str = "category";
pub const TAG_DATA: &str = "data";

pub const ACTION_VIEW: &str = "android.intent.action.VIEW";
pub const CATEGORY_BROWSABLE: &str = "android.intent.category.BROWSABLE";
pub const CATEGORY_DEFAULT: &str = "android.intent.category.DEFAULT";

/// Attributes of `<data>` that describe a URI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataAttribute {
    Scheme,
    Host,
    Port,
    Path,
    PathPrefix,
    PathPattern,
    PathSuffix,
    PathAdvancedPattern,
    MimeType,
}

impl DataAttribute {
    pub const ALL: [DataAttribute; 9] = [
        DataAttribute::Scheme,
        DataAttribute::Host,
        DataAttribute::Port,
        DataAttribute::Path,
        DataAttribute::PathPrefix,
        DataAttribute::PathPattern,
        DataAttribute::PathSuffix,
        DataAttribute::PathAdvancedPattern,
        DataAttribute::MimeType,
    ];

    /// Path attributes in the order they are checked and listed
    pub const PATHS: [DataAttribute; 5] = [
        DataAttribute::Path,
        DataAttribute::PathPrefix,
        DataAttribute::PathPattern,
        DataAttribute::PathAdvancedPattern,
        DataAttribute::PathSuffix,
    ];

    pub fn local_name(&self) -> &'static str {
        match self {
            DataAttribute::Scheme => "scheme",
            DataAttribute::Host => "host",
            DataAttribute::Port => "port",
            DataAttribute::Path => "path",
            DataAttribute::PathPrefix => "pathPrefix",
            DataAttribute::PathPattern => "pathPattern",
            DataAttribute::PathSuffix => "pathSuffix",
            DataAttribute::PathAdvancedPattern => "pathAdvancedPattern",
            DataAttribute::MimeType => "mimeType",
        }
    }

    pub fn from_local_name(name: &str) -> Option<DataAttribute> {
        DataAttribute::ALL
            .into_iter()
            .find(|attribute| attribute.local_name() == name)
    }

    pub fn is_path(&self) -> bool {
        DataAttribute::PATHS.contains(self)
    }
}

/// An attribute value before and after substitution
#[derive(Debug, Clone)]
pub struct DataValue<'a> {
    pub attribute: &'a Attribute,

    /// Text as written in the manifest
    pub raw: &'a str,

    /// Value after resource and placeholder substitution
    pub value: String,
}

impl<'a> DataValue<'a> {
    fn new(attribute: &'a Attribute, resolver: &ValueResolver<'_>) -> Self {
        Self {
            attribute,
            raw: &attribute.raw_value,
            value: resolver.resolve(&attribute.value).into_owned(),
        }
    }
}

/// One `<data>` element and the URI attributes it declares
#[derive(Debug, Clone)]
pub struct DataTag<'a> {
    pub element: &'a Element,
    values: Vec<(DataAttribute, DataValue<'a>)>,
}

impl<'a> DataTag<'a> {
    fn new(element: &'a Element, resolver: &ValueResolver<'_>) -> Self {
        let values = DataAttribute::ALL
            .into_iter()
            .filter_map(|kind| {
                element
                    .attribute_ns(ANDROID_URI, kind.local_name())
                    .map(|attribute| (kind, DataValue::new(attribute, resolver)))
            })
            .collect();
        Self { element, values }
    }

    pub fn attribute(&self, kind: DataAttribute) -> Option<&DataValue<'a>> {
        self.values
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, value)| value)
    }

    /// Declared path attributes in [`DataAttribute::PATHS`] order
    pub fn paths(&self) -> impl Iterator<Item = (DataAttribute, &DataValue<'a>)> + '_ {
        DataAttribute::PATHS
            .into_iter()
            .filter_map(move |kind| self.attribute(kind).map(|value| (kind, value)))
    }
}

/// Everything one `<intent-filter>` declares
#[derive(Debug, Clone)]
pub struct IntentFilterData<'a> {
    pub element: &'a Element,
    pub auto_verify: Option<String>,
    pub actions: Vec<String>,
    pub categories: Vec<String>,
    pub data_tags: Vec<DataTag<'a>>,
}

impl<'a> IntentFilterData<'a> {
    /// Collect the children of `intent_filter` in document order
    pub fn aggregate(intent_filter: &'a Element, resolver: &ValueResolver<'_>) -> Self {
        let filter_value = |name: &str| {
            intent_filter
                .attribute_ns(ANDROID_URI, name)
                .map(|attr| resolver.resolve(&attr.value).into_owned())
        };

        let mut actions = Vec::new();
        let mut categories = Vec::new();
        let mut data_tags = Vec::new();
        for child in intent_filter.children() {
            let name = || {
                child
                    .attribute_ns(ANDROID_URI, "name")
                    .map(|attr| resolver.resolve(&attr.value).into_owned())
            };
            match child.local_name.as_str() {
                TAG_ACTION => actions.extend(name()),
                TAG_CATEGORY => categories.extend(name()),
                TAG_DATA => data_tags.push(DataTag::new(child, resolver)),
                _ => {}
            }
        }

        Self {
            element: intent_filter,
            auto_verify: filter_value("autoVerify"),
            actions,
            categories,
            data_tags,
        }
    }

    pub fn has_action(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn auto_verify_is(&self, value: &str) -> bool {
        self.auto_verify.as_deref() == Some(value)
    }

    /// Every declared value of `kind`, in document order
    pub fn values(&self, kind: DataAttribute) -> impl Iterator<Item = &DataValue<'a>> + '_ {
        self.data_tags
            .iter()
            .filter_map(move |tag| tag.attribute(kind))
    }

    pub fn schemes(&self) -> Vec<String> {
        distinct(self.values(DataAttribute::Scheme).map(|v| v.value.clone()))
    }

    pub fn mime_types(&self) -> Vec<String> {
        distinct(self.values(DataAttribute::MimeType).map(|v| v.value.clone()))
    }

    /// Hosts with the port declared on the same tag
    pub fn host_ports(&self) -> Vec<(String, Option<String>)> {
        distinct(self.data_tags.iter().filter_map(|tag| {
            let host = tag.attribute(DataAttribute::Host)?;
            let port = tag.attribute(DataAttribute::Port).map(|p| p.value.clone());
            Some((host.value.clone(), port))
        }))
    }

    /// Declared paths, tag by tag
    pub fn paths(&self) -> Vec<(DataAttribute, String)> {
        distinct(
            self.data_tags
                .iter()
                .flat_map(|tag| tag.paths().map(|(kind, value)| (kind, value.value.clone()))),
        )
    }
}

fn distinct<T: PartialEq>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut result = Vec::new();
    for item in items {
        if !result.contains(&item) {
            result.push(item);
        }
    }
    result
}
