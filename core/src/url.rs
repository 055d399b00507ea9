//! Absolute endpoint URLs built from relative path templates.
//!
//! # Design
//! A template such as `articles/{0}/tags/{1}` is resolved once, when the
//! `ApiUrl` is created: each `{n}` becomes the path-segment-encoded `Display`
//! form of the n-th value. Query parameters are kept unencoded in insertion
//! order and only escaped when the URL is rendered, so rendering is a pure
//! function of the builder's state and can be repeated.

use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS, NON_ALPHANUMERIC};
use uuid::Uuid;

use crate::config::ClientConfiguration;
use crate::error::ApiError;

/// Characters escaped inside a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Everything but RFC 3986 unreserved characters is escaped in a query pair.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Which configured origin a URL is rooted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressKind {
    #[default]
    Plain,
    Secure,
}

/// Escape `value` for use as one path segment.
pub fn encode_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Escape `value` for use as a query-string name or value.
pub fn encode_query_component(value: &str) -> String {
    utf8_percent_encode(value, QUERY_COMPONENT).to_string()
}

/// Substitute `{n}` placeholders in `template` with the encoded n-th value.
///
/// Values beyond the highest placeholder are ignored. `{{` and `}}` produce
/// literal braces; braces around anything but an index are copied as-is.
///
/// # Errors
/// `MissingTemplateValue` if a placeholder index has no corresponding value.
pub fn resolve(template: &str, values: &[&dyn fmt::Display]) -> Result<String, ApiError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }

        if let Some(end) = tail.find('}').filter(|_| tail.starts_with('{')) {
            let inner = &tail[1..end];
            if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
                let index = inner.parse::<usize>().unwrap_or(usize::MAX);
                let value = values.get(index).ok_or_else(|| ApiError::MissingTemplateValue {
                    template: template.to_string(),
                    index,
                    supplied: values.len(),
                })?;
                out.push_str(&encode_path_segment(&value.to_string()));
                rest = &tail[end + 1..];
                continue;
            }
        }

        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// A value that may appear in a query string.
///
/// `None` means "absent": the parameter is left out entirely. Every present
/// value, including `0`, `false` and the empty string, is written.
pub trait QueryValue {
    fn to_query_value(&self) -> Option<String>;
}

macro_rules! display_query_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl QueryValue for $ty {
                fn to_query_value(&self) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )*
    };
}

display_query_value!(
    str, String, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32,
    f64, Uuid,
);

impl QueryValue for DateTime<Utc> {
    fn to_query_value(&self) -> Option<String> {
        Some(self.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl QueryValue for DateTime<FixedOffset> {
    fn to_query_value(&self) -> Option<String> {
        Some(self.to_rfc3339_opts(SecondsFormat::Millis, false))
    }
}

impl<T: QueryValue> QueryValue for Option<T> {
    fn to_query_value(&self) -> Option<String> {
        self.as_ref().and_then(T::to_query_value)
    }
}

impl<T: QueryValue> QueryValue for [T] {
    fn to_query_value(&self) -> Option<String> {
        let items: Vec<String> = self.iter().filter_map(T::to_query_value).collect();
        Some(items.join(","))
    }
}

impl<T: QueryValue> QueryValue for Vec<T> {
    fn to_query_value(&self) -> Option<String> {
        self.as_slice().to_query_value()
    }
}

impl<T: QueryValue + ?Sized> QueryValue for &T {
    fn to_query_value(&self) -> Option<String> {
        (**self).to_query_value()
    }
}

/// An absolute API URL: origin, optional application segment, resolved
/// relative path and an ordered query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiUrl {
    kind: AddressKind,
    address: String,
    application: String,
    path: String,
    query: Vec<(String, String)>,
}

impl ApiUrl {
    /// A URL rooted at `address` with an already resolved relative `path`.
    pub fn new(kind: AddressKind, address: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind,
            address: address.into(),
            application: String::new(),
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Resolve `template` and root it at the configured address of `kind`,
    /// under the configured application identifier.
    pub fn from_template(
        config: &ClientConfiguration,
        kind: AddressKind,
        template: &str,
        values: &[&dyn fmt::Display],
    ) -> Result<Self, ApiError> {
        let path = resolve(template, values)?;
        Ok(Self::new(kind, config.address(kind), path)
            .with_application(config.application_identifier()))
    }

    /// Insert `identifier` as the first path segment after the origin.
    /// An empty identifier adds nothing.
    #[must_use]
    pub fn with_application(mut self, identifier: impl Into<String>) -> Self {
        self.application = identifier.into();
        self
    }

    pub fn address_kind(&self) -> AddressKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query pairs in insertion order, unencoded.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Append `name=value` unless `value` is absent.
    pub fn append_query<V: QueryValue + ?Sized>(&mut self, name: &str, value: &V) -> &mut Self {
        if let Some(value) = value.to_query_value() {
            self.query.push((name.to_string(), value));
        }
        self
    }

    #[must_use]
    pub fn with_query<V: QueryValue + ?Sized>(mut self, name: &str, value: &V) -> Self {
        self.append_query(name, value);
        self
    }
}

impl fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.address.trim_end_matches('/'))?;

        let application = self.application.trim_matches('/');
        if !application.is_empty() {
            write!(f, "/{}", encode_path_segment(application))?;
        }

        let path = self.path.trim_start_matches('/');
        if !path.is_empty() {
            write!(f, "/{path}")?;
        }

        let mut separator = if path.contains('?') { '&' } else { '?' };
        for (name, value) in &self.query {
            write!(
                f,
                "{separator}{}={}",
                encode_query_component(name),
                encode_query_component(value)
            )?;
            separator = '&';
        }
        Ok(())
    }
}
