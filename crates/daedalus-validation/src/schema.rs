//! Declarative request and response schemas.

use std::fmt;
use std::str::FromStr;

use http::StatusCode;
use indexmap::IndexMap;

use crate::error::ConfigurationError;
use crate::media_type;
use crate::provider::{Provider, ProviderId};

/// Media-type keyed schemas. Keys are stored normalized.
#[derive(Debug, Clone)]
pub struct ContentMap<S> {
    entries: IndexMap<String, S>,
}

impl<S> ContentMap<S> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Adds or replaces the schema for `media_type`.
    #[must_use]
    pub fn with(mut self, media_type: &str, schema: S) -> Self {
        self.insert(media_type, schema);
        self
    }

    /// Adds or replaces the schema for `media_type`.
    pub fn insert(&mut self, media_type: &str, schema: S) {
        self.entries.insert(media_type::normalize(media_type), schema);
    }

    /// Returns the schema declared for exactly `pattern`.
    pub fn get(&self, pattern: &str) -> Option<&S> {
        self.entries.get(pattern)
    }

    /// Declared media types in declaration order.
    pub fn media_types(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Iterates over `(media type, schema)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &S)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of declared media types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S> Default for ContentMap<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, S> FromIterator<(&'a str, S)> for ContentMap<S> {
    fn from_iter<I: IntoIterator<Item = (&'a str, S)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (media_type, schema) in iter {
            map.insert(media_type, schema);
        }
        map
    }
}

/// How a body is described.
#[derive(Debug, Clone)]
pub enum SchemaBody<S> {
    /// One JSON schema, whatever the content type.
    Simple(S),
    /// One schema per media type.
    Content(ContentMap<S>),
}

/// Schemas for the four request fields.
pub struct RequestSchema<P: Provider> {
    provider: ProviderId,
    params: Option<P::Schema>,
    queries: Option<P::Schema>,
    headers: Option<P::Schema>,
    body: Option<SchemaBody<P::Schema>>,
}

impl<P: Provider> RequestSchema<P> {
    /// An empty schema tagged with `P`'s identity.
    pub fn new() -> Self {
        Self {
            provider: P::ID,
            params: None,
            queries: None,
            headers: None,
            body: None,
        }
    }

    /// Overrides the provider identity, for schemas built at runtime.
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.provider = provider;
        self
    }

    /// Sets the path parameter schema.
    #[must_use]
    pub fn params(mut self, schema: P::Schema) -> Self {
        self.params = Some(schema);
        self
    }

    /// Sets the query schema.
    #[must_use]
    pub fn queries(mut self, schema: P::Schema) -> Self {
        self.queries = Some(schema);
        self
    }

    /// Sets the header schema.
    #[must_use]
    pub fn headers(mut self, schema: P::Schema) -> Self {
        self.headers = Some(schema);
        self
    }

    /// Sets a simple JSON body schema.
    #[must_use]
    pub fn body(mut self, schema: P::Schema) -> Self {
        self.body = Some(SchemaBody::Simple(schema));
        self
    }

    /// Adds a body schema for `media_type`, turning the body into a
    /// content map.
    #[must_use]
    pub fn content(mut self, media_type: &str, schema: P::Schema) -> Self {
        match &mut self.body {
            Some(SchemaBody::Content(map)) => map.insert(media_type, schema),
            _ => self.body = Some(SchemaBody::Content(ContentMap::new().with(media_type, schema))),
        }
        self
    }

    /// The provider identity.
    pub fn provider(&self) -> &ProviderId {
        &self.provider
    }

    /// The path parameter schema.
    pub fn params_schema(&self) -> Option<&P::Schema> {
        self.params.as_ref()
    }

    /// The query schema.
    pub fn queries_schema(&self) -> Option<&P::Schema> {
        self.queries.as_ref()
    }

    /// The header schema.
    pub fn headers_schema(&self) -> Option<&P::Schema> {
        self.headers.as_ref()
    }

    /// The body schema.
    pub fn body_schema(&self) -> Option<&SchemaBody<P::Schema>> {
        self.body.as_ref()
    }
}

impl<P: Provider> Default for RequestSchema<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Provider> fmt::Debug for RequestSchema<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSchema")
            .field("provider", &self.provider)
            .field("params", &self.params.is_some())
            .field("queries", &self.queries.is_some())
            .field("headers", &self.headers.is_some())
            .field("body", &self.body.is_some())
            .finish()
    }
}

/// Key of a response schema entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusPattern {
    /// One status code, e.g. `200`.
    Exact(u16),
    /// A status class, e.g. `2` for `2XX`.
    Class(u8),
    /// Any status without a more specific entry.
    Default,
}

impl StatusPattern {
    /// A status class pattern such as `2XX`.
    pub const fn class(class: u8) -> Self {
        Self::Class(class)
    }
}

impl From<u16> for StatusPattern {
    fn from(code: u16) -> Self {
        Self::Exact(code)
    }
}

impl From<StatusCode> for StatusPattern {
    fn from(status: StatusCode) -> Self {
        Self::Exact(status.as_u16())
    }
}

impl FromStr for StatusPattern {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigurationError::InvalidStatusPattern {
            pattern: s.to_string(),
        };
        if s.eq_ignore_ascii_case("default") {
            return Ok(Self::Default);
        }
        let bytes = s.as_bytes();
        if bytes.len() != 3 {
            return Err(invalid());
        }
        if bytes[1..].eq_ignore_ascii_case(b"xx") {
            return match bytes[0] {
                digit @ b'1'..=b'5' => Ok(Self::Class(digit - b'0')),
                _ => Err(invalid()),
            };
        }
        match s.parse::<u16>() {
            Ok(code) if (100..=599).contains(&code) => Ok(Self::Exact(code)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for StatusPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(code) => write!(f, "{code}"),
            Self::Class(class) => write!(f, "{class}XX"),
            Self::Default => f.write_str("default"),
        }
    }
}

/// Schemas for responses, keyed by status pattern.
pub struct ResponseSchema<P: Provider> {
    provider: ProviderId,
    entries: IndexMap<StatusPattern, Option<SchemaBody<P::Schema>>>,
}

impl<P: Provider> ResponseSchema<P> {
    /// An empty schema tagged with `P`'s identity.
    pub fn new() -> Self {
        Self {
            provider: P::ID,
            entries: IndexMap::new(),
        }
    }

    /// Overrides the provider identity, for schemas built at runtime.
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.provider = provider;
        self
    }

    /// Declares a simple JSON body for `pattern`.
    #[must_use]
    pub fn status(self, pattern: impl Into<StatusPattern>, schema: P::Schema) -> Self {
        self.entry(pattern.into(), Some(SchemaBody::Simple(schema)))
    }

    /// Declares a content map body for `pattern`.
    #[must_use]
    pub fn status_content(
        self,
        pattern: impl Into<StatusPattern>,
        content: ContentMap<P::Schema>,
    ) -> Self {
        self.entry(pattern.into(), Some(SchemaBody::Content(content)))
    }

    /// Declares that `pattern` has no body to validate.
    #[must_use]
    pub fn status_empty(self, pattern: impl Into<StatusPattern>) -> Self {
        self.entry(pattern.into(), None)
    }

    /// Declares the `default` entry.
    #[must_use]
    pub fn default_body(self, schema: P::Schema) -> Self {
        self.entry(StatusPattern::Default, Some(SchemaBody::Simple(schema)))
    }

    fn entry(mut self, pattern: StatusPattern, body: Option<SchemaBody<P::Schema>>) -> Self {
        self.entries.insert(pattern, body);
        self
    }

    /// The provider identity.
    pub fn provider(&self) -> &ProviderId {
        &self.provider
    }

    /// Declared patterns in declaration order.
    pub fn patterns(&self) -> impl Iterator<Item = StatusPattern> + '_ {
        self.entries.keys().copied()
    }

    /// Finds the entry for `status`: exact code, then class, then `default`.
    ///
    /// The outer `None` means no entry matched; the inner `None` means the
    /// entry declares no body.
    pub fn entry_for(&self, status: StatusCode) -> Option<(StatusPattern, Option<&SchemaBody<P::Schema>>)> {
        let code = status.as_u16();
        let class = u8::try_from(code / 100).unwrap_or(u8::MAX);
        [
            StatusPattern::Exact(code),
            StatusPattern::Class(class),
            StatusPattern::Default,
        ]
        .into_iter()
        .find_map(|pattern| {
            self.entries
                .get(&pattern)
                .map(|body| (pattern, body.as_ref()))
        })
    }
}

impl<P: Provider> Default for ResponseSchema<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Provider> fmt::Debug for ResponseSchema<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns: Vec<String> = self.patterns().map(|p| p.to_string()).collect();
        f.debug_struct("ResponseSchema")
            .field("provider", &self.provider)
            .field("patterns", &patterns)
            .finish()
    }
}
