//! The route registry.
//!
//! Records live in a growable arena in registration order. A [`RouteId`] is
//! the record's slot; it is only handed out by registration, so it cannot be
//! guessed, and slots are never reused because records are never removed.

use std::fmt;
use std::sync::Arc;

use http::Extensions;

use daedalus_hooks::RouteHandler;
use daedalus_router::MethodSet;

/// Opaque handle of a registered route.
///
/// A handle is scoped to the app that issued it. Looking it up in another
/// app's registry finds whatever route occupies the same slot there, or
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(usize);

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route#{}", self.0)
    }
}

/// A registered route. Immutable once registered.
pub struct RouteRecord {
    id: RouteId,
    methods: MethodSet,
    template: Arc<str>,
    has_request_schema: bool,
    has_response_schema: bool,
    metadata: Extensions,
    handler: RouteHandler,
}

impl RouteRecord {
    pub(crate) fn new(
        methods: MethodSet,
        template: Arc<str>,
        has_request_schema: bool,
        has_response_schema: bool,
        metadata: Extensions,
        handler: RouteHandler,
    ) -> Self {
        Self {
            id: RouteId(usize::MAX),
            methods,
            template,
            has_request_schema,
            has_response_schema,
            metadata,
            handler,
        }
    }

    /// Handle returned at registration.
    pub fn id(&self) -> RouteId {
        self.id
    }

    /// Methods the route answers.
    pub fn methods(&self) -> &MethodSet {
        &self.methods
    }

    /// The path template as registered.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub(crate) fn template_arc(&self) -> Arc<str> {
        Arc::clone(&self.template)
    }

    /// Whether a request schema was declared.
    pub fn has_request_schema(&self) -> bool {
        self.has_request_schema
    }

    /// Whether a response schema was declared.
    pub fn has_response_schema(&self) -> bool {
        self.has_response_schema
    }

    /// Metadata of type `T` attached with [`Route::metadata`](crate::Route::metadata).
    pub fn metadata<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.metadata.get::<T>()
    }

    /// The composed handler.
    pub fn handler(&self) -> &RouteHandler {
        &self.handler
    }

    /// Whether the route skips the hook pipeline.
    pub fn is_fast_path(&self) -> bool {
        self.handler.is_direct()
    }
}

impl fmt::Debug for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRecord")
            .field("id", &self.id)
            .field("methods", &self.methods)
            .field("template", &self.template)
            .field("has_request_schema", &self.has_request_schema)
            .field("has_response_schema", &self.has_response_schema)
            .field("fast_path", &self.is_fast_path())
            .finish_non_exhaustive()
    }
}

/// Route records in registration order.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    records: Vec<RouteRecord>,
}

impl RouteRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The handle the next registration will receive.
    pub(crate) fn next_id(&self) -> RouteId {
        RouteId(self.records.len())
    }

    /// Stores a record and returns its handle.
    pub(crate) fn insert(&mut self, mut record: RouteRecord) -> RouteId {
        let id = self.next_id();
        record.id = id;
        self.records.push(record);
        id
    }

    /// Looks a record up by handle.
    ///
    /// `id` must come from this registry; see [`RouteId`].
    pub fn get(&self, id: RouteId) -> Option<&RouteRecord> {
        self.records.get(id.0)
    }

    /// Iterates records in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, RouteRecord> {
        self.records.iter()
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a RouteRegistry {
    type Item = &'a RouteRecord;
    type IntoIter = std::slice::Iter<'a, RouteRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use daedalus_core::{handler_fn, response, Context, Error};
    use http::{Method, StatusCode};

    fn record(template: &str) -> RouteRecord {
        let handler = handler_fn(|_ctx: Context| async {
            Ok::<_, Error>(response::empty(StatusCode::NO_CONTENT))
        });
        RouteRecord::new(
            MethodSet::from(Method::GET),
            Arc::from(template),
            false,
            false,
            Extensions::new(),
            RouteHandler::Direct(handler),
        )
    }

    #[test]
    fn test_ids_follow_insertion_order() {
        let mut registry = RouteRegistry::new();
        let first = registry.insert(record("/a"));
        let second = registry.insert(record("/b"));

        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(second).unwrap().template(), "/b");
        assert_eq!(
            registry.iter().map(RouteRecord::template).collect::<Vec<_>>(),
            vec!["/a", "/b"]
        );
        assert!(registry.get(first).unwrap().is_fast_path());
    }

    #[test]
    fn test_next_id_matches_insert() {
        let mut registry = RouteRegistry::new();
        let predicted = registry.next_id();
        assert_eq!(registry.insert(record("/a")), predicted);
        assert_eq!(predicted.to_string(), "route#0");
    }

    #[test]
    fn test_handles_are_scoped_to_their_registry() {
        let mut large = RouteRegistry::new();
        large.insert(record("/a"));
        let foreign = large.insert(record("/b"));

        let mut small = RouteRegistry::new();
        small.insert(record("/c"));
        assert!(small.get(foreign).is_none());
        assert_eq!(large.get(foreign).map(RouteRecord::template), Some("/b"));
    }
}
