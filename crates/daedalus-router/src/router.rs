//! High-level router API.

use http::Method;

use crate::error::RouteError;
use crate::method::{MethodRouter, MethodSet};
use crate::node::Node;
use crate::params::Params;
use crate::template;

/// A radix tree path matcher generic over the value stored per route.
///
/// # Example
///
/// ```rust
/// use daedalus_router::{Lookup, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert(&Method::GET.into(), "/users/:id", "getUser").unwrap();
/// router.insert(&Method::GET.into(), "/files/*path", "serveFile").unwrap();
///
/// match router.lookup(&Method::GET, "/users/42") {
///     Lookup::Found(found) => {
///         assert_eq!(*found.value, "getUser");
///         assert_eq!(found.params.get("id"), Some("42"));
///     }
///     other => panic!("unexpected {other:?}"),
/// }
///
/// assert!(matches!(
///     router.lookup(&Method::DELETE, "/users/42"),
///     Lookup::MethodNotAllowed { .. }
/// ));
/// ```
///
/// # Route Priority
///
/// 1. **Static segments** (`/users/me`)
/// 2. **Constrained parameters** (`/users/:id{\d+}`), in registration order
/// 3. **Parameters** (`/users/:id`), in registration order
/// 4. **Wildcards** (`/files/*path`)
///
/// A failed branch is backtracked, so `/:a/x` and `/:b/y` can coexist.
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    route_count: usize,
}

impl<T: Clone> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The value stored for the matched route and method.
    pub value: &'a T,
    /// Captured path parameters.
    pub params: Params,
}

/// Outcome of [`Router::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<'a, T> {
    /// The path and method matched.
    Found(RouteMatch<'a, T>),
    /// The path matched but not for this method.
    MethodNotAllowed {
        /// Value for the `Allow` response header.
        allow: String,
    },
    /// Nothing matched the path.
    NotFound,
}

impl<T: Clone> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Inserts a route for `methods` under `path_template`.
    ///
    /// Optional parameters expand into several concrete paths which all map
    /// to `value`. Insertion is all-or-nothing: on error the router is left
    /// as it was.
    pub fn insert(
        &mut self,
        methods: &MethodSet,
        path_template: &str,
        value: T,
    ) -> Result<(), RouteError> {
        let variants = template::expand(path_template)?;
        let snapshot = self.root.clone();
        for variant in &variants {
            if let Err(err) = self
                .root
                .insert(variant, methods, value.clone(), path_template)
            {
                self.root = snapshot;
                return Err(err);
            }
        }
        self.route_count += 1;
        Ok(())
    }

    /// Matches a method and path.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Lookup<'_, T> {
        match self.root.match_path(path) {
            None => Lookup::NotFound,
            Some((methods, params)) => match methods.get(method) {
                Some(value) => Lookup::Found(RouteMatch { value, params }),
                None => Lookup::MethodNotAllowed {
                    allow: methods.allow_header(),
                },
            },
        }
    }

    /// Matches a path regardless of method.
    ///
    /// Returns the method table and captured parameters.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        self.root.match_path(path)
    }

    /// Returns the number of routes inserted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}
