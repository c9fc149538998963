//! Radix tree path matcher for Daedalus.
//!
//! The router resolves a request path to a route value plus a flat map of
//! captured parameters. It supports:
//!
//! - **Static segments**: `/users/me`
//! - **Named parameters**: `/users/:id`
//! - **Optional parameters**: `/posts/:page?`
//! - **Regex constraints**: `/orders/:id{\d+}`
//! - **Wildcards**: `/files/*path`
//! - **Method sets**: one method, several, or any; mismatches report `405`
//!
//! # Example
//!
//! ```rust
//! use daedalus_router::{Lookup, MethodSet, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert(&MethodSet::Any, "/health", 0).unwrap();
//! router.insert(&Method::GET.into(), "/orders/:id{\\d+}", 1).unwrap();
//!
//! assert!(matches!(router.lookup(&Method::PUT, "/health"), Lookup::Found(_)));
//! assert_eq!(router.lookup(&Method::GET, "/orders/abc"), Lookup::NotFound);
//! ```

mod error;
mod method;
mod node;
mod params;
mod router;
mod template;

pub use error::RouteError;
pub use method::{MethodRouter, MethodSet};
pub use params::Params;
pub use router::{Lookup, RouteMatch, Router};
