//! # Daedalus Validation
//!
//! Provider-agnostic request and response validation.
//!
//! - [`Provider`] / [`ProviderId`] - schema ecosystems and their identity
//! - [`Validator`] - the contract a schema ecosystem adapter implements
//! - [`RequestSchema`] / [`ResponseSchema`] - declarative route schemas
//! - [`media_type`] - content negotiation against content maps
//! - [`resolve_request_validator`] / [`resolve_response_validator`] - pair a
//!   validator with a route's schemas
//! - [`failure`] - the route → application → default failure cascade
//!
//! ## Example
//!
//! ```rust
//! # tokio_test::block_on(async {
//! use std::sync::Arc;
//! use daedalus_core::{Body, Context, Request};
//! use daedalus_validation::fixtures::{ShapeProvider, ShapeSchema, ShapeValidator};
//! use daedalus_validation::{resolve_request_validator, RequestSchema};
//!
//! let schema = RequestSchema::<ShapeProvider>::new().body(ShapeSchema::object().field("name", ShapeSchema::string()));
//! let validator = resolve_request_validator(Some(Arc::new(ShapeValidator)), Some(Arc::new(schema)))
//!     .unwrap()
//!     .unwrap();
//!
//! let request = http::Request::builder()
//!     .header("content-type", "application/json")
//!     .body(Body::from(r#"{"name":"Ada"}"#))
//!     .unwrap();
//! let validated = validator.validate(&Context::new(request)).await.unwrap();
//! assert_eq!(validated.body.unwrap()["name"], "Ada");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus-validation/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod failure;
pub mod fixtures;
pub mod media_type;
mod provider;
mod request;
mod response;
mod schema;
mod validator;

pub use error::{
    ConfigurationError, FieldFailures, Issue, PreValidationError, Rejection,
    RequestValidationError, ResponseValidationError, Stage, Target,
};
pub use failure::{FailureHandler, RequestFailureHandler, ResponseFailureHandler};
pub use media_type::MediaMatch;
pub use provider::{ensure_compatible, is_compatible, NoProvider, Provider, ProviderId};
pub use request::{
    headers_value, params_value, queries_value, resolve_request_validator, RequestCheck,
    RequestValidator,
};
pub use response::{
    resolve_response_validator, ResponseCheck, ResponseValidator, ValidatedResponse,
};
pub use schema::{ContentMap, RequestSchema, ResponseSchema, SchemaBody, StatusPattern};
pub use validator::{NoValidator, SchemaOf, Validator};
