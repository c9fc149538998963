//! The validator contract implemented by schema provider adapters.

use std::convert::Infallible;
use std::future::Future;

use serde_json::Value;

use crate::error::Rejection;
use crate::provider::{NoProvider, Provider, ProviderId};

/// Schema type validated by `V`.
pub type SchemaOf<V> = <<V as Validator>::Provider as Provider>::Schema;

/// Validates raw request and response values against provider schemas.
///
/// Validators are stateless and shared by every route of an application.
/// Each method receives the raw value (an object of strings for params,
/// queries and headers; the decoded payload for bodies) and returns the
/// validated value, which may differ from the input, e.g. after coercion.
///
/// Only [`validate_body`](Validator::validate_body) is required; the other
/// fields default to it.
pub trait Validator: Send + Sync + 'static {
    /// The schema ecosystem this validator understands.
    type Provider: Provider;

    /// Runtime provider identity; defaults to the provider's [`Provider::ID`].
    fn provider_id(&self) -> ProviderId {
        <Self::Provider as Provider>::ID
    }

    /// Validates path parameters.
    fn validate_params(
        &self,
        schema: &SchemaOf<Self>,
        value: Value,
    ) -> impl Future<Output = Result<Value, Rejection>> + Send {
        self.validate_body(schema, value)
    }

    /// Validates query parameters.
    fn validate_queries(
        &self,
        schema: &SchemaOf<Self>,
        value: Value,
    ) -> impl Future<Output = Result<Value, Rejection>> + Send {
        self.validate_body(schema, value)
    }

    /// Validates headers.
    fn validate_headers(
        &self,
        schema: &SchemaOf<Self>,
        value: Value,
    ) -> impl Future<Output = Result<Value, Rejection>> + Send {
        self.validate_body(schema, value)
    }

    /// Validates a decoded body.
    fn validate_body(
        &self,
        schema: &SchemaOf<Self>,
        value: Value,
    ) -> impl Future<Output = Result<Value, Rejection>> + Send;
}

/// The validator of applications without validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoValidator;

impl Validator for NoValidator {
    type Provider = NoProvider;

    fn validate_body(
        &self,
        schema: &Infallible,
        _value: Value,
    ) -> impl Future<Output = Result<Value, Rejection>> + Send {
        std::future::ready::<Result<Value, Rejection>>(match *schema {})
    }
}
