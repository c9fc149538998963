//! Schema provider identity and the compatibility check.
//!
//! A provider is a schema ecosystem. Validators and schemas are both tagged
//! with one, and a validator may only be paired with schemas of its own
//! provider. The pairing is enforced twice:
//!
//! - statically, because [`RequestSchema`](crate::RequestSchema) and
//!   [`ResponseSchema`](crate::ResponseSchema) are generic over the provider
//!   and the resolvers require it to equal the validator's
//!   [`Validator::Provider`](crate::Validator::Provider);
//! - at runtime, by comparing [`ProviderId`]s, because one Rust schema type
//!   can be shared by several ecosystems and schemas may be built from
//!   dynamic input.
//!
//! ```compile_fail
//! use std::sync::Arc;
//! use daedalus_validation::fixtures::{ShapeSchema, ShapeValidator};
//! use daedalus_validation::{resolve_request_validator, Provider, ProviderId, RequestSchema};
//!
//! struct Other;
//! impl Provider for Other {
//!     type Schema = ShapeSchema;
//!     const ID: ProviderId = ProviderId::new("other");
//! }
//!
//! // A `ShapeValidator` cannot be paired with a schema of another provider.
//! let schema: RequestSchema<Other> = RequestSchema::new();
//! let _ = resolve_request_validator(Some(Arc::new(ShapeValidator)), Some(Arc::new(schema)));
//! ```

use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt;

use crate::error::{ConfigurationError, Target};

/// Opaque identity of a schema provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderId(Cow<'static, str>);

impl ProviderId {
    /// A provider identity known at compile time.
    pub const fn new(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// A provider identity computed at runtime.
    pub fn dynamic(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// The identity as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A schema ecosystem.
pub trait Provider: Send + Sync + 'static {
    /// The schema type of this ecosystem.
    type Schema: Send + Sync + 'static;

    /// Identity shared by this provider's validators and schemas.
    const ID: ProviderId;
}

/// The provider of applications without validation. It has no schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProvider;

impl Provider for NoProvider {
    type Schema = Infallible;
    const ID: ProviderId = ProviderId::new("none");
}

/// Returns `true` when a validator and a schema may be paired.
///
/// Either side being absent means no validation is configured, which is
/// always compatible.
pub fn is_compatible(validator: Option<&ProviderId>, schema: Option<&ProviderId>) -> bool {
    match (validator, schema) {
        (Some(validator), Some(schema)) => validator == schema,
        _ => true,
    }
}

/// Fails with [`ConfigurationError::ProviderMismatch`] when
/// [`is_compatible`] does not hold.
pub fn ensure_compatible(
    validator: Option<&ProviderId>,
    schema: Option<&ProviderId>,
    target: Target,
) -> Result<(), ConfigurationError> {
    match (validator, schema) {
        (Some(validator), Some(schema)) if !is_compatible(Some(validator), Some(schema)) => {
            Err(ConfigurationError::ProviderMismatch {
                target,
                validator: validator.clone(),
                schema: schema.clone(),
            })
        }
        _ => Ok(()),
    }
}
