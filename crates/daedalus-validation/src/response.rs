//! Response validation resolver.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use daedalus_core::{BoxFuture, Response};

use crate::error::{ConfigurationError, ResponseValidationError, Target};
use crate::media_type;
use crate::provider::ensure_compatible;
use crate::schema::{ResponseSchema, SchemaBody};
use crate::validator::Validator;

/// A validated response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidatedResponse {
    /// The validated body; `None` for streams and bodiless entries.
    pub body: Option<Value>,
}

/// A type-erased response check, as stored by a composed route.
pub type ResponseCheck = Arc<
    dyn Fn(&Response) -> BoxFuture<'static, Result<ValidatedResponse, ResponseValidationError>>
        + Send
        + Sync,
>;

/// Pairs a validator with a response schema.
pub struct ResponseValidator<V: Validator> {
    validator: Arc<V>,
    schema: Arc<ResponseSchema<V::Provider>>,
}

impl<V: Validator> Clone for ResponseValidator<V> {
    fn clone(&self) -> Self {
        Self {
            validator: Arc::clone(&self.validator),
            schema: Arc::clone(&self.schema),
        }
    }
}

impl<V: Validator> fmt::Debug for ResponseValidator<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseValidator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Resolves the response validator of a route.
///
/// Returns `Ok(None)` when either side is absent.
pub fn resolve_response_validator<V: Validator>(
    validator: Option<Arc<V>>,
    schema: Option<Arc<ResponseSchema<V::Provider>>>,
) -> Result<Option<ResponseValidator<V>>, ConfigurationError> {
    let validator_id = validator.as_ref().map(|v| v.provider_id());
    ensure_compatible(
        validator_id.as_ref(),
        schema.as_ref().map(|s| s.provider()),
        Target::Response,
    )?;

    match (validator, schema) {
        (Some(validator), Some(schema)) => Ok(Some(ResponseValidator { validator, schema })),
        _ => Ok(None),
    }
}

/// What response validation needs from a response, taken up front so the
/// response itself is never held across an await.
struct Snapshot {
    status: StatusCode,
    content_type: Option<String>,
    body: Option<Bytes>,
}

impl Snapshot {
    fn of(response: &Response) -> Self {
        Self {
            status: response.status(),
            content_type: response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string),
            body: response.body().as_bytes().cloned(),
        }
    }
}

impl<V: Validator> ResponseValidator<V> {
    /// The schema being enforced.
    pub fn schema(&self) -> &ResponseSchema<V::Provider> {
        &self.schema
    }

    /// Validates `response` without consuming or buffering it.
    ///
    /// Streamed bodies are accepted as-is with no validated body, before the
    /// status lookup.
    pub fn validate(
        &self,
        response: &Response,
    ) -> BoxFuture<'_, Result<ValidatedResponse, ResponseValidationError>> {
        let snapshot = Snapshot::of(response);
        Box::pin(self.check(snapshot))
    }

    async fn check(&self, snapshot: Snapshot) -> Result<ValidatedResponse, ResponseValidationError> {
        let Some(bytes) = snapshot.body else {
            return Ok(ValidatedResponse::default());
        };

        let (_, body) = self.schema.entry_for(snapshot.status).ok_or(
            ResponseValidationError::NoSchemaForStatusCode {
                status: snapshot.status.as_u16(),
            },
        )?;
        let Some(body) = body else {
            return Ok(ValidatedResponse::default());
        };

        let content_type = snapshot.content_type.as_deref();
        let (schema, value) = match body {
            SchemaBody::Simple(schema) => (schema, media_type::parse_json(&bytes)?),
            SchemaBody::Content(content) => {
                let matched = media_type::resolve(content, content_type)?;
                (matched.schema, media_type::parse_payload(content_type, &bytes)?)
            }
        };

        let validated = self
            .validator
            .validate_body(schema, value)
            .await
            .map_err(ResponseValidationError::Validation)?;
        Ok(ValidatedResponse {
            body: Some(validated),
        })
    }

    /// Erases this validator into a [`ResponseCheck`].
    pub fn into_check(self) -> ResponseCheck {
        let this = Arc::new(self);
        Arc::new(
            move |response: &Response| -> BoxFuture<'static, Result<ValidatedResponse, ResponseValidationError>> {
                let this = Arc::clone(&this);
                let snapshot = Snapshot::of(response);
                Box::pin(async move { this.check(snapshot).await })
            },
        )
    }
}
