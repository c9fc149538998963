//! Request validation resolver.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use daedalus_core::{BoxFuture, Context, ValidatedRequest};

use crate::error::{
    ConfigurationError, FieldFailures, PreValidationError, Rejection, RequestValidationError,
    Target,
};
use crate::media_type::{self, pairs_to_object};
use crate::provider::ensure_compatible;
use crate::schema::{RequestSchema, SchemaBody};
use crate::validator::{SchemaOf, Validator};

/// A type-erased request check, as stored by a composed route.
pub type RequestCheck = Arc<
    dyn Fn(Context) -> BoxFuture<'static, Result<ValidatedRequest, RequestValidationError>>
        + Send
        + Sync,
>;

/// Pairs a validator with a request schema.
///
/// Built by [`resolve_request_validator`].
pub struct RequestValidator<V: Validator> {
    validator: Arc<V>,
    schema: Arc<RequestSchema<V::Provider>>,
}

impl<V: Validator> Clone for RequestValidator<V> {
    fn clone(&self) -> Self {
        Self {
            validator: Arc::clone(&self.validator),
            schema: Arc::clone(&self.schema),
        }
    }
}

impl<V: Validator> fmt::Debug for RequestValidator<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestValidator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Resolves the request validator of a route.
///
/// Returns `Ok(None)` when either side is absent, meaning the route does no
/// request validation. Fails when the two sides belong to different
/// providers or a body content map is empty.
pub fn resolve_request_validator<V: Validator>(
    validator: Option<Arc<V>>,
    schema: Option<Arc<RequestSchema<V::Provider>>>,
) -> Result<Option<RequestValidator<V>>, ConfigurationError> {
    let validator_id = validator.as_ref().map(|v| v.provider_id());
    ensure_compatible(
        validator_id.as_ref(),
        schema.as_ref().map(|s| s.provider()),
        Target::Request,
    )?;

    let (Some(validator), Some(schema)) = (validator, schema) else {
        return Ok(None);
    };
    if let Some(SchemaBody::Content(map)) = schema.body_schema() {
        if map.is_empty() {
            return Err(ConfigurationError::EmptyContentMap {
                target: Target::Request,
            });
        }
    }
    Ok(Some(RequestValidator { validator, schema }))
}

impl<V: Validator> RequestValidator<V> {
    /// The schema being enforced.
    pub fn schema(&self) -> &RequestSchema<V::Provider> {
        &self.schema
    }

    /// Validates the four request fields concurrently.
    ///
    /// Field rejections are merged into [`RequestValidationError::Validation`]
    /// holding only the failed fields. A body that cannot be obtained at all
    /// is reported as [`RequestValidationError::PreValidation`] on its own,
    /// discarding sibling field results.
    pub async fn validate(&self, ctx: &Context) -> Result<ValidatedRequest, RequestValidationError> {
        let validator = &*self.validator;
        let schema = &*self.schema;

        let params = async {
            match schema.params_schema() {
                Some(s) => validator.validate_params(s, params_value(ctx)).await.map(Some),
                None => Ok(None),
            }
        };
        let queries = async {
            match schema.queries_schema() {
                Some(s) => validator.validate_queries(s, queries_value(ctx)).await.map(Some),
                None => Ok(None),
            }
        };
        let headers = async {
            match schema.headers_schema() {
                Some(s) => validator.validate_headers(s, headers_value(ctx)).await.map(Some),
                None => Ok(None),
            }
        };
        let body = async {
            match schema.body_schema() {
                Some(body) => validate_body(validator, body, ctx).await.map(Some),
                None => Ok(None),
            }
        };

        let (params, queries, headers, body) = tokio::join!(params, queries, headers, body);

        let body = match body {
            Err(BodyFailure::Pre(err)) => return Err(RequestValidationError::PreValidation(err)),
            Err(BodyFailure::Rejected(rejection)) => Err(rejection),
            Ok(value) => Ok(value),
        };

        let mut failures = FieldFailures::default();
        let mut validated = ValidatedRequest::default();
        collect(params, &mut validated.params, &mut failures.params);
        collect(queries, &mut validated.queries, &mut failures.queries);
        collect(headers, &mut validated.headers, &mut failures.headers);
        collect(body, &mut validated.body, &mut failures.body);

        if failures.is_empty() {
            Ok(validated)
        } else {
            Err(RequestValidationError::Validation(failures))
        }
    }

    /// Erases this validator into a [`RequestCheck`].
    pub fn into_check(self) -> RequestCheck {
        let this = Arc::new(self);
        Arc::new(
            move |ctx: Context| -> BoxFuture<'static, Result<ValidatedRequest, RequestValidationError>> {
                let this = Arc::clone(&this);
                Box::pin(async move { this.validate(&ctx).await })
            },
        )
    }
}

fn collect(
    result: Result<Option<Value>, Rejection>,
    slot: &mut Option<Value>,
    failure: &mut Option<Rejection>,
) {
    match result {
        Ok(value) => *slot = value,
        Err(rejection) => *failure = Some(rejection),
    }
}

enum BodyFailure {
    Pre(PreValidationError),
    Rejected(Rejection),
}

async fn validate_body<V: Validator>(
    validator: &V,
    body: &SchemaBody<SchemaOf<V>>,
    ctx: &Context,
) -> Result<Value, BodyFailure> {
    let bytes = ctx.bytes().await.map_err(|e| {
        BodyFailure::Pre(PreValidationError::InvalidBody {
            cause: e.to_string(),
        })
    })?;

    let (schema, value) = match body {
        SchemaBody::Simple(schema) => {
            let value = media_type::parse_json(&bytes).map_err(BodyFailure::Pre)?;
            (schema, value)
        }
        SchemaBody::Content(content) => {
            let matched =
                media_type::resolve(content, ctx.content_type()).map_err(BodyFailure::Pre)?;
            let value = media_type::parse_payload(ctx.content_type(), &bytes)
                .map_err(BodyFailure::Pre)?;
            (matched.schema, value)
        }
    };

    validator
        .validate_body(schema, value)
        .await
        .map_err(BodyFailure::Rejected)
}

/// Path parameters as an object of strings.
pub fn params_value(ctx: &Context) -> Value {
    Value::Object(
        ctx.params()
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect(),
    )
}

/// Query parameters as an object; repeated keys become arrays.
pub fn queries_value(ctx: &Context) -> Value {
    pairs_to_object(ctx.query_pairs())
}

/// Headers as an object keyed by lowercase name. Repeated headers are
/// joined with `", "`; values that are not text are skipped.
pub fn headers_value(ctx: &Context) -> Value {
    let mut map = Map::new();
    for name in ctx.headers().keys() {
        let values: Vec<&str> = ctx
            .headers()
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if !values.is_empty() {
            map.insert(name.as_str().to_string(), Value::String(values.join(", ")));
        }
    }
    Value::Object(map)
}
