//! Request and response resolvers driven through real contexts and
//! responses.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use daedalus_core::{response, Body, Context, Params, Request};
use daedalus_validation::fixtures::{ShapeProvider, ShapeSchema, ShapeValidator};
use daedalus_validation::{
    resolve_request_validator, resolve_response_validator, ConfigurationError,
    PreValidationError, ProviderId, Rejection, RequestSchema, RequestValidationError,
    ResponseSchema, ResponseValidationError, StatusPattern, Validator,
};
use http::StatusCode;
use serde_json::{json, Value};
use tokio::sync::Barrier;

fn request(content_type: &str, body: &'static str) -> Context {
    let req = http::Request::builder()
        .method("POST")
        .uri("/notes?limit=10")
        .header("content-type", content_type)
        .header("x-tenant", "acme")
        .body(Body::from(body))
        .unwrap();
    Context::new(req)
}

fn note_schema() -> RequestSchema<ShapeProvider> {
    RequestSchema::new()
        .content(
            "application/json",
            ShapeSchema::object().field("title", ShapeSchema::string()).strict(),
        )
        .content("text/plain", ShapeSchema::string().min_length(3))
}

fn shape() -> Option<Arc<ShapeValidator>> {
    Some(Arc::new(ShapeValidator))
}

#[tokio::test]
async fn test_content_map_selects_schema_by_media_type() {
    let validator = resolve_request_validator(shape(), Some(Arc::new(note_schema())))
        .unwrap()
        .unwrap();

    let validated = validator
        .validate(&request("text/plain; charset=utf-8", "buy milk"))
        .await
        .unwrap();
    assert_eq!(validated.body, Some(json!("buy milk")));

    let err = validator
        .validate(&request("application/json", r#""buy milk""#))
        .await
        .unwrap_err();
    assert!(matches!(err, RequestValidationError::Validation(ref f) if f.body.is_some()));
}

#[tokio::test]
async fn test_unsupported_media_type_lists_supported() {
    let validator = resolve_request_validator(shape(), Some(Arc::new(note_schema())))
        .unwrap()
        .unwrap();

    let err = validator
        .validate(&request("application/xml", "<note/>"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RequestValidationError::PreValidation(PreValidationError::UnsupportedMediaType {
            supported: vec!["application/json".into(), "text/plain".into()],
            requested: Some("application/xml".into()),
        })
    );
}

#[tokio::test]
async fn test_only_failed_fields_are_reported() {
    let mut params = Params::new();
    params.push("id", "7");
    let schema = RequestSchema::<ShapeProvider>::new()
        .params(ShapeSchema::object().field("id", ShapeSchema::integer()))
        .headers(ShapeSchema::object().field("x-api-key", ShapeSchema::string()));
    let validator = resolve_request_validator(shape(), Some(Arc::new(schema)))
        .unwrap()
        .unwrap();

    let ctx = request("application/json", "{}").with_params(params);
    let RequestValidationError::Validation(failures) = validator.validate(&ctx).await.unwrap_err()
    else {
        panic!("expected field failures");
    };
    assert_eq!(failures.fields(), vec!["headers"]);
    let value = serde_json::to_value(&failures).unwrap();
    assert!(value.get("params").is_none());
    assert!(value.get("queries").is_none());
    assert!(value.get("body").is_none());
}

#[tokio::test]
async fn test_validated_values_are_coerced() {
    let mut params = Params::new();
    params.push("id", "7");
    let schema = RequestSchema::<ShapeProvider>::new()
        .params(ShapeSchema::object().field("id", ShapeSchema::integer()))
        .queries(ShapeSchema::object().field("limit", ShapeSchema::integer()))
        .headers(ShapeSchema::object().field("x-tenant", ShapeSchema::string()));
    let validator = resolve_request_validator(shape(), Some(Arc::new(schema)))
        .unwrap()
        .unwrap();

    let ctx = request("application/json", "").with_params(params);
    let validated = validator.validate(&ctx).await.unwrap();
    assert_eq!(validated.params, Some(json!({ "id": 7 })));
    assert_eq!(validated.queries, Some(json!({ "limit": 10 })));
    assert_eq!(validated.headers.unwrap()["x-tenant"], "acme");
    assert_eq!(validated.body, None);
}

#[tokio::test]
async fn test_body_pre_validation_failure_is_reported_alone() {
    let schema = RequestSchema::<ShapeProvider>::new()
        .headers(ShapeSchema::object().field("x-api-key", ShapeSchema::string()))
        .body(ShapeSchema::any());
    let validator = resolve_request_validator(shape(), Some(Arc::new(schema)))
        .unwrap()
        .unwrap();

    let err = validator
        .validate(&request("application/json", "{not json"))
        .await
        .unwrap_err();
    match err {
        RequestValidationError::PreValidation(pre) => assert_eq!(pre.code(), "INVALID_JSON"),
        other => panic!("expected pre-validation failure, got {other:?}"),
    }
}

struct RendezvousValidator {
    barrier: Arc<Barrier>,
}

impl Validator for RendezvousValidator {
    type Provider = ShapeProvider;

    fn validate_params(
        &self,
        schema: &ShapeSchema,
        value: Value,
    ) -> impl Future<Output = Result<Value, Rejection>> + Send {
        let barrier = Arc::clone(&self.barrier);
        let result = schema.check_coercing(&value);
        async move {
            barrier.wait().await;
            result
        }
    }

    fn validate_headers(
        &self,
        schema: &ShapeSchema,
        value: Value,
    ) -> impl Future<Output = Result<Value, Rejection>> + Send {
        self.validate_params(schema, value)
    }

    fn validate_body(
        &self,
        schema: &ShapeSchema,
        value: Value,
    ) -> impl Future<Output = Result<Value, Rejection>> + Send {
        std::future::ready(schema.check(&value))
    }
}

#[tokio::test]
async fn test_fields_are_validated_concurrently() {
    // Params and headers each wait for the other; sequential validation
    // would never finish.
    let validator = Arc::new(RendezvousValidator {
        barrier: Arc::new(Barrier::new(2)),
    });
    let schema = RequestSchema::<ShapeProvider>::new()
        .params(ShapeSchema::object())
        .headers(ShapeSchema::object());
    let resolved = resolve_request_validator(Some(validator), Some(Arc::new(schema)))
        .unwrap()
        .unwrap();

    let ctx = request("application/json", "");
    let outcome = tokio::time::timeout(Duration::from_secs(5), resolved.validate(&ctx)).await;
    assert!(outcome.expect("validation deadlocked").is_ok());
}

#[test]
fn test_runtime_provider_mismatch() {
    let schema = RequestSchema::<ShapeProvider>::new().with_provider(ProviderId::dynamic("zod"));
    let err = resolve_request_validator(shape(), Some(Arc::new(schema))).unwrap_err();
    assert!(matches!(err, ConfigurationError::ProviderMismatch { .. }));

    let schema = ResponseSchema::<ShapeProvider>::new().with_provider(ProviderId::dynamic("zod"));
    let err = resolve_response_validator(shape(), Some(Arc::new(schema))).unwrap_err();
    assert!(matches!(err, ConfigurationError::ProviderMismatch { .. }));
}

#[test]
fn test_missing_side_disables_validation() {
    assert!(resolve_request_validator::<ShapeValidator>(None, Some(Arc::new(note_schema())))
        .unwrap()
        .is_none());
    assert!(resolve_request_validator(shape(), None).unwrap().is_none());
    assert!(resolve_response_validator(shape(), None).unwrap().is_none());
}

fn user_responses() -> ResponseSchema<ShapeProvider> {
    ResponseSchema::new()
        .status(200, ShapeSchema::object().field("id", ShapeSchema::integer()))
        .status(StatusPattern::class(2), ShapeSchema::object())
        .status_empty(204)
}

#[tokio::test]
async fn test_response_status_lookup() {
    let validator = resolve_response_validator(shape(), Some(Arc::new(user_responses())))
        .unwrap()
        .unwrap();

    let ok = response::json(StatusCode::OK, &json!({ "id": 1 })).unwrap();
    assert_eq!(validator.validate(&ok).await.unwrap().body, Some(json!({ "id": 1 })));

    let created = response::json(StatusCode::CREATED, &json!({ "anything": true })).unwrap();
    assert!(validator.validate(&created).await.is_ok());

    let no_content = response::empty(StatusCode::NO_CONTENT);
    assert_eq!(validator.validate(&no_content).await.unwrap().body, None);

    let missing = response::json(StatusCode::NOT_FOUND, &json!({})).unwrap();
    assert_eq!(
        validator.validate(&missing).await.unwrap_err(),
        ResponseValidationError::NoSchemaForStatusCode { status: 404 }
    );

    let wrong = response::json(StatusCode::OK, &json!({ "id": "one" })).unwrap();
    assert!(matches!(
        validator.validate(&wrong).await.unwrap_err(),
        ResponseValidationError::Validation(_)
    ));
}

#[tokio::test]
async fn test_streaming_response_skips_validation() {
    let validator = resolve_response_validator(shape(), Some(Arc::new(user_responses())))
        .unwrap()
        .unwrap();
    let chunks = futures_util::stream::iter(vec![
        Ok::<_, std::io::Error>(Bytes::from_static(b"not ")),
        Ok(Bytes::from_static(b"json")),
    ]);

    // 404 has no entry; a buffered body would fail the status lookup.
    let streamed = response::stream(StatusCode::NOT_FOUND, "application/json", chunks);
    let validated = validator.validate(&streamed).await.unwrap();
    assert_eq!(validated.body, None);
}
