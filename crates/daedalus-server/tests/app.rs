//! Dispatch, registration and failure handling through a whole app.

use std::time::Duration;

use daedalus_config::{ConfigLoader, DaedalusConfig};
use daedalus_core::{response, Body, Context, Error, Request, Response};
use daedalus_hooks::Flow;
use daedalus_router::RouteError;
use daedalus_server::{App, AppError, Route, Server, ServerConfig, ShutdownSignal};
use daedalus_validation::fixtures::{ShapeProvider, ShapeSchema, ShapeValidator};
use daedalus_validation::{
    ConfigurationError, ProviderId, RequestSchema, RequestValidationError, ResponseSchema,
};
use http::StatusCode;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

fn get(uri: &str) -> Request {
    http::Request::get(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, content_type: &str, body: &'static str) -> Request {
    http::Request::post(uri)
        .header("content-type", content_type)
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn text_body(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn user_schema() -> RequestSchema<ShapeProvider> {
    RequestSchema::new()
        .params(ShapeSchema::object().field("id", ShapeSchema::integer()))
        .content(
            "application/json",
            ShapeSchema::object().field("name", ShapeSchema::string().min_length(1)),
        )
}

async fn echo_user(ctx: Context) -> Result<Response, Error> {
    let body: Value = ctx.valid_body()?.unwrap_or(Value::Null);
    let params: Value = ctx.valid_params()?.unwrap_or(Value::Null);
    response::json(StatusCode::CREATED, &json!({ "params": params, "body": body }))
}

fn validated_app() -> App<ShapeValidator> {
    let mut app = App::builder().validator(ShapeValidator).build();
    app.route(Route::post("/users/:id", echo_user).request_schema(user_schema()))
        .unwrap();
    app
}

#[tokio::test]
async fn test_dispatch_params_and_request_id() {
    let mut app = App::new();
    app.route(Route::get("/files/*path", |ctx: Context| async move {
        let path = ctx.param("path").unwrap_or_default().to_string();
        Ok::<_, Error>(response::text(StatusCode::OK, path))
    }))
    .unwrap();

    let request = http::Request::get("/files/a/b.txt")
        .header("x-request-id", "0191d7a2-7b2e-7cc1-8d4b-3f5f1e2a9c10")
        .body(Body::empty())
        .unwrap();
    let response = app.handle(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["x-request-id"],
        "0191d7a2-7b2e-7cc1-8d4b-3f5f1e2a9c10"
    );
    assert_eq!(text_body(response).await, "a/b.txt");
}

#[tokio::test]
async fn test_not_found_and_method_not_allowed() {
    let mut app = App::new();
    let handler = |_ctx: Context| async { Ok::<_, Error>(response::empty(StatusCode::NO_CONTENT)) };
    app.route(Route::get("/items", handler)).unwrap();
    app.route(Route::post("/items", handler)).unwrap();

    let response = app.handle(get("/nothing")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(json_body(response).await["error"]["code"], "NOT_FOUND");

    let request = http::Request::delete("/items").body(Body::empty()).unwrap();
    let response = app.handle(request).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let allow = response.headers()["allow"].to_str().unwrap().to_string();
    assert!(allow.contains("GET") && allow.contains("POST"));
}

#[tokio::test]
async fn test_unsupported_media_type_end_to_end() {
    let app = validated_app();

    let response = app
        .handle(post("/users/7", "text/xml", "<user name=\"Ada\"/>"))
        .await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");
    assert_eq!(body["error"]["details"]["supported"], json!(["application/json"]));
    assert_eq!(body["error"]["details"]["requested"], "text/xml");
}

#[tokio::test]
async fn test_validated_values_reach_handler() {
    let app = validated_app();

    let response = app
        .handle(post(
            "/users/7",
            "application/json; charset=utf-8",
            r#"{"name":"Ada"}"#,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["params"]["id"], 7);
    assert_eq!(body["body"]["name"], "Ada");
}

#[tokio::test]
async fn test_invalid_request_gets_400() {
    let app = validated_app();

    let response = app
        .handle(post("/users/abc", "application/json", r#"{"name":""}"#))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_failure_handler_cascade() {
    let mut app = App::builder()
        .validator(ShapeValidator)
        .on_request_failure(|failure: &RequestValidationError, _ctx: &Context| {
            let code = match failure {
                RequestValidationError::PreValidation(_) => StatusCode::IM_A_TEAPOT,
                RequestValidationError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            };
            Some(response::text(code, "app handler"))
        })
        .build();

    app.route(Route::post("/plain/:id", echo_user).request_schema(user_schema()))
        .unwrap();
    app.route(
        Route::post("/custom/:id", echo_user)
            .request_schema(user_schema())
            .on_request_failure(|failure, _ctx| match failure {
                RequestValidationError::Validation(_) => {
                    Some(response::text(StatusCode::CONFLICT, "route handler"))
                }
                RequestValidationError::PreValidation(_) => None,
            }),
    )
    .unwrap();

    let response = app.handle(post("/plain/1", "application/json", "{}")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app.handle(post("/custom/1", "application/json", "{}")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(text_body(response).await, "route handler");

    // The route handler declines pre-validation failures.
    let response = app.handle(post("/custom/1", "text/csv", "a,b")).await;
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
}

#[tokio::test]
async fn test_provider_mismatch_is_rejected_at_registration() {
    let mut app = App::builder().validator(ShapeValidator).build();
    let schema = RequestSchema::<ShapeProvider>::new()
        .with_provider(ProviderId::dynamic("zod"))
        .body(ShapeSchema::any());

    let err = app
        .route(Route::post("/things", echo_user).request_schema(schema))
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Configuration {
            source: ConfigurationError::ProviderMismatch { .. },
            ..
        }
    ));
    assert_eq!(app.routes().count(), 0);
    assert_eq!(app.handle(get("/things")).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_conflicting_route_is_rejected() {
    let mut app = App::new();
    let handler = |_ctx: Context| async { Ok::<_, Error>(response::empty(StatusCode::OK)) };
    app.route(Route::get("/a/:id", handler)).unwrap();

    let err = app.route(Route::get("/a/:id", handler)).unwrap_err();
    assert!(matches!(err, AppError::Route(RouteError::Conflict { .. })));
    assert_eq!(app.registry().len(), 1);
}

#[derive(Debug, Clone, PartialEq)]
struct Tag(&'static str);

#[tokio::test]
async fn test_registry_order_metadata_and_fast_path() {
    let mut app = App::builder().validator(ShapeValidator).build();
    let handler = |_ctx: Context| async { Ok::<_, Error>(response::empty(StatusCode::OK)) };

    let first = app
        .route(Route::get("/first", handler).metadata(Tag("public")))
        .unwrap();
    let second = app
        .route(Route::post("/second/:id", echo_user).request_schema(user_schema()))
        .unwrap();

    let templates: Vec<&str> = app.routes().map(|record| record.template()).collect();
    assert_eq!(templates, vec!["/first", "/second/:id"]);

    let first = app.route_record(first).unwrap();
    assert_eq!(first.metadata::<Tag>(), Some(&Tag("public")));
    assert!(first.is_fast_path());
    assert!(!first.has_request_schema());

    let second = app.route_record(second).unwrap();
    assert!(second.has_request_schema());
    assert!(!second.is_fast_path());
    assert!(second.metadata::<Tag>().is_none());
}

#[tokio::test]
async fn test_disabled_validation_takes_fast_path() {
    let config = ConfigLoader::new()
        .with_string("[validation]\nrequest = false\nresponse = false", "toml")
        .unwrap()
        .load()
        .unwrap();
    let mut app = App::builder()
        .config(&config)
        .validator(ShapeValidator)
        .build();

    let id = app
        .route(
            Route::post("/users/:id", |ctx: Context| async move {
                let text = ctx.text().await?;
                Ok::<_, Error>(response::text(StatusCode::OK, text))
            })
            .request_schema(user_schema())
            .response_schema(ResponseSchema::new().status(200, ShapeSchema::integer())),
        )
        .unwrap();
    assert!(app.route_record(id).unwrap().is_fast_path());

    let response = app.handle(post("/users/abc", "text/xml", "<x/>")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text_body(response).await, "<x/>");
}

#[tokio::test]
async fn test_app_hooks_wrap_every_route() {
    let mut app = App::builder()
        .state(String::from("tenant-a"))
        .on_request(|ctx: Context| async move {
            if ctx.header("authorization").is_none() {
                return Err(Error::unauthorized("missing credentials"));
            }
            Ok(Flow::Continue(ctx))
        })
        .on_response(|_ctx: Context, mut response: Response| async move {
            response
                .headers_mut()
                .insert("x-served-by", http::HeaderValue::from_static("daedalus"));
            Ok(response)
        })
        .build();
    app.route(Route::get("/whoami", |ctx: Context| async move {
        let tenant = ctx.state::<String>().cloned().unwrap_or_default();
        Ok::<_, Error>(response::text(StatusCode::OK, tenant))
    }))
    .unwrap();

    let response = app.handle(get("/whoami")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = http::Request::get("/whoami")
        .header("authorization", "Bearer t")
        .body(Body::empty())
        .unwrap();
    let response = app.handle(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-served-by"], "daedalus");
    assert_eq!(text_body(response).await, "tenant-a");
}

#[tokio::test]
async fn test_from_config_uses_logger_name() {
    let mut config = DaedalusConfig::default();
    config.logging.logger_name = "orders".to_string();
    let app = App::from_config(&config);
    assert_eq!(app.logger().name(), "orders");
}

#[tokio::test]
async fn test_server_serves_and_shuts_down() {
    let mut app = App::new();
    app.route(Route::get("/ping", |_ctx: Context| async {
        Ok::<_, Error>(response::text(StatusCode::OK, "pong"))
    }))
    .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let config = ServerConfig::builder()
        .shutdown_timeout(Duration::from_secs(1))
        .build();
    let server = Server::new(app, config);
    let handle = tokio::spawn(server.serve(listener, shutdown.clone()));

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = String::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_string(&mut raw))
        .await
        .expect("response in time")
        .unwrap();

    assert!(raw.starts_with("HTTP/1.1 200 OK"));
    assert!(raw.to_ascii_lowercase().contains("x-request-id:"));
    assert!(raw.ends_with("pong"));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server stops")
        .unwrap();
}
