//! Full request lifecycle driven through the test client.

use std::sync::Arc;

use daedalus_core::{response, Completion, Context, Error};
use daedalus_hooks::Flow;
use daedalus_server::{App, Route};
use daedalus_test::TestClient;
use daedalus_validation::fixtures::{ShapeProvider, ShapeSchema, ShapeValidator};
use daedalus_validation::{RequestSchema, ResponseSchema};
use http::StatusCode;
use parking_lot::Mutex;
use serde_json::{json, Value};

fn users_app(log: Arc<Mutex<Vec<String>>>) -> App<ShapeValidator> {
    let request_log = Arc::clone(&log);
    let finally_log = Arc::clone(&log);
    let mut app = App::builder()
        .validator(ShapeValidator)
        .on_request(move |ctx: Context| {
            let log = Arc::clone(&request_log);
            async move {
                log.lock().push(format!("request {}", ctx.path()));
                Ok::<_, Error>(Flow::Continue(ctx))
            }
        })
        .on_finally(move |done: Completion| {
            let log = Arc::clone(&finally_log);
            async move {
                log.lock()
                    .push(format!("finally {}", done.context().path()));
                Ok::<_, Error>(())
            }
        })
        .build();

    let request: RequestSchema<ShapeProvider> = RequestSchema::new().content(
        "application/json",
        ShapeSchema::object().field("name", ShapeSchema::string().min_length(1)),
    );
    let response_schema: ResponseSchema<ShapeProvider> = ResponseSchema::new().status(
        201,
        ShapeSchema::object().field("id", ShapeSchema::integer()),
    );
    app.route(
        Route::post("/users", |ctx: Context| async move {
            let body: Value = ctx.valid_body()?.unwrap_or(Value::Null);
            if body["name"] == "broken" {
                return response::json(StatusCode::CREATED, &json!({ "id": "not-a-number" }));
            }
            response::json(StatusCode::CREATED, &json!({ "id": 1 }))
        })
        .request_schema(request)
        .response_schema(response_schema),
    )
    .unwrap();
    app
}

#[tokio::test]
async fn test_valid_request_runs_every_stage() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let client = TestClient::new(users_app(Arc::clone(&log)));

    client
        .post("/users")
        .json(&json!({ "name": "Alice" }))
        .send()
        .await
        .assert_status(StatusCode::CREATED)
        .assert_json_field("id", &json!(1));

    assert_eq!(*log.lock(), vec!["request /users", "finally /users"]);
}

#[tokio::test]
async fn test_invalid_body_is_rejected() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let client = TestClient::new(users_app(log));

    client
        .post("/users")
        .json(&json!({ "name": "" }))
        .send()
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_code("VALIDATION_FAILED");
}

#[tokio::test]
async fn test_unsupported_media_type() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let client = TestClient::new(users_app(log));

    client
        .post("/users")
        .content_type("text/plain")
        .body("Alice")
        .send()
        .await
        .assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE)
        .assert_json_field("error.details.supported.0", &json!("application/json"))
        .assert_json_field("error.details.requested", &json!("text/plain"));
}

#[tokio::test]
async fn test_invalid_response_passes_through_by_default() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let client = TestClient::new(users_app(log));

    client
        .post("/users")
        .json(&json!({ "name": "broken" }))
        .send()
        .await
        .assert_status(StatusCode::CREATED)
        .assert_json_field("id", &json!("not-a-number"));
}

#[tokio::test]
async fn test_wrong_method_skips_hooks() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let client = TestClient::new(users_app(Arc::clone(&log)));

    let response = client.get("/users").send().await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    assert!(response.header_str("allow").unwrap().contains("POST"));
    assert!(log.lock().is_empty());
}
