//! The facade exposes everything needed to build and exercise an app.

use daedalus::prelude::*;
use daedalus::validation::fixtures::{ShapeProvider, ShapeSchema, ShapeValidator};
use daedalus_test::TestClient;
use http::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_validated_route_through_prelude() {
    let mut app = App::builder()
        .validator(ShapeValidator)
        .on_request(|ctx: Context| async move {
            if ctx.header("x-blocked").is_some() {
                return Ok::<_, Error>(Flow::Respond(response::empty(StatusCode::FORBIDDEN)));
            }
            Ok(Flow::Continue(ctx))
        })
        .build();

    let schema: RequestSchema<ShapeProvider> =
        RequestSchema::new().params(ShapeSchema::object().field("id", ShapeSchema::integer()));
    app.route(
        Route::get("/items/:id", |ctx: Context| async move {
            let params: Value = ctx.valid_params()?.unwrap_or(Value::Null);
            response::json(StatusCode::OK, &params)
        })
        .request_schema(schema),
    )
    .unwrap();

    let client = TestClient::new(app);
    client
        .get("/items/42")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json_field("id", &json!(42));

    client
        .get("/items/abc")
        .send()
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_code("VALIDATION_FAILED");

    client
        .get("/items/42")
        .header("x-blocked", "1")
        .send()
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[test]
fn test_config_presets_build_apps() {
    let app = App::from_config(&DaedalusConfig::development());
    assert_eq!(app.logger().name(), "daedalus");
    assert_eq!(app.routes().count(), 0);
}
