//! Test client for in-memory dispatch.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use daedalus_server::App;
use daedalus_validation::{NoValidator, Validator};
use http::Method;
use serde::Serialize;

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;

/// A test client that drives an [`App`] without binding a socket.
///
/// Every request goes through [`App::handle`]: routing, hooks, validation,
/// failure handlers and request-ID echo all run exactly as they would behind
/// the HTTP server.
///
/// # Example
///
/// ```rust
/// use daedalus_core::{response, Context, Error};
/// use daedalus_server::{App, Route};
/// use daedalus_test::TestClient;
/// use http::StatusCode;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut app = App::new();
/// app.route(Route::get("/ping", |_ctx: Context| async {
///     Ok::<_, Error>(response::text(StatusCode::OK, "pong"))
/// }))
/// .unwrap();
///
/// let client = TestClient::new(app);
/// client
///     .get("/ping")
///     .send()
///     .await
///     .assert_status(StatusCode::OK)
///     .assert_body_eq("pong");
/// # }
/// ```
#[must_use]
pub struct TestClient<V: Validator = NoValidator> {
    app: Arc<App<V>>,
    default_headers: Vec<(String, String)>,
}

impl<V: Validator> TestClient<V> {
    /// Creates a test client that owns `app`.
    pub fn new(app: App<V>) -> Self {
        Self::from_arc(Arc::new(app))
    }

    /// Creates a test client sharing an app with other owners.
    pub fn from_arc(app: Arc<App<V>>) -> Self {
        Self {
            app,
            default_headers: Vec::new(),
        }
    }

    /// The app under test.
    pub fn app(&self) -> &App<V> {
        &self.app
    }

    /// Adds a default header that will be included in all requests.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, V> {
        TestClientRequest::new(self, TestRequest::get(uri))
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, V> {
        TestClientRequest::new(self, TestRequest::post(uri))
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, V> {
        TestClientRequest::new(self, TestRequest::put(uri))
    }

    /// Creates a PATCH request builder.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, V> {
        TestClientRequest::new(self, TestRequest::patch(uri))
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, V> {
        TestClientRequest::new(self, TestRequest::delete(uri))
    }

    /// Creates an OPTIONS request builder.
    pub fn options(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, V> {
        TestClientRequest::new(self, TestRequest::options(uri))
    }

    /// Creates a HEAD request builder.
    pub fn head(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, V> {
        TestClientRequest::new(self, TestRequest::head(uri))
    }

    /// Creates a request builder with a custom method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_, V> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, uri))
    }

    /// Dispatches a built request through the app.
    pub async fn execute(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let response = self.app.handle(request.into_request()).await;
        TestResponse::from_response(response).await
    }
}

impl<V: Validator> Clone for TestClient<V> {
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
            default_headers: self.default_headers.clone(),
        }
    }
}

impl<V: Validator> fmt::Debug for TestClient<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestClient")
            .field("routes", &self.app.registry().len())
            .field("default_headers", &self.default_headers)
            .finish()
    }
}

/// A request builder bound to a test client.
#[must_use]
pub struct TestClientRequest<'a, V: Validator = NoValidator> {
    client: &'a TestClient<V>,
    builder: TestRequestBuilder,
}

impl<'a, V: Validator> TestClientRequest<'a, V> {
    fn new(client: &'a TestClient<V>, builder: TestRequestBuilder) -> Self {
        let mut builder = builder;
        for (name, value) in &client.default_headers {
            builder = builder.header(name, value);
        }
        Self { client, builder }
    }

    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets the Authorization header with a Bearer token.
    pub fn bearer_token(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.bearer_token(token);
        self
    }

    /// Sets the `x-request-id` header.
    pub fn request_id(mut self, id: impl AsRef<str>) -> Self {
        self.builder = self.builder.request_id(id);
        self
    }

    /// Appends url-encoded query parameters.
    pub fn query<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.query(value);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets the request body as JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sets the request body as form-urlencoded.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.form(value);
        self
    }

    /// Sends the request and returns the response.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read. Use
    /// [`try_send`](Self::try_send) to handle those cases.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("test request failed: {e}"),
        }
    }

    /// Sends the request and returns a Result.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_core::{response, Context, Error};
    use daedalus_server::Route;
    use http::StatusCode;
    use serde_json::{json, Value};

    fn echo_app() -> App {
        let mut app = App::new();
        app.route(Route::any("/echo/*rest", |ctx: Context| async move {
            let body = ctx.text().await?;
            response::json(
                StatusCode::OK,
                &json!({
                    "method": ctx.method().as_str(),
                    "path": ctx.path(),
                    "query": ctx.uri().query(),
                    "auth": ctx.header("authorization"),
                    "custom": ctx.header("x-custom"),
                    "content_type": ctx.content_type(),
                    "body": body,
                }),
            )
        }))
        .unwrap();
        app
    }

    #[tokio::test]
    async fn test_all_methods() {
        let client = TestClient::new(echo_app());

        let cases = [
            (client.get("/echo/x").send().await, "GET"),
            (client.post("/echo/x").send().await, "POST"),
            (client.put("/echo/x").send().await, "PUT"),
            (client.patch("/echo/x").send().await, "PATCH"),
            (client.delete("/echo/x").send().await, "DELETE"),
            (client.options("/echo/x").send().await, "OPTIONS"),
        ];
        for (response, method) in cases {
            response.assert_json_field("method", &json!(method));
        }
    }

    #[tokio::test]
    async fn test_headers_and_body_reach_handler() {
        let client = TestClient::new(echo_app()).with_default_header("X-Custom", "default-value");

        let response = client
            .post("/echo/users")
            .bearer_token("my_token")
            .query(&[("page", "2")])
            .json(&json!({"name": "Alice"}))
            .send()
            .await;

        response
            .assert_success()
            .assert_json_field("path", &json!("/echo/users"))
            .assert_json_field("query", &json!("page=2"))
            .assert_json_field("auth", &json!("Bearer my_token"))
            .assert_json_field("custom", &json!("default-value"))
            .assert_json_field("content_type", &json!("application/json"))
            .assert_json_field("body", &json!(r#"{"name":"Alice"}"#));
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let client = TestClient::new(echo_app());
        let response = client
            .get("/echo/id")
            .request_id("0191d7a2-7b2e-7cc1-8d4b-3f5f1e2a9c10")
            .send()
            .await;
        assert_eq!(
            response.request_id(),
            Some("0191d7a2-7b2e-7cc1-8d4b-3f5f1e2a9c10")
        );

        let generated = client.get("/echo/id").send().await;
        assert!(generated.request_id().is_some());
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let client = TestClient::new(echo_app());
        let response = client.get("/nowhere").send().await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json().unwrap();
        assert!(body["error"]["code"].is_string());
    }

    #[tokio::test]
    async fn test_try_send_reports_build_errors() {
        let client = TestClient::new(echo_app());
        let err = client
            .get("/echo/x")
            .header("bad header", "v")
            .try_send()
            .await
            .unwrap_err();
        assert!(matches!(err, TestError::InvalidHeader(_)));
    }

    #[tokio::test]
    async fn test_clone_shares_app() {
        let client = TestClient::new(echo_app());
        let other = client.clone();
        assert!(std::ptr::eq(client.app(), other.app()));
        other.get("/echo/a").send().await.assert_success();
    }
}
