//! Test request building.

use bytes::Bytes;
use daedalus_core::{Body, Request};
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use serde::Serialize;

use crate::error::TestError;

/// A test request that can be sent to a [`TestClient`](crate::TestClient).
#[derive(Debug, Clone)]
pub struct TestRequest {
    /// HTTP method
    pub method: Method,
    /// Request URI
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Bytes,
}

impl TestRequest {
    /// Creates a new GET request.
    pub fn get(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, uri)
    }

    /// Creates a new POST request.
    pub fn post(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, uri)
    }

    /// Creates a new PUT request.
    pub fn put(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, uri)
    }

    /// Creates a new PATCH request.
    pub fn patch(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PATCH, uri)
    }

    /// Creates a new DELETE request.
    pub fn delete(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, uri)
    }

    /// Creates a new OPTIONS request.
    pub fn options(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::OPTIONS, uri)
    }

    /// Creates a new HEAD request.
    pub fn head(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::HEAD, uri)
    }

    /// Converts this request into the framework's request type.
    ///
    /// The body is buffered, so the pipeline can inspect it before the
    /// handler runs.
    pub fn into_request(self) -> Request {
        let mut request = Request::new(Body::from(self.body));
        *request.method_mut() = self.method;
        *request.uri_mut() = self.uri;
        *request.headers_mut() = self.headers;
        request
    }
}

/// Builder for constructing test requests.
///
/// Invalid headers or bodies do not panic here; the first problem is kept
/// and reported by [`build`](Self::build).
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    query: Vec<String>,
    headers: HeaderMap,
    body: Option<Bytes>,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a new request builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            error: None,
        }
    }

    fn fail(mut self, error: TestError) -> Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }

    /// Sets a header on the request, replacing any previous value.
    ///
    /// # Example
    ///
    /// ```rust
    /// use daedalus_test::TestRequest;
    ///
    /// let request = TestRequest::get("/users")
    ///     .header("Authorization", "Bearer token")
    ///     .header("X-Request-ID", "12345")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(request.headers["x-request-id"], "12345");
    /// ```
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = match HeaderName::try_from(name.as_ref()) {
            Ok(name) => name,
            Err(e) => return self.fail(TestError::InvalidHeader(e.to_string())),
        };
        let value = match HeaderValue::try_from(value.as_ref()) {
            Ok(value) => value,
            Err(e) => return self.fail(TestError::InvalidHeader(e.to_string())),
        };
        self.headers.insert(name, value);
        self
    }

    /// Sets a typed header on the request.
    pub fn header_typed(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the Accept header.
    pub fn accept(self, accept: impl AsRef<str>) -> Self {
        self.header(header::ACCEPT.as_str(), accept)
    }

    /// Sets the Authorization header with a Bearer token.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header(
            header::AUTHORIZATION.as_str(),
            format!("Bearer {}", token.as_ref()),
        )
    }

    /// Sets the `x-request-id` header.
    pub fn request_id(self, id: impl AsRef<str>) -> Self {
        self.header(daedalus_core::REQUEST_ID_HEADER, id)
    }

    /// Appends query parameters, url-encoded from any serializable map or
    /// struct.
    pub fn query<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) if encoded.is_empty() => self,
            Ok(encoded) => {
                self.query.push(encoded);
                self
            }
            Err(e) => self.fail(TestError::Form(e)),
        }
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the request body as JSON.
    ///
    /// This also sets the `Content-Type` header to `application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Some(Bytes::from(bytes));
                self.content_type("application/json")
            }
            Err(e) => self.fail(TestError::Json(e)),
        }
    }

    /// Sets the request body as form-urlencoded.
    ///
    /// This also sets the `Content-Type` header to `application/x-www-form-urlencoded`.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => {
                self.body = Some(Bytes::from(encoded));
                self.content_type("application/x-www-form-urlencoded")
            }
            Err(e) => self.fail(TestError::Form(e)),
        }
    }

    /// Builds the test request.
    pub fn build(self) -> Result<TestRequest, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut target = self.uri;
        if !self.query.is_empty() {
            target.push(if target.contains('?') { '&' } else { '?' });
            target.push_str(&self.query.join("&"));
        }
        let uri: Uri = target
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("invalid URI: {e}")))?;

        Ok(TestRequest {
            method: self.method,
            uri,
            headers: self.headers,
            body: self.body.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_methods() {
        assert_eq!(TestRequest::get("/a").build().unwrap().method, Method::GET);
        assert_eq!(TestRequest::post("/a").build().unwrap().method, Method::POST);
        assert_eq!(TestRequest::put("/a").build().unwrap().method, Method::PUT);
        assert_eq!(TestRequest::delete("/a").build().unwrap().method, Method::DELETE);
        assert_eq!(TestRequest::head("/a").build().unwrap().method, Method::HEAD);
    }

    #[test]
    fn test_bearer_token() {
        let request = TestRequest::get("/users")
            .bearer_token("my_token")
            .build()
            .unwrap();

        assert_eq!(
            request.headers.get("Authorization").unwrap(),
            "Bearer my_token"
        );
    }

    #[test]
    fn test_json_body() {
        let request = TestRequest::post("/users")
            .json(&json!({"name": "Alice"}))
            .build()
            .unwrap();

        assert_eq!(
            request.headers.get("Content-Type").unwrap(),
            "application/json"
        );
        assert_eq!(request.body.as_ref(), b"{\"name\":\"Alice\"}");
    }

    #[test]
    fn test_form_body() {
        let request = TestRequest::post("/login")
            .form(&[("user", "ada lovelace"), ("remember", "true")])
            .build()
            .unwrap();

        assert_eq!(
            request.headers[header::CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
        assert_eq!(request.body.as_ref(), b"user=ada+lovelace&remember=true");
    }

    #[test]
    fn test_query_appends_to_existing() {
        let request = TestRequest::get("/search?q=rust")
            .query(&[("page", "2")])
            .build()
            .unwrap();
        assert_eq!(request.uri.query(), Some("q=rust&page=2"));

        let request = TestRequest::get("/search")
            .query(&[("q", "a b")])
            .build()
            .unwrap();
        assert_eq!(request.uri.query(), Some("q=a+b"));
    }

    #[test]
    fn test_invalid_header_reported_at_build() {
        let err = TestRequest::get("/users")
            .header("bad header", "value")
            .header("x-ok", "fine")
            .build()
            .unwrap_err();
        assert!(matches!(err, TestError::InvalidHeader(_)));
    }

    #[test]
    fn test_invalid_uri() {
        let err = TestRequest::get("not a uri").build().unwrap_err();
        assert!(matches!(err, TestError::RequestBuild(_)));
    }

    #[tokio::test]
    async fn test_into_request() {
        let request = TestRequest::post("/users")
            .header("X-Test", "value")
            .body("payload")
            .build()
            .unwrap()
            .into_request();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri().path(), "/users");
        assert_eq!(request.headers()["x-test"], "value");
        let bytes = request.into_body().collect().await.unwrap();
        assert_eq!(bytes.as_ref(), b"payload");
    }
}
