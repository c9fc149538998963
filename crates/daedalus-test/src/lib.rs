//! # Daedalus Test
//!
//! In-memory testing utilities for Daedalus applications.
//!
//! [`TestClient`] sends requests straight into [`App::handle`], so tests
//! exercise routing, hooks, validation and failure handling without binding
//! a port.
//!
//! ## Example
//!
//! ```rust
//! use daedalus_core::{response, Context, Error};
//! use daedalus_server::{App, Route};
//! use daedalus_test::TestClient;
//! use http::StatusCode;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut app = App::new();
//! app.route(Route::post("/users", |ctx: Context| async move {
//!     let user: serde_json::Value = ctx.json().await?;
//!     response::json(StatusCode::CREATED, &user)
//! }))
//! .unwrap();
//!
//! let client = TestClient::new(app);
//! client
//!     .post("/users")
//!     .json(&json!({ "name": "Alice" }))
//!     .send()
//!     .await
//!     .assert_status(StatusCode::CREATED)
//!     .assert_json_field("name", &json!("Alice"));
//! # }
//! ```
//!
//! [`App::handle`]: daedalus_server::App::handle

#![doc(html_root_url = "https://docs.rs/daedalus-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
