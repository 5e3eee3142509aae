//! Request-template core for the payments API collection.
//!
//! # Overview
//! Loads a Postman collection of templated requests, resolves `{{name}}` and
//! `:name` placeholders against a caller-supplied variable environment, and
//! returns a `ResolvedRequest` without touching the network (host-does-IO
//! pattern). The caller sends the request with whatever HTTP client it uses.
//!
//! # Design
//! - `TemplateStore` is immutable after loading; resolution is a pure
//!   function, so concurrent use needs no coordination.
//! - An unresolved placeholder is always an error. A partially substituted
//!   request is never returned.
//! - JSON bodies are substituted token by token so untemplated numbers and
//!   booleans keep their type.
//! - `status` and `redirect` carry the reference data a client needs to read
//!   payment outcomes: the status table and the signed return-URL format.

pub mod body;
pub mod collection;
pub mod environment;
pub mod error;
pub mod http;
pub mod redirect;
pub mod resolve;
pub mod status;
pub mod store;
pub mod token;

pub use collection::{Collection, RequestTemplate, UrlTemplate};
pub use environment::{Deployment, VariableEnvironment, API_KEY_HEADER};
pub use error::{ResolveError, SignatureError, TokenLocation};
pub use http::{HttpMethod, ResolvedRequest};
pub use redirect::{sign_redirect_url, verify_redirect_signature, RedirectParams};
pub use resolve::{placeholders, resolve, Placeholder, PlaceholderKind};
pub use status::PaymentStatus;
pub use store::TemplateStore;
