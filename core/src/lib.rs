//! REST invocation core for the Baasic content API clients.
//!
//! # Overview
//! Every domain client (articles, blogs, pages, menus, files, …) does the
//! same thing: resolve a relative path template into an absolute URL, attach
//! query parameters and an optional payload, perform one HTTP call and map
//! the status to a typed value, a boolean or an error. This crate is that
//! shared layer; the domain clients only supply path templates and result
//! types.
//!
//! # Design
//! - `ClientConfiguration` is long-lived and shared read-only behind an `Arc`.
//! - `ApiUrl` resolves `{n}` placeholders and renders a canonical query string.
//! - `RestInvoker` obtains a fresh transport from its `TransportFactory` for
//!   every call and drops it when the call ends.
//! - The result type picks the outcome mapping through `Decode`: 404 is an
//!   absent value, other failures are `ApiError`s.
//!
//! ```ignore
//! let config = ClientConfiguration::new("my-app");
//! let invoker = RestInvoker::new(config);
//!
//! let mut url = invoker.api_url("articles/{0}", &[&"my-slug"])?;
//! GetParams::default().apply(&mut url);
//! let article: Option<Article> = invoker.get(&url).await?;
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod invoker;
pub mod params;
pub mod transport;
pub mod types;
pub mod url;

pub use config::ClientConfiguration;
pub use error::ApiError;
pub use http::{
    ByteStream, FileUpload, HttpMethod, HttpRequest, HttpResponse, RequestBody, StreamingResponse,
};
pub use invoker::{Decode, RestInvoker};
pub use params::{FindParams, GetParams};
pub use transport::{HttpTransport, HttpTransportFactory, Transport, TransportFactory};
pub use types::CollectionModel;
pub use url::{AddressKind, ApiUrl, QueryValue};
