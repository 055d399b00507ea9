//! The generic REST invoker shared by every domain client.
//!
//! # Design
//! `RestInvoker` holds only the shared configuration and a transport
//! factory. Each call serializes the payload, obtains a fresh transport,
//! performs one round trip and hands the response to a `Decode` strategy
//! chosen by the result type:
//!
//! | outcome              | `Option<T>` | `CollectionModel<T>` | `bool` | `()` |
//! |----------------------|-------------|----------------------|--------|------|
//! | 2xx with body        | `Some(T)`   | decoded page         | `true` | `()` |
//! | 2xx without body     | `None`      | empty page           | `true` | `()` |
//! | 404                  | `None`      | empty page           | `false`| `()` |
//! | other status         | `HttpError` | `HttpError`          | `HttpError` | `HttpError` |
//!
//! Transport failures surface as `ApiError::Transport`. Nothing is retried.

use std::fmt::Display;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec;
use crate::config::ClientConfiguration;
use crate::error::ApiError;
use crate::http::{ByteStream, FileUpload, HttpMethod, HttpRequest, HttpResponse, RequestBody};
use crate::transport::{HttpTransportFactory, Transport, TransportFactory};
use crate::types::CollectionModel;
use crate::url::{AddressKind, ApiUrl};

const NOT_FOUND: u16 = 404;

/// How a result type is produced from a response.
pub trait Decode: Sized {
    /// 2xx response carrying a body.
    fn from_body(body: &[u8]) -> Result<Self, ApiError>;

    /// 2xx response without a body.
    fn empty() -> Self;

    /// 404 response.
    fn absent() -> Self;
}

impl<T: DeserializeOwned> Decode for Option<T> {
    fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        codec::decode(body).map(Some)
    }

    fn empty() -> Self {
        None
    }

    fn absent() -> Self {
        None
    }
}

impl<T: DeserializeOwned> Decode for CollectionModel<T> {
    fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        codec::decode(body)
    }

    fn empty() -> Self {
        CollectionModel::default()
    }

    fn absent() -> Self {
        CollectionModel::default()
    }
}

impl Decode for bool {
    fn from_body(_: &[u8]) -> Result<Self, ApiError> {
        Ok(true)
    }

    fn empty() -> Self {
        true
    }

    fn absent() -> Self {
        false
    }
}

impl Decode for () {
    fn from_body(_: &[u8]) -> Result<Self, ApiError> {
        Ok(())
    }

    fn empty() -> Self {}

    fn absent() -> Self {}
}

/// Whether a response resolved to a value or to an absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Found,
    Absent,
}

/// Map non-success status codes to the appropriate outcome.
fn check_status(response: &HttpResponse) -> Result<Resolution, ApiError> {
    if response.is_success() {
        return Ok(Resolution::Found);
    }
    if response.status == NOT_FOUND {
        return Ok(Resolution::Absent);
    }
    Err(status_error(response))
}

fn status_error(response: &HttpResponse) -> ApiError {
    tracing::warn!(status = response.status, "unexpected response status");
    ApiError::HttpError {
        status: response.status,
        body: response.text(),
    }
}

/// Interpret `response` with the decoding strategy `D`.
pub fn decode_response<D: Decode>(response: &HttpResponse) -> Result<D, ApiError> {
    match check_status(response)? {
        Resolution::Absent => Ok(D::absent()),
        Resolution::Found if response.body.is_empty() => Ok(D::empty()),
        Resolution::Found => D::from_body(&response.body),
    }
}

/// Typed send/receive over per-call transports.
#[derive(Debug, Clone)]
pub struct RestInvoker<F = HttpTransportFactory> {
    config: Arc<ClientConfiguration>,
    factory: F,
}

impl RestInvoker {
    /// Invoker backed by reqwest transports.
    pub fn new(config: impl Into<Arc<ClientConfiguration>>) -> Self {
        Self::with_factory(config, HttpTransportFactory::new())
    }
}

impl<F: TransportFactory> RestInvoker<F> {
    pub fn with_factory(config: impl Into<Arc<ClientConfiguration>>, factory: F) -> Self {
        Self {
            config: config.into(),
            factory,
        }
    }

    pub fn configuration(&self) -> &ClientConfiguration {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Resolve `template` against the plain base address.
    pub fn api_url(&self, template: &str, values: &[&dyn Display]) -> Result<ApiUrl, ApiError> {
        self.config.api_url(template, values)
    }

    /// Resolve `template` against the secure base address.
    pub fn secure_api_url(
        &self,
        template: &str,
        values: &[&dyn Display],
    ) -> Result<ApiUrl, ApiError> {
        self.config.secure_api_url(template, values)
    }

    /// Perform `method` on `url`, sending `body` as JSON when present, and
    /// decode the response as `D`.
    pub async fn send<D, B>(
        &self,
        url: &ApiUrl,
        method: HttpMethod,
        body: Option<&B>,
    ) -> Result<D, ApiError>
    where
        D: Decode,
        B: Serialize + Sync + ?Sized,
    {
        let mut request = HttpRequest::new(method, url.to_string());
        if let Some(body) = body {
            let media_type = self.config.default_media_type();
            request = request.with_body(RequestBody::Encoded {
                content_type: media_type.to_string(),
                data: codec::encode(media_type, body)?,
            });
        }
        let response = self.execute(url.address_kind(), request).await?;
        decode_response(&response)
    }

    /// Like [`RestInvoker::send`], answering only whether the call succeeded:
    /// 2xx is `true`, 404 is `false`, anything else is an error.
    pub async fn send_boolean<B>(
        &self,
        url: &ApiUrl,
        method: HttpMethod,
        body: Option<&B>,
    ) -> Result<bool, ApiError>
    where
        B: Serialize + Sync + ?Sized,
    {
        self.send::<bool, B>(url, method, body).await
    }

    pub async fn get<D: Decode>(&self, url: &ApiUrl) -> Result<D, ApiError> {
        self.send::<D, ()>(url, HttpMethod::Get, None).await
    }

    pub async fn delete<D: Decode>(&self, url: &ApiUrl) -> Result<D, ApiError> {
        self.send::<D, ()>(url, HttpMethod::Delete, None).await
    }

    pub async fn post<D, B>(&self, url: &ApiUrl, body: &B) -> Result<D, ApiError>
    where
        D: Decode,
        B: Serialize + Sync + ?Sized,
    {
        self.send(url, HttpMethod::Post, Some(body)).await
    }

    pub async fn put<D, B>(&self, url: &ApiUrl, body: &B) -> Result<D, ApiError>
    where
        D: Decode,
        B: Serialize + Sync + ?Sized,
    {
        self.send(url, HttpMethod::Put, Some(body)).await
    }

    /// Download the raw body of `url`. `None` when the server answers 404.
    pub async fn get_stream(&self, url: &ApiUrl) -> Result<Option<ByteStream>, ApiError> {
        let transport = self.factory.create(&self.config, url.address_kind())?;
        let request = HttpRequest::new(HttpMethod::Get, url.to_string());
        tracing::debug!(method = %request.method, url = %request.url, "opening stream");

        let response = transport.send_streaming(request).await?;
        tracing::debug!(status = response.status, "stream opened");
        if response.is_success() {
            return Ok(Some(response.body));
        }
        if response.status == NOT_FOUND {
            return Ok(None);
        }
        let response = response.collect().await?;
        Err(status_error(&response))
    }

    /// Upload `file` as a new resource at `url`.
    pub async fn post_file<D: Decode>(
        &self,
        url: &ApiUrl,
        file: FileUpload,
    ) -> Result<D, ApiError> {
        self.send_file(url, HttpMethod::Post, file).await
    }

    /// Replace the resource at `url` with `file`.
    pub async fn put_file<D: Decode>(
        &self,
        url: &ApiUrl,
        file: FileUpload,
    ) -> Result<D, ApiError> {
        self.send_file(url, HttpMethod::Put, file).await
    }

    async fn send_file<D: Decode>(
        &self,
        url: &ApiUrl,
        method: HttpMethod,
        file: FileUpload,
    ) -> Result<D, ApiError> {
        let request =
            HttpRequest::new(method, url.to_string()).with_body(RequestBody::Multipart(file));
        let response = self.execute(url.address_kind(), request).await?;
        decode_response(&response)
    }

    /// Run `request` on a transport created for this call only.
    pub async fn execute(
        &self,
        kind: AddressKind,
        request: HttpRequest,
    ) -> Result<HttpResponse, ApiError> {
        let transport = self.factory.create(&self.config, kind)?;
        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        let response = transport.send(request).await?;
        tracing::debug!(
            status = response.status,
            bytes = response.body.len(),
            "received response"
        );
        Ok(response)
    }
}
