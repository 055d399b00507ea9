//! Transports and the factory that configures one per call.
//!
//! # Design
//! The invoker never holds a transport. For every call it asks its
//! `TransportFactory` for a fresh one built from the current configuration
//! (origin, timeout, `Accept` header) and drops it when the call returns,
//! on success and failure alike. `HttpTransport` is the reqwest-backed
//! implementation; tests plug in canned transports through the same traits.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use url::Url;

use crate::config::ClientConfiguration;
use crate::error::ApiError;
use crate::http::{
    FileUpload, HttpMethod, HttpRequest, HttpResponse, RequestBody, StreamingResponse,
};
use crate::url::AddressKind;

/// Multipart field name for uploaded files.
pub const FILE_FIELD: &str = "file";

/// Executes one request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request and buffer the whole response body.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;

    /// Perform the request and hand back the body unread.
    ///
    /// The default buffers through [`Transport::send`].
    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingResponse, ApiError> {
        self.send(request).await.map(StreamingResponse::from)
    }
}

/// Produces a configured transport for a single call.
pub trait TransportFactory: Send + Sync {
    type Transport: Transport;

    /// Build a transport rooted at the configured address of `kind`.
    fn create(
        &self,
        config: &ClientConfiguration,
        kind: AddressKind,
    ) -> Result<Self::Transport, ApiError>;
}

/// Factory for reqwest-backed transports.
///
/// Extra default headers, such as an `Authorization` header owned by an
/// authentication collaborator, are copied onto every transport it builds.
#[derive(Debug, Clone, Default)]
pub struct HttpTransportFactory {
    headers: Vec<(String, String)>,
}

impl HttpTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    fn default_headers(&self, media_type: &str) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value(ACCEPT.as_str(), media_type)?);
        for (name, value) in &self.headers {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::InvalidHeader(name.clone()))?;
            headers.insert(header, header_value(name, value)?);
        }
        Ok(headers)
    }
}

impl TransportFactory for HttpTransportFactory {
    type Transport = HttpTransport;

    fn create(
        &self,
        config: &ClientConfiguration,
        kind: AddressKind,
    ) -> Result<HttpTransport, ApiError> {
        let base = base_url(&config.address(kind))?;
        let client = reqwest::Client::builder()
            .timeout(config.default_timeout())
            .default_headers(self.default_headers(config.default_media_type())?)
            .build()?;
        Ok(HttpTransport { client, base })
    }
}

/// A reqwest client bound to one origin.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
}

impl HttpTransport {
    pub fn base_address(&self) -> &Url {
        &self.base
    }

    /// Absolute URLs pass through; anything else is joined onto the base.
    fn resolve(&self, url: &str) -> Result<Url, ApiError> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base
                .join(url.trim_start_matches('/'))
                .map_err(|err| invalid_url(url, &err)),
            Err(err) => Err(invalid_url(url, &err)),
        }
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<reqwest::Response, ApiError> {
        let url = self.resolve(&request.url)?;
        let mut builder = self.client.request(method(request.method), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            None => builder,
            Some(RequestBody::Encoded { content_type, data }) => {
                builder.header(CONTENT_TYPE, content_type).body(data)
            }
            Some(RequestBody::Multipart(file)) => builder.multipart(file_form(file)?),
        };

        builder.send().await.map_err(|err| {
            tracing::warn!(
                method = %request.method,
                url = %request.url,
                error = %err,
                timeout = err.is_timeout(),
                "request failed before a response arrived"
            );
            ApiError::from(err)
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let response = self.dispatch(request).await?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response.bytes().await?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingResponse, ApiError> {
        let response = self.dispatch(request).await?;
        Ok(StreamingResponse {
            status: response.status().as_u16(),
            headers: collect_headers(response.headers()),
            body: response.bytes_stream().map_err(ApiError::from).boxed(),
        })
    }
}

fn method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn file_form(file: FileUpload) -> Result<Form, ApiError> {
    let mut part = Part::bytes(file.data.to_vec()).file_name(file.file_name);
    if let Some(content_type) = &file.content_type {
        part = part
            .mime_str(content_type)
            .map_err(|_| ApiError::InvalidHeader(CONTENT_TYPE.as_str().to_string()))?;
    }
    Ok(Form::new().part(FILE_FIELD, part))
}

fn base_url(address: &str) -> Result<Url, ApiError> {
    // `Url::join` replaces the last segment unless the base ends with '/'.
    let mut base = Url::parse(address).map_err(|err| invalid_url(address, &err))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value).map_err(|_| ApiError::InvalidHeader(name.to_string()))
}

fn collect_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect()
}

fn invalid_url(url: &str, err: &url::ParseError) -> ApiError {
    ApiError::InvalidUrl {
        url: url.to_string(),
        reason: err.to_string(),
    }
}
