//! Client configuration and the named defaults shared by every domain client.
//!
//! # Design
//! The secure address is never stored unless a caller sets it explicitly; the
//! getter derives it from the current base address on every read. Reassigning
//! the base address therefore always "invalidates" the derived value, and an
//! explicit override keeps winning once set.

use std::fmt::Display;
use std::time::Duration;

use crate::error::ApiError;
use crate::url::{AddressKind, ApiUrl};

/// API origin used when no base address is configured.
pub const DEFAULT_BASE_ADDRESS: &str = "http://api.baasic.com/v1";

/// Media type sent in `Accept` and used for request bodies when unset.
pub const DEFAULT_MEDIA_TYPE: &str = "application/hal+json";

/// Per-request timeout when unset.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// First page of a list request.
pub const DEFAULT_PAGE: u32 = 1;

/// Records per page of a list request.
pub const DEFAULT_RECORDS_PER_PAGE: u32 = 10;

/// Sort expression of a list request; `None` means "server order".
pub const DEFAULT_SORTING: Option<&str> = None;

/// Search phrase of a list request; `None` means "no filter".
pub const DEFAULT_SEARCH_QUERY: Option<&str> = None;

/// Embedded relations of a request; `None` means "server default".
pub const DEFAULT_EMBED: Option<&str> = None;

/// Field projection of a request; `None` means "all fields".
pub const DEFAULT_FIELDS: Option<&str> = None;

const PLAIN_SCHEME: &str = "http://";
const SECURE_SCHEME: &str = "https://";

/// Addressing, media type and timeout settings for one application.
///
/// Shared read-only by every invocation, usually behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfiguration {
    application_identifier: String,
    base_address: Option<String>,
    secure_base_address: Option<String>,
    default_media_type: Option<String>,
    default_timeout: Option<Duration>,
}

impl ClientConfiguration {
    pub fn new(application_identifier: impl Into<String>) -> Self {
        Self {
            application_identifier: application_identifier.into(),
            base_address: None,
            secure_base_address: None,
            default_media_type: None,
            default_timeout: None,
        }
    }

    #[must_use]
    pub fn with_base_address(mut self, address: impl Into<String>) -> Self {
        self.set_base_address(address);
        self
    }

    #[must_use]
    pub fn with_secure_base_address(mut self, address: impl Into<String>) -> Self {
        self.set_secure_base_address(address);
        self
    }

    #[must_use]
    pub fn with_default_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.default_media_type = Some(media_type.into());
        self
    }

    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    pub fn application_identifier(&self) -> &str {
        &self.application_identifier
    }

    pub fn base_address(&self) -> &str {
        self.base_address.as_deref().unwrap_or(DEFAULT_BASE_ADDRESS)
    }

    pub fn set_base_address(&mut self, address: impl Into<String>) {
        self.base_address = Some(address.into());
    }

    /// The explicit secure address if one was set, otherwise the base
    /// address with a leading `http://` replaced by `https://`.
    pub fn secure_base_address(&self) -> String {
        if let Some(secure) = &self.secure_base_address {
            return secure.clone();
        }
        let base = self.base_address();
        match base.get(..PLAIN_SCHEME.len()) {
            Some(scheme) if scheme.eq_ignore_ascii_case(PLAIN_SCHEME) => {
                format!("{SECURE_SCHEME}{}", &base[PLAIN_SCHEME.len()..])
            }
            _ => base.to_string(),
        }
    }

    pub fn set_secure_base_address(&mut self, address: impl Into<String>) {
        self.secure_base_address = Some(address.into());
    }

    pub fn default_media_type(&self) -> &str {
        self.default_media_type
            .as_deref()
            .unwrap_or(DEFAULT_MEDIA_TYPE)
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Address the given kind of URL is rooted at.
    pub fn address(&self, kind: AddressKind) -> String {
        match kind {
            AddressKind::Plain => self.base_address().to_string(),
            AddressKind::Secure => self.secure_base_address(),
        }
    }

    /// Resolve `template` against the plain base address.
    pub fn api_url(&self, template: &str, values: &[&dyn Display]) -> Result<ApiUrl, ApiError> {
        ApiUrl::from_template(self, AddressKind::Plain, template, values)
    }

    /// Resolve `template` against the secure base address.
    pub fn secure_api_url(
        &self,
        template: &str,
        values: &[&dyn Display],
    ) -> Result<ApiUrl, ApiError> {
        ApiUrl::from_template(self, AddressKind::Secure, template, values)
    }
}

impl Default for ClientConfiguration {
    fn default() -> Self {
        Self::new("")
    }
}
