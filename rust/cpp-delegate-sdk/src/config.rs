use cpp_delegate_catalog::{CatalogConfig, CodecConfig, PointerWidth};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct ContextConfig {
    pub catalog: CatalogConfig,
    pub codec: CodecConfig,
    /// Limit for each `address_of` round trip during construction.
    pub address_timeout: Option<Duration>,
    /// Limit for every other round trip. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    pub cancellation: CancellationToken,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            codec: CodecConfig::default(),
            address_timeout: Some(Duration::from_secs(5)),
            request_timeout: None,
            cancellation: CancellationToken::new(),
        }
    }
}

impl ContextConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.catalog = self.catalog.with_namespace(namespace);
        self
    }

    pub fn with_catalog(mut self, catalog: CatalogConfig) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_pointer_width(mut self, width: PointerWidth) -> Self {
        self.codec = self.codec.with_pointer_width(width);
        self
    }

    pub fn with_address_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.address_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}
