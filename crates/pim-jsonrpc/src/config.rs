use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;

use crate::TransportError;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_REDIRECTS: usize = 2;
pub const DEFAULT_USER_AGENT: &str = concat!("pim-jsonrpc/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
/// Connection settings for one `JsonRpcTransport`.
pub struct TransportConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub verify_tls: bool,
    pub http_method: Method,
    pub max_redirects: usize,
    pub headers: BTreeMap<String, String>,
}

impl TransportConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            verify_tls: true,
            http_method: Method::POST,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            headers: default_headers(),
        }
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Sets a static header, replacing any existing header with the same name.
    ///
    /// An empty value keeps the entry but suppresses the header on the wire.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    pub(crate) fn header_map(&self) -> Result<HeaderMap, TransportError> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            if value.trim().is_empty() {
                continue;
            }
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|error| {
                TransportError::InvalidHeader {
                    name: name.clone(),
                    message: error.to_string(),
                }
            })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|error| TransportError::InvalidHeader {
                    name: name.clone(),
                    message: error.to_string(),
                })?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

fn default_headers() -> BTreeMap<String, String> {
    [
        ("Accept", "application/json"),
        ("Connection", "close"),
        ("Content-Type", "application/json"),
        ("User-Agent", DEFAULT_USER_AGENT),
        ("Expect", ""),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect()
}
