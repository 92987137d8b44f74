//! Direct HTTP(S) transfers.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

use crate::stream::{BoxByteSource, ByteSource};
use crate::{Error, Result};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("artifetch/", env!("CARGO_PKG_VERSION"));

/// Opens a URL for streaming.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET `url` with extra `headers`; non-success statuses are errors.
    async fn open(
        &self,
        url: &Url,
        ssl_verify: bool,
        headers: &BTreeMap<String, String>,
    ) -> Result<BoxByteSource>;
}

/// [`HttpTransport`] backed by `reqwest`.
#[derive(Debug, Default, Clone)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    /// Create a transport.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn client(url: &Url, ssl_verify: bool) -> Result<Client> {
        Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(!ssl_verify)
            .build()
            .map_err(|e| Error::transfer(url.as_str(), e))
    }
}

fn header_map(url: &Url, headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::invalid_location(url.as_str(), format!("header '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::invalid_location(url.as_str(), format!("header '{name}': {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn open(
        &self,
        url: &Url,
        ssl_verify: bool,
        headers: &BTreeMap<String, String>,
    ) -> Result<BoxByteSource> {
        let client = Self::client(url, ssl_verify)?;
        debug!(%url, ssl_verify, "Opening HTTP transfer");

        let response = client
            .get(url.clone())
            .headers(header_map(url, headers)?)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Error::transfer(url.as_str(), e))?;

        Ok(Box::new(ResponseBody::new(url.as_str(), response)))
    }
}

/// Streams a `reqwest` response body chunk by chunk.
#[derive(Debug)]
pub struct ResponseBody {
    context: String,
    response: reqwest::Response,
}

impl ResponseBody {
    /// Wrap `response`; read failures are reported against `context`.
    #[must_use]
    pub fn new(context: impl Into<String>, response: reqwest::Response) -> Self {
        Self {
            context: context.into(),
            response,
        }
    }
}

#[async_trait]
impl ByteSource for ResponseBody {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        self.response
            .chunk()
            .await
            .map_err(|e| Error::transfer(self.context.as_str(), e))
    }
}
