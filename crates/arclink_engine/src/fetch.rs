use std::time::Duration;

use arclink_core::link_host;
use arclink_logging::arclink_request;
use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, COOKIE, USER_AGENT};

use crate::limiter::RateLimiter;
use crate::{decode_page, FailureKind, TransportError};

pub const DEFAULT_CATALOG_URL: &str = "https://www.fakku.net";
pub const DEFAULT_MIRROR_URL: &str = "https://panda.chaika.moe";
pub const SESSION_COOKIE_NAME: &str = "fakku_sid";

/// Settings shared by the catalog and mirror clients.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub permits: usize,
    pub window: Duration,
    pub user_agent: String,
    pub catalog_url: String,
    pub mirror_url: String,
    /// Catalog session id, sent as a cookie to the catalog host only.
    pub session_cookie: Option<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            permits: 4,
            window: Duration::from_secs(1),
            user_agent:
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0"
                    .to_string(),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            mirror_url: DEFAULT_MIRROR_URL.to_string(),
            session_cookie: None,
        }
    }
}

/// A fetched page, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePage {
    pub status: u16,
    pub final_url: String,
    pub body: String,
}

impl SourcePage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client for the external sources. Every request waits on one shared
/// [`RateLimiter`].
#[derive(Debug)]
pub struct SourceClient {
    client: reqwest::Client,
    limiter: RateLimiter,
    settings: SourceSettings,
    cookie_host: Option<String>,
}

impl SourceClient {
    pub fn new(settings: SourceSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| TransportError::new(FailureKind::Network, err.to_string()))?;
        let limiter = RateLimiter::new(settings.permits, settings.window);
        let cookie_host = link_host(&settings.catalog_url);
        Ok(Self {
            client,
            limiter,
            settings,
            cookie_host,
        })
    }

    pub fn settings(&self) -> &SourceSettings {
        &self.settings
    }

    /// GETs a page and decodes its body. Non-success statuses are returned, not
    /// raised; callers decide what a 404 means.
    pub async fn get_page(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<SourcePage, TransportError> {
        let response = self.send(url, headers).await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = content_type(&response);
        let bytes = read_body(response, self.settings.max_bytes).await?;
        Ok(SourcePage {
            status,
            final_url,
            body: decode_page(&bytes, content_type.as_deref()),
        })
    }

    /// GETs a page and reports whether it answered 2xx.
    pub async fn is_available(&self, url: &str) -> Result<bool, TransportError> {
        let response = self.send(url, &[]).await?;
        Ok(response.status().is_success())
    }

    async fn send(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<reqwest::Response, TransportError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let mut request = self
            .client
            .get(parsed)
            .header(USER_AGENT, self.settings.user_agent.as_str());
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        if let Some(cookie) = self.cookie_for(url) {
            request = request.header(COOKIE, cookie);
        }

        self.limiter.acquire().await;
        let response = request.send().await.map_err(map_reqwest_error)?;
        arclink_request!("GET", url, response.status());
        Ok(response)
    }

    fn cookie_for(&self, url: &str) -> Option<String> {
        let sid = self.settings.session_cookie.as_deref()?;
        let wanted = self.cookie_host.as_deref()?;
        (link_host(url).as_deref() == Some(wanted)).then(|| format!("{SESSION_COOKIE_NAME}={sid}"))
    }
}

pub(crate) fn content_type(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

/// Streams a body into memory, refusing anything over `max_bytes`.
pub(crate) async fn read_body(
    response: reqwest::Response,
    max_bytes: u64,
) -> Result<Vec<u8>, TransportError> {
    if let Some(content_len) = response.content_length() {
        if content_len > max_bytes {
            return Err(TransportError::new(
                FailureKind::TooLarge {
                    max_bytes,
                    actual: Some(content_len),
                },
                "response too large",
            ));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        let next_len = bytes.len() as u64 + chunk.len() as u64;
        if next_len > max_bytes {
            return Err(TransportError::new(
                FailureKind::TooLarge {
                    max_bytes,
                    actual: Some(next_len),
                },
                "response too large",
            ));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(FailureKind::Timeout, err.to_string());
    }
    TransportError::new(FailureKind::Network, err.to_string())
}
