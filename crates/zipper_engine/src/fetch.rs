use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect, Client, Response};
use url::Url;
use zipper_logging::zipper_trace;

use crate::{FailureKind, FetchError, FetchMetadata, FetchResult, Locator, Payload};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// Applies to each request of a redirect chain.
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Accepted MIME essences; empty accepts anything.
    pub allowed_content_types: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            redirect_limit: 5,
            max_bytes: 50 * 1024 * 1024,
            allowed_content_types: Vec::new(),
        }
    }
}

/// Retrieves the payload behind one locator.
///
/// Implementations report every failure through the returned `FetchError`;
/// they never retry.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, locator: &Locator) -> FetchResult;
}

#[derive(Debug, thiserror::Error)]
#[error("failed to build http client: {0}")]
pub struct ClientBuildError(#[from] reqwest::Error);

/// HTTP fetcher sharing one connection pool across every fetch of a run.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, ClientBuildError> {
        // Redirects are followed by hand so the chain can be counted and capped.
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// GET `start`, following up to `redirect_limit` redirects.
    async fn follow(&self, locator: &Locator, start: Url) -> Result<(Response, usize), FetchError> {
        let mut url = start;
        let mut redirects = 0;
        loop {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|err| map_reqwest_error(locator, err))?;

            let next = if response.status().is_redirection() {
                redirect_target(&url, &response)
            } else {
                None
            };
            let Some(next) = next else {
                return Ok((response, redirects));
            };
            if redirects >= self.settings.redirect_limit {
                return Err(FetchError::new(
                    locator.clone(),
                    FailureKind::RedirectLimitExceeded,
                    format!("more than {} redirect(s)", self.settings.redirect_limit),
                ));
            }
            zipper_trace!("{} redirects to {}", url, next);
            redirects += 1;
            url = next;
        }
    }

    fn check_content_type(&self, locator: &Locator, content_type: Option<&str>) -> Result<(), FetchError> {
        let allowed = &self.settings.allowed_content_types;
        let Some(content_type) = content_type else {
            return Ok(());
        };
        if allowed.is_empty() {
            return Ok(());
        }
        let essence = content_type.split(';').next().unwrap_or(content_type).trim();
        if allowed.iter().any(|a| a.eq_ignore_ascii_case(essence)) {
            return Ok(());
        }
        Err(FetchError::new(
            locator.clone(),
            FailureKind::UnsupportedContentType {
                content_type: content_type.to_string(),
            },
            "unsupported content type",
        ))
    }

    /// Stream the body, stopping as soon as it outgrows `max_bytes`.
    async fn read_body(&self, locator: &Locator, response: Response) -> Result<Vec<u8>, FetchError> {
        let max_bytes = self.settings.max_bytes;
        if let Some(declared) = response.content_length() {
            if declared > max_bytes {
                return Err(too_large(locator, max_bytes, declared));
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| map_reqwest_error(locator, err))?;
            let received = (body.len() + chunk.len()) as u64;
            if received > max_bytes {
                return Err(too_large(locator, max_bytes, received));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, locator: &Locator) -> FetchResult {
        let url = parse_locator(locator)?;
        let (response, redirect_count) = self.follow(locator, url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                locator.clone(),
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.check_content_type(locator, content_type.as_deref())?;

        let bytes = self.read_body(locator, response).await?;
        Ok(Payload {
            metadata: FetchMetadata {
                original_url: locator.to_string(),
                final_url,
                redirect_count,
                content_type,
                byte_len: bytes.len() as u64,
            },
            bytes,
        })
    }
}

fn parse_locator(locator: &Locator) -> Result<Url, FetchError> {
    let url = Url::parse(locator.as_str().trim())
        .map_err(|err| FetchError::new(locator.clone(), FailureKind::InvalidUrl, err.to_string()))?;
    if is_http(&url) {
        Ok(url)
    } else {
        Err(FetchError::new(
            locator.clone(),
            FailureKind::InvalidUrl,
            format!("unsupported scheme {}", url.scheme()),
        ))
    }
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Resolved `Location` of a redirect response. Missing, malformed or
/// non-http targets end the chain and surface as an HTTP status failure.
fn redirect_target(current: &Url, response: &Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location).ok().filter(is_http)
}

fn too_large(locator: &Locator, max_bytes: u64, actual: u64) -> FetchError {
    FetchError::new(
        locator.clone(),
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(locator: &Locator, err: reqwest::Error) -> FetchError {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else {
        FailureKind::Network
    };
    FetchError::new(locator.clone(), kind, err.to_string())
}
