// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Conditional feed retrieval with explicit redirect handling.

use std::time::Duration;

use jiff::Timestamp;
use jiff::fmt::rfc2822;
use jiff::tz::TimeZone;
use reqwest::header::{
    ACCEPT, CONNECTION, CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
    LOCATION,
};
use reqwest::{Client, Response, StatusCode, redirect};
use url::Url;

use crate::charset::charset_from_content_type;
use crate::config::FetchConfig;
use crate::error::FeedError;
use crate::types::Credentials;

/// Maximum number of redirect hops followed before giving up.
pub const MAX_REDIRECTS: u32 = 5;

/// Calendar data preferred, but any response body is accepted.
const MIME_CALENDAR_OR_OTHER: &str = "text/calendar, */*;q=0.9";

static HTTP_DATE_PARSER: rfc2822::DateTimeParser = rfc2822::DateTimeParser::new();

/// One feed retrieval attempt.
///
/// Cache validators from the previous successful fetch go in; if the server
/// issues a permanent redirect at any point, the final target lands in
/// [`permanent_url`](Self::permanent_url), including when the attempt
/// ultimately fails, so the caller can persist the canonical location on
/// every exit path.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Current feed location.
    pub url: Url,
    /// `ETag` of the last successfully fetched body, sent as `If-None-Match`.
    pub etag: Option<String>,
    /// `Last-Modified` of the last successfully fetched body, sent as
    /// `If-Modified-Since`.
    pub last_modified: Option<Timestamp>,
    /// Basic authentication credentials, if the feed requires them.
    pub credentials: Option<Credentials>,
    /// Set to the target of the latest permanent (301) redirect.
    pub permanent_url: Option<Url>,
}

impl FetchRequest {
    /// Creates an unconditional, unauthenticated request for `url`.
    #[must_use]
    pub const fn new(url: Url) -> Self {
        Self {
            url,
            etag: None,
            last_modified: None,
            credentials: None,
            permanent_url: None,
        }
    }
}

/// A successfully fetched and decoded feed body.
#[derive(Debug, Clone)]
pub struct FetchedFeed {
    /// Decoded feed text.
    pub text: String,
    /// `ETag` response header, the next request's `If-None-Match`.
    pub etag: Option<String>,
    /// `Last-Modified` response header, the next request's
    /// `If-Modified-Since`.
    pub last_modified: Option<Timestamp>,
}

/// Result of a feed retrieval.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The server returned a new body.
    Feed(FetchedFeed),
    /// The feed has not changed since the validators were captured.
    NotModified,
}

/// Retrieves calendar feeds over HTTP(S) or from the local filesystem.
///
/// Redirects are never followed by the transport; the fetcher handles them
/// itself so a permanent redirect can be told apart from a temporary one.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    /// Creates a new fetcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &FetchConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Performs one retrieval attempt for `request`.
    ///
    /// `file` URLs are read from the filesystem and always treated as
    /// status 200. For HTTP(S), conditional headers are sent when validators
    /// are present, and at most [`MAX_REDIRECTS`] hops are followed.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Transport`] on I/O failure, exhausted redirects,
    /// a redirect without a `Location` or an HTTPS-to-HTTP downgrade;
    /// [`FeedError::HttpStatus`] for any other unusable response status.
    pub async fn fetch(&self, request: &mut FetchRequest) -> Result<FetchOutcome, FeedError> {
        if request.url.scheme() == "file" {
            return fetch_file(&request.url).await.map(FetchOutcome::Feed);
        }

        let mut url = request.url.clone();
        for _ in 0..MAX_REDIRECTS {
            tracing::info!(%url, "fetching calendar feed");
            let resp = self.send(&url, request).await?;
            let status = resp.status();

            if status == StatusCode::NOT_MODIFIED {
                // don't read a body
                tracing::info!(%url, "feed not modified since last sync");
                return Ok(FetchOutcome::NotModified);
            }

            if status.is_redirection() {
                let Some(location) = header_str(&resp, LOCATION) else {
                    return Err(FeedError::Transport(format!(
                        "got {} redirect without Location",
                        status.as_u16()
                    )));
                };
                let target = url.join(&location).map_err(|e| {
                    FeedError::Transport(format!("invalid redirect target {location}: {e}"))
                })?;
                // never downgrade to a potentially insecure protocol
                if url.scheme() == "https" && target.scheme() != "https" {
                    return Err(FeedError::Transport(format!(
                        "refusing redirect from HTTPS to {}",
                        target.scheme()
                    )));
                }
                tracing::debug!(status = status.as_u16(), %target, "following redirect");
                if status == StatusCode::MOVED_PERMANENTLY {
                    request.permanent_url = Some(target.clone());
                }
                url = target;
                continue;
            }

            if status == StatusCode::OK {
                return read_feed(resp).await.map(FetchOutcome::Feed);
            }

            return Err(FeedError::HttpStatus {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        Err(FeedError::Transport(format!(
            "more than {MAX_REDIRECTS} redirects"
        )))
    }

    async fn send(&self, url: &Url, request: &FetchRequest) -> Result<Response, FeedError> {
        let mut req = self
            .client
            .get(url.clone())
            .header(ACCEPT, MIME_CALENDAR_OR_OTHER)
            // some servers misbehave when a redirected connection is
            // reused; always ask for a fresh one
            .header(CONNECTION, "close");

        if let Some(etag) = &request.etag {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = request.last_modified {
            req = req.header(IF_MODIFIED_SINCE, format_http_date(last_modified));
        }
        if let Some(credentials) = &request.credentials {
            req = req.basic_auth(&credentials.username, Some(&credentials.password));
        }

        Ok(req.send().await?)
    }
}

async fn read_feed(resp: Response) -> Result<FetchedFeed, FeedError> {
    let etag = header_str(&resp, ETAG);
    let last_modified = header_str(&resp, LAST_MODIFIED).and_then(|v| parse_http_date(&v));
    let content_type = header_str(&resp, CONTENT_TYPE);

    let bytes = resp.bytes().await?;
    let encoding = charset_from_content_type(content_type.as_deref());
    let (text, ..) = encoding.decode(&bytes);

    Ok(FetchedFeed {
        text: text.into_owned(),
        etag,
        last_modified,
    })
}

/// Reads a `file` URL, simulating an HTTP 200 with no validators.
async fn fetch_file(url: &Url) -> Result<FetchedFeed, FeedError> {
    let path = url
        .to_file_path()
        .map_err(|()| FeedError::MalformedSource(format!("not a local file path: {url}")))?;

    tracing::info!(path = %path.display(), "reading local calendar file");
    let bytes = tokio::fs::read(&path).await?;
    let (text, ..) = encoding_rs::UTF_8.decode(&bytes);

    Ok(FetchedFeed {
        text: text.into_owned(),
        etag: None,
        last_modified: None,
    })
}

fn header_str(resp: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn parse_http_date(value: &str) -> Option<Timestamp> {
    HTTP_DATE_PARSER.parse_timestamp(value).ok()
}

fn format_http_date(stamp: Timestamp) -> String {
    stamp
        .to_zoned(TimeZone::UTC)
        .strftime("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_date_formats_as_imf_fixdate() {
        let stamp: Timestamp = "2015-10-21T07:28:00Z".parse().unwrap();
        assert_eq!(format_http_date(stamp), "Wed, 21 Oct 2015 07:28:00 GMT");
    }

    #[test]
    fn http_date_parses_imf_fixdate() {
        let stamp = parse_http_date("Wed, 21 Oct 2015 07:28:00 GMT").expect("date parses");
        assert_eq!(stamp, "2015-10-21T07:28:00Z".parse().unwrap());
    }

    #[test]
    fn http_date_rejects_garbage() {
        assert_eq!(parse_http_date("last tuesday"), None);
    }
}
