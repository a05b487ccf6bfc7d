//! HTTP transport shared by release resolution and artifact download.
//!
//! [`HttpTransport`] is the seam the pipeline depends on, so tests can serve
//! canned responses without network access. [`UreqTransport`] is the
//! production implementation and retries transient failures according to
//! its [`RetryPolicy`].

use std::io::{ErrorKind as IoErrorKind, Read};
use std::time::Duration;

use log::{debug, warn};

use crate::error::{Result, UpdateError};
use crate::retry::RetryPolicy;

/// Network timeout applied to each request, including reading the body.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Upper bound on the buffer reserved from a declared `Content-Length`.
const MAX_PREALLOCATION: usize = 64 * 1024 * 1024;

/// Identifies the updater to the release API, which rejects anonymous agents.
const USER_AGENT: &str = concat!("simple64-updater/", env!("CARGO_PKG_VERSION"));

/// A fully-read HTTP response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// The response body.
    pub body: Vec<u8>,
    /// The value of the `Content-Length` header, when present and valid.
    pub content_length: Option<u64>,
}

/// Performs HTTP GET requests.
#[cfg_attr(test, mockall::automock)]
pub trait HttpTransport: Send + Sync {
    /// Fetch `url` and return its body once the server answered with a
    /// success status.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::HttpStatus`] for non-success status codes and
    /// [`UpdateError::Network`] for transport failures.
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for std::sync::Arc<T> {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        (**self).get(url)
    }
}

/// `ureq`-backed transport with bounded retry.
#[derive(Debug)]
pub struct UreqTransport {
    agent: ureq::Agent,
    retry: RetryPolicy,
}

struct AttemptError {
    error: UpdateError,
    transient: bool,
}

impl UreqTransport {
    /// Create a transport using the given retry policy.
    #[must_use]
    pub fn new(retry: RetryPolicy) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            retry,
        }
    }

    fn get_once(&self, url: &str) -> std::result::Result<HttpResponse, AttemptError> {
        let response = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;

        let content_length = response
            .headers()
            .get("content-length")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());

        let capacity = content_length
            .and_then(|len| usize::try_from(len).ok())
            .unwrap_or_default()
            .min(MAX_PREALLOCATION);
        let mut body = Vec::with_capacity(capacity);
        response
            .into_body()
            .as_reader()
            .read_to_end(&mut body)
            .map_err(|e| AttemptError {
                transient: is_transient_io(e.kind()),
                error: UpdateError::Network {
                    url: url.to_owned(),
                    reason: format!("could not read HTTP response: {e}"),
                },
            })?;

        Ok(HttpResponse {
            body,
            content_length,
        })
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl HttpTransport for UreqTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        let attempts = self.retry.max_attempts();
        let mut attempt = 0;
        loop {
            debug!("GET {url} (attempt {} of {attempts})", attempt + 1);
            match self.get_once(url) {
                Ok(response) => return Ok(response),
                Err(failure) if failure.transient && attempt + 1 < attempts => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        "transient failure fetching {url}: {}; retrying in {delay:?}",
                        failure.error
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }
}

/// Map a ureq error to an [`UpdateError`], noting whether it is worth retrying.
fn map_ureq_error(url: &str, err: &ureq::Error) -> AttemptError {
    match err {
        ureq::Error::StatusCode(status) => AttemptError {
            transient: is_transient_status(*status),
            error: UpdateError::HttpStatus {
                url: url.to_owned(),
                status: *status,
            },
        },
        other => AttemptError {
            transient: is_transient_transport(other),
            error: UpdateError::Network {
                url: url.to_owned(),
                reason: other.to_string(),
            },
        },
    }
}

fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

fn is_transient_transport(err: &ureq::Error) -> bool {
    match err {
        ureq::Error::Io(io) => is_transient_io(io.kind()),
        ureq::Error::Timeout(_) | ureq::Error::ConnectionFailed => true,
        _ => false,
    }
}

const fn is_transient_io(kind: IoErrorKind) -> bool {
    matches!(
        kind,
        IoErrorKind::ConnectionReset
            | IoErrorKind::ConnectionAborted
            | IoErrorKind::ConnectionRefused
            | IoErrorKind::BrokenPipe
            | IoErrorKind::TimedOut
            | IoErrorKind::UnexpectedEof
            | IoErrorKind::Interrupted
    )
}
