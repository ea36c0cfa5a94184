//! HTTP requests, their execution and completion records.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};

use crate::cluster::RestConfig;
use crate::error::{Error, Result};

/// User agent sent with every API request.
const LIB_USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/discord-rest/discord-rest, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// HTTP methods used by the API. POST and PUT carry a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// Transport-level error kinds. The discriminants are stable; don't
/// reorder or renumber. `Success` means an HTTP status was obtained,
/// whatever that status was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum HttpError {
    #[default]
    Success = 0,
    Unknown = 1,
    Connection = 2,
    BindIpAddress = 3,
    Read = 4,
    Write = 5,
    ExceedRedirectCount = 6,
    Canceled = 7,
    SslConnection = 8,
    SslLoadingCerts = 9,
    SslServerVerification = 10,
    UnsupportedMultipartBoundaryChars = 11,
    Compression = 12,
}

/// The result of an HTTP request: status, headers, body and the
/// rate-limit snapshot parsed from the response headers.
#[derive(Debug, Clone, Default)]
pub struct HttpRequestCompletion {
    /// Response headers, last value per name.
    pub headers: HashMap<String, String>,
    /// HTTP status, e.g. 200 = OK, 429 = rate limited. 0 when the request
    /// never produced a response.
    pub status: u16,
    /// Transport error kind; `Success` whenever a status was obtained.
    pub error: HttpError,
    /// Rate-limit bucket tag advertised by the service.
    pub ratelimit_bucket: String,
    /// Request limit of the window.
    pub ratelimit_limit: u64,
    /// Requests remaining in the window.
    pub ratelimit_remaining: u64,
    /// Seconds until the window resets.
    pub ratelimit_reset_after: u64,
    /// Seconds to wait before a new attempt.
    pub ratelimit_retry_after: u64,
    /// True if the advertised limit applies across the whole API.
    pub ratelimit_global: bool,
    /// Response body; empty when status >= 400.
    pub body: String,
}

/// Completion callback. Runs on the completer task, exactly once per
/// submitted request. Completions for one endpoint arrive in submission
/// order.
pub type HttpCompletionEvent = Box<dyn FnOnce(&HttpRequestCompletion) + Send + 'static>;

/// One API request. Build it, then move it into
/// [`RequestQueue::post_request`](crate::rest::queue::RequestQueue::post_request),
/// which schedules it against the endpoint's rate-limit window.
pub struct HttpRequest {
    /// Endpoint name, e.g. `/api/guilds`.
    pub endpoint: String,
    /// Major and minor parameters, e.g. a guild id or `@me`.
    pub parameters: String,
    /// Body for POST and PUT.
    pub postdata: String,
    pub method: HttpMethod,
    complete_handler: Mutex<Option<HttpCompletionEvent>>,
    completed: AtomicBool,
}

impl HttpRequest {
    pub fn new(
        endpoint: impl Into<String>,
        parameters: impl Into<String>,
        method: HttpMethod,
        postdata: impl Into<String>,
        handler: impl FnOnce(&HttpRequestCompletion) + Send + 'static,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            parameters: parameters.into(),
            postdata: postdata.into(),
            method,
            complete_handler: Mutex::new(Some(Box::new(handler))),
            completed: AtomicBool::new(false),
        }
    }

    /// True once the request has been executed (or cancelled).
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_completed(&self) {
        self.completed.store(true, Ordering::Release);
    }

    /// Invoke the completion callback with `result`, if the request has
    /// completed. The callback runs at most once; later calls are no-ops.
    /// A panicking callback is logged and swallowed so the completer task
    /// survives.
    pub(crate) fn complete(&self, result: &HttpRequestCompletion) {
        if !self.is_completed() {
            return;
        }
        let handler = match self.complete_handler.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(handler) = handler {
            if catch_unwind(AssertUnwindSafe(|| handler(result))).is_err() {
                tracing::error!(endpoint = %self.endpoint, "completion handler panicked");
            }
        }
    }

    /// Perform the network round-trip and mark the request completed.
    /// Transport failures are reported through the completion record, not
    /// as an `Err`. Rate limits are NOT consulted here; that is the
    /// dispatcher's job.
    pub(crate) async fn run(
        &self,
        client: &reqwest::Client,
        config: &RestConfig,
    ) -> HttpRequestCompletion {
        let mut rv = HttpRequestCompletion::default();

        let url = if self.parameters.is_empty() {
            format!("{}{}", config.api_origin, self.endpoint)
        } else {
            format!("{}{}/{}", config.api_origin, self.endpoint, self.parameters)
        };

        let builder = match self.method {
            HttpMethod::Get => client.get(&url),
            HttpMethod::Post => client
                .post(&url)
                .header(CONTENT_TYPE, "application/json")
                .body(self.postdata.clone()),
            HttpMethod::Put => client
                .put(&url)
                .header(CONTENT_TYPE, "application/json")
                .body(self.postdata.clone()),
            HttpMethod::Patch => client.patch(&url),
            HttpMethod::Delete => client.delete(&url),
        };

        match builder.send().await {
            Ok(response) => populate_result(&mut rv, response).await,
            Err(e) => {
                rv.error = transport_error(&e);
                tracing::debug!(endpoint = %self.endpoint, error = %e, "transport failure");
            }
        }

        self.mark_completed();
        rv
    }
}

/// Build the shared HTTP client for a queue. Certificate verification is
/// off to tolerate clients with stale trust stores; redirects are
/// followed.
pub(crate) fn build_client(config: &RestConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    let auth = HeaderValue::from_str(&format!("Bot {}", config.token))
        .map_err(|e| Error::Config(format!("token is not a valid header value: {}", e)))?;
    headers.insert(AUTHORIZATION, auth);
    headers.insert(USER_AGENT, HeaderValue::from_static(LIB_USER_AGENT));

    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .default_headers(headers)
        .build()?;
    Ok(client)
}

/// Fill a completion record from an HTTP response.
async fn populate_result(rv: &mut HttpRequestCompletion, response: reqwest::Response) {
    let status = response.status().as_u16();
    let headers = response.headers();

    rv.status = status;
    for (name, value) in headers.iter() {
        if let Ok(v) = value.to_str() {
            rv.headers.insert(name.as_str().to_string(), v.to_string());
        }
    }
    rv.ratelimit_limit = header_u64(headers, "X-RateLimit-Limit");
    rv.ratelimit_remaining = header_u64(headers, "X-RateLimit-Remaining");
    rv.ratelimit_reset_after = header_u64(headers, "X-RateLimit-Reset-After");
    rv.ratelimit_retry_after = header_u64(headers, "X-RateLimit-Retry-After");
    rv.ratelimit_bucket = header_str(headers, "X-RateLimit-Bucket");
    rv.ratelimit_global = header_str(headers, "X-RateLimit-Global") == "true";

    let body = response.text().await.unwrap_or_default();
    if status < 400 {
        rv.body = body;
    }
}

/// Parse a decimal header value: leading digits only, so fractional
/// values truncate; 0 when missing or malformed.
fn header_u64(headers: &HeaderMap, name: &str) -> u64 {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| {
            s.chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>()
        })
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

fn header_str(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// Map a client error onto the stable transport taxonomy.
fn transport_error(e: &reqwest::Error) -> HttpError {
    if e.is_connect() {
        HttpError::Connection
    } else if e.is_redirect() {
        HttpError::ExceedRedirectCount
    } else if e.is_timeout() || e.is_body() || e.is_decode() {
        HttpError::Read
    } else {
        HttpError::Unknown
    }
}
