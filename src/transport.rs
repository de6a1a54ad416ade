use bytes::Bytes;
use log::*;
use reqwest::header;

use crate::consts;

/// HTTP methods used by the OSC API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// Network-level failure of an HTTP exchange.
///
/// Every request error is folded into one of these variants so callers can
/// match on the failure class instead of digging through [`reqwest::Error`].
/// HTTP error statuses are not transport errors; they reach the caller as a
/// regular [`RawResponse`].
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("Could not connect to the device")]
    Connection(#[source] reqwest::Error),

    #[error("The device did not answer in time")]
    Timeout(#[source] reqwest::Error),

    #[error("Too many redirects while reaching the device")]
    TooManyRedirects(#[source] reqwest::Error),

    #[error("HTTP request failed")]
    Request(#[source] reqwest::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else if err.is_connect() {
            Self::Connection(err)
        } else if err.is_redirect() {
            Self::TooManyRedirects(err)
        } else {
            Self::Request(err)
        }
    }
}

/// A buffered HTTP response: whatever status the device answered with, plus
/// the full body.
#[derive(Debug)]
pub struct RawResponse {
    pub status: reqwest::StatusCode,
    pub body: Bytes,
}

/// Low-level HTTP plumbing for one camera endpoint.
///
/// Owns the connection pool and the fixed request headers (`User-Agent` and
/// `X-XSRF-Protected: 1`, which OSC devices require on every request). The
/// host and port are fixed for the lifetime of the transport.
pub struct Transport {
    http: reqwest::Client,
    host: String,
    port: u16,
}

impl Transport {
    /// Builds a transport for the device at `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, TransportError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(consts::USER_AGENT),
        );
        headers.insert(
            header::HeaderName::from_static(consts::XSRF_HEADER),
            header::HeaderValue::from_static("1"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(consts::CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            host: host.into(),
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}:{}{}", self.host, self.port, path)
    }

    fn request(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> reqwest::RequestBuilder {
        let url = self.url(path);

        debug!("{} {url}", method.as_str());

        let mut request = self.http.request(method.into(), url);

        if let Some(body) = body {
            request = request
                .header(header::CONTENT_TYPE, consts::JSON_CONTENT_TYPE)
                .body(body);
        }

        request
    }

    /// Performs a buffered round trip under the command read timeout.
    ///
    /// * `method` - HTTP method of the request.
    /// * `path` - Endpoint path, such as `/osc/commands/execute`.
    /// * `body` - Optional JSON body; sets the protocol `Content-Type`.
    ///
    /// Any HTTP status the device answers with is returned as data;
    /// interpreting error statuses is the caller's concern.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse, TransportError> {
        let response = self
            .request(method, path, body)
            .timeout(consts::COMMAND_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        debug!("{} {} answered {status} ({} bytes)", method.as_str(), path, body.len());

        Ok(RawResponse { status, body })
    }

    /// Sends a request and hands back the response with the body unread.
    /// Used for image downloads, which may be large and are not bounded by
    /// the command read timeout.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response, TransportError> {
        Ok(self.request(method, path, body).send().await?)
    }
}
