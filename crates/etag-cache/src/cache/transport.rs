//! HTTP transport abstraction.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, bounded};
use reqwest::blocking::{Client, Request};
use tracing::debug;

use super::error::TransportError;
use super::options::FetchOptions;

/// How often a waiting request checks its [`CancelToken`].
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Status, headers and body of an HTTP response.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    /// Header names are lowercase
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The server's validator token, if it sent one.
    pub fn etag(&self) -> Option<&str> {
        self.header("etag").filter(|v| !v.trim().is_empty())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_modified(&self) -> bool {
        self.status == 304
    }
}

/// Cancellation signal shared between the caller and an in-flight fetch.
///
/// Cancelling aborts the wait for the network; the fetch then proceeds as if the
/// connection had failed. The request itself keeps running on its worker thread
/// until the server answers or `request_timeout` expires. Without a timeout that
/// thread can stay blocked for as long as the server holds the connection open.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Anything that can perform an HTTP GET with custom request headers.
///
/// Non-2xx statuses, 304 included, are returned as responses rather than errors.
pub trait Transport {
    fn get(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        cancel: &CancelToken,
    ) -> Result<TransportResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        cancel: &CancelToken,
    ) -> Result<TransportResponse, TransportError> {
        (**self).get(url, headers, cancel)
    }
}

/// [`Transport`] backed by a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a client honoring the timeout and user agent in `opts`.
    pub fn new(opts: &FetchOptions) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(opts.user_agent.clone())
            // Overrides reqwest's 30s blocking default; `None` waits indefinitely
            .timeout(opts.request_timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        cancel: &CancelToken,
    ) -> Result<TransportResponse, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }
        let request = request.build()?;

        // The request runs on its own thread so the caller can stop waiting on cancel
        let client = self.client.clone();
        let (tx, rx) = bounded(1);
        thread::Builder::new()
            .name("etag-cache-http".to_string())
            .spawn(move || {
                // Ignore send errors - the caller stopped waiting
                let _ = tx.send(execute(&client, request));
            })
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        loop {
            match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(result) => return result,
                Err(RecvTimeoutError::Timeout) => {
                    if cancel.is_cancelled() {
                        debug!(url, "request cancelled");
                        return Err(TransportError::Cancelled);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(TransportError::Connection(
                        "request worker exited".to_string(),
                    ));
                }
            }
        }
    }
}

fn execute(client: &Client, request: Request) -> Result<TransportResponse, TransportError> {
    let response = client.execute(request)?;
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response.bytes()?.to_vec();

    Ok(TransportResponse {
        status,
        headers,
        body,
    })
}
