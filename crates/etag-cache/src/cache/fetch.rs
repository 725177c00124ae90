//! HTTP fetch with ETag revalidation and fallback.
//!
//! One fetch walks a small state machine:
//!
//! ```text
//! ReadCache ──> Request ──2xx──> DecodeFresh ──> Done(Fresh)
//!    │             ├──304──> Done(NotModified)        (cached body)
//!    │             ├──other status──> error
//!    │             └──fault──┐
//!    └──unreadable───────> Fallback ──cached body──> Done(CachedFallback)
//!                              └──none/corrupt──> RetryUnconditional
//!                                                   ├──2xx──> DecodeFresh ──> Done(Retried)
//!                                                   └──anything else──> original fault
//! ```

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::error::{FetchError, StorageError, TransportError};
use super::meta::{CacheEntry, ConditionalHeaders};
use super::options::FetchOptions;
use super::path::CacheKey;
use super::storage::{CacheStorage, EntryFiles, FsStorage, write_output};
use super::transport::{CancelToken, ReqwestTransport, Transport, TransportResponse};

/// Where the returned value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// 2xx on the first request
    Fresh,
    /// 304, served from the cached body
    NotModified,
    /// Network or storage fault, served from the cached body
    CachedFallback,
    /// Network or storage fault, then 2xx on the unconditional retry
    Retried,
}

impl Resolution {
    pub fn from_cache(self) -> bool {
        matches!(self, Resolution::NotModified | Resolution::CachedFallback)
    }
}

/// Result of a fetch operation.
#[derive(Debug)]
pub struct FetchOutcome {
    /// The decoded payload
    pub value: Value,
    pub resolution: Resolution,
    /// Cache key the URL maps to
    pub key: CacheKey,
    /// Set when a fresh value could not be written to the cache.
    ///
    /// The validator record is blanked before the body is replaced, so after a
    /// failure the next fetch is unconditional.
    pub cache_error: Option<StorageError>,
}

#[derive(Debug)]
enum State {
    ReadCache,
    Request { headers: ConditionalHeaders },
    DecodeFresh { response: TransportResponse, retried: bool },
    Fallback { fault: FetchError },
    RetryUnconditional { fault: FetchError },
    Done {
        value: Value,
        resolution: Resolution,
        cache_error: Option<StorageError>,
    },
}

/// Conditional-fetch cache over an injectable transport and storage.
pub struct Fetcher<T, S> {
    transport: T,
    storage: S,
    cancel: CancelToken,
}

impl<T: Transport, S: CacheStorage> Fetcher<T, S> {
    pub fn new(transport: T, storage: S) -> Self {
        Self {
            transport,
            storage,
            cancel: CancelToken::default(),
        }
    }

    /// Abort in-flight requests when `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch `url` as JSON, revalidating against the cache in `cache_dir`.
    ///
    /// When `output` is given, the resolved value is also written there.
    pub fn fetch(
        &self,
        url: &str,
        cache_dir: &Path,
        output: Option<&Path>,
    ) -> Result<Value, FetchError> {
        self.fetch_with_outcome(url, cache_dir, output)
            .map(|outcome| outcome.value)
    }

    /// Like [`Fetcher::fetch`], also reporting where the value came from.
    pub fn fetch_with_outcome(
        &self,
        url: &str,
        cache_dir: &Path,
        output: Option<&Path>,
    ) -> Result<FetchOutcome, FetchError> {
        check_scheme(url)?;

        self.storage
            .create_dir_all(cache_dir)
            .map_err(|e| StorageError::io(cache_dir, e))?;

        let key = CacheKey::for_url(url);
        let files = EntryFiles::new(&self.storage, cache_dir, &key);

        let mut state = State::ReadCache;
        let (value, resolution, cache_error) = loop {
            state = match self.step(url, &files, state)? {
                State::Done {
                    value,
                    resolution,
                    cache_error,
                } => break (value, resolution, cache_error),
                next => next,
            };
        };
        info!(url, %key, ?resolution, "fetch resolved");

        if let Some(path) = output {
            write_output(&self.storage, path, &value)?;
            debug!(url, path = %path.display(), "wrote output file");
        }

        Ok(FetchOutcome {
            value,
            resolution,
            key,
            cache_error,
        })
    }

    fn step<F: CacheStorage + ?Sized>(
        &self,
        url: &str,
        files: &EntryFiles<'_, F>,
        state: State,
    ) -> Result<State, FetchError> {
        match state {
            State::ReadCache => match files.read_validator() {
                Ok(validator) => {
                    debug!(url, has_validator = validator.is_some(), "read cache");
                    let entry = CacheEntry {
                        validator,
                        body: None,
                    };
                    Ok(State::Request {
                        headers: entry.conditional_headers(),
                    })
                }
                Err(e) => Ok(State::Fallback { fault: e.into() }),
            },

            State::Request { headers } => {
                match self.transport.get(url, &headers.to_pairs(), &self.cancel) {
                    Ok(response) if response.is_success() => Ok(State::DecodeFresh {
                        response,
                        retried: false,
                    }),
                    Ok(response) if response.is_not_modified() => match files.read_body() {
                        Ok(Some(value)) => Ok(State::Done {
                            value,
                            resolution: Resolution::NotModified,
                            cache_error: None,
                        }),
                        Ok(None) => Err(TransportError::NotModifiedWithoutCache.into()),
                        Err(e) => Ok(State::Fallback { fault: e.into() }),
                    },
                    Ok(response) => Err(TransportError::Status(response.status).into()),
                    Err(e) if e.is_fault() => Ok(State::Fallback { fault: e.into() }),
                    Err(e) => Err(e.into()),
                }
            }

            State::DecodeFresh { response, retried } => {
                let value: Value = serde_json::from_slice(&response.body)?;
                let entry = CacheEntry::fresh(value.clone(), response.etag().map(String::from));
                let cache_error = files.write(&entry).err();
                if let Some(e) = &cache_error {
                    warn!(url, error = %e, "failed to persist cache entry");
                }

                let resolution = if retried {
                    Resolution::Retried
                } else {
                    Resolution::Fresh
                };
                Ok(State::Done {
                    value,
                    resolution,
                    cache_error,
                })
            }

            State::Fallback { fault } => {
                warn!(url, error = %fault, "fetch failed, falling back to cached body");
                match files.read_body() {
                    Ok(Some(value)) => Ok(State::Done {
                        value,
                        resolution: Resolution::CachedFallback,
                        cache_error: None,
                    }),
                    Ok(None) => Ok(State::RetryUnconditional { fault }),
                    Err(e) => {
                        warn!(url, error = %e, "cached body unusable");
                        Ok(State::RetryUnconditional { fault })
                    }
                }
            }

            State::RetryUnconditional { fault } => {
                debug!(url, "retrying without validator");
                match self.transport.get(url, &[], &self.cancel) {
                    Ok(response) if response.is_success() => Ok(State::DecodeFresh {
                        response,
                        retried: true,
                    }),
                    Ok(response) => {
                        warn!(url, status = response.status, "unconditional retry failed");
                        Err(fault)
                    }
                    Err(e) => {
                        warn!(url, error = %e, "unconditional retry failed");
                        Err(fault)
                    }
                }
            }

            done @ State::Done { .. } => Ok(done),
        }
    }
}

/// Reject anything that is not an `http:`/`https:` URL.
pub fn check_scheme(url: &str) -> Result<(), FetchError> {
    if url.starts_with("http:") || url.starts_with("https:") {
        Ok(())
    } else {
        Err(FetchError::InvalidScheme(url.to_string()))
    }
}

/// Fetch a URL with caching, using the network and the local filesystem.
pub fn fetch(url: &str, cache_dir: &Path, output: Option<&Path>) -> Result<Value, FetchError> {
    let opts = FetchOptions {
        cache_dir: Some(cache_dir.to_path_buf()),
        ..Default::default()
    };
    fetch_with_options(url, output, &opts).map(|outcome| outcome.value)
}

/// Fetch a URL with caching as configured by `opts`.
pub fn fetch_with_options(
    url: &str,
    output: Option<&Path>,
    opts: &FetchOptions,
) -> Result<FetchOutcome, FetchError> {
    check_scheme(url)?;

    let transport = ReqwestTransport::new(opts)?;
    Fetcher::new(transport, FsStorage)
        .with_cancel(opts.cancel.clone())
        .fetch_with_outcome(url, &opts.resolved_cache_dir(), output)
}
