//! Conditional-fetch JSON cache.
//!
//! Fetches a JSON document over HTTP(S) and keeps the last good body together
//! with the server's ETag, so later fetches can revalidate with `If-None-Match`
//! and survive network outages.
//!
//! # Module Organization
//!
//! - **Core types**: `CacheKey`, `CacheEntry`, `ConditionalHeaders`
//! - **Seams**: `Transport` (HTTP GET) and `CacheStorage` (text files), with the
//!   `ReqwestTransport` and `FsStorage` implementations
//! - **Protocol**: `Fetcher` and the `fetch` entry points
//!
//! # Cache Layout
//!
//! Two artifacts per URL, named after the SHA-256 of the URL:
//!
//! ```text
//! .http-cache/
//!   etag_2cf24dba...9824.txt    # validator (raw ETag text, empty if none)
//!   data_2cf24dba...9824.json   # last decoded body (JSON)
//! ```
//!
//! The directory defaults to `.http-cache`; override with `$ETAG_CACHE_DIR`.
//!
//! Concurrent fetches of the same URL against one cache directory are not
//! coordinated and may interleave their reads and writes.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! let value = etag_cache::cache::fetch(
//!     "https://api.github.com/repos/rust-lang/rust",
//!     Path::new(".http-cache"),
//!     None,
//! )
//! .unwrap();
//! println!("{value}");
//! ```

mod error;
mod fetch;
mod meta;
mod options;
mod path;
mod storage;
mod transport;

#[cfg(test)]
mod testing;

pub use error::{FetchError, StorageError, TransportError};
pub use fetch::{FetchOutcome, Fetcher, Resolution, check_scheme, fetch, fetch_with_options};
pub use meta::{CacheEntry, ConditionalHeaders};
pub use options::{
    CACHE_DIR_ENV, DEFAULT_CACHE_DIR, FetchOptions, default_cache_dir, parse_duration,
};
pub use path::CacheKey;
pub use storage::{CacheStorage, EntryFiles, FsStorage, write_output};
pub use transport::{CancelToken, ReqwestTransport, Transport, TransportResponse};
