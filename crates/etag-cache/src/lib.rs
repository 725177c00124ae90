//! ETag-revalidating JSON fetch cache.
//!
//! See [`cache`] for the protocol and the on-disk layout.

pub mod cache;

pub use cache::{FetchError, FetchOptions, FetchOutcome, Fetcher, Resolution, fetch};
