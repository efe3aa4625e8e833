//! Fetch, cache and keyword-filter the direct comments of a Hacker News thread.

pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod output;
pub mod resolver;
pub mod source;

pub use error::{Error, Result};
