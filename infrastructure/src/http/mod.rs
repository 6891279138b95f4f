//! HTTP adapter for the point-in-time debate API.

mod client;
mod error;

pub use client::HttpDebateApi;
pub use error::HttpError;
