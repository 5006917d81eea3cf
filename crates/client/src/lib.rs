//! Client code for offpage.
//!
//! This crate provides the HTTP fetch pipeline and the `Transport`
//! capability trait shared by the interceptor, the load orchestrator,
//! and the CLI.

pub mod fetch;
pub mod transport;

pub use fetch::{FetchClient, FetchConfig, FetchResponse};
pub use transport::{HttpTransport, Transport};
