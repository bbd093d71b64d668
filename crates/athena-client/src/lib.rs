//! athena-client: backend access for athena.
//!
//! Implements the `QuizBackend` trait over HTTP, resolves which backend to
//! talk to from configuration, and provides an in-memory mock backend for
//! tests.

pub mod config;
pub mod http;
pub mod mock;

pub use config::{create_backend, load_config, AthenaConfig, BackendUrlResolver, Environment};
pub use http::HttpBackend;
pub use mock::MockBackend;
