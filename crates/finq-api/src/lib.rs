//! Interface layer for the FinQ client: the [`QueryApi`] trait the
//! orchestration layer consumes, its HTTP implementation, and client
//! configuration.

pub mod client;
pub mod config;
pub mod http;

pub use client::QueryApi;
pub use config::ClientConfig;
pub use http::HttpQueryApi;
