//! # sidekick-client
//!
//! Client library for fetching secrets from a secret agent.
//!
//! This crate provides:
//! - TCP and Unix socket connections to the agent
//! - The request/reply exchange (`build_and_send`, `receive_and_parse`)
//! - An injectable diagnostics sink for failure reports
//! - Configuration loading (YAML file + environment overrides)
//! - A high-level `SecretClient`

pub mod client;
pub mod config;
pub mod connection;
pub mod diagnostics;
pub mod error;
pub mod exchange;
pub mod stream;

pub use client::SecretClient;
pub use config::{AgentConfig, ConfigError, Endpoint};
pub use diagnostics::{Diagnostics, TracingDiagnostics};
pub use error::{ClientError, FailureKind};
pub use exchange::{build_and_send, receive_and_parse};
pub use stream::AgentStream;
