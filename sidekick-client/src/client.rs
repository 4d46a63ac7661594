//! High-level client API.

use crate::config::AgentConfig;
use crate::connection;
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::error::ClientError;
use crate::exchange::{build_and_send, receive_and_parse};
use sidekick_protocol::{Base64Decoder, Secret, SecretDecoder, SecretId};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// Fetches secrets from an agent, one connection per request.
pub struct SecretClient {
    config: AgentConfig,
    decoder: Arc<dyn SecretDecoder + Send + Sync>,
    diagnostics: Arc<dyn Diagnostics + Send + Sync>,
}

impl SecretClient {
    /// Creates a client that decodes base64 and reports failures via `tracing`.
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            decoder: Arc::new(Base64Decoder),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics + Send + Sync>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn SecretDecoder + Send + Sync>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Connects to the configured agent, requests `id` and returns the
    /// decoded secret. The connection is closed before returning.
    ///
    /// Nothing is retried here; see [`ClientError::is_retryable`].
    pub async fn fetch(&self, id: &SecretId) -> Result<Secret, ClientError> {
        let mut stream = connection::connect(&self.config.endpoint, self.config.connect_timeout())
            .await
            .map_err(|e| {
                self.diagnostics
                    .report(&format!("failed connecting to {}: {}", self.config.endpoint, e));
                e
            })?;

        let result = self.fetch_with_stream(&mut stream, id).await;

        if let Err(e) = stream.shutdown().await {
            tracing::debug!("Shutdown after exchange failed: {}", e);
        }
        result
    }

    /// Runs one exchange over an already connected stream.
    pub async fn fetch_with_stream<S>(
        &self,
        stream: &mut S,
        id: &SecretId,
    ) -> Result<Secret, ClientError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let timeout = self.config.timeout();
        build_and_send(stream, id, timeout, self.diagnostics.as_ref()).await?;
        receive_and_parse(
            stream,
            timeout,
            self.decoder.as_ref(),
            self.diagnostics.as_ref(),
        )
        .await
    }
}
