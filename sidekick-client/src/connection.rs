//! Connection establishment.

use crate::config::Endpoint;
use crate::error::ClientError;
use crate::stream::AgentStream;
use std::time::Duration;
use tokio::net::TcpStream;

/// Connects to the agent at `endpoint` within `connect_timeout`.
pub async fn connect(
    endpoint: &Endpoint,
    connect_timeout: Duration,
) -> Result<AgentStream, ClientError> {
    tracing::debug!("Connecting to {}...", endpoint);

    let stream = tokio::time::timeout(connect_timeout, open(endpoint))
        .await
        .map_err(|_| {
            tracing::debug!("Connection timeout");
            ClientError::Timeout("connect")
        })?
        .map_err(|e| {
            tracing::debug!("Connection failed: {}", e);
            ClientError::Io(e)
        })?;

    tracing::debug!("Connected to {}", endpoint);
    Ok(stream)
}

async fn open(endpoint: &Endpoint) -> std::io::Result<AgentStream> {
    match endpoint {
        Endpoint::Tcp(addr) => {
            let stream = TcpStream::connect(addr.as_str()).await?;
            // Requests are a single small write.
            stream.set_nodelay(true).ok();
            Ok(AgentStream::Tcp { stream })
        }
        #[cfg(unix)]
        Endpoint::Unix(path) => {
            let stream = tokio::net::UnixStream::connect(path).await?;
            Ok(AgentStream::Unix { stream })
        }
        #[cfg(not(unix))]
        Endpoint::Unix(path) => Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            format!("unix sockets are not supported here: {}", path.display()),
        )),
    }
}
