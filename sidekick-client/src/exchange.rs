//! One request/reply exchange with the agent.
//!
//! [`build_and_send`] frames and writes the request; [`receive_and_parse`]
//! reads the reply and extracts the secret. Each step is terminal on failure:
//! nothing partial is ever returned, and every failure is reported to the
//! [`Diagnostics`] sink before it is returned.
//!
//! The protocol has no request ids, so a stream must carry at most one
//! exchange at a time. Both functions take the stream by `&mut`.

use crate::diagnostics::Diagnostics;
use crate::error::ClientError;
use sidekick_protocol::message::SECRET_VALUE_FIELD;
use sidekick_protocol::{
    encode_frame, trim_encoded, AgentReply, FrameHeader, ProtocolError, Secret, SecretDecoder,
    SecretId, FRAME_HEADER_SIZE, MAX_RESPONSE_SIZE,
};
use std::io::ErrorKind;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Builds the request for `id`, frames it and writes it in full within
/// `timeout`.
pub async fn build_and_send<S>(
    stream: &mut S,
    id: &SecretId,
    timeout: Duration,
    diagnostics: &dyn Diagnostics,
) -> Result<(), ClientError>
where
    S: AsyncWrite + Unpin,
{
    let payload = id
        .request()
        .to_json()
        .map_err(|e| reported(diagnostics, e))?;
    let frame = encode_frame(&payload).map_err(|e| reported(diagnostics, e))?;

    let written = tokio::time::timeout(timeout, async {
        stream.write_all(&frame).await?;
        stream.flush().await
    })
    .await;

    let err = match written {
        Ok(Ok(())) => {
            tracing::debug!("Secret request sent ({} bytes)", frame.len());
            return Ok(());
        }
        Ok(Err(e)) => ClientError::Io(e),
        Err(_) => ClientError::Timeout("sending request"),
    };

    diagnostics.report(&format!(
        "failed asking for secret - {}: {}",
        String::from_utf8_lossy(&payload),
        err
    ));
    Err(err)
}

/// Reads one framed reply within `timeout` per read and extracts the secret.
pub async fn receive_and_parse<S>(
    stream: &mut S,
    timeout: Duration,
    decoder: &dyn SecretDecoder,
    diagnostics: &dyn Diagnostics,
) -> Result<Secret, ClientError>
where
    S: AsyncRead + Unpin,
{
    let mut header_buf = [0u8; FRAME_HEADER_SIZE];
    read_exact(stream, &mut header_buf, timeout, "reading reply header", diagnostics).await?;

    let header = FrameHeader::decode(&header_buf);
    let payload_len = header
        .validate(MAX_RESPONSE_SIZE)
        .map_err(|e| reported(diagnostics, e))?;
    tracing::debug!("Reply header received, payload {} bytes", payload_len);

    let mut payload = vec![0u8; payload_len];
    read_exact(stream, &mut payload, timeout, "reading reply payload", diagnostics).await?;

    let encoded = match AgentReply::parse(&payload).map_err(|e| reported(diagnostics, e))? {
        AgentReply::Secret(encoded) => encoded,
        AgentReply::Failure(message) => {
            return Err(reported(diagnostics, ClientError::Agent { message }));
        }
        AgentReply::Unrecognized => {
            return Err(reported(
                diagnostics,
                ProtocolError::MissingField(SECRET_VALUE_FIELD),
            ));
        }
    };

    let Some(trimmed) = trim_encoded(&encoded) else {
        diagnostics.report(if encoded.is_empty() {
            "empty secret"
        } else {
            "whitespace-only secret"
        });
        return Err(ClientError::EmptySecret);
    };

    let secret = decoder
        .decode_secret(trimmed)
        .map_err(|e| reported(diagnostics, e))?;
    tracing::debug!("Secret decoded ({} bytes)", secret.len());
    Ok(secret)
}

async fn read_exact<S>(
    stream: &mut S,
    buf: &mut [u8],
    timeout: Duration,
    what: &'static str,
    diagnostics: &dyn Diagnostics,
) -> Result<(), ClientError>
where
    S: AsyncRead + Unpin,
{
    let err = match tokio::time::timeout(timeout, stream.read_exact(buf)).await {
        Ok(Ok(_)) => return Ok(()),
        Ok(Err(e)) if e.kind() == ErrorKind::UnexpectedEof => ClientError::ConnectionClosed,
        Ok(Err(e)) => ClientError::Io(e),
        Err(_) => ClientError::Timeout(what),
    };

    diagnostics.report(&format!(
        "failed {} ({} bytes expected): {}",
        what,
        buf.len(),
        err
    ));
    Err(err)
}

fn reported(diagnostics: &dyn Diagnostics, err: impl Into<ClientError>) -> ClientError {
    let err = err.into();
    diagnostics.report(&err.to_string());
    err
}
