//! Agent stream abstraction for TCP and Unix sockets.

use pin_project_lite::pin_project;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;

#[cfg(unix)]
pin_project! {
    /// A connected stream to an agent, over TCP or a Unix socket.
    #[project = AgentStreamProj]
    #[derive(Debug)]
    pub enum AgentStream {
        Tcp { #[pin] stream: TcpStream },
        Unix { #[pin] stream: UnixStream },
    }
}

#[cfg(not(unix))]
pin_project! {
    /// A connected stream to an agent over TCP.
    #[project = AgentStreamProj]
    #[derive(Debug)]
    pub enum AgentStream {
        Tcp { #[pin] stream: TcpStream },
    }
}

impl AgentStream {
    /// Returns whether this stream is a Unix socket.
    pub fn is_unix(&self) -> bool {
        #[cfg(unix)]
        {
            matches!(self, AgentStream::Unix { .. })
        }
        #[cfg(not(unix))]
        {
            false
        }
    }
}

impl AsyncRead for AgentStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.project() {
            AgentStreamProj::Tcp { stream } => stream.poll_read(cx, buf),
            #[cfg(unix)]
            AgentStreamProj::Unix { stream } => stream.poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for AgentStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.project() {
            AgentStreamProj::Tcp { stream } => stream.poll_write(cx, buf),
            #[cfg(unix)]
            AgentStreamProj::Unix { stream } => stream.poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            AgentStreamProj::Tcp { stream } => stream.poll_flush(cx),
            #[cfg(unix)]
            AgentStreamProj::Unix { stream } => stream.poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            AgentStreamProj::Tcp { stream } => stream.poll_shutdown(cx),
            #[cfg(unix)]
            AgentStreamProj::Unix { stream } => stream.poll_shutdown(cx),
        }
    }
}
