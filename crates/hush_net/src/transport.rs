use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::{Instant, Sleep};
use tracing::debug;

pub struct TransportBuilder;

impl TransportBuilder {
    /// Opens a TCP connection with Nagle disabled, so each handshake record
    /// leaves in as few segments as the kernel allows.
    pub async fn connect(addr: SocketAddr, connect_timeout: Duration) -> io::Result<TcpStream> {
        let domain = if addr.is_ipv4() { Domain::IPV4 } else { Domain::IPV6 };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_nodelay(true)?;
        socket.set_keepalive(true)?;

        let socket = tokio::task::spawn_blocking(move || {
            socket.connect_timeout(&SockAddr::from(addr), connect_timeout)?;
            Ok::<_, io::Error>(socket)
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))??;

        socket.set_nonblocking(true)?;
        let std_stream: std::net::TcpStream = socket.into();
        debug!("Connected to {}", addr);
        TcpStream::from_std(std_stream)
    }

    /// Wraps a stream so that no single write carries more than `chunk_size`
    /// bytes, with `interval` between consecutive writes. Splitting the
    /// ClientHello across segments defeats middleboxes that inspect only the
    /// first packet of a flow.
    pub fn wrap_fragmented<S>(stream: S, chunk_size: usize, interval: Duration) -> FragmentedStream<S>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        FragmentedStream {
            inner: stream,
            chunk_size: chunk_size.max(1),
            interval,
            delay: None,
        }
    }
}

pub struct FragmentedStream<S> {
    inner: S,
    chunk_size: usize,
    interval: Duration,
    delay: Option<Pin<Box<Sleep>>>,
}

impl<S: AsyncRead + Unpin> AsyncRead for FragmentedStream<S> {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for FragmentedStream<S> {
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        if let Some(delay) = self.delay.as_mut() {
            if delay.as_mut().poll(cx).is_pending() {
                return Poll::Pending;
            }
            self.delay = None;
        }

        let max_write = buf.len().min(self.chunk_size);
        let result = match Pin::new(&mut self.inner).poll_write(cx, &buf[..max_write]) {
            Poll::Ready(result) => result,
            Poll::Pending => return Poll::Pending,
        };

        if matches!(result, Ok(n) if n > 0) && !self.interval.is_zero() {
            let deadline = Instant::now() + self.interval;
            self.delay = Some(Box::pin(tokio::time::sleep_until(deadline)));
        }
        Poll::Ready(result)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
