use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use http::Uri;
use hyper_util::client::legacy::connect::{Connected, Connection};
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use socket2::{SockRef, TcpKeepalive};
use tokio::net::{TcpSocket, TcpStream};
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tower_service::Service;
use tracing::debug;

use super::trace::{ConnTrace, TracedStream};
use crate::error::DialError;

const HTTPS_PORT: u16 = 443;
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

/// Dials every connection to one fixed IP while handshaking TLS against the
/// request's host name.
#[derive(Clone)]
pub struct PinnedConnector {
    ip: IpAddr,
    tls: TlsConnector,
    timeout: Duration,
}

impl PinnedConnector {
    #[must_use]
    pub const fn new(ip: IpAddr, tls: TlsConnector, timeout: Duration) -> Self {
        Self { ip, tls, timeout }
    }

    async fn dial(self, uri: Uri) -> Result<PinnedStream, DialError> {
        match uri.scheme_str() {
            Some("https") => {}
            other => {
                return Err(DialError::UnsupportedScheme {
                    scheme: other.unwrap_or_default().to_owned(),
                });
            }
        }
        let host = uri.host().ok_or(DialError::MissingHost)?;
        let addr = SocketAddr::new(self.ip, uri.port_u16().unwrap_or(HTTPS_PORT));
        let server_name =
            ServerName::try_from(host.to_owned()).map_err(|source| DialError::ServerName {
                host: host.to_owned(),
                source,
            })?;

        let handshake = async {
            let tcp = connect_tcp(addr).await?;
            self.tls
                .connect(server_name, tcp)
                .await
                .map_err(|source| DialError::Handshake {
                    host: host.to_owned(),
                    addr,
                    source,
                })
        };
        let tls = tokio::time::timeout(self.timeout, handshake)
            .await
            .map_err(|_elapsed| DialError::Timeout {
                addr,
                timeout_ms: self.timeout.as_millis(),
            })??;

        let h2 = tls.get_ref().1.alpn_protocol() == Some(b"h2".as_slice());
        debug!("Connected to {} via {} (h2: {})", host, addr, h2);
        Ok(PinnedStream::new(tls, h2))
    }
}

impl Service<Uri> for PinnedConnector {
    type Response = PinnedStream;
    type Error = DialError;
    type Future = Pin<Box<dyn Future<Output = Result<PinnedStream, DialError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, uri: Uri) -> Self::Future {
        Box::pin(self.clone().dial(uri))
    }
}

async fn connect_tcp(addr: SocketAddr) -> Result<TcpStream, DialError> {
    let connect = async {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        SockRef::from(&socket)
            .set_tcp_keepalive(&TcpKeepalive::new().with_time(TCP_KEEPALIVE))?;
        socket.set_nodelay(true)?;
        socket.connect(addr).await
    };
    connect
        .await
        .map_err(|source: io::Error| DialError::Connect { addr, source })
}

/// Established TLS connection handed to the pooled client.
pub struct PinnedStream {
    io: TokioIo<TracedStream<TlsStream<TcpStream>>>,
    trace: ConnTrace,
    h2: bool,
}

impl PinnedStream {
    fn new(tls: TlsStream<TcpStream>, h2: bool) -> Self {
        let trace = ConnTrace::default();
        Self {
            io: TokioIo::new(TracedStream::new(tls, trace.clone())),
            trace,
            h2,
        }
    }
}

impl Connection for PinnedStream {
    fn connected(&self) -> Connected {
        let connected = Connected::new().extra(self.trace.clone());
        if self.h2 {
            connected.negotiated_h2()
        } else {
            connected
        }
    }
}

impl hyper::rt::Read for PinnedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: hyper::rt::ReadBufCursor<'_>,
    ) -> Poll<io::Result<()>> {
        hyper::rt::Read::poll_read(Pin::new(&mut self.io), cx, buf)
    }
}

impl hyper::rt::Write for PinnedStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        hyper::rt::Write::poll_write(Pin::new(&mut self.io), cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        hyper::rt::Write::poll_flush(Pin::new(&mut self.io), cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        hyper::rt::Write::poll_shutdown(Pin::new(&mut self.io), cx)
    }

    fn is_write_vectored(&self) -> bool {
        hyper::rt::Write::is_write_vectored(&self.io)
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        hyper::rt::Write::poll_write_vectored(Pin::new(&mut self.io), cx, bufs)
    }
}
