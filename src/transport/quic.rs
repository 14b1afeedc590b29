use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use bytes::{Buf, Bytes};
use futures_util::future;
use http::Uri;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::Protocol;
use crate::error::{ProbeError, TransportError};

use super::tls;

const HTTPS_PORT: u16 = 443;

pub type H3Stream = h3::client::RequestStream<h3_quinn::BidiStream<Bytes>, Bytes>;
type H3Sender = h3::client::SendRequest<h3_quinn::OpenStreams, Bytes>;

struct H3Session {
    sender: H3Sender,
    conn: quinn::Connection,
    _endpoint: quinn::Endpoint,
}

/// HTTP/3 client whose QUIC sessions always dial the pinned IP.
///
/// One session is kept open and reused until the peer closes it.
pub struct QuicTransport {
    ip: IpAddr,
    client_config: quinn::ClientConfig,
    session: Mutex<Option<H3Session>>,
}

impl QuicTransport {
    /// # Errors
    ///
    /// Returns an error when the TLS configuration cannot be turned into a
    /// QUIC crypto configuration.
    pub fn new(
        ip: IpAddr,
        extra_roots: &[rustls::pki_types::CertificateDer<'static>],
    ) -> Result<Self, TransportError> {
        let tls = tls::client_config(Protocol::Http3, extra_roots)?;
        let crypto = quinn::crypto::rustls::QuicClientConfig::try_from(tls).map_err(|err| {
            TransportError::Quic {
                message: err.to_string(),
            }
        })?;
        Ok(Self {
            ip,
            client_config: quinn::ClientConfig::new(Arc::new(crypto)),
            session: Mutex::new(None),
        })
    }

    /// Opens a request stream, reusing the live session when there is one.
    ///
    /// Returns the stream and whether an existing session carried it.
    ///
    /// # Errors
    ///
    /// Returns an error when dialing, the HTTP/3 handshake, or sending the
    /// request fails.
    pub async fn send(
        &self,
        request: http::Request<()>,
    ) -> Result<(H3Stream, http::Response<()>, bool), ProbeError> {
        let (mut sender, reused) = self.sender(request.uri()).await?;
        let mut stream = sender
            .send_request(request)
            .await
            .map_err(|err| http3_error("request", &err))?;
        stream
            .finish()
            .await
            .map_err(|err| http3_error("request", &err))?;
        let response = stream
            .recv_response()
            .await
            .map_err(|err| http3_error("response", &err))?;
        Ok((stream, response, reused))
    }

    async fn sender(&self, uri: &Uri) -> Result<(H3Sender, bool), ProbeError> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref()
            && session.conn.close_reason().is_none()
        {
            return Ok((session.sender.clone(), true));
        }
        let session = self.dial(uri).await?;
        let sender = session.sender.clone();
        *guard = Some(session);
        Ok((sender, false))
    }

    async fn dial(&self, uri: &Uri) -> Result<H3Session, ProbeError> {
        let host = uri.host().ok_or(ProbeError::MissingHost)?;
        let remote = SocketAddr::new(self.ip, uri.port_u16().unwrap_or(HTTPS_PORT));
        let local = if remote.is_ipv4() {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
        } else {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0)
        };

        let mut endpoint = quinn::Endpoint::client(local)
            .map_err(|source| ProbeError::BindUdp { addr: local, source })?;
        endpoint.set_default_client_config(self.client_config.clone());
        let conn = endpoint
            .connect(remote, host)
            .map_err(|source| ProbeError::QuicConnect {
                addr: remote,
                source,
            })?
            .await
            .map_err(|source| ProbeError::QuicHandshake {
                addr: remote,
                source,
            })?;
        debug!("QUIC session to {} via {} established", host, remote);

        let (mut driver, sender) = h3::client::new(h3_quinn::Connection::new(conn.clone()))
            .await
            .map_err(|err| http3_error("handshake", &err))?;
        tokio::spawn(async move {
            let closed = future::poll_fn(|cx| driver.poll_close(cx)).await;
            debug!("HTTP/3 session closed: {:?}", closed);
        });

        Ok(H3Session {
            sender,
            conn,
            _endpoint: endpoint,
        })
    }
}

/// Reads the remaining response body to completion.
///
/// # Errors
///
/// Returns an error when the stream fails before the body ends.
pub async fn drain(stream: &mut H3Stream) -> Result<u64, ProbeError> {
    let mut total = 0u64;
    while let Some(mut chunk) = stream
        .recv_data()
        .await
        .map_err(|err| http3_error("body", &err))?
    {
        let len = chunk.remaining();
        total = total.saturating_add(u64::try_from(len).unwrap_or(u64::MAX));
        chunk.advance(len);
    }
    Ok(total)
}

fn http3_error(stage: &'static str, err: &h3::error::Error) -> ProbeError {
    ProbeError::Http3 {
        stage,
        message: err.to_string(),
    }
}
