//! Local TLS servers for exercising the transports end to end.
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

pub(crate) const TEST_HOST: &str = "localhost";

/// Self-signed certificate for one host name.
pub(crate) struct TestCert {
    pub(crate) cert: CertificateDer<'static>,
    key: PrivatePkcs8KeyDer<'static>,
}

impl TestCert {
    pub(crate) fn generate() -> Result<Self, String> {
        Self::generate_for(TEST_HOST)
    }

    pub(crate) fn generate_for(host: &str) -> Result<Self, String> {
        let certified = rcgen::generate_simple_self_signed(vec![host.to_owned()])
            .map_err(|err| format!("generate cert failed: {}", err))?;
        Ok(Self {
            cert: certified.cert.der().clone(),
            key: PrivatePkcs8KeyDer::from(certified.key_pair.serialize_der()),
        })
    }

    fn key(&self) -> PrivateKeyDer<'static> {
        PrivateKeyDer::Pkcs8(self.key.clone_key())
    }

    fn acceptor(&self, alpn: &[&[u8]]) -> Result<TlsAcceptor, String> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let mut config = rustls::ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|err| format!("server versions failed: {}", err))?
            .with_no_client_auth()
            .with_single_cert(vec![self.cert.clone()], self.key())
            .map_err(|err| format!("server cert failed: {}", err))?;
        config.alpn_protocols = alpn.iter().map(|proto| proto.to_vec()).collect();
        Ok(TlsAcceptor::from(Arc::new(config)))
    }

    fn quic_server_config(&self) -> Result<quinn::ServerConfig, String> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let mut config = rustls::ServerConfig::builder_with_provider(provider)
            .with_protocol_versions(&[&rustls::version::TLS13])
            .map_err(|err| format!("server versions failed: {}", err))?
            .with_no_client_auth()
            .with_single_cert(vec![self.cert.clone()], self.key())
            .map_err(|err| format!("server cert failed: {}", err))?;
        config.alpn_protocols = vec![b"h3".to_vec()];
        let crypto = quinn::crypto::rustls::QuicServerConfig::try_from(config)
            .map_err(|err| format!("quic server config failed: {}", err))?;
        Ok(quinn::ServerConfig::with_crypto(Arc::new(crypto)))
    }
}

/// How a test server answers every request.
#[derive(Debug, Clone)]
pub(crate) struct TestResponse {
    pub(crate) status: u16,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: &'static [u8],
    pub(crate) delay: Duration,
}

impl TestResponse {
    pub(crate) const fn ok() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: b"ok",
            delay: Duration::ZERO,
        }
    }

    pub(crate) fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub(crate) const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) const fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    fn http1_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} Test\r\nContent-Length: {}\r\n",
            self.status,
            self.body.len()
        );
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(self.body);
        bytes
    }
}

async fn bind() -> Result<(TcpListener, SocketAddr), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|err| format!("bind failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("local addr failed: {}", err))?;
    Ok((listener, addr))
}

/// Keep-alive HTTP/1.1 server over TLS. Each accepted connection serves
/// requests until the client closes it.
pub(crate) async fn spawn_https1_server(
    cert: &TestCert,
    response: TestResponse,
) -> Result<(SocketAddr, JoinHandle<()>), String> {
    let acceptor = cert.acceptor(&[b"http/1.1"])?;
    let (listener, addr) = bind().await?;
    let task = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            let response = response.clone();
            tokio::spawn(async move {
                let Ok(mut tls) = acceptor.accept(stream).await else {
                    return;
                };
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    let Ok(read) = tls.read(&mut chunk).await else {
                        return;
                    };
                    if read == 0 {
                        return;
                    }
                    buf.extend_from_slice(chunk.get(..read).unwrap_or_default());
                    if !buf.windows(4).any(|window| window == b"\r\n\r\n") {
                        continue;
                    }
                    buf.clear();
                    tokio::time::sleep(response.delay).await;
                    if tls.write_all(&response.http1_bytes()).await.is_err() {
                        return;
                    }
                }
            });
        }
    });
    Ok((addr, task))
}

/// HTTP/2 server over TLS with `h2` ALPN.
pub(crate) async fn spawn_h2_server(
    cert: &TestCert,
    response: TestResponse,
) -> Result<(SocketAddr, JoinHandle<()>), String> {
    let acceptor = cert.acceptor(&[b"h2"])?;
    let (listener, addr) = bind().await?;
    let task = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            let response = response.clone();
            tokio::spawn(async move {
                let Ok(tls) = acceptor.accept(stream).await else {
                    return;
                };
                let Ok(mut conn) = h2::server::handshake(tls).await else {
                    return;
                };
                while let Some(Ok((_request, mut respond))) = conn.accept().await {
                    let response = response.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(response.delay).await;
                        let mut builder = http::Response::builder().status(response.status);
                        for (name, value) in &response.headers {
                            builder = builder.header(name.as_str(), value.as_str());
                        }
                        let Ok(head) = builder.body(()) else {
                            return;
                        };
                        if let Ok(mut send) = respond.send_response(head, false) {
                            let _sent = send.send_data(Bytes::from_static(response.body), true);
                        }
                    });
                }
            });
        }
    });
    Ok((addr, task))
}

/// Running HTTP/3 test server.
pub(crate) struct H3TestServer {
    pub(crate) addr: SocketAddr,
    pub(crate) task: JoinHandle<()>,
    /// SNI presented by each accepted QUIC connection.
    pub(crate) server_names: Arc<Mutex<Vec<String>>>,
}

/// HTTP/3 server over QUIC with `h3` ALPN, bound to a local UDP port.
pub(crate) fn spawn_h3_server(
    cert: &TestCert,
    response: TestResponse,
) -> Result<H3TestServer, String> {
    let config = cert.quic_server_config()?;
    let bind_addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let endpoint = quinn::Endpoint::server(config, bind_addr)
        .map_err(|err| format!("quic bind failed: {}", err))?;
    let addr = endpoint
        .local_addr()
        .map_err(|err| format!("local addr failed: {}", err))?;
    let server_names = Arc::new(Mutex::new(Vec::new()));
    let names = Arc::clone(&server_names);

    let task = tokio::spawn(async move {
        while let Some(incoming) = endpoint.accept().await {
            let response = response.clone();
            let names = Arc::clone(&names);
            tokio::spawn(async move {
                let Ok(conn) = incoming.await else {
                    return;
                };
                let server_name = conn
                    .handshake_data()
                    .and_then(|data| data.downcast::<quinn::crypto::rustls::HandshakeData>().ok())
                    .and_then(|data| data.server_name);
                if let Some(name) = server_name
                    && let Ok(mut seen) = names.lock()
                {
                    seen.push(name);
                }

                let Ok(mut h3_conn) =
                    h3::server::Connection::<_, Bytes>::new(h3_quinn::Connection::new(conn)).await
                else {
                    return;
                };
                while let Ok(Some((_request, mut stream))) = h3_conn.accept().await {
                    let response = response.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(response.delay).await;
                        let mut builder = http::Response::builder().status(response.status);
                        for (name, value) in &response.headers {
                            builder = builder.header(name.as_str(), value.as_str());
                        }
                        let Ok(head) = builder.body(()) else {
                            return;
                        };
                        if stream.send_response(head).await.is_err() {
                            return;
                        }
                        if stream
                            .send_data(Bytes::from_static(response.body))
                            .await
                            .is_err()
                        {
                            return;
                        }
                        let _finished = stream.finish().await;
                    });
                }
            });
        }
    });

    Ok(H3TestServer {
        addr,
        task,
        server_names,
    })
}
