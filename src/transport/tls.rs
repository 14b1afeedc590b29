use std::sync::Arc;

use rustls::pki_types::CertificateDer;
use rustls::{ClientConfig, RootCertStore, SupportedProtocolVersion};

use crate::domain::Protocol;
use crate::error::TransportError;

static TLS13_ONLY: &[&SupportedProtocolVersion] = &[&rustls::version::TLS13];

/// Builds a verifying client config that offers exactly one ALPN identifier.
///
/// Trust comes from the bundled web PKI roots plus `extra_roots`. HTTP/3
/// configs are restricted to TLS 1.3 as QUIC requires.
///
/// # Errors
///
/// Returns an error when an extra root is rejected or the protocol versions
/// are not supported by the crypto provider.
pub fn client_config(
    protocol: Protocol,
    extra_roots: &[CertificateDer<'static>],
) -> Result<ClientConfig, TransportError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    for cert in extra_roots {
        roots
            .add(cert.clone())
            .map_err(|source| TransportError::InvalidRoot { source })?;
    }

    let versions = match protocol {
        Protocol::Http3 => TLS13_ONLY,
        Protocol::Http1 | Protocol::Http2 => rustls::DEFAULT_VERSIONS,
    };

    let mut config =
        ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_protocol_versions(versions)
            .map_err(|source| TransportError::Tls { source })?
            .with_root_certificates(roots)
            .with_no_client_auth();
    config.alpn_protocols = vec![protocol.alpn().to_vec()];
    Ok(config)
}
