//! Connection setup shared by every probe of a run.
//!
//! TLS material is loaded once. Each probe then dials its own address, runs the
//! TLS handshake (https only) and an HTTP/1 handshake on a fresh connection.

use super::dial::PinnedDial;
use super::ProbeFailure;
use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::url_model::{Scheme, Target};
use bytes::Bytes;
use http_body_util::Full;
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;
use tokio_rustls::TlsConnector;

/// Sender half of a fresh HTTP/1 connection plus the peer chain (empty for http).
pub struct Connection {
    pub sender: SendRequest<Full<Bytes>>,
    pub peer_certs: Vec<CertificateDer<'static>>,
}

pub struct Transport {
    connector: TlsConnector,
    /// Set for https targets: host override, else the URL host.
    server_name: Option<ServerName<'static>>,
}

impl Transport {
    pub fn new(cfg: &ProbeConfig, target: &Target) -> Result<Self> {
        let tls = client_config(cfg)?;
        let server_name = match target.scheme() {
            Scheme::Http => None,
            Scheme::Https => {
                let name = match cfg.host_override.as_deref() {
                    Some(host) => sni_host(host).to_string(),
                    None => target.host().to_string(),
                };
                let sn = ServerName::try_from(name.clone())
                    .map_err(|e| ProbeError::Request(format!("tls server name {:?}: {}", name, e)))?;
                Some(sn)
            }
        };
        Ok(Self {
            connector: TlsConnector::from(Arc::new(tls)),
            server_name,
        })
    }

    /// Dials `dial`, handshakes, and returns a sender for exactly one request.
    /// The connection task gives up at `limit`.
    pub async fn connect(&self, dial: &PinnedDial, limit: Instant) -> std::result::Result<Connection, ProbeFailure> {
        let tcp = dial.connect().await.map_err(ProbeFailure::Connect)?;
        match &self.server_name {
            None => Ok(Connection {
                sender: handshake(dial.index(), tcp, limit).await?,
                peer_certs: Vec::new(),
            }),
            Some(name) => {
                let tls = self
                    .connector
                    .connect(name.clone(), tcp)
                    .await
                    .map_err(ProbeFailure::Tls)?;
                let peer_certs = tls
                    .get_ref()
                    .1
                    .peer_certificates()
                    .map(|c| c.to_vec())
                    .unwrap_or_default();
                tracing::debug!("{}: tls handshake done, {} peer certs", dial.index(), peer_certs.len());
                Ok(Connection {
                    sender: handshake(dial.index(), tls, limit).await?,
                    peer_certs,
                })
            }
        }
    }
}

async fn handshake<S>(index: usize, io: S, limit: Instant) -> std::result::Result<SendRequest<Full<Bytes>>, ProbeFailure>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sender, conn) = http1::handshake(TokioIo::new(io))
        .await
        .map_err(ProbeFailure::Http)?;
    tokio::spawn(async move {
        match tokio::time::timeout_at(limit, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("{}: connection closed: {}", index, e),
            Err(_) => tracing::debug!("{}: connection dropped at request deadline", index),
        }
    });
    Ok(sender)
}

/// Host part of a `Host` header value: `example.com:8443` gives
/// `example.com`, `[::1]:443` gives `::1`.
fn sni_host(authority: &str) -> &str {
    if let Some(rest) = authority.strip_prefix('[') {
        return rest.split_once(']').map_or(rest, |(host, _)| host);
    }
    match authority.rsplit_once(':') {
        Some((host, port))
            if !host.contains(':') && !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) =>
        {
            host
        }
        _ => authority,
    }
}

fn provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Builds the run's TLS client config: CA file or system roots (unless
/// insecure), optional client certificate, HTTP/1.1 ALPN.
pub fn client_config(cfg: &ProbeConfig) -> Result<ClientConfig> {
    let provider = provider();
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?;
    let builder = if cfg.insecure {
        tracing::debug!("tls certificate verification disabled");
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert(provider)))
    } else {
        let roots = match cfg.ca_file.as_deref() {
            Some(path) => load_ca_file(path)?,
            None => system_roots(),
        };
        builder.with_root_certificates(roots)
    };
    let mut config = match (cfg.client_cert.as_deref(), cfg.client_key.as_deref()) {
        (Some(cert), Some(key)) => {
            let (chain, key_der) = load_client_cert(cert, key)?;
            builder
                .with_client_auth_cert(chain, key_der)
                .map_err(|e| client_cert_err(cert, key, e.to_string()))?
        }
        _ => builder.with_no_client_auth(),
    };
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(config)
}

/// Roots from a PEM file; replaces the system roots.
fn load_ca_file(path: &Path) -> Result<RootCertStore> {
    let ca_err = |reason: String| ProbeError::CaFile {
        path: path.display().to_string(),
        reason,
    };
    let file = File::open(path).map_err(|e| ca_err(e.to_string()))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ca_err(e.to_string()))?;
    let mut roots = RootCertStore::empty();
    let (added, _ignored) = roots.add_parsable_certificates(certs);
    if added == 0 {
        return Err(ca_err("no usable certificates found".to_string()));
    }
    tracing::debug!("loaded {} CA certificates from {}", added, path.display());
    Ok(roots)
}

fn system_roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    let loaded = rustls_native_certs::load_native_certs();
    for err in &loaded.errors {
        tracing::warn!("system certificate load error: {}", err);
    }
    let (added, _ignored) = roots.add_parsable_certificates(loaded.certs);
    if added == 0 {
        tracing::debug!("no system roots found, using bundled webpki roots");
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    } else {
        tracing::debug!("loaded {} system root certificates", added);
    }
    roots
}

fn load_client_cert(
    cert: &Path,
    key: &Path,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let cert_file = File::open(cert).map_err(|e| client_cert_err(cert, key, e.to_string()))?;
    let chain = rustls_pemfile::certs(&mut BufReader::new(cert_file))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| client_cert_err(cert, key, e.to_string()))?;
    if chain.is_empty() {
        return Err(client_cert_err(cert, key, "no certificate in file".to_string()));
    }
    let key_file = File::open(key).map_err(|e| client_cert_err(cert, key, e.to_string()))?;
    let key_der = rustls_pemfile::private_key(&mut BufReader::new(key_file))
        .map_err(|e| client_cert_err(cert, key, e.to_string()))?
        .ok_or_else(|| client_cert_err(cert, key, "no private key in file".to_string()))?;
    Ok((chain, key_der))
}

fn client_cert_err(cert: &Path, key: &Path, reason: String) -> ProbeError {
    ProbeError::ClientCert {
        cert: cert.display().to_string(),
        key: key.display().to_string(),
        reason,
    }
}

/// `--insecure`: accepts any chain but still checks handshake signatures, so
/// the peer certificates are available for the expiry scan.
#[derive(Debug)]
struct AcceptAnyServerCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
