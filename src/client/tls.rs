// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel construction and certificate handling.
//!
//! Secure channels use a custom rustls connector so that the TLS server
//! name can differ from the dialed address. Device certificates are
//! routinely issued against a management hostname that does not resolve,
//! so verification has to run against an explicitly chosen name.

use std::sync::Arc;
use std::time::Duration;

use hyper_util::rt::TokioIo;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, warn};
use x509_parser::prelude::FromDer;

use crate::client::target::Target;
use crate::error::{GnmiError, Result};

/// Per-channel transport settings collected by the builder.
#[derive(Debug, Clone, Default)]
pub(crate) struct ChannelSettings {
    pub timeout: Option<Duration>,
    pub keepalive_interval: Option<Duration>,
    pub keepalive_timeout: Option<Duration>,
}

impl ChannelSettings {
    fn apply(&self, mut endpoint: Endpoint) -> Endpoint {
        if let Some(timeout) = self.timeout {
            endpoint = endpoint.timeout(timeout);
        }
        if let Some(interval) = self.keepalive_interval {
            endpoint = endpoint.http2_keep_alive_interval(interval);
        }
        if let Some(timeout) = self.keepalive_timeout {
            endpoint = endpoint.keep_alive_timeout(timeout);
        }
        endpoint
    }
}

/// Open a cleartext channel.
pub(crate) async fn connect_plain(target: &Target, settings: &ChannelSettings) -> Result<Channel> {
    let endpoint = Channel::from_shared(format!("http://{}", target.netloc()))
        .map_err(|e| GnmiError::Config(e.to_string()))?;
    let channel = settings.apply(endpoint).connect().await?;
    Ok(channel)
}

/// Open a TLS channel, verifying the peer as `server_name` regardless of
/// the address actually dialed.
pub(crate) async fn connect_tls(
    target: &Target,
    mut tls_config: rustls::ClientConfig,
    server_name: String,
    settings: &ChannelSettings,
) -> Result<Channel> {
    // gRPC requires ALPN h2
    tls_config.alpn_protocols = vec![b"h2".to_vec()];
    let connector = tokio_rustls::TlsConnector::from(Arc::new(tls_config));

    let dial_host = target.host().to_string();
    let dial_port = target.port();
    debug!(target = %target, tls_name = %server_name, "opening TLS channel");

    // The endpoint keeps the http scheme; TLS is layered in the connector.
    let endpoint = Endpoint::from_shared(format!("http://{}", target.netloc()))
        .map_err(|e| GnmiError::Config(e.to_string()))?;
    let channel = settings
        .apply(endpoint)
        .connect_with_connector(tower::service_fn(move |uri: tonic::transport::Uri| {
            let connector = connector.clone();
            let server_name = server_name.clone();
            let dial_host = dial_host.clone();
            async move {
                let host = uri.host().unwrap_or(&dial_host).trim_matches(['[', ']']);
                let port = uri.port_u16().unwrap_or(dial_port);
                let tcp = tokio::net::TcpStream::connect((host, port)).await?;

                let server_name = ServerName::try_from(server_name)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
                let tls_stream = connector.connect(server_name, tcp).await?;
                Ok::<_, std::io::Error>(TokioIo::new(tls_stream))
            }
        }))
        .await?;

    Ok(channel)
}

/// Fetch the certificate a target presents, without verifying it.
///
/// This is the trust-on-first-use path: a throwaway handshake that accepts
/// any certificate, records what the peer sent, and hangs up.
pub(crate) async fn fetch_certificate(target: &Target) -> Result<CertificateDer<'static>> {
    let mut tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(rustls::RootCertStore::empty())
        .with_no_client_auth();
    tls_config
        .dangerous()
        .set_certificate_verifier(Arc::new(NoVerifier));

    let connector = tokio_rustls::TlsConnector::from(Arc::new(tls_config));
    let tcp = tokio::net::TcpStream::connect((target.host(), target.port()))
        .await
        .map_err(|e| GnmiError::Connection(format!("unable to reach {target}: {e}")))?;
    // Any name works here since verification is disabled.
    let server_name = ServerName::try_from(target.host().to_string())
        .unwrap_or_else(|_| ServerName::try_from("gnmi-target").expect("static name"))
        .to_owned();
    let stream = connector
        .connect(server_name, tcp)
        .await
        .map_err(|e| GnmiError::Connection(format!("TLS handshake with {target} failed: {e}")))?;

    let (_, session) = stream.get_ref();
    let cert = session
        .peer_certificates()
        .and_then(|certs| certs.first())
        .cloned()
        .ok_or_else(|| {
            GnmiError::Connection(format!("{target} presented no certificate"))
        })?
        .into_owned();
    Ok(cert)
}

/// Extract the subject common name from a DER certificate.
pub(crate) fn common_name(cert: &CertificateDer<'_>) -> Result<String> {
    let (_, parsed) = x509_parser::certificate::X509Certificate::from_der(cert.as_ref())
        .map_err(|e| GnmiError::Config(format!("unable to parse certificate: {e}")))?;
    let mut names = parsed.subject().iter_common_name();
    let first = names
        .next()
        .and_then(|attr| attr.as_str().ok())
        .ok_or_else(|| {
            GnmiError::Config("certificate subject has no common name".to_string())
        })?;
    if names.next().is_some() {
        warn!("certificate subject has multiple common names, using the first");
    }
    Ok(first.to_string())
}

/// Load PEM-encoded certificates.
#[allow(clippy::result_large_err)]
pub(crate) fn load_pem_certs(pem_data: &[u8]) -> Result<Vec<CertificateDer<'static>>> {
    let mut reader = std::io::BufReader::new(pem_data);
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| GnmiError::Config(format!("unable to parse PEM certificates: {e}")))?;
    if certs.is_empty() {
        return Err(GnmiError::Config(
            "no certificates found in PEM data".to_string(),
        ));
    }
    Ok(certs)
}

/// Load a PEM-encoded private key (RSA, EC or PKCS8).
#[allow(clippy::result_large_err)]
pub(crate) fn load_pem_key(pem_data: &[u8]) -> Result<PrivateKeyDer<'static>> {
    let mut reader = std::io::BufReader::new(pem_data);
    loop {
        match rustls_pemfile::read_one(&mut reader) {
            Ok(Some(rustls_pemfile::Item::Pkcs1Key(key))) => {
                return Ok(PrivateKeyDer::Pkcs1(key));
            }
            Ok(Some(rustls_pemfile::Item::Pkcs8Key(key))) => {
                return Ok(PrivateKeyDer::Pkcs8(key));
            }
            Ok(Some(rustls_pemfile::Item::Sec1Key(key))) => {
                return Ok(PrivateKeyDer::Sec1(key));
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => {
                return Err(GnmiError::Config(format!("unable to parse PEM key: {e}")));
            }
        }
    }
    Err(GnmiError::Config(
        "no private key found in PEM data".to_string(),
    ))
}

/// Verifier that accepts any certificate. Used for the trust-on-first-use
/// fetch, never for the resulting channel.
#[derive(Debug)]
pub(crate) struct NoVerifier;

impl rustls::client::danger::ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA1,
            rustls::SignatureScheme::ECDSA_SHA1_Legacy,
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::ECDSA_NISTP521_SHA512,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::ED25519,
            rustls::SignatureScheme::ED448,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CERT: &str = "-----BEGIN CERTIFICATE-----
MIIBzjCCAXWgAwIBAgIUezwoPawgQz3soME4zo1K8rT9tb0wCgYIKoZIzj0EAwIw
PTELMAkGA1UEBhMCVVMxFDASBgNVBAoMC0V4YW1wbGUgTGFiMRgwFgYDVQQDDA9l
bXMuZXhhbXBsZS5jb20wHhcNMjYwODI4MDQ0ODQ3WhcNMzYwODI1MDQ0ODQ3WjA9
MQswCQYDVQQGEwJVUzEUMBIGA1UECgwLRXhhbXBsZSBMYWIxGDAWBgNVBAMMD2Vt
cy5leGFtcGxlLmNvbTBZMBMGByqGSM49AgEGCCqGSM49AwEHA0IABEpWIOSDPWMq
niH3b9k1s5M2Z+/LTIYKQ1HMU4sS340CS+VhJIXUVyEPkoE9U1kCu9DHW5sL8Fvs
UGyLdDN4rhqjUzBRMB0GA1UdDgQWBBSmDYNgoEfC/lYUPOaIzLRmdAJ30zAfBgNV
HSMEGDAWgBSmDYNgoEfC/lYUPOaIzLRmdAJ30zAPBgNVHRMBAf8EBTADAQH/MAoG
CCqGSM49BAMCA0cAMEQCIEP7omQKHpHHGuTXJ+zWdjckBm/yBkHyjt1pLAczAl/5
AiBlMsZyDplzkHxdkYKTw3bDmBo68MKZJvxjUAPOwStCfg==
-----END CERTIFICATE-----
";

    #[test]
    fn test_load_pem_certs() {
        let certs = load_pem_certs(TEST_CERT.as_bytes()).unwrap();
        assert_eq!(certs.len(), 1);
    }

    #[test]
    fn test_load_pem_certs_empty_rejected() {
        assert!(matches!(
            load_pem_certs(b"not a certificate"),
            Err(GnmiError::Config(_))
        ));
    }

    #[test]
    fn test_common_name_extraction() {
        let certs = load_pem_certs(TEST_CERT.as_bytes()).unwrap();
        assert_eq!(common_name(&certs[0]).unwrap(), "ems.example.com");
    }

    #[test]
    fn test_load_pem_key_missing_rejected() {
        assert!(matches!(
            load_pem_key(TEST_CERT.as_bytes()),
            Err(GnmiError::Config(_))
        ));
    }
}
