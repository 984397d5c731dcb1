// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fluent construction of [`GnmiClient`].
//!
//! Every option setter is infallible; contradictions and malformed input
//! are reported once, from [`ClientBuilder::construct`].

use std::path::PathBuf;
use std::time::Duration;

use rustls::pki_types::CertificateDer;
use tracing::{debug, warn};

use crate::client::target::Target;
use crate::client::tls::{self, ChannelSettings};
use crate::client::{DeviceOs, GnmiClient};
use crate::error::{GnmiError, Result};

/// Channel options understood by [`ClientBuilder::channel_option`].
const SUPPORTED_CHANNEL_OPTIONS: &[&str] = &[
    "grpc.ssl_target_name_override",
    "grpc.http2.keepalive_time_ms",
    "grpc.keepalive_timeout_ms",
];

#[derive(Debug, Clone)]
enum CertInput {
    Bytes(Vec<u8>),
    File(PathBuf),
}

impl CertInput {
    fn read(&self, what: &str) -> Result<Vec<u8>> {
        match self {
            CertInput::Bytes(bytes) => Ok(bytes.clone()),
            CertInput::File(path) => std::fs::read(path).map_err(|e| {
                GnmiError::Config(format!("unable to read {what} {}: {e}", path.display()))
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
enum Security {
    /// Nothing requested; falls back to an insecure channel with a warning.
    #[default]
    Unspecified,
    Insecure,
    Secure {
        root: Option<CertInput>,
        private_key: Option<CertInput>,
        certificate_chain: Option<CertInput>,
    },
    /// Trust whatever certificate the target presents on first contact.
    FromTarget,
    /// More than one mode was requested.
    Conflict,
}

#[derive(Debug, Clone, Default)]
enum NameOverride {
    #[default]
    None,
    Explicit(String),
    /// Derive the name from the root certificate's common name.
    FromCertificate,
}

/// Builder for [`GnmiClient`].
///
/// # Example
///
/// ```no_run
/// use gnmi_rs::{ClientBuilder, DeviceOs};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ClientBuilder::new("192.0.2.1:57400")
///     .os(DeviceOs::IosXr)
///     .secure_from_target()
///     .ssl_target_override_from_certificate()
///     .call_authentication("admin", "admin")
///     .construct()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    target: String,
    os: DeviceOs,
    security: Security,
    username: Option<String>,
    password: Option<String>,
    name_override: NameOverride,
    channel_options: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Start building a client for `target` (`host`, `host:port` or
    /// `[v6addr]:port`; the port defaults to 9339).
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            os: DeviceOs::Generic,
            security: Security::default(),
            username: None,
            password: None,
            name_override: NameOverride::default(),
            channel_options: Vec::new(),
            timeout: None,
        }
    }

    /// Select the network OS variant of the target.
    #[must_use]
    pub fn os(mut self, os: DeviceOs) -> Self {
        self.os = os;
        self
    }

    /// Use a cleartext channel.
    #[must_use]
    pub fn insecure(mut self) -> Self {
        self.security = match self.security {
            Security::Unspecified | Security::Insecure => Security::Insecure,
            _ => Security::Conflict,
        };
        self
    }

    /// Use TLS with PEM material passed in memory. All three parameters
    /// are optional; without a root certificate the system trust store is
    /// used, and without a key/chain pair no client certificate is sent.
    #[must_use]
    pub fn secure(
        mut self,
        root_certificates: Option<Vec<u8>>,
        private_key: Option<Vec<u8>>,
        certificate_chain: Option<Vec<u8>>,
    ) -> Self {
        self.set_secure(
            root_certificates.map(CertInput::Bytes),
            private_key.map(CertInput::Bytes),
            certificate_chain.map(CertInput::Bytes),
        );
        self
    }

    /// Use TLS with PEM material read from files at construction time.
    #[must_use]
    pub fn secure_from_files(
        mut self,
        root_certificates: Option<impl Into<PathBuf>>,
        private_key: Option<impl Into<PathBuf>>,
        certificate_chain: Option<impl Into<PathBuf>>,
    ) -> Self {
        self.set_secure(
            root_certificates.map(|p| CertInput::File(p.into())),
            private_key.map(|p| CertInput::File(p.into())),
            certificate_chain.map(|p| CertInput::File(p.into())),
        );
        self
    }

    fn set_secure(
        &mut self,
        root: Option<CertInput>,
        private_key: Option<CertInput>,
        certificate_chain: Option<CertInput>,
    ) {
        self.security = match self.security {
            Security::Unspecified | Security::Secure { .. } => Security::Secure {
                root,
                private_key,
                certificate_chain,
            },
            _ => Security::Conflict,
        };
    }

    /// Use TLS, trusting the certificate the target presents on first
    /// contact.
    #[must_use]
    pub fn secure_from_target(mut self) -> Self {
        self.security = match self.security {
            Security::Unspecified | Security::FromTarget => Security::FromTarget,
            _ => Security::Conflict,
        };
        self
    }

    /// Send `username` and `password` as metadata on every RPC.
    #[must_use]
    pub fn call_authentication(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Verify the target's certificate against `name` instead of the
    /// dialed host.
    #[must_use]
    pub fn ssl_target_override(mut self, name: impl Into<String>) -> Self {
        self.name_override = NameOverride::Explicit(name.into());
        self
    }

    /// Verify the target's certificate against the common name found in
    /// the configured root certificate.
    #[must_use]
    pub fn ssl_target_override_from_certificate(mut self) -> Self {
        self.name_override = NameOverride::FromCertificate;
        self
    }

    /// Set a raw gRPC channel option. Supported options are
    /// `grpc.ssl_target_name_override`, `grpc.http2.keepalive_time_ms`
    /// and `grpc.keepalive_timeout_ms`; anything else fails at
    /// construction. Setting an option twice overwrites the earlier value
    /// with a warning.
    #[must_use]
    pub fn channel_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if let Some(existing) = self.channel_options.iter_mut().find(|(n, _)| *n == name) {
            warn!(option = %name, old = %existing.1, new = %value, "overwriting channel option");
            existing.1 = value;
        } else {
            self.channel_options.push((name, value));
        }
        self
    }

    /// Per-RPC timeout applied to the channel.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validate the accumulated options, open the channel and return the
    /// client.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for contradictory or malformed
    /// options and a transport or connection error when the channel
    /// cannot be opened.
    pub async fn construct(self) -> Result<GnmiClient> {
        let _ = rustls::crypto::ring::default_provider().install_default();

        let target = Target::parse(&self.target)?;
        let (mut settings, option_override) = self.resolve_channel_options()?;
        settings.timeout = self.timeout;

        let name_override = match option_override {
            Some(name) => NameOverride::Explicit(name),
            None => self.name_override.clone(),
        };

        let channel = match &self.security {
            Security::Conflict => {
                return Err(GnmiError::Config(
                    "contradictory channel security requested; pick exactly one of \
                     insecure, secure or secure_from_target"
                        .to_string(),
                ));
            }
            Security::Unspecified | Security::Insecure => {
                if matches!(self.security, Security::Unspecified) {
                    warn!(
                        target = %target,
                        "no security mode specified, using an insecure channel; \
                         gNMI requires TLS, so most targets will reject this"
                    );
                }
                if !matches!(name_override, NameOverride::None) {
                    return Err(GnmiError::Config(
                        "ssl target override requires a secure channel".to_string(),
                    ));
                }
                tls::connect_plain(&target, &settings).await?
            }
            Security::Secure {
                root,
                private_key,
                certificate_chain,
            } => {
                let roots = match root {
                    Some(input) => Some(tls::load_pem_certs(&input.read("root certificates")?)?),
                    None => None,
                };
                let identity = match (private_key, certificate_chain) {
                    (Some(key), Some(chain)) => Some((
                        tls::load_pem_key(&key.read("private key")?)?,
                        tls::load_pem_certs(&chain.read("certificate chain")?)?,
                    )),
                    (None, None) => None,
                    _ => {
                        return Err(GnmiError::Config(
                            "client authentication requires both a private key and a \
                             certificate chain"
                                .to_string(),
                        ));
                    }
                };
                let server_name = resolve_server_name(&name_override, &target, roots.as_deref())?;
                let tls_config = build_tls_config(roots, identity)?;
                tls::connect_tls(&target, tls_config, server_name, &settings).await?
            }
            Security::FromTarget => {
                warn!(
                    target = %target,
                    "trusting the certificate presented by the target; this is \
                     vulnerable to an interposed endpoint"
                );
                let cert = tls::fetch_certificate(&target).await?;
                let roots = vec![cert];
                let server_name = resolve_server_name(&name_override, &target, Some(&roots))?;
                let tls_config = build_tls_config(Some(roots), None)?;
                tls::connect_tls(&target, tls_config, server_name, &settings).await?
            }
        };

        let mut metadata = Vec::new();
        if let (Some(username), Some(password)) = (self.username, self.password) {
            metadata.push(("username", username));
            metadata.push(("password", password));
        }

        Ok(GnmiClient::from_parts(channel, self.os, metadata))
    }

    /// Translate raw channel options into transport settings, rejecting
    /// unknown names.
    fn resolve_channel_options(&self) -> Result<(ChannelSettings, Option<String>)> {
        let mut settings = ChannelSettings::default();
        let mut name_override = None;
        for (name, value) in &self.channel_options {
            match name.as_str() {
                "grpc.ssl_target_name_override" => name_override = Some(value.clone()),
                "grpc.http2.keepalive_time_ms" => {
                    settings.keepalive_interval = Some(parse_millis(name, value)?);
                }
                "grpc.keepalive_timeout_ms" => {
                    settings.keepalive_timeout = Some(parse_millis(name, value)?);
                }
                other => {
                    return Err(GnmiError::Config(format!(
                        "unsupported channel option {other:?}; supported: {}",
                        SUPPORTED_CHANNEL_OPTIONS.join(", ")
                    )));
                }
            }
        }
        Ok((settings, name_override))
    }
}

fn parse_millis(name: &str, value: &str) -> Result<Duration> {
    value
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| {
            GnmiError::Config(format!(
                "channel option {name} expects milliseconds, got {value:?}"
            ))
        })
}

/// Decide which name the TLS layer verifies the peer against.
fn resolve_server_name(
    name_override: &NameOverride,
    target: &Target,
    roots: Option<&[CertificateDer<'static>]>,
) -> Result<String> {
    match name_override {
        NameOverride::None => Ok(target.host().to_string()),
        NameOverride::Explicit(name) => {
            debug!(name = %name, "using explicit TLS name override");
            Ok(name.clone())
        }
        NameOverride::FromCertificate => {
            let roots = roots.filter(|r| !r.is_empty()).ok_or_else(|| {
                GnmiError::Config(
                    "deriving the TLS name override requires a root certificate".to_string(),
                )
            })?;
            let name = tls::common_name(&roots[0])?;
            warn!(
                name = %name,
                "overriding the TLS name with the certificate common name; \
                 an interposed endpoint holding this certificate would not be detected"
            );
            Ok(name)
        }
    }
}

type Identity = (
    rustls::pki_types::PrivateKeyDer<'static>,
    Vec<CertificateDer<'static>>,
);

fn build_tls_config(
    roots: Option<Vec<CertificateDer<'static>>>,
    identity: Option<Identity>,
) -> Result<rustls::ClientConfig> {
    let root_store = match roots {
        Some(certs) => {
            let mut store = rustls::RootCertStore::empty();
            for cert in certs {
                store
                    .add(cert)
                    .map_err(|e| GnmiError::Config(format!("invalid root certificate: {e}")))?;
            }
            store
        }
        None => {
            let mut store = rustls::RootCertStore::empty();
            store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            store
        }
    };

    let builder = rustls::ClientConfig::builder().with_root_certificates(root_store);
    let config = match identity {
        Some((key, chain)) => builder
            .with_client_auth_cert(chain, key)
            .map_err(|e| GnmiError::Config(format!("invalid client certificate: {e}")))?,
        None => builder.with_no_client_auth(),
    };
    Ok(config)
}
