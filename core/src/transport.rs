//! The single I/O seam: execute one resolved request over a secure channel.
//!
//! # Design
//! The core never opens sockets itself. A `Transport` executes an
//! `HttpRequest` and hands back status, headers, and raw body bytes; HTTP
//! error statuses are data, not errors. `UreqTransport` is the production
//! adapter: a `ureq` agent holding the client certificate for mutual TLS.
//! Tests substitute their own implementations.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use ureq::tls::{parse_pem, Certificate, ClientCert, PemItem, PrivateKey, TlsConfig};
use ureq::Agent;

use crate::catalog::AuthChannel;
use crate::config::ClientConfig;
use crate::error::{ConfigError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

pub trait Transport {
    /// One request in flight per call; bounded by the transport's timeout.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;

    /// The channel this transport authenticates with.
    fn channel(&self) -> AuthChannel;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }

    fn channel(&self) -> AuthChannel {
        (**self).channel()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }

    fn channel(&self) -> AuthChannel {
        (**self).channel()
    }
}

/// `ureq`-backed transport. The agent pools connections internally.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
    channel: AuthChannel,
}

impl UreqTransport {
    /// Mutual TLS using the certificate chain and key named in `config`.
    pub fn mtls(config: &ClientConfig) -> Result<Self, ConfigError> {
        let chain = load_certificates(&config.cert_path)?;
        let key = load_private_key(&config.key_path)?;
        let tls = TlsConfig::builder()
            .client_cert(Some(ClientCert::new_with_certs(&chain, key)))
            .build();
        let agent = Agent::config_builder()
            .tls_config(tls)
            .timeout_global(Some(config.timeout()))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Ok(Self {
            agent,
            channel: AuthChannel::Certificate,
        })
    }

    /// Wrap a preconfigured agent, e.g. one talking to a gateway that
    /// terminates TLS on the caller's behalf. The agent must not treat HTTP
    /// error statuses as errors.
    pub fn from_agent(agent: Agent, channel: AuthChannel) -> Self {
        Self { agent, channel }
    }

    /// No client certificate; only anonymous operations can use it.
    pub fn anonymous(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            channel: AuthChannel::Anonymous,
        }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.agent.get(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        for (name, value) in &request.query {
            builder = builder.query(name, value);
        }

        let mut response = builder.call().map_err(map_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_vec().map_err(map_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn channel(&self) -> AuthChannel {
        self.channel
    }
}

fn map_error(err: ureq::Error) -> TransportError {
    match &err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => {
            TransportError::Connect(err.to_string())
        }
        ureq::Error::Tls(reason) => TransportError::Tls(reason.to_string()),
        ureq::Error::Io(io_err) => match io_err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportError::Timeout,
            io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset => {
                TransportError::Connect(io_err.to_string())
            }
            _ => TransportError::Io(io_err.to_string()),
        },
        _ => TransportError::Other(err.to_string()),
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, ConfigError> {
    fs::read(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

fn invalid_pem(path: &Path, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidPem {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn load_certificates(path: &Path) -> Result<Vec<Certificate<'static>>, ConfigError> {
    let pem = read_pem(path)?;
    let mut chain = Vec::new();
    for item in parse_pem(&pem) {
        if let PemItem::Certificate(cert) = item.map_err(|e| invalid_pem(path, e))? {
            chain.push(cert);
        }
    }
    if chain.is_empty() {
        return Err(invalid_pem(path, "no certificate found"));
    }
    Ok(chain)
}

fn load_private_key(path: &Path) -> Result<PrivateKey<'static>, ConfigError> {
    let pem = read_pem(path)?;
    PrivateKey::from_pem(&pem).map_err(|e| invalid_pem(path, e))
}
