//! Stateless request builder and response parser, plus a transport-driven
//! session.
//!
//! # Design
//! `Client` holds only a base URL and carries no mutable state between
//! calls. Each logical call is split into `build`, which validates arguments
//! and produces a `PreparedRequest`, and `parse`, which consumes the
//! `HttpResponse`. The host can execute the round-trip itself, or hand a
//! `Transport` to a `Session` that runs the whole pipeline.

use tracing::{debug, error, info_span, warn};
use url::Url;
use uuid::Uuid;

use crate::catalog::Operation;
use crate::config::{parse_base_url, ClientConfig};
use crate::error::{ApiError, ConfigError};
use crate::http::{HttpRequest, HttpResponse};
use crate::normalize::{normalize, CanonicalResult};
use crate::request::build_request;
use crate::transport::Transport;
use crate::validate::{validate, Arguments, ValidatedArguments};

/// A validated, fully resolved request ready for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub operation: Operation,
    pub args: ValidatedArguments,
    pub request: HttpRequest,
}

/// Synchronous, stateless client for the SSG API.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: config.base_url()?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn build(&self, operation: Operation, args: &Arguments) -> Result<PreparedRequest, ApiError> {
        let desc = operation.descriptor();
        let validated = validate(desc, args)?;
        let request = build_request(&self.base_url, desc, &validated)?;
        Ok(PreparedRequest {
            operation,
            args: validated,
            request,
        })
    }

    pub fn parse(&self, prepared: &PreparedRequest, response: &HttpResponse) -> Result<CanonicalResult, ApiError> {
        normalize(prepared.operation.descriptor(), &prepared.args, response)
    }
}

/// A client bound to a transport.
///
/// Holds no per-call state, so one session can serve concurrent calls when
/// its transport is `Sync`.
#[derive(Debug, Clone)]
pub struct Session<T> {
    client: Client,
    transport: T,
}

impl<T: Transport> Session<T> {
    pub fn new(client: Client, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Validate, build, execute, and normalize one logical call.
    ///
    /// Channel and argument failures return before the transport is touched.
    pub fn call(&self, operation: Operation, args: &Arguments) -> Result<CanonicalResult, ApiError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("call", operation = operation.name(), request_id = %request_id);
        let _guard = span.enter();

        let required = operation.descriptor().channel;
        let available = self.transport.channel();
        if !available.satisfies(required) {
            warn!(%required, %available, "channel mismatch");
            return Err(ApiError::ChannelMismatch {
                operation: operation.name(),
                required,
                available,
            });
        }

        let prepared = self.client.build(operation, args).inspect_err(|err| {
            warn!(error = %err, "arguments rejected");
        })?;
        debug!(
            url = %prepared.request.full_url(),
            api_version = %prepared.args.api_version,
            "request built"
        );

        let response = self.transport.execute(&prepared.request).map_err(|err| {
            error!(error = %err, "transport failed");
            ApiError::from(err)
        })?;

        let result = self.client.parse(&prepared, &response)?;
        match result.error() {
            Some(rejection) => warn!(
                status = rejection.status,
                code = rejection.code.as_deref().unwrap_or(""),
                message = rejection.message.as_deref().unwrap_or(""),
                "remote rejection"
            ),
            None => debug!(status = result.status, "call succeeded"),
        }
        Ok(result)
    }

    /// Same as `call`, addressing the operation by catalog name.
    pub fn call_named(&self, name: &str, args: &Arguments) -> Result<CanonicalResult, ApiError> {
        self.call(name.parse()?, args)
    }
}
