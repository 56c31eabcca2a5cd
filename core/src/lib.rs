//! Synchronous client core for the SSG-WSG open-data REST service.
//!
//! # Overview
//! A declarative catalog describes every remote operation. Caller arguments
//! are validated against the operation's schema, turned into a resolved
//! `HttpRequest`, executed by a host-supplied `Transport`, and the raw
//! response is normalized into a `CanonicalResult`.
//!
//! # Design
//! - The catalog is `'static` data; adding an operation is one entry.
//! - `Client` is stateless and holds only the base URL. `build` and `parse`
//!   keep the I/O boundary explicit (host-does-IO).
//! - `Session` binds a client to a transport for one-call convenience. Any
//!   argument or channel failure returns before the transport is touched.
//! - Remote rejections are data (`Outcome::Failure`), not `Err`.

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod normalize;
pub mod request;
pub mod transport;
pub mod validate;

pub use catalog::{AuthChannel, Operation, OperationDescriptor};
pub use client::{Client, PreparedRequest, Session};
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError, TransportError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use normalize::{CanonicalResult, Outcome, Pagination, Payload, RejectionKind, RemoteError};
pub use transport::{Transport, UreqTransport};
pub use validate::{ArgValue, Arguments, ValidatedArguments};
