//! Maps raw response bodies onto the canonical result shape.
//!
//! # Design
//! The envelope shape is taken from the operation descriptor, never sniffed
//! from the payload. A success body that does not match the declared shape is
//! a `MalformedEnvelope` error, so a parsing failure can never masquerade as
//! an empty result. Non-2xx responses become `Outcome::Failure` carrying the
//! decoded `error` object.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::catalog::{Envelope, OperationDescriptor};
use crate::error::ApiError;
use crate::http::HttpResponse;
use crate::validate::ValidatedArguments;

/// Records extracted from `data`.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Records(Vec<Value>),
    /// The declared field held an object rather than a sequence.
    Mapping(Map<String, Value>),
}

impl Payload {
    /// Number of records; a mapping counts as one.
    pub fn len(&self) -> usize {
        match self {
            Payload::Records(records) => records.len(),
            Payload::Mapping(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> &[Value] {
        match self {
            Payload::Records(records) => records,
            Payload::Mapping(_) => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub total: u64,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// One entry of `error.details`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// Request shape problem; fix the arguments.
    BadRequest,
    /// Channel or authorization problem; retrying will not help.
    Forbidden,
    NotFound,
    Server,
    Other,
}

/// A remote rejection, decoded from the `error` envelope where possible.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteError {
    pub status: u16,
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Vec<ErrorDetail>,
    /// The undecoded body.
    pub raw: String,
}

impl RemoteError {
    pub fn kind(&self) -> RejectionKind {
        match self.status {
            400 => RejectionKind::BadRequest,
            401 | 403 => RejectionKind::Forbidden,
            404 => RejectionKind::NotFound,
            500..=599 => RejectionKind::Server,
            _ => RejectionKind::Other,
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.kind() == RejectionKind::Server
    }

    /// Detail messages in order.
    pub fn detail_messages(&self) -> impl Iterator<Item = &str> {
        self.details.iter().filter_map(|d| d.message.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success {
        payload: Payload,
        pagination: Option<Pagination>,
    },
    Failure(RemoteError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalResult {
    pub status: u16,
    pub outcome: Outcome,
}

impl CanonicalResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    pub fn payload(&self) -> Option<&Payload> {
        match &self.outcome {
            Outcome::Success { payload, .. } => Some(payload),
            Outcome::Failure(_) => None,
        }
    }

    pub fn pagination(&self) -> Option<Pagination> {
        match &self.outcome {
            Outcome::Success { pagination, .. } => *pagination,
            Outcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&RemoteError> {
        match &self.outcome {
            Outcome::Success { .. } => None,
            Outcome::Failure(err) => Some(err),
        }
    }

    /// Split into the payload or the remote rejection.
    pub fn into_payload(self) -> Result<(Payload, Option<Pagination>), RemoteError> {
        match self.outcome {
            Outcome::Success { payload, pagination } => Ok((payload, pagination)),
            Outcome::Failure(err) => Err(err),
        }
    }
}

pub fn normalize(
    desc: &OperationDescriptor,
    args: &ValidatedArguments,
    response: &HttpResponse,
) -> Result<CanonicalResult, ApiError> {
    if !response.is_success() {
        return Ok(CanonicalResult {
            status: response.status,
            outcome: Outcome::Failure(decode_rejection(response)),
        });
    }

    let malformed = |reason: String| ApiError::MalformedEnvelope {
        operation: desc.name,
        reason,
    };

    let body: Value = serde_json::from_slice(&response.body)
        .map_err(|e| malformed(format!("body is not JSON: {e}")))?;
    let data = body
        .get("data")
        .ok_or_else(|| malformed("missing `data`".to_string()))?;

    let mut payload = match (desc.envelope, data) {
        (Envelope::Keyed(field), Value::Object(object)) => match object.get(field) {
            Some(Value::Array(records)) => Payload::Records(records.clone()),
            Some(Value::Object(mapping)) => Payload::Mapping(mapping.clone()),
            Some(_) => return Err(malformed(format!("`data.{field}` is neither a list nor an object"))),
            None => return Err(malformed(format!("missing `data.{field}`"))),
        },
        (Envelope::Keyed(field), _) => {
            return Err(malformed(format!("expected an object holding `{field}` under `data`")))
        }
        (Envelope::Sequence, Value::Array(records)) => Payload::Records(records.clone()),
        (Envelope::Sequence, _) => return Err(malformed("expected a list under `data`".to_string())),
    };
    apply_renames(desc.renames, &mut payload);

    let pagination = match desc.total_path {
        Some(path) => extract_total(&body, path)
            .map_err(malformed)?
            .map(|total| Pagination {
                total,
                page: args.integer("page").and_then(|n| u64::try_from(n).ok()),
                page_size: args.integer("pageSize").and_then(|n| u64::try_from(n).ok()),
            }),
        None => None,
    };

    Ok(CanonicalResult {
        status: response.status,
        outcome: Outcome::Success { payload, pagination },
    })
}

/// Absent path is `Ok(None)`; a present but non-numeric total is an error.
fn extract_total(body: &Value, path: &[&str]) -> Result<Option<u64>, String> {
    let mut node = body;
    for key in path {
        match node.get(*key) {
            Some(next) => node = next,
            None => return Ok(None),
        }
    }
    let total = match node {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        Value::Null => return Ok(None),
        _ => None,
    };
    total
        .map(Some)
        .ok_or_else(|| format!("`{}` is not a record count", path.join(".")))
}

fn apply_renames(renames: &[(&str, &str)], payload: &mut Payload) {
    if renames.is_empty() {
        return;
    }
    let Payload::Records(records) = payload else { return };
    for record in records.iter_mut().filter_map(Value::as_object_mut) {
        for (from, to) in renames {
            if record.contains_key(*to) {
                continue;
            }
            if let Some(value) = record.remove(*from) {
                record.insert(to.to_string(), value);
            }
        }
    }
}

fn decode_rejection(response: &HttpResponse) -> RemoteError {
    let raw = response.body_text();
    let error = serde_json::from_str::<Value>(&raw)
        .ok()
        .and_then(|body| body.get("error").cloned());

    let Some(error) = error else {
        return RemoteError {
            status: response.status,
            code: None,
            message: None,
            details: Vec::new(),
            raw,
        };
    };

    let code = error.get("code").and_then(|code| match code {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    let message = error.get("message").and_then(Value::as_str).map(str::to_string);
    let details = match error.get("details") {
        Some(Value::Array(items)) => items.iter().filter_map(decode_detail).collect(),
        Some(other) => decode_detail(other).into_iter().collect(),
        None => Vec::new(),
    };

    RemoteError {
        status: response.status,
        code,
        message,
        details,
        raw,
    }
}

fn decode_detail(value: &Value) -> Option<ErrorDetail> {
    match value {
        Value::String(s) => Some(ErrorDetail {
            field: None,
            message: Some(s.clone()),
            extra: Map::new(),
        }),
        Value::Object(object) => {
            let mut extra = object.clone();
            let field = take_text(&mut extra, "field");
            let message = take_text(&mut extra, "message");
            Some(ErrorDetail { field, message, extra })
        }
        _ => None,
    }
}

/// Remove `key` from `object` when it renders as text; anything else stays
/// behind in `object`.
fn take_text(object: &mut Map<String, Value>, key: &str) -> Option<String> {
    let text = match object.get(key)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()?
            .join(","),
        _ => return None,
    };
    object.remove(key);
    Some(text)
}
