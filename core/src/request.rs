//! Turns validated arguments into a resolved `HttpRequest`.
//!
//! Path placeholders are substituted by name and percent-encoded as URL
//! segments; the remaining query arguments follow schema declaration order.

use url::Url;

use crate::catalog::{OperationDescriptor, ParamLocation};
use crate::error::{ApiError, ConfigError, ValidationError};
use crate::http::{HttpRequest, API_VERSION_HEADER};
use crate::validate::ValidatedArguments;

pub fn build_request(
    base_url: &Url,
    desc: &OperationDescriptor,
    args: &ValidatedArguments,
) -> Result<HttpRequest, ApiError> {
    let template: &'static str = desc.path;
    let mut segments = Vec::new();
    for segment in template.split('/').filter(|s| !s.is_empty()) {
        match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(placeholder) => {
                let value = args
                    .get(placeholder)
                    .filter(|v| v.is_populated())
                    .ok_or(ValidationError::UnresolvedPathParameter { placeholder })?;
                segments.push(value.render());
            }
            None => segments.push(segment.to_string()),
        }
    }

    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|()| ConfigError::InvalidUrl {
            value: base_url.to_string(),
            source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
        })?
        .pop_if_empty()
        .extend(segments);

    let mut headers = vec![
        ("accept".to_string(), "application/json".to_string()),
        (API_VERSION_HEADER.to_string(), args.api_version.clone()),
    ];
    let mut query = Vec::new();
    for spec in desc.params {
        let Some(value) = args.get(spec.name) else { continue };
        // Empty text and lists are never put on the wire.
        if !value.is_populated() {
            continue;
        }
        match spec.location {
            ParamLocation::Path => {}
            ParamLocation::Query => query.push((spec.name.to_string(), value.render())),
            ParamLocation::Header(name) => headers.push((name.to_string(), value.render())),
        }
    }

    Ok(HttpRequest {
        method: desc.method,
        url: url.into(),
        headers,
        query,
    })
}
