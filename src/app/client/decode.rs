//! Response body decoding
//!
//! Bodies are parsed as JSON into the result type, optionally after
//! stripping a JSONP `callback(...)` wrapper. The wrapper must frame the
//! whole body; partial matches are rejected instead of being stripped
//! piecemeal.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::app::request::ResponseTransform;
use crate::errors::{DecodeError, DecodeResult};

/// `[/**/] callback ( payload ) [;]` with surrounding whitespace
static JSONP_WRAPPER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:/\*\*/)?\s*[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*\s*\(((?s:.*))\)\s*;?\s*$")
        .expect("JSONP wrapper pattern is valid")
});

/// Extract the payload from a JSONP-wrapped body
pub fn strip_jsonp(text: &str) -> DecodeResult<&str> {
    let captures = JSONP_WRAPPER
        .captures(text)
        .ok_or_else(|| DecodeError::JsonpWrapper {
            reason: "body is not of the form callback(...)".to_string(),
        })?;

    let payload = captures.get(1).map_or("", |m| m.as_str()).trim();
    if payload.is_empty() {
        return Err(DecodeError::JsonpWrapper {
            reason: "callback has no payload".to_string(),
        });
    }
    Ok(payload)
}

/// Decode a raw body into `T` according to `transform`
pub fn decode_body<T: DeserializeOwned>(body: &[u8], transform: ResponseTransform) -> DecodeResult<T> {
    match transform {
        ResponseTransform::None => Ok(serde_json::from_slice(body)?),
        ResponseTransform::Jsonp => {
            let text = String::from_utf8(body.to_vec())?;
            let payload = strip_jsonp(&text)?;
            Ok(serde_json::from_str(payload)?)
        }
    }
}
