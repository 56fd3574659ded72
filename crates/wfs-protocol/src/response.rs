//! GetFeature response interpretation.
//!
//! Success is decided by the transport status alone; the payload is then
//! checked for being a GeoJSON feature collection. Bodies are only ever
//! quoted partially in error messages.

use geojson::{FeatureCollection, GeoJson};
use serde_json::Value as JsonValue;
use wfs_common::{CrsCode, WfsError, WfsResult};

use crate::exceptions::{extract_exception_text, preview};
use crate::request::RawResponse;

/// Characters of a body quoted in error messages.
const MESSAGE_CHARS: usize = 200;

/// A parsed feature collection plus the CRS it was requested in.
#[derive(Debug, Clone)]
pub struct InterpretedResponse {
    pub collection: FeatureCollection,
    pub crs: CrsCode,
}

/// Validate a raw response and extract its feature collection.
pub fn interpret(response: &RawResponse, crs: CrsCode) -> WfsResult<InterpretedResponse> {
    if !response.is_success() {
        return Err(WfsError::UpstreamError {
            status: response.status,
            message: preview(&response.body, MESSAGE_CHARS),
        });
    }

    let collection = if response.declares_json() {
        let value: JsonValue = serde_json::from_str(&response.body).map_err(|e| {
            WfsError::format(format!(
                "invalid JSON ({}): {}",
                e,
                preview(&response.body, MESSAGE_CHARS)
            ))
        })?;
        feature_collection(value, &response.body)?
    } else {
        // Content type is sometimes mislabeled; try JSON before giving up
        match serde_json::from_str::<JsonValue>(&response.body) {
            Ok(value) => feature_collection(value, &response.body)?,
            Err(_) => {
                let message = extract_exception_text(&response.body)
                    .unwrap_or_else(|| preview(&response.body, MESSAGE_CHARS));
                tracing::warn!(
                    content_type = %response.content_type(),
                    preview = %preview(&response.body, 1000),
                    "Non-JSON response from feature service"
                );
                return Err(WfsError::FormatError { message });
            }
        }
    };

    Ok(InterpretedResponse { collection, crs })
}

/// Turn a JSON value into a feature collection, or a format error carrying
/// whatever message the value offers.
fn feature_collection(value: JsonValue, body: &str) -> WfsResult<FeatureCollection> {
    let is_collection = value.get("type").and_then(JsonValue::as_str) == Some("FeatureCollection");
    if !is_collection {
        return Err(WfsError::format(
            embedded_message(&value).unwrap_or_else(|| preview(body, MESSAGE_CHARS)),
        ));
    }

    match GeoJson::from_json_value(value) {
        Ok(GeoJson::FeatureCollection(fc)) => Ok(fc),
        Ok(_) => Err(WfsError::format(preview(body, MESSAGE_CHARS))),
        Err(e) => Err(WfsError::format(format!("malformed feature collection: {}", e))),
    }
}

/// Message from an error envelope such as `{"error": "..."}` or a service
/// exception object `{"response": {"error": {"text": "..."}}}`.
///
/// A proxy envelope that quotes an upstream exception report in `content`
/// yields the report's exception text.
fn embedded_message(value: &JsonValue) -> Option<String> {
    if let Some(text) = value
        .get("content")
        .and_then(JsonValue::as_str)
        .and_then(extract_exception_text)
    {
        return Some(text);
    }

    let candidates = [
        value.get("error"),
        value.get("message"),
        value.pointer("/response/error/text"),
        value.pointer("/response/error"),
    ];
    candidates.into_iter().flatten().find_map(|v| match v {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        JsonValue::Object(o) => o
            .get("text")
            .or_else(|| o.get("message"))
            .and_then(JsonValue::as_str)
            .map(str::to_string),
        _ => None,
    })
}
