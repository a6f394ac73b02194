//! Wire-level request/response shapes for the background worker.
//!
//! Both types are serializable and short-lived: a request is created per
//! call, correlated by `id`, and the matching response is destroyed as soon
//! as it is delivered to the waiting caller.

use serde::{Deserialize, Serialize};

use crate::channel::Correlated;
use crate::error::JsonError;
use crate::options::{CleanOptions, FormatOptions, JsMinifyOptions, MinifyOptions};

/// The transform a request asks the worker to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Format,
    Minify,
    Clean,
    JsonPath,
    JsFormat,
    JsMinify,
    /// Anything the worker does not understand; answered with a
    /// `{ok: false, "unsupported action"}` response.
    #[serde(other)]
    Unknown,
}

/// Per-action options payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestOptions {
    Format(FormatOptions),
    Minify(MinifyOptions),
    Clean(CleanOptions),
    JsFormat { indent_size: usize },
    JsMinify(JsMinifyOptions),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformRequest {
    pub id: String,
    pub action: Action,
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<RequestOptions>,
    /// JSONPath expression, only meaningful for [`Action::JsonPath`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformResponse {
    pub id: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
}

impl TransformResponse {
    pub fn success(id: String, value: String) -> Self {
        Self { id, ok: true, value: Some(value), error: None }
    }

    pub fn failure(id: String, error: JsonError) -> Self {
        Self { id, ok: false, value: None, error: Some(error) }
    }
}

impl Correlated for TransformResponse {
    fn correlation_id(&self) -> &str {
        &self.id
    }
}
