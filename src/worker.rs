//! The background execution unit: mirrors the pure transforms and replies
//! with tagged responses. It shares nothing with the caller beyond the two
//! channels it is handed.

use crossbeam_channel::{Receiver, Sender};

use crate::error::JsonError;
use crate::options::{CleanOptions, FormatOptions, JsMinifyOptions, MinifyOptions};
use crate::protocol::{Action, RequestOptions, TransformRequest, TransformResponse};
use crate::{js_format, js_minify, json};

/// Serves transform requests until the request channel disconnects.
pub fn serve_transforms(requests: Receiver<TransformRequest>, responses: Sender<TransformResponse>) {
    for request in requests.iter() {
        let response = handle(request);
        if responses.send(response).is_err() {
            break;
        }
    }
}

fn handle(request: TransformRequest) -> TransformResponse {
    tracing::debug!(id = %request.id, action = ?request.action, "worker handling request");
    let TransformRequest { id, action, input, options, path } = request;

    let outcome: Result<String, JsonError> = match action {
        Action::Format => {
            let opts = match options {
                Some(RequestOptions::Format(opts)) => opts,
                _ => FormatOptions::default(),
            };
            json::format(&input, &opts)
        }
        Action::Minify => {
            let opts = match options {
                Some(RequestOptions::Minify(opts)) => opts,
                _ => MinifyOptions::default(),
            };
            json::minify(&input, &opts)
        }
        Action::Clean => {
            let opts = match options {
                Some(RequestOptions::Clean(opts)) => opts,
                _ => CleanOptions::default(),
            };
            json::clean(&input, &opts)
        }
        Action::JsonPath => json::json_path(&input, path.as_deref().unwrap_or("")),
        Action::JsFormat => {
            let indent_size = match options {
                Some(RequestOptions::JsFormat { indent_size }) => indent_size,
                _ => 2,
            };
            js_format::format(&input, indent_size).map_err(JsonError::new)
        }
        Action::JsMinify => {
            let opts = match options {
                Some(RequestOptions::JsMinify(opts)) => opts,
                _ => JsMinifyOptions::default(),
            };
            js_minify::minify(&input, &opts).map_err(JsonError::new)
        }
        Action::Unknown => Err(JsonError::new("unsupported action")),
    };

    match outcome {
        Ok(value) => TransformResponse::success(id, value),
        Err(error) => TransformResponse::failure(id, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn roundtrip(request: TransformRequest) -> TransformResponse {
        let (req_tx, req_rx) = unbounded();
        let (resp_tx, resp_rx) = unbounded();
        req_tx.send(request).unwrap();
        drop(req_tx);
        serve_transforms(req_rx, resp_tx);
        resp_rx.recv().unwrap()
    }

    fn request(action: Action, input: &str) -> TransformRequest {
        TransformRequest {
            id: "test-1".into(),
            action,
            input: input.into(),
            options: None,
            path: None,
        }
    }

    #[test]
    fn runs_the_matching_transform() {
        let response = roundtrip(request(Action::Minify, "{ \"a\": 1 }"));
        assert!(response.ok);
        assert_eq!(response.value.as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(response.id, "test-1");
    }

    #[test]
    fn json_path_uses_the_path_field() {
        let mut req = request(Action::JsonPath, r#"{"a":{"b":7}}"#);
        req.path = Some("$.a.b".into());
        let response = roundtrip(req);
        assert!(response.ok);
        assert_eq!(response.value.as_deref(), Some("7"));
    }

    #[test]
    fn transform_failures_become_tagged_errors() {
        let response = roundtrip(request(Action::Format, "{oops"));
        assert!(!response.ok);
        assert!(response.error.is_some());
    }

    #[test]
    fn unsupported_action_is_reported() {
        let response = roundtrip(request(Action::Unknown, "{}"));
        assert!(!response.ok);
        assert_eq!(response.error.unwrap().message, "unsupported action");
    }

    #[test]
    fn js_actions_are_mirrored() {
        let response = roundtrip(request(Action::JsMinify, "const a = 1;"));
        assert!(response.ok);
        assert_eq!(response.value.as_deref(), Some("const a=1;"));
    }
}
