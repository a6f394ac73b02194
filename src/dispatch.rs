//! Size-based dispatch between inline execution and the background worker.
//!
//! Small inputs always run on the calling thread; starting a worker costs
//! more than the transform itself. Inputs at or above the byte threshold go
//! over the channel. An application error coming back from a healthy worker
//! is a real result and is returned as-is; a transport error (worker could
//! not start, died, or disconnected) silently degrades to inline execution
//! so the caller never hangs and never sees the channel at all.

use once_cell::sync::OnceCell;
use std::sync::Mutex;

use crate::channel::ChannelClient;
use crate::error::JsonError;
use crate::options::{CleanOptions, FormatOptions, JsMinifyOptions, MinifyOptions};
use crate::protocol::{Action, RequestOptions, TransformRequest, TransformResponse};
use crate::worker::serve_transforms;
use crate::{js_format, js_minify, json};

/// Inputs at or above this many UTF-8 bytes are offloaded. Shared by the
/// JSON and JS entry points.
pub const OFFLOAD_THRESHOLD_BYTES: usize = 100 * 1024;

/// The dispatch predicate: true when `input` is at or above `threshold_bytes`.
pub fn should_offload(input: &str, threshold_bytes: usize) -> bool {
    input.len() >= threshold_bytes
}

type TransformClient = ChannelClient<TransformRequest, TransformResponse>;
type ServeFn = Box<
    dyn FnOnce(
            crossbeam_channel::Receiver<TransformRequest>,
            crossbeam_channel::Sender<TransformResponse>,
        ) + Send
        + 'static,
>;

/// Process-scoped transform engine.
///
/// Holds the lazily-created background channel: the worker starts on the
/// first over-threshold call and is reused for every later one; it is never
/// torn down. If the worker cannot be created, the engine remembers that and
/// runs everything inline from then on.
pub struct Engine {
    threshold_bytes: usize,
    client: OnceCell<Option<TransformClient>>,
    serve: Mutex<Option<ServeFn>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_threshold(OFFLOAD_THRESHOLD_BYTES)
    }

    pub fn with_threshold(threshold_bytes: usize) -> Self {
        Self::with_serve(threshold_bytes, Box::new(serve_transforms))
    }

    fn with_serve(threshold_bytes: usize, serve: ServeFn) -> Self {
        Self {
            threshold_bytes,
            client: OnceCell::new(),
            serve: Mutex::new(Some(serve)),
        }
    }

    /// Pretty-prints JSON, offloading large inputs.
    pub fn format_json(&self, input: &str, options: &FormatOptions) -> Result<String, JsonError> {
        let request_options = RequestOptions::Format(options.clone());
        match self.offload(input, Action::Format, Some(request_options), None) {
            Some(outcome) => outcome,
            None => json::format(input, options),
        }
    }

    /// Compacts JSON, offloading large inputs.
    pub fn minify_json(&self, input: &str, options: &MinifyOptions) -> Result<String, JsonError> {
        let request_options = RequestOptions::Minify(options.clone());
        match self.offload(input, Action::Minify, Some(request_options), None) {
            Some(outcome) => outcome,
            None => json::minify(input, options),
        }
    }

    /// Strips configured empty values from JSON, offloading large inputs.
    pub fn clean_json(&self, input: &str, options: &CleanOptions) -> Result<String, JsonError> {
        let request_options = RequestOptions::Clean(options.clone());
        match self.offload(input, Action::Clean, Some(request_options), None) {
            Some(outcome) => outcome,
            None => json::clean(input, options),
        }
    }

    /// Evaluates a JSONPath query, offloading large inputs.
    pub fn json_path(&self, input: &str, expression: &str) -> Result<String, JsonError> {
        match self.offload(input, Action::JsonPath, None, Some(expression.to_string())) {
            Some(outcome) => outcome,
            None => json::json_path(input, expression),
        }
    }

    /// Re-indents JavaScript, offloading large inputs.
    pub fn js_format(&self, input: &str, indent_size: usize) -> Result<String, String> {
        let request_options = RequestOptions::JsFormat { indent_size };
        match self.offload(input, Action::JsFormat, Some(request_options), None) {
            Some(outcome) => outcome.map_err(|error| error.message),
            None => js_format::format(input, indent_size),
        }
    }

    /// Minifies JavaScript, offloading large inputs.
    pub fn js_minify(&self, input: &str, options: &JsMinifyOptions) -> Result<String, String> {
        let request_options = RequestOptions::JsMinify(options.clone());
        match self.offload(input, Action::JsMinify, Some(request_options), None) {
            Some(outcome) => outcome.map_err(|error| error.message),
            None => js_minify::minify(input, options),
        }
    }

    /// Runs the transform over the channel when the input is large enough.
    ///
    /// `None` means "run inline": either the input is below the threshold or
    /// the channel failed at the transport level. `Some` carries the worker's
    /// verdict, success or application error, which is final.
    fn offload(
        &self,
        input: &str,
        action: Action,
        options: Option<RequestOptions>,
        path: Option<String>,
    ) -> Option<Result<String, JsonError>> {
        if !should_offload(input, self.threshold_bytes) {
            return None;
        }
        let client = self.client()?;

        let input = input.to_string();
        let handle = match client.send(move |id| TransformRequest { id, action, input, options, path }) {
            Ok(handle) => handle,
            Err(error) => {
                tracing::warn!(%error, "channel send failed; falling back to inline");
                return None;
            }
        };

        match handle.wait() {
            Ok(response) => Some(response_outcome(response)),
            Err(error) => {
                tracing::warn!(%error, "channel reply failed; falling back to inline");
                None
            }
        }
    }

    fn client(&self) -> Option<&TransformClient> {
        self.client
            .get_or_init(|| {
                let serve = self.serve.lock().ok().and_then(|mut slot| slot.take())?;
                match ChannelClient::start("transform", serve) {
                    Ok(client) => Some(client),
                    Err(error) => {
                        tracing::warn!(%error, "background worker unavailable; transforms run inline");
                        None
                    }
                }
            })
            .as_ref()
    }
}

fn response_outcome(response: TransformResponse) -> Result<String, JsonError> {
    if response.ok {
        Ok(response.value.unwrap_or_default())
    } else {
        Err(response
            .error
            .unwrap_or_else(|| JsonError::new("worker returned a malformed response")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{Receiver, Sender};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn big_json(target_bytes: usize) -> String {
        let mut out = String::from(r#"{"pad":""#);
        while out.len() < target_bytes {
            out.push('x');
        }
        out.push_str("\"}");
        out
    }

    #[test]
    fn threshold_is_inclusive() {
        let below = "a".repeat(9);
        let at = "a".repeat(10);
        assert!(!should_offload(&below, 10));
        assert!(should_offload(&at, 10));
        // Byte length, not char count.
        assert!(should_offload("é é é é é ", 10));
    }

    #[test]
    fn below_threshold_never_touches_the_channel() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_in_worker = Arc::clone(&hits);
        let serve = move |rx: Receiver<TransformRequest>, tx: Sender<TransformResponse>| {
            hits_in_worker.fetch_add(1, Ordering::SeqCst);
            serve_transforms(rx, tx);
        };

        let engine = Engine::with_serve(1 << 20, Box::new(serve));
        engine.format_json(r#"{"a":1}"#, &FormatOptions::default()).unwrap();
        engine.js_minify("const a = 1;", &JsMinifyOptions::default()).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn at_threshold_uses_the_channel() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_in_worker = Arc::clone(&hits);
        let serve = move |rx: Receiver<TransformRequest>, tx: Sender<TransformResponse>| {
            hits_in_worker.fetch_add(1, Ordering::SeqCst);
            serve_transforms(rx, tx);
        };

        let input = big_json(64);
        let engine = Engine::with_serve(input.len(), Box::new(serve));
        engine.minify_json(&input, &MinifyOptions::default()).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn offloaded_result_matches_inline() {
        let input = big_json(256);
        let engine = Engine::with_threshold(1);
        let offloaded = engine.format_json(&input, &FormatOptions::default()).unwrap();
        let inline = json::format(&input, &FormatOptions::default()).unwrap();
        assert_eq!(offloaded, inline);
    }

    #[test]
    fn transport_failure_falls_back_inline() {
        // The worker dies instantly; every offload attempt hits a transport
        // error and must still produce the inline result.
        let serve = |_rx: Receiver<TransformRequest>, _tx: Sender<TransformResponse>| {};
        let engine = Engine::with_serve(1, Box::new(serve));

        let ok = engine.minify_json("{ \"a\": 1 }", &MinifyOptions::default()).unwrap();
        assert_eq!(ok, r#"{"a":1}"#);

        let err = engine.format_json("{oops", &FormatOptions::default()).unwrap_err();
        assert!(err.line.is_some());

        let js = engine.js_format("if(true){x();}", 2).unwrap();
        assert_eq!(js, "if (true) {\n  x();\n}");
    }

    #[test]
    fn application_errors_are_not_retried_inline() {
        // A worker that fails every request with a distinctive message. If
        // the dispatcher fell back inline, this valid input would succeed.
        let serve = |rx: Receiver<TransformRequest>, tx: Sender<TransformResponse>| {
            for request in rx.iter() {
                let response =
                    TransformResponse::failure(request.id, JsonError::new("worker said no"));
                if tx.send(response).is_err() {
                    break;
                }
            }
        };
        let engine = Engine::with_serve(1, Box::new(serve));
        let err = engine.format_json(r#"{"a":1}"#, &FormatOptions::default()).unwrap_err();
        assert_eq!(err.message, "worker said no");
    }

    #[test]
    fn json_path_dispatches_with_expression() {
        let engine = Engine::with_threshold(1);
        let out = engine
            .json_path(r#"{"users":[{"name":"A"},{"name":"B"}]}"#, "$.users[*].name")
            .unwrap();
        assert_eq!(out, "[\n  \"A\",\n  \"B\"\n]");
    }
}
