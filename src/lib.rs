//! # textsmith
//!
//! A text-transformation engine for JSON and JavaScript snippets: pure,
//! deterministic transforms (parse, format, minify, clean, JSONPath query,
//! JS format/minify) behind a dispatch layer that offloads large inputs to
//! an isolated background worker.
//!
//! ## Command-Line Tool
//!
//! This crate includes the `tsmith` CLI tool:
//!
//! ```sh
//! # Format JSON from stdin
//! echo '{"b":1,"a":2}' | tsmith format --sort-keys
//!
//! # Minify a file
//! tsmith minify input.json
//!
//! # Query with JSONPath
//! tsmith path --query '$.users[*].name' input.json
//!
//! # Minify JavaScript
//! tsmith js-minify app.js
//! ```
//!
//! Run `tsmith --help` for all options.
//!
//! ## Quick Start
//!
//! The pure transforms are plain functions:
//!
//! ```rust
//! use textsmith::json;
//! use textsmith::FormatOptions;
//!
//! let input = r#"{"name":"Alice","scores":[95,87,92]}"#;
//! let pretty = json::format(input, &FormatOptions::default()).unwrap();
//! assert!(pretty.starts_with("{\n  \"name\""));
//! ```
//!
//! ## Background Offloading
//!
//! UI-style callers go through an [`Engine`], which runs small inputs
//! inline and hands large ones to a lazily-started worker thread. Transport
//! failures fall back to inline execution transparently; the caller always
//! gets a `Result`, never a hang:
//!
//! ```rust
//! use textsmith::{Engine, MinifyOptions};
//!
//! let engine = Engine::new();
//! let out = engine.minify_json("{ \"a\": 1 }", &MinifyOptions::default()).unwrap();
//! assert_eq!(out, r#"{"a":1}"#);
//! ```
//!
//! ## Error Model
//!
//! No transform panics across its public boundary. Malformed JSON becomes a
//! [`JsonError`] carrying the parser diagnostic and a best-effort line
//! number; blank input is a fixed input error detected before parsing.
//! JavaScript transforms are formatters rather than validators: malformed
//! input yields oddly-spaced output, not an error.

mod channel;
mod dispatch;
mod error;
pub mod js_format;
pub mod js_minify;
mod js_tokenizer;
pub mod json;
mod jsonpath;
mod options;
mod protocol;
mod worker;

pub use crate::channel::{ChannelClient, Correlated, ReplyHandle};
pub use crate::dispatch::{should_offload, Engine, OFFLOAD_THRESHOLD_BYTES};
pub use crate::error::{ChannelError, JsonError};
pub use crate::js_tokenizer::{tokenize, Token, TokenKind};
pub use crate::jsonpath::Query;
pub use crate::options::{
    CleanOptions, CleanOutput, FormatOptions, Indent, JsMinifyOptions, MinifyOptions,
};
pub use crate::protocol::{Action, RequestOptions, TransformRequest, TransformResponse};
