use serde::{Deserialize, Serialize};

/// Indentation unit for pretty-printed JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Indent {
    /// That many spaces per nesting level.
    Spaces(usize),
    /// One literal tab character per nesting level.
    Tab,
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Spaces(2)
    }
}

impl Indent {
    pub(crate) fn as_bytes(&self) -> Vec<u8> {
        match self {
            Indent::Spaces(n) => vec![b' '; *n],
            Indent::Tab => vec![b'\t'],
        }
    }
}

/// Options for [`crate::json::format`].
///
/// These are immutable per-invocation value objects; they carry no identity
/// and no lifecycle beyond the call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormatOptions {
    /// Indentation unit. Default: two spaces.
    pub indent: Indent,
    /// Recursively sort object keys in lexicographic order.
    /// Default: false (insertion order is preserved).
    pub sort_keys: bool,
    /// Passthrough flag for UI callers that copy results to the clipboard.
    /// The engine itself ignores it.
    pub auto_copy: bool,
}

/// Options for [`crate::json::minify`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinifyOptions {
    /// When false, output is serialized with a minimal one-space indent
    /// instead of fully compact. "Minify without removing spaces" still
    /// normalizes the structure.
    pub remove_spaces: bool,
    /// Recursively sort object keys in lexicographic order.
    pub sort_keys: bool,
    /// Passthrough flag, see [`FormatOptions::auto_copy`].
    pub auto_copy: bool,
}

impl Default for MinifyOptions {
    fn default() -> Self {
        Self { remove_spaces: true, sort_keys: false, auto_copy: false }
    }
}

/// Output style for [`crate::json::clean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanOutput {
    /// Re-serialize with [`crate::json::format`] defaults.
    #[default]
    Format,
    /// Re-serialize with [`crate::json::minify`] defaults.
    Minify,
}

/// Emptiness predicates and output style for [`crate::json::clean`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanOptions {
    /// Remove `null` values. Default: true.
    pub remove_null: bool,
    /// Remove the `"undefined"` string sentinel. Default: true.
    pub remove_undefined: bool,
    /// Remove empty strings. Default: true.
    pub remove_empty_string: bool,
    /// Remove arrays that are (or become) empty. Default: false.
    pub remove_empty_array: bool,
    /// Remove objects that are (or become) empty. Default: false.
    pub remove_empty_object: bool,
    /// How to serialize the cleaned value.
    pub output: CleanOutput,
    /// Passthrough flag, see [`FormatOptions::auto_copy`].
    pub auto_copy: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            remove_null: true,
            remove_undefined: true,
            remove_empty_string: true,
            remove_empty_array: false,
            remove_empty_object: false,
            output: CleanOutput::Format,
            auto_copy: false,
        }
    }
}

/// Options for [`crate::js_minify::minify`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsMinifyOptions {
    /// Strip `//` and `/* */` comments. Default: true.
    pub remove_comments: bool,
    /// Collapse and strip whitespace. Default: true.
    pub remove_spaces: bool,
}

impl Default for JsMinifyOptions {
    fn default() -> Self {
        Self { remove_comments: true, remove_spaces: true }
    }
}
