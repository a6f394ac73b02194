//! Comment/whitespace stripping for JavaScript with keyword protection.
//!
//! The passes run in a fixed order: comments are stripped by a string-aware
//! state machine, whitespace is collapsed (keeping the single space between
//! word characters and the guard against fusing `+ ++` / `- --`), and a
//! regex pass reinserts a space after keywords that ended up glued to an
//! adjacent operand. The reinsertion order matters: a naive collapse alone
//! would leave keywords lexically fused to their neighbors.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::options::JsMinifyOptions;

static KEYWORD_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\b(if|else|for|while|do|switch|case|return|const|let|var|function|new|typeof|instanceof|in|of|throw|await|async|yield|delete|void|try|catch|finally|class|extends)(["'`(\[{!~+-])"#,
    )
    .expect("valid regex")
});

static DOUBLE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("valid regex"));
static SPACE_BEFORE_TERMINATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" ([;,])").expect("valid regex"));
static SPACE_INSIDE_PARENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\( | \)").expect("valid regex"));

/// Minifies `input` according to `options`.
pub fn minify(input: &str, options: &JsMinifyOptions) -> Result<String, String> {
    let mut text = if options.remove_comments {
        strip_comments(input)
    } else {
        input.to_string()
    };

    if options.remove_spaces {
        text = collapse_whitespace(&text);
        text = rewrite_code_segments(&text, reinsert_keyword_spaces);
    }

    Ok(text.trim().to_string())
}

/// Removes `//` and `/* */` spans; comment markers inside string and
/// template literals are left alone.
fn strip_comments(input: &str) -> String {
    #[derive(Clone, Copy)]
    enum State {
        Code,
        AfterSlash,
        InString(char),
        InStringEscape(char),
        LineComment,
        BlockComment,
        BlockCommentStar,
    }

    let mut out = String::with_capacity(input.len());
    let mut state = State::Code;

    for ch in input.chars() {
        state = match state {
            State::Code => match ch {
                '/' => State::AfterSlash,
                '"' | '\'' | '`' => {
                    out.push(ch);
                    State::InString(ch)
                }
                _ => {
                    out.push(ch);
                    State::Code
                }
            },
            State::AfterSlash => match ch {
                '/' => State::LineComment,
                '*' => State::BlockComment,
                _ => {
                    // Not a comment opener after all; emit the held slash.
                    out.push('/');
                    out.push(ch);
                    match ch {
                        '"' | '\'' | '`' => State::InString(ch),
                        _ => State::Code,
                    }
                }
            },
            State::InString(quote) => {
                out.push(ch);
                if ch == '\\' {
                    State::InStringEscape(quote)
                } else if ch == quote {
                    State::Code
                } else {
                    State::InString(quote)
                }
            }
            State::InStringEscape(quote) => {
                out.push(ch);
                State::InString(quote)
            }
            State::LineComment => {
                if ch == '\n' {
                    out.push('\n');
                    State::Code
                } else {
                    State::LineComment
                }
            }
            State::BlockComment => {
                if ch == '*' {
                    State::BlockCommentStar
                } else {
                    State::BlockComment
                }
            }
            State::BlockCommentStar => match ch {
                '/' => State::Code,
                '*' => State::BlockCommentStar,
                _ => State::BlockComment,
            },
        };
    }
    if matches!(state, State::AfterSlash) {
        out.push('/');
    }
    out
}

/// Collapses runs of whitespace to at most one space, dropping the space
/// entirely next to structural punctuation. String literal contents are
/// untouched (a closing quote right after an escaped backslash still
/// closes), comment spans are copied verbatim so a kept `//` comment still
/// ends at its newline, word-word spaces are preserved, and `+ ++` /
/// `- --` keep a separating space so they do not fuse into a different
/// operator.
fn collapse_whitespace(input: &str) -> String {
    #[derive(Clone, Copy)]
    enum State {
        Code,
        InString { quote: char, escaped: bool },
        LineComment,
        BlockComment { star: bool },
    }

    let mut out = String::with_capacity(input.len());
    let mut state = State::Code;
    let mut pending_space = false;

    for ch in input.chars() {
        match state {
            State::InString { quote, escaped } => {
                out.push(ch);
                state = if escaped {
                    State::InString { quote, escaped: false }
                } else if ch == '\\' {
                    State::InString { quote, escaped: true }
                } else if ch == quote {
                    State::Code
                } else {
                    State::InString { quote, escaped: false }
                };
            }
            State::LineComment => {
                out.push(ch);
                if ch == '\n' {
                    state = State::Code;
                }
            }
            State::BlockComment { star } => {
                out.push(ch);
                state = match ch {
                    '/' if star => State::Code,
                    '*' => State::BlockComment { star: true },
                    _ => State::BlockComment { star: false },
                };
            }
            State::Code => {
                if ch.is_whitespace() {
                    pending_space = true;
                    continue;
                }
                if pending_space {
                    maybe_push_space(&mut out, ch);
                    pending_space = false;
                }
                out.push(ch);
                state = match ch {
                    '"' | '\'' | '`' => State::InString { quote: ch, escaped: false },
                    '/' if out.ends_with("//") => State::LineComment,
                    '*' if out.ends_with("/*") => State::BlockComment { star: false },
                    _ => State::Code,
                };
            }
        }
    }
    out
}

fn maybe_push_space(out: &mut String, next: char) {
    let Some(prev) = out.chars().last() else {
        return;
    };

    // Fusing these would change the operator.
    if (prev == '+' && next == '+') || (prev == '-' && next == '-') {
        out.push(' ');
        return;
    }

    const GLUE: &[char] = &[
        '(', ')', '[', ']', '{', '}', ',', ';', ':', '=', '+', '-', '*', '/',
        '%', '&', '|', '^', '!', '~', '<', '>', '?', '.',
    ];
    if GLUE.contains(&prev) || GLUE.contains(&next) {
        return;
    }

    if is_word_byte(prev) && is_word_byte(next) {
        out.push(' ');
    }
}

/// Puts the space back between a keyword and an operand the collapse glued
/// to it, then drops the incidental doubles this creates.
fn reinsert_keyword_spaces(code: &str) -> String {
    let spaced = KEYWORD_BOUNDARY.replace_all(code, "${1} ${2}");
    let spaced = DOUBLE_SPACE.replace_all(&spaced, " ");
    let spaced = SPACE_BEFORE_TERMINATOR.replace_all(&spaced, "${1}");
    SPACE_INSIDE_PARENS
        .replace_all(&spaced, |caps: &regex::Captures<'_>| {
            caps[0].trim().to_string()
        })
        .into_owned()
}

/// Applies `rewrite` to the stretches of code between string/template
/// literals, copying the literals through verbatim.
fn rewrite_code_segments(input: &str, rewrite: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(input.len());
    let mut segment = String::new();
    let mut in_string = false;
    let mut string_quote = ' ';
    let mut escaped = false;

    for ch in input.chars() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == string_quote {
                in_string = false;
            }
            continue;
        }
        if ch == '"' || ch == '\'' || ch == '`' {
            // The opening quote rides along so a keyword glued to it still
            // matches the boundary pattern.
            segment.push(ch);
            out.push_str(&rewrite(&segment));
            segment.clear();
            in_string = true;
            string_quote = ch;
            escaped = false;
            continue;
        }
        segment.push(ch);
    }
    out.push_str(&rewrite(&segment));
    out
}

fn is_word_byte(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_and_spaces() {
        let out = minify("// c\nconst a = 1;", &JsMinifyOptions::default()).unwrap();
        assert!(out.contains("const a=1;"));
        assert!(!out.contains("// c"));
    }

    #[test]
    fn keeps_comment_markers_inside_strings() {
        let out = minify(r#"const u = "http://x/*y*/";"#, &JsMinifyOptions::default()).unwrap();
        assert!(out.contains("http://x/*y*/"));
    }

    #[test]
    fn collapses_function_bodies() {
        let out = minify(
            "function foo ( x ) { return x + 1 ; }",
            &JsMinifyOptions::default(),
        )
        .unwrap();
        assert_eq!(out, "function foo(x){return x+1;}");
    }

    #[test]
    fn keywords_stay_separated_from_operands() {
        let options = JsMinifyOptions::default();
        assert_eq!(minify("return !x;", &options).unwrap(), "return !x;");
        assert_eq!(minify("typeof \"a\";", &options).unwrap(), "typeof \"a\";");
        assert_eq!(minify("const a = 1;", &options).unwrap(), "const a=1;");
    }

    #[test]
    fn increment_operators_never_fuse() {
        let out = minify("a + ++b; c - --d;", &JsMinifyOptions::default()).unwrap();
        assert!(out.contains("a+ ++b"));
        assert!(out.contains("c- --d"));
    }

    #[test]
    fn comments_only_pass() {
        let options = JsMinifyOptions { remove_comments: true, remove_spaces: false };
        let out = minify("const a = 1; /* gone */\nconst b = 2;", &options).unwrap();
        assert_eq!(out, "const a = 1; \nconst b = 2;");
    }

    #[test]
    fn spaces_only_pass_keeps_comments() {
        let options = JsMinifyOptions { remove_comments: false, remove_spaces: true };
        let out = minify("const  a  =  1;  // keep", &options).unwrap();
        assert!(out.starts_with("const a=1;"));
        assert!(out.contains("// keep"));
    }

    #[test]
    fn spaces_only_pass_ends_line_comments_at_newline() {
        // The newline that terminates a kept comment must survive the
        // collapse, or the next statement lands inside the comment.
        let options = JsMinifyOptions { remove_comments: false, remove_spaces: true };
        let out = minify("// note\nconst  a  =  1;", &options).unwrap();
        let (comment, code) = out.split_once('\n').unwrap();
        assert_eq!(comment, "// note");
        assert_eq!(code, "const a=1;");
    }

    #[test]
    fn escaped_backslash_still_closes_the_string() {
        let out = minify(
            r#"const p = "dir\\";   const   q = 1;"#,
            &JsMinifyOptions::default(),
        )
        .unwrap();
        assert_eq!(out, r#"const p="dir\\";const q=1;"#);
    }

    #[test]
    fn minify_is_idempotent() {
        let options = JsMinifyOptions::default();
        let once = minify("if (a) { b(); } else { c(); }", &options).unwrap();
        let twice = minify(&once, &options).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn string_contents_survive_collapse() {
        let out = minify(r#"const s = "a   b ; c";"#, &JsMinifyOptions::default()).unwrap();
        assert!(out.contains(r#""a   b ; c""#));
    }
}
