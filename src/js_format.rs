//! Token-stream-driven JavaScript re-indentation and re-spacing.
//!
//! The formatter consumes the flat token stream from [`crate::js_tokenizer`]
//! and re-emits it with synthesized whitespace: braces drive indentation,
//! semicolons terminate lines, a fixed operator set is spaced, and a
//! `needs_space` heuristic keeps wordish tokens lexically apart. Malformed
//! input produces oddly-spaced but non-crashing output; only an unexpected
//! internal panic is reported as an error.

use std::panic::{self, AssertUnwindSafe};

use crate::js_tokenizer::{tokenize, Token, TokenKind};

/// Keywords that keep a space before a following `(` (`if (x)` rather than
/// the call-syntax glue `log(x)`).
const SPACE_BEFORE_PAREN_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "catch", "return", "throw",
    "new", "in", "of", "typeof", "instanceof", "await", "yield", "delete",
    "void", "case",
];

/// Binary operators written with a space on both sides.
const SPACED_OPERATORS: &[&str] = &[
    "=", "==", "===", "!=", "!==", "<", ">", "<=", ">=", "&&", "||", "??",
    "+", "-", "*", "/", "%", "=>", "+=", "-=", "*=", "/=", "%=", "**", "**=",
    "&", "|", "^", "<<", ">>", ">>>", "&=", "|=", "^=", "&&=", "||=", "??=",
    "<<=", ">>=", ">>>=", "?",
];

/// Re-indents and re-spaces `input` with `indent_size` spaces per level.
pub fn format(input: &str, indent_size: usize) -> Result<String, String> {
    panic::catch_unwind(AssertUnwindSafe(|| format_tokens(input, indent_size)))
        .map_err(|_| "internal formatter error".to_string())
}

fn format_tokens(input: &str, indent_size: usize) -> String {
    let tokens = tokenize(input);
    let mut printer = Printer::new(indent_size);

    let mut prev: Option<&Token> = None;
    for token in &tokens {
        match token.kind {
            TokenKind::Comment => printer.push_comment(&token.text),
            TokenKind::Punct => match token.text.as_str() {
                "{" => printer.open_brace(),
                "}" => printer.close_brace(),
                ";" => printer.end_statement(),
                "," => printer.push_glued(", "),
                ":" => printer.push_glued(": "),
                "." => printer.push_glued("."),
                ")" | "]" => printer.push_closing(&token.text),
                "(" | "[" => printer.push_opening(&token.text, prev),
                _ => printer.push_token(&token.text, needs_space(prev, token)),
            },
            TokenKind::Operator => printer.push_operator(token, prev),
            _ => printer.push_token(&token.text, needs_space(prev, token)),
        }
        prev = Some(token);
    }

    printer.finish()
}

struct Printer {
    lines: Vec<String>,
    line: String,
    depth: usize,
    indent_unit: String,
}

impl Printer {
    fn new(indent_size: usize) -> Self {
        Self {
            lines: Vec::new(),
            line: String::new(),
            depth: 0,
            indent_unit: " ".repeat(indent_size),
        }
    }

    fn push_comment(&mut self, text: &str) {
        self.flush();
        for comment_line in text.lines() {
            self.push_raw(comment_line.trim());
            self.flush();
        }
    }

    fn open_brace(&mut self) {
        if !self.line.trim().is_empty() {
            self.trim_trailing_space();
            self.push_raw(" {");
        } else {
            self.push_raw("{");
        }
        self.flush();
        self.depth += 1;
    }

    fn close_brace(&mut self) {
        self.flush();
        self.depth = self.depth.saturating_sub(1);
        self.push_raw("}");
    }

    fn end_statement(&mut self) {
        self.trim_trailing_space();
        self.push_raw(";");
        self.flush();
    }

    fn push_opening(&mut self, text: &str, prev: Option<&Token>) {
        let keyword_before = prev
            .map(|p| p.kind == TokenKind::Word && SPACE_BEFORE_PAREN_KEYWORDS.contains(&p.text.as_str()))
            .unwrap_or(false);
        if keyword_before && text == "(" {
            self.push_token(text, true);
        } else {
            self.push_glued(text);
        }
    }

    fn push_closing(&mut self, text: &str) {
        self.trim_trailing_space();
        self.push_raw(text);
    }

    fn push_operator(&mut self, token: &Token, prev: Option<&Token>) {
        let text = token.text.as_str();

        if text == "++" || text == "--" || text == "!" || text == "~" || text == "?." {
            // Increment/unary operators glue to their operand.
            self.push_glued(text);
            return;
        }

        if (text == "+" || text == "-") && !is_value_end(prev) {
            // Unary sign: glue to the operand that follows.
            self.push_token(text, needs_space_before_unary(prev));
            return;
        }

        if SPACED_OPERATORS.contains(&text) {
            self.trim_trailing_space();
            self.push_raw(" ");
            self.push_raw(text);
            self.push_raw(" ");
        } else {
            self.push_glued(text);
        }
    }

    fn push_token(&mut self, text: &str, spaced: bool) {
        if spaced && !self.line.is_empty() && !self.line.ends_with(' ') {
            self.push_raw(" ");
        }
        self.push_raw(text);
    }

    fn push_glued(&mut self, text: &str) {
        self.push_raw(text);
    }

    fn push_raw(&mut self, text: &str) {
        if self.line.is_empty() {
            self.line = self.indent_unit.repeat(self.depth);
        }
        self.line.push_str(text);
    }

    fn trim_trailing_space(&mut self) {
        while self.line.ends_with(' ') {
            self.line.pop();
        }
    }

    fn flush(&mut self) {
        let trimmed = self.line.trim_end();
        if !trimmed.trim_start().is_empty() {
            self.lines.push(trimmed.to_string());
        }
        self.line.clear();
    }

    fn finish(mut self) -> String {
        self.flush();
        self.lines.join("\n")
    }
}

/// A single space between two "wordish" tokens, suppressed around member
/// access and after opening brackets.
fn needs_space(prev: Option<&Token>, current: &Token) -> bool {
    let Some(prev) = prev else {
        return false;
    };
    match prev.text.as_str() {
        "." | "?." | "(" | "[" | "!" | "~" | "++" | "--" => return false,
        "}" => return true,
        _ => {}
    }
    is_wordish(prev.kind) && is_wordish(current.kind)
}

fn needs_space_before_unary(prev: Option<&Token>) -> bool {
    // `return -1` keeps its space; `(-1` and `=-1` never had one (the
    // spaced-operator path already emitted one for `=`).
    prev.map(|p| p.kind == TokenKind::Word).unwrap_or(false)
}

/// True when `prev` can end a value, making a following `+`/`-` binary.
fn is_value_end(prev: Option<&Token>) -> bool {
    let Some(prev) = prev else {
        return false;
    };
    if matches!(prev.text.as_str(), ")" | "]") {
        return true;
    }
    if prev.kind == TokenKind::Word {
        return !SPACE_BEFORE_PAREN_KEYWORDS.contains(&prev.text.as_str());
    }
    matches!(prev.kind, TokenKind::Number | TokenKind::Str | TokenKind::Template)
}

fn is_wordish(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Word | TokenKind::Number | TokenKind::Str | TokenKind::Template
    )
}
