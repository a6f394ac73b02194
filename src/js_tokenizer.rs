//! Lexical scanner for a C-family JavaScript subset.
//!
//! A single left-to-right pass over the source producing a flat token
//! stream. Whitespace between tokens is discarded; the formatter
//! re-synthesizes it. This is deliberately forgiving: unterminated strings
//! and comments end at end of input instead of failing, since the consumers
//! are formatters, not validators.

/// Multi-character operators, longest first so that longest-match wins
/// before single-character punctuation is considered.
const MULTI_CHAR_OPERATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=",
    "=>", "==", "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=",
    "*=", "/=", "%=", "**", "<<", ">>", "&=", "|=", "^=",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword: `[A-Za-z_$][A-Za-z0-9_$]*`.
    Word,
    /// Numeric literal: digits and interior dots.
    Number,
    /// Single- or double-quoted string, delimiters included.
    Str,
    /// Backtick template literal, delimiters included.
    Template,
    /// `//` or `/* */` comment, delimiters included.
    Comment,
    /// Structural punctuation or an unrecognized single character.
    Punct,
    /// Single- or multi-character operator.
    Operator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into() }
    }
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Self { chars: source.chars().collect(), pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn slice_from(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }

    fn matches(&self, literal: &str) -> bool {
        literal
            .chars()
            .enumerate()
            .all(|(offset, expected)| self.peek(offset) == Some(expected))
    }
}

/// Tokenizes `source` into a flat stream.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();

    while let Some(ch) = scanner.current() {
        if ch.is_whitespace() {
            scanner.advance();
            continue;
        }

        if ch == '/' && matches!(scanner.peek(1), Some('/') | Some('*')) {
            tokens.push(scan_comment(&mut scanner));
            continue;
        }

        if ch == '"' || ch == '\'' {
            tokens.push(scan_quoted(&mut scanner, TokenKind::Str));
            continue;
        }
        if ch == '`' {
            tokens.push(scan_quoted(&mut scanner, TokenKind::Template));
            continue;
        }

        if is_word_start(ch) {
            tokens.push(scan_word(&mut scanner));
            continue;
        }
        if ch.is_ascii_digit() {
            tokens.push(scan_number(&mut scanner));
            continue;
        }

        if let Some(op) = MULTI_CHAR_OPERATORS.iter().find(|op| scanner.matches(op)) {
            for _ in 0..op.chars().count() {
                scanner.advance();
            }
            tokens.push(Token::new(TokenKind::Operator, *op));
            continue;
        }

        scanner.advance();
        let kind = if is_operator_char(ch) { TokenKind::Operator } else { TokenKind::Punct };
        tokens.push(Token::new(kind, ch.to_string()));
    }

    tokens
}

fn scan_comment(scanner: &mut Scanner) -> Token {
    let start = scanner.pos;
    scanner.advance(); // '/'
    let is_block = scanner.current() == Some('*');
    scanner.advance();

    if is_block {
        let mut last_was_asterisk = false;
        while let Some(ch) = scanner.current() {
            scanner.advance();
            if ch == '/' && last_was_asterisk {
                break;
            }
            last_was_asterisk = ch == '*';
        }
    } else {
        while let Some(ch) = scanner.current() {
            if ch == '\n' {
                break;
            }
            scanner.advance();
        }
    }
    Token::new(TokenKind::Comment, scanner.slice_from(start))
}

fn scan_quoted(scanner: &mut Scanner, kind: TokenKind) -> Token {
    let start = scanner.pos;
    let quote = scanner.current().unwrap_or('"');
    scanner.advance();

    let mut escaped = false;
    while let Some(ch) = scanner.current() {
        scanner.advance();
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
        } else if ch == quote {
            break;
        }
    }
    Token::new(kind, scanner.slice_from(start))
}

fn scan_word(scanner: &mut Scanner) -> Token {
    let start = scanner.pos;
    while scanner.current().map(is_word_char).unwrap_or(false) {
        scanner.advance();
    }
    Token::new(TokenKind::Word, scanner.slice_from(start))
}

fn scan_number(scanner: &mut Scanner) -> Token {
    let start = scanner.pos;
    while let Some(ch) = scanner.current() {
        if ch.is_ascii_digit() {
            scanner.advance();
        } else if ch == '.' && scanner.peek(1).map(|next| next.is_ascii_digit()).unwrap_or(false) {
            scanner.advance();
        } else {
            break;
        }
    }
    Token::new(TokenKind::Number, scanner.slice_from(start))
}

fn is_word_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

pub(crate) fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

fn is_operator_char(ch: char) -> bool {
    matches!(ch, '+' | '-' | '*' | '/' | '%' | '=' | '<' | '>' | '!' | '&' | '|' | '^' | '~' | '?')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .into_iter()
            .map(|token| (token.kind, token.text))
            .collect()
    }

    #[test]
    fn words_numbers_punctuation() {
        assert_eq!(
            kinds("const a = 1.5;"),
            vec![
                (TokenKind::Word, "const".into()),
                (TokenKind::Word, "a".into()),
                (TokenKind::Operator, "=".into()),
                (TokenKind::Number, "1.5".into()),
                (TokenKind::Punct, ";".into()),
            ]
        );
    }

    #[test]
    fn multi_char_operators_beat_single_chars() {
        assert_eq!(
            kinds("a === b => c ?? d"),
            vec![
                (TokenKind::Word, "a".into()),
                (TokenKind::Operator, "===".into()),
                (TokenKind::Word, "b".into()),
                (TokenKind::Operator, "=>".into()),
                (TokenKind::Word, "c".into()),
                (TokenKind::Operator, "??".into()),
                (TokenKind::Word, "d".into()),
            ]
        );
    }

    #[test]
    fn strings_track_escaped_delimiters() {
        assert_eq!(
            kinds(r#"'it\'s' "a\"b" `t${x}`"#),
            vec![
                (TokenKind::Str, r#"'it\'s'"#.into()),
                (TokenKind::Str, r#""a\"b""#.into()),
                (TokenKind::Template, "`t${x}`".into()),
            ]
        );
    }

    #[test]
    fn comments_are_single_tokens() {
        let tokens = kinds("a // line\nb /* block\nstill */ c");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Word, "a".into()),
                (TokenKind::Comment, "// line".into()),
                (TokenKind::Word, "b".into()),
                (TokenKind::Comment, "/* block\nstill */".into()),
                (TokenKind::Word, "c".into()),
            ]
        );
    }

    #[test]
    fn unterminated_string_ends_at_input() {
        assert_eq!(kinds("'open"), vec![(TokenKind::Str, "'open".into())]);
    }

    #[test]
    fn unknown_characters_become_punct() {
        assert_eq!(kinds("a # b")[1], (TokenKind::Punct, "#".into()));
    }
}
