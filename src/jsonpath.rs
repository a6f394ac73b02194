//! A compact JSONPath evaluator over `serde_json::Value`.
//!
//! Supported grammar: `$` root, `.name` / `['name']` / `["name"]` child
//! members, `[n]` indices (negative counts from the end), `.*` / `[*]`
//! wildcards, `..name` / `..*` / `..[n]` recursive descent, `[a,b]` unions
//! of names or indices, and `[start:end:step]` slices.
//!
//! Queries are parsed once into a selector list and evaluated by walking the
//! value tree, collecting matches by reference in document order.

use serde_json::Value;

use crate::error::JsonError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq)]
enum Selector {
    Name(String),
    Index(i64),
    Wildcard,
    Union(Vec<UnionPart>),
    Slice { start: Option<i64>, end: Option<i64>, step: i64 },
}

#[derive(Debug, Clone, PartialEq)]
enum UnionPart {
    Name(String),
    Index(i64),
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    axis: Axis,
    selector: Selector,
}

/// A parsed JSONPath query.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    steps: Vec<Step>,
}

impl Query {
    /// Parses `expression` into a query, or fails with a descriptive error.
    pub fn parse(expression: &str) -> Result<Self, JsonError> {
        Parser::new(expression).parse()
    }

    /// True when every step addresses exactly one location (names and
    /// indices only). Definite queries produce at most one match.
    pub fn is_definite(&self) -> bool {
        self.steps.iter().all(|step| {
            step.axis == Axis::Child
                && matches!(step.selector, Selector::Name(_) | Selector::Index(_))
        })
    }

    /// Evaluates the query, returning matched values in document order.
    pub fn evaluate<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![root];
        for step in &self.steps {
            let mut next = Vec::new();
            for value in current {
                match step.axis {
                    Axis::Child => apply_selector(value, &step.selector, &mut next),
                    Axis::Descendant => {
                        for node in descendants(value) {
                            apply_selector(node, &step.selector, &mut next);
                        }
                    }
                }
            }
            current = next;
        }
        current
    }
}

fn apply_selector<'a>(value: &'a Value, selector: &Selector, out: &mut Vec<&'a Value>) {
    match selector {
        Selector::Name(name) => {
            if let Value::Object(map) = value {
                if let Some(child) = map.get(name) {
                    out.push(child);
                }
            }
        }
        Selector::Index(index) => {
            if let Value::Array(items) = value {
                if let Some(resolved) = resolve_index(*index, items.len()) {
                    out.push(&items[resolved]);
                }
            }
        }
        Selector::Wildcard => match value {
            Value::Object(map) => out.extend(map.values()),
            Value::Array(items) => out.extend(items.iter()),
            _ => {}
        },
        Selector::Union(parts) => {
            for part in parts {
                match part {
                    UnionPart::Name(name) => apply_selector(value, &Selector::Name(name.clone()), out),
                    UnionPart::Index(index) => apply_selector(value, &Selector::Index(*index), out),
                }
            }
        }
        Selector::Slice { start, end, step } => {
            if let Value::Array(items) = value {
                for idx in slice_indices(*start, *end, *step, items.len()) {
                    out.push(&items[idx]);
                }
            }
        }
    }
}

/// The node itself plus every value nested beneath it, in document order.
fn descendants(value: &Value) -> Vec<&Value> {
    let mut found = Vec::new();
    let mut stack = vec![value];
    while let Some(node) = stack.pop() {
        found.push(node);
        match node {
            Value::Object(map) => stack.extend(map.values().rev()),
            Value::Array(items) => stack.extend(items.iter().rev()),
            _ => {}
        }
    }
    found
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };
    if (0..len).contains(&resolved) {
        Some(resolved as usize)
    } else {
        None
    }
}

fn slice_indices(start: Option<i64>, end: Option<i64>, step: i64, len: usize) -> Vec<usize> {
    if step == 0 || len == 0 {
        return Vec::new();
    }
    let len_i = len as i64;
    let clamp = |idx: i64| -> i64 {
        let idx = if idx < 0 { len_i + idx } else { idx };
        idx.clamp(0, len_i)
    };

    let mut out = Vec::new();
    if step > 0 {
        let mut idx = clamp(start.unwrap_or(0));
        let stop = clamp(end.unwrap_or(len_i));
        while idx < stop {
            out.push(idx as usize);
            idx += step;
        }
    } else {
        let mut idx = match start {
            Some(value) => clamp(value).min(len_i - 1),
            None => len_i - 1,
        };
        let stop = match end {
            Some(value) => clamp(value),
            None => -1,
        };
        while idx > stop && idx >= 0 {
            out.push(idx as usize);
            idx += step;
        }
    }
    out
}

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self { chars: source.chars().collect(), pos: 0, source }
    }

    fn parse(mut self) -> Result<Query, JsonError> {
        if self.next_char() != Some('$') {
            return Err(self.error("expression must start with '$'"));
        }

        let mut steps = Vec::new();
        while let Some(ch) = self.peek() {
            match ch {
                '.' => {
                    self.next_char();
                    if self.peek() == Some('.') {
                        self.next_char();
                        steps.push(self.parse_descendant_step()?);
                    } else {
                        let selector = self.parse_dot_selector()?;
                        steps.push(Step { axis: Axis::Child, selector });
                    }
                }
                '[' => {
                    let selector = self.parse_bracket_selector()?;
                    steps.push(Step { axis: Axis::Child, selector });
                }
                _ => return Err(self.error("expected '.' or '['")),
            }
        }
        Ok(Query { steps })
    }

    fn parse_descendant_step(&mut self) -> Result<Step, JsonError> {
        let selector = match self.peek() {
            Some('[') => self.parse_bracket_selector()?,
            Some(_) => self.parse_dot_selector()?,
            None => return Err(self.error("dangling '..'")),
        };
        Ok(Step { axis: Axis::Descendant, selector })
    }

    fn parse_dot_selector(&mut self) -> Result<Selector, JsonError> {
        if self.peek() == Some('*') {
            self.next_char();
            return Ok(Selector::Wildcard);
        }
        let name = self.take_while(is_member_char);
        if name.is_empty() {
            return Err(self.error("expected a member name after '.'"));
        }
        Ok(Selector::Name(name))
    }

    fn parse_bracket_selector(&mut self) -> Result<Selector, JsonError> {
        self.next_char(); // consume '['
        self.skip_spaces();

        if self.peek() == Some('*') {
            self.next_char();
            self.expect_close()?;
            return Ok(Selector::Wildcard);
        }

        let mut parts = Vec::new();
        let mut slice_fields: Vec<Option<i64>> = Vec::new();
        let mut is_slice = false;
        let mut is_union = false;

        loop {
            self.skip_spaces();
            match self.peek() {
                // Closes a slice with a trailing ':', as in `[1:]`.
                Some(']') if is_slice => break,
                Some('\'') | Some('"') => parts.push(UnionPart::Name(self.parse_quoted()?)),
                Some(':') => {
                    if is_union {
                        return Err(self.error("cannot mix ',' and ':' in brackets"));
                    }
                    is_slice = true;
                    slice_fields.push(None);
                }
                Some(ch) if ch == '-' || ch.is_ascii_digit() => {
                    let number = self.parse_integer()?;
                    if is_slice || self.peek_after_spaces() == Some(':') {
                        is_slice = true;
                    }
                    parts.push(UnionPart::Index(number));
                    slice_fields.push(Some(number));
                }
                _ => return Err(self.error("expected a name, index, slice, or '*' in brackets")),
            }

            self.skip_spaces();
            match self.peek() {
                Some(',') => {
                    if is_slice {
                        return Err(self.error("cannot mix ',' and ':' in brackets"));
                    }
                    is_union = true;
                    self.next_char();
                }
                Some(':') => {
                    if is_union {
                        return Err(self.error("cannot mix ',' and ':' in brackets"));
                    }
                    self.next_char();
                    is_slice = true;
                    // A lone ':' already pushed its placeholder above.
                    if self.peek_after_spaces() == Some(']') && slice_fields.len() < 3 {
                        slice_fields.push(None);
                    }
                }
                Some(']') => break,
                _ => return Err(self.error("expected ',', ':', or ']'")),
            }
        }
        self.expect_close()?;

        if is_slice {
            if slice_fields.len() > 3 {
                return Err(self.error("slice takes at most start:end:step"));
            }
            while slice_fields.len() < 3 {
                slice_fields.push(None);
            }
            return Ok(Selector::Slice {
                start: slice_fields[0],
                end: slice_fields[1],
                step: slice_fields[2].unwrap_or(1),
            });
        }

        match parts.len() {
            0 => Err(self.error("empty brackets")),
            1 => Ok(match parts.remove(0) {
                UnionPart::Name(name) => Selector::Name(name),
                UnionPart::Index(index) => Selector::Index(index),
            }),
            _ => Ok(Selector::Union(parts)),
        }
    }

    fn parse_quoted(&mut self) -> Result<String, JsonError> {
        let quote = self.next_char().unwrap_or('\'');
        let mut name = String::new();
        loop {
            match self.next_char() {
                Some('\\') => match self.next_char() {
                    Some(escaped) => name.push(escaped),
                    None => return Err(self.error("unterminated quoted name")),
                },
                Some(ch) if ch == quote => return Ok(name),
                Some(ch) => name.push(ch),
                None => return Err(self.error("unterminated quoted name")),
            }
        }
    }

    fn parse_integer(&mut self) -> Result<i64, JsonError> {
        let mut text = String::new();
        if self.peek() == Some('-') {
            text.push('-');
            self.next_char();
        }
        text.push_str(&self.take_while(|ch| ch.is_ascii_digit()));
        text.parse::<i64>().map_err(|_| self.error("expected an integer"))
    }

    fn expect_close(&mut self) -> Result<(), JsonError> {
        self.skip_spaces();
        if self.next_char() != Some(']') {
            return Err(self.error("expected ']'"));
        }
        Ok(())
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().map(&keep).unwrap_or(false) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(' ') {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_after_spaces(&self) -> Option<char> {
        let mut pos = self.pos;
        while self.chars.get(pos) == Some(&' ') {
            pos += 1;
        }
        self.chars.get(pos).copied()
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn error(&self, message: &str) -> JsonError {
        JsonError::new(format!(
            "Invalid JSONPath expression '{}': {} (at offset {})",
            self.source, message, self.pos
        ))
    }
}

fn is_member_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' || ch == '-'
}
