//! JSONPath expressions for body assertions and exports
//!
//! Supports the subset used by test definitions:
//!
//! ```text
//! $                 the document root
//! .name ['name']    object member
//! [2] [-1]          array element, negative counts from the end
//! [*] .*            every element or member
//! [1:3] [:2] [-2:]  array slice
//! ```
//!
//! A wildcard or slice anywhere in the path makes the result an array of
//! every match.

use serde_json::Value;

use crate::common::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(String),
    Index(i64),
    Wildcard,
    Slice(Option<i64>, Option<i64>),
}

/// A compiled JSONPath expression
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Compile an expression such as `$.data.items[0].id`
    pub fn parse(expr: &str) -> Result<Self> {
        let raw = expr.trim();
        let err = |msg: String| Error::json_path(raw, &msg);

        let rest = raw
            .strip_prefix('$')
            .ok_or_else(|| err("path must start with '$'".to_string()))?;
        let chars: Vec<char> = rest.chars().collect();
        let mut segments = Vec::new();
        let mut pos = 0;

        while pos < chars.len() {
            match chars[pos] {
                '.' => {
                    pos += 1;
                    match chars.get(pos) {
                        Some('.') => {
                            return Err(err("recursive descent '..' is not supported".to_string()))
                        }
                        Some('*') => {
                            segments.push(Segment::Wildcard);
                            pos += 1;
                        }
                        _ => {
                            let start = pos;
                            while pos < chars.len() && chars[pos] != '.' && chars[pos] != '[' {
                                pos += 1;
                            }
                            if start == pos {
                                return Err(err(format!("empty member name at position {}", start + 1)));
                            }
                            segments.push(Segment::Key(chars[start..pos].iter().collect()));
                        }
                    }
                }
                '[' => {
                    let open = pos;
                    let close = find_close(&chars, pos + 1)
                        .ok_or_else(|| err(format!("unclosed '[' at position {}", open + 1)))?;
                    let inner: String = chars[pos + 1..close].iter().collect();
                    segments.push(parse_bracket(inner.trim()).ok_or_else(|| {
                        err(format!("invalid selector '[{}]' at position {}", inner, open + 1))
                    })?);
                    pos = close + 1;
                }
                other => {
                    return Err(err(format!(
                        "unexpected character '{}' at position {}",
                        other,
                        pos + 1
                    )))
                }
            }
        }

        Ok(Self { segments })
    }

    /// Evaluate against a document. `None` means the path did not match.
    pub fn find(&self, root: &Value) -> Option<Value> {
        let mut current = vec![root];
        let mut multi = false;

        for segment in &self.segments {
            let mut next = Vec::new();
            for value in current {
                match segment {
                    Segment::Key(key) => {
                        if let Some(child) = value.as_object().and_then(|m| m.get(key)) {
                            next.push(child);
                        }
                    }
                    Segment::Index(index) => {
                        if let Some(items) = value.as_array() {
                            if let Some(i) = resolve_index(*index, items.len()) {
                                next.push(&items[i]);
                            }
                        }
                    }
                    Segment::Wildcard => match value {
                        Value::Array(items) => next.extend(items.iter()),
                        Value::Object(map) => next.extend(map.values()),
                        _ => {}
                    },
                    Segment::Slice(start, end) => {
                        if let Some(items) = value.as_array() {
                            let len = items.len() as i64;
                            let clamp = |i: i64| if i < 0 { (len + i).max(0) } else { i.min(len) };
                            let from = start.map(clamp).unwrap_or(0);
                            let to = end.map(clamp).unwrap_or(len);
                            if from < to {
                                next.extend(items[from as usize..to as usize].iter());
                            }
                        }
                    }
                }
            }

            if matches!(segment, Segment::Wildcard | Segment::Slice(..)) {
                multi = true;
            }
            if !multi && next.is_empty() {
                return None;
            }
            current = next;
        }

        if multi {
            Some(Value::Array(current.into_iter().cloned().collect()))
        } else {
            current.first().map(|v| (*v).clone())
        }
    }
}

/// Find the `]` closing a bracket, skipping over quoted member names
fn find_close(chars: &[char], from: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, &c) in chars.iter().enumerate().skip(from) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == ']' => return Some(i),
            None => {}
        }
    }
    None
}

fn parse_bracket(inner: &str) -> Option<Segment> {
    if inner == "*" {
        return Some(Segment::Wildcard);
    }

    for quote in ['\'', '"'] {
        if let Some(key) = inner
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
        {
            return Some(Segment::Key(key.to_string()));
        }
    }

    if let Some((start, end)) = inner.split_once(':') {
        let bound = |s: &str| -> Option<Option<i64>> {
            let s = s.trim();
            if s.is_empty() {
                Some(None)
            } else {
                s.parse().ok().map(Some)
            }
        };
        return Some(Segment::Slice(bound(start)?, bound(end)?));
    }

    inner.parse().ok().map(Segment::Index)
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let i = if index < 0 { len + index } else { index };
    (0..len).contains(&i).then_some(i as usize)
}

/// Compile and evaluate in one step
pub fn lookup(expr: &str, root: &Value) -> Result<Option<Value>> {
    Ok(JsonPath::parse(expr)?.find(root))
}
