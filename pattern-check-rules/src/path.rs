use serde_json::Value;
use tracing::debug;

use crate::error::RuleError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Object member, or array element when the key is numeric.
    Key(String),
    Index(usize),
    /// `#`: the array length when last, otherwise the remaining path applied
    /// to every element.
    Count,
}

/// Parsed path expression addressing a location inside a JSON document.
///
/// Supports dot notation (`alert.labels.severity`), numeric array steps
/// (`items.0` or `items[0]`), quoted bracket keys (`labels["app.kubernetes.io/name"]`),
/// `\.` to escape a literal dot and a leading `$` root marker. A trailing `#`
/// yields the length of an array; `#` followed by more segments (`alerts.#.status`)
/// collects that path from every element into an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self, RuleError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RuleError::invalid_path(raw, "path is empty"));
        }

        let body = if trimmed == "$" {
            ""
        } else if let Some(rest) = trimmed.strip_prefix("$.") {
            rest
        } else if trimmed.starts_with("$[") {
            &trimmed[1..]
        } else {
            trimmed
        };

        let chars: Vec<char> = body.chars().collect();
        let mut segments = Vec::new();
        let mut token = String::new();
        let mut literal = false;
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '\\' => {
                    let next = chars
                        .get(i + 1)
                        .ok_or_else(|| RuleError::invalid_path(raw, "trailing escape character"))?;
                    token.push(*next);
                    literal = true;
                    i += 2;
                }
                '.' => {
                    flush(&mut token, &mut literal, &mut segments);
                    i += 1;
                }
                '[' => {
                    flush(&mut token, &mut literal, &mut segments);
                    let (segment, consumed) = parse_bracket(&chars[i + 1..], raw)?;
                    segments.push(segment);
                    i += consumed + 1;
                }
                ']' => return Err(RuleError::invalid_path(raw, "unexpected `]`")),
                ch => {
                    token.push(ch);
                    i += 1;
                }
            }
        }
        flush(&mut token, &mut literal, &mut segments);

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the path addresses the document root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Resolves the path to the canonical string form of the value it locates.
    ///
    /// Strings resolve to their raw text, numbers and booleans to their JSON
    /// text, objects and arrays to compact JSON. `null` and missing locations
    /// resolve to `None`.
    pub fn resolve(&self, root: &Value) -> Option<String> {
        render(&locate(&self.segments, root)?)
    }
}

fn locate(segments: &[Segment], current: &Value) -> Option<Value> {
    let Some((segment, rest)) = segments.split_first() else {
        return Some(current.clone());
    };

    match (segment, current) {
        (Segment::Count, Value::Array(items)) if rest.is_empty() => Some(Value::from(items.len())),
        (Segment::Count, Value::Array(items)) => Some(Value::Array(
            items
                .iter()
                .filter_map(|item| locate(rest, item))
                .filter(|value| !value.is_null())
                .collect(),
        )),
        (Segment::Key(key), Value::Object(map)) => locate(rest, map.get(key)?),
        (Segment::Key(key), Value::Array(items)) => {
            let index: usize = key.parse().ok()?;
            locate(rest, items.get(index)?)
        }
        (Segment::Index(index), Value::Array(items)) => locate(rest, items.get(*index)?),
        (Segment::Index(index), Value::Object(map)) => locate(rest, map.get(&index.to_string())?),
        _ => None,
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn flush(token: &mut String, literal: &mut bool, segments: &mut Vec<Segment>) {
    if !token.is_empty() {
        let segment = if token.as_str() == "#" && !*literal {
            Segment::Count
        } else {
            Segment::Key(std::mem::take(token))
        };
        segments.push(segment);
    }
    token.clear();
    *literal = false;
}

/// Parses the inside of a `[...]` selector. Returns the segment and the number
/// of characters consumed including the closing bracket.
fn parse_bracket(chars: &[char], raw: &str) -> Result<(Segment, usize), RuleError> {
    let mut i = 0;
    while chars.get(i).is_some_and(|c| c.is_whitespace()) {
        i += 1;
    }

    let quote = match chars.get(i).copied() {
        Some(q @ ('"' | '\'')) => Some(q),
        Some(_) => None,
        None => return Err(RuleError::invalid_path(raw, "unclosed `[`")),
    };

    if let Some(quote) = quote {
        i += 1;
        let mut key = String::new();
        loop {
            match chars.get(i) {
                Some('\\') => {
                    let next = chars
                        .get(i + 1)
                        .ok_or_else(|| RuleError::invalid_path(raw, "trailing escape character"))?;
                    key.push(*next);
                    i += 2;
                }
                Some(c) if *c == quote => {
                    i += 1;
                    break;
                }
                Some(c) => {
                    key.push(*c);
                    i += 1;
                }
                None => return Err(RuleError::invalid_path(raw, "unterminated quoted key")),
            }
        }
        while chars.get(i).is_some_and(|c| c.is_whitespace()) {
            i += 1;
        }
        return match chars.get(i) {
            Some(']') => Ok((Segment::Key(key), i + 1)),
            _ => Err(RuleError::invalid_path(raw, "expected `]` after quoted key")),
        };
    }

    let close = chars[i..]
        .iter()
        .position(|c| *c == ']')
        .ok_or_else(|| RuleError::invalid_path(raw, "unclosed `[`"))?;
    let content: String = chars[i..i + close].iter().collect();
    let content = content.trim();

    let segment = if content == "#" {
        Segment::Count
    } else if let Ok(index) = content.parse::<usize>() {
        Segment::Index(index)
    } else if content.is_empty() {
        return Err(RuleError::invalid_path(raw, "empty `[]` selector"));
    } else {
        return Err(RuleError::invalid_path(
            raw,
            "bracket selectors must be an index or a quoted key",
        ));
    };

    Ok((segment, i + close + 1))
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Extracts a scalar string from a serialized payload.
pub trait PathResolver: Send + Sync {
    /// Locates `path` in `payload`, returning `None` when nothing is there.
    fn lookup(&self, payload: &str, path: &str) -> Option<String>;

    /// Like [`PathResolver::lookup`] but maps absence to the empty string.
    fn resolve(&self, payload: &str, path: &str) -> String {
        self.lookup(payload, path).unwrap_or_default()
    }
}

/// Default resolver built on [`FieldPath`].
///
/// Never fails: an expression that does not parse locates nothing, like a
/// path that is missing from the payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPathResolver;

impl PathResolver for JsonPathResolver {
    fn lookup(&self, payload: &str, path: &str) -> Option<String> {
        let path = match FieldPath::parse(path) {
            Ok(path) => path,
            Err(err) => {
                debug!(%err, "unresolvable path expression");
                return None;
            }
        };
        let document: Value = match serde_json::from_str(payload) {
            Ok(document) => document,
            Err(err) => {
                debug!(%err, "payload is not valid JSON");
                return None;
            }
        };
        path.resolve(&document)
    }
}
