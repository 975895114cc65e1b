//! Route pattern compilation and matching.
//!
//! Pattern syntax:
//! - `/users` - literal path, compared by string equality
//! - `/users/[i:id]` - typed placeholder, `id` must be digits
//! - `/users/[i:id]?` - optional placeholder, the preceding `/` or `.` is
//!   dropped together with it
//! - `*` - matches every path
//! - `@^/raw/(?P<id>\d+)$` - raw regex, used verbatim
//!
//! A placeholder is `[type:name]`, `[:name]` or `[name]`. The type selects a
//! fragment from the [`MatchTypes`] table; a type the table does not know is
//! used as a regex fragment as-is.

use std::collections::HashMap;

use regex::Regex;

use crate::error::{Result, RouterError};
use crate::params::Params;

/// Fragment used when a placeholder has no type.
const DEFAULT_FRAGMENT: &str = r"[^/.]+";

/// Named regex fragments selectable by placeholder type.
#[derive(Debug, Clone)]
pub struct MatchTypes {
    types: HashMap<String, String>,
}

impl Default for MatchTypes {
    fn default() -> Self {
        let types = [
            ("i", "[0-9]+"),
            ("a", "[0-9A-Za-z]+"),
            ("h", "[0-9A-Fa-f]+"),
            ("*", ".+"),
            ("", DEFAULT_FRAGMENT),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { types }
    }
}

impl MatchTypes {
    /// Creates the default table (`i`, `a`, `h`, `*`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a match type.
    pub fn insert(&mut self, kind: impl Into<String>, fragment: impl Into<String>) {
        self.types.insert(kind.into(), fragment.into());
    }

    /// Resolves a placeholder type to its regex fragment.
    pub fn fragment<'a>(&'a self, kind: &'a str) -> &'a str {
        self.types.get(kind).map_or(kind, String::as_str)
    }
}

/// A `(delimiter)?[type:name](?)` placeholder found in a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    delimiter: Option<char>,
    kind: String,
    name: String,
    optional: bool,
}

#[derive(Debug, Clone)]
enum Part {
    Literal(String),
    Token(Token),
}

#[derive(Debug, Clone)]
enum Kind {
    Literal,
    Wildcard,
    Raw(Regex),
    Template { regex: Regex, parts: Vec<Part> },
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    raw: String,
    kind: Kind,
    param_names: Vec<String>,
    prefix: String,
}

impl CompiledPattern {
    /// Compiles a pattern using the default match types.
    ///
    /// # Example
    ///
    /// ```
    /// use oxide_router::CompiledPattern;
    ///
    /// let pattern = CompiledPattern::new("/posts/[i:id]/comments/[i:comment_id]?").unwrap();
    /// let params = pattern.match_path("/posts/123/comments/456").unwrap();
    /// assert_eq!(params.get("id"), Some("123"));
    /// assert_eq!(params.get("comment_id"), Some("456"));
    /// assert!(pattern.match_path("/posts/123/comments").is_some());
    /// ```
    pub fn new(pattern: &str) -> Result<Self> {
        Self::compile(pattern, &MatchTypes::default())
    }

    /// Compiles a pattern against a match-type table.
    pub fn compile(pattern: &str, types: &MatchTypes) -> Result<Self> {
        if pattern == "*" {
            return Ok(Self {
                raw: pattern.to_string(),
                kind: Kind::Wildcard,
                param_names: Vec::new(),
                prefix: String::new(),
            });
        }

        if let Some(expr) = pattern.strip_prefix('@') {
            let regex = Regex::new(&format!("^(?:{expr})$"))
                .map_err(|e| RouterError::invalid_pattern(pattern, e.to_string()))?;
            let param_names = regex.capture_names().flatten().map(String::from).collect();
            return Ok(Self {
                raw: pattern.to_string(),
                kind: Kind::Raw(regex),
                param_names,
                prefix: String::new(),
            });
        }

        let parts = scan(pattern)?;
        if parts.iter().all(|p| matches!(p, Part::Literal(_))) {
            return Ok(Self {
                raw: pattern.to_string(),
                kind: Kind::Literal,
                param_names: Vec::new(),
                prefix: pattern.to_string(),
            });
        }

        let mut regex_str = String::from("^");
        let mut param_names: Vec<String> = Vec::new();
        let mut prefix = String::new();

        for part in &parts {
            match part {
                Part::Literal(text) => {
                    if param_names.is_empty() {
                        prefix.push_str(text);
                    }
                    regex_str.push_str(&regex::escape(text));
                }
                Part::Token(token) => {
                    if param_names.contains(&token.name) {
                        return Err(RouterError::invalid_pattern(
                            pattern,
                            format!("duplicate parameter '{}'", token.name),
                        ));
                    }
                    let delimiter = token
                        .delimiter
                        .map(|d| regex::escape(d.encode_utf8(&mut [0; 4])))
                        .unwrap_or_default();
                    regex_str.push_str(&format!(
                        "(?:{delimiter}(?P<{}>{}))",
                        token.name,
                        types.fragment(&token.kind)
                    ));
                    if token.optional {
                        regex_str.push('?');
                    }
                    param_names.push(token.name.clone());
                }
            }
        }
        regex_str.push('$');

        let regex = Regex::new(&regex_str)
            .map_err(|e| RouterError::invalid_pattern(pattern, e.to_string()))?;

        Ok(Self {
            raw: pattern.to_string(),
            kind: Kind::Template { regex, parts },
            param_names,
            prefix,
        })
    }

    /// Attempts to match a path against this pattern.
    ///
    /// Returns the named captures if the path matches. Optional placeholders
    /// that did not participate in the match are left out.
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let regex = match &self.kind {
            Kind::Wildcard => return Some(Params::new()),
            Kind::Literal => return (path == self.raw).then(Params::new),
            Kind::Raw(regex) => regex,
            Kind::Template { regex, .. } => {
                if !path.starts_with(&self.prefix) {
                    return None;
                }
                regex
            }
        };

        let caps = regex.captures(path)?;
        let mut params = Params::new();
        for name in &self.param_names {
            if let Some(value) = caps.name(name) {
                params.insert(name.clone(), value.as_str());
            }
        }
        Some(params)
    }

    /// Rebuilds a path from parameters.
    ///
    /// Supplied values replace their placeholder, absent optional
    /// placeholders are dropped along with their delimiter.
    pub fn reverse(&self, route: &str, params: &Params) -> Result<String> {
        let parts = match &self.kind {
            Kind::Wildcard => return Ok("/".to_string()),
            Kind::Literal => return Ok(self.raw.clone()),
            Kind::Raw(_) => {
                return Err(RouterError::invalid_pattern(
                    &self.raw,
                    "raw regex routes cannot be reversed",
                ))
            }
            Kind::Template { parts, .. } => parts,
        };

        let mut path = String::with_capacity(self.raw.len());
        for part in parts {
            match part {
                Part::Literal(text) => path.push_str(text),
                Part::Token(token) => match params.get(&token.name) {
                    Some(value) => {
                        if let Some(d) = token.delimiter {
                            path.push(d);
                        }
                        path.push_str(value);
                    }
                    None if token.optional => {}
                    None => {
                        return Err(RouterError::MissingRouteParameter {
                            route: route.to_string(),
                            param: token.name.clone(),
                        })
                    }
                },
            }
        }

        if path.is_empty() {
            path.push('/');
        }
        Ok(path)
    }

    /// Returns the original pattern string.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the parameter names in source order.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Returns the compiled regex, if the pattern needs one.
    pub fn regex(&self) -> Option<&Regex> {
        match &self.kind {
            Kind::Raw(regex) | Kind::Template { regex, .. } => Some(regex),
            Kind::Literal | Kind::Wildcard => None,
        }
    }

    /// Returns the literal text before the first placeholder.
    pub fn literal_prefix(&self) -> &str {
        &self.prefix
    }

    /// True for the match-all pattern `*`.
    pub fn is_wildcard(&self) -> bool {
        matches!(self.kind, Kind::Wildcard)
    }

    /// True for `@` raw regex patterns.
    pub fn is_raw(&self) -> bool {
        matches!(self.kind, Kind::Raw(_))
    }

    /// True for patterns without placeholders.
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, Kind::Literal)
    }
}

/// Splits a pattern into literal text and placeholders.
fn scan(pattern: &str) -> Result<Vec<Part>> {
    let bytes = pattern.as_bytes();
    let mut parts = Vec::new();
    let mut pos = 0;

    while let Some(rel) = pattern[pos..].find('[') {
        let open = pos + rel;
        let close = pattern[open..]
            .find(']')
            .map(|i| open + i)
            .ok_or_else(|| RouterError::invalid_pattern(pattern, "unclosed '['"))?;
        let inner = &pattern[open + 1..close];
        if inner.contains('[') {
            return Err(RouterError::invalid_pattern(pattern, "nested '['"));
        }

        let (kind, name) = inner.split_once(':').unwrap_or(("", inner));
        if !is_valid_name(name) {
            return Err(RouterError::invalid_pattern(
                pattern,
                format!("invalid parameter name '{name}'"),
            ));
        }

        let delimiter = (open > pos && matches!(bytes[open - 1], b'/' | b'.'))
            .then(|| char::from(bytes[open - 1]));
        let start = if delimiter.is_some() { open - 1 } else { open };
        let optional = bytes.get(close + 1) == Some(&b'?');

        if start > pos {
            parts.push(Part::Literal(pattern[pos..start].to_string()));
        }
        parts.push(Part::Token(Token {
            delimiter,
            kind: kind.to_string(),
            name: name.to_string(),
            optional,
        }));
        pos = close + 1 + usize::from(optional);
    }

    if pos < pattern.len() {
        parts.push(Part::Literal(pattern[pos..].to_string()));
    }
    Ok(parts)
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
