//! HTTP methods and method sets.

use std::fmt;
use std::str::FromStr;

use crate::error::RouterError;

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    /// GET method
    Get,
    /// POST method
    Post,
    /// PUT method
    Put,
    /// PATCH method
    Patch,
    /// DELETE method
    Delete,
    /// HEAD method
    Head,
    /// OPTIONS method
    Options,
}

impl Method {
    /// All supported methods.
    pub const ALL: [Self; 7] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Head,
        Self::Options,
    ];

    /// Parses a method name, ignoring ASCII case.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Returns the method as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl FromStr for Method {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| RouterError::InvalidMethod(s.to_string()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of methods a route answers to.
///
/// Declared as a pipe-joined list such as `"GET|POST"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodSet {
    methods: Vec<Method>,
}

impl MethodSet {
    /// Parses a pipe-joined method list.
    ///
    /// ```
    /// use oxide_router::{Method, MethodSet};
    ///
    /// let set = MethodSet::parse("get|POST").unwrap();
    /// assert!(set.contains(Method::Get));
    /// assert!(set.contains(Method::Post));
    /// assert!(!set.contains(Method::Delete));
    /// ```
    pub fn parse(s: &str) -> Result<Self, RouterError> {
        let mut methods = Vec::new();
        for part in s.split('|').filter(|p| !p.trim().is_empty()) {
            let method: Method = part.parse()?;
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        if methods.is_empty() {
            return Err(RouterError::InvalidMethod(s.to_string()));
        }
        Ok(Self { methods })
    }

    /// Returns true if the set contains `method`.
    pub fn contains(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }

    /// Returns an iterator over the methods in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Method> + '_ {
        self.methods.iter().copied()
    }
}

impl From<Method> for MethodSet {
    fn from(method: Method) -> Self {
        Self {
            methods: vec![method],
        }
    }
}

impl fmt::Display for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.methods.iter().map(Method::as_str).collect();
        f.write_str(&names.join("|"))
    }
}
