//! Constructor argument specifications.

use crate::error::{DiError, Result};
use crate::key::BindingKey;
use crate::value::{Instance, Value};

/// Separator between option key and binding name in `key::binding` pairs.
pub const OPTION_SEPARATOR: &str = "::";

/// One declared constructor argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Passed through unchanged.
    Literal(Value),
    /// Resolved through the container.
    Ref(BindingKey),
    /// An option map, each entry resolved through the container.
    Options(Vec<(String, BindingKey)>),
}

impl Arg {
    /// Reads a string argument: dot-path names become references,
    /// anything else stays a literal string.
    ///
    /// ```
    /// use oxide_di::Arg;
    ///
    /// assert!(matches!(Arg::parse("db.connection"), Arg::Ref(_)));
    /// assert!(matches!(Arg::parse("localhost"), Arg::Literal(_)));
    /// ```
    pub fn parse(s: &str) -> Self {
        if BindingKey::is_reference(s) {
            Self::Ref(BindingKey::new(s))
        } else {
            Self::Literal(Value::from(s))
        }
    }

    /// A reference to another binding.
    pub fn reference(name: impl Into<BindingKey>) -> Self {
        Self::Ref(name.into())
    }

    /// Builds an option map from `key::binding.name` pairs.
    ///
    /// ```
    /// use oxide_di::Arg;
    ///
    /// let arg = Arg::options(["db::app.db", "cache::app.cache"]).unwrap();
    /// assert!(matches!(arg, Arg::Options(ref pairs) if pairs.len() == 2));
    /// assert!(Arg::options(["no separator"]).is_err());
    /// ```
    pub fn options<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        pairs
            .into_iter()
            .map(|pair| {
                let pair = pair.as_ref();
                let (key, binding) = pair.split_once(OPTION_SEPARATOR).ok_or_else(|| {
                    DiError::InvalidArgument(format!(
                        "option '{pair}' is not of the form key{OPTION_SEPARATOR}binding"
                    ))
                })?;
                if key.is_empty() || binding.is_empty() {
                    return Err(DiError::InvalidArgument(format!(
                        "option '{pair}' has an empty key or binding"
                    )));
                }
                Ok((key.to_string(), BindingKey::new(binding)))
            })
            .collect::<Result<Vec<_>>>()
            .map(Self::Options)
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<i64> for Arg {
    fn from(i: i64) -> Self {
        Self::Literal(Value::Int(i))
    }
}

impl From<i32> for Arg {
    fn from(i: i32) -> Self {
        Self::Literal(Value::from(i))
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Self::Literal(Value::Bool(b))
    }
}

impl From<Instance> for Arg {
    fn from(instance: Instance) -> Self {
        Self::Literal(Value::Object(instance))
    }
}

impl From<BindingKey> for Arg {
    fn from(key: BindingKey) -> Self {
        Self::Ref(key)
    }
}
