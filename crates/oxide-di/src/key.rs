//! Binding names.

use std::fmt;
use std::marker::PhantomData;

/// Separator between the segments of a binding name.
pub const SEPARATOR: char = '.';

/// A binding name in dot-path form, e.g. `db.connection`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingKey(String);

impl BindingKey {
    /// Creates a key from a dot-path name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the dot-path name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the segments of the name.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }

    /// True if `s` reads as a binding reference rather than plain text.
    pub fn is_reference(s: &str) -> bool {
        s.contains(SEPARATOR)
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BindingKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for BindingKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&BindingKey> for BindingKey {
    fn from(key: &BindingKey) -> Self {
        key.clone()
    }
}

/// A binding name bound to the type it resolves to.
///
/// ```
/// use oxide_di::ServiceKey;
///
/// struct Mailer;
/// const MAILER: ServiceKey<Mailer> = ServiceKey::new("app.mailer");
/// assert_eq!(MAILER.name(), "app.mailer");
/// ```
pub struct ServiceKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ServiceKey<T> {
    /// Creates a typed key.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// Returns the dot-path name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the untyped key.
    pub fn key(&self) -> BindingKey {
        BindingKey::new(self.name)
    }
}

impl<T> Clone for ServiceKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ServiceKey<T> {}

impl<T> fmt::Debug for ServiceKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey({})", self.name)
    }
}
