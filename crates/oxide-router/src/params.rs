//! Route parameters and dispatch targets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Path parameters extracted from the URL, or supplied for reverse routing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    params: BTreeMap<String, String>,
}

impl Params {
    /// Creates new empty params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Sets a parameter (builder form of [`Params::insert`]).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Gets a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns true if the parameter is present.
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Parses a parameter as a specific type.
    pub fn parse<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Returns an iterator over the parameters, ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.to_string()))
                .collect(),
        }
    }
}

/// Role names understood by the dispatch layer.
pub mod roles {
    /// Application name.
    pub const APP: &str = "app";
    /// Controller name.
    pub const CONTROLLER: &str = "controller";
    /// Action (method) name.
    pub const ACTION: &str = "action";

    /// Roles that may be filled in from path parameters.
    pub const ALL: [&str; 3] = [APP, CONTROLLER, ACTION];
}

/// A route target: role name to value (`app`, `controller`, `action`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target {
    roles: BTreeMap<String, String>,
}

impl Target {
    /// Creates an empty target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a target naming an app, controller and action.
    pub fn handler(
        app: impl Into<String>,
        controller: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self::new()
            .with(roles::APP, app)
            .with(roles::CONTROLLER, controller)
            .with(roles::ACTION, action)
    }

    /// Sets a role value.
    #[must_use]
    pub fn with(mut self, role: impl Into<String>, value: impl Into<String>) -> Self {
        self.roles.insert(role.into(), value.into());
        self
    }

    /// Gets a role value.
    pub fn get(&self, role: &str) -> Option<&str> {
        self.roles.get(role).map(String::as_str)
    }

    /// The `app` role.
    pub fn app(&self) -> Option<&str> {
        self.get(roles::APP)
    }

    /// The `controller` role.
    pub fn controller(&self) -> Option<&str> {
        self.get(roles::CONTROLLER)
    }

    /// The `action` role.
    pub fn action(&self) -> Option<&str> {
        self.get(roles::ACTION)
    }

    /// Returns an iterator over the roles, ordered by role name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.roles.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Fills every standard role missing from this target with the
    /// parameter of the same name.
    pub(crate) fn merged_with(&self, params: &Params) -> Self {
        let mut merged = self.clone();
        for role in roles::ALL {
            if !merged.roles.contains_key(role) {
                if let Some(value) = params.get(role) {
                    merged.roles.insert(role.to_string(), value.to_string());
                }
            }
        }
        merged
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Target {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            roles: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
