//! Kernel configuration files.
//!
//! ```json
//! {
//!   "base_url": "/app",
//!   "routes": [
//!     {"method": "GET", "route": "/users/[i:id]", "name": "user_show",
//!      "target": {"app": "Users", "controller": "Profile", "action": "Show"}}
//!   ],
//!   "bindings": [
//!     {"kind": "value", "name": "db.dsn", "value": "sqlite::memory:"},
//!     {"kind": "service", "name": "users.profile", "class": "Profile",
//!      "args": [["store::db.store"]]}
//!   ]
//! }
//! ```

use std::path::Path;

use oxide_di::{Arg, Container, Value, OPTION_SEPARATOR};
use oxide_router::{RouteDef, AJAX_MARKER};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{KernelError, Result};

/// Top-level kernel configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Prefix of generated URLs, possibly absolute.
    pub base_url: String,
    /// Path prefix stripped before matching. Defaults to the path part of
    /// `base_url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    /// Path suffix marking an ajax request.
    pub ajax_marker: String,
    /// Routes registered at startup, before any app boots.
    pub routes: Vec<RouteDef>,
    /// Container bindings registered at startup.
    pub bindings: Vec<BindingDecl>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            base_path: None,
            ajax_marker: AJAX_MARKER.to_string(),
            routes: Vec::new(),
            bindings: Vec::new(),
        }
    }
}

impl KernelConfig {
    /// Parses a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot.
    pub fn validate(&self) -> Result<()> {
        if !self.ajax_marker.is_empty() && !self.ajax_marker.starts_with('/') {
            return Err(KernelError::Config(format!(
                "ajax_marker '{}' must start with '/'",
                self.ajax_marker
            )));
        }
        if let Some(path) = self.base_path.as_deref() {
            if !path.is_empty() && !path.starts_with('/') {
                return Err(KernelError::Config(format!(
                    "base_path '{path}' must start with '/'"
                )));
            }
        }
        if let Some(decl) = self.bindings.iter().find(|decl| decl.name().is_empty()) {
            return Err(KernelError::Config(format!("binding without a name: {decl:?}")));
        }
        Ok(())
    }

    /// Reads a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        debug!(
            path = %path.display(),
            routes = config.routes.len(),
            bindings = config.bindings.len(),
            "loaded kernel configuration"
        );
        Ok(config)
    }

    /// Registers every declared binding.
    pub fn apply_bindings(&self, container: &Container) -> Result<()> {
        self.bindings.iter().try_for_each(|decl| decl.apply(container))
    }
}

/// A container binding declared in configuration.
///
/// String arguments containing a dot are references to other bindings.
/// An array of `key::binding` strings is an option map. Everything else
/// is passed to the constructor as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BindingDecl {
    /// A literal value.
    Value {
        name: String,
        value: serde_json::Value,
    },
    /// A shared service, built on first lookup.
    Service {
        name: String,
        class: String,
        #[serde(default)]
        args: Vec<serde_json::Value>,
    },
    /// A factory, built on every lookup.
    Factory {
        name: String,
        class: String,
        #[serde(default)]
        args: Vec<serde_json::Value>,
    },
}

impl BindingDecl {
    /// The binding name.
    pub fn name(&self) -> &str {
        match self {
            Self::Value { name, .. } | Self::Service { name, .. } | Self::Factory { name, .. } => {
                name
            }
        }
    }

    /// Registers the binding in `container`.
    pub fn apply(&self, container: &Container) -> Result<()> {
        match self {
            Self::Value { name, value } => {
                container.map_value(name.as_str(), Value::from(value.clone()));
            }
            Self::Service { name, class, args } => {
                container.map_service(name.as_str(), class, parse_args(args)?);
            }
            Self::Factory { name, class, args } => {
                container.map_factory(name.as_str(), class, parse_args(args)?);
            }
        }
        Ok(())
    }
}

fn parse_args(args: &[serde_json::Value]) -> Result<Vec<Arg>> {
    args.iter().map(parse_arg).collect()
}

fn parse_arg(json: &serde_json::Value) -> Result<Arg> {
    match json {
        serde_json::Value::String(s) => Ok(Arg::parse(s)),
        serde_json::Value::Array(items) if is_option_list(items) => {
            Ok(Arg::options(items.iter().filter_map(serde_json::Value::as_str))?)
        }
        other => Ok(Arg::Literal(Value::from(other.clone()))),
    }
}

fn is_option_list(items: &[serde_json::Value]) -> bool {
    !items.is_empty()
        && items
            .iter()
            .all(|item| item.as_str().is_some_and(|s| s.contains(OPTION_SEPARATOR)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KernelConfig::from_json("{}").unwrap();
        assert_eq!(config, KernelConfig::default());
        assert_eq!(config.ajax_marker, "/ajax");
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            KernelConfig::from_json(r#"{"ajax_marker": "ajax"}"#),
            Err(KernelError::Config(_))
        ));
        let unnamed = r#"{"bindings": [{"kind": "value", "name": "", "value": 1}]}"#;
        assert!(matches!(KernelConfig::from_json(unnamed), Err(KernelError::Config(_))));
        assert!(matches!(
            KernelConfig::from_json(r#"{"base_path": "portal"}"#),
            Err(KernelError::Config(_))
        ));
        assert!(KernelConfig::from_json(r#"{"ajax_marker": ""}"#).is_ok());
    }

    #[test]
    fn test_binding_decls() {
        let config = KernelConfig::from_json(
            r#"{"bindings": [
                {"kind": "value", "name": "site.title", "value": "Oxide"},
                {"kind": "factory", "name": "site.clock", "class": "Clock"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(config.bindings[0].name(), "site.title");
        assert!(matches!(
            config.bindings[1],
            BindingDecl::Factory { ref args, .. } if args.is_empty()
        ));
    }

    #[test]
    fn test_arg_forms() {
        let args: Vec<serde_json::Value> = serde_json::from_str(
            r#"[
                "db.store",
                "localhost",
                ["store::db.store", "log::app.log"],
                ["a", "b"],
                8080,
                {"debug": true}
            ]"#,
        )
        .unwrap();

        assert!(matches!(
            parse_arg(&args[0]).unwrap(),
            Arg::Ref(k) if k.as_str() == "db.store"
        ));
        assert_eq!(parse_arg(&args[1]).unwrap(), Arg::Literal(Value::from("localhost")));
        assert!(matches!(
            parse_arg(&args[2]).unwrap(),
            Arg::Options(ref o) if o.len() == 2
        ));
        assert!(matches!(parse_arg(&args[3]).unwrap(), Arg::Literal(Value::List(_))));
        assert_eq!(parse_arg(&args[4]).unwrap(), Arg::Literal(Value::Int(8080)));
        assert!(matches!(parse_arg(&args[5]).unwrap(), Arg::Literal(Value::Map(_))));
    }

    #[test]
    fn test_apply_value_binding() {
        let container = Container::new();
        let decl = BindingDecl::Value {
            name: "site.title".into(),
            value: serde_json::json!("Oxide"),
        };
        decl.apply(&container).unwrap();
        assert_eq!(container.get("site.title").unwrap(), Value::from("Oxide"));
    }
}
