//! Calling methods by name with a bag of named parameters.
//!
//! Each type declares its callable methods once in a [`MethodTable`]: the
//! method name, its ordered parameter list, and the function to run. An
//! invocation binds the bag against that list, so no runtime introspection
//! is needed.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use crate::error::{DiError, Result};
use crate::value::{Args, Instance, Service, Value, ValueMap};

/// A declared method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: String,
    required: bool,
    default: Value,
}

impl Param {
    /// A parameter that must be supplied.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            default: Value::Null,
        }
    }

    /// An optional parameter defaulting to [`Value::Null`].
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            default: Value::Null,
        }
    }

    /// An optional parameter with a default.
    pub fn with_default(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            required: false,
            default: default.into(),
        }
    }

    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if the parameter has no default.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The value passed when the parameter is absent.
    pub fn default_value(&self) -> &Value {
        &self.default
    }
}

/// The ordered parameter list of a method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    /// Creates a signature from its parameters, in declaration order.
    pub fn new(params: impl IntoIterator<Item = Param>) -> Self {
        Self {
            params: params.into_iter().collect(),
        }
    }

    /// Returns the declared parameters.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Maps a parameter bag onto positional arguments.
    ///
    /// Keys the signature does not declare are ignored.
    ///
    /// ```
    /// use oxide_di::{Param, Signature, Value, ValueMap};
    ///
    /// let sig = Signature::new([Param::required("id"), Param::with_default("format", "html")]);
    /// let mut bag = ValueMap::new();
    /// bag.insert("id".into(), Value::from(7));
    /// bag.insert("unrelated".into(), Value::from("x"));
    ///
    /// let args = sig.bind("Posts::show", &bag).unwrap();
    /// assert_eq!(args.int(0).unwrap(), 7);
    /// assert_eq!(args.str(1).unwrap(), "html");
    /// assert_eq!(args.len(), 2);
    /// ```
    pub fn bind(&self, method: &str, bag: &ValueMap) -> Result<Args> {
        self.params
            .iter()
            .map(|param| match bag.get(&param.name) {
                Some(value) => Ok(value.clone()),
                None if param.required => Err(DiError::MissingRequiredParameter {
                    method: method.to_string(),
                    param: param.name.clone(),
                }),
                None => Ok(param.default.clone()),
            })
            .collect::<Result<Vec<_>>>()
            .map(Args::new)
    }
}

type MethodFn<T> = Arc<dyn Fn(&T, Args) -> Result<Value> + Send + Sync>;
type ErasedFn = Arc<dyn Fn(&Instance, Args) -> Result<Value> + Send + Sync>;

/// The callable methods of `T`.
///
/// ```
/// use oxide_di::{MethodTable, Param, Service, Value};
///
/// struct Greeter;
/// impl Service for Greeter {}
///
/// let table = MethodTable::<Greeter>::new().method(
///     "hello",
///     [Param::with_default("name", "world")],
///     |_, args| Ok(Value::from(format!("hello {}", args.str(0)?))),
/// );
/// assert_eq!(table.len(), 1);
/// ```
pub struct MethodTable<T> {
    methods: Vec<(String, Signature, MethodFn<T>)>,
}

impl<T: Service> Default for MethodTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Service> MethodTable<T> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            methods: Vec::new(),
        }
    }

    /// Declares a method. Names are matched ignoring ASCII case.
    #[must_use]
    pub fn method<P, F>(mut self, name: &str, params: P, f: F) -> Self
    where
        P: IntoIterator<Item = Param>,
        F: Fn(&T, Args) -> Result<Value> + Send + Sync + 'static,
    {
        self.methods
            .push((name.to_string(), Signature::new(params), Arc::new(f)));
        self
    }

    /// Returns the number of declared methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns true if no methods are declared.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    fn erase(self) -> MethodSet {
        let type_name = std::any::type_name::<T>();
        let methods = self
            .methods
            .into_iter()
            .map(|(name, signature, f)| {
                let call: ErasedFn = Arc::new(move |target: &Instance, args: Args| {
                    let this = target
                        .downcast_ref::<T>()
                        .ok_or_else(|| DiError::TypeMismatch {
                            name: target.type_name().to_string(),
                            expected: type_name,
                        })?;
                    f(this, args)
                });
                let method = ErasedMethod {
                    qualified: format!("{}::{name}", short_name(type_name)),
                    signature,
                    call,
                };
                (name.to_ascii_lowercase(), method)
            })
            .collect();
        MethodSet { type_name, methods }
    }
}

struct ErasedMethod {
    qualified: String,
    signature: Signature,
    call: ErasedFn,
}

struct MethodSet {
    type_name: &'static str,
    methods: HashMap<String, ErasedMethod>,
}

/// Method tables for every registered type.
#[derive(Default)]
pub struct MethodRegistry {
    tables: RwLock<HashMap<TypeId, Arc<MethodSet>>>,
}

impl MethodRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the methods of `T`, replacing any earlier table.
    pub fn register<T: Service>(&self, table: MethodTable<T>) {
        let set = Arc::new(table.erase());
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<T>(), set);
    }

    /// Returns the signature of `method` on the target's type.
    pub fn signature(&self, target: &Instance, method: &str) -> Option<Signature> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables
            .get(&target.type_id())?
            .methods
            .get(&method.to_ascii_lowercase())
            .map(|m| m.signature.clone())
    }

    /// Invokes `method` on `target` with named parameters.
    ///
    /// The method's own result and errors are returned unchanged.
    pub fn invoke(&self, target: &Instance, method: &str, params: &ValueMap) -> Result<Value> {
        let set = self
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&target.type_id())
            .cloned();
        let unknown = || DiError::UnknownMethod {
            type_name: target.type_name().to_string(),
            method: method.to_string(),
        };
        let set = set.ok_or_else(unknown)?;
        let entry = set
            .methods
            .get(&method.to_ascii_lowercase())
            .ok_or_else(unknown)?;

        let args = entry.signature.bind(&entry.qualified, params)?;
        trace!(method = %entry.qualified, args = args.len(), "invoking method");
        (entry.call)(target, args)
    }

    /// Like [`MethodRegistry::invoke`], for a bag that must be a map.
    pub fn invoke_value(&self, target: &Instance, method: &str, params: &Value) -> Result<Value> {
        match params {
            Value::Map(map) => self.invoke(target, method, map),
            Value::Null => self.invoke(target, method, &ValueMap::new()),
            other => Err(DiError::InvalidArgument(format!(
                "parameters for '{method}' must be a map, found {}",
                other.kind()
            ))),
        }
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<&str> = tables.values().map(|s| s.type_name).collect();
        names.sort_unstable();
        f.debug_struct("MethodRegistry").field("types", &names).finish()
    }
}

fn short_name(type_name: &str) -> &str {
    type_name.rsplit("::").next().unwrap_or(type_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Posts {
        title: String,
    }
    impl Service for Posts {}

    fn registry() -> MethodRegistry {
        let registry = MethodRegistry::new();
        registry.register(
            MethodTable::<Posts>::new()
                .method("Show", [Param::required("id")], |this, args| {
                    Ok(Value::from(format!("{} #{}", this.title, args.int(0)?)))
                })
                .method(
                    "list",
                    [Param::with_default("page", 1), Param::optional("tag")],
                    |_, args| {
                        let tag = if args.get(1).is_null() {
                            "any"
                        } else {
                            args.str(1)?
                        };
                        Ok(Value::from(format!("page {} tag {tag}", args.int(0)?)))
                    },
                )
                .method("fail", Vec::new(), |_, _| Err(DiError::failed("boom"))),
        );
        registry
    }

    fn bag(pairs: &[(&str, Value)]) -> ValueMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn posts() -> Instance {
        Instance::new(Posts {
            title: "Post".into(),
        })
    }

    #[test]
    fn test_missing_required_parameter() {
        let err = registry().invoke(&posts(), "Show", &ValueMap::new()).unwrap_err();
        assert!(matches!(
            err,
            DiError::MissingRequiredParameter { ref param, ref method }
                if param == "id" && method == "Posts::Show"
        ));
    }

    #[test]
    fn test_extra_keys_are_ignored() {
        let params = bag(&[("id", Value::from("4")), ("junk", Value::from(true))]);
        let out = registry().invoke(&posts(), "show", &params).unwrap();
        assert_eq!(out, Value::from("Post #4"));
    }

    #[test]
    fn test_defaults_fill_optional_parameters() {
        let out = registry().invoke(&posts(), "list", &ValueMap::new()).unwrap();
        assert_eq!(out, Value::from("page 1 tag any"));

        let params = bag(&[("tag", Value::from("rust")), ("page", Value::from(3))]);
        let out = registry().invoke(&posts(), "LIST", &params).unwrap();
        assert_eq!(out, Value::from("page 3 tag rust"));
    }

    #[test]
    fn test_method_errors_propagate() {
        let err = registry().invoke(&posts(), "fail", &ValueMap::new()).unwrap_err();
        assert!(matches!(err, DiError::Failed(m) if m == "boom"));
    }

    #[test]
    fn test_unknown_method_and_type() {
        let registry = registry();
        assert!(matches!(
            registry.invoke(&posts(), "delete", &ValueMap::new()),
            Err(DiError::UnknownMethod { .. })
        ));

        struct Unregistered;
        impl Service for Unregistered {}
        assert!(matches!(
            registry.invoke(&Instance::new(Unregistered), "show", &ValueMap::new()),
            Err(DiError::UnknownMethod { .. })
        ));
    }

    #[test]
    fn test_non_map_bag_is_invalid() {
        let err = registry()
            .invoke_value(&posts(), "show", &Value::List(vec![Value::from(1)]))
            .unwrap_err();
        assert!(matches!(err, DiError::InvalidArgument(_)));
    }

    #[test]
    fn test_signature_lookup() {
        let sig = registry().signature(&posts(), "show").unwrap();
        assert_eq!(sig.params().len(), 1);
        assert!(sig.params()[0].is_required());
    }
}
