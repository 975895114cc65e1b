//! The binding registry and instance resolver.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use tracing::{debug, trace};

use crate::arg::Arg;
use crate::error::{DiError, Result};
use crate::invoke::{MethodRegistry, MethodTable};
use crate::key::{BindingKey, ServiceKey};
use crate::value::{Args, Instance, Service, Value, ValueMap};

type Constructor = Arc<dyn Fn(Args) -> Result<Instance> + Send + Sync>;

/// How a binding produces its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// A literal returned unchanged.
    Value,
    /// Constructed once, then shared.
    Service,
    /// Constructed on every lookup.
    Factory,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Value => "value",
            Self::Service => "service",
            Self::Factory => "factory",
        })
    }
}

#[derive(Debug, Clone)]
struct Recipe {
    descriptor: String,
    args: Arc<[Arg]>,
}

enum Binding {
    Value(Value),
    Service {
        recipe: Recipe,
        cached: Option<Instance>,
    },
    Factory(Recipe),
}

impl Binding {
    fn kind(&self) -> BindingKind {
        match self {
            Self::Value(_) => BindingKind::Value,
            Self::Service { .. } => BindingKind::Service,
            Self::Factory(_) => BindingKind::Factory,
        }
    }
}

/// A registry of named bindings and the classes that can be constructed.
///
/// The container is shared as `Arc<Container>`; constructed objects that
/// expose a [`ContainerSlot`](crate::ContainerSlot) receive a weak handle
/// back to it.
///
/// # Example
///
/// ```
/// use oxide_di::{Arg, Container, Service};
///
/// struct Database {
///     url: String,
/// }
/// impl Service for Database {}
///
/// let container = Container::new();
/// container.register_class("Database", |args| {
///     Ok(Database { url: args.str(0)?.to_string() })
/// });
/// container.map_value("config.db_url", "sqlite::memory:");
/// container.map_service("app.db", "Database", [Arg::parse("config.db_url")]);
///
/// let db = container.get("app.db")?.downcast::<Database>().unwrap();
/// assert_eq!(db.url, "sqlite::memory:");
/// # Ok::<(), oxide_di::DiError>(())
/// ```
pub struct Container {
    this: Weak<Container>,
    bindings: RwLock<HashMap<BindingKey, Binding>>,
    classes: RwLock<HashMap<String, Constructor>>,
    methods: MethodRegistry,
}

impl Container {
    /// Creates an empty container.
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            bindings: RwLock::new(HashMap::new()),
            classes: RwLock::new(HashMap::new()),
            methods: MethodRegistry::new(),
        })
    }

    /// Registers a constructible class under a descriptor name.
    pub fn register_class<T, F>(&self, descriptor: impl Into<String>, build: F)
    where
        T: Service,
        F: Fn(Args) -> Result<T> + Send + Sync + 'static,
    {
        let descriptor = descriptor.into();
        debug!(descriptor = %descriptor, "class registered");
        let ctor: Constructor = Arc::new(move |args: Args| build(args).map(Instance::new));
        self.classes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(descriptor, ctor);
    }

    /// True if a class is registered under `descriptor`.
    pub fn has_class(&self, descriptor: &str) -> bool {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(descriptor)
    }

    /// Registers the callable methods of `T`.
    pub fn register_methods<T: Service>(&self, table: MethodTable<T>) {
        self.methods.register(table);
    }

    /// Binds a literal value.
    pub fn map_value(&self, name: impl Into<BindingKey>, value: impl Into<Value>) {
        self.insert(name.into(), Binding::Value(value.into()));
    }

    /// Binds a shared service, constructed on first lookup.
    pub fn map_service<I>(&self, name: impl Into<BindingKey>, descriptor: &str, args: I)
    where
        I: IntoIterator<Item = Arg>,
    {
        let recipe = Recipe::new(descriptor, args);
        self.insert(
            name.into(),
            Binding::Service {
                recipe,
                cached: None,
            },
        );
    }

    /// Binds a factory, constructing a new object on every lookup.
    pub fn map_factory<I>(&self, name: impl Into<BindingKey>, descriptor: &str, args: I)
    where
        I: IntoIterator<Item = Arg>,
    {
        self.insert(name.into(), Binding::Factory(Recipe::new(descriptor, args)));
    }

    /// Removes a binding. Returns true if it existed.
    pub fn unmap(&self, name: &str) -> bool {
        self.bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&BindingKey::from(name))
            .is_some()
    }

    /// True if a binding exists under `name`.
    pub fn exists(&self, name: &str) -> bool {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&BindingKey::from(name))
    }

    /// The kind of the binding under `name`.
    pub fn kind(&self, name: &str) -> Option<BindingKind> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&BindingKey::from(name))
            .map(Binding::kind)
    }

    /// All binding names, sorted.
    pub fn binding_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .map(ToString::to_string)
            .collect();
        names.sort_unstable();
        names
    }

    /// Resolves a binding.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.resolve_key(&BindingKey::from(name), &mut Vec::new())
    }

    /// Resolves a binding that must be an object.
    pub fn get_object(&self, name: &str) -> Result<Instance> {
        match self.get(name)? {
            Value::Object(instance) => Ok(instance),
            _ => Err(DiError::TypeMismatch {
                name: name.to_string(),
                expected: "object",
            }),
        }
    }

    /// Resolves a binding through its typed key.
    pub fn resolve<T: Service>(&self, key: &ServiceKey<T>) -> Result<Arc<T>> {
        self.get(key.name())?
            .downcast::<T>()
            .ok_or_else(|| DiError::TypeMismatch {
                name: key.name().to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Constructs a class directly, resolving its arguments.
    pub fn instance(&self, descriptor: &str, args: &[Arg]) -> Result<Instance> {
        self.construct(descriptor, args, &mut Vec::new())
    }

    /// Invokes `method` on `target` with named parameters.
    pub fn invoke_method(
        &self,
        target: &Instance,
        method: &str,
        params: &ValueMap,
    ) -> Result<Value> {
        self.methods.invoke(target, method, params)
    }

    /// Invokes `method` with a parameter bag that must be a map.
    pub fn invoke_value(&self, target: &Instance, method: &str, params: &Value) -> Result<Value> {
        self.methods.invoke_value(target, method, params)
    }

    /// The method registry.
    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    fn insert(&self, key: BindingKey, binding: Binding) {
        debug!(name = %key, kind = %binding.kind(), "binding mapped");
        self.bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, binding);
    }

    fn resolve_key(&self, key: &BindingKey, chain: &mut Vec<BindingKey>) -> Result<Value> {
        if chain.contains(key) {
            let mut path: Vec<&str> = chain.iter().map(BindingKey::as_str).collect();
            path.push(key.as_str());
            return Err(DiError::CircularBinding {
                chain: path.join(" -> "),
            });
        }

        let (kind, recipe) = {
            let bindings = self.bindings.read().unwrap_or_else(PoisonError::into_inner);
            match bindings.get(key) {
                None => return Err(DiError::UnknownBinding(key.to_string())),
                Some(Binding::Value(value)) => return Ok(value.clone()),
                Some(Binding::Service {
                    cached: Some(instance),
                    ..
                }) => return Ok(Value::Object(instance.clone())),
                Some(Binding::Service { recipe, .. }) => (BindingKind::Service, recipe.clone()),
                Some(Binding::Factory(recipe)) => (BindingKind::Factory, recipe.clone()),
            }
        };

        chain.push(key.clone());
        let built = self.construct(&recipe.descriptor, &recipe.args, chain);
        chain.pop();
        let instance = built?;

        if kind == BindingKind::Service {
            return Ok(Value::Object(self.cache(key, instance)));
        }
        Ok(Value::Object(instance))
    }

    /// Caches a freshly built service and returns the cached instance.
    ///
    /// If another instance was cached while this one was being built, the
    /// first cached instance wins and `instance` is dropped.
    fn cache(&self, key: &BindingKey, instance: Instance) -> Instance {
        let mut bindings = self.bindings.write().unwrap_or_else(PoisonError::into_inner);
        match bindings.get_mut(key) {
            Some(Binding::Service { cached, .. }) => {
                trace!(name = %key, "service cached");
                cached.get_or_insert(instance).clone()
            }
            _ => instance,
        }
    }

    fn construct(
        &self,
        descriptor: &str,
        args: &[Arg],
        chain: &mut Vec<BindingKey>,
    ) -> Result<Instance> {
        let ctor = self
            .classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(descriptor)
            .cloned()
            .ok_or_else(|| DiError::UnknownDescriptor(descriptor.to_string()))?;

        let values = args
            .iter()
            .map(|arg| self.resolve_arg(arg, chain))
            .collect::<Result<Vec<_>>>()?;

        let instance = ctor(Args::new(values))?;
        if let Some(slot) = instance.container_slot() {
            if slot.attach(self.this.clone()) {
                trace!(descriptor, "container attached");
            }
        }
        debug!(descriptor, "instance constructed");
        Ok(instance)
    }

    fn resolve_arg(&self, arg: &Arg, chain: &mut Vec<BindingKey>) -> Result<Value> {
        match arg {
            Arg::Literal(value) => Ok(value.clone()),
            Arg::Ref(key) => self.resolve_key(key, chain),
            Arg::Options(pairs) => pairs
                .iter()
                .map(|(option, key)| Ok((option.clone(), self.resolve_key(key, chain)?)))
                .collect::<Result<ValueMap>>()
                .map(Value::Map),
        }
    }
}

impl Recipe {
    fn new<I: IntoIterator<Item = Arg>>(descriptor: &str, args: I) -> Self {
        Self {
            descriptor: descriptor.to_string(),
            args: args.into_iter().collect(),
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings = self.bindings.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<(String, BindingKind)> = bindings
            .iter()
            .map(|(k, b)| (k.to_string(), b.kind()))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        let mut classes: Vec<String> = self
            .classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        classes.sort_unstable();
        f.debug_struct("Container")
            .field("bindings", &entries)
            .field("classes", &classes)
            .field("methods", &self.methods)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ContainerSlot;

    #[derive(Debug)]
    struct Conn {
        dsn: String,
    }
    impl Service for Conn {}

    struct Repo {
        conn: Arc<Conn>,
        slot: ContainerSlot,
    }
    impl Service for Repo {
        fn container_slot(&self) -> Option<&ContainerSlot> {
            Some(&self.slot)
        }
    }

    fn container() -> Arc<Container> {
        let c = Container::new();
        c.register_class("Conn", |args| {
            Ok(Conn {
                dsn: args.str(0)?.to_string(),
            })
        });
        c.register_class("Repo", |args| {
            Ok(Repo {
                conn: args.object::<Conn>(0)?,
                slot: ContainerSlot::new(),
            })
        });
        c
    }

    #[test]
    fn test_value_binding() {
        let c = container();
        c.map_value("x", 5);
        assert_eq!(c.get("x").unwrap(), Value::Int(5));
        assert_eq!(c.get("x").unwrap(), Value::Int(5));
        assert_eq!(c.kind("x"), Some(BindingKind::Value));
    }

    #[test]
    fn test_service_is_shared() {
        let c = container();
        c.map_service("db.conn", "Conn", [Arg::from(Value::from("mem"))]);
        let a = c.get_object("db.conn").unwrap();
        let b = c.get_object("db.conn").unwrap();
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_factory_builds_fresh_objects() {
        let c = container();
        c.map_factory("db.conn", "Conn", [Arg::from(Value::from("mem"))]);
        let a = c.get_object("db.conn").unwrap();
        let b = c.get_object("db.conn").unwrap();
        assert!(!a.ptr_eq(&b));
        assert_eq!(
            a.downcast_ref::<Conn>().unwrap().dsn,
            b.downcast_ref::<Conn>().unwrap().dsn
        );
    }

    #[test]
    fn test_dependencies_resolve_through_references() {
        let c = container();
        c.map_value("config.dsn", "sqlite://app.db");
        c.map_service("db.conn", "Conn", [Arg::parse("config.dsn")]);
        c.map_factory("repo.users", "Repo", [Arg::parse("db.conn")]);

        let repo = c.get("repo.users").unwrap().downcast::<Repo>().unwrap();
        let conn = c.get("db.conn").unwrap().downcast::<Conn>().unwrap();
        assert!(Arc::ptr_eq(&repo.conn, &conn));
        assert_eq!(conn.dsn, "sqlite://app.db");
    }

    #[test]
    fn test_container_is_injected_once() {
        let c = container();
        c.map_value("config.dsn", "x");
        c.map_service("db.conn", "Conn", [Arg::parse("config.dsn")]);
        c.map_service("repo.users", "Repo", [Arg::parse("db.conn")]);

        let repo = c.get("repo.users").unwrap().downcast::<Repo>().unwrap();
        let attached = repo.slot.container().unwrap();
        assert!(Arc::ptr_eq(&attached, &c));
        assert!(!repo.slot.attach(Weak::new()));
    }

    #[test]
    fn test_unknown_binding_and_descriptor() {
        let c = container();
        assert!(matches!(c.get("nope"), Err(DiError::UnknownBinding(n)) if n == "nope"));

        c.map_service("svc.ghost", "Ghost", Vec::new());
        assert!(matches!(
            c.get("svc.ghost"),
            Err(DiError::UnknownDescriptor(d)) if d == "Ghost"
        ));
        assert!(!c.has_class("Ghost"));
        assert!(c.has_class("Conn"));
    }

    #[test]
    fn test_circular_binding() {
        let c = container();
        c.map_service("a.one", "Repo", [Arg::parse("b.two")]);
        c.map_service("b.two", "Repo", [Arg::parse("a.one")]);

        let err = c.get("a.one").unwrap_err();
        assert!(matches!(
            err,
            DiError::CircularBinding { ref chain } if chain == "a.one -> b.two -> a.one"
        ));
        assert!(!c.exists("missing"));
    }

    #[test]
    fn test_failed_construction_caches_nothing() {
        let c = container();
        c.map_service("db.conn", "Conn", [Arg::from(42)]);
        assert!(matches!(c.get("db.conn"), Err(DiError::InvalidArgument(_))));

        c.map_value("config.dsn", "ok");
        c.map_service("db.conn", "Conn", [Arg::parse("config.dsn")]);
        assert!(c.get("db.conn").is_ok());
    }

    #[test]
    fn test_remapping_drops_cached_instance() {
        let c = container();
        c.map_service("db.conn", "Conn", [Arg::from(Value::from("a"))]);
        let first = c.get_object("db.conn").unwrap();
        c.map_service("db.conn", "Conn", [Arg::from(Value::from("b"))]);
        let second = c.get_object("db.conn").unwrap();
        assert!(!first.ptr_eq(&second));
        assert!(c.unmap("db.conn"));
        assert!(!c.exists("db.conn"));
    }
}
