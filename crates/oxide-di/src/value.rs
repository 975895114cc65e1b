//! Values flowing through bindings, constructors and method calls.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use crate::container::Container;
use crate::error::{DiError, Result};

/// Named values, e.g. an option map or a method's parameter bag.
pub type ValueMap = BTreeMap<String, Value>;

/// Upcast helper implemented for every `Any + Send + Sync` type.
pub trait AsAny: Any + Send + Sync {
    /// Borrows `self` as `Any`.
    fn as_any(&self) -> &dyn Any;

    /// Converts a shared `self` into a shared `Any`.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// An object the container can construct and hand out.
///
/// Types that want to look up further bindings after construction return
/// a [`ContainerSlot`]; the container fills it once.
///
/// ```
/// use oxide_di::{ContainerSlot, Service};
///
/// #[derive(Default)]
/// struct Controller {
///     slot: ContainerSlot,
/// }
///
/// impl Service for Controller {
///     fn container_slot(&self) -> Option<&ContainerSlot> {
///         Some(&self.slot)
///     }
/// }
/// ```
pub trait Service: AsAny {
    /// The slot receiving the container handle, if the type wants one.
    fn container_slot(&self) -> Option<&ContainerSlot> {
        None
    }
}

/// Holds a handle to the container that built an object.
#[derive(Default)]
pub struct ContainerSlot(OnceLock<Weak<Container>>);

impl ContainerSlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the container, if attached and still alive.
    pub fn container(&self) -> Option<Arc<Container>> {
        self.0.get().and_then(Weak::upgrade)
    }

    /// Returns true once a container has been attached.
    pub fn is_attached(&self) -> bool {
        self.0.get().is_some()
    }

    /// Attaches a container. Returns false if one was already attached.
    pub fn attach(&self, container: Weak<Container>) -> bool {
        self.0.set(container).is_ok()
    }
}

impl fmt::Debug for ContainerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContainerSlot")
            .field(&self.is_attached())
            .finish()
    }
}

/// A shared, constructed object.
///
/// Cloning an `Instance` shares the object; [`Instance::ptr_eq`] compares
/// identity.
#[derive(Clone)]
pub struct Instance {
    inner: Arc<dyn Service>,
    type_name: &'static str,
}

impl Instance {
    /// Wraps a new object.
    pub fn new<T: Service>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared object.
    pub fn from_arc<T: Service>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Returns the shared object if it is a `T`.
    pub fn downcast<T: Service>(&self) -> Option<Arc<T>> {
        AsAny::into_any(Arc::clone(&self.inner)).downcast::<T>().ok()
    }

    /// Borrows the object if it is a `T`.
    pub fn downcast_ref<T: Service>(&self) -> Option<&T> {
        AsAny::as_any(&*self.inner).downcast_ref::<T>()
    }

    /// True if the object is a `T`.
    pub fn is<T: Service>(&self) -> bool {
        self.type_id() == TypeId::of::<T>()
    }

    /// The concrete type of the object.
    pub fn type_id(&self) -> TypeId {
        AsAny::as_any(&*self.inner).type_id()
    }

    /// The concrete type name of the object.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// True if both handles share the same object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn container_slot(&self) -> Option<&ContainerSlot> {
        self.inner.container_slot()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance<{}>", self.type_name)
    }
}

/// A literal, a structured value, or a constructed object.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    Str(String),
    /// List of values.
    List(Vec<Value>),
    /// Named values.
    Map(ValueMap),
    /// Constructed object.
    Object(Instance),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
        }
    }

    /// True for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer, parsing strings such as route parameters.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Str(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Returns the number as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => Some(*i as f64),
            Self::Str(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Returns the string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the list, if this is one.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the map, if this is one.
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the object, if this is one.
    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Self::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Returns the object as a `T`, if it is one.
    pub fn downcast<T: Service>(&self) -> Option<Arc<T>> {
        self.as_object().and_then(Instance::downcast)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Self::Object(instance)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Self::Map(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// Resolved positional arguments handed to a constructor or method.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: Vec<Value>,
}

impl Args {
    /// Wraps positional values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Returns the number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns argument `index`, or [`Value::Null`] past the end.
    pub fn get(&self, index: usize) -> &Value {
        const NULL: &Value = &Value::Null;
        self.values.get(index).unwrap_or(NULL)
    }

    /// Argument `index` as an integer.
    pub fn int(&self, index: usize) -> Result<i64> {
        let value = self.get(index);
        value.as_int().ok_or_else(|| mismatch(index, "int", value))
    }

    /// Argument `index` as a string.
    pub fn str(&self, index: usize) -> Result<&str> {
        let value = self.get(index);
        value.as_str().ok_or_else(|| mismatch(index, "string", value))
    }

    /// Argument `index` as a boolean.
    pub fn bool(&self, index: usize) -> Result<bool> {
        let value = self.get(index);
        value.as_bool().ok_or_else(|| mismatch(index, "bool", value))
    }

    /// Argument `index` as an option map.
    pub fn map(&self, index: usize) -> Result<&ValueMap> {
        let value = self.get(index);
        value.as_map().ok_or_else(|| mismatch(index, "map", value))
    }

    /// Argument `index` as a `T` object.
    pub fn object<T: Service>(&self, index: usize) -> Result<Arc<T>> {
        let value = self.get(index);
        value
            .downcast::<T>()
            .ok_or_else(|| mismatch(index, std::any::type_name::<T>(), value))
    }

    /// Returns the values.
    pub fn into_vec(self) -> Vec<Value> {
        self.values
    }
}

fn mismatch(index: usize, expected: &str, found: &Value) -> DiError {
    DiError::InvalidArgument(format!(
        "argument {index}: expected {expected}, found {}",
        found.kind()
    ))
}
