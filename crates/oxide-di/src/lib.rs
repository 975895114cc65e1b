//! # oxide-di
//!
//! A small service container: named bindings, argument resolution and
//! method invocation by parameter name.
//!
//! This crate provides:
//! - Value, service (shared) and factory (fresh) bindings under dot-path names
//! - Constructors registered once per class descriptor
//! - Recursive argument resolution with circular-reference detection
//! - Method tables that map a named-parameter bag onto a method signature
//!
//! ## Bindings
//!
//! ```
//! use oxide_di::{Arg, Container, Service};
//!
//! struct Mailer {
//!     host: String,
//! }
//! impl Service for Mailer {}
//!
//! let container = Container::new();
//! container.register_class("Mailer", |args| Ok(Mailer { host: args.str(0)?.to_string() }));
//!
//! container.map_value("mail.host", "smtp.example.com");
//! container.map_service("mail.mailer", "Mailer", [Arg::parse("mail.host")]);
//!
//! let a = container.get_object("mail.mailer")?;
//! let b = container.get_object("mail.mailer")?;
//! assert!(a.ptr_eq(&b));
//! # Ok::<(), oxide_di::DiError>(())
//! ```
//!
//! ## Option maps
//!
//! Arguments declared as `key::binding.name` pairs are resolved into a map:
//!
//! ```
//! use oxide_di::{Arg, Container, Service, ValueMap};
//!
//! struct Settings(ValueMap);
//! impl Service for Settings {}
//!
//! let container = Container::new();
//! container.register_class("Settings", |args| Ok(Settings(args.map(0)?.clone())));
//! container.map_value("app.name", "blog");
//! container.map_factory("app.settings", "Settings", [Arg::options(["name::app.name"])?]);
//!
//! let settings = container.get("app.settings")?.downcast::<Settings>().unwrap();
//! assert_eq!(settings.0["name"].as_str(), Some("blog"));
//! # Ok::<(), oxide_di::DiError>(())
//! ```
//!
//! ## Method invocation
//!
//! ```
//! use oxide_di::{Container, Instance, MethodTable, Param, Service, Value, ValueMap};
//!
//! struct Posts;
//! impl Service for Posts {}
//!
//! let container = Container::new();
//! container.register_methods(
//!     MethodTable::<Posts>::new().method("show", [Param::required("id")], |_, args| {
//!         Ok(Value::from(args.int(0)? * 2))
//!     }),
//! );
//!
//! let mut params = ValueMap::new();
//! params.insert("id".into(), Value::from("21"));
//! let out = container.invoke_method(&Instance::new(Posts), "show", &params)?;
//! assert_eq!(out, Value::Int(42));
//! # Ok::<(), oxide_di::DiError>(())
//! ```

mod arg;
mod container;
mod error;
mod invoke;
mod key;
mod value;

pub use arg::{Arg, OPTION_SEPARATOR};
pub use container::{BindingKind, Container};
pub use error::{DiError, Result};
pub use invoke::{MethodRegistry, MethodTable, Param, Signature};
pub use key::{BindingKey, SEPARATOR, ServiceKey};
pub use value::{AsAny, Args, ContainerSlot, Instance, Service, Value, ValueMap};
