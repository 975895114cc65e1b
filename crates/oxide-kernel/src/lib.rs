//! Application kernel for oxide.
//!
//! Ties an [`oxide_router::Router`] and an [`oxide_di::Container`] together.
//! Applications boot lazily: the first time a component of an app is
//! requested, its config, paths, routes, permissions and language are
//! registered through an [`AppBootstrap`], exactly once per app name.
//!
//! # Example
//!
//! ```
//! use oxide_di::{MethodTable, Param, Service, Value};
//! use oxide_kernel::{Kernel, KernelConfig, Result};
//! use oxide_router::{RouteDef, Target};
//!
//! struct Profile;
//! impl Service for Profile {}
//!
//! # fn main() -> Result<()> {
//! let config = KernelConfig {
//!     routes: vec![RouteDef::new("GET", "/users/[i:id]")
//!         .target(Target::handler("Users", "Profile", "Show"))
//!         .name("user_show")],
//!     ..KernelConfig::default()
//! };
//! let kernel = Kernel::new(config)?;
//! kernel.container().register_class("users.controller.profile", |_| Ok(Profile));
//! kernel.container().register_methods(MethodTable::<Profile>::new().method(
//!     "show",
//!     [Param::required("id")],
//!     |_, args| Ok(Value::from(format!("user {}", args.int(0)?))),
//! ));
//!
//! let out = kernel.dispatch("GET", "/users/42")?;
//! assert_eq!(out.output, Value::from("user 42"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod kernel;
pub mod lifecycle;

pub use config::{BindingDecl, KernelConfig};
pub use error::{KernelError, Result};
pub use kernel::{
    component_key, ComponentKind, Dispatched, Kernel, AJAX_MARKER_BINDING, BASE_PATH_BINDING,
    BASE_URL_BINDING,
};
pub use lifecycle::{
    AppBootstrap, AppInitState, AppStage, AppStates, BootContext, NoBootstrap, Stage,
};
