//! The kernel: one router, one container, lazily booted apps.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use oxide_di::{Container, Instance, Value, ValueMap};
use oxide_router::{roles, AccessCheck, Params, RouteMatch, Router};
use tracing::{debug, instrument};

use crate::config::KernelConfig;
use crate::error::{KernelError, Result};
use crate::lifecycle::{AppBootstrap, AppStates, BootContext, NoBootstrap};

/// Binding holding the configured base URL.
pub const BASE_URL_BINDING: &str = "kernel.base_url";
/// Binding holding the path prefix stripped before matching.
pub const BASE_PATH_BINDING: &str = "kernel.base_path";
/// Binding holding the configured ajax marker.
pub const AJAX_MARKER_BINDING: &str = "kernel.ajax_marker";

/// The kind of a handler component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Request handler.
    Controller,
    /// Data access.
    Model,
    /// Rendering.
    View,
}

impl ComponentKind {
    /// Returns the lowercase name used in binding names.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Controller => "controller",
            Self::Model => "model",
            Self::View => "view",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of dispatching a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    /// The matched route.
    pub route: RouteMatch,
    /// What the controller action returned.
    pub output: Value,
}

/// Owns the route table, the service container and app bootstrap state.
pub struct Kernel {
    config: KernelConfig,
    router: RwLock<Router>,
    container: Arc<Container>,
    apps: AppStates,
    bootstrap: Arc<dyn AppBootstrap>,
}

impl Kernel {
    /// Creates a kernel, registering the configured routes and bindings.
    pub fn new(config: KernelConfig) -> Result<Self> {
        config.validate()?;
        let mut router = Router::new().with_base_url(config.base_url.as_str());
        if let Some(base_path) = &config.base_path {
            router.set_base_path(base_path.as_str());
        }
        router.set_ajax_marker(config.ajax_marker.as_str());
        router.add_routes(config.routes.iter().cloned())?;

        let container = Container::new();
        container.map_value(BASE_URL_BINDING, router.base_url());
        container.map_value(BASE_PATH_BINDING, router.base_path());
        container.map_value(AJAX_MARKER_BINDING, config.ajax_marker.as_str());
        config.apply_bindings(&container)?;

        debug!(
            routes = router.len(),
            bindings = container.binding_names().len(),
            "kernel created"
        );
        Ok(Self {
            config,
            router: RwLock::new(router),
            container,
            apps: AppStates::new(),
            bootstrap: Arc::new(NoBootstrap),
        })
    }

    /// Reads a JSON configuration file and creates a kernel from it.
    pub fn from_config_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Self::new(KernelConfig::load(path)?)
    }

    /// Sets the per-app registration hooks.
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: impl AppBootstrap + 'static) -> Self {
        self.bootstrap = Arc::new(bootstrap);
        self
    }

    /// Installs the permission check used by URL generation.
    #[must_use]
    pub fn with_access_check(self, check: impl AccessCheck + 'static) -> Self {
        self.router_mut().set_access_check(Arc::new(check));
        self
    }

    /// Returns the configuration the kernel was created from.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Returns the service container.
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Read access to the route table.
    pub fn router(&self) -> RwLockReadGuard<'_, Router> {
        self.router.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access to the route table.
    pub fn router_mut(&self) -> RwLockWriteGuard<'_, Router> {
        self.router.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the bootstrap state of every app seen so far.
    pub fn apps(&self) -> &AppStates {
        &self.apps
    }

    /// Runs the pending boot stages of `app`.
    pub fn boot(&self, app: &str) -> Result<()> {
        self.apps.boot(app, self.boot_context())
    }

    /// Builds a handler component of `app`.
    ///
    /// The app is booted first. The component comes from the binding
    /// `app.kind.name` (lowercased) if one exists, otherwise from the class
    /// registered under that same name.
    #[instrument(level = "debug", skip(self))]
    pub fn component(
        &self,
        app: &str,
        kind: ComponentKind,
        name: &str,
        is_ajax: bool,
    ) -> Result<Instance> {
        let ctx = self.boot_context();
        self.apps.boot(app, ctx)?;
        self.apps.init_assets(app, is_ajax, ctx)?;

        let key = component_key(app, kind, name);
        let instance = if self.container.exists(&key) {
            self.container.get_object(&key)?
        } else {
            self.container.instance(&key, &[])?
        };
        debug!(component = %key, type_name = instance.type_name(), "component built");
        Ok(instance)
    }

    /// Matches a request against the route table.
    pub fn match_request(&self, method: &str, path: &str) -> Result<RouteMatch> {
        Ok(self.router().match_request(method, path)?)
    }

    /// Generates the URL of a named route.
    pub fn url(&self, name: &str, params: &Params) -> Result<String> {
        Ok(self.router().generate(name, params)?)
    }

    /// Routes a request to its controller action.
    ///
    /// The captured params become the action's named parameters.
    #[instrument(level = "debug", skip(self))]
    pub fn dispatch(&self, method: &str, path: &str) -> Result<Dispatched> {
        let route = self.match_request(method, path)?;
        let app = route
            .app()
            .ok_or(KernelError::IncompleteTarget(roles::APP))?;
        let controller = route
            .controller()
            .ok_or(KernelError::IncompleteTarget(roles::CONTROLLER))?;
        let action = route
            .action()
            .ok_or(KernelError::IncompleteTarget(roles::ACTION))?;

        let handler = self.component(app, ComponentKind::Controller, controller, route.is_ajax)?;
        let params: ValueMap = route
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(v)))
            .collect();
        let output = self.container.invoke_method(&handler, action, &params)?;
        Ok(Dispatched { route, output })
    }

    fn boot_context(&self) -> BootContext<'_> {
        BootContext {
            bootstrap: self.bootstrap.as_ref(),
            router: &self.router,
            container: &self.container,
        }
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("config", &self.config)
            .field("router", &*self.router())
            .field("container", &self.container)
            .field("apps", &self.apps.apps())
            .finish_non_exhaustive()
    }
}

/// The binding name of a component: `app.kind.name`, lowercased.
///
/// ```
/// use oxide_kernel::{component_key, ComponentKind};
///
/// let key = component_key("Blog", ComponentKind::Controller, "Posts");
/// assert_eq!(key, "blog.controller.posts");
/// ```
pub fn component_key(app: &str, kind: ComponentKind, name: &str) -> String {
    format!("{app}.{kind}.{name}").to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use oxide_di::{MethodTable, Param, Service};
    use oxide_router::{RouteDef, RouterError, Target};

    use super::*;

    struct Home;
    impl Service for Home {}

    fn kernel() -> Kernel {
        let config = KernelConfig {
            base_url: "/site".into(),
            routes: vec![
                RouteDef::new("GET", "/")
                    .target(Target::handler("Site", "Home", "Index"))
                    .name("home"),
                RouteDef::new("GET", "/broken").target(Target::new().with("app", "Site")),
            ],
            ..KernelConfig::default()
        };
        let kernel = Kernel::new(config).unwrap();
        let container = kernel.container();
        container.register_class("site.controller.home", |_| Ok(Home));
        container.register_methods(MethodTable::<Home>::new().method(
            "index",
            [Param::with_default("page", 1)],
            |_, args| Ok(Value::from(format!("home page {}", args.int(0)?))),
        ));
        kernel
    }

    #[test]
    fn test_kernel_values_are_bound() {
        let kernel = kernel();
        let container = kernel.container();
        assert_eq!(container.get(BASE_URL_BINDING).unwrap(), Value::from("/site"));
        assert_eq!(container.get(BASE_PATH_BINDING).unwrap(), Value::from("/site"));
        assert_eq!(container.get(AJAX_MARKER_BINDING).unwrap(), Value::from("/ajax"));
    }

    #[test]
    fn test_absolute_base_url_round_trip() {
        let config = KernelConfig {
            base_url: "https://example.com/portal".into(),
            routes: vec![RouteDef::new("GET", "/users/[i:id]").name("user_show")],
            ..KernelConfig::default()
        };
        let kernel = Kernel::new(config).unwrap();

        let matched = kernel.match_request("GET", "/portal/users/7").unwrap();
        assert_eq!(
            kernel.url("user_show", &matched.params).unwrap(),
            "https://example.com/portal/users/7"
        );
    }

    #[test]
    fn test_configured_base_path() {
        let config = KernelConfig {
            base_url: "https://example.com".into(),
            base_path: Some("/mounted".into()),
            routes: vec![RouteDef::new("GET", "/users/[i:id]").name("user_show")],
            ..KernelConfig::default()
        };
        let kernel = Kernel::new(config).unwrap();
        assert!(kernel.match_request("GET", "/mounted/users/7").is_ok());
        assert!(kernel.match_request("GET", "/users/7").is_err());
        let base_path = kernel.container().get(BASE_PATH_BINDING).unwrap();
        assert_eq!(base_path, Value::from("/mounted"));
    }

    #[test]
    fn test_dispatch_under_base_url() {
        let out = kernel().dispatch("GET", "/site/?utm=x").unwrap();
        assert_eq!(out.route.route_name.as_deref(), Some("home"));
        assert_eq!(out.output, Value::from("home page 1"));
    }

    #[test]
    fn test_incomplete_target() {
        let err = kernel().dispatch("GET", "/site/broken").unwrap_err();
        assert!(matches!(err, KernelError::IncompleteTarget("controller")));
    }

    #[test]
    fn test_not_found_is_router_error() {
        let err = kernel().dispatch("POST", "/site/").unwrap_err();
        assert!(matches!(err, KernelError::Router(RouterError::RouteNotFound { .. })));
    }

    #[test]
    fn test_unknown_component() {
        let err = kernel()
            .component("Site", ComponentKind::View, "Missing", false)
            .unwrap_err();
        assert!(matches!(
            err,
            KernelError::Di(oxide_di::DiError::UnknownDescriptor(ref d)) if d == "site.view.missing"
        ));
    }

    #[test]
    fn test_url_includes_base() {
        assert_eq!(kernel().url("home", &Params::new()).unwrap(), "/site/");
    }
}
