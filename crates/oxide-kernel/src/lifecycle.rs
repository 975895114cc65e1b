//! Per-application bootstrap.
//!
//! Each application is initialized once, the first time one of its
//! components is requested. Progress is tracked per app name in
//! [`AppStates`]; a stage that fails stays pending and is retried on the
//! next request.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use oxide_di::Container;
use oxide_router::Router;
use tracing::{info, trace};

use crate::error::{KernelError, Result};

/// A single bootstrap stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// App configuration.
    Config,
    /// Filesystem and URL paths.
    Paths,
    /// Route registration.
    Routes,
    /// Permission registration.
    Permissions,
    /// Translations.
    Language,
    /// Stylesheets.
    Css,
    /// Scripts.
    Js,
}

impl Stage {
    /// Stages run before the first component of an app is built, in order.
    pub const BOOT: [Self; 5] = [
        Self::Config,
        Self::Paths,
        Self::Routes,
        Self::Permissions,
        Self::Language,
    ];

    /// Asset stages, run for the first non-ajax component only.
    pub const ASSETS: [Self; 2] = [Self::Css, Self::Js];

    /// Returns the stage name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Paths => "paths",
            Self::Routes => "routes",
            Self::Permissions => "permissions",
            Self::Language => "language",
            Self::Css => "css",
            Self::Js => "js",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse position of an app in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AppStage {
    /// Nothing has run yet.
    Uninitialized,
    /// Configuration is loaded.
    ConfigLoaded,
    /// Paths are resolved; registrations are pending.
    PathsResolved,
    /// Routes, permissions and language are all registered.
    Ready,
}

/// Initialization flags for one application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppInitState {
    /// Application name.
    pub app_name: String,
    /// Configuration loaded.
    pub config: bool,
    /// Paths resolved.
    pub paths: bool,
    /// Routes registered.
    pub routes: bool,
    /// Permissions registered.
    pub permissions: bool,
    /// Translations loaded.
    pub language: bool,
    /// Stylesheets initialized.
    pub css: bool,
    /// Scripts initialized.
    pub js: bool,
}

impl AppInitState {
    /// Creates the state of an app nothing has run for yet.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            ..Self::default()
        }
    }

    /// True if `stage` has completed.
    pub const fn is_done(&self, stage: Stage) -> bool {
        match stage {
            Stage::Config => self.config,
            Stage::Paths => self.paths,
            Stage::Routes => self.routes,
            Stage::Permissions => self.permissions,
            Stage::Language => self.language,
            Stage::Css => self.css,
            Stage::Js => self.js,
        }
    }

    /// Records `stage` as completed.
    pub fn mark(&mut self, stage: Stage) {
        let flag = match stage {
            Stage::Config => &mut self.config,
            Stage::Paths => &mut self.paths,
            Stage::Routes => &mut self.routes,
            Stage::Permissions => &mut self.permissions,
            Stage::Language => &mut self.language,
            Stage::Css => &mut self.css,
            Stage::Js => &mut self.js,
        };
        *flag = true;
    }

    /// Returns the lifecycle position implied by the flags.
    pub fn stage(&self) -> AppStage {
        if self.is_ready() {
            AppStage::Ready
        } else if self.config && self.paths {
            AppStage::PathsResolved
        } else if self.config {
            AppStage::ConfigLoaded
        } else {
            AppStage::Uninitialized
        }
    }

    /// True once every boot stage has completed.
    pub fn is_ready(&self) -> bool {
        Stage::BOOT.iter().all(|&stage| self.is_done(stage))
    }

    /// True once css and js are initialized.
    pub fn assets_ready(&self) -> bool {
        Stage::ASSETS.iter().all(|&stage| self.is_done(stage))
    }
}

/// Application-specific registration hooks.
///
/// Every hook defaults to doing nothing, so implementors override only the
/// stages their apps need.
///
/// ```
/// use oxide_kernel::{AppBootstrap, Result};
/// use oxide_router::{RouteDef, Router, Target};
///
/// struct Blog;
///
/// impl AppBootstrap for Blog {
///     fn register_routes(&self, app: &str, router: &mut Router) -> Result<()> {
///         router.map(
///             RouteDef::new("GET", "/blog")
///                 .target(Target::handler(app, "Posts", "Index"))
///                 .name("blog_index"),
///         )?;
///         Ok(())
///     }
/// }
/// ```
pub trait AppBootstrap: Send + Sync {
    /// Loads the app's configuration.
    fn load_config(&self, _app: &str, _container: &Container) -> Result<()> {
        Ok(())
    }

    /// Resolves the app's filesystem and URL paths.
    fn resolve_paths(&self, _app: &str, _container: &Container) -> Result<()> {
        Ok(())
    }

    /// Adds the app's routes to the shared table.
    ///
    /// If this returns an error, every route it added is removed again.
    fn register_routes(&self, _app: &str, _router: &mut Router) -> Result<()> {
        Ok(())
    }

    /// Registers the permissions the app's routes refer to.
    fn register_permissions(&self, _app: &str, _container: &Container) -> Result<()> {
        Ok(())
    }

    /// Loads the app's translations.
    fn load_language(&self, _app: &str, _container: &Container) -> Result<()> {
        Ok(())
    }

    /// Registers the app's stylesheets.
    fn init_css(&self, _app: &str, _container: &Container) -> Result<()> {
        Ok(())
    }

    /// Registers the app's scripts.
    fn init_js(&self, _app: &str, _container: &Container) -> Result<()> {
        Ok(())
    }
}

/// A bootstrap that registers nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBootstrap;

impl AppBootstrap for NoBootstrap {}

/// What a stage runs against.
#[derive(Clone, Copy)]
pub struct BootContext<'a> {
    /// Registration hooks.
    pub bootstrap: &'a dyn AppBootstrap,
    /// Shared route table.
    pub router: &'a RwLock<Router>,
    /// Shared service container.
    pub container: &'a Container,
}

impl BootContext<'_> {
    fn run(&self, app: &str, stage: Stage) -> Result<()> {
        let hooks = self.bootstrap;
        match stage {
            Stage::Config => hooks.load_config(app, self.container),
            Stage::Paths => hooks.resolve_paths(app, self.container),
            Stage::Routes => {
                let mut router = self.router.write().unwrap_or_else(PoisonError::into_inner);
                let checkpoint = router.len();
                let result = hooks.register_routes(app, &mut router);
                if result.is_err() {
                    router.truncate(checkpoint);
                }
                result
            }
            Stage::Permissions => hooks.register_permissions(app, self.container),
            Stage::Language => hooks.load_language(app, self.container),
            Stage::Css => hooks.init_css(app, self.container),
            Stage::Js => hooks.init_js(app, self.container),
        }
    }
}

/// Initialization state of every app seen so far, keyed by name.
#[derive(Debug, Default)]
pub struct AppStates {
    states: Mutex<HashMap<String, AppInitState>>,
}

impl AppStates {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of an app's state.
    pub fn get(&self, app: &str) -> Option<AppInitState> {
        self.lock().get(app).cloned()
    }

    /// Returns the names of all known apps, sorted.
    pub fn apps(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Runs the pending boot stages of `app`.
    ///
    /// The registry stays locked while stages run, so concurrent callers
    /// never run a stage twice.
    pub fn boot(&self, app: &str, ctx: BootContext<'_>) -> Result<()> {
        let mut states = self.lock();
        let state = states
            .entry(app.to_string())
            .or_insert_with(|| AppInitState::new(app));
        if state.is_ready() {
            trace!(app, "already booted");
            return Ok(());
        }
        run_stages(state, &Stage::BOOT, ctx)
    }

    /// Initializes css and js for `app` unless the request is ajax.
    pub fn init_assets(&self, app: &str, is_ajax: bool, ctx: BootContext<'_>) -> Result<()> {
        if is_ajax {
            trace!(app, "ajax request, assets skipped");
            return Ok(());
        }
        let mut states = self.lock();
        let state = states
            .entry(app.to_string())
            .or_insert_with(|| AppInitState::new(app));
        if state.assets_ready() {
            return Ok(());
        }
        run_stages(state, &Stage::ASSETS, ctx)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, AppInitState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn run_stages(state: &mut AppInitState, stages: &[Stage], ctx: BootContext<'_>) -> Result<()> {
    for &stage in stages {
        if state.is_done(stage) {
            continue;
        }
        ctx.run(&state.app_name, stage)
            .map_err(|source| KernelError::Bootstrap {
                app: state.app_name.clone(),
                stage,
                source: Box::new(source),
            })?;
        state.mark(stage);
        info!(app = %state.app_name, %stage, "bootstrap stage complete");
    }
    Ok(())
}
