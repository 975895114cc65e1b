//! Shared fixtures for kernel integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use oxide_di::{Container, MethodTable, Param, Service, Value};
use oxide_kernel::{AppBootstrap, Kernel, KernelConfig, KernelError, Result, Stage};
use oxide_router::{RouteDef, Router, Target};

/// Counts how often each bootstrap hook ran, per app.
#[derive(Debug, Default)]
pub struct Calls {
    counts: Mutex<HashMap<(String, Stage), usize>>,
}

impl Calls {
    pub fn record(&self, app: &str, stage: Stage) {
        *self
            .counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((app.to_string(), stage))
            .or_default() += 1;
    }

    pub fn count(&self, app: &str, stage: Stage) -> usize {
        self.counts
            .lock()
            .unwrap()
            .get(&(app.to_string(), stage))
            .copied()
            .unwrap_or(0)
    }
}

/// Registers a `posts` route for every app and records each hook call.
pub struct RecordingBootstrap {
    pub calls: Arc<Calls>,
    pub fail_permissions_for: Option<String>,
    /// Fails the next route registration after its route is mapped.
    pub fail_routes_once: AtomicBool,
}

impl RecordingBootstrap {
    pub fn new(calls: Arc<Calls>) -> Self {
        Self {
            calls,
            fail_permissions_for: None,
            fail_routes_once: AtomicBool::new(false),
        }
    }
}

impl AppBootstrap for RecordingBootstrap {
    fn load_config(&self, app: &str, container: &Container) -> Result<()> {
        self.calls.record(app, Stage::Config);
        container.map_value(format!("{}.config.title", app.to_ascii_lowercase()), app);
        Ok(())
    }

    fn resolve_paths(&self, app: &str, _container: &Container) -> Result<()> {
        self.calls.record(app, Stage::Paths);
        Ok(())
    }

    fn register_routes(&self, app: &str, router: &mut Router) -> Result<()> {
        self.calls.record(app, Stage::Routes);
        let prefix = app.to_ascii_lowercase();
        router.map(
            RouteDef::new("GET", format!("/{prefix}/posts/[i:id]"))
                .target(Target::handler(app, "Posts", "Show"))
                .name(format!("{prefix}_post")),
        )?;
        if self.fail_routes_once.swap(false, Ordering::SeqCst) {
            return Err(KernelError::collaborator("route store unavailable"));
        }
        Ok(())
    }

    fn register_permissions(&self, app: &str, _container: &Container) -> Result<()> {
        self.calls.record(app, Stage::Permissions);
        if self.fail_permissions_for.as_deref() == Some(app) {
            return Err(KernelError::collaborator("permission store offline"));
        }
        Ok(())
    }

    fn load_language(&self, app: &str, _container: &Container) -> Result<()> {
        self.calls.record(app, Stage::Language);
        Ok(())
    }

    fn init_css(&self, app: &str, _container: &Container) -> Result<()> {
        self.calls.record(app, Stage::Css);
        Ok(())
    }

    fn init_js(&self, app: &str, _container: &Container) -> Result<()> {
        self.calls.record(app, Stage::Js);
        Ok(())
    }
}

/// A posts controller reading its app's title from the container.
pub struct PostsController {
    pub title: String,
}

impl Service for PostsController {}

/// Registers `PostsController` classes for the given apps.
pub fn register_posts(kernel: &Kernel, apps: &[&str]) {
    let container = kernel.container();
    for app in apps {
        let app_key = app.to_ascii_lowercase();
        let weak = Arc::downgrade(container);
        let title_key = format!("{app_key}.config.title");
        container.register_class(format!("{app_key}.controller.posts"), move |_| {
            let container = weak
                .upgrade()
                .ok_or_else(|| oxide_di::DiError::failed("container dropped"))?;
            let title = container.get(&title_key)?;
            Ok(PostsController {
                title: title.as_str().unwrap_or_default().to_string(),
            })
        });
    }
    container.register_methods(MethodTable::<PostsController>::new().method(
        "show",
        [Param::required("id"), Param::with_default("format", "html")],
        |this, args| {
            Ok(Value::from(format!(
                "{} post {} as {}",
                this.title,
                args.int(0)?,
                args.str(1)?
            )))
        },
    ));
}

/// A kernel with the recording bootstrap and posts controllers for `apps`.
pub fn kernel(apps: &[&str]) -> (Kernel, Arc<Calls>) {
    let calls = Arc::new(Calls::default());
    let kernel = Kernel::new(KernelConfig::default())
        .unwrap()
        .with_bootstrap(RecordingBootstrap::new(Arc::clone(&calls)));
    register_posts(&kernel, apps);
    (kernel, calls)
}
