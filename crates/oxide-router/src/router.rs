//! Route table, matcher and URL generator.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::access::AccessCheck;
use crate::error::{Result, RouterError};
use crate::method::{Method, MethodSet};
use crate::params::{Params, Target};
use crate::pattern::{CompiledPattern, MatchTypes};

/// Path suffix marking an asynchronous request.
pub const AJAX_MARKER: &str = "/ajax";

/// A route declaration, as written in route files.
///
/// ```
/// use oxide_router::RouteDef;
///
/// let def: RouteDef = serde_json::from_str(r#"{
///     "method": "GET|POST",
///     "route": "/users/[i:id]",
///     "target": {"app": "Users", "controller": "Profile", "action": "Show"},
///     "name": "user_show"
/// }"#).unwrap();
/// assert_eq!(def.name.as_deref(), Some("user_show"));
/// assert!(def.access.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDef {
    /// Pipe-joined method list, e.g. `GET|POST`.
    pub method: String,
    /// Route pattern.
    pub route: String,
    /// Dispatch target roles.
    #[serde(default)]
    pub target: Target,
    /// Optional route name for reverse URL lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Permissions required to generate URLs for this route.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access: Vec<String>,
}

impl RouteDef {
    /// Creates a new route declaration.
    pub fn new(method: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            route: route.into(),
            target: Target::new(),
            name: None,
            access: Vec::new(),
        }
    }

    /// Sets the dispatch target.
    #[must_use]
    pub fn target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Sets the route name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the required permissions.
    #[must_use]
    pub fn access<I, S>(mut self, access: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.access = access.into_iter().map(Into::into).collect();
        self
    }
}

/// A single registered route.
#[derive(Debug, Clone)]
pub struct Route {
    /// Optional route name for reverse URL lookup.
    pub name: Option<String>,
    /// HTTP methods.
    pub methods: MethodSet,
    /// Compiled path pattern.
    pub pattern: CompiledPattern,
    /// Dispatch target.
    pub target: Target,
    /// Required permissions.
    pub access: Vec<String>,
}

/// The first route that matched a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Route target with missing roles filled in from `params`.
    pub target: Target,
    /// Named captures.
    pub params: Params,
    /// Name of the matched route.
    pub route_name: Option<String>,
    /// True if the request path carried the ajax marker.
    pub is_ajax: bool,
}

impl RouteMatch {
    /// The `app` role.
    pub fn app(&self) -> Option<&str> {
        self.target.app()
    }

    /// The `controller` role.
    pub fn controller(&self) -> Option<&str> {
        self.target.controller()
    }

    /// The `action` role.
    pub fn action(&self) -> Option<&str> {
        self.target.action()
    }

    /// Looks a key up in the target first, then in the params.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.target.get(key).or_else(|| self.params.get(key))
    }
}

/// A group of routes with a common prefix.
pub struct RouteGroup {
    /// URL prefix for all routes in this group.
    prefix: String,
    /// Permissions added to every route in this group.
    access: Vec<String>,
    /// Routes in this group.
    routes: Vec<RouteDef>,
}

impl RouteGroup {
    /// Creates a new route group with the given prefix.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
            access: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Adds a route declaration, prefixing its pattern.
    #[must_use]
    pub fn route(mut self, mut def: RouteDef) -> Self {
        def.route = format!("{}{}", self.prefix, def.route);
        self.routes.push(def);
        self
    }

    /// Adds a GET route.
    #[must_use]
    pub fn get(self, path: &str, target: Target) -> Self {
        self.route(RouteDef::new(Method::Get.as_str(), path).target(target))
    }

    /// Adds a POST route.
    #[must_use]
    pub fn post(self, path: &str, target: Target) -> Self {
        self.route(RouteDef::new(Method::Post.as_str(), path).target(target))
    }

    /// Adds a PUT route.
    #[must_use]
    pub fn put(self, path: &str, target: Target) -> Self {
        self.route(RouteDef::new(Method::Put.as_str(), path).target(target))
    }

    /// Adds a DELETE route.
    #[must_use]
    pub fn delete(self, path: &str, target: Target) -> Self {
        self.route(RouteDef::new(Method::Delete.as_str(), path).target(target))
    }

    /// Requires `access` on every route of the group.
    #[must_use]
    pub fn access<I, S>(mut self, access: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.access.extend(access.into_iter().map(Into::into));
        self
    }

    /// Returns the route declarations in this group.
    pub fn into_routes(self) -> Vec<RouteDef> {
        let access = self.access;
        self.routes
            .into_iter()
            .map(|mut def| {
                for perm in &access {
                    if !def.access.contains(perm) {
                        def.access.push(perm.clone());
                    }
                }
                def
            })
            .collect()
    }
}

/// The route table.
///
/// Routes are matched in registration order and the first match wins,
/// even when a later route is more specific.
pub struct Router {
    /// Registered routes.
    routes: Vec<Route>,
    /// Named routes for reverse URL lookup.
    named_routes: HashMap<String, usize>,
    /// Placeholder types available to patterns.
    match_types: MatchTypes,
    /// Prefix of generated URLs, possibly absolute.
    base_url: String,
    /// Path prefix stripped before matching.
    base_path: String,
    /// Path suffix marking asynchronous requests.
    ajax_marker: String,
    /// Access predicate for protected routes.
    access_check: Option<Arc<dyn AccessCheck>>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.len())
            .field("base_url", &self.base_url)
            .field("base_path", &self.base_path)
            .field("ajax_marker", &self.ajax_marker)
            .field("access_check", &self.access_check.is_some())
            .finish()
    }
}

impl Router {
    /// Creates a new empty router.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            named_routes: HashMap::new(),
            match_types: MatchTypes::default(),
            base_url: String::new(),
            base_path: String::new(),
            ajax_marker: AJAX_MARKER.to_string(),
            access_check: None,
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.set_base_url(base_url);
        self
    }

    /// Sets the base URL. A trailing `/` is dropped.
    ///
    /// Also resets the base path to the path part of the URL, so
    /// `https://example.com/portal` strips `/portal` from request paths.
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self.base_path = path_part(&self.base_url).to_string();
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sets the path prefix stripped before matching. A trailing `/` is
    /// dropped.
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.set_base_path(base_path);
        self
    }

    /// Sets the path prefix stripped before matching, overriding the one
    /// taken from the base URL.
    pub fn set_base_path(&mut self, base_path: impl Into<String>) {
        self.base_path = base_path.into().trim_end_matches('/').to_string();
    }

    /// Returns the path prefix stripped before matching.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Sets the suffix that marks asynchronous requests.
    pub fn set_ajax_marker(&mut self, marker: impl Into<String>) {
        self.ajax_marker = marker.into();
    }

    /// Installs the access predicate.
    #[must_use]
    pub fn with_access_check(mut self, check: impl AccessCheck + 'static) -> Self {
        self.set_access_check(Arc::new(check));
        self
    }

    /// Installs a shared access predicate.
    pub fn set_access_check(&mut self, check: Arc<dyn AccessCheck>) {
        self.access_check = Some(check);
    }

    /// Adds a placeholder type for routes registered afterwards.
    pub fn add_match_type(&mut self, kind: impl Into<String>, fragment: impl Into<String>) {
        self.match_types.insert(kind, fragment);
    }

    /// Registers a route.
    ///
    /// Fails on an unknown method, a malformed pattern, or a name that is
    /// already taken.
    pub fn map(&mut self, def: RouteDef) -> Result<()> {
        let methods = MethodSet::parse(&def.method)?;

        if let Some(name) = &def.name {
            if self.named_routes.contains_key(name) {
                return Err(RouterError::DuplicateRouteName(name.clone()));
            }
        }

        let pattern = CompiledPattern::compile(&def.route, &self.match_types)?;
        debug!(
            methods = %methods,
            route = %def.route,
            name = ?def.name,
            "route registered"
        );

        if let Some(name) = &def.name {
            self.named_routes.insert(name.clone(), self.routes.len());
        }
        self.routes.push(Route {
            name: def.name,
            methods,
            pattern,
            target: def.target,
            access: def.access,
        });
        Ok(())
    }

    /// Registers a route from its parts.
    pub fn map_route(
        &mut self,
        method: &str,
        route: &str,
        target: Target,
        name: Option<&str>,
    ) -> Result<()> {
        let mut def = RouteDef::new(method, route).target(target);
        def.name = name.map(String::from);
        self.map(def)
    }

    /// Registers several routes, stopping at the first error.
    pub fn add_routes<I>(&mut self, defs: I) -> Result<()>
    where
        I: IntoIterator<Item = RouteDef>,
    {
        defs.into_iter().try_for_each(|def| self.map(def))
    }

    /// Registers a route group.
    pub fn group(&mut self, group: RouteGroup) -> Result<()> {
        self.add_routes(group.into_routes())
    }

    /// Returns the registered routes in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Looks up a named route.
    pub fn route(&self, name: &str) -> Option<&Route> {
        self.named_routes.get(name).map(|&i| &self.routes[i])
    }

    /// Drops every route registered after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.routes.len() {
            return;
        }
        debug!(removed = self.routes.len() - len, "routes rolled back");
        self.routes.truncate(len);
        self.named_routes.retain(|_, &mut index| index < len);
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Matches a request against the table.
    ///
    /// # Example
    ///
    /// ```
    /// use oxide_router::{RouteDef, Router, Target};
    ///
    /// let mut router = Router::new();
    /// let target = Target::handler("Users", "Profile", "Show");
    /// router.map(RouteDef::new("GET", "/users/[i:id]").target(target)).unwrap();
    ///
    /// let matched = router.match_request("get", "/users/7/ajax").unwrap();
    /// assert_eq!(matched.controller(), Some("Profile"));
    /// assert_eq!(matched.params.get("id"), Some("7"));
    /// assert!(matched.is_ajax);
    /// ```
    pub fn match_request(&self, method: &str, path: &str) -> Result<RouteMatch> {
        let not_found = || RouterError::RouteNotFound {
            method: method.to_string(),
            path: path.to_string(),
        };
        let method = Method::parse(method).ok_or_else(not_found)?;
        let (path_only, is_ajax) = self.normalize(path);

        for route in &self.routes {
            if !route.methods.contains(method) {
                continue;
            }
            if let Some(params) = route.pattern.match_path(path_only) {
                trace!(route = %route.pattern.raw(), path = %path_only, "route matched");
                return Ok(RouteMatch {
                    target: route.target.merged_with(&params),
                    params,
                    route_name: route.name.clone(),
                    is_ajax,
                });
            }
        }

        Err(not_found())
    }

    /// Generates a URL for a named route.
    ///
    /// Protected routes are checked against the access predicate first;
    /// without one, protected routes are denied.
    pub fn generate(&self, name: &str, params: &Params) -> Result<String> {
        let route = self
            .route(name)
            .ok_or_else(|| RouterError::UnknownRoute(name.to_string()))?;

        if !route.access.is_empty() {
            let allowed = self
                .access_check
                .as_ref()
                .is_some_and(|check| check.is_allowed(&route.access));
            if !allowed {
                warn!(route = %name, access = ?route.access, "url generation denied");
                return Err(RouterError::AccessDenied(name.to_string()));
            }
        }

        let path = route.pattern.reverse(name, params)?;
        Ok(format!("{}{}", self.base_url, path))
    }

    /// Strips the query string, base path and ajax marker from a path.
    fn normalize<'p>(&self, path: &'p str) -> (&'p str, bool) {
        let mut path = path.split_once('?').map_or(path, |(p, _)| p);

        if !self.base_path.is_empty() {
            if let Some(rest) = path.strip_prefix(self.base_path.as_str()) {
                if rest.is_empty() || rest.starts_with('/') {
                    path = rest;
                }
            }
        }

        let mut is_ajax = false;
        if !self.ajax_marker.is_empty() {
            if let Some(rest) = path.strip_suffix(self.ajax_marker.as_str()) {
                is_ajax = true;
                path = rest;
            }
        }

        if path.is_empty() {
            path = "/";
        }
        (path, is_ajax)
    }
}

/// The path of a URL: everything from the first `/` after the authority.
fn path_part(url: &str) -> &str {
    match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |i| &rest[i..]),
        None => url,
    }
}
