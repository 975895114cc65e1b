#![allow(dead_code)]

use oxide_router::{RouteDef, RouteMatch, Router, Target};

pub fn router(defs: Vec<RouteDef>) -> Router {
    let mut router = Router::new();
    router
        .add_routes(defs)
        .unwrap_or_else(|e| panic!("Failed to register routes: {e}"));
    router
}

pub fn get(name: &str, pattern: &str) -> RouteDef {
    RouteDef::new("GET", pattern)
        .target(Target::new().with("app", "Test").with("controller", name))
        .name(name)
}

pub fn matched(router: &Router, method: &str, path: &str) -> RouteMatch {
    router
        .match_request(method, path)
        .unwrap_or_else(|e| panic!("Expected a match for {method} {path}, got {e}"))
}

pub fn no_match(router: &Router, method: &str, path: &str) {
    if let Ok(m) = router.match_request(method, path) {
        panic!("Expected no match for {method} {path}, got {m:?}");
    }
}
