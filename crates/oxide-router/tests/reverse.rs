//! Tests for reverse routing.

mod common;
use common::*;

use oxide_router::{Params, RouterError};

fn round_trip(pattern: &str, path: &str) {
    let router = router(vec![get("route", pattern)]);
    let m = matched(&router, "GET", path);
    let generated = router
        .generate("route", &m.params)
        .unwrap_or_else(|e| panic!("Failed to generate {pattern}: {e}"));
    assert_eq!(generated, path, "Round-trip failed for pattern {pattern}");
}

#[test]
fn round_trip_required_params() {
    round_trip("/users/[i:id]", "/users/7");
    round_trip("/[a:controller]/[a:action]/[i:id]", "/Posts/Edit/12");
    round_trip("/static/[*:path]", "/static/css/site.css");
}

#[test]
fn round_trip_optional_params() {
    round_trip("/post/[i:id]?", "/post");
    round_trip("/post/[i:id]?", "/post/42");
    round_trip("/files/[:name].[format]?", "/files/report.pdf");
    round_trip("/files/[:name].[format]?", "/files/report");
}

#[test]
fn round_trip_literal_routes() {
    round_trip("/", "/");
    round_trip("/about/team", "/about/team");
}

#[test]
fn missing_required_param() {
    let router = router(vec![get("show", "/users/[i:id]/posts/[i:post]")]);

    let err = router
        .generate("show", &Params::new().with("id", 1))
        .unwrap_err();
    assert!(matches!(err, RouterError::MissingRouteParameter { ref param, .. } if param == "post"));
}

#[test]
fn extra_params_are_ignored() {
    let router = router(vec![get("show", "/users/[i:id]")]);

    let url = router
        .generate("show", &Params::new().with("id", 1).with("tab", "posts"))
        .unwrap();
    assert_eq!(url, "/users/1");
}

#[test]
fn base_url_prefixes_generated_urls() {
    let router = router(vec![get("show", "/users/[i:id]")]).with_base_url("/portal/");

    assert_eq!(
        router.generate("show", &Params::new().with("id", 9)).unwrap(),
        "/portal/users/9"
    );
    let m = matched(&router, "GET", "/portal/users/9");
    assert_eq!(m.params.get("id"), Some("9"));
}
