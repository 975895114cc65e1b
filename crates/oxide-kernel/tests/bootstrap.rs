mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use oxide_kernel::{AppStage, ComponentKind, Kernel, KernelConfig, KernelError, Stage};

use common::{kernel, register_posts, Calls, PostsController, RecordingBootstrap};

#[test]
fn test_blog_boots_once_for_two_components() {
    let (kernel, calls) = kernel(&["Blog"]);

    let first = kernel
        .component("Blog", ComponentKind::Controller, "Posts", false)
        .unwrap();
    let second = kernel
        .component("Blog", ComponentKind::Controller, "Posts", false)
        .unwrap();
    assert!(first.is::<PostsController>());
    assert!(!first.ptr_eq(&second));

    for stage in Stage::BOOT {
        assert_eq!(calls.count("Blog", stage), 1, "{stage} ran more than once");
    }
    assert_eq!(kernel.apps().get("Blog").unwrap().stage(), AppStage::Ready);
    assert_eq!(kernel.router().len(), 1);
}

#[test]
fn test_apps_are_booted_independently() {
    let (kernel, calls) = kernel(&["Blog", "Shop"]);

    kernel
        .component("Blog", ComponentKind::Controller, "posts", false)
        .unwrap();
    assert_eq!(calls.count("Shop", Stage::Config), 0);

    kernel
        .component("Shop", ComponentKind::Controller, "posts", false)
        .unwrap();
    assert_eq!(calls.count("Shop", Stage::Routes), 1);
    assert_eq!(calls.count("Blog", Stage::Routes), 1);
    assert_eq!(kernel.apps().apps(), ["Blog", "Shop"]);
    assert!(kernel.router().route("shop_post").is_some());
}

#[test]
fn test_ajax_requests_skip_assets() {
    let (kernel, calls) = kernel(&["Blog"]);

    kernel
        .component("Blog", ComponentKind::Controller, "Posts", true)
        .unwrap();
    assert_eq!(calls.count("Blog", Stage::Css), 0);
    assert_eq!(calls.count("Blog", Stage::Js), 0);

    kernel
        .component("Blog", ComponentKind::Controller, "Posts", false)
        .unwrap();
    kernel
        .component("Blog", ComponentKind::Controller, "Posts", false)
        .unwrap();
    assert_eq!(calls.count("Blog", Stage::Css), 1);
    assert_eq!(calls.count("Blog", Stage::Js), 1);
    assert!(kernel.apps().get("Blog").unwrap().assets_ready());
}

#[test]
fn test_failed_registration_aborts_and_retries() {
    let calls = Arc::new(Calls::default());
    let mut bootstrap = RecordingBootstrap::new(Arc::clone(&calls));
    bootstrap.fail_permissions_for = Some("Blog".to_string());
    let kernel = Kernel::new(KernelConfig::default())
        .unwrap()
        .with_bootstrap(bootstrap);
    register_posts(&kernel, &["Blog"]);

    for attempt in 1..=2 {
        let err = kernel
            .component("Blog", ComponentKind::Controller, "Posts", false)
            .unwrap_err();
        assert!(matches!(
            err,
            KernelError::Bootstrap { stage: Stage::Permissions, ref source, .. }
                if matches!(**source, KernelError::Collaborator(_))
        ));
        assert_eq!(calls.count("Blog", Stage::Permissions), attempt);
    }

    // Stages before the failure are not repeated.
    assert_eq!(calls.count("Blog", Stage::Routes), 1);
    assert_eq!(calls.count("Blog", Stage::Language), 0);
    let state = kernel.apps().get("Blog").unwrap();
    assert!(state.routes && !state.permissions);
    assert_eq!(state.stage(), AppStage::PathsResolved);
}

#[test]
fn test_failed_route_registration_is_rolled_back() {
    let calls = Arc::new(Calls::default());
    let bootstrap = RecordingBootstrap::new(Arc::clone(&calls));
    bootstrap.fail_routes_once.store(true, Ordering::SeqCst);
    let kernel = Kernel::new(KernelConfig::default())
        .unwrap()
        .with_bootstrap(bootstrap);
    register_posts(&kernel, &["Blog"]);

    let err = kernel.boot("Blog").unwrap_err();
    assert!(matches!(err, KernelError::Bootstrap { stage: Stage::Routes, .. }));
    assert!(kernel.router().is_empty());
    assert!(kernel.router().route("blog_post").is_none());
    assert!(!kernel.apps().get("Blog").unwrap().routes);

    kernel.boot("Blog").unwrap();
    assert_eq!(calls.count("Blog", Stage::Routes), 2);
    assert_eq!(kernel.router().len(), 1);
    assert!(kernel.router().route("blog_post").is_some());
    assert!(kernel.apps().get("Blog").unwrap().is_ready());
}

#[test]
fn test_config_stage_feeds_components() {
    let (kernel, _) = kernel(&["Blog"]);
    let controller = kernel
        .component("Blog", ComponentKind::Controller, "Posts", false)
        .unwrap();
    assert_eq!(controller.downcast_ref::<PostsController>().unwrap().title, "Blog");
}
