//! # oxide-router
//!
//! Pattern-based URL routing with reverse URL generation.
//!
//! This crate provides:
//! - A pattern compiler for typed, optional placeholders
//! - HTTP method-based routing, first registered match wins
//! - Route groups with prefixes
//! - Named routes for reverse URL lookup, guarded by an access predicate
//!
//! ## Quick Start
//!
//! ```
//! use oxide_router::{Params, RouteDef, Router, Target};
//!
//! let mut router = Router::new().with_base_url("https://example.com");
//! router.map(RouteDef::new("GET", "/").target(Target::handler("Home", "Index", "Show")))?;
//! router.map(
//!     RouteDef::new("GET", "/users/[i:id]")
//!         .target(Target::handler("Users", "Profile", "Show"))
//!         .name("user_show"),
//! )?;
//!
//! let matched = router.match_request("GET", "/users/7")?;
//! assert_eq!(matched.params.get("id"), Some("7"));
//!
//! let url = router.generate("user_show", &Params::new().with("id", 7))?;
//! assert_eq!(url, "https://example.com/users/7");
//! # Ok::<(), oxide_router::RouterError>(())
//! ```
//!
//! ## Placeholders
//!
//! | Syntax          | Matches                              |
//! |-----------------|--------------------------------------|
//! | `[i:id]`        | digits                               |
//! | `[a:slug]`      | ASCII letters and digits             |
//! | `[h:hash]`      | hex digits                           |
//! | `[*:path]`      | anything, including `/`              |
//! | `[name]`        | anything but `/` and `.`             |
//! | `/[i:id]?`      | optional, together with the `/`      |
//!
//! `*` matches every path and `@<regex>` uses a raw regex.
//!
//! ## Route Groups
//!
//! ```
//! use oxide_router::{RouteGroup, Router, Target};
//!
//! let api = RouteGroup::new("/api/v1")
//!     .get("/users", Target::handler("Api", "Users", "List"))
//!     .get("/users/[i:id]", Target::handler("Api", "Users", "Show"))
//!     .post("/users", Target::handler("Api", "Users", "Create"));
//!
//! let mut router = Router::new();
//! router.group(api)?;
//! assert_eq!(router.len(), 3);
//! # Ok::<(), oxide_router::RouterError>(())
//! ```

mod access;
mod error;
mod method;
mod params;
mod pattern;
mod router;

pub use access::{AccessCheck, GrantedPermissions};
pub use error::{Result, RouterError};
pub use method::{Method, MethodSet};
pub use params::{Params, Target, roles};
pub use pattern::{CompiledPattern, MatchTypes};
pub use router::{AJAX_MARKER, Route, RouteDef, RouteGroup, RouteMatch, Router};
