//! Prefix Route - compiles route patterns into a compressed prefix tree
//!
//! This library turns a flat set of route patterns into a layered matching
//! structure so that resolving a path costs time proportional to the path,
//! not to the number of routes:
//! - Literal routes resolve with one map lookup
//! - Literal prefixes shared by several routes are merged at their divergence point
//! - Parameter segments become regex branches, collapsed to a terminal when unambiguous
//! - Ambiguous route sets (duplicates) are rejected when compiling
//! - LRU caching for repeated lookups
//!
//! # Example
//!
//! ```rust
//! use prefix_route::{Router, RouterOptions};
//!
//! let routes = [
//!     ("/users", "list_users"),
//!     ("/users/{id:\\d+}", "show_user"),
//!     ("/users/{id:\\d+}/posts/{post}", "show_post"),
//!     ("/static/:file", "static_file"),
//! ];
//!
//! // Compile routes
//! let router = Router::new(routes, RouterOptions::default()).unwrap();
//!
//! // Match paths
//! let result = router.match_path("/users/42/posts/hello").unwrap();
//! assert_eq!(result.payload, "show_post");
//! assert_eq!(result.params["id"], "42");
//! assert_eq!(result.params["post"], "hello");
//!
//! assert!(router.match_path("/users/abc").is_none());
//! ```
//!
//! # Pattern Syntax
//!
//! | Syntax | Example | Description |
//! |--------|---------|-------------|
//! | Literal | `/users` | Matched exactly |
//! | Parameter | `{id}` | One path component (`[^/]+`) |
//! | Constrained | `{id:\d+}` | Matches the given regex |
//! | Shorthand | `:id` | Same as `{id}` |
//! | Escape | `\{`, `\}`, `\:` | Literal brace or colon |
//!
//! # Compiled Tree
//!
//! Each [`PrefixMap`] node holds three mappings, consulted in order:
//!
//! - `literals` - remaining input equal to the key ends the match
//! - `prefixes` - remaining input starting with the key continues in a child node
//! - `regexps` - a parameter regex matching at the start, leading to a
//!   child node or directly to a payload ([`BranchResult`])

pub mod compile;
pub mod error;
pub mod matcher;
pub mod parser;
pub mod router;
pub mod types;

// Re-export commonly used items
pub use compile::{compile, group_by_common_prefix, BranchResult, PrefixMap};
pub use error::{Result, RouteError};
pub use matcher::PrefixMatcher;
pub use parser::parse_pattern;
pub use router::{Router, RouterOptions, DEFAULT_CACHE_SIZE};
pub use types::{MatchResult, Parameter, RouteMatch, Segment, DEFAULT_PARAMETER_REGEX};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_full_workflow() {
        let mut routes = HashMap::new();
        routes.insert("/users".to_string(), "A");
        routes.insert("/user/:id".to_string(), "B");
        routes.insert("/use".to_string(), "C");

        // Compile routes
        let map = PrefixMap::from_flat_map(routes.clone()).unwrap();
        assert_eq!(map.route_count(), 3);

        // Pure literals are terminals at the root
        assert_eq!(map.literals().get("/users"), Some(&"A"));
        assert_eq!(map.literals().get("/use"), Some(&"C"));

        // "/user/" continues into a parameter branch
        let user = &map.prefixes()["/user/"];
        assert_eq!(
            user.regexps()["(?P<id>[^/]+)"],
            BranchResult::Terminal("B")
        );

        // Resolve through the router
        let router = Router::from_flat_map(routes, RouterOptions::default()).unwrap();
        assert_eq!(router.match_path("/users").unwrap().payload, "A");
        assert_eq!(router.match_path("/use").unwrap().payload, "C");
        let result = router.match_path("/user/7").unwrap();
        assert_eq!(result.payload, "B");
        assert_eq!(result.params["id"], "7");
        assert!(router.match_path("/user").is_none());
    }
}
