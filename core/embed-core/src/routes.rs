//! Project-scope route translation between host and guest.
//!
//! The guest's router scopes some routes under `/projects/{id}`; the host's
//! view of "current route" is project-agnostic. Translation is bidirectional:
//! host-requested routes gain the scope segment when they need it, and guest
//! navigations lose it before being mirrored back.
//!
//! Classification is substring containment, not prefix-anchored: a route
//! containing `/flows` anywhere is treated as project-scoped. Stripping
//! removes the first `/projects/{id}` occurrence only.

use once_cell::sync::Lazy;
use regex::Regex;

/// Path fragments whose routes live under a project scope.
pub const PROJECT_SCOPED_SEGMENTS: [&str; 3] = ["/runs", "/flows", "/connections"];

static PROJECT_SCOPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/projects/([^/]+)").unwrap());

/// True when a host-requested route must be prefixed with the project scope.
pub fn requires_project_scope(route: &str) -> bool {
    PROJECT_SCOPED_SEGMENTS
        .iter()
        .any(|segment| route.contains(segment))
}

/// Joins two path fragments with exactly one slash between them.
pub fn combine_paths(first: &str, second: &str) -> String {
    format!(
        "{}/{}",
        first.trim_end_matches('/'),
        second.trim_start_matches('/')
    )
}

/// Translates a host-requested route into the guest navigation target.
pub fn guest_target_for_host_route(vendor_route: &str, project_id: &str) -> String {
    if requires_project_scope(vendor_route) {
        combine_paths(&format!("/projects/{}", project_id), vendor_route)
    } else {
        vendor_route.to_string()
    }
}

/// Removes the first `/projects/{id}` segment from a guest path.
pub fn strip_project_scope(path: &str) -> String {
    PROJECT_SCOPE_RE.replace(path, "").into_owned()
}

/// The project-agnostic route mirrored to the host on guest navigation.
pub fn host_route_for_guest_location(pathname: &str, search: &str) -> String {
    format!("{}{}", strip_project_scope(pathname), search)
}

/// A guest path decomposed into its optional project scope and remainder.
///
/// Splitting and merging round-trip losslessly for the scope-requiring
/// subset of routes, where the scope is the leading segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedRoute {
    pub project_id: Option<String>,
    pub route: String,
}

impl ScopedRoute {
    /// Splits the first `/projects/{id}` segment out of a path.
    pub fn from_path(path: &str) -> Self {
        match PROJECT_SCOPE_RE.captures(path) {
            Some(captures) => {
                let full = captures.get(0).map(|m| m.range()).unwrap_or(0..0);
                let mut route = String::with_capacity(path.len());
                route.push_str(&path[..full.start]);
                route.push_str(&path[full.end..]);
                ScopedRoute {
                    project_id: captures.get(1).map(|m| m.as_str().to_string()),
                    route,
                }
            }
            None => ScopedRoute {
                project_id: None,
                route: path.to_string(),
            },
        }
    }

    /// Re-inserts the project scope in front of the route.
    pub fn to_path(&self) -> String {
        match &self.project_id {
            Some(id) => combine_paths(&format!("/projects/{}", id), &self.route),
            None => self.route.clone(),
        }
    }
}
