//! Client-side navigation guard.
//!
//! The guard holds no authentication state of its own: every call to
//! [`RouteGuard::navigate`] reads the token from the [`KeyValueStore`], so a
//! logout takes effect on the very next navigation.

use tracing::warn;

use crate::session::{KeyValueStore, TOKEN_KEY};

pub const LOGIN_PATH: &str = "/login";

/// Route-level redirects followed before giving up on a path.
const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Segments starting with `:` capture a path parameter.
    pub pattern: String,
    pub requires_auth: bool,
    pub redirect: Option<String>,
}

impl Route {
    pub fn public(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            requires_auth: false,
            redirect: None,
        }
    }

    pub fn protected(pattern: &str) -> Self {
        Self {
            requires_auth: true,
            ..Self::public(pattern)
        }
    }

    pub fn redirect(pattern: &str, to: &str) -> Self {
        Self {
            redirect: Some(to.to_string()),
            ..Self::public(pattern)
        }
    }

    fn capture(&self, path: &str) -> Option<Vec<(String, String)>> {
        let pattern: Vec<&str> = segments(&self.pattern).collect();
        let actual: Vec<&str> = segments(path).collect();
        if pattern.len() != actual.len() {
            return None;
        }
        let mut params = Vec::new();
        for (expected, got) in pattern.iter().zip(&actual) {
            match expected.strip_prefix(':') {
                Some(name) => params.push((name.to_string(), got.to_string())),
                None if expected == got => {}
                None => return None,
            }
        }
        Some(params)
    }
}

/// The route a navigation landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Normalized path actually shown, after route-level redirects.
    pub path: String,
    pub pattern: String,
    pub params: Vec<(String, String)>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed(RouteMatch),
    /// The guard refused the target; go here instead.
    Redirect(String),
    NotFound,
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    routes: Vec<Route>,
}

impl Default for RouteGuard {
    /// The application's route table.
    fn default() -> Self {
        Self::new(vec![
            Route::public(LOGIN_PATH),
            Route::public("/register"),
            Route::protected("/dashboard"),
            Route::protected("/vehicle/:id"),
            Route::redirect("/", "/dashboard"),
        ])
    }
}

impl RouteGuard {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Decide where a navigation to `to` ends up for whoever is signed in
    /// according to `store` right now.
    pub fn navigate(&self, to: &str, store: &impl KeyValueStore) -> Navigation {
        let mut path = normalize(to);
        for _ in 0..=MAX_REDIRECTS {
            let Some((route, params)) = self.resolve(&path) else {
                return Navigation::NotFound;
            };
            if let Some(target) = &route.redirect {
                path = normalize(target);
                continue;
            }
            if route.requires_auth && !is_authenticated(store) {
                return Navigation::Redirect(LOGIN_PATH.to_string());
            }
            return Navigation::Proceed(RouteMatch {
                path,
                pattern: route.pattern.clone(),
                params,
            });
        }
        warn!(path = to, "route redirects do not terminate");
        Navigation::NotFound
    }

    fn resolve(&self, path: &str) -> Option<(&Route, Vec<(String, String)>)> {
        self.routes
            .iter()
            .find_map(|route| route.capture(path).map(|params| (route, params)))
    }
}

fn is_authenticated(store: &impl KeyValueStore) -> bool {
    match store.get(TOKEN_KEY) {
        Ok(token) => token.is_some_and(|t| !t.is_empty()),
        Err(e) => {
            warn!(error = %e, "could not read session token, treating as signed out");
            false
        }
    }
}

/// Drop query string and fragment, collapse repeated and trailing slashes.
fn normalize(path: &str) -> String {
    let end = path.find(|c: char| c == '?' || c == '#').unwrap_or(path.len());
    let joined: Vec<&str> = segments(&path[..end]).collect();
    format!("/{}", joined.join("/"))
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
