//! Surface detection: the "is this a REST request" and "is this the admin UI"
//! signals the lockdown consumes as given.

use url::form_urlencoded;

/// Signals the application front controller would raise for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceSignals {
    /// Request targets the JSON API namespace.
    pub api: bool,
    /// Request is routed to an admin-UI handler.
    pub admin: bool,
}

impl SurfaceSignals {
    pub fn label(self) -> &'static str {
        if self.api {
            "api"
        } else if self.admin {
            "admin"
        } else {
            "frontend"
        }
    }
}

/// Derives [`SurfaceSignals`] from the request line.
#[derive(Debug, Clone)]
pub struct SurfaceDetector {
    api_root: String,
    admin_prefix: String,
}

impl SurfaceDetector {
    pub fn new(api_root: impl Into<String>, admin_prefix: impl Into<String>) -> Self {
        Self {
            api_root: api_root.into(),
            admin_prefix: admin_prefix.into(),
        }
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    pub fn admin_prefix(&self) -> &str {
        &self.admin_prefix
    }

    pub fn detect(&self, path: &str, query: Option<&str>) -> SurfaceSignals {
        let bare_root = self.api_root.trim_end_matches('/');
        let api = path.starts_with(&self.api_root)
            || path == bare_root
            || query.is_some_and(has_rest_route);

        SurfaceSignals {
            api,
            admin: path.starts_with(&self.admin_prefix),
        }
    }
}

impl Default for SurfaceDetector {
    fn default() -> Self {
        Self::new("/wp-json/", "/wp-admin/")
    }
}

/// `?rest_route=` addresses the API without pretty permalinks.
pub(crate) fn has_rest_route(query: &str) -> bool {
    form_urlencoded::parse(query.as_bytes()).any(|(key, _)| key == "rest_route")
}
