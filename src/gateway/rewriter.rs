//! Response host rewriting.
//!
//! The upstream builds REST URLs from its configured admin origin. API
//! clients must see the host they actually called, so every self-referential
//! API URL leaving the gateway is rebuilt from the request context.

use serde_json::Value;
use url::Url;

use crate::gateway::context::{CanonicalOrigin, RequestContext};
use crate::gateway::surface::has_rest_route;

#[derive(Debug, Clone)]
pub struct ResponseHostRewriter {
    api_root: String,
    /// Origins whose API URLs count as self-referential.
    self_origins: Vec<CanonicalOrigin>,
}

impl ResponseHostRewriter {
    pub fn new(api_root: impl Into<String>, self_origins: Vec<CanonicalOrigin>) -> Self {
        Self {
            api_root: api_root.into(),
            self_origins,
        }
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Rebuild `url` on the inbound scheme and host.
    ///
    /// Everything after the first API-root marker in the path is kept, along
    /// with the query. A URL without the marker collapses to the API base.
    /// Without an observed host the URL is returned untouched.
    pub fn rewrite_url(&self, url: &str, ctx: &RequestContext) -> String {
        let Some(host) = ctx.host.as_deref() else {
            return url.to_string();
        };

        let origin = format!("{}://{}", ctx.url_scheme(), host);
        let base = format!("{}{}", origin.trim_end_matches('/'), self.api_root);

        let (path, query) = split_path_query(url);
        match path.find(&self.api_root) {
            Some(at) => {
                let rest = &path[at + self.api_root.len()..];
                match query {
                    Some(q) => format!("{}{}?{}", base, rest, q),
                    None => format!("{}{}", base, rest),
                }
            }
            None => base,
        }
    }

    /// Absolute URL on one of the self origins, inside the API namespace
    /// (under the API root, or addressed with `?rest_route=`).
    pub fn is_self_api_url(&self, candidate: &str) -> bool {
        self.self_api_url(candidate).is_some()
    }

    fn self_api_url(&self, candidate: &str) -> Option<Url> {
        if !(candidate.starts_with("http://") || candidate.starts_with("https://")) {
            return None;
        }
        let url = Url::parse(candidate).ok()?;
        let in_api = url.path().contains(&self.api_root) || url.query().is_some_and(has_rest_route);
        (in_api && self.self_origins.iter().any(|o| o.owns(&url))).then_some(url)
    }

    /// Rewrite `candidate` if it is a self-referential API URL.
    ///
    /// `?rest_route=` URLs keep their path and query and only move origin;
    /// collapsing them onto the API base would lose the route.
    pub fn rewrite_if_self(&self, candidate: &str, ctx: &RequestContext) -> Option<String> {
        let url = self.self_api_url(candidate)?;
        let rewritten = if url.path().contains(&self.api_root) {
            self.rewrite_url(candidate, ctx)
        } else {
            let host = ctx.host.as_deref()?;
            let mut out = format!("{}://{}{}", ctx.url_scheme(), host, url.path());
            if let Some(query) = url.query() {
                out.push('?');
                out.push_str(query);
            }
            out
        };
        (rewritten != candidate).then_some(rewritten)
    }

    /// Rewrite every self-referential string value in a JSON document.
    /// Returns how many values changed.
    pub fn rewrite_json(&self, value: &mut Value, ctx: &RequestContext) -> usize {
        match value {
            Value::String(s) => match self.rewrite_if_self(s, ctx) {
                Some(rewritten) => {
                    *s = rewritten;
                    1
                }
                None => 0,
            },
            Value::Array(items) => items.iter_mut().map(|v| self.rewrite_json(v, ctx)).sum(),
            Value::Object(map) => map.values_mut().map(|v| self.rewrite_json(v, ctx)).sum(),
            _ => 0,
        }
    }

    /// Rewrite a JSON body. `None` when the body is not JSON or nothing
    /// changed, in which case the original bytes should be sent.
    pub fn rewrite_body(&self, body: &[u8], ctx: &RequestContext) -> Option<(Vec<u8>, usize)> {
        let mut doc: Value = serde_json::from_slice(body).ok()?;
        let changed = self.rewrite_json(&mut doc, ctx);
        if changed == 0 {
            return None;
        }
        let bytes = serde_json::to_vec(&doc).ok()?;
        Some((bytes, changed))
    }

    /// Rewrite the `<...>` targets of a `Link` header value.
    pub fn rewrite_link_header(&self, value: &str, ctx: &RequestContext) -> Option<String> {
        let mut out = String::with_capacity(value.len());
        let mut rest = value;
        let mut changed = false;

        while let Some(open) = rest.find('<') {
            let Some(close) = rest[open..].find('>').map(|c| open + c) else {
                break;
            };
            out.push_str(&rest[..=open]);
            let target = &rest[open + 1..close];
            match self.rewrite_if_self(target, ctx) {
                Some(rewritten) => {
                    out.push_str(&rewritten);
                    changed = true;
                }
                None => out.push_str(target),
            }
            out.push('>');
            rest = &rest[close + 1..];
        }
        out.push_str(rest);

        changed.then_some(out)
    }
}

/// Path and query of an absolute or origin-relative URL.
fn split_path_query(url: &str) -> (String, Option<String>) {
    if let Ok(parsed) = Url::parse(url) {
        return (parsed.path().to_string(), parsed.query().map(str::to_string));
    }
    let without_fragment = url.split('#').next().unwrap_or_default();
    match without_fragment.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (without_fragment.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::origin::OriginTrustNormalizer;
    use crate::gateway::surface::SurfaceSignals;
    use axum::http::Request;
    use serde_json::json;

    fn ctx(host: Option<&str>, headers: &[(&str, &str)], tls: bool) -> RequestContext {
        let mut builder = Request::builder().uri("/wp-json/wp/v2/posts");
        if let Some(h) = host {
            builder = builder.header("Host", h);
        }
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        let mut ctx = RequestContext::from_parts(
            &parts,
            tls,
            None,
            SurfaceSignals { api: true, admin: false },
        );
        OriginTrustNormalizer::default().normalize(&mut ctx);
        ctx
    }

    fn rewriter() -> ResponseHostRewriter {
        ResponseHostRewriter::new(
            "/wp-json/",
            vec![CanonicalOrigin::parse("https://admin.example.com").unwrap()],
        )
    }

    #[test]
    fn test_rewrites_onto_inbound_host() {
        let c = ctx(Some("example.com"), &[], true);
        assert_eq!(
            rewriter().rewrite_url("https://admin.example.com/wp-json/wp/v2/posts", &c),
            "https://example.com/wp-json/wp/v2/posts"
        );
    }

    #[test]
    fn test_forwarded_headers_drive_scheme_and_host() {
        let c = ctx(
            Some("internal:8080"),
            &[("X-Forwarded-Proto", "https"), ("X-Forwarded-Host", "api.example.com")],
            false,
        );
        assert_eq!(
            rewriter().rewrite_url("http://internal:8080/wp-json/wp/v2/pages?per_page=2", &c),
            "https://api.example.com/wp-json/wp/v2/pages?per_page=2"
        );
    }

    #[test]
    fn test_raw_forwarded_proto_is_used_verbatim() {
        let c = ctx(Some("example.com"), &[("X-Forwarded-Proto", "ftp")], false);
        assert_eq!(
            rewriter().rewrite_url("https://admin.example.com/wp-json/", &c),
            "ftp://example.com/wp-json/"
        );
    }

    #[test]
    fn test_missing_marker_falls_back_to_base() {
        let c = ctx(Some("example.com"), &[], false);
        assert_eq!(
            rewriter().rewrite_url("https://admin.example.com/?rest_route=/wp/v2/posts", &c),
            "http://example.com/wp-json/"
        );
    }

    #[test]
    fn test_no_host_is_a_no_op() {
        let c = ctx(None, &[], true);
        let url = "https://admin.example.com/wp-json/wp/v2/posts";
        assert_eq!(rewriter().rewrite_url(url, &c), url);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let c = ctx(Some("example.com"), &[("X-Forwarded-Proto", "https")], false);
        let r = rewriter();
        for url in [
            "https://admin.example.com/wp-json/wp/v2/posts",
            "https://admin.example.com/wp-json/wp/v2/posts?page=2",
            "https://admin.example.com/somewhere-else",
            "/wp-json/",
        ] {
            let once = r.rewrite_url(url, &c);
            assert_eq!(r.rewrite_url(&once, &c), once, "{url}");
        }
    }

    #[test]
    fn test_is_self_api_url() {
        let r = rewriter();
        assert!(r.is_self_api_url("https://admin.example.com/wp-json/wp/v2/posts/1"));
        assert!(!r.is_self_api_url("https://admin.example.com/wp-content/uploads/a.jpg"));
        assert!(!r.is_self_api_url("https://api.w.org/"));
        assert!(!r.is_self_api_url("wp/v2/posts"));
    }

    #[test]
    fn test_rest_route_self_urls_move_to_inbound_host() {
        let c = ctx(Some("api.example.com"), &[("X-Forwarded-Proto", "https")], false);
        let r = rewriter();
        let url = "https://admin.example.com/?rest_route=/wp/v2/posts/1&context=view";

        assert!(r.is_self_api_url(url));
        let once = r.rewrite_if_self(url, &c).unwrap();
        assert_eq!(once, "https://api.example.com/?rest_route=/wp/v2/posts/1&context=view");
        assert_eq!(r.rewrite_if_self(&once, &c), None);

        assert!(!r.is_self_api_url("https://admin.example.com/?p=1"));
        assert!(!r.is_self_api_url("https://other.example/?rest_route=/"));
    }

    #[test]
    fn test_rewrite_json_only_touches_self_urls() {
        let c = ctx(Some("api.example.com"), &[("X-Forwarded-Proto", "https")], false);
        let mut doc = json!([{
            "id": 1,
            "link": "https://admin.example.com/hello-world/",
            "guid": {"rendered": "https://admin.example.com/?p=1"},
            "_links": {
                "self": [{"href": "https://admin.example.com/wp-json/wp/v2/posts/1"}],
                "collection": [{"href": "https://admin.example.com/wp-json/wp/v2/posts"}],
                "curies": [{"href": "https://api.w.org/{rel}", "templated": true}]
            }
        }]);

        assert_eq!(rewriter().rewrite_json(&mut doc, &c), 2);
        assert_eq!(
            doc[0]["_links"]["self"][0]["href"],
            "https://api.example.com/wp-json/wp/v2/posts/1"
        );
        assert_eq!(doc[0]["link"], "https://admin.example.com/hello-world/");
        assert_eq!(doc[0]["_links"]["curies"][0]["href"], "https://api.w.org/{rel}");
    }

    #[test]
    fn test_rewrite_body_passes_through_non_json() {
        let c = ctx(Some("example.com"), &[], true);
        assert!(rewriter().rewrite_body(b"<html></html>", &c).is_none());
        assert!(rewriter().rewrite_body(br#"{"name":"Site"}"#, &c).is_none());

        let (bytes, changed) = rewriter()
            .rewrite_body(br#"{"url":"https:\/\/admin.example.com\/wp-json\/"}"#, &c)
            .unwrap();
        assert_eq!(changed, 1);
        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(doc["url"], "https://example.com/wp-json/");
    }

    #[test]
    fn test_rewrite_link_header() {
        let c = ctx(Some("example.com"), &[], true);
        let value = r#"<https://admin.example.com/wp-json/>; rel="https://api.w.org/", <https://admin.example.com/wp-json/wp/v2/pages/2>; rel="alternate"; type="application/json""#;
        assert_eq!(
            rewriter().rewrite_link_header(value, &c).as_deref(),
            Some(r#"<https://example.com/wp-json/>; rel="https://api.w.org/", <https://example.com/wp-json/wp/v2/pages/2>; rel="alternate"; type="application/json""#)
        );
        assert!(rewriter()
            .rewrite_link_header(r#"<https://other.example/>; rel="next""#, &c)
            .is_none());
    }
}
