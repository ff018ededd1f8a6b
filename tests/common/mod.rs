//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode},
    response::Response,
    Router,
};
use headless_gateway::config::{GatewayConfig, Site, SiteConfig};
use headless_gateway::http::HttpServer;
use headless_gateway::lifecycle::Shutdown;
use tokio::net::TcpListener;

pub const ADMIN_ORIGIN: &str = "https://admin.example.test";

/// A request as the mock upstream saw it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
}

#[derive(Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl Recorder {
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last(&self) -> SeenRequest {
        self.requests().pop().expect("upstream saw no request")
    }
}

/// Start a mock WordPress that builds REST URLs from `ADMIN_ORIGIN`.
pub async fn start_mock_wordpress() -> (SocketAddr, Recorder) {
    let recorder = Recorder::default();
    let app = Router::new()
        .fallback(wordpress_handler)
        .with_state(recorder.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, recorder)
}

async fn wordpress_handler(State(recorder): State<Recorder>, request: Request<Body>) -> Response {
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    recorder.seen.lock().unwrap().push(SeenRequest {
        method: request.method().clone(),
        path_and_query: path_and_query.clone(),
        headers: request.headers().clone(),
    });

    let path = request.uri().path();
    if path == "/wp-json/" {
        let body = serde_json::json!({
            "name": "Headless",
            "description": "",
            "url": ADMIN_ORIGIN,
            "home": ADMIN_ORIGIN,
            "namespaces": ["wp/v2"],
            "routes": {
                "/wp/v2/posts": {
                    "_links": {"self": [{"href": format!("{ADMIN_ORIGIN}/wp-json/wp/v2/posts")}]}
                }
            },
            "_links": {"help": [{"href": "https://developer.wordpress.org/rest-api/"}]}
        });
        return json_response(StatusCode::OK, body);
    }
    if path == "/wp-json/wp/v2/posts" {
        let body = serde_json::json!([{
            "id": 1,
            "link": format!("{ADMIN_ORIGIN}/hello-world/"),
            "_links": {
                "self": [{"href": format!("{ADMIN_ORIGIN}/wp-json/wp/v2/posts/1")}],
                "collection": [{"href": format!("{ADMIN_ORIGIN}/wp-json/wp/v2/posts")}]
            }
        }]);
        return json_response(StatusCode::OK, body);
    }
    if path == "/wp-json/wp/v2/slow" {
        tokio::time::sleep(SLOW_RESPONSE).await;
        return json_response(StatusCode::OK, serde_json::json!([]));
    }
    if path == "/wp-json/wp/v2/media" {
        let chunks: Vec<Result<String, std::io::Error>> =
            large_media_chunks().into_iter().map(Ok).collect();
        return Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json; charset=UTF-8")
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .unwrap();
    }
    if path.starts_with("/wp-json/") {
        let body = serde_json::json!({
            "code": "rest_no_route",
            "message": "No route was found matching the URL and request method.",
            "data": {"status": 404}
        });
        return json_response(StatusCode::NOT_FOUND, body);
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(format!("upstream:{}", path_and_query)))
        .unwrap()
}

/// How long `/wp-json/wp/v2/slow` takes to answer.
pub const SLOW_RESPONSE: Duration = Duration::from_secs(3);

/// Body of `/wp-json/wp/v2/media`, sent chunked without a length. Every item
/// carries a self URL on `ADMIN_ORIGIN`.
pub fn large_media_chunks() -> Vec<String> {
    let mut chunks = vec!["[".to_string()];
    for id in 0..200 {
        let sep = if id == 0 { "" } else { "," };
        chunks.push(format!(
            r#"{sep}{{"id":{id},"_links":{{"self":[{{"href":"{ADMIN_ORIGIN}/wp-json/wp/v2/media/{id}"}}]}}}}"#
        ));
    }
    chunks.push("]".to_string());
    chunks
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json; charset=UTF-8")
        .header(
            header::LINK,
            format!("<{ADMIN_ORIGIN}/wp-json/>; rel=\"https://api.w.org/\""),
        )
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Gateway config pointing at `upstream`, listening on an ephemeral port.
pub fn gateway_config(upstream: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.address = upstream.to_string();
    config.timeouts.request_secs = 5;
    config.timeouts.upstream_secs = 4;
    config
}

/// Site settings with the canonical admin origin and nothing from the
/// process environment.
pub fn site() -> Site {
    SiteConfig {
        admin_origin: Some(ADMIN_ORIGIN.into()),
        jwt_secret_key: Some("test-secret".into()),
        ..SiteConfig::default()
    }
    .resolve(|_| None)
}

/// Start the gateway and return its address.
pub async fn start_gateway(config: GatewayConfig, site: &Site) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config, site).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, shutdown)
}

/// Client that does not follow redirects or use system proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
