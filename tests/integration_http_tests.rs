//! # HTTP Backend Integration Tests / HTTP 后端集成测试
//!
//! Runs `RestService` against a small echo server bound to a local port.
//! The server answers every request with a JSON document describing it.
//!
//! 针对绑定在本地端口上的小型回显服务器运行 `RestService`。
//! 服务器对每个请求返回一个描述该请求的 JSON 文档。

use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use itom_runner::core::services::{HttpMethod, HttpRequest, HttpService, ServiceRegistry};
use itom_runner::core::Suite;
use itom_runner::infra::http::RestService;

/// Starts the echo server and returns its base address and a counter of
/// requests made to `/reset`.
async fn start_echo_server() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let resets = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&resets);

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let counter = Arc::clone(&counter);
            tokio::spawn(async move {
                let _ = handle(stream, counter).await;
            });
        }
    });

    (format!("http://{address}"), resets)
}

async fn handle(mut stream: TcpStream, resets: Arc<AtomicUsize>) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buffer.len() < header_end + content_length {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
    }

    let request_line = String::from_utf8_lossy(&buffer[..header_end])
        .lines()
        .next()
        .unwrap_or_default()
        .to_string();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();
    let body = String::from_utf8_lossy(&buffer[header_end..]).to_string();

    if path == "/reset" {
        resets.fetch_add(1, Ordering::SeqCst);
    }
    let status = if path.starts_with("/missing") { "404 Not Found" } else { "200 OK" };
    let payload = json!({
        "method": method,
        "path": path,
        "body": body,
        "json": head.contains("content-type: application/json"),
    })
    .to_string();

    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

#[cfg(test)]
mod rest_service_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_returns_status_and_body() {
        let (base, _) = start_echo_server().await;
        let service = RestService::new("api", &base, None).unwrap();

        let response = service
            .send(HttpRequest {
                method: HttpMethod::Get,
                url: service.url_for("/users/7"),
                body: None,
                json: true,
            })
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        let echoed: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(echoed["method"], "GET");
        assert_eq!(echoed["path"], "/users/7");
        assert_eq!(echoed["json"], false);
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let (base, _) = start_echo_server().await;
        let service = RestService::new("api", &base, None).unwrap();

        let response = service
            .send(HttpRequest {
                method: HttpMethod::Post,
                url: service.url_for("users"),
                body: Some(r#"{"name":"ada"}"#.to_string()),
                json: true,
            })
            .await
            .unwrap();

        let echoed: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(echoed["method"], "POST");
        assert_eq!(echoed["body"], r#"{"name":"ada"}"#);
        assert_eq!(echoed["json"], true);
    }

    #[tokio::test]
    async fn test_error_status_is_not_a_transport_error() {
        let (base, _) = start_echo_server().await;
        let service = RestService::new("api", &base, None).unwrap();

        let response = service
            .send(HttpRequest {
                method: HttpMethod::Delete,
                url: service.url_for("/missing/1"),
                body: None,
                json: false,
            })
            .await
            .unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_backend_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let service = RestService::new("api", &base, None).unwrap();
        let result = service
            .send(HttpRequest {
                method: HttpMethod::Get,
                url: service.url_for("/"),
                body: None,
                json: false,
            })
            .await;
        assert!(result.is_err());
    }
}

#[cfg(test)]
mod suite_over_http_tests {
    use super::*;

    #[tokio::test]
    async fn test_suite_runs_against_live_server_with_resets() {
        let (base, resets) = start_echo_server().await;
        let mut registry = ServiceRegistry::new();
        registry.register_http(
            "api",
            Arc::new(RestService::new("api", &base, Some("/reset".to_string())).unwrap()),
        );

        let source = r#"
            [[tests.cases]]
            name = "echo path"
            [[tests.cases.blocks]]
            kind = "assign"
            var = "id"
            const = "7"
            [[tests.cases.blocks]]
            kind = "command"
            type = "http.get.json"
            service = "api"
            path = "/users/$id"
            [[tests.cases.blocks]]
            kind = "expected"
            section = "path"
            body = "/users/7"

            [[tests.cases]]
            name = "echo body"
            [[tests.cases.blocks]]
            kind = "command"
            type = "http.put.json"
            service = "api"
            path = "/users/7"
            body = "active"
            [[tests.cases.blocks]]
            kind = "expected"
            that = "the body comes back"
            section = "body"
            body = "active"
        "#;
        let suite = Suite::parse(source, 0).unwrap();
        suite.check_services(&registry).unwrap();
        let reports = suite.execute(&registry, |_| {}).await.unwrap();

        assert!(reports.iter().all(|r| r.passed), "{reports:?}");
        assert_eq!(resets.load(Ordering::SeqCst), 2);
    }
}
