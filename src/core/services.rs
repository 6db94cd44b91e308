//! # Service Registry / 服务注册表
//!
//! Commands reach backends through named services. A service is either an
//! HTTP endpoint or a SQL database; both can reset their fixtures before a
//! test runs. The concrete backends live in `infra`.
//!
//! 命令通过命名服务访问后端。服务可以是 HTTP 端点或 SQL 数据库，
//! 二者都可以在测试运行前重置其测试数据。具体后端实现位于 `infra`。

use async_trait::async_trait;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::core::error::EngineError;

/// HTTP verbs a command can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Whether requests with this verb carry a body.
    pub fn sends_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<String>,
    /// Adds `Content-Type: application/json` when a body is sent.
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// An HTTP backend addressed by its base address.
/// 以基础地址寻址的 HTTP 后端。
#[async_trait]
pub trait HttpService: Send + Sync + fmt::Debug {
    fn base_address(&self) -> &str;

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, EngineError>;

    /// Resets server-side fixtures. Does nothing by default.
    async fn prepare(&self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Joins the base address and a command path with exactly one `/`.
    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_address().trim_end_matches('/'),
            path.trim().trim_start_matches('/')
        )
    }
}

/// A SQL backend. `query` returns the result already shaped as JSON text.
/// SQL 后端。`query` 返回已整理为 JSON 文本的结果。
#[async_trait]
pub trait SqlService: Send + Sync + fmt::Debug {
    async fn query(&self, statement: &str) -> Result<String, EngineError>;

    async fn prepare(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum Service {
    Http(Arc<dyn HttpService>),
    Sql(Arc<dyn SqlService>),
}

impl Service {
    pub fn kind(&self) -> ServiceKind {
        match self {
            Service::Http(_) => ServiceKind::Http,
            Service::Sql(_) => ServiceKind::Sql,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Http,
    Sql,
}

impl ServiceKind {
    pub fn label(self) -> &'static str {
        match self {
            ServiceKind::Http => "an HTTP service",
            ServiceKind::Sql => "a SQL service",
        }
    }
}

/// Named services in configuration order.
/// 按配置顺序排列的命名服务。
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: IndexMap<String, Service>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, service: Service) {
        self.services.insert(name.into(), service);
    }

    pub fn register_http(&mut self, name: impl Into<String>, service: Arc<dyn HttpService>) {
        self.register(name, Service::Http(service));
    }

    pub fn register_sql(&mut self, name: impl Into<String>, service: Arc<dyn SqlService>) {
        self.register(name, Service::Sql(service));
    }

    pub fn get(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    pub fn http(&self, name: &str) -> Result<Arc<dyn HttpService>, EngineError> {
        match self.services.get(name) {
            Some(Service::Http(service)) => Ok(Arc::clone(service)),
            _ => Err(EngineError::UnknownService {
                service: name.to_string(),
                expected: ServiceKind::Http.label(),
            }),
        }
    }

    pub fn sql(&self, name: &str) -> Result<Arc<dyn SqlService>, EngineError> {
        match self.services.get(name) {
            Some(Service::Sql(service)) => Ok(Arc::clone(service)),
            _ => Err(EngineError::UnknownService {
                service: name.to_string(),
                expected: ServiceKind::Sql.label(),
            }),
        }
    }

    /// Resets every service, databases first, before a test's blocks run.
    /// 在测试块运行之前重置所有服务，数据库优先。
    pub async fn prepare(&self) -> Result<(), EngineError> {
        for service in self.services.values() {
            if let Service::Sql(sql) = service {
                sql.prepare().await?;
            }
        }
        for service in self.services.values() {
            if let Service::Http(http) = service {
                http.prepare().await?;
            }
        }
        Ok(())
    }
}
