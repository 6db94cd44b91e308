//! # Command Resolution Module / 命令解析模块
//!
//! Maps a command `type` token to an executor:
//! - `http…` → [`HttpExecutor`], verb and JSON handling taken from substrings of the type
//! - `sql…`  → [`SqlExecutor`]
//! - anything else → [`UnknownExecutor`], which fails when executed
//!
//! The executor is chosen once, when the command element is parsed.
//!
//! 将命令的 `type` 标记映射到执行器：`http…` 对应 HTTP 执行器，`sql…` 对应 SQL 执行器，
//! 其他类型对应在执行时失败的未知执行器。执行器在解析命令元素时选定一次。

use async_trait::async_trait;
use log::debug;
use std::fmt;
use std::sync::Arc;

use crate::core::content::Encoding;
use crate::core::error::EngineError;
use crate::core::services::{HttpMethod, HttpRequest, ServiceKind, ServiceRegistry};

/// The interpolated inputs of one command execution.
#[derive(Debug, Clone, Copy)]
pub struct CommandRequest<'a> {
    pub service: &'a str,
    pub path: &'a str,
    pub body: &'a str,
}

/// What an executor hands back to the command block.
/// 执行器返回给命令块的结果。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutcome {
    pub raw: Option<String>,
    pub encoding: Encoding,
    pub warnings: Vec<String>,
}

#[async_trait]
pub trait CommandExecutor: Send + Sync + fmt::Debug {
    /// The declared command type this executor was resolved from.
    fn command_type(&self) -> &str;

    /// The kind of service the executor needs, if any.
    fn service_kind(&self) -> Option<ServiceKind>;

    async fn execute(
        &self,
        request: CommandRequest<'_>,
        services: &ServiceRegistry,
    ) -> Result<CommandOutcome, EngineError>;
}

/// Resolves the executor for a command type.
/// 为命令类型解析执行器。
pub fn resolve(command_type: &str) -> Arc<dyn CommandExecutor> {
    if command_type.starts_with("http") {
        Arc::new(HttpExecutor::new(command_type))
    } else if command_type.starts_with("sql") {
        Arc::new(SqlExecutor::new(command_type))
    } else {
        Arc::new(UnknownExecutor::new(command_type))
    }
}

/// Issues one HTTP request. Substrings of the type select the behavior:
/// `put` beats `post` beats `delete`, GET otherwise; `json` tags the request
/// and the response as JSON.
///
/// 发出一次 HTTP 请求。类型中的子串决定行为：`put` 优先于 `post`，`post` 优先于 `delete`，
/// 否则为 GET；`json` 将请求和响应标记为 JSON。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpExecutor {
    command_type: String,
    method: HttpMethod,
    json: bool,
}

impl HttpExecutor {
    pub fn new(command_type: &str) -> Self {
        let method = if command_type.contains("put") {
            HttpMethod::Put
        } else if command_type.contains("post") {
            HttpMethod::Post
        } else if command_type.contains("delete") {
            HttpMethod::Delete
        } else {
            HttpMethod::Get
        };
        Self {
            command_type: command_type.to_string(),
            method,
            json: command_type.contains("json"),
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn is_json(&self) -> bool {
        self.json
    }
}

#[async_trait]
impl CommandExecutor for HttpExecutor {
    fn command_type(&self) -> &str {
        &self.command_type
    }

    fn service_kind(&self) -> Option<ServiceKind> {
        Some(ServiceKind::Http)
    }

    async fn execute(
        &self,
        request: CommandRequest<'_>,
        services: &ServiceRegistry,
    ) -> Result<CommandOutcome, EngineError> {
        let service = services.http(request.service)?;
        let url = service.url_for(request.path);
        let mut warnings = Vec::new();

        let body = if self.method.sends_body() {
            Some(request.body.to_string())
        } else {
            if !request.body.trim().is_empty() {
                warnings.push(format!("{} {url}: request body ignored", self.method));
            }
            None
        };

        debug!("{} {url} (json: {})", self.method, self.json);
        let response = service
            .send(HttpRequest {
                method: self.method,
                url: url.clone(),
                body,
                json: self.json,
            })
            .await?;

        if !response.is_success() {
            warnings.push(format!("{} {url} answered with HTTP {}", self.method, response.status));
        }

        Ok(CommandOutcome {
            raw: Some(response.body),
            encoding: if self.json { Encoding::Json } else { Encoding::Raw },
            warnings,
        })
    }
}

/// Runs the command body as a statement against a SQL service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlExecutor {
    command_type: String,
}

impl SqlExecutor {
    pub fn new(command_type: &str) -> Self {
        Self {
            command_type: command_type.to_string(),
        }
    }
}

#[async_trait]
impl CommandExecutor for SqlExecutor {
    fn command_type(&self) -> &str {
        &self.command_type
    }

    fn service_kind(&self) -> Option<ServiceKind> {
        Some(ServiceKind::Sql)
    }

    async fn execute(
        &self,
        request: CommandRequest<'_>,
        services: &ServiceRegistry,
    ) -> Result<CommandOutcome, EngineError> {
        let service = services.sql(request.service)?;
        debug!("sql on '{}': {}", request.service, request.body);
        let rows = service.query(request.body).await?;
        Ok(CommandOutcome {
            raw: Some(rows),
            encoding: Encoding::Json,
            warnings: Vec::new(),
        })
    }
}

/// Stand-in for an unrecognized type. Always fails with
/// [`EngineError::UnknownCommandType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownExecutor {
    command_type: String,
}

impl UnknownExecutor {
    pub fn new(command_type: &str) -> Self {
        Self {
            command_type: command_type.to_string(),
        }
    }
}

#[async_trait]
impl CommandExecutor for UnknownExecutor {
    fn command_type(&self) -> &str {
        &self.command_type
    }

    fn service_kind(&self) -> Option<ServiceKind> {
        None
    }

    async fn execute(
        &self,
        _request: CommandRequest<'_>,
        _services: &ServiceRegistry,
    ) -> Result<CommandOutcome, EngineError> {
        Err(EngineError::UnknownCommandType(self.command_type.clone()))
    }
}
