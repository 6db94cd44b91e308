//! # HTTP Backend Module / HTTP 后端模块
//!
//! [`RestService`] implements [`HttpService`] with `reqwest`. The engine
//! imposes no timeout of its own; transport errors become
//! [`EngineError::Backend`] and abort the run.
//!
//! [`RestService`] 使用 `reqwest` 实现 [`HttpService`]。引擎本身不设置超时；
//! 传输错误会转换为 [`EngineError::Backend`] 并中止运行。

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};

use crate::core::error::EngineError;
use crate::core::services::{HttpMethod, HttpRequest, HttpResponse, HttpService};

#[derive(Debug, Clone)]
pub struct RestService {
    name: String,
    base: String,
    reset: Option<String>,
    client: Client,
}

impl RestService {
    pub fn new(name: &str, base: &str, reset: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("itom/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            name: name.to_string(),
            base: base.trim_end_matches('/').to_string(),
            reset: reset.filter(|r| !r.trim().is_empty()),
            client,
        })
    }

    fn backend_error(&self, error: reqwest::Error) -> EngineError {
        EngineError::Backend {
            service: self.name.clone(),
            message: error.to_string(),
        }
    }
}

fn to_reqwest(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl HttpService for RestService {
    fn base_address(&self) -> &str {
        &self.base
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, EngineError> {
        let mut builder = self.client.request(to_reqwest(request.method), &request.url);
        if let Some(body) = request.body {
            if request.json {
                builder = builder.header(CONTENT_TYPE, "application/json");
            }
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| self.backend_error(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.backend_error(e))?;
        debug!("{} {} -> {status}", request.method, request.url);
        Ok(HttpResponse { status, body })
    }

    /// Calls the reset endpoint, if any. The response is ignored.
    async fn prepare(&self) -> Result<(), EngineError> {
        let Some(reset) = &self.reset else {
            return Ok(());
        };
        let url = self.url_for(reset);
        debug!("resetting '{}' via {url}", self.name);
        self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.backend_error(e))?;
        Ok(())
    }
}
