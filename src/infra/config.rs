//! # Project Configuration Module / 项目配置模块
//!
//! Loads the project model file (`itom.toml`), resolves its properties and
//! services, and produces the immutable [`RunConfig`] that the run command
//! hands down to the engine.
//!
//! 加载项目模型文件（`itom.toml`），解析其中的属性和服务，
//! 并生成由 run 命令传递给引擎的不可变 [`RunConfig`]。

use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::interpolate::{Variables, interpolate};
use crate::core::services::ServiceRegistry;
use crate::infra::http::RestService;
use crate::infra::sql::SqliteService;

/// Default name of the project model file.
pub const DEFAULT_CONFIG_FILE: &str = "itom.toml";

/// A property either carries its default directly or names an environment
/// variable that overrides the default.
/// 属性要么直接给出默认值，要么指定一个可覆盖默认值的环境变量。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PropertyDef {
    Plain(String),
    Detailed {
        #[serde(default)]
        default: String,
        #[serde(default)]
        env: Option<String>,
    },
}

/// A port may be written as a number or as a (possibly interpolated) string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PortDef {
    Number(u16),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HttpServiceDef {
    #[serde(default = "default_schema")]
    pub schema: String,
    pub host: String,
    #[serde(default)]
    pub port: Option<PortDef>,
    /// Path requested with GET before each test.
    #[serde(default)]
    pub reset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SqliteServiceDef {
    /// Database file relative to the project directory, or `:memory:`.
    pub path: String,
    /// SQL script executed before each test.
    #[serde(default)]
    pub reset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "driver")]
pub enum ServiceDef {
    #[serde(rename = "http.rest")]
    Http(HttpServiceDef),
    #[serde(rename = "database.sqlite")]
    Sqlite(SqliteServiceDef),
}

/// The project model file as written.
/// 项目模型文件的原始结构。
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProjectModel {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_tests_dir")]
    pub tests_dir: String,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyDef>,
    #[serde(default)]
    pub services: IndexMap<String, ServiceDef>,
}

fn default_schema() -> String {
    "http".to_string()
}

fn default_tests_dir() -> String {
    "integration-tests".to_string()
}

/// A service with every field interpolated and every path resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedService {
    Http {
        base: String,
        reset: Option<String>,
    },
    Sqlite {
        path: PathBuf,
        reset: Option<PathBuf>,
    },
}

/// Which documents and leading tests a run processes.
/// 运行处理哪些文档以及跳过多少个开头的测试。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunFilter {
    pub category: Option<String>,
    pub suite: Option<String>,
    pub skip_first: usize,
}

impl RunFilter {
    pub fn enabled_category(&self, category: &str) -> bool {
        self.category.as_deref().is_none_or(|c| c == category)
    }

    /// Matches the suite file name with or without its extension.
    pub fn enabled_suite(&self, suite: &str) -> bool {
        self.suite.as_deref().is_none_or(|s| {
            s == suite || Path::new(suite).file_stem().is_some_and(|stem| stem == s)
        })
    }

    /// Skipping only applies when a single suite is selected.
    pub fn skip_first(&self) -> usize {
        if self.suite.is_some() { self.skip_first } else { 0 }
    }
}

/// Everything a run needs, built once at startup.
/// 一次运行所需的全部信息，在启动时构建一次。
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub project_dir: PathBuf,
    pub description: String,
    pub tests_dir: PathBuf,
    pub properties: Variables,
    pub services: IndexMap<String, ResolvedService>,
    pub filter: RunFilter,
}

impl RunConfig {
    /// Reads `config_file` (relative to `project_dir` unless absolute) and
    /// resolves it against the process environment.
    pub fn load(
        project_dir: &Path,
        config_file: &Path,
        defines: &[(String, String)],
        filter: RunFilter,
    ) -> Result<Self> {
        let project_dir = fs::canonicalize(project_dir).with_context(|| {
            format!("Project directory not found: {}", project_dir.display())
        })?;
        let config_path = project_dir.join(config_file);
        if !config_path.is_file() {
            bail!(
                "Integration test model file {} not found in: {}",
                config_file.display(),
                project_dir.display()
            );
        }
        let source = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let model: ProjectModel = toml::from_str(&source)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Self::from_model(model, project_dir, defines, |name| std::env::var(name).ok(), filter)
    }

    /// Resolves a parsed model. `env` looks up environment variables.
    pub fn from_model<E>(
        model: ProjectModel,
        project_dir: PathBuf,
        defines: &[(String, String)],
        env: E,
        filter: RunFilter,
    ) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let properties = resolve_properties(&model.properties, defines, env);

        let mut services = IndexMap::with_capacity(model.services.len());
        for (id, definition) in &model.services {
            let id = interpolate(id, &properties);
            if id.is_empty() {
                continue;
            }
            services.insert(id, resolve_service(definition, &properties, &project_dir));
        }

        let tests_dir = project_dir.join(interpolate(&model.tests_dir, &properties));
        let description = match &model.description {
            Some(description) => interpolate(description, &properties),
            None => format!("Integration Tests: {}", tests_dir.display()),
        };

        Ok(Self {
            project_dir,
            description,
            tests_dir,
            properties,
            services,
            filter,
        })
    }

    /// Connects every configured service.
    /// 连接所有已配置的服务。
    pub fn build_registry(&self) -> Result<ServiceRegistry> {
        let mut registry = ServiceRegistry::new();
        for (name, service) in &self.services {
            match service {
                ResolvedService::Http { base, reset } => {
                    registry.register_http(
                        name.clone(),
                        Arc::new(RestService::new(name, base, reset.clone())?),
                    );
                }
                ResolvedService::Sqlite { path, reset } => {
                    let database = SqliteService::open(name, path, reset.clone())
                        .with_context(|| format!("Failed to open database service '{name}'"))?;
                    registry.register_sql(name.clone(), Arc::new(database));
                }
            }
        }
        Ok(registry)
    }
}

/// Resolves properties in declaration order. Precedence: `-D` define, then
/// the named environment variable, then the default. Values may reference
/// properties declared earlier.
///
/// 按声明顺序解析属性。优先级：`-D` 定义，其次是指定的环境变量，最后是默认值。
/// 属性值可以引用之前声明的属性。
pub fn resolve_properties<E>(
    definitions: &IndexMap<String, PropertyDef>,
    defines: &[(String, String)],
    env: E,
) -> Variables
where
    E: Fn(&str) -> Option<String>,
{
    let mut resolved = Variables::new();
    for (name, definition) in definitions {
        let (default, env_name) = match definition {
            PropertyDef::Plain(default) => (default.as_str(), None),
            PropertyDef::Detailed { default, env } => (default.as_str(), env.as_deref()),
        };

        let defined = defines.iter().rev().find(|(key, _)| key == name);
        let value = if let Some((_, value)) = defined {
            interpolate(value, &resolved)
        } else if let Some(from_env) = env_name
            .map(|e| interpolate(e, &resolved))
            .and_then(|e| env(&e))
        {
            interpolate(&from_env, &resolved)
        } else {
            interpolate(default, &resolved)
        };
        resolved.insert(name.clone(), value);
    }
    resolved
}

fn resolve_service(
    definition: &ServiceDef,
    properties: &Variables,
    project_dir: &Path,
) -> ResolvedService {
    match definition {
        ServiceDef::Http(http) => {
            let schema = interpolate(&http.schema, properties);
            let host = interpolate(&http.host, properties);
            let port = match &http.port {
                Some(PortDef::Number(port)) => port.to_string(),
                Some(PortDef::Text(port)) => interpolate(port, properties),
                None => String::new(),
            };
            ResolvedService::Http {
                base: base_address(&schema, &host, &port),
                reset: http
                    .reset
                    .as_ref()
                    .map(|reset| interpolate(reset, properties)),
            }
        }
        ServiceDef::Sqlite(sqlite) => ResolvedService::Sqlite {
            path: resolve_path(&interpolate(&sqlite.path, properties), project_dir),
            reset: sqlite
                .reset
                .as_ref()
                .map(|reset| resolve_path(&interpolate(reset, properties), project_dir)),
        },
    }
}

/// `schema://host`, with `:port` unless the port is empty or the schema's default.
/// 生成 `schema://host`；除非端口为空或为该协议的默认端口，否则附加 `:port`。
pub fn base_address(schema: &str, host: &str, port: &str) -> String {
    let port = port.trim();
    let default_port = matches!((schema, port), ("http", "80") | ("https", "443"));
    let host = host.trim().trim_end_matches('/');
    if port.is_empty() || default_port {
        format!("{schema}://{host}")
    } else {
        format!("{schema}://{host}:{port}")
    }
}

fn resolve_path(raw: &str, project_dir: &Path) -> PathBuf {
    if raw == ":memory:" {
        return PathBuf::from(raw);
    }
    let expanded = PathBuf::from(shellexpand::tilde(raw).as_ref());
    if expanded.is_absolute() {
        expanded
    } else {
        project_dir.join(expanded)
    }
}

/// Parses a `NAME=VALUE` define from the command line.
pub fn parse_define(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}
