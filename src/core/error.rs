//! # Error Types / 错误类型
//!
//! `EngineError` covers failures while a test runs, `DocumentError` covers
//! everything detected while a suite is being built.
//!
//! `EngineError` 表示测试运行期间的失败，`DocumentError` 表示构建套件时检测到的问题。

use thiserror::Error;

/// Errors raised while executing blocks.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The command `type` matched no executor. Reported as a test failure.
    #[error("Command: {0} unknown")]
    UnknownCommandType(String),

    #[error("service '{service}' is not configured as {expected}")]
    UnknownService {
        service: String,
        expected: &'static str,
    },

    /// Transport, connection or statement failure of a backend. Aborts the run.
    #[error("backend '{service}' failed: {message}")]
    Backend { service: String, message: String },
}

impl EngineError {
    /// Whether the error ends only the current test rather than the run.
    /// 该错误是否只终止当前测试而不是整个运行。
    pub fn is_test_level(&self) -> bool {
        matches!(self, EngineError::UnknownCommandType(_))
    }
}

/// Errors raised while parsing a suite document and building its macros and tests.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid suite document: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("'{element}' element is missing the '{attribute}' attribute")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("macro '{name}' is defined more than once")]
    DuplicateMacro { name: String },

    #[error("'{referenced_from}' references undefined macro '{name}'")]
    UndefinedMacro {
        name: String,
        referenced_from: String,
    },

    #[error("macro '{name}' references itself through {chain}")]
    MacroCycle { name: String, chain: String },

    #[error("test '{test}' uses service '{service}' which is not configured")]
    UnknownService { test: String, service: String },
}
